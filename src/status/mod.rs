//! Return codes of the native agent.
//!
//! Every SDK entry point returns an `int` (or a `long` handle) where zero and
//! positive values mean success and negative values name a failure category.

use std::fmt;

pub const NEWRELIC_RETURN_CODE_OK: i32 = 0;
pub const NEWRELIC_RETURN_CODE_OTHER: i32 = -0x10001;
pub const NEWRELIC_RETURN_CODE_DISABLED: i32 = -0x20001;
pub const NEWRELIC_RETURN_CODE_INVALID_PARAM: i32 = -0x30001;
pub const NEWRELIC_RETURN_CODE_INVALID_ID: i32 = -0x30002;
pub const NEWRELIC_RETURN_CODE_TRANSACTION_NOT_STARTED: i32 = -0x40001;
pub const NEWRELIC_RETURN_CODE_TRANSACTION_IN_PROGRESS: i32 = -0x40002;
pub const NEWRELIC_RETURN_CODE_TRANSACTION_NOT_NAMED: i32 = -0x40003;

/// Status reported by the native agent for a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Zero or any positive value.
    Ok,
    /// Generic failure inside the agent.
    Other,
    /// The agent is disabled (not initialized, or shut down).
    Disabled,
    /// An argument was rejected.
    InvalidParam,
    /// The transaction or segment identifier is unknown to the agent.
    InvalidId,
    /// The transaction has not been started.
    TransactionNotStarted,
    /// The transaction is already running.
    TransactionInProgress,
    /// The transaction has not been named.
    TransactionNotNamed,
    /// A negative code outside the known table. Handles below `i32::MIN`
    /// are clamped to `i32::MIN`; the caller logs the raw value.
    Unknown(i32),
}

impl Status {
    /// Every failure category the agent documents, in code order.
    pub const KNOWN_FAILURES: [Status; 7] = [
        Status::Other,
        Status::Disabled,
        Status::InvalidParam,
        Status::InvalidId,
        Status::TransactionNotStarted,
        Status::TransactionInProgress,
        Status::TransactionNotNamed,
    ];

    pub const fn from_code(code: i32) -> Self {
        match code {
            NEWRELIC_RETURN_CODE_OTHER => Status::Other,
            NEWRELIC_RETURN_CODE_DISABLED => Status::Disabled,
            NEWRELIC_RETURN_CODE_INVALID_PARAM => Status::InvalidParam,
            NEWRELIC_RETURN_CODE_INVALID_ID => Status::InvalidId,
            NEWRELIC_RETURN_CODE_TRANSACTION_NOT_STARTED => Status::TransactionNotStarted,
            NEWRELIC_RETURN_CODE_TRANSACTION_IN_PROGRESS => Status::TransactionInProgress,
            NEWRELIC_RETURN_CODE_TRANSACTION_NOT_NAMED => Status::TransactionNotNamed,
            c if c >= 0 => Status::Ok,
            c => Status::Unknown(c),
        }
    }

    /// Same as [`Status::from_code`] for `long` results such as handles.
    ///
    /// Every documented code fits in an `i32`. A negative handle below
    /// `i32::MIN` becomes `Unknown(i32::MIN)`, so the raw value is not
    /// recoverable from the status.
    pub fn from_handle(raw: i64) -> Self {
        if raw >= 0 {
            return Status::Ok;
        }
        match i32::try_from(raw) {
            Ok(code) => Status::from_code(code),
            Err(_) => Status::Unknown(i32::MIN),
        }
    }

    /// Code this status was decoded from. `Ok` reports zero.
    pub const fn code(&self) -> i32 {
        match self {
            Status::Ok => NEWRELIC_RETURN_CODE_OK,
            Status::Other => NEWRELIC_RETURN_CODE_OTHER,
            Status::Disabled => NEWRELIC_RETURN_CODE_DISABLED,
            Status::InvalidParam => NEWRELIC_RETURN_CODE_INVALID_PARAM,
            Status::InvalidId => NEWRELIC_RETURN_CODE_INVALID_ID,
            Status::TransactionNotStarted => NEWRELIC_RETURN_CODE_TRANSACTION_NOT_STARTED,
            Status::TransactionInProgress => NEWRELIC_RETURN_CODE_TRANSACTION_IN_PROGRESS,
            Status::TransactionNotNamed => NEWRELIC_RETURN_CODE_TRANSACTION_NOT_NAMED,
            Status::Unknown(code) => *code,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Other => "other",
            Status::Disabled => "disabled",
            Status::InvalidParam => "invalid param",
            Status::InvalidId => "invalid id",
            Status::TransactionNotStarted => "transaction not started",
            Status::TransactionInProgress => "transaction in progress",
            Status::TransactionNotNamed => "transaction not named",
            Status::Unknown(_) => "unknown",
        }
    }

    pub const fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
