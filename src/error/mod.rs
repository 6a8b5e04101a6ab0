use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::status::Status;

/// Call site of a native entry point, used to label errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Initialize,
    RequestShutdown,
    SetTransactionTypeWeb,
    SetTransactionTypeOther,
    SetTransactionName,
    SetTransactionCategory,
    SetTransactionRequestUrl,
    SetTransactionMaxTraceSegments,
    AddTransactionAttribute,
    NoticeTransactionError,
    EndTransaction,
    BeginGenericSegment,
    BeginDatastoreSegment,
    BeginExternalSegment,
    EndSegment,
    RecordMetric,
    RecordCpuUsage,
    RecordMemoryUsage,
}

impl Operation {
    pub const ALL: [Operation; 18] = [
        Operation::Initialize,
        Operation::RequestShutdown,
        Operation::SetTransactionTypeWeb,
        Operation::SetTransactionTypeOther,
        Operation::SetTransactionName,
        Operation::SetTransactionCategory,
        Operation::SetTransactionRequestUrl,
        Operation::SetTransactionMaxTraceSegments,
        Operation::AddTransactionAttribute,
        Operation::NoticeTransactionError,
        Operation::EndTransaction,
        Operation::BeginGenericSegment,
        Operation::BeginDatastoreSegment,
        Operation::BeginExternalSegment,
        Operation::EndSegment,
        Operation::RecordMetric,
        Operation::RecordCpuUsage,
        Operation::RecordMemoryUsage,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Operation::Initialize => "initialize",
            Operation::RequestShutdown => "request shutdown",
            Operation::SetTransactionTypeWeb => "set transaction type web",
            Operation::SetTransactionTypeOther => "set transaction type other",
            Operation::SetTransactionName => "set transaction name",
            Operation::SetTransactionCategory => "set transaction category",
            Operation::SetTransactionRequestUrl => "set transaction request url",
            Operation::SetTransactionMaxTraceSegments => "set transaction max trace segments",
            Operation::AddTransactionAttribute => "add transaction attribute",
            Operation::NoticeTransactionError => "notice transaction error",
            Operation::EndTransaction => "end transaction",
            Operation::BeginGenericSegment => "begin generic segment",
            Operation::BeginDatastoreSegment => "begin datastore segment",
            Operation::BeginExternalSegment => "begin external segment",
            Operation::EndSegment => "end segment",
            Operation::RecordMetric => "record metric",
            Operation::RecordCpuUsage => "record cpu usage",
            Operation::RecordMemoryUsage => "record memory usage",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the binding.
#[derive(Debug, Error)]
pub enum Error {
    /// The native agent returned a negative status.
    #[error("newrelic: {operation}: {status}")]
    Native { operation: Operation, status: Status },

    /// A string argument cannot be represented as a C string.
    #[error("newrelic: {operation}: `{argument}` contains an interior nul byte")]
    InteriorNul {
        operation: Operation,
        argument: &'static str,
    },

    /// The native allocator returned null for a string buffer.
    #[error("newrelic: {operation}: failed to allocate native buffer for `{argument}`")]
    Allocation {
        operation: Operation,
        argument: &'static str,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Native status behind this error, if it came from the agent.
    pub fn status(&self) -> Option<Status> {
        match self {
            Error::Native { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            Error::Native { operation, .. }
            | Error::InteriorNul { operation, .. }
            | Error::Allocation { operation, .. } => Some(*operation),
            Error::Config(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Maps a native `int` result to `Ok(())` or a labelled error.
pub fn check_status(code: i32, operation: Operation) -> Result<()> {
    match Status::from_code(code) {
        Status::Ok => Ok(()),
        status => {
            log::warn!("newrelic: {} failed: {} ({})", operation, status, code);
            Err(Error::Native { operation, status })
        }
    }
}

/// Maps a native `long` handle to itself, or to a labelled error when negative.
pub fn check_handle(raw: i64, operation: Operation) -> Result<i64> {
    match Status::from_handle(raw) {
        Status::Ok => Ok(raw),
        status => {
            log::warn!("newrelic: {} failed: {} ({})", operation, status, raw);
            Err(Error::Native { operation, status })
        }
    }
}
