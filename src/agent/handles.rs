use std::fmt;

use libc::c_long;

/// Handle of a transaction, as returned by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(i64);

impl TransactionId {
    pub const fn from_raw(raw: i64) -> Self {
        TransactionId(raw)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    // The SDK ships for LP64 Linux only, where `c_long` is 64 bits wide and
    // the cast is lossless. `ffi::sdk` refuses to build anywhere else.
    pub(crate) fn as_native(self) -> c_long {
        self.0 as c_long
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle of a segment within a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(i64);

impl SegmentId {
    /// Parent value naming the transaction's root segment.
    pub const ROOT: SegmentId = SegmentId(0);
    /// Parent value asking the agent to nest under the current segment.
    pub const AUTOSCOPE: SegmentId = SegmentId(1);

    pub const fn from_raw(raw: i64) -> Self {
        SegmentId(raw)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    // Lossless on LP64, as for `TransactionId`.
    pub(crate) fn as_native(self) -> c_long {
        self.0 as c_long
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Web transactions are request/response work; everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Web,
    Other,
}

/// Arguments of a datastore segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatastoreParams<'a> {
    pub table: &'a str,
    pub operation: &'a str,
    /// Raw query. The agent obfuscates literals before recording it.
    pub sql: &'a str,
    /// Aggregation key for similar queries.
    pub rollup_name: &'a str,
}

impl<'a> DatastoreParams<'a> {
    pub fn new(table: &'a str, operation: &'a str) -> Self {
        DatastoreParams { table, operation, sql: "", rollup_name: "" }
    }

    pub fn sql(mut self, sql: &'a str) -> Self {
        self.sql = sql;
        self
    }

    pub fn rollup_name(mut self, rollup_name: &'a str) -> Self {
        self.rollup_name = rollup_name;
        self
    }
}
