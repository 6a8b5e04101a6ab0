use crate::agent::{DatastoreParams, SegmentId, TransactionId, TransactionType};
use crate::error::Result;

/// Process-wide lifecycle of the native agent
///
/// # PUBLIC_INTERFACE
pub trait IAgentLifecycle {
    /// Start the agent. Must be called once per process before anything else.
    ///
    /// # Arguments
    /// * `license_key` - Account license key
    /// * `app_name` - Application name the data is reported under
    /// * `language` - Name of the instrumented language
    /// * `language_version` - Version of the instrumented language
    ///
    /// # Returns
    /// - `Ok(())` if the agent started
    /// - `Err` if the agent refused to start (already initialized, bad license, ...)
    fn initialize(
        &self,
        license_key: &str,
        app_name: &str,
        language: &str,
        language_version: &str,
    ) -> Result<()>;

    /// Ask the agent to stop reporting
    ///
    /// # Arguments
    /// * `reason` - Free-text reason logged by the agent
    fn request_shutdown(&self, reason: &str) -> Result<()>;
}

/// Transaction lifecycle and per-field setters
///
/// Every setter returns the category reported by the agent when it rejects
/// the call, e.g. `transaction not started` for an id that was never begun.
///
/// # PUBLIC_INTERFACE
pub trait ITransactionTracer {
    /// Begin a transaction. Returns the agent's handle unmodified.
    fn begin_transaction(&self) -> TransactionId;

    /// Mark the transaction as a web transaction
    fn set_transaction_type_web(&self, transaction: TransactionId) -> Result<()>;

    /// Mark the transaction as a background (non-web) transaction
    fn set_transaction_type_other(&self, transaction: TransactionId) -> Result<()>;

    /// Set the transaction type from a [`TransactionType`]
    fn set_transaction_type(&self, transaction: TransactionId, kind: TransactionType) -> Result<()> {
        match kind {
            TransactionType::Web => self.set_transaction_type_web(transaction),
            TransactionType::Other => self.set_transaction_type_other(transaction),
        }
    }

    /// Name the transaction
    fn set_transaction_name(&self, transaction: TransactionId, name: &str) -> Result<()>;

    /// Set the transaction category (e.g. `Uri`, `Action`)
    fn set_transaction_category(&self, transaction: TransactionId, category: &str) -> Result<()>;

    /// Set the request URL of a web transaction
    fn set_transaction_request_url(&self, transaction: TransactionId, url: &str) -> Result<()>;

    /// Cap the number of segments kept in the transaction trace
    fn set_transaction_max_trace_segments(
        &self,
        transaction: TransactionId,
        max_trace_segments: i32,
    ) -> Result<()>;

    /// Attach a custom key/value attribute
    ///
    /// # Arguments
    /// * `transaction` - Transaction handle
    /// * `name` - Attribute key
    /// * `value` - Attribute value
    fn add_transaction_attribute(
        &self,
        transaction: TransactionId,
        name: &str,
        value: &str,
    ) -> Result<()>;

    /// Record a caught error on the transaction
    ///
    /// # Arguments
    /// * `transaction` - Transaction handle
    /// * `exception_type` - Type or class of the error
    /// * `error_message` - Error message
    /// * `stack_trace` - Stack frames joined by `stack_frame_delimiter`
    /// * `stack_frame_delimiter` - Separator between frames in `stack_trace`
    fn notice_transaction_error(
        &self,
        transaction: TransactionId,
        exception_type: &str,
        error_message: &str,
        stack_trace: &str,
        stack_frame_delimiter: &str,
    ) -> Result<()>;

    /// End the transaction. The handle must not be used afterwards.
    fn end_transaction(&self, transaction: TransactionId) -> Result<()>;
}

/// Timing spans nested inside a transaction
///
/// `parent` is another segment of the same transaction, [`SegmentId::ROOT`]
/// or [`SegmentId::AUTOSCOPE`].
///
/// # PUBLIC_INTERFACE
pub trait ISegmentTracer {
    /// Begin a segment for arbitrary work
    fn begin_generic_segment(
        &self,
        transaction: TransactionId,
        parent: SegmentId,
        name: &str,
    ) -> Result<SegmentId>;

    /// Begin a datastore segment. The query is obfuscated by the agent with
    /// literal replacement before it is recorded.
    fn begin_datastore_segment(
        &self,
        transaction: TransactionId,
        parent: SegmentId,
        params: &DatastoreParams<'_>,
    ) -> Result<SegmentId>;

    /// Begin a segment for a call to an external service
    ///
    /// # Arguments
    /// * `host` - Host of the external service
    /// * `name` - Name of the call
    fn begin_external_segment(
        &self,
        transaction: TransactionId,
        parent: SegmentId,
        host: &str,
        name: &str,
    ) -> Result<SegmentId>;

    /// End a segment
    fn end_segment(&self, transaction: TransactionId, segment: SegmentId) -> Result<()>;
}

/// Custom and runtime metrics
///
/// # PUBLIC_INTERFACE
pub trait IMetricRecorder {
    /// Record a named value into the metric stream
    ///
    /// # Returns
    /// - `Ok(())` if the agent accepted the value
    /// - `Err` only if the agent rejected it immediately
    fn record_metric(&self, name: &str, value: f64) -> Result<()>;

    /// Record CPU time spent in user mode and the CPU usage percentage
    fn record_cpu_usage(&self, cpu_user_time_seconds: f64, cpu_usage_percent: f64) -> Result<()>;

    /// Record resident memory in megabytes
    fn record_memory_usage(&self, memory_megabytes: f64) -> Result<()>;
}
