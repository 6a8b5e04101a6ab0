//! The binding shim.
//!
//! [`Agent`] turns each trait call into exactly one call on a
//! [`NativeLibrary`]: string arguments are copied into native buffers that
//! live for the duration of that call, and the returned status is mapped to
//! [`Error`](crate::Error). No state is kept on the Rust side.

use libc::{c_int, c_long};

use crate::config::{AgentConfig, ConfigError};
use crate::error::{check_handle, check_status, Operation, Result};
use crate::ffi::{CBuffer, NativeLibrary};
use crate::traits::{IAgentLifecycle, IMetricRecorder, ISegmentTracer, ITransactionTracer};

mod handles;
mod scope;

pub use handles::{DatastoreParams, SegmentId, TransactionId, TransactionType};
pub use scope::{SegmentScope, TransactionScope};

/// Binding over one native agent library.
pub struct Agent<L: NativeLibrary> {
    library: L,
}

#[cfg(feature = "sdk")]
impl Agent<crate::ffi::SdkLibrary> {
    /// Agent backed by the linked New Relic Agent SDK.
    pub fn sdk() -> Self {
        Agent::new(crate::ffi::SdkLibrary)
    }
}

impl<L: NativeLibrary> Agent<L> {
    pub fn new(library: L) -> Self {
        Agent { library }
    }

    pub fn library(&self) -> &L {
        &self.library
    }

    /// Validates `config`, then initializes the agent with it.
    ///
    /// The embedded collector message handler is only registered when
    /// `config.embedded_collector` is set.
    pub fn init_with_config(&self, config: &AgentConfig) -> Result<()> {
        config.validate().map_err(ConfigError::from)?;
        self.init_native(
            &config.license_key,
            &config.app_name,
            &config.language,
            &config.language_version,
            config.embedded_collector,
        )
    }

    /// Begins a transaction that ends when the returned scope is dropped.
    pub fn scoped_transaction(&self) -> TransactionScope<'_, Self> {
        TransactionScope::begin(self)
    }

    fn buffer<'a>(
        &'a self,
        operation: Operation,
        argument: &'static str,
        value: &str,
    ) -> Result<CBuffer<'a, L>> {
        CBuffer::new(&self.library, operation, argument, value)
    }

    fn status(&self, operation: Operation, rv: c_int) -> Result<()> {
        log::debug!("newrelic: {} returned {}", operation, rv);
        check_status(rv, operation)
    }

    fn segment(&self, operation: Operation, raw: c_long) -> Result<SegmentId> {
        log::debug!("newrelic: {} returned {}", operation, raw);
        check_handle(raw as i64, operation).map(SegmentId::from_raw)
    }

    fn init_native(
        &self,
        license_key: &str,
        app_name: &str,
        language: &str,
        language_version: &str,
        embedded_collector: bool,
    ) -> Result<()> {
        let op = Operation::Initialize;
        let license = self.buffer(op, "license_key", license_key)?;
        let app = self.buffer(op, "app_name", app_name)?;
        let lang = self.buffer(op, "language", language)?;
        let lang_version = self.buffer(op, "language_version", language_version)?;

        if embedded_collector {
            self.library.register_message_handler();
        }
        // SAFETY: all buffers outlive the call.
        let rv = unsafe {
            self.library
                .init(license.as_ptr(), app.as_ptr(), lang.as_ptr(), lang_version.as_ptr())
        };
        self.status(op, rv)?;
        log::info!(
            "newrelic: agent initialized for {:?} ({} {})",
            app_name,
            language,
            language_version
        );
        Ok(())
    }
}

impl<L: NativeLibrary> IAgentLifecycle for Agent<L> {
    fn initialize(
        &self,
        license_key: &str,
        app_name: &str,
        language: &str,
        language_version: &str,
    ) -> Result<()> {
        self.init_native(license_key, app_name, language, language_version, true)
    }

    fn request_shutdown(&self, reason: &str) -> Result<()> {
        let op = Operation::RequestShutdown;
        let reason_buf = self.buffer(op, "reason", reason)?;
        // SAFETY: `reason_buf` outlives the call.
        let rv = unsafe { self.library.request_shutdown(reason_buf.as_ptr()) };
        self.status(op, rv)?;
        log::info!("newrelic: shutdown requested: {}", reason);
        Ok(())
    }
}

impl<L: NativeLibrary> ITransactionTracer for Agent<L> {
    fn begin_transaction(&self) -> TransactionId {
        let raw = self.library.transaction_begin();
        log::debug!("newrelic: begin transaction returned {}", raw);
        TransactionId::from_raw(raw as i64)
    }

    fn set_transaction_type_web(&self, transaction: TransactionId) -> Result<()> {
        let rv = self.library.transaction_set_type_web(transaction.as_native());
        self.status(Operation::SetTransactionTypeWeb, rv)
    }

    fn set_transaction_type_other(&self, transaction: TransactionId) -> Result<()> {
        let rv = self.library.transaction_set_type_other(transaction.as_native());
        self.status(Operation::SetTransactionTypeOther, rv)
    }

    fn set_transaction_name(&self, transaction: TransactionId, name: &str) -> Result<()> {
        let op = Operation::SetTransactionName;
        let name = self.buffer(op, "name", name)?;
        // SAFETY: `name` outlives the call.
        let rv = unsafe { self.library.transaction_set_name(transaction.as_native(), name.as_ptr()) };
        self.status(op, rv)
    }

    fn set_transaction_category(&self, transaction: TransactionId, category: &str) -> Result<()> {
        let op = Operation::SetTransactionCategory;
        let category = self.buffer(op, "category", category)?;
        // SAFETY: `category` outlives the call.
        let rv = unsafe {
            self.library
                .transaction_set_category(transaction.as_native(), category.as_ptr())
        };
        self.status(op, rv)
    }

    fn set_transaction_request_url(&self, transaction: TransactionId, url: &str) -> Result<()> {
        let op = Operation::SetTransactionRequestUrl;
        let url = self.buffer(op, "url", url)?;
        // SAFETY: `url` outlives the call.
        let rv = unsafe {
            self.library
                .transaction_set_request_url(transaction.as_native(), url.as_ptr())
        };
        self.status(op, rv)
    }

    fn set_transaction_max_trace_segments(
        &self,
        transaction: TransactionId,
        max_trace_segments: i32,
    ) -> Result<()> {
        let rv = self
            .library
            .transaction_set_max_trace_segments(transaction.as_native(), max_trace_segments);
        self.status(Operation::SetTransactionMaxTraceSegments, rv)
    }

    fn add_transaction_attribute(
        &self,
        transaction: TransactionId,
        name: &str,
        value: &str,
    ) -> Result<()> {
        let op = Operation::AddTransactionAttribute;
        let name = self.buffer(op, "name", name)?;
        let value = self.buffer(op, "value", value)?;
        // SAFETY: both buffers outlive the call.
        let rv = unsafe {
            self.library
                .transaction_add_attribute(transaction.as_native(), name.as_ptr(), value.as_ptr())
        };
        self.status(op, rv)
    }

    fn notice_transaction_error(
        &self,
        transaction: TransactionId,
        exception_type: &str,
        error_message: &str,
        stack_trace: &str,
        stack_frame_delimiter: &str,
    ) -> Result<()> {
        let op = Operation::NoticeTransactionError;
        let exception_type = self.buffer(op, "exception_type", exception_type)?;
        let error_message = self.buffer(op, "error_message", error_message)?;
        let stack_trace = self.buffer(op, "stack_trace", stack_trace)?;
        let delimiter = self.buffer(op, "stack_frame_delimiter", stack_frame_delimiter)?;
        // SAFETY: all buffers outlive the call.
        let rv = unsafe {
            self.library.transaction_notice_error(
                transaction.as_native(),
                exception_type.as_ptr(),
                error_message.as_ptr(),
                stack_trace.as_ptr(),
                delimiter.as_ptr(),
            )
        };
        self.status(op, rv)
    }

    fn end_transaction(&self, transaction: TransactionId) -> Result<()> {
        let rv = self.library.transaction_end(transaction.as_native());
        self.status(Operation::EndTransaction, rv)
    }
}

impl<L: NativeLibrary> ISegmentTracer for Agent<L> {
    fn begin_generic_segment(
        &self,
        transaction: TransactionId,
        parent: SegmentId,
        name: &str,
    ) -> Result<SegmentId> {
        let op = Operation::BeginGenericSegment;
        let name = self.buffer(op, "name", name)?;
        // SAFETY: `name` outlives the call.
        let raw = unsafe {
            self.library.segment_generic_begin(
                transaction.as_native(),
                parent.as_native(),
                name.as_ptr(),
            )
        };
        self.segment(op, raw)
    }

    fn begin_datastore_segment(
        &self,
        transaction: TransactionId,
        parent: SegmentId,
        params: &DatastoreParams<'_>,
    ) -> Result<SegmentId> {
        let op = Operation::BeginDatastoreSegment;
        let table = self.buffer(op, "table", params.table)?;
        let operation = self.buffer(op, "operation", params.operation)?;
        let sql = self.buffer(op, "sql", params.sql)?;
        let rollup_name = self.buffer(op, "rollup_name", params.rollup_name)?;
        // SAFETY: all buffers outlive the call.
        let raw = unsafe {
            self.library.segment_datastore_begin(
                transaction.as_native(),
                parent.as_native(),
                table.as_ptr(),
                operation.as_ptr(),
                sql.as_ptr(),
                rollup_name.as_ptr(),
            )
        };
        self.segment(op, raw)
    }

    fn begin_external_segment(
        &self,
        transaction: TransactionId,
        parent: SegmentId,
        host: &str,
        name: &str,
    ) -> Result<SegmentId> {
        let op = Operation::BeginExternalSegment;
        let host = self.buffer(op, "host", host)?;
        let name = self.buffer(op, "name", name)?;
        // SAFETY: both buffers outlive the call.
        let raw = unsafe {
            self.library.segment_external_begin(
                transaction.as_native(),
                parent.as_native(),
                host.as_ptr(),
                name.as_ptr(),
            )
        };
        self.segment(op, raw)
    }

    fn end_segment(&self, transaction: TransactionId, segment: SegmentId) -> Result<()> {
        let rv = self
            .library
            .segment_end(transaction.as_native(), segment.as_native());
        self.status(Operation::EndSegment, rv)
    }
}

impl<L: NativeLibrary> IMetricRecorder for Agent<L> {
    fn record_metric(&self, name: &str, value: f64) -> Result<()> {
        let op = Operation::RecordMetric;
        let name = self.buffer(op, "name", name)?;
        // SAFETY: `name` outlives the call.
        let rv = unsafe { self.library.record_metric(name.as_ptr(), value) };
        self.status(op, rv)
    }

    fn record_cpu_usage(&self, cpu_user_time_seconds: f64, cpu_usage_percent: f64) -> Result<()> {
        let rv = self
            .library
            .record_cpu_usage(cpu_user_time_seconds, cpu_usage_percent);
        self.status(Operation::RecordCpuUsage, rv)
    }

    fn record_memory_usage(&self, memory_megabytes: f64) -> Result<()> {
        let rv = self.library.record_memory_usage(memory_megabytes);
        self.status(Operation::RecordMemoryUsage, rv)
    }
}
