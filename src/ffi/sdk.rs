//! [`NativeLibrary`] over the linked New Relic Agent SDK.

use libc::{c_char, c_double, c_int, c_long};

use super::NativeLibrary;

#[allow(non_upper_case_globals)]
#[allow(non_camel_case_types)]
#[allow(non_snake_case)]
#[allow(dead_code)]
mod sys {
    // Generated by build.rs from the SDK headers
    include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
}

// Handles cross the boundary as `long`; they must hold a full i64.
const _: () = assert!(
    std::mem::size_of::<c_long>() == 8,
    "the New Relic Agent SDK requires an LP64 target"
);

/// The process-wide native agent. All state lives inside the SDK.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkLibrary;

impl NativeLibrary for SdkLibrary {
    fn register_message_handler(&self) {
        // SAFETY: registers the SDK's own handler; takes no Rust data.
        unsafe { sys::newrelic_register_message_handler(Some(sys::newrelic_message_handler)) }
    }

    unsafe fn init(
        &self,
        license: *const c_char,
        app_name: *const c_char,
        language: *const c_char,
        language_version: *const c_char,
    ) -> c_int {
        sys::newrelic_init(license, app_name, language, language_version)
    }

    unsafe fn request_shutdown(&self, reason: *const c_char) -> c_int {
        sys::newrelic_request_shutdown(reason)
    }

    fn transaction_begin(&self) -> c_long {
        // SAFETY: no arguments.
        unsafe { sys::newrelic_transaction_begin() }
    }

    fn transaction_set_type_web(&self, transaction_id: c_long) -> c_int {
        // SAFETY: plain integer argument; the SDK validates the id.
        unsafe { sys::newrelic_transaction_set_type_web(transaction_id) }
    }

    fn transaction_set_type_other(&self, transaction_id: c_long) -> c_int {
        // SAFETY: plain integer argument; the SDK validates the id.
        unsafe { sys::newrelic_transaction_set_type_other(transaction_id) }
    }

    unsafe fn transaction_set_name(&self, transaction_id: c_long, name: *const c_char) -> c_int {
        sys::newrelic_transaction_set_name(transaction_id, name)
    }

    unsafe fn transaction_set_category(
        &self,
        transaction_id: c_long,
        category: *const c_char,
    ) -> c_int {
        sys::newrelic_transaction_set_category(transaction_id, category)
    }

    unsafe fn transaction_set_request_url(
        &self,
        transaction_id: c_long,
        url: *const c_char,
    ) -> c_int {
        sys::newrelic_transaction_set_request_url(transaction_id, url)
    }

    fn transaction_set_max_trace_segments(
        &self,
        transaction_id: c_long,
        max_trace_segments: c_int,
    ) -> c_int {
        // SAFETY: plain integer arguments.
        unsafe { sys::newrelic_transaction_set_max_trace_segments(transaction_id, max_trace_segments) }
    }

    unsafe fn transaction_add_attribute(
        &self,
        transaction_id: c_long,
        name: *const c_char,
        value: *const c_char,
    ) -> c_int {
        sys::newrelic_transaction_add_attribute(transaction_id, name, value)
    }

    unsafe fn transaction_notice_error(
        &self,
        transaction_id: c_long,
        exception_type: *const c_char,
        error_message: *const c_char,
        stack_trace: *const c_char,
        stack_frame_delimiter: *const c_char,
    ) -> c_int {
        sys::newrelic_transaction_notice_error(
            transaction_id,
            exception_type,
            error_message,
            stack_trace,
            stack_frame_delimiter,
        )
    }

    fn transaction_end(&self, transaction_id: c_long) -> c_int {
        // SAFETY: plain integer argument; the SDK validates the id.
        unsafe { sys::newrelic_transaction_end(transaction_id) }
    }

    unsafe fn segment_generic_begin(
        &self,
        transaction_id: c_long,
        parent_segment_id: c_long,
        name: *const c_char,
    ) -> c_long {
        sys::newrelic_segment_generic_begin(transaction_id, parent_segment_id, name)
    }

    unsafe fn segment_datastore_begin(
        &self,
        transaction_id: c_long,
        parent_segment_id: c_long,
        table: *const c_char,
        operation: *const c_char,
        sql: *const c_char,
        sql_trace_rollup_name: *const c_char,
    ) -> c_long {
        sys::newrelic_segment_datastore_begin(
            transaction_id,
            parent_segment_id,
            table,
            operation,
            sql,
            sql_trace_rollup_name,
            Some(sys::newrelic_basic_literal_replacement_obfuscator),
        )
    }

    unsafe fn segment_external_begin(
        &self,
        transaction_id: c_long,
        parent_segment_id: c_long,
        host: *const c_char,
        name: *const c_char,
    ) -> c_long {
        sys::newrelic_segment_external_begin(transaction_id, parent_segment_id, host, name)
    }

    fn segment_end(&self, transaction_id: c_long, segment_id: c_long) -> c_int {
        // SAFETY: plain integer arguments; the SDK validates both ids.
        unsafe { sys::newrelic_segment_end(transaction_id, segment_id) }
    }

    unsafe fn record_metric(&self, name: *const c_char, value: c_double) -> c_int {
        sys::newrelic_record_metric(name, value)
    }

    fn record_cpu_usage(&self, cpu_user_time_seconds: c_double, cpu_usage_percent: c_double) -> c_int {
        // SAFETY: plain floating point arguments.
        unsafe { sys::newrelic_record_cpu_usage(cpu_user_time_seconds, cpu_usage_percent) }
    }

    fn record_memory_usage(&self, memory_megabytes: c_double) -> c_int {
        // SAFETY: plain floating point argument.
        unsafe { sys::newrelic_record_memory_usage(memory_megabytes) }
    }
}
