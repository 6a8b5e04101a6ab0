//! Instrumented stand-in for the native agent.
//!
//! Counts buffer allocations and releases, checks that every string handed to
//! an entry point is a live, null-terminated buffer, records decoded
//! arguments, and answers with scripted status codes and handles.

use std::collections::HashMap;
use std::ffi::CStr;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use libc::{c_char, c_double, c_int, c_long};

use super::{free_cstring, malloc_cstring, NativeLibrary};

/// One native call as seen by the fake.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub entry: &'static str,
    pub ids: Vec<i64>,
    pub strings: Vec<String>,
    pub values: Vec<f64>,
}

impl Call {
    fn new(entry: &'static str) -> Self {
        Call { entry, ids: Vec::new(), strings: Vec::new(), values: Vec::new() }
    }

    fn id(mut self, id: c_long) -> Self {
        self.ids.push(id as i64);
        self
    }

    fn value(mut self, value: c_double) -> Self {
        self.values.push(value);
        self
    }
}

pub(crate) struct FakeLibrary {
    status: AtomicI32,
    handle: AtomicI64,
    fail_allocation_at: Option<usize>,
    attempts: AtomicUsize,
    allocations: AtomicUsize,
    releases: AtomicUsize,
    foreign_releases: AtomicUsize,
    bad_arguments: AtomicUsize,
    handler_registered: AtomicBool,
    // address -> string length, for buffers not yet released
    live: Mutex<HashMap<usize, usize>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeLibrary {
    pub(crate) fn new() -> Self {
        FakeLibrary {
            status: AtomicI32::new(0),
            handle: AtomicI64::new(1),
            fail_allocation_at: None,
            attempts: AtomicUsize::new(0),
            allocations: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
            foreign_releases: AtomicUsize::new(0),
            bad_arguments: AtomicUsize::new(0),
            handler_registered: AtomicBool::new(false),
            live: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every status-returning entry point answers `code`.
    pub(crate) fn with_status(self, code: i32) -> Self {
        self.status.store(code, Ordering::SeqCst);
        self
    }

    /// Every handle-returning entry point answers `handle`.
    pub(crate) fn with_handle(self, handle: i64) -> Self {
        self.handle.store(handle, Ordering::SeqCst);
        self
    }

    /// The `index`-th allocation (zero based) returns null.
    pub(crate) fn fail_allocation_at(mut self, index: usize) -> Self {
        self.fail_allocation_at = Some(index);
        self
    }

    pub(crate) fn set_status(&self, code: i32) {
        self.status.store(code, Ordering::SeqCst);
    }

    pub(crate) fn set_handle(&self, handle: i64) {
        self.handle.store(handle, Ordering::SeqCst);
    }

    /// Buffers handed out successfully.
    pub(crate) fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    pub(crate) fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Releases of pointers that were never allocated or already released.
    pub(crate) fn foreign_releases(&self) -> usize {
        self.foreign_releases.load(Ordering::SeqCst)
    }

    /// String arguments that were not live, null-terminated buffers.
    pub(crate) fn bad_arguments(&self) -> usize {
        self.bad_arguments.load(Ordering::SeqCst)
    }

    pub(crate) fn live_buffers(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    pub(crate) fn handler_registered(&self) -> bool {
        self.handler_registered.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn last_call(&self) -> Option<Call> {
        self.calls.lock().unwrap().last().cloned()
    }

    /// Asserts that every buffer was released exactly once and every string
    /// argument was well formed.
    pub(crate) fn assert_balanced(&self) {
        assert_eq!(self.allocations(), self.releases(), "allocations and releases differ");
        assert_eq!(self.live_buffers(), 0, "buffers still live");
        assert_eq!(self.foreign_releases(), 0, "released a buffer twice or foreign pointer");
        assert_eq!(self.bad_arguments(), 0, "malformed string argument");
    }

    fn decode(&self, ptr: *const c_char) -> String {
        let expected_len = self.live.lock().unwrap().get(&(ptr as usize)).copied();
        let Some(expected_len) = expected_len else {
            self.bad_arguments.fetch_add(1, Ordering::SeqCst);
            return String::new();
        };
        // SAFETY: the pointer is a live buffer of `expected_len + 1` bytes.
        let (terminator, text) = unsafe {
            (*ptr.add(expected_len), CStr::from_ptr(ptr).to_string_lossy().into_owned())
        };
        if terminator != 0 || text.len() != expected_len {
            self.bad_arguments.fetch_add(1, Ordering::SeqCst);
        }
        text
    }

    fn string(&self, mut call: Call, ptr: *const c_char) -> Call {
        call.strings.push(self.decode(ptr));
        call
    }

    fn record_status(&self, call: Call) -> c_int {
        self.calls.lock().unwrap().push(call);
        self.status.load(Ordering::SeqCst)
    }

    fn record_handle(&self, call: Call) -> c_long {
        self.calls.lock().unwrap().push(call);
        self.handle.load(Ordering::SeqCst) as c_long
    }
}

impl NativeLibrary for FakeLibrary {
    fn allocate(&self, value: &str) -> *mut c_char {
        let index = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_allocation_at == Some(index) {
            return std::ptr::null_mut();
        }
        let ptr = malloc_cstring(value);
        if !ptr.is_null() {
            self.allocations.fetch_add(1, Ordering::SeqCst);
            self.live.lock().unwrap().insert(ptr as usize, value.len());
        }
        ptr
    }

    unsafe fn release(&self, ptr: *mut c_char) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        if self.live.lock().unwrap().remove(&(ptr as usize)).is_some() {
            free_cstring(ptr);
        } else {
            self.foreign_releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn register_message_handler(&self) {
        self.handler_registered.store(true, Ordering::SeqCst);
        self.calls.lock().unwrap().push(Call::new("register_message_handler"));
    }

    unsafe fn init(
        &self,
        license: *const c_char,
        app_name: *const c_char,
        language: *const c_char,
        language_version: *const c_char,
    ) -> c_int {
        let call = Call::new("init");
        let call = self.string(call, license);
        let call = self.string(call, app_name);
        let call = self.string(call, language);
        let call = self.string(call, language_version);
        self.record_status(call)
    }

    unsafe fn request_shutdown(&self, reason: *const c_char) -> c_int {
        let call = self.string(Call::new("request_shutdown"), reason);
        self.record_status(call)
    }

    fn transaction_begin(&self) -> c_long {
        self.record_handle(Call::new("transaction_begin"))
    }

    fn transaction_set_type_web(&self, transaction_id: c_long) -> c_int {
        self.record_status(Call::new("transaction_set_type_web").id(transaction_id))
    }

    fn transaction_set_type_other(&self, transaction_id: c_long) -> c_int {
        self.record_status(Call::new("transaction_set_type_other").id(transaction_id))
    }

    unsafe fn transaction_set_name(&self, transaction_id: c_long, name: *const c_char) -> c_int {
        let call = self.string(Call::new("transaction_set_name").id(transaction_id), name);
        self.record_status(call)
    }

    unsafe fn transaction_set_category(
        &self,
        transaction_id: c_long,
        category: *const c_char,
    ) -> c_int {
        let call = self.string(Call::new("transaction_set_category").id(transaction_id), category);
        self.record_status(call)
    }

    unsafe fn transaction_set_request_url(
        &self,
        transaction_id: c_long,
        url: *const c_char,
    ) -> c_int {
        let call = self.string(Call::new("transaction_set_request_url").id(transaction_id), url);
        self.record_status(call)
    }

    fn transaction_set_max_trace_segments(
        &self,
        transaction_id: c_long,
        max_trace_segments: c_int,
    ) -> c_int {
        self.record_status(
            Call::new("transaction_set_max_trace_segments")
                .id(transaction_id)
                .id(max_trace_segments as c_long),
        )
    }

    unsafe fn transaction_add_attribute(
        &self,
        transaction_id: c_long,
        name: *const c_char,
        value: *const c_char,
    ) -> c_int {
        let call = Call::new("transaction_add_attribute").id(transaction_id);
        let call = self.string(call, name);
        let call = self.string(call, value);
        self.record_status(call)
    }

    unsafe fn transaction_notice_error(
        &self,
        transaction_id: c_long,
        exception_type: *const c_char,
        error_message: *const c_char,
        stack_trace: *const c_char,
        stack_frame_delimiter: *const c_char,
    ) -> c_int {
        let call = Call::new("transaction_notice_error").id(transaction_id);
        let call = self.string(call, exception_type);
        let call = self.string(call, error_message);
        let call = self.string(call, stack_trace);
        let call = self.string(call, stack_frame_delimiter);
        self.record_status(call)
    }

    fn transaction_end(&self, transaction_id: c_long) -> c_int {
        self.record_status(Call::new("transaction_end").id(transaction_id))
    }

    unsafe fn segment_generic_begin(
        &self,
        transaction_id: c_long,
        parent_segment_id: c_long,
        name: *const c_char,
    ) -> c_long {
        let call = Call::new("segment_generic_begin").id(transaction_id).id(parent_segment_id);
        let call = self.string(call, name);
        self.record_handle(call)
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
        let call = Call::new("segment_datastore_begin").id(transaction_id).id(parent_segment_id);
        let call = self.string(call, table);
        let call = self.string(call, operation);
        let call = self.string(call, sql);
        let call = self.string(call, sql_trace_rollup_name);
        self.record_handle(call)
    }

    unsafe fn segment_external_begin(
        &self,
        transaction_id: c_long,
        parent_segment_id: c_long,
        host: *const c_char,
        name: *const c_char,
    ) -> c_long {
        let call = Call::new("segment_external_begin").id(transaction_id).id(parent_segment_id);
        let call = self.string(call, host);
        let call = self.string(call, name);
        self.record_handle(call)
    }

    fn segment_end(&self, transaction_id: c_long, segment_id: c_long) -> c_int {
        self.record_status(Call::new("segment_end").id(transaction_id).id(segment_id))
    }

    unsafe fn record_metric(&self, name: *const c_char, value: c_double) -> c_int {
        let call = self.string(Call::new("record_metric"), name).value(value);
        self.record_status(call)
    }

    fn record_cpu_usage(&self, cpu_user_time_seconds: c_double, cpu_usage_percent: c_double) -> c_int {
        self.record_status(
            Call::new("record_cpu_usage")
                .value(cpu_user_time_seconds)
                .value(cpu_usage_percent),
        )
    }

    fn record_memory_usage(&self, memory_megabytes: c_double) -> c_int {
        self.record_status(Call::new("record_memory_usage").value(memory_megabytes))
    }
}
