//! Boundary with the native agent library.
//!
//! [`NativeLibrary`] mirrors the C entry points of the Agent SDK one-to-one.
//! String arguments travel as null-terminated buffers allocated through the
//! library itself and owned by a [`CBuffer`] for the duration of one call.

use std::ptr;

use libc::{c_char, c_double, c_int, c_long};

use crate::error::{Error, Operation, Result};

#[cfg(feature = "sdk")]
mod sdk;
#[cfg(feature = "sdk")]
pub use sdk::SdkLibrary;

#[cfg(test)]
pub(crate) mod fake;

/// Copies `value` into a fresh `malloc` buffer and appends the terminator.
///
/// Returns null when the allocation fails. The caller must not pass strings
/// containing NUL bytes; see [`CBuffer::new`].
pub fn malloc_cstring(value: &str) -> *mut c_char {
    let bytes = value.as_bytes();
    // SAFETY: the buffer is `len + 1` bytes and both writes stay inside it.
    unsafe {
        let buf = libc::malloc(bytes.len() + 1) as *mut u8;
        if buf.is_null() {
            return ptr::null_mut();
        }
        ptr::copy_nonoverlapping(bytes.as_ptr(), buf, bytes.len());
        *buf.add(bytes.len()) = 0;
        buf as *mut c_char
    }
}

/// Releases a buffer produced by [`malloc_cstring`].
///
/// # Safety
/// `ptr` must come from [`malloc_cstring`] and not have been released yet.
pub unsafe fn free_cstring(ptr: *mut c_char) {
    if !ptr.is_null() {
        libc::free(ptr as *mut libc::c_void);
    }
}

/// The native agent's C API.
///
/// Implementations forward each method to the matching `newrelic_*` entry
/// point. Pointer arguments are valid null-terminated strings for the
/// duration of the call only.
///
/// No thread bounds are imposed; an [`Agent`](crate::Agent) over the library
/// is `Send` or `Sync` exactly when the library is.
pub trait NativeLibrary {
    /// Allocates a null-terminated copy of `value` for a native call.
    fn allocate(&self, value: &str) -> *mut c_char {
        malloc_cstring(value)
    }

    /// # Safety
    /// `ptr` must come from [`NativeLibrary::allocate`] on the same library
    /// and must be released exactly once.
    unsafe fn release(&self, ptr: *mut c_char) {
        free_cstring(ptr)
    }

    /// Routes collector traffic through the in-process collector client.
    fn register_message_handler(&self);

    /// # Safety
    /// All pointers must be valid null-terminated strings.
    unsafe fn init(
        &self,
        license: *const c_char,
        app_name: *const c_char,
        language: *const c_char,
        language_version: *const c_char,
    ) -> c_int;

    /// # Safety
    /// `reason` must be a valid null-terminated string.
    unsafe fn request_shutdown(&self, reason: *const c_char) -> c_int;

    fn transaction_begin(&self) -> c_long;

    fn transaction_set_type_web(&self, transaction_id: c_long) -> c_int;

    fn transaction_set_type_other(&self, transaction_id: c_long) -> c_int;

    /// # Safety
    /// `name` must be a valid null-terminated string.
    unsafe fn transaction_set_name(&self, transaction_id: c_long, name: *const c_char) -> c_int;

    /// # Safety
    /// `category` must be a valid null-terminated string.
    unsafe fn transaction_set_category(
        &self,
        transaction_id: c_long,
        category: *const c_char,
    ) -> c_int;

    /// # Safety
    /// `url` must be a valid null-terminated string.
    unsafe fn transaction_set_request_url(&self, transaction_id: c_long, url: *const c_char)
        -> c_int;

    fn transaction_set_max_trace_segments(
        &self,
        transaction_id: c_long,
        max_trace_segments: c_int,
    ) -> c_int;

    /// # Safety
    /// `name` and `value` must be valid null-terminated strings.
    unsafe fn transaction_add_attribute(
        &self,
        transaction_id: c_long,
        name: *const c_char,
        value: *const c_char,
    ) -> c_int;

    /// # Safety
    /// All pointers must be valid null-terminated strings.
    unsafe fn transaction_notice_error(
        &self,
        transaction_id: c_long,
        exception_type: *const c_char,
        error_message: *const c_char,
        stack_trace: *const c_char,
        stack_frame_delimiter: *const c_char,
    ) -> c_int;

    fn transaction_end(&self, transaction_id: c_long) -> c_int;

    /// # Safety
    /// `name` must be a valid null-terminated string.
    unsafe fn segment_generic_begin(
        &self,
        transaction_id: c_long,
        parent_segment_id: c_long,
        name: *const c_char,
    ) -> c_long;

    /// Starts a datastore segment. Implementations pass the SDK's basic
    /// literal-replacement obfuscator so `sql` is never recorded verbatim.
    ///
    /// # Safety
    /// All pointers must be valid null-terminated strings.
    unsafe fn segment_datastore_begin(
        &self,
        transaction_id: c_long,
        parent_segment_id: c_long,
        table: *const c_char,
        operation: *const c_char,
        sql: *const c_char,
        sql_trace_rollup_name: *const c_char,
    ) -> c_long;

    /// # Safety
    /// `host` and `name` must be valid null-terminated strings.
    unsafe fn segment_external_begin(
        &self,
        transaction_id: c_long,
        parent_segment_id: c_long,
        host: *const c_char,
        name: *const c_char,
    ) -> c_long;

    fn segment_end(&self, transaction_id: c_long, segment_id: c_long) -> c_int;

    /// # Safety
    /// `name` must be a valid null-terminated string.
    unsafe fn record_metric(&self, name: *const c_char, value: c_double) -> c_int;

    fn record_cpu_usage(&self, cpu_user_time_seconds: c_double, cpu_usage_percent: c_double)
        -> c_int;

    fn record_memory_usage(&self, memory_megabytes: c_double) -> c_int;
}

/// A null-terminated copy of one string argument, released on drop.
pub struct CBuffer<'a, L: NativeLibrary + ?Sized> {
    library: &'a L,
    ptr: *mut c_char,
}

impl<'a, L: NativeLibrary + ?Sized> CBuffer<'a, L> {
    /// Marshals `value` for `operation`. `argument` names the parameter in
    /// errors.
    pub fn new(
        library: &'a L,
        operation: Operation,
        argument: &'static str,
        value: &str,
    ) -> Result<Self> {
        if value.as_bytes().contains(&0) {
            return Err(Error::InteriorNul { operation, argument });
        }
        let ptr = library.allocate(value);
        if ptr.is_null() {
            return Err(Error::Allocation { operation, argument });
        }
        Ok(CBuffer { library, ptr })
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.ptr
    }
}

impl<L: NativeLibrary + ?Sized> Drop for CBuffer<'_, L> {
    fn drop(&mut self) {
        // SAFETY: `ptr` came from `allocate` on this library and is only
        // released here.
        unsafe { self.library.release(self.ptr) }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeLibrary;
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_malloc_cstring_terminates() {
        let ptr = malloc_cstring("orders");
        assert!(!ptr.is_null());
        unsafe {
            assert_eq!(CStr::from_ptr(ptr).to_str().unwrap(), "orders");
            assert_eq!(*ptr.add(6), 0);
            free_cstring(ptr);
        }
    }

    #[test]
    fn test_empty_string_is_a_bare_terminator() {
        let ptr = malloc_cstring("");
        unsafe {
            assert_eq!(*ptr, 0);
            free_cstring(ptr);
        }
    }

    #[test]
    fn test_buffer_released_on_drop() {
        let library = FakeLibrary::new();
        {
            let buf = CBuffer::new(&library, Operation::RecordMetric, "name", "Custom/x").unwrap();
            assert!(!buf.as_ptr().is_null());
            assert_eq!(library.live_buffers(), 1);
        }
        assert_eq!(library.allocations(), 1);
        assert_eq!(library.releases(), 1);
        assert_eq!(library.live_buffers(), 0);
    }

    #[test]
    fn test_interior_nul_rejected_without_allocating() {
        let library = FakeLibrary::new();
        let err = CBuffer::new(&library, Operation::SetTransactionName, "name", "a\0b")
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::InteriorNul { operation: Operation::SetTransactionName, argument: "name" }
        ));
        assert_eq!(library.allocations(), 0);
    }

    #[test]
    fn test_null_allocation_reported() {
        let library = FakeLibrary::new().fail_allocation_at(0);
        let err = CBuffer::new(&library, Operation::RecordMetric, "name", "x")
            .err()
            .unwrap();
        assert!(matches!(err, Error::Allocation { argument: "name", .. }));
        assert_eq!(library.releases(), 0);
    }
}
