//! Rust binding for the New Relic Agent SDK C API.
//!
//! Each operation marshals its string arguments into native buffers, makes a
//! single call into the agent, releases the buffers and maps the returned
//! status code to [`Error`]. All transaction, segment and metric state lives in
//! the native library.
//!
//! Build with the `sdk` feature to link the SDK and use [`Agent::sdk`]. Any
//! other [`NativeLibrary`] implementation can be plugged into [`Agent::new`].
pub mod agent;
pub mod config;
pub mod error;
pub mod ffi;
pub mod status;
pub mod traits;

// Re-export the public surface at the crate root
pub use agent::*;
pub use config::{AgentConfig, ConfigError};
pub use error::{Error, Operation, Result};
pub use ffi::{CBuffer, NativeLibrary};
pub use status::Status;
pub use traits::*;
