//! Error taxonomy for the message-loop toolkit.
//!
//! The taxonomy mirrors the kinds the teacher's own `error::Error` newtype
//! carries (`InvalidArgument`≈`EINVAL`, `ResourceExhausted`≈`ENOMEM`, …) but
//! is expressed as a plain enum: this crate never crosses an FFI boundary,
//! so there is no `bindgen`-facing reason to keep errors as an errno-shaped
//! `i32` newtype the way the teacher's `no_std` kernel must.

use std::fmt;

/// Why a looper/handler/watchdog operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LooperError {
    /// A null/absent message, an unresolvable handler on post, or
    /// `timeout_ms <= delay_ms`.
    InvalidArgument(&'static str),
    /// The OS could not hand back a thread, mutex, or condvar.
    ResourceExhausted(&'static str),
    /// `stop_safely` (or similar blocking call) was invoked from the
    /// looper's own worker thread; the call returned without blocking
    /// instead of deadlocking.
    MisuseWarning(&'static str),
    /// The looper has already exited; no further posts are accepted.
    LooperExited,
}

impl fmt::Display for LooperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LooperError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            LooperError::ResourceExhausted(msg) => write!(f, "resource exhausted: {msg}"),
            LooperError::MisuseWarning(msg) => write!(f, "misuse: {msg}"),
            LooperError::LooperExited => write!(f, "looper has already exited"),
        }
    }
}

impl std::error::Error for LooperError {}

pub type Result<T> = std::result::Result<T, LooperError>;
