//! `mlooper-kernel`: MessageQueue, Looper, Handler and Watchdog, an
//! Android-Looper/Handler-style message loop toolkit for POSIX hosts.
//!
//! See `SPEC_FULL.md` at the workspace root for the full module map; each
//! submodule here corresponds to one of spec.md §3-§4's components.

pub mod config;
pub mod error;
pub mod handler;
pub mod handler_thread;
pub mod looper;
pub mod message;
pub mod queue;
pub mod watchdog;

pub use error::{LooperError, Result};
pub use handler::{Handler, HandlerCallback, HandlerId};
pub use handler_thread::HandlerThread;
pub use looper::{Looper, LooperSnapshot, LooperState};
pub use message::{FreeFn, HandleFn, Message, Owner};
pub use watchdog::WatchdogNode;
