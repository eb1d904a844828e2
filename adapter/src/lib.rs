//! Host OS services consumed by `mlooper-kernel`.
//!
//! `mlooper-kernel` never calls `std::thread` or `std::time::Instant`
//! directly; it goes through [`thread`] and [`clock`] instead, the same
//! separation the teacher draws between its kernel crate and its
//! `rt_thread`/`rtthread` adapters. There is only one implementation here
//! (the host OS), so unlike the teacher's adapters this crate is not
//! swapped per board — but keeping the boundary means a future bare-metal
//! adapter can be dropped in without touching `mlooper-kernel`.

pub mod clock;
pub mod thread;

pub use clock::Clock;
pub use thread::{JoinHandle, ThreadId};
