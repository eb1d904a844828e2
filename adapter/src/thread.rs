//! Thread spawning and identity, standing in for the teacher's
//! `rt_thread_create`/`rt_thread_startup`/`rt_thread_self` trio.
//!
//! The teacher assigns each `Thread` a `Tid` off a process-wide
//! `AtomicUsize` counter (`kernel/src/thread.rs`'s `TIDS`/`TID.fetch_add`);
//! `ThreadId` here does the same, since `std::thread::ThreadId` exists but
//! offers no stable ordering/hashing contract across std versions and the
//! kernel needs to use it as a map/owner key.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::Builder;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THIS_THREAD: Cell<Option<ThreadId>> = const { Cell::new(None) };
}

/// Opaque, process-unique identity for an OS thread, assigned lazily the
/// first time that thread calls [`current`]. Standing in for
/// `rt_thread_self`, which is "return current thread identity for
/// comparison" (spec.md §6.1) rather than a value anyone constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(u64);

/// The calling thread's identity, assigning one on first use.
pub fn current() -> ThreadId {
    THIS_THREAD.with(|cell| {
        if let Some(id) = cell.get() {
            return id;
        }
        let id = ThreadId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
        cell.set(Some(id));
        id
    })
}

/// A spawned worker thread.
pub struct JoinHandle<T>(std::thread::JoinHandle<T>);

impl<T> JoinHandle<T> {
    pub fn join(self) -> std::thread::Result<T> {
        self.0.join()
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

/// Spawn a named worker thread, mirroring `rt_thread_create` +
/// `rt_thread_startup` collapsed into one call since there is no separate
/// "create suspended, then start" step worth modeling on a hosted OS.
pub fn spawn<F, T>(name: impl Into<String>, f: F) -> std::io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let inner = Builder::new().name(name.into()).spawn(f)?;
    Ok(JoinHandle(inner))
}

/// Equivalent of `rt_thread_mdelay`.
pub fn sleep_ms(ms: u64) {
    std::thread::sleep(std::time::Duration::from_millis(ms));
}

/// Equivalent of `rt_thread_yield`.
pub fn yield_now() {
    std::thread::yield_now();
}
