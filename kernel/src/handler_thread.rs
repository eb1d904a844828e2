//! `HandlerThread`: bundles "create a Looper" and "start its worker thread"
//! into one constructible unit (SPEC_FULL.md "Supplemented features" #1),
//! grounded on `original_source/include/utils/Looper.h`'s `HandlerThread`
//! (`run()`/`requestExit()`/`requestExitAndWait()`/`isRunning()`/
//! `getLooper()`).

use crate::config::DEFAULT_LOOPER_THREAD_NAME;
use crate::error::Result;
use crate::looper::{Looper, LooperState};

/// A `Looper` paired with the thread that runs it, so callers who just want
/// "a thread with a message loop" don't hand-assemble `Looper::create` +
/// `Looper::start` themselves.
pub struct HandlerThread {
    looper: Looper,
}

impl HandlerThread {
    /// Builds the looper but does not start its worker thread yet; matches
    /// the original's constructor, which stores the name/priority/stacksize
    /// but defers spawning until `run()`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            looper: Looper::create(name),
        }
    }

    /// `HandlerThread(name = 0, ...)`: the original's default-name
    /// constructor overload.
    pub fn new_unnamed() -> Self {
        Self::new(DEFAULT_LOOPER_THREAD_NAME)
    }

    /// `HandlerThread::run()`: starts the worker thread if it hasn't been
    /// started yet. Idempotent, like `Looper::start`.
    pub fn run(&self) -> Result<()> {
        self.looper.start()
    }

    /// `HandlerThread::requestExit()`: non-blocking stop.
    pub fn request_exit(&self) {
        self.looper.stop();
    }

    /// `HandlerThread::requestExitAndWait()`: blocking stop.
    pub fn request_exit_and_wait(&self) -> Result<()> {
        self.looper.stop_safely()
    }

    /// `HandlerThread::isRunning()`.
    pub fn is_running(&self) -> bool {
        self.looper.state() == LooperState::Running
    }

    /// `HandlerThread::getLooper()`: a handle callers build `Handler`s on.
    pub fn looper(&self) -> &Looper {
        &self.looper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn run_starts_the_looper_and_dispatches() {
        let ht = HandlerThread::new("ht-test");
        assert!(!ht.is_running());
        ht.run().unwrap();
        assert!(ht.is_running());

        let seen = Arc::new(AtomicI32::new(0));
        let seen_cb = seen.clone();
        ht.looper()
            .post(Message::obtain_what(42).with_handle_cb(Box::new(move |m| {
                seen_cb.store(m.what, Ordering::SeqCst);
            })))
            .unwrap();

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(seen.load(Ordering::SeqCst), 42);

        ht.request_exit_and_wait().unwrap();
        assert!(!ht.is_running());
    }
}
