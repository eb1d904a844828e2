//! The Looper: owns the worker thread and the dispatch loop (spec.md §4.1),
//! grounded on `source/msglooper.c`'s `mlooper_create/_start/_stop/
//! _post_message*` and `mlooper_thread_entry`.

use std::sync::{Condvar, Mutex};

use mlooper_adapter::{thread, Clock, ThreadId};
#[cfg(feature = "recycle-pool")]
use mlooper_infra::Pool;

use crate::config::DEFAULT_MESSAGE_POOL_CAPACITY;
use crate::error::{LooperError, Result};
use crate::message::{HandleFn, Message, Owner};
use crate::queue::{MessageQueue, Next};
use crate::watchdog::WatchdogNode;

/// `Created -> Running -> ExitPending -> Exited` (spec.md §4.1.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LooperState {
    Created,
    Running,
    ExitPending,
    Exited,
}

/// The data behind `Looper::dump_log`/`Looper::snapshot` (see
/// SPEC_FULL.md's "Supplemented features").
#[derive(Debug, Clone)]
pub struct LooperSnapshot {
    pub name: String,
    pub state: LooperState,
    pub message_count: usize,
    /// `(what, arg1, arg2, when)` per queued message, in dispatch order.
    pub messages: Vec<(i32, i32, i32, u64)>,
}

struct Inner {
    name: String,
    queue: MessageQueue,
    clock: Clock,
    default_handle_cb: Mutex<Option<HandleFn>>,
    default_free_cb: Mutex<Option<crate::message::FreeFn>>,
    state: Mutex<LooperState>,
    state_cond: Condvar,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    worker_thread_id: Mutex<Option<ThreadId>>,
    watchdog: Mutex<Option<WatchdogNode>>,
    #[cfg(feature = "recycle-pool")]
    pool: Mutex<Pool<Message>>,
}

/// Owns a worker thread, an ordered message queue, and the dispatch loop
/// (spec.md §3 Looper). Cheaply `Clone`-able: every clone refers to the
/// same underlying looper, the way callers hand a `Looper*` around in the
/// source.
#[derive(Clone)]
pub struct Looper(std::sync::Arc<Inner>);

impl Looper {
    pub fn create(name: impl Into<String>) -> Self {
        Self::create_full(name, None, None, DEFAULT_MESSAGE_POOL_CAPACITY)
    }

    pub fn create_with_defaults(
        name: impl Into<String>,
        default_handle_cb: Option<HandleFn>,
        default_free_cb: Option<crate::message::FreeFn>,
    ) -> Self {
        Self::create_full(name, default_handle_cb, default_free_cb, DEFAULT_MESSAGE_POOL_CAPACITY)
    }

    /// Resolves spec.md §9's open recycle-cache-size question by exposing
    /// it as a constructor parameter rather than hardcoding the default.
    pub fn create_with_pool_capacity(name: impl Into<String>, pool_capacity: usize) -> Self {
        Self::create_full(name, None, None, pool_capacity)
    }

    fn create_full(
        name: impl Into<String>,
        default_handle_cb: Option<HandleFn>,
        default_free_cb: Option<crate::message::FreeFn>,
        #[allow(unused_variables)] pool_capacity: usize,
    ) -> Self {
        Looper(std::sync::Arc::new(Inner {
            name: name.into(),
            queue: MessageQueue::new(),
            clock: Clock::new(),
            default_handle_cb: Mutex::new(default_handle_cb),
            default_free_cb: Mutex::new(default_free_cb),
            state: Mutex::new(LooperState::Created),
            state_cond: Condvar::new(),
            worker: Mutex::new(None),
            worker_thread_id: Mutex::new(None),
            watchdog: Mutex::new(None),
            #[cfg(feature = "recycle-pool")]
            pool: Mutex::new(Pool::new(pool_capacity)),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn state(&self) -> LooperState {
        *self.0.state.lock().unwrap()
    }

    /// Idempotent: spawns the worker thread only out of `Created`.
    pub fn start(&self) -> Result<()> {
        let mut state = self.0.state.lock().unwrap();
        match *state {
            LooperState::Created => {
                let worker_looper = self.clone();
                let handle = thread::spawn(self.0.name.clone(), move || worker_looper.run())
                    .map_err(|_| LooperError::ResourceExhausted("failed to spawn looper thread"))?;
                *self.0.worker.lock().unwrap() = Some(handle);
                *state = LooperState::Running;
                Ok(())
            }
            LooperState::Running | LooperState::ExitPending => Ok(()),
            LooperState::Exited => Err(LooperError::LooperExited),
        }
    }

    /// Non-blocking; safe to call from any thread other than the looper's
    /// own (spec.md §4.1.1, §4.1.5). Idempotent.
    pub fn stop(&self) {
        self.0.queue.request_exit();
        let mut state = self.0.state.lock().unwrap();
        if *state == LooperState::Running {
            *state = LooperState::ExitPending;
        }
    }

    /// Blocks until the worker has exited. Refuses (logs a warning, returns
    /// without blocking) if called from the looper's own worker thread
    /// (spec.md §4.1.5, the self-join guard).
    pub fn stop_safely(&self) -> Result<()> {
        if let Some(worker_id) = *self.0.worker_thread_id.lock().unwrap() {
            if worker_id == thread::current() {
                log::warn!(
                    "looper[{}]: stop_safely called from its own worker thread, ignoring",
                    self.0.name
                );
                return Err(LooperError::MisuseWarning(
                    "stop_safely called from the looper's own worker thread",
                ));
            }
        }

        self.stop();

        let state = self.0.state.lock().unwrap();
        let state = self
            .0
            .state_cond
            .wait_while(state, |s| *s != LooperState::Exited)
            .unwrap();
        drop(state);

        if let Some(handle) = self.0.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
        Ok(())
    }

    /// `post(msg)`: schedule at `now`.
    pub fn post(&self, msg: Message) -> Result<()> {
        self.post_delay(msg, 0)
    }

    /// `post_delay(msg, delay_ms)`: schedule at `now + delay_ms`.
    pub fn post_delay(&self, mut msg: Message, delay_ms: u64) -> Result<()> {
        if *self.0.state.lock().unwrap() == LooperState::Exited {
            self.run_free_path(msg);
            return Err(LooperError::LooperExited);
        }
        if !msg.has_handle_cb() && self.0.default_handle_cb.lock().unwrap().is_none() {
            log::warn!("looper[{}]: post with no resolvable handler, what={}", self.0.name, msg.what);
        }
        if msg.timeout_ms > 0 && msg.timeout_ms <= delay_ms {
            log::warn!(
                "looper[{}]: invalid timeout: timeout_ms <= delay_ms, what={}",
                self.0.name,
                msg.what
            );
            self.run_free_path(msg);
            return Err(LooperError::InvalidArgument("timeout_ms <= delay_ms"));
        }

        let now = self.0.clock.now_ms();
        let when = now + delay_ms;
        msg.when = when;
        msg.deadline = if msg.timeout_ms > 0 { Some(now + msg.timeout_ms) } else { None };
        if msg.owner().is_none() {
            msg.owner = Some(Owner::Thread(thread::current()));
        }
        self.0.queue.post(when, msg);
        Ok(())
    }

    /// `post_front(msg)` (spec.md §4.1.3): clamp `when` to no later than
    /// the current head, so this message dispatches next regardless of a
    /// past-due head.
    pub fn post_front(&self, mut msg: Message) -> Result<()> {
        if *self.0.state.lock().unwrap() == LooperState::Exited {
            self.run_free_path(msg);
            return Err(LooperError::LooperExited);
        }
        let now = self.0.clock.now_ms();
        let when = match self.0.queue.head_when() {
            Some(head_when) => now.min(head_when),
            None => now,
        };
        msg.when = when;
        msg.deadline = if msg.timeout_ms > 0 { Some(now + msg.timeout_ms) } else { None };
        if msg.owner().is_none() {
            msg.owner = Some(Owner::Thread(thread::current()));
        }
        self.0.queue.post_front(when, msg);
        Ok(())
    }

    /// Removes every queued message with matching `what` posted by the
    /// *calling* thread (spec.md §4.1.4, §8 property 6). Each removed
    /// message's free path runs synchronously before this returns.
    pub fn remove_message(&self, what: i32) {
        self.remove_message_if(|m| m.what == what);
    }

    pub fn remove_message_if(&self, pred: impl FnMut(&Message) -> bool) {
        let owner = Owner::Thread(thread::current());
        let removed = self.0.queue.remove_if(owner, pred);
        for msg in removed {
            self.run_free_path(msg);
        }
    }

    /// Used by `Handler::remove_message`/`Drop for Handler`: purge by
    /// `Owner::Handler` instead of the calling thread's identity.
    pub(crate) fn remove_by_handler(&self, id: crate::handler::HandlerId, pred: impl FnMut(&Message) -> bool) {
        let removed = self.0.queue.remove_if(Owner::Handler(id), pred);
        for msg in removed {
            self.run_free_path(msg);
        }
    }

    pub fn message_count(&self) -> usize {
        self.0.queue.len()
    }

    /// Textual dump at info level, matching `mlooper_dump`.
    pub fn dump_log(&self) {
        let snapshot = self.snapshot();
        log::info!("Dump looper thread:");
        log::info!(" > thread_name=[{}]", snapshot.name);
        log::info!(" > state=[{:?}]", snapshot.state);
        log::info!(" > message_count=[{}]", snapshot.message_count);
        for (i, (what, arg1, arg2, when)) in snapshot.messages.iter().enumerate() {
            log::info!("   > [{i}]: what=[{what}], arg1=[{arg1}], arg2=[{arg2}], when=[{when}]");
        }
    }

    /// The same information as `dump_log`, as data (SPEC_FULL.md
    /// "Supplemented features").
    pub fn snapshot(&self) -> LooperSnapshot {
        LooperSnapshot {
            name: self.0.name.clone(),
            state: self.state(),
            message_count: self.0.queue.len(),
            messages: self.0.queue.dump_entries(),
        }
    }

    /// Installs a per-handler-invocation deadline supervisor (spec.md
    /// §4.4). Replaces any watchdog already enabled on this looper.
    pub fn enable_watchdog(&self, timeout_ms: u64, cb: impl FnMut() + Send + 'static) {
        let node = WatchdogNode::create(format!("{}-watchdog", self.0.name), timeout_ms, Some(Box::new(cb)));
        *self.0.watchdog.lock().unwrap() = Some(node);
    }

    /// Same as `enable_watchdog`, but arms the default fatal callback
    /// (spec.md §4.4.2/§9) instead of a user-supplied one.
    pub fn enable_watchdog_default(&self, timeout_ms: u64) {
        let node = WatchdogNode::create(format!("{}-watchdog", self.0.name), timeout_ms, None);
        *self.0.watchdog.lock().unwrap() = Some(node);
    }

    pub fn disable_watchdog(&self) {
        *self.0.watchdog.lock().unwrap() = None;
    }

    fn run(self) {
        log::debug!("looper[{}]: entering worker thread", self.0.name);
        *self.0.worker_thread_id.lock().unwrap() = Some(thread::current());

        loop {
            match self.0.queue.next(&self.0.clock) {
                Next::Message(msg) => self.dispatch(msg),
                Next::ExitPending => break,
            }
        }

        for msg in self.0.queue.drain() {
            self.run_free_path(msg);
        }

        let mut state = self.0.state.lock().unwrap();
        *state = LooperState::Exited;
        self.0.state_cond.notify_all();
        log::debug!("looper[{}]: leaving worker thread", self.0.name);
    }

    /// spec.md §4.1.2 "On dispatch of a message m".
    fn dispatch(&self, mut msg: Message) {
        let now = self.0.clock.now_ms();
        if let Some(deadline) = msg.deadline() {
            if deadline < now {
                log::error!("looper[{}]: timeout, discard message: what=[{}]", self.0.name, msg.what);
                if let Some(mut cb) = msg.timeout_cb.take() {
                    cb(&msg);
                }
                self.run_free_path(msg);
                return;
            }
        }

        let watchdog = self.0.watchdog.lock().unwrap();
        if let Some(node) = watchdog.as_ref() {
            node.start();
        }
        drop(watchdog);

        if let Some(mut cb) = msg.handle_cb.take() {
            cb(&msg);
        } else {
            let mut default_cb = self.0.default_handle_cb.lock().unwrap();
            if let Some(cb) = default_cb.as_mut() {
                cb(&msg);
            } else {
                log::warn!("looper[{}]: no message handler: what=[{}]", self.0.name, msg.what);
            }
        }

        let watchdog = self.0.watchdog.lock().unwrap();
        if let Some(node) = watchdog.as_ref() {
            node.stop();
        }
        drop(watchdog);

        self.run_free_path(msg);
    }

    /// `m.free_cb` if present, else `looper.default_free_cb`, else nothing,
    /// then the freed shell is offered back to the recycle pool (spec.md
    /// §4.2; §9 "make the recycle cache optional behind a configuration
    /// flag").
    fn run_free_path(&self, mut msg: Message) {
        if let Some(mut cb) = msg.free_cb.take() {
            cb(&mut msg);
        } else {
            let mut default_cb = self.0.default_free_cb.lock().unwrap();
            if let Some(cb) = default_cb.as_mut() {
                cb(&mut msg);
            } else if msg.data().is_some() {
                log::warn!(
                    "looper[{}]: forgot to free message data: what=[{}], memory leak?",
                    self.0.name,
                    msg.what
                );
            }
        }
        self.recycle(msg);
    }

    /// Zeroes `msg`'s slots and offers the shell back to this looper's
    /// bounded recycle pool (spec.md §4.2). A pure optimization: with the
    /// `recycle-pool` feature off, or once the pool is at capacity, the
    /// shell is simply dropped.
    fn recycle(&self, #[allow(unused_mut)] mut msg: Message) {
        #[cfg(feature = "recycle-pool")]
        {
            msg.recycle();
            self.0.pool.lock().unwrap().try_give(msg);
        }
        #[cfg(not(feature = "recycle-pool"))]
        {
            drop(msg);
        }
    }

    /// `Message::obtain`, but reusing a recycled shell from this looper's
    /// pool when one is available instead of allocating a fresh record.
    pub fn obtain(&self, what: i32, arg1: i32, arg2: i32, data: Option<Box<dyn std::any::Any + Send>>) -> Message {
        #[cfg(feature = "recycle-pool")]
        {
            if let Some(mut msg) = self.0.pool.lock().unwrap().try_take() {
                msg.what = what;
                msg.arg1 = arg1;
                msg.arg2 = arg2;
                msg.set_data(data);
                return msg;
            }
        }
        Message::obtain(what, arg1, arg2, data)
    }
}
