//! Time-ordered, mutex/condvar-protected message queue (spec.md §4.1.2),
//! grounded directly on `source/msglooper.c`'s `mlooper_thread_entry`
//! dispatch loop and its `mlooper_post_message_delay`/`_front` insertion
//! logic, reexpressed over `mlooper_infra::OrderedSeq` instead of an
//! intrusive `listnode`.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use mlooper_adapter::Clock;
use mlooper_infra::OrderedSeq;

use crate::message::{Message, Owner};

struct State {
    seq: OrderedSeq<Message>,
    exit_pending: bool,
}

/// What `MessageQueue::next` produced after the worker's blocking wait.
pub enum Next {
    Message(Message),
    ExitPending,
}

pub struct MessageQueue {
    state: Mutex<State>,
    cond: Condvar,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                seq: OrderedSeq::new(),
                exit_pending: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Insert `msg` (already stamped with `when`/`owner`) in `(when, seq)`
    /// order and wake the worker.
    pub fn post(&self, when: u64, msg: Message) {
        let mut state = self.state.lock().unwrap();
        state.seq.insert(when, msg);
        self.cond.notify_one();
    }

    /// Insert `msg` so it becomes the new head (spec.md §4.1.3): `when` is
    /// the caller-computed `min(now, current_head.when)`.
    pub fn post_front(&self, when: u64, msg: Message) {
        let mut state = self.state.lock().unwrap();
        state.seq.insert_front(when, msg);
        self.cond.notify_one();
    }

    /// `when` of the current head, used by `post_front` to compute its clamp
    /// before taking the lock a second time to actually insert.
    pub fn head_when(&self) -> Option<u64> {
        self.state.lock().unwrap().seq.head_when()
    }

    /// The dispatch loop's steps 1-6 (spec.md §4.1.2): block until the head
    /// is due or an exit has been requested.
    pub fn next(&self, clock: &Clock) -> Next {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.exit_pending {
                return Next::ExitPending;
            }
            match state.seq.head_when() {
                None => {
                    state = self.cond.wait(state).unwrap();
                }
                Some(when) => {
                    let now = clock.now_ms();
                    if when <= now {
                        return Next::Message(state.seq.pop_front().expect("head present"));
                    }
                    let (s, _) = self
                        .cond
                        .wait_timeout(state, Duration::from_millis(when - now))
                        .unwrap();
                    state = s;
                }
            }
        }
    }

    /// Remove every queued message matching `pred` whose `owner` is `owner`
    /// (spec.md §4.1.4). Runs synchronously; callers run each removed
    /// message's free path themselves.
    pub fn remove_if(&self, owner: Owner, mut pred: impl FnMut(&Message) -> bool) -> Vec<Message> {
        let mut state = self.state.lock().unwrap();
        state.seq.remove_if(|m| m.owner() == Some(owner) && pred(m))
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// spec.md §4.1.5: mark exit pending and wake the worker so it observes
    /// it at the top of its loop.
    pub fn request_exit(&self) {
        let mut state = self.state.lock().unwrap();
        state.exit_pending = true;
        self.cond.notify_all();
    }

    /// Drain every remaining message, in dispatch order, for the shutdown
    /// free-without-dispatch pass.
    pub fn drain(&self) -> Vec<Message> {
        self.state.lock().unwrap().seq.drain_all()
    }

    /// Snapshot of `(what, arg1, arg2, when)` for each queued message, in
    /// dispatch order — the data behind both `Looper::dump_log` and
    /// `Looper::snapshot`.
    pub fn dump_entries(&self) -> Vec<(i32, i32, i32, u64)> {
        let state = self.state.lock().unwrap();
        state
            .seq
            .iter()
            .map(|m| (m.what, m.arg1, m.arg2, m.when()))
            .collect()
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}
