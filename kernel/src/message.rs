//! The `Message` data model (spec.md §3) and the `Owner` tag that resolves
//! the "dual removal keying" design note (spec.md §9) — see
//! `SPEC_FULL.md`'s "Open Questions resolved" for the reasoning.

use std::any::Any;
use std::fmt;

use mlooper_adapter::ThreadId;

use crate::handler::HandlerId;

/// `handle_cb`/`timeout_cb`: called once by the looper thread, given a
/// read-only view of the message being dispatched or discarded.
pub type HandleFn = Box<dyn FnMut(&Message) + Send>;
/// `free_cb`: called exactly once, after dispatch or discard, to release
/// `data`. `FnMut` rather than `FnOnce` so it shares `HandleFn`'s calling
/// convention; the at-most-once guarantee is enforced by the looper (it
/// always calls this through `Option::take`), not by the closure's type.
pub type FreeFn = Box<dyn FnMut(&mut Message) + Send>;

/// Who posted a message — a raw `Looper::post*` caller (keyed by OS thread)
/// or a `Handler::post*` caller (keyed by the Handler's own identity,
/// regardless of which thread happened to call it). `Looper::remove_message`
/// matches only `Owner::Thread`; `Handler::remove_message` and
/// `Handler`'s `Drop` match only their own `Owner::Handler`. Both rules
/// coexist on the same queue, per spec.md §4.1.4 and §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Thread(ThreadId),
    Handler(HandlerId),
}

/// A unit of work queued on a `Looper`. See spec.md §3 for the full field
/// contract and lifecycle invariants.
pub struct Message {
    pub what: i32,
    pub arg1: i32,
    pub arg2: i32,
    data: Option<Box<dyn Any + Send>>,
    /// Earliest monotonic dispatch time in milliseconds. Set by the looper
    /// on post, not by the caller of `obtain`.
    pub(crate) when: u64,
    /// Absolute discard time; `None` means no deadline.
    pub(crate) deadline: Option<u64>,
    /// Queueing-latency budget in milliseconds; `0` means no deadline.
    /// Recorded separately from `deadline` so `Looper::post*` can validate
    /// `timeout_ms <= delay_ms` before computing an absolute deadline.
    pub(crate) timeout_ms: u64,
    pub(crate) handle_cb: Option<HandleFn>,
    pub(crate) free_cb: Option<FreeFn>,
    pub(crate) timeout_cb: Option<HandleFn>,
    pub(crate) owner: Option<Owner>,
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("what", &self.what)
            .field("arg1", &self.arg1)
            .field("arg2", &self.arg2)
            .field("when", &self.when)
            .field("deadline", &self.deadline)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

impl Message {
    /// `Message::obtain(what, arg1, arg2, data)` (spec.md §4.2): the caller
    /// supplies `data`; releasing it is `free_cb`'s job (or the looper's
    /// default free callback).
    pub fn obtain(what: i32, arg1: i32, arg2: i32, data: Option<Box<dyn Any + Send>>) -> Self {
        Self {
            what,
            arg1,
            arg2,
            data,
            when: 0,
            deadline: None,
            timeout_ms: 0,
            handle_cb: None,
            free_cb: None,
            timeout_cb: None,
            owner: None,
        }
    }

    /// `Message::obtain_what(what)`, the plainest of the `original_source/`
    /// convenience overloads: no payload, no extra args.
    pub fn obtain_what(what: i32) -> Self {
        Self::obtain(what, 0, 0, None)
    }

    /// `Message::obtain_with_buffer(what, arg1, arg2, size)` (spec.md
    /// §4.2): an inline byte buffer the recycler frees by ordinary `Drop`,
    /// no `free_cb` required.
    pub fn obtain_with_buffer(what: i32, arg1: i32, arg2: i32, size: usize) -> Self {
        let buf: Box<dyn Any + Send> = Box::new(vec![0u8; size]);
        Self::obtain(what, arg1, arg2, Some(buf))
    }

    pub fn with_handle_cb(mut self, cb: HandleFn) -> Self {
        self.handle_cb = Some(cb);
        self
    }

    pub fn with_free_cb(mut self, cb: FreeFn) -> Self {
        self.free_cb = Some(cb);
        self
    }

    pub fn with_timeout_cb(mut self, cb: HandleFn) -> Self {
        self.timeout_cb = Some(cb);
        self
    }

    /// `timeout_ms = 0` means "no deadline" (spec.md §4.2).
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn data(&self) -> Option<&(dyn Any + Send)> {
        self.data.as_deref()
    }

    pub fn data_mut(&mut self) -> Option<&mut (dyn Any + Send)> {
        self.data.as_deref_mut()
    }

    pub fn take_data(&mut self) -> Option<Box<dyn Any + Send>> {
        self.data.take()
    }

    pub fn when(&self) -> u64 {
        self.when
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    pub fn owner(&self) -> Option<Owner> {
        self.owner
    }

    pub(crate) fn has_handle_cb(&self) -> bool {
        self.handle_cb.is_some()
    }

    pub(crate) fn has_free_cb(&self) -> bool {
        self.free_cb.is_some()
    }

    pub(crate) fn set_data(&mut self, data: Option<Box<dyn Any + Send>>) {
        self.data = data;
    }

    /// Zero every slot (spec.md §3: "After recycle, the message's slots are
    /// zeroed"), leaving a reusable shell for `Looper`'s recycle pool.
    pub(crate) fn recycle(&mut self) {
        self.what = 0;
        self.arg1 = 0;
        self.arg2 = 0;
        self.data = None;
        self.when = 0;
        self.deadline = None;
        self.timeout_ms = 0;
        self.handle_cb = None;
        self.free_cb = None;
        self.timeout_cb = None;
        self.owner = None;
    }
}
