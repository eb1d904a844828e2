//! Handler facade (spec.md §4.3), grounded on
//! `original_source/include/utils/Looper.h`'s `HandlerCallback`/`Handler`
//! pair.
//!
//! `HandlerCallback` there is a tiny vtable (`onHandle`/`onFree`); the Rust
//! equivalent is a trait, and `Handler` stores an `Arc<dyn HandlerCallback>`
//! rather than a raw `HandlerCallback*` since nothing here assumes the
//! callback target outlives the handler by external contract alone.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::looper::Looper;
use crate::message::Message;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity for a `Handler`, used to key its messages in the
/// queue (spec.md §9's "Handler-keyed" removal variant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A target a `Handler` routes dispatched/freed messages to.
/// `onFree` defaults to a no-op, matching
/// `HandlerCallback::onFree(Message*) {}`'s empty body in the original.
pub trait HandlerCallback: Send + Sync {
    fn on_handle(&self, msg: &Message);

    fn on_free(&self, _msg: &mut Message) {}
}

/// Binds a `HandlerCallback` target to a `Looper`. Dropping a `Handler`
/// purges every message it posted (spec.md §4.3) before the target can be
/// dropped out from under a still-queued dispatch.
pub struct Handler {
    id: HandlerId,
    looper: Looper,
    callback: Arc<dyn HandlerCallback>,
}

impl Handler {
    pub fn new(looper: Looper, callback: Arc<dyn HandlerCallback>) -> Self {
        Self {
            id: HandlerId::next(),
            looper,
            callback,
        }
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    pub fn looper(&self) -> &Looper {
        &self.looper
    }

    /// Stamp `msg` with this handler's routing (handle/free callbacks and
    /// owner) unless the sender already supplied its own `handle_cb`, then
    /// delegate to `Looper::post`.
    pub fn post(&self, msg: Message) -> crate::error::Result<()> {
        self.looper.post(self.prepare(msg))
    }

    pub fn post_delay(&self, msg: Message, delay_ms: u64) -> crate::error::Result<()> {
        self.looper.post_delay(self.prepare(msg), delay_ms)
    }

    pub fn post_front(&self, msg: Message) -> crate::error::Result<()> {
        self.looper.post_front(self.prepare(msg))
    }

    /// Remove queued messages matching `what` that this handler posted.
    pub fn remove_message(&self, what: i32) {
        self.looper.remove_by_handler(self.id, |m| m.what == what);
    }

    /// Remove every queued message this handler posted, with no `what`
    /// restriction (what `Drop` also does).
    pub fn remove_all(&self) {
        self.looper.remove_by_handler(self.id, |_| true);
    }

    fn prepare(&self, mut msg: Message) -> Message {
        if !msg.has_handle_cb() {
            let target = self.callback.clone();
            msg = msg.with_handle_cb(Box::new(move |m| target.on_handle(m)));
        }
        if !msg.has_free_cb() {
            let target = self.callback.clone();
            msg = msg.with_free_cb(Box::new(move |m| target.on_free(m)));
        }
        msg.owner = Some(crate::message::Owner::Handler(self.id));
        msg
    }
}

impl Drop for Handler {
    fn drop(&mut self) {
        self.remove_all();
    }
}
