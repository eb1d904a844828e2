//! Owner-scoped removal (S6 from spec.md §8) and the Handler-keyed removal
//! variant (spec.md §4.3, §9 "dual removal keying").

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mlooper_kernel::{Handler, HandlerCallback, Looper, Message};

#[test]
fn another_threads_remove_message_does_not_touch_this_threads_post() {
    let looper = Looper::create("remove-cross-thread");

    let dispatched = Arc::new(AtomicBool::new(false));
    let dispatched_cb = dispatched.clone();
    looper
        .post(Message::obtain_what(7).with_handle_cb(Box::new(move |_| {
            dispatched_cb.store(true, Ordering::SeqCst);
        })))
        .unwrap();

    let looper_other = looper.clone();
    std::thread::spawn(move || looper_other.remove_message(7)).join().unwrap();

    looper.start().unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert!(dispatched.load(Ordering::SeqCst));
    looper.stop_safely().unwrap();
}

#[test]
fn the_posting_threads_own_remove_message_discards_its_message() {
    let looper = Looper::create("remove-same-thread");

    let dispatched = Arc::new(AtomicBool::new(false));
    let freed = Arc::new(AtomicBool::new(false));
    let dispatched_cb = dispatched.clone();
    let freed_cb = freed.clone();
    looper
        .post(
            Message::obtain_what(7)
                .with_handle_cb(Box::new(move |_| dispatched_cb.store(true, Ordering::SeqCst)))
                .with_free_cb(Box::new(move |_| freed_cb.store(true, Ordering::SeqCst))),
        )
        .unwrap();

    looper.remove_message(7);

    looper.start().unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert!(!dispatched.load(Ordering::SeqCst));
    assert!(freed.load(Ordering::SeqCst), "a removed message's free path must still run");
    looper.stop_safely().unwrap();
}

struct RecordingTarget {
    handled: Arc<AtomicBool>,
}

impl HandlerCallback for RecordingTarget {
    fn on_handle(&self, msg: &Message) {
        if msg.what == 1 {
            self.handled.store(true, Ordering::SeqCst);
        }
    }
}

#[test]
fn dropping_a_handler_purges_every_message_it_posted() {
    let looper = Looper::create("handler-drop");

    let handled = Arc::new(AtomicBool::new(false));
    let handler = Handler::new(
        looper.clone(),
        Arc::new(RecordingTarget { handled: handled.clone() }),
    );
    handler.post(Message::obtain_what(1)).unwrap();
    drop(handler);

    looper.start().unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert!(!handled.load(Ordering::SeqCst));
    looper.stop_safely().unwrap();
}

#[test]
fn handler_remove_message_is_keyed_by_handler_not_posting_thread() {
    let looper = Looper::create("handler-remove-cross-thread");
    let handled = Arc::new(AtomicBool::new(false));
    let handler = Arc::new(Handler::new(
        looper.clone(),
        Arc::new(RecordingTarget { handled: handled.clone() }),
    ));

    let handler_for_post = handler.clone();
    std::thread::spawn(move || handler_for_post.post(Message::obtain_what(1)).unwrap())
        .join()
        .unwrap();

    // Called from a different thread than the one that posted; still
    // removes it, because Handler-keyed removal ignores the posting
    // thread's identity entirely.
    handler.remove_message(1);

    looper.start().unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert!(!handled.load(Ordering::SeqCst));
    looper.stop_safely().unwrap();
}
