//! Shutdown semantics: `stop` is non-blocking, `stop_safely` blocks until
//! `Exited`, queued-but-undispatched messages are freed (not handled) on
//! the way out, and the self-join guard refuses to deadlock (spec.md
//! §4.1.5, §4.5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mlooper_kernel::{LooperError, LooperState, Looper, Message};

#[test]
fn stop_safely_blocks_until_the_worker_has_exited() {
    let looper = Looper::create("stop-safely");
    looper.start().unwrap();
    assert_eq!(looper.state(), LooperState::Running);

    looper.stop_safely().unwrap();
    assert_eq!(looper.state(), LooperState::Exited);
}

#[test]
fn stop_is_idempotent_and_stop_then_stop_safely_still_waits() {
    let looper = Looper::create("stop-idempotent");
    looper.start().unwrap();

    looper.stop();
    looper.stop();
    looper.stop_safely().unwrap();
    assert_eq!(looper.state(), LooperState::Exited);
}

#[test]
fn messages_still_queued_at_shutdown_are_freed_but_never_dispatched() {
    let looper = Looper::create("drain-on-shutdown");

    let dispatched = Arc::new(AtomicBool::new(false));
    let freed = Arc::new(AtomicBool::new(false));
    let dispatched_cb = dispatched.clone();
    let freed_cb = freed.clone();

    // Far enough in the future that it is certain to still be queued when
    // stop_safely runs.
    looper
        .post_delay(
            Message::obtain_what(9)
                .with_handle_cb(Box::new(move |_| dispatched_cb.store(true, Ordering::SeqCst)))
                .with_free_cb(Box::new(move |_| freed_cb.store(true, Ordering::SeqCst))),
            60_000,
        )
        .unwrap();

    looper.start().unwrap();
    looper.stop_safely().unwrap();

    assert!(freed.load(Ordering::SeqCst), "the free path must still run during the shutdown drain");
    assert!(!dispatched.load(Ordering::SeqCst), "a draining looper must not dispatch queued messages");
}

#[test]
fn stop_safely_called_from_the_loopers_own_thread_is_refused_not_deadlocked() {
    let looper = Looper::create("self-join-guard");
    looper.start().unwrap();

    let looper_from_inside = looper.clone();
    let outcome = Arc::new(Mutex::new(None));
    let outcome_cb = outcome.clone();
    looper
        .post(Message::obtain_what(1).with_handle_cb(Box::new(move |_| {
            *outcome_cb.lock().unwrap() = Some(looper_from_inside.stop_safely());
        })))
        .unwrap();

    std::thread::sleep(Duration::from_millis(100));
    let outcome = outcome.lock().unwrap().take();
    assert!(matches!(outcome, Some(Err(LooperError::MisuseWarning(_)))));
    assert_eq!(looper.state(), LooperState::Running);

    looper.stop_safely().unwrap();
    assert_eq!(looper.state(), LooperState::Exited);
}
