//! Process-wide watchdog singleton (spec.md §4.4), grounded on
//! `source/sw_watchdog.c`'s `swwatchdog_{create,start,feed,stop,destroy}`
//! and its tick thread.
//!
//! The C original keys nodes by pointer identity and stores `(timeout_cb,
//! data: *mut c_void)` as two separate fields; here a node is keyed by a
//! counter-assigned `NodeId` and the callback is a single `FnMut() + Send`
//! closure, since Rust closures already capture their own `arg` — no
//! separate `void *` is needed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, OnceLock};

use mlooper_adapter::thread;

use crate::config::{min_watchdog_timeout_ms, DEFAULT_WATCHDOG_TICK_MS};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

struct NodeData {
    name: String,
    timeout_ms: u64,
    timeout_cb: Option<Box<dyn FnMut() + Send>>,
    active: bool,
    count: u64,
}

struct State {
    nodes: HashMap<NodeId, NodeData>,
    active_count: usize,
}

/// The singleton ticker (spec.md §4.4.2). Lazily started on first
/// [`WatchdogNode::create`] call, lives for the process's lifetime.
pub struct Watchdog {
    state: Mutex<State>,
    cond: Condvar,
    tick_ms: u64,
}

static WATCHDOG: OnceLock<Watchdog> = OnceLock::new();

impl Watchdog {
    fn global() -> &'static Watchdog {
        WATCHDOG.get_or_init(|| Watchdog::new(DEFAULT_WATCHDOG_TICK_MS))
    }

    fn new(tick_ms: u64) -> Self {
        Watchdog {
            state: Mutex::new(State {
                nodes: HashMap::new(),
                active_count: 0,
            }),
            cond: Condvar::new(),
            tick_ms,
        }
    }

    fn start_ticker(wd: &'static Watchdog) {
        let _ = thread::spawn("watchdog", move || loop {
            thread::sleep_ms(wd.tick_ms);

            let mut state = wd.state.lock().unwrap();
            while state.active_count == 0 {
                state = wd.cond.wait(state).unwrap();
            }

            let mut fired = Vec::new();
            state.nodes.retain(|_, node| {
                if !node.active {
                    return true;
                }
                if node.count > node.timeout_ms {
                    fired.push((node.name.clone(), node.count, node.timeout_cb.take()));
                    false
                } else {
                    node.count += wd.tick_ms;
                    true
                }
            });
            state.active_count -= fired.len();
            drop(state);

            for (name, overrun_ms, cb) in fired {
                match cb {
                    Some(mut cb) => cb(),
                    None => default_timeout_cb(&name, overrun_ms),
                }
            }
        });
    }
}

/// spec.md §4.4.2 / §9: fatal by default, a real panic rather than the
/// original's commented-out `*ptr = 0`.
fn default_timeout_cb(name: &str, overrun_ms: u64) {
    log::error!("watchdog: \"{name}\" timed out ({overrun_ms}ms accumulated), aborting");
    panic!("watchdog: \"{name}\" timed out ({overrun_ms}ms accumulated)");
}

/// A single armed deadline (spec.md §3 `WatchdogNode`). Dropping it is
/// equivalent to `destroy`.
pub struct WatchdogNode {
    id: NodeId,
    name: String,
    wd: &'static Watchdog,
}

impl WatchdogNode {
    /// `swwatchdog_create`: registers a node, clamping `timeout_ms` to at
    /// least `10 * tick_ms` (spec.md §3). `cb = None` arms the default
    /// fatal callback (spec.md §4.4.2/§9: "fatal by default ... let the
    /// user override").
    pub fn create(name: impl Into<String>, timeout_ms: u64, cb: Option<Box<dyn FnMut() + Send>>) -> Self {
        static TICKER_STARTED: OnceLock<()> = OnceLock::new();
        let wd = Watchdog::global();
        TICKER_STARTED.get_or_init(|| Watchdog::start_ticker(wd));

        let timeout_ms = timeout_ms.max(min_watchdog_timeout_ms(wd.tick_ms));
        let id = NodeId::next();
        let name = name.into();
        let mut state = wd.state.lock().unwrap();
        state.nodes.insert(
            id,
            NodeData {
                name: name.clone(),
                timeout_ms,
                timeout_cb: cb,
                active: false,
                count: 0,
            },
        );
        Self { id, name, wd }
    }

    /// `swwatchdog_start`. Logs (`sw_watchdog.c:248`'s `OS_LOGE("Can't find
    /// node...")`) if this node already fired and was removed from the set.
    pub fn start(&self) {
        let mut state = self.wd.state.lock().unwrap();
        match state.nodes.get_mut(&self.id) {
            Some(node) => {
                if !node.active {
                    node.active = true;
                    node.count = 0;
                    state.active_count += 1;
                    self.wd.cond.notify_all();
                }
            }
            None => {
                drop(state);
                log::error!("watchdog: can't find node \"{}\" to start, already fired?", self.name);
            }
        }
    }

    /// `swwatchdog_feed`: resets the accumulated overrun if armed. Logs
    /// (`sw_watchdog.c:273`) if this node already fired and was removed.
    pub fn feed(&self) {
        let mut state = self.wd.state.lock().unwrap();
        match state.nodes.get_mut(&self.id) {
            Some(node) => {
                if node.active {
                    node.count = 0;
                }
            }
            None => {
                drop(state);
                log::warn!("watchdog: can't find node \"{}\" to feed, already fired?", self.name);
            }
        }
    }

    /// `swwatchdog_stop`. Logs (`sw_watchdog.c:295`) if this node already
    /// fired and was removed — the normal case where `Looper::dispatch`
    /// calls `stop()` after a handler that already overran.
    pub fn stop(&self) {
        let mut state = self.wd.state.lock().unwrap();
        match state.nodes.get_mut(&self.id) {
            Some(node) => {
                if node.active {
                    node.active = false;
                    state.active_count -= 1;
                }
                node.count = 0;
            }
            None => {
                drop(state);
                log::error!("watchdog: can't find node \"{}\" to stop, already fired?", self.name);
            }
        }
    }
}

impl Drop for WatchdogNode {
    fn drop(&mut self) {
        let mut state = self.wd.state.lock().unwrap();
        if let Some(node) = state.nodes.remove(&self.id) {
            if node.active {
                state.active_count -= 1;
            }
        }
    }
}
