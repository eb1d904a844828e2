//! Tunables, the way the teacher's `kconfig`-generated constants would have
//! landed had this crate needed a board-reconfigurable kernel. It doesn't —
//! one POSIX process, one set of defaults — so these are plain `const`s
//! instead of build-time-generated code.

/// Watchdog ticker period, matching `source/sw_watchdog.c`'s
/// `DEFAULT_TICK_MS`.
pub const DEFAULT_WATCHDOG_TICK_MS: u64 = 100;

/// A `WatchdogNode`'s `timeout_ms` is clamped to at least this many
/// milliseconds (`source/sw_watchdog.c`'s `DEFAULT_MIN_TIMEOUT_MS`, defined
/// there as `10 * DEFAULT_TICK_MS`).
pub const fn min_watchdog_timeout_ms(tick_ms: u64) -> u64 {
    10 * tick_ms
}

/// Default capacity of a Looper's message recycle pool. spec.md §9 leaves
/// this an open tuning parameter (the source's two dialects use 20 and 50);
/// resolved here as a midpoint. See DESIGN.md.
pub const DEFAULT_MESSAGE_POOL_CAPACITY: usize = 32;

/// Default name given to a Looper's worker thread when the caller doesn't
/// supply one.
pub const DEFAULT_LOOPER_THREAD_NAME: &str = "looper";
