//! Process-wide I/O state.
//!
//! Loaders call [`init`] themselves, so explicit initialization is only needed to control
//! when it happens. [`teardown`] returns the runtime to its initial state; a later load
//! initializes it again.

use parking_lot::Mutex;

/// Counters kept while the runtime is up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoStats {
    /// Files decoded since the last [`init`].
    pub files_loaded: u64,
    /// Bytes read since the last [`init`].
    pub bytes_read: u64,
}

static STATE: Mutex<Option<IoStats>> = Mutex::new(None);

/// Brings the runtime up. Calling it again while up does nothing.
pub fn init() {
    let mut state = STATE.lock();
    if state.is_none() {
        *state = Some(IoStats::default());
        debug_event!("io runtime initialised");
    }
}

/// Shuts the runtime down, returning the counters it accumulated, or `None` if it was down.
pub fn teardown() -> Option<IoStats> {
    let stats = STATE.lock().take();
    if let Some(s) = stats {
        debug_event!(files = s.files_loaded, bytes = s.bytes_read, "io runtime torn down");
    }
    stats
}

/// Returns `true` between [`init`] and [`teardown`].
pub fn is_ready() -> bool {
    STATE.lock().is_some()
}

/// Current counters, or `None` if the runtime is down.
pub fn stats() -> Option<IoStats> {
    *STATE.lock()
}

pub(crate) fn record_load(bytes: usize) {
    let mut state = STATE.lock();
    let stats = state.get_or_insert_with(IoStats::default);
    stats.files_loaded += 1;
    stats.bytes_read += bytes as u64;
}

#[cfg(test)]
pub(crate) static TEST_GUARD: Mutex<()> = Mutex::new(());
