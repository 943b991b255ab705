//! Reload bookkeeping.

/// Timer and change tracking owned by the reload supervisor.
///
/// All timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadState {
    reload_enabled: bool,
    reload_check_interval_secs: i64,
    last_check: u64,
    last_known_modified: u64,
}

impl ReloadState {
    /// A non-positive interval disables reloading for good.
    pub fn new(reload_check_interval_secs: i64, now: u64, config_modified: u64) -> Self {
        let reload_enabled = reload_check_interval_secs > 0;
        Self {
            reload_enabled,
            reload_check_interval_secs: reload_check_interval_secs.max(0),
            last_check: now,
            last_known_modified: config_modified,
        }
    }

    pub fn reload_enabled(&self) -> bool {
        self.reload_enabled
    }

    pub fn reload_check_interval_secs(&self) -> i64 {
        self.reload_check_interval_secs
    }

    pub fn last_check(&self) -> u64 {
        self.last_check
    }

    pub fn last_known_modified(&self) -> u64 {
        self.last_known_modified
    }

    /// Strictly more than the interval has passed since the last check.
    pub fn time_gate_open(&self, now: u64) -> bool {
        let interval_ms = (self.reload_check_interval_secs as u64).saturating_mul(1000);
        self.reload_enabled && now.saturating_sub(self.last_check) > interval_ms
    }

    /// The source changed after the last successful load.
    pub fn change_gate_open(&self, modified: u64) -> bool {
        modified > self.last_known_modified
    }

    pub(crate) fn mark_checked(&mut self, now: u64) {
        self.last_check = now;
    }

    pub(crate) fn mark_loaded(&mut self, modified: u64) {
        self.last_known_modified = modified;
    }
}
