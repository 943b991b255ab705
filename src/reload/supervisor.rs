//! Configuration reload supervision.
//!
//! # Responsibilities
//! - Decide when the configuration source is probed (time gate)
//! - Decide when it is reloaded (change gate)
//! - Publish the new rule set atomically, or keep the old one on failure
//!
//! # Design Decisions
//! - State is guarded by a mutex taken with `try_lock`; a request that finds a check in
//!   progress proceeds without waiting
//! - Readers of the registry never touch this lock
//! - The known timestamp advances only after a successful swap so a fixed file is retried

use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::{Instant, SystemTime};

use crate::config::{ConfigError, ConfigSource};
use crate::config::source::millis_since_epoch;
use crate::observability::metrics;
use crate::reload::ReloadState;
use crate::rules::RuleRegistry;

/// Result of a reload check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Reloading is turned off.
    Disabled,
    /// The check interval has not elapsed yet.
    NotDue,
    /// Another thread is checking right now.
    Busy,
    /// The source has not changed since the last load.
    Unchanged,
    /// A new rule set was published.
    Reloaded { generation: u64, rules: usize },
    /// Probing or loading failed; the active rule set was kept.
    Failed,
}

/// Coordinates staleness checks and registry swaps.
#[derive(Debug)]
pub struct ReloadSupervisor {
    source: Arc<dyn ConfigSource>,
    registry: Arc<RuleRegistry>,
    reload_enabled: bool,
    state: Mutex<ReloadState>,
}

impl ReloadSupervisor {
    pub fn new(
        source: Arc<dyn ConfigSource>,
        registry: Arc<RuleRegistry>,
        state: ReloadState,
    ) -> Self {
        Self {
            source,
            registry,
            reload_enabled: state.reload_enabled(),
            state: Mutex::new(state),
        }
    }

    pub fn reload_enabled(&self) -> bool {
        self.reload_enabled
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    /// Whether a check run now would probe the source. Never waits for a running check.
    pub fn is_due(&self) -> bool {
        self.is_due_at(now_millis())
    }

    pub fn is_due_at(&self, now: u64) -> bool {
        if !self.reload_enabled {
            return false;
        }
        match self.state.try_lock() {
            Ok(state) => state.time_gate_open(now),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().time_gate_open(now),
            Err(TryLockError::WouldBlock) => false,
        }
    }

    /// Run a check against the current wall clock.
    pub fn check(&self) -> CheckOutcome {
        self.check_at(now_millis())
    }

    /// Run a check as if the current time were `now` (milliseconds since the Unix epoch).
    pub fn check_at(&self, now: u64) -> CheckOutcome {
        if !self.reload_enabled {
            return CheckOutcome::Disabled;
        }

        let mut state = match self.state.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return CheckOutcome::Busy,
        };

        if !state.time_gate_open(now) {
            return CheckOutcome::NotDue;
        }
        state.mark_checked(now);

        let modified = match self.source.last_modified() {
            Ok(modified) => modified,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot read configuration timestamp, keeping current rules");
                return CheckOutcome::Failed;
            }
        };

        if !state.change_gate_open(modified) {
            tracing::trace!(modified, "Configuration unchanged");
            return CheckOutcome::Unchanged;
        }

        tracing::debug!(
            modified,
            last_known = state.last_known_modified(),
            "Configuration source modified, reloading"
        );
        self.reload(&mut state, modified)
    }

    /// Reload unconditionally, ignoring both gates. Waits for a running check to finish.
    pub fn force_reload(&self) -> CheckOutcome {
        let mut state = self.lock_state();
        let modified = match self.source.last_modified() {
            Ok(modified) => modified,
            Err(e) => {
                tracing::error!(error = %e, "Forced reload failed, keeping current rules");
                metrics::record_reload(false);
                return CheckOutcome::Failed;
            }
        };
        tracing::info!("Forced configuration reload");
        self.reload(&mut state, modified)
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> ReloadState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, ReloadState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reload(&self, state: &mut ReloadState, modified: u64) -> CheckOutcome {
        let start = Instant::now();
        match self.source.load() {
            Ok(rules) => {
                let count = rules.len();
                let generation = self.registry.replace(rules);
                state.mark_loaded(modified);

                metrics::record_reload(true);
                metrics::record_rules_loaded(count);
                tracing::info!(
                    rules = count,
                    generation,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Configuration reloaded"
                );
                CheckOutcome::Reloaded {
                    generation,
                    rules: count,
                }
            }
            Err(e) => {
                log_reload_failure(&e);
                metrics::record_reload(false);
                CheckOutcome::Failed
            }
        }
    }
}

fn log_reload_failure(error: &ConfigError) {
    tracing::error!(error = %error, "Failed to reload configuration. Keeping current rules.");
}

pub(crate) fn now_millis() -> u64 {
    millis_since_epoch(SystemTime::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::testing::FakeSource;
    use crate::rules::RuleSet;
    use std::thread;

    const T0: u64 = 1_000_000;

    fn supervisor(interval: i64, source: Arc<FakeSource>) -> ReloadSupervisor {
        let registry = Arc::new(RuleRegistry::new(source.load().unwrap()));
        let modified = source.modified();
        ReloadSupervisor::new(source, registry, ReloadState::new(interval, T0, modified))
    }

    fn served_by(supervisor: &ReloadSupervisor) -> String {
        let rules = supervisor.registry().snapshot();
        let rule = rules.get(".*").unwrap();
        rule.default_headers().unwrap()[0]
            .value()
            .to_str()
            .unwrap()
            .to_owned()
    }

    #[test]
    fn test_reload_after_interval() {
        let source = Arc::new(FakeSource::new(T0 - 10, "v1"));
        let supervisor = supervisor(5, source.clone());

        source.update(T0, "v2");
        assert_eq!(supervisor.check_at(T0 + 3_000), CheckOutcome::NotDue);
        assert_eq!(served_by(&supervisor), "v1");

        assert!(matches!(
            supervisor.check_at(T0 + 6_000),
            CheckOutcome::Reloaded { generation: 2, rules: 1 }
        ));
        assert_eq!(served_by(&supervisor), "v2");
        assert_eq!(supervisor.state().last_known_modified(), T0);
    }

    #[test]
    fn test_is_due_follows_time_gate() {
        let source = Arc::new(FakeSource::new(T0, "v1"));
        let supervisor = supervisor(5, source.clone());

        assert!(!supervisor.is_due_at(T0 + 5_000));
        assert!(supervisor.is_due_at(T0 + 5_001));
        assert_eq!(source.probes(), 0);

        supervisor.check_at(T0 + 5_001);
        assert!(!supervisor.is_due_at(T0 + 6_000));
    }

    #[test]
    fn test_unchanged_source_never_reloads() {
        let source = Arc::new(FakeSource::new(T0, "v1"));
        let supervisor = supervisor(1, source.clone());

        for step in 1..50 {
            let outcome = supervisor.check_at(T0 + step * 10_000);
            assert_eq!(outcome, CheckOutcome::Unchanged);
        }
        assert_eq!(source.loads(), 1);
        assert_eq!(supervisor.registry().snapshot().generation(), 1);
    }

    #[test]
    fn test_zero_interval_disables_reload() {
        let source = Arc::new(FakeSource::new(T0, "v1"));
        let supervisor = supervisor(0, source.clone());

        source.update(T0 + 1_000_000, "v2");
        assert_eq!(supervisor.check_at(u64::MAX), CheckOutcome::Disabled);
        assert_eq!(served_by(&supervisor), "v1");
        assert!(!supervisor.reload_enabled());
    }

    #[test]
    fn test_failed_reload_keeps_rules_and_retries() {
        let source = Arc::new(FakeSource::new(T0, "v1"));
        let supervisor = supervisor(1, source.clone());

        source.update_broken(T0 + 500);
        assert_eq!(supervisor.check_at(T0 + 2_000), CheckOutcome::Failed);
        assert_eq!(served_by(&supervisor), "v1");
        assert_eq!(supervisor.state().last_known_modified(), T0);

        // Still broken on the next probe: tried again, still failing.
        assert_eq!(supervisor.check_at(T0 + 4_000), CheckOutcome::Failed);

        // Fixed without a newer timestamp than the broken save: still picked up.
        source.update(T0 + 500, "v2");
        assert!(matches!(
            supervisor.check_at(T0 + 6_000),
            CheckOutcome::Reloaded { .. }
        ));
        assert_eq!(served_by(&supervisor), "v2");
    }

    #[test]
    fn test_probe_failure_is_not_fatal() {
        let source = Arc::new(FakeSource::new(T0, "v1"));
        let supervisor = supervisor(1, source.clone());

        source.fail_timestamps(true);
        assert_eq!(supervisor.check_at(T0 + 2_000), CheckOutcome::Failed);
        assert_eq!(served_by(&supervisor), "v1");
    }

    #[test]
    fn test_time_gate_runs_before_probe() {
        let source = Arc::new(FakeSource::new(T0, "v1"));
        let supervisor = supervisor(10, source.clone());

        for offset in [0, 1_000, 5_000, 10_000] {
            assert_eq!(supervisor.check_at(T0 + offset), CheckOutcome::NotDue);
        }
        assert_eq!(source.probes(), 0);

        assert_eq!(supervisor.check_at(T0 + 10_001), CheckOutcome::Unchanged);
        assert_eq!(source.probes(), 1);
        assert_eq!(supervisor.check_at(T0 + 15_000), CheckOutcome::NotDue);
    }

    #[test]
    fn test_force_reload_ignores_gates() {
        let source = Arc::new(FakeSource::new(T0, "v1"));
        let supervisor = supervisor(0, source.clone());

        source.update(T0, "v2");
        assert!(matches!(
            supervisor.force_reload(),
            CheckOutcome::Reloaded { .. }
        ));
        assert_eq!(served_by(&supervisor), "v2");
    }

    #[test]
    fn test_concurrent_checks_reload_once() {
        let source = Arc::new(FakeSource::new(T0, "v1"));
        let supervisor = Arc::new(supervisor(1, source.clone()));
        source.update(T0 + 1, "v2");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let supervisor = supervisor.clone();
                thread::spawn(move || supervisor.check_at(T0 + 5_000))
            })
            .collect();
        let reloaded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|o| matches!(o, CheckOutcome::Reloaded { .. }))
            .count();

        assert_eq!(reloaded, 1);
        assert_eq!(source.loads(), 2);
        assert_eq!(served_by(&supervisor), "v2");
    }

    #[test]
    fn test_empty_rule_set_is_valid() {
        let source = Arc::new(FakeSource::new(T0, "v1"));
        let registry = Arc::new(RuleRegistry::new(RuleSet::empty()));
        let supervisor =
            ReloadSupervisor::new(source.clone(), registry, ReloadState::new(1, T0, 0));

        assert!(supervisor.registry().is_empty());
        assert!(matches!(
            supervisor.check_at(T0 + 2_000),
            CheckOutcome::Reloaded { rules: 1, .. }
        ));
    }
}
