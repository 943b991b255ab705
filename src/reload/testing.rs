//! Controllable configuration source for tests.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::config::{ConfigError, ConfigSource, ValidationError};
use crate::rules::testing::rule;
use crate::rules::RuleSet;

/// Serves a single `.*` rule setting `X-ServedBy` to the current version string.
#[derive(Debug)]
pub(crate) struct FakeSource {
    modified: AtomicU64,
    served_by: Mutex<Option<String>>,
    fail_timestamps: AtomicBool,
    probes: AtomicUsize,
    loads: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn new(modified: u64, served_by: &str) -> Self {
        Self {
            modified: AtomicU64::new(modified),
            served_by: Mutex::new(Some(served_by.to_owned())),
            fail_timestamps: AtomicBool::new(false),
            probes: AtomicUsize::new(0),
            loads: AtomicUsize::new(0),
        }
    }

    pub(crate) fn update(&self, modified: u64, served_by: &str) {
        *self.served_by.lock().unwrap() = Some(served_by.to_owned());
        self.modified.store(modified, Ordering::SeqCst);
    }

    /// Simulates saving a file that no longer decodes.
    pub(crate) fn update_broken(&self, modified: u64) {
        *self.served_by.lock().unwrap() = None;
        self.modified.store(modified, Ordering::SeqCst);
    }

    pub(crate) fn fail_timestamps(&self, fail: bool) {
        self.fail_timestamps.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn modified(&self) -> u64 {
        self.modified.load(Ordering::SeqCst)
    }

    pub(crate) fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub(crate) fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ConfigSource for FakeSource {
    fn last_modified(&self) -> Result<u64, ConfigError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.fail_timestamps.load(Ordering::SeqCst) {
            return Err(ConfigError::Io {
                path: "fake.toml".into(),
                source: io::Error::new(io::ErrorKind::NotFound, "gone"),
            });
        }
        Ok(self.modified())
    }

    fn load(&self) -> Result<RuleSet, ConfigError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match self.served_by.lock().unwrap().as_deref() {
            Some(value) => Ok(RuleSet::new([rule(".*", &[("X-ServedBy", value)], vec![])])),
            None => Err(ConfigError::Validation(vec![ValidationError::NoHeaders {
                mapping: 1,
            }])),
        }
    }
}
