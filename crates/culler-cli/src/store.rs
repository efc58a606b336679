//! Opening the state store when another culler process may hold it.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chrono_tz::Tz;
use culler_core::{Checker, GateError, Policy, SelectionGroup, Termination};
use culler_gate::TerminationGate;
use culler_state::{StateError, StateStore};
use tracing::warn;

const ATTEMPTS: u32 = 6;
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// Open the store, retrying with exponential backoff while the file is
/// locked by another process.
pub fn open_with_retry(path: &Path) -> anyhow::Result<StateStore> {
    open_with(path, ATTEMPTS, INITIAL_BACKOFF)
}

fn open_with(path: &Path, attempts: u32, initial_backoff: Duration) -> anyhow::Result<StateStore> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut backoff = initial_backoff;
    let mut attempt = 1;
    loop {
        match StateStore::open(path) {
            Ok(store) => return Ok(store),
            Err(StateError::Locked(_)) if attempt < attempts => {
                warn!(path = %path.display(), attempt, backoff_ms = backoff.as_millis() as u64, "state store locked, retrying");
                thread::sleep(backoff);
                backoff *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("opening state store {}", path.display())),
        }
    }
}

/// A gate over the store file that holds the file lock only for the
/// check-and-record itself.
///
/// redb locks the file for as long as it is open, so a store kept open
/// across tracking and termination would lock out every other culler
/// process. A store still held after the last retry is reported as a
/// transient `GateError::Conflict`.
pub struct FileGate {
    path: PathBuf,
    attempts: u32,
    initial_backoff: Duration,
}

impl FileGate {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            attempts: ATTEMPTS,
            initial_backoff: INITIAL_BACKOFF,
        }
    }

    fn open(&self, term: &Termination, policy: &Policy) -> Result<StateStore, GateError> {
        open_with(&self.path, self.attempts, self.initial_backoff).map_err(|e| {
            match e.downcast_ref::<StateError>() {
                Some(StateError::Locked(_)) => GateError::Conflict {
                    group: SelectionGroup::for_instance(&term.instance, policy).to_string(),
                    reason: format!("state store {} is held by another process", self.path.display()),
                },
                _ => GateError::Store(format!("{e:#}")),
            }
        })
    }
}

impl Checker for FileGate {
    fn check(&self, term: &Termination, policy: &Policy, end_hour: u32, tz: Tz) -> Result<(), GateError> {
        let store = self.open(term, policy)?;
        TerminationGate::new(store).check(term, policy, end_hour, tz)
    }
}
