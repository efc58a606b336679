//! Records persisted by the state store.

use chrono::{DateTime, Utc};
use culler_core::{Instance, SelectionGroup};
use serde::{Deserialize, Serialize};

/// One recorded termination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireRecord {
    pub instance_id: String,
    pub asg: String,
    pub region: String,
    pub fired_at: DateTime<Utc>,
}

impl FireRecord {
    pub fn new(instance: &Instance, fired_at: DateTime<Utc>) -> Self {
        Self {
            instance_id: instance.id.clone(),
            asg: instance.asg.clone(),
            region: instance.region.clone(),
            fired_at,
        }
    }
}

/// Most recent fires for one selection group.
///
/// Real and leashed fires live in separate slots so a leashed fire never
/// hides the real one the min-time check compares against. `version` is
/// bumped on every commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateRecord {
    pub group: SelectionGroup,
    pub version: u64,
    #[serde(default)]
    pub last_fire: Option<FireRecord>,
    #[serde(default)]
    pub last_leashed_fire: Option<FireRecord>,
}

impl GateRecord {
    /// A group that has never fired. Version 0 means "not stored yet".
    pub fn new(group: SelectionGroup) -> Self {
        Self {
            group,
            version: 0,
            last_fire: None,
            last_leashed_fire: None,
        }
    }

    pub fn table_key(&self) -> String {
        self.group.table_key()
    }

    /// The latest fire a candidate is compared against. Leashed candidates
    /// see both slots; real candidates only see real fires.
    pub fn latest(&self, include_leashed: bool) -> Option<&FireRecord> {
        let real = self.last_fire.as_ref();
        if !include_leashed {
            return real;
        }
        match (real, self.last_leashed_fire.as_ref()) {
            (Some(r), Some(l)) => Some(if l.fired_at > r.fired_at { l } else { r }),
            (r, l) => r.or(l),
        }
    }

    /// Store `fire` in the slot matching `leashed`.
    pub fn record(&mut self, fire: FireRecord, leashed: bool) {
        if leashed {
            self.last_leashed_fire = Some(fire);
        } else {
            self.last_fire = Some(fire);
        }
    }
}
