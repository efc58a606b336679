//! The termination gate: check, then record, against the state store.

use std::thread;
use std::time::Duration;

use chrono_tz::Tz;
use culler_core::{Checker, GateError, Policy, SelectionGroup, Termination, ViolatesMinTime};
use culler_state::{FireRecord, StateError, StateStore};
use tracing::{debug, info};

use crate::cutoff::no_fires_since;

/// Enforces the minimum time between fires for every selection group.
///
/// The store is the only shared state; any number of gates (in any number
/// of threads) may share one `StateStore`.
#[derive(Clone)]
pub struct TerminationGate {
    store: StateStore,
}

impl TerminationGate {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Like `check`, but sleeps for `delay` between reading the group's
    /// record and committing the new fire.
    pub fn check_with_delay(
        &self,
        term: &Termination,
        policy: &Policy,
        end_hour: u32,
        tz: Tz,
        delay: Duration,
    ) -> Result<(), GateError> {
        let group = SelectionGroup::for_instance(&term.instance, policy);
        let mut record = self.store.gate_record(&group).map_err(store_error)?;

        let min_days = policy.min_time_between_fires_in_work_days;
        if min_days > 0 {
            let cutoff = no_fires_since(min_days, term.time, end_hour, tz);
            if let Some(prior) = record.latest(term.leashed) {
                if prior.fired_at >= cutoff {
                    info!(
                        %group,
                        prior = %prior.instance_id,
                        prior_fired_at = %prior.fired_at.to_rfc3339(),
                        cutoff = %cutoff.to_rfc3339(),
                        "termination would violate min time between fires"
                    );
                    return Err(GateError::ViolatesMinTime(ViolatesMinTime {
                        instance_id: prior.instance_id.clone(),
                        fired_at: prior.fired_at,
                        tz: Some(tz),
                    }));
                }
            }
        }

        if !delay.is_zero() {
            thread::sleep(delay);
        }

        record.record(FireRecord::new(&term.instance, term.time), term.leashed);
        match self.store.commit_gate(&record) {
            Ok(committed) => {
                debug!(%group, version = committed.version, leashed = term.leashed, "termination recorded");
                Ok(())
            }
            Err(StateError::Conflict { .. }) => Err(GateError::Conflict {
                group: group.to_string(),
                reason: "committed first".to_string(),
            }),
            Err(e) => Err(store_error(e)),
        }
    }
}

impl Checker for TerminationGate {
    fn check(&self, term: &Termination, policy: &Policy, end_hour: u32, tz: Tz) -> Result<(), GateError> {
        self.check_with_delay(term, policy, end_hour, tz, Duration::ZERO)
    }
}

fn store_error(e: StateError) -> GateError {
    GateError::Store(e.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::America::Los_Angeles;
    use culler_core::{Grouping, Instance};

    use super::*;

    const END_HOUR: u32 = 15;

    fn instance() -> Instance {
        Instance {
            service: "myapp".to_string(),
            account: "prod".to_string(),
            region: "us-east-1".to_string(),
            stack: "mystack".to_string(),
            detail: "mydetail".to_string(),
            cluster: "myapp-mystack-mydetail".to_string(),
            asg: "myapp-mystack-mydetail-v123".to_string(),
            id: "i-a96a0166".to_string(),
            cloud_provider: "aws".to_string(),
        }
    }

    fn policy() -> Policy {
        Policy {
            mean_time_between_fires_in_work_days: 5,
            min_time_between_fires_in_work_days: 1,
            grouping: Grouping::Cluster,
            ..Policy::default()
        }
    }

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Los_Angeles
            .with_ymd_and_hms(2016, 6, d, h, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn term(time: DateTime<Utc>, leashed: bool) -> Termination {
        Termination {
            instance: instance(),
            time,
            leashed,
        }
    }

    fn gate() -> TerminationGate {
        TerminationGate::new(StateStore::open_in_memory().unwrap())
    }

    #[test]
    fn first_fire_is_permitted_and_recorded() {
        let gate = gate();
        gate.check(&term(at(14, 10), false), &policy(), END_HOUR, Los_Angeles)
            .unwrap();

        let group = SelectionGroup::for_instance(&instance(), &policy());
        let record = gate.store().gate_record(&group).unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.last_fire.unwrap().instance_id, "i-a96a0166");
    }

    #[test]
    fn second_fire_same_day_is_forbidden() {
        let gate = gate();
        let t = term(at(14, 10), false);
        gate.check(&t, &policy(), END_HOUR, Los_Angeles).unwrap();

        let err = gate.check(&t, &policy(), END_HOUR, Los_Angeles).unwrap_err();
        match err {
            GateError::ViolatesMinTime(v) => {
                assert_eq!(v.instance_id, "i-a96a0166");
                assert_eq!(v.fired_at, at(14, 10));
                assert_eq!(v.tz, Some(Los_Angeles));
            }
            other => panic!("expected min-time violation, got {other}"),
        }
    }

    #[test]
    fn rejected_check_does_not_record() {
        let gate = gate();
        gate.check(&term(at(14, 10), false), &policy(), END_HOUR, Los_Angeles)
            .unwrap();
        let _ = gate.check(&term(at(14, 11), false), &policy(), END_HOUR, Los_Angeles);

        let group = SelectionGroup::for_instance(&instance(), &policy());
        let record = gate.store().gate_record(&group).unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.last_fire.unwrap().fired_at, at(14, 10));
    }

    #[test]
    fn leashed_fire_does_not_block_real_fire() {
        let gate = gate();
        gate.check(&term(at(14, 10), true), &policy(), END_HOUR, Los_Angeles)
            .unwrap();
        gate.check(&term(at(14, 11), false), &policy(), END_HOUR, Los_Angeles)
            .unwrap();
    }

    #[test]
    fn leashed_candidates_see_every_fire() {
        let gate = gate();
        gate.check(&term(at(14, 10), true), &policy(), END_HOUR, Los_Angeles)
            .unwrap();
        let err = gate
            .check(&term(at(14, 11), true), &policy(), END_HOUR, Los_Angeles)
            .unwrap_err();
        assert!(err.is_min_time_violation());

        let gate = self::gate();
        gate.check(&term(at(14, 10), false), &policy(), END_HOUR, Los_Angeles)
            .unwrap();
        let err = gate
            .check(&term(at(14, 11), true), &policy(), END_HOUR, Los_Angeles)
            .unwrap_err();
        assert!(err.is_min_time_violation());
    }

    #[test]
    fn fire_after_cutoff_is_permitted() {
        let gate = gate();
        // Monday 10:00, then Tuesday 10:00: cutoff is Monday 15:00.
        gate.check(&term(at(13, 10), false), &policy(), END_HOUR, Los_Angeles)
            .unwrap();
        gate.check(&term(at(14, 10), false), &policy(), END_HOUR, Los_Angeles)
            .unwrap();
    }

    #[test]
    fn zero_min_time_disables_check_but_records() {
        let gate = gate();
        let policy = Policy {
            min_time_between_fires_in_work_days: 0,
            ..policy()
        };
        for _ in 0..3 {
            gate.check(&term(at(14, 10), false), &policy, END_HOUR, Los_Angeles)
                .unwrap();
        }
        let group = SelectionGroup::for_instance(&instance(), &policy);
        assert_eq!(gate.store().gate_record(&group).unwrap().version, 3);
    }

    #[test]
    fn other_groups_are_independent() {
        let gate = gate();
        gate.check(&term(at(14, 10), false), &policy(), END_HOUR, Los_Angeles)
            .unwrap();

        let mut other = term(at(14, 10), false);
        other.instance.region = "us-west-2".to_string();
        gate.check(&other, &policy(), END_HOUR, Los_Angeles).unwrap();
    }
}
