//! Termination schedule and its crontab rendering.

use std::fmt::Write;

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::group::SelectionGroup;

/// One planned termination: pick a random instance of `group` at `time`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub group: SelectionGroup,
    pub time: DateTime<Utc>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.group == other.group && self.time == other.time
    }
}

impl Eq for Entry {}

impl Entry {
    /// The crontab line for this entry, without a trailing newline.
    ///
    /// Fields are `minute hour day month weekday account command`, in UTC;
    /// weekday counts from Sunday = 0.
    pub fn crontab(&self, term_path: &str, account: &str) -> String {
        let t = self.time;
        format!(
            "{} {} {} {} {} {} {}",
            t.minute(),
            t.hour(),
            t.day(),
            t.month(),
            t.weekday().num_days_from_sunday(),
            account,
            terminate_command(term_path, &self.group)
        )
    }
}

/// `<term_path> <service> <account> [--cluster=..] [--stack=..] [--region=..]`
fn terminate_command(term_path: &str, group: &SelectionGroup) -> String {
    let mut cmd = format!("{term_path} {} {}", group.service(), group.account());
    if let Some(cluster) = group.cluster() {
        let _ = write!(cmd, " --cluster={cluster}");
    }
    if let Some(stack) = group.stack() {
        let _ = write!(cmd, " --stack={stack}");
    }
    if let Some(region) = group.region() {
        let _ = write!(cmd, " --region={region}");
    }
    cmd
}

/// An ordered, duplicate-permitting list of entries.
///
/// Serializes as a bare JSON array, `[]` when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    entries: Vec<Entry>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, time: DateTime<Utc>, group: SelectionGroup) {
        self.entries.push(Entry { group, time });
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stable sort by time; equal times keep insertion order.
    pub fn sort_by_time(&mut self) {
        self.entries.sort_by_key(|e| e.time);
    }

    /// Render every entry, time-sorted, one `\n`-terminated line each.
    pub fn crontab(&mut self, term_path: &str, account: &str) -> String {
        self.sort_by_time();
        self.entries
            .iter()
            .map(|e| e.crontab(term_path, account) + "\n")
            .collect()
    }
}
