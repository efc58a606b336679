//! The daily window terminations are scheduled in.

use chrono::{DateTime, Duration, LocalResult, TimeZone, Utc};
use chrono_tz::Tz;
use culler_core::{ConfigError, CullerConfig, RandomSource};

use crate::error::{ScheduleError, ScheduleResult};

/// `[start_hour:00, end_hour:00)` local time in `tz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireWindow {
    start_hour: u32,
    end_hour: u32,
    tz: Tz,
}

impl FireWindow {
    /// Fails if the window is empty or runs past midnight.
    pub fn new(start_hour: u32, end_hour: u32, tz: Tz) -> Result<Self, ConfigError> {
        if end_hour > 24 {
            return Err(ConfigError::HourOutOfRange(end_hour));
        }
        if end_hour <= start_hour {
            return Err(ConfigError::EmptyWindow {
                start: start_hour,
                end: end_hour,
            });
        }
        Ok(Self {
            start_hour,
            end_hour,
            tz,
        })
    }

    pub fn from_config(config: &CullerConfig) -> Result<Self, ConfigError> {
        Self::new(config.start_hour, config.end_hour, config.tz()?)
    }

    pub fn minutes(&self) -> u32 {
        (self.end_hour - self.start_hour) * 60
    }

    /// A uniformly random minute of the window on `now`'s local date.
    ///
    /// The result may already be in the past; callers decide what a missed
    /// entry means.
    pub fn choose_termination_time(
        &self,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
    ) -> ScheduleResult<DateTime<Utc>> {
        let start = self.start_on(now)?;
        let offset = rng.sample_below(self.minutes() as usize);
        Ok(start + Duration::minutes(offset as i64))
    }

    /// `start_hour:00` on `now`'s local date.
    fn start_on(&self, now: DateTime<Utc>) -> ScheduleResult<DateTime<Utc>> {
        let date = now.with_timezone(&self.tz).date_naive();
        let nonexistent = || ScheduleError::NonexistentLocalTime {
            date,
            hour: self.start_hour,
            tz: self.tz,
        };
        let local = date
            .and_hms_opt(self.start_hour, 0, 0)
            .ok_or_else(nonexistent)?;
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(t) => Ok(t.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => Err(nonexistent()),
        }
    }
}
