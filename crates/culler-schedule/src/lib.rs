//! culler-schedule — decide which groups lose an instance today, and when.
//!
//! For every enabled service the generator enumerates selection groups,
//! flips a biased coin per group (`p = 1 / mean_time_between_fires`), and
//! for each hit samples a minute inside the daily window. All randomness
//! comes from the caller's `RandomSource`.
//!
//! ```text
//! ScheduleGenerator::populate
//!   ├── Deployment  (service list, topology)
//!   ├── PolicySource (per-service policy; failures skip the service)
//!   ├── eligible_groups
//!   ├── should_fire            ── RandomSource::sample_unit
//!   └── FireWindow::choose_termination_time ── RandomSource::sample_below
//! ```

pub mod error;
pub mod generator;
pub mod window;

pub use error::{ScheduleError, ScheduleResult};
pub use generator::{ScheduleGenerator, should_fire};
pub use window::FireWindow;
