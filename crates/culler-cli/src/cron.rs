//! Crontab installation.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use culler_core::{CullerConfig, Schedule};
use tracing::info;

/// Render `schedule` and hand it to cron, or print it when scheduling is
/// not enabled.
pub fn install(config: &CullerConfig, schedule: &mut Schedule, out: &mut dyn Write) -> anyhow::Result<()> {
    let crontab = schedule.crontab(&config.term_path, &config.term_account);
    if config.schedule_enabled {
        write_cron_file(&config.cron_path, &crontab)?;
        info!(path = %config.cron_path.display(), entries = schedule.len(), "crontab installed");
    } else {
        out.write_all(crontab.as_bytes())?;
        out.flush()?;
    }
    Ok(())
}

/// Write to a sibling temp file, then rename over `path`, so cron never
/// reads a half-written file.
fn write_cron_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming {} to {}", tmp.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use culler_core::SelectionGroup;

    use super::*;

    fn schedule() -> Schedule {
        let mut schedule = Schedule::new();
        schedule.add(
            Utc.with_ymd_and_hms(2016, 6, 14, 17, 5, 0).unwrap(),
            SelectionGroup::for_service("foo", "prod", None),
        );
        schedule
    }

    #[test]
    fn prints_when_scheduling_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CullerConfig::default();
        config.cron_path = dir.path().join("culler");
        config.term_path = "term".to_string();

        let mut out = Vec::new();
        install(&config, &mut schedule(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "5 17 14 6 2 root term foo prod\n");
        assert!(!config.cron_path.exists());
    }

    #[test]
    fn writes_cron_file_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CullerConfig::default();
        config.schedule_enabled = true;
        config.cron_path = dir.path().join("cron.d").join("culler");

        let mut out = Vec::new();
        install(&config, &mut schedule(), &mut out).unwrap();
        assert!(out.is_empty());

        let written = fs::read_to_string(&config.cron_path).unwrap();
        assert!(written.ends_with("/usr/local/bin/culler terminate foo prod\n"), "{written}");

        // Reinstalling replaces the previous file.
        install(&config, &mut Schedule::new(), &mut out).unwrap();
        assert_eq!(fs::read_to_string(&config.cron_path).unwrap(), "");
    }
}
