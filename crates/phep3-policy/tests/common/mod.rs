//! Shared fixtures for policy integration tests.
//!
//! Windows are expressed as day offsets from a fixed `now` so scenarios read
//! as "must be supported since 600 days ago, droppable in 200 days".

use chrono::{DateTime, Duration, TimeZone, Utc};
use phep3_policy::{Schedule, VersionSchedule};
use std::collections::BTreeMap;

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Builds a [`Schedule`] one version at a time.
pub(crate) struct ScheduleBuilder {
    schedule: Schedule,
}

impl ScheduleBuilder {
    pub(crate) fn new() -> Self {
        Self {
            schedule: Schedule {
                generated_at: now(),
                python: BTreeMap::new(),
                packages: BTreeMap::new(),
            },
        }
    }

    pub(crate) fn python(mut self, version: &str, support_by_days: i64, drop_days: i64) -> Self {
        self.schedule
            .python
            .insert(version.to_string(), window(version, support_by_days, drop_days));
        self
    }

    pub(crate) fn package(
        mut self,
        name: &str,
        version: &str,
        support_by_days: i64,
        drop_days: i64,
    ) -> Self {
        self.schedule
            .packages
            .entry(name.to_string())
            .or_default()
            .insert(version.to_string(), window(version, support_by_days, drop_days));
        self
    }

    pub(crate) fn build(self) -> Schedule {
        self.schedule
    }
}

fn window(version: &str, support_by_days: i64, drop_days: i64) -> VersionSchedule {
    let support_by = now() + Duration::days(support_by_days);
    VersionSchedule {
        version: version.to_string(),
        release_date: support_by - Duration::days(182),
        drop_date: now() + Duration::days(drop_days),
        support_by,
    }
}
