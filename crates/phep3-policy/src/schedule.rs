//! Release schedule: support windows per Python and per core-package version.
//!
//! A [`Schedule`] maps each tracked version to three instants: when it was
//! released, from when it must be supported (`support_by`), and from when it
//! may be dropped (`drop_date`). Snapshots are stored as JSON with ISO-8601
//! timestamps:
//!
//! ```json
//! {
//!   "generated_at": "2025-01-15T00:00:00+00:00",
//!   "python": {
//!     "3.12": {"release_date": "2023-10-02T00:00:00+00:00", "drop_date": "...", "support_by": "..."}
//!   },
//!   "packages": {"numpy": {"2.0": {"release_date": "...", "drop_date": "...", "support_by": "..."}}}
//! }
//! ```

use crate::config::{DAYS_PER_MONTH, PolicyConfig};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use pep440_rs::Version;
use phep3_core::{CheckError, Result};
use phep3_pypi::normalize_package_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Support window of one version of Python or of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSchedule {
    pub version: String,
    pub release_date: DateTime<Utc>,
    pub drop_date: DateTime<Utc>,
    pub support_by: DateTime<Utc>,
}

impl VersionSchedule {
    /// Derives the window from a release date and the policy durations.
    pub fn from_release(
        version: impl Into<String>,
        release_date: DateTime<Utc>,
        support_window: Duration,
        adoption_window: Duration,
    ) -> Self {
        Self {
            version: version.into(),
            release_date,
            drop_date: release_date + support_window,
            support_by: release_date + adoption_window,
        }
    }

    /// Support may be dropped once `now` is past `drop_date`.
    pub fn is_droppable(&self, now: DateTime<Utc>) -> bool {
        now > self.drop_date
    }

    /// Support is mandatory between `support_by` (exclusive) and `drop_date`.
    pub fn must_be_supported(&self, now: DateTime<Utc>) -> bool {
        now > self.support_by && now <= self.drop_date
    }

    pub fn months_since_release(&self, now: DateTime<Utc>) -> i64 {
        let days = (now - self.release_date).num_days();
        (days as f64 / DAYS_PER_MONTH) as i64
    }
}

/// Which side of the schedule a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component<'a> {
    Python,
    Package(&'a str),
}

/// Versions of one component keyed by version string.
pub type VersionTable = BTreeMap<String, VersionSchedule>;

/// Immutable schedule snapshot for one check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub generated_at: DateTime<Utc>,
    pub python: VersionTable,
    pub packages: BTreeMap<String, VersionTable>,
}

impl Schedule {
    /// Synthesizes a Python-only schedule from the configured release dates.
    ///
    /// Versions whose drop date is more than 90 days before `now` are left
    /// out. The package table is empty.
    pub fn builtin(policy: &PolicyConfig, now: DateTime<Utc>) -> Self {
        let cutoff = now - Duration::days(90);
        let python = policy
            .python_releases
            .iter()
            .filter_map(|(version, date)| {
                let release = date.and_hms_opt(0, 0, 0)?.and_utc();
                let entry = VersionSchedule::from_release(
                    version.clone(),
                    release,
                    policy.python_support_window(),
                    policy.adoption_window(),
                );
                (entry.drop_date > cutoff).then(|| (version.clone(), entry))
            })
            .collect();

        Self {
            generated_at: now,
            python,
            packages: BTreeMap::new(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: ScheduleFile = serde_json::from_str(content)?;
        raw.into_schedule()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let schedule = Self::from_json_str(&content)?;
        tracing::debug!(
            "loaded schedule from {} ({} python versions, {} packages)",
            path.display(),
            schedule.python.len(),
            schedule.packages.len()
        );
        Ok(schedule)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&ScheduleFile::from(self))?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Finds the schedule key of a package, comparing PEP 503 normalized names.
    pub fn find_package(&self, name: &str) -> Option<&str> {
        if self.packages.contains_key(name) {
            return self.packages.get_key_value(name).map(|(k, _)| k.as_str());
        }
        let normalized = normalize_package_name(name);
        self.packages
            .keys()
            .find(|key| normalize_package_name(key) == normalized)
            .map(String::as_str)
    }

    pub fn versions(&self, component: Component<'_>) -> Option<&VersionTable> {
        match component {
            Component::Python => Some(&self.python),
            Component::Package(name) => self
                .find_package(name)
                .and_then(|key| self.packages.get(key)),
        }
    }

    /// Entry for one version key such as `"3.12"` or `"2.0"`.
    pub fn get(&self, component: Component<'_>, version: &str) -> Option<&VersionSchedule> {
        self.versions(component)?.get(version)
    }

    /// Entries sorted by PEP 440 order; keys that are not versions are skipped.
    pub fn sorted_entries(&self, component: Component<'_>) -> Vec<(Version, &VersionSchedule)> {
        let Some(table) = self.versions(component) else {
            return Vec::new();
        };
        let mut entries: Vec<(Version, &VersionSchedule)> = table
            .iter()
            .filter_map(|(key, entry)| match Version::from_str(key) {
                Ok(version) => Some((version, entry)),
                Err(e) => {
                    tracing::debug!("ignoring schedule key '{}': {}", key, e);
                    None
                }
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// All versions that may not be dropped yet, ascending.
    pub fn non_droppable_versions(&self, component: Component<'_>, now: DateTime<Utc>) -> Vec<String> {
        self.sorted_entries(component)
            .into_iter()
            .filter(|(_, entry)| !entry.is_droppable(now))
            .map(|(_, entry)| entry.version.clone())
            .collect()
    }

    /// The oldest version that may not be dropped yet.
    pub fn minimum_required_version(
        &self,
        component: Component<'_>,
        now: DateTime<Utc>,
    ) -> Option<String> {
        self.non_droppable_versions(component, now).into_iter().next()
    }

    /// Versions inside their mandatory-support window, ascending.
    pub fn required_versions(&self, component: Component<'_>, now: DateTime<Utc>) -> Vec<String> {
        self.sorted_entries(component)
            .into_iter()
            .filter(|(_, entry)| entry.must_be_supported(now))
            .map(|(_, entry)| entry.version.clone())
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct VersionDates {
    release_date: String,
    drop_date: String,
    support_by: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScheduleFile {
    #[serde(default)]
    generated_at: Option<String>,
    #[serde(default)]
    python: BTreeMap<String, VersionDates>,
    #[serde(default)]
    packages: BTreeMap<String, BTreeMap<String, VersionDates>>,
}

impl ScheduleFile {
    fn into_schedule(self) -> Result<Schedule> {
        let generated_at = match self.generated_at.as_deref() {
            Some(text) => parse_timestamp(text)?,
            None => Utc::now(),
        };

        let python = convert_table(self.python)?;
        let packages = self
            .packages
            .into_iter()
            .map(|(name, versions)| Ok((name, convert_table(versions)?)))
            .collect::<Result<_>>()?;

        Ok(Schedule {
            generated_at,
            python,
            packages,
        })
    }
}

impl From<&Schedule> for ScheduleFile {
    fn from(schedule: &Schedule) -> Self {
        let dump = |table: &VersionTable| -> BTreeMap<String, VersionDates> {
            table
                .iter()
                .map(|(version, entry)| {
                    let dates = VersionDates {
                        release_date: entry.release_date.to_rfc3339(),
                        drop_date: entry.drop_date.to_rfc3339(),
                        support_by: entry.support_by.to_rfc3339(),
                    };
                    (version.clone(), dates)
                })
                .collect()
        };

        Self {
            generated_at: Some(schedule.generated_at.to_rfc3339()),
            python: dump(&schedule.python),
            packages: schedule
                .packages
                .iter()
                .map(|(name, table)| (name.clone(), dump(table)))
                .collect(),
        }
    }
}

fn convert_table(raw: BTreeMap<String, VersionDates>) -> Result<VersionTable> {
    raw.into_iter()
        .map(|(version, dates)| {
            let entry = VersionSchedule {
                version: version.clone(),
                release_date: parse_timestamp(&dates.release_date)?,
                drop_date: parse_timestamp(&dates.drop_date)?,
                support_by: parse_timestamp(&dates.support_by)?,
            };
            Ok((version, entry))
        })
        .collect()
}

/// Parses RFC 3339, naive ISO date-times, or plain dates. Naive values are UTC.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        && let Some(naive) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(naive.and_utc());
    }
    Err(CheckError::InvalidSchedule(format!(
        "invalid timestamp '{text}'"
    )))
}
