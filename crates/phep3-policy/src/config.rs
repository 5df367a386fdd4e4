use chrono::{Duration, NaiveDate};
use phep3_core::{CheckError, Result};
use phep3_pypi::normalize_package_name;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Average days per month used for every support-window computation.
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Support-window policy constants.
///
/// Passed explicitly into the schedule builder and the checker so tests can
/// override any of them. Every field has a default, so a partial JSON
/// document is enough to adjust one value.
///
/// # Defaults
///
/// - `python_support_months`: `36`
/// - `package_support_months`: `24`
/// - `adoption_months`: `6`
/// - `core_packages`: the ten Scientific Python core projects
/// - `python_releases`: CPython 3.9 through 3.14 release dates
///
/// # Examples
///
/// ```
/// use phep3_policy::config::PolicyConfig;
///
/// let config: PolicyConfig = serde_json::from_str(r#"{"adoption_months": 3}"#).unwrap();
/// assert_eq!(config.adoption_months, 3);
/// assert_eq!(config.python_support_months, 36);
/// assert!(config.is_core_package("Scikit_Learn"));
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_python_support_months")]
    pub python_support_months: u32,
    #[serde(default = "default_package_support_months")]
    pub package_support_months: u32,
    #[serde(default = "default_adoption_months")]
    pub adoption_months: u32,
    #[serde(default = "default_core_packages")]
    pub core_packages: Vec<String>,
    #[serde(default = "default_python_releases")]
    pub python_releases: BTreeMap<String, NaiveDate>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            python_support_months: default_python_support_months(),
            package_support_months: default_package_support_months(),
            adoption_months: default_adoption_months(),
            core_packages: default_core_packages(),
            python_releases: default_python_releases(),
        }
    }
}

impl PolicyConfig {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| CheckError::parse(path.display().to_string(), e))
    }

    /// Returns true when `name` is on the core-package allowlist.
    pub fn is_core_package(&self, name: &str) -> bool {
        let normalized = normalize_package_name(name);
        self.core_packages
            .iter()
            .any(|core| normalize_package_name(core) == normalized)
    }

    pub fn python_support_window(&self) -> Duration {
        months(self.python_support_months)
    }

    pub fn package_support_window(&self) -> Duration {
        months(self.package_support_months)
    }

    pub fn adoption_window(&self) -> Duration {
        months(self.adoption_months)
    }
}

/// Converts a month count into a duration of `count * 30.44` days.
pub fn months(count: u32) -> Duration {
    Duration::seconds((f64::from(count) * DAYS_PER_MONTH * 86_400.0) as i64)
}

fn default_python_support_months() -> u32 {
    36
}

fn default_package_support_months() -> u32 {
    24
}

fn default_adoption_months() -> u32 {
    6
}

fn default_core_packages() -> Vec<String> {
    [
        "numpy",
        "scipy",
        "matplotlib",
        "pandas",
        "scikit-image",
        "networkx",
        "scikit-learn",
        "xarray",
        "ipython",
        "zarr",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn default_python_releases() -> BTreeMap<String, NaiveDate> {
    [
        ("3.9", (2020, 10, 5)),
        ("3.10", (2021, 10, 4)),
        ("3.11", (2022, 10, 24)),
        ("3.12", (2023, 10, 2)),
        ("3.13", (2024, 10, 7)),
        ("3.14", (2025, 10, 7)),
    ]
    .into_iter()
    .filter_map(|(version, (y, m, d))| {
        NaiveDate::from_ymd_opt(y, m, d).map(|date| (version.to_string(), date))
    })
    .collect()
}
