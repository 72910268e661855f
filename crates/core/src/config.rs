//! Engine configuration.
//!
//! Every value has a default so a seed directory without `settings.json`
//! still runs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::DEFAULT_VALIDITY_MONTHS;
use crate::Time;

/// Progression engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Quiz score recorded when a module completes without a graded attempt
    pub default_quiz_score: u8,
    /// Course certificate validity window
    pub certificate_validity_months: u32,
    /// Version tag stamped on course certificates
    pub certificate_version: String,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            default_quiz_score: 85,
            certificate_validity_months: DEFAULT_VALIDITY_MONTHS,
            certificate_version: "v1.0".to_string(),
        }
    }
}

/// Track analytics settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// "Now" used for inactivity checks, fixed so reports are reproducible
    pub reference_now: Time,
    /// Days without access after which an in-progress learner is at risk
    pub at_risk_after_days: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            // 2025-01-15T00:00:00Z
            reference_now: DateTime::<Utc>::from_timestamp(1_736_899_200, 0).unwrap_or_default(),
            at_risk_after_days: 14,
        }
    }
}

/// Path certificate settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathCertificateConfig {
    /// Issue date used when an enrollment carries no usable date
    pub fallback_issue_date: NaiveDate,
}

impl Default for PathCertificateConfig {
    fn default() -> Self {
        Self {
            fallback_issue_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
        }
    }
}

/// All engine settings, as stored in `settings.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Course progression
    pub progression: ProgressionConfig,
    /// Track analytics
    pub analytics: AnalyticsConfig,
    /// Path certificates
    pub path_certificate: PathCertificateConfig,
}
