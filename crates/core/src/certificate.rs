//! Certificate model - requirement checklists and issued certificates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::CertificateId;

/// One line of a certificate checklist.
///
/// Checklists are recomputed wholesale from state; `met` is never toggled on
/// its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRequirement {
    /// What has to be done
    pub description: String,

    /// Whether it is done
    pub met: bool,

    /// Progress detail such as "3/4"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CertificateRequirement {
    /// Create a requirement line.
    pub fn new(description: impl Into<String>, met: bool, detail: Option<String>) -> Self {
        Self {
            description: description.into(),
            met,
            detail,
        }
    }
}

/// Whether every requirement in a checklist is met.
pub fn all_met(requirements: &[CertificateRequirement]) -> bool {
    requirements.iter().all(|r| r.met)
}

/// Certificate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CertificateStatus {
    /// Requirements outstanding
    InProgress,
    /// All requirements met
    Earned,
}

impl std::fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CertificateStatus::InProgress => write!(f, "in-progress"),
            CertificateStatus::Earned => write!(f, "earned"),
        }
    }
}

/// What a certificate attests to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CertificateKind {
    /// Completion of a single course
    Course,
    /// Completion of a multi-course track
    Path,
}

/// A certificate record held in a learner's course state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCertificate {
    /// Certificate identifier
    pub id: CertificateId,
    /// Course or path certificate
    pub kind: CertificateKind,
    /// Earned or in progress
    pub status: CertificateStatus,
    /// First date the certificate was earned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_on: Option<NaiveDate>,
    /// Last valid day, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,
    /// Version tag of the certificate content
    pub version: String,
}

impl IssuedCertificate {
    /// Whether the certificate has been earned.
    pub fn is_earned(&self) -> bool {
        self.status == CertificateStatus::Earned
    }

    /// Earned and inside its validity window on `date` (inclusive).
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        match (self.status, self.issued_on, self.valid_until) {
            (CertificateStatus::Earned, Some(issued), Some(until)) => issued <= date && date <= until,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_all_met() {
        let reqs = vec![
            CertificateRequirement::new("a", true, None),
            CertificateRequirement::new("b", false, Some("1/2".to_string())),
        ];
        assert!(!all_met(&reqs));
        assert!(all_met(&reqs[..1]));
        assert!(all_met(&[]));
    }

    #[test]
    fn test_validity_window() {
        let cert = IssuedCertificate {
            id: CertificateId::new("CERT-X"),
            kind: CertificateKind::Course,
            status: CertificateStatus::Earned,
            issued_on: Some(date(2024, 1, 10)),
            valid_until: Some(date(2026, 1, 10)),
            version: "v1.0".to_string(),
        };
        assert!(cert.is_valid_on(date(2024, 1, 10)));
        assert!(cert.is_valid_on(date(2026, 1, 10)));
        assert!(!cert.is_valid_on(date(2026, 1, 11)));
        assert!(!cert.is_valid_on(date(2023, 12, 31)));

        let pending = IssuedCertificate {
            status: CertificateStatus::InProgress,
            issued_on: None,
            valid_until: None,
            ..cert
        };
        assert!(!pending.is_valid_on(date(2024, 6, 1)));
    }
}
