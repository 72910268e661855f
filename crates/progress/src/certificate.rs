//! Course certificate sync.
//!
//! Runs as the last stage of re-derivation. The course certificate is
//! replaced on every run so it can never lag behind its requirements.

use chrono::NaiveDate;
use coursepath_core::{
    add_months, all_met, CertificateId, CertificateKind, CertificateStatus, CourseState,
    IssuedCertificate, ProgressionConfig,
};
use tracing::info;

/// Stable certificate id for a learner's course.
pub fn course_certificate_id(state: &CourseState) -> CertificateId {
    CertificateId::new(format!("CERT-{}-{}", state.course_id, state.user_id).to_uppercase())
}

/// Upsert the course certificate from the current requirement checklist.
pub(crate) fn sync_course_certificate(
    state: &mut CourseState,
    config: &ProgressionConfig,
    today: NaiveDate,
) {
    let previous = state.course_certificate().cloned();
    let was_earned = previous.as_ref().is_some_and(IssuedCertificate::is_earned);

    let certificate = if all_met(&state.certificate_requirements) {
        // First-earned date survives re-derivation
        let issued_on = previous
            .filter(IssuedCertificate::is_earned)
            .and_then(|c| c.issued_on)
            .unwrap_or(today);

        if !was_earned {
            info!(
                course = %state.course_id,
                user = %state.user_id,
                issued_on = %issued_on,
                "Course certificate earned"
            );
        }

        IssuedCertificate {
            id: course_certificate_id(state),
            kind: CertificateKind::Course,
            status: CertificateStatus::Earned,
            issued_on: Some(issued_on),
            valid_until: Some(add_months(issued_on, config.certificate_validity_months)),
            version: config.certificate_version.clone(),
        }
    } else {
        if was_earned {
            info!(
                course = %state.course_id,
                user = %state.user_id,
                "Course certificate requirements no longer met"
            );
        }

        IssuedCertificate {
            id: course_certificate_id(state),
            kind: CertificateKind::Course,
            status: CertificateStatus::InProgress,
            issued_on: None,
            valid_until: None,
            version: config.certificate_version.clone(),
        }
    };

    state.certificates.retain(|c| c.kind != CertificateKind::Course);
    state.certificates.push(certificate);
}
