//! Path certificate engine.
//!
//! Layers required, elective and capstone rules over the track completion
//! check and applies the per-track policy for versioning and validity.

use chrono::NaiveDate;
use coursepath_core::{
    add_months, all_met, CertificateId, CertificateRequirement, CertificateStatus, CourseId, CourseIdMap,
    CourseProgressMap, LearningTrack, PathCertificateConfig, PolicyTable, TrackEnrollment, TrackId,
    UserId,
};
use coursepath_track::{is_course_completed, ordered_track_courses};
use serde::Serialize;
use tracing::debug;

/// Checklist line for required courses.
pub const REQUIREMENT_REQUIRED_COURSES: &str = "Complete all required courses";

/// Checklist line for the capstone.
pub const REQUIREMENT_CAPSTONE: &str = "Complete path capstone/final assessment";

/// Derived path certificate for one enrollment. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathCertificateState {
    /// Track the certificate is for
    pub track_id: TrackId,
    /// Learner
    pub user_id: UserId,
    /// Earned or in progress
    pub status: CertificateStatus,
    /// Every requirement met
    pub earned: bool,
    /// `PATH-{TRACK}-{USER}` once earned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_id: Option<CertificateId>,
    /// Issue date once earned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_on: Option<NaiveDate>,
    /// Last valid day once earned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,
    /// Whether the certificate can be downloaded
    pub downloadable: bool,
    /// Requirement checklist in evaluation order
    pub requirements: Vec<CertificateRequirement>,
    /// Path content version from the track policy
    pub path_version: String,
    /// Renewal rules from the track policy
    pub renewal_policy: String,
    /// Whether holders must recertify on a new version
    pub recertification_required: bool,
    /// Validity window in months
    pub validity_months: u32,
}

impl PathCertificateState {
    /// Earned and inside its validity window on `date` (inclusive).
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        match (self.earned, self.issued_on, self.valid_until) {
            (true, Some(issued), Some(until)) => issued <= date && date <= until,
            _ => false,
        }
    }
}

/// Certificate id for a learner's path.
pub fn path_certificate_id(track_id: &TrackId, user_id: &UserId) -> CertificateId {
    CertificateId::new(format!("PATH-{}-{}", track_id, user_id).to_uppercase())
}

/// Evaluates path certificates against the static policy and course-id tables.
#[derive(Debug, Clone, Default)]
pub struct PathCertifier {
    config: PathCertificateConfig,
    policies: PolicyTable,
    course_map: CourseIdMap,
}

impl PathCertifier {
    /// Create a certifier.
    pub fn new(config: PathCertificateConfig, policies: PolicyTable, course_map: CourseIdMap) -> Self {
        Self {
            config,
            policies,
            course_map,
        }
    }

    /// Derive the path certificate for `enrollment` in `track`.
    pub fn build(
        &self,
        track: &LearningTrack,
        enrollment: &TrackEnrollment,
        course_progress: &CourseProgressMap,
    ) -> PathCertificateState {
        let requirements = self.requirements(track, enrollment, course_progress);
        let earned = all_met(&requirements);
        let policy = self.policies.policy_for(&track.id);

        let (certificate_id, issued_on, valid_until) = if earned {
            let issued = self.issue_date(enrollment);
            (
                Some(path_certificate_id(&track.id, &enrollment.user_id)),
                Some(issued),
                Some(add_months(issued, policy.validity_months)),
            )
        } else {
            (None, None, None)
        };

        debug!(
            track = %track.id,
            user = %enrollment.user_id,
            earned,
            "Path certificate evaluated"
        );

        PathCertificateState {
            track_id: track.id.clone(),
            user_id: enrollment.user_id.clone(),
            status: if earned { CertificateStatus::Earned } else { CertificateStatus::InProgress },
            earned,
            certificate_id,
            issued_on,
            valid_until,
            downloadable: earned,
            requirements,
            path_version: policy.path_version.clone(),
            renewal_policy: policy.renewal_policy.clone(),
            recertification_required: policy.recertification_required,
            validity_months: policy.validity_months,
        }
    }

    /// Required courses, then electives and capstone when the track asks for them.
    fn requirements(
        &self,
        track: &LearningTrack,
        enrollment: &TrackEnrollment,
        course_progress: &CourseProgressMap,
    ) -> Vec<CertificateRequirement> {
        let courses = ordered_track_courses(track);
        let done = |id: &CourseId| is_course_completed(id, enrollment, course_progress, &self.course_map);

        let (required, electives): (Vec<_>, Vec<_>) = courses.into_iter().partition(|c| c.is_required());
        let required_done = required.iter().filter(|c| done(&c.course_id)).count();
        let electives_done = electives.iter().filter(|c| done(&c.course_id)).count();

        let mut requirements = vec![CertificateRequirement::new(
            REQUIREMENT_REQUIRED_COURSES,
            required_done == required.len(),
            Some(format!("{}/{} completed", required_done, required.len())),
        )];

        if track.minimum_electives > 0 {
            let minimum = track.minimum_electives as usize;
            requirements.push(CertificateRequirement::new(
                format!("Complete at least {} elective course(s)", minimum),
                electives_done >= minimum,
                Some(format!("{}/{} completed", electives_done, minimum)),
            ));
        }

        if track.capstone_required {
            requirements.push(CertificateRequirement::new(
                REQUIREMENT_CAPSTONE,
                enrollment.capstone_completed.unwrap_or(false),
                None,
            ));
        }

        requirements
    }

    /// Completion date, else last access, else the configured fallback.
    fn issue_date(&self, enrollment: &TrackEnrollment) -> NaiveDate {
        enrollment
            .completed_on
            .or_else(|| enrollment.last_accessed_at.map(|t| t.date_naive()))
            .unwrap_or(self.config.fallback_issue_date)
    }
}
