//! Learning track model - multi-course paths and per-learner enrollments.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::id::{CourseId, TrackId, UserId};
use crate::Time;

/// Whether a course must be taken to complete a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CourseRequirement {
    /// Must be completed
    Required,
    /// Counts toward the elective minimum
    Elective,
}

/// A course reference inside a track.
///
/// `course_id` is the track-level id; it may differ from the id used by
/// course states (see [`CourseIdMap`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackCourse {
    /// Track-level course id
    pub course_id: CourseId,
    /// Course title
    pub title: String,
    /// Position within the track
    pub sequence: u32,
    /// Required or elective
    pub requirement: CourseRequirement,
}

impl TrackCourse {
    /// Whether the course is mandatory.
    pub fn is_required(&self) -> bool {
        self.requirement == CourseRequirement::Required
    }
}

/// How a track counts as complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionRule {
    /// Every required course
    AllRequired,
    /// Every required course plus a minimum number of electives
    RequiredPlusElectives,
}

/// A named, ordered set of courses. Reference data; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningTrack {
    /// Track identifier
    pub id: TrackId,
    /// Track title
    pub title: String,
    /// Courses in the track
    pub courses: Vec<TrackCourse>,
    /// How completion is judged
    pub completion_rule: CompletionRule,
    /// Electives needed on top of the required courses
    #[serde(default)]
    pub minimum_electives: u32,
    /// Whether a capstone assessment is needed for the path certificate
    #[serde(default)]
    pub capstone_required: bool,
}

/// Enrollment status as recorded on the enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnrollmentStatus {
    /// Enrolled, nothing done
    NotStarted,
    /// Underway
    InProgress,
    /// Finished
    Completed,
}

impl EnrollmentStatus {
    /// Kebab-case name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::NotStarted => "not-started",
            EnrollmentStatus::InProgress => "in-progress",
            EnrollmentStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EnrollmentStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "not-started" | "not_started" => Ok(EnrollmentStatus::NotStarted),
            "in-progress" | "in_progress" => Ok(EnrollmentStatus::InProgress),
            "completed" => Ok(EnrollmentStatus::Completed),
            _ => Err(ParseError::unknown("enrollment status", s)),
        }
    }
}

/// A learner's record against one track. Maintained outside the engines,
/// which only read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEnrollment {
    /// Learner
    pub user_id: UserId,
    /// Enrolled track
    pub track_id: TrackId,
    /// Stored status
    pub status: EnrollmentStatus,
    /// Stored progress, 0-100
    #[serde(default)]
    pub overall_progress: u8,
    /// Track-level ids of completed courses
    #[serde(default)]
    pub completed_course_ids: Vec<CourseId>,
    /// Most recent activity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<Time>,
    /// Enrollment start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_on: Option<NaiveDate>,
    /// Completion day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_on: Option<NaiveDate>,
    /// Stored next course
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_course_id: Option<CourseId>,
    /// Capstone outcome, when the track has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capstone_completed: Option<bool>,
}

impl TrackEnrollment {
    /// Whether the enrollment lists `course_id` as completed.
    pub fn has_completed(&self, course_id: &CourseId) -> bool {
        self.completed_course_ids.iter().any(|c| c == course_id)
    }

    /// Whether the stored status is completed.
    pub fn is_completed(&self) -> bool {
        self.status == EnrollmentStatus::Completed
    }
}

/// Static lookup from track-level course ids to course-level ids.
///
/// A missing entry means the track course has no live course state to
/// consult; callers treat it as "not applicable".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseIdMap(HashMap<CourseId, CourseId>);

impl CourseIdMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping.
    pub fn with(mut self, track_course: impl Into<CourseId>, course: impl Into<CourseId>) -> Self {
        self.0.insert(track_course.into(), course.into());
        self
    }

    /// Course-level id for a track-level id.
    pub fn resolve(&self, track_course: &CourseId) -> Option<&CourseId> {
        self.0.get(track_course)
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no mappings exist.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(CourseId, CourseId)> for CourseIdMap {
    fn from_iter<I: IntoIterator<Item = (CourseId, CourseId)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_id_map_resolve() {
        let map = CourseIdMap::new().with("trk-data-101", "course-data-basics");
        assert_eq!(
            map.resolve(&CourseId::new("trk-data-101")),
            Some(&CourseId::new("course-data-basics"))
        );
        assert!(map.resolve(&CourseId::new("unknown")).is_none());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_enrollment_deserializes_with_defaults() {
        let json = serde_json::json!({
            "user_id": "u1",
            "track_id": "trk-1",
            "status": "in-progress",
            "last_accessed_at": "2025-01-01T10:00:00Z"
        });
        let enrollment: TrackEnrollment = serde_json::from_value(json).unwrap();
        assert!(enrollment.completed_course_ids.is_empty());
        assert!(enrollment.capstone_completed.is_none());
        assert!(enrollment.last_accessed_at.is_some());
        assert!(!enrollment.is_completed());
    }

    #[test]
    fn test_enrollment_status_parse() {
        assert_eq!("completed".parse::<EnrollmentStatus>().unwrap(), EnrollmentStatus::Completed);
        assert_eq!("in_progress".parse::<EnrollmentStatus>().unwrap(), EnrollmentStatus::InProgress);
        let err = "paused".parse::<EnrollmentStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown enrollment status 'paused'");
    }
}
