//! Track runtime and per-learner progress snapshot.

use coursepath_core::{
    percent, CourseId, CourseIdMap, CourseProgressMap, EnrollmentStatus, LearningTrack,
    TrackCourse, TrackEnrollment, TrackId, UserId, Time,
};
use serde::Serialize;
use tracing::debug;

/// The track's courses in sequence order.
pub fn ordered_track_courses(track: &LearningTrack) -> Vec<&TrackCourse> {
    let mut courses: Vec<&TrackCourse> = track.courses.iter().collect();
    courses.sort_by_key(|c| c.sequence);
    courses
}

/// The track's required courses in sequence order.
pub fn required_courses(track: &LearningTrack) -> Vec<&TrackCourse> {
    ordered_track_courses(track)
        .into_iter()
        .filter(|c| c.is_required())
        .collect()
}

/// Whether a track course counts as complete for an enrollment.
///
/// Either the enrollment lists it, or the track-level id maps to a course
/// whose live progress has reached 100.
pub fn is_course_completed(
    course_id: &CourseId,
    enrollment: &TrackEnrollment,
    course_progress: &CourseProgressMap,
    course_map: &CourseIdMap,
) -> bool {
    if enrollment.has_completed(course_id) {
        return true;
    }
    course_map
        .resolve(course_id)
        .and_then(|mapped| course_progress.get(mapped))
        .is_some_and(|progress| *progress >= 100)
}

/// Inputs for [`build_track_progress_snapshot`].
#[derive(Debug, Clone, Copy)]
pub struct SnapshotInput<'a> {
    /// Learner
    pub user_id: &'a UserId,
    /// Track catalog
    pub tracks: &'a [LearningTrack],
    /// The learner's enrollments
    pub enrollments: &'a [TrackEnrollment],
    /// Live progress by course-level id
    pub course_progress: &'a CourseProgressMap,
    /// Track course id to course id
    pub course_map: &'a CourseIdMap,
}

/// A learner's derived standing in one track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackProgress {
    /// Track identifier
    pub track_id: TrackId,
    /// Track title
    pub title: String,
    /// Derived status; wins over the enrollment's stored one
    pub status: EnrollmentStatus,
    /// Required courses completed, 0-100
    pub progress_percent: u8,
    /// Required courses completed
    pub completed_required: usize,
    /// Required courses in the track
    pub total_required: usize,
    /// First incomplete required course, else the enrollment's stored next course
    pub next_required_course: Option<CourseId>,
    /// From the enrollment
    pub last_accessed_at: Option<Time>,
}

/// A learner's progress across all enrolled tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackProgressSnapshot {
    /// Learner
    pub user_id: UserId,
    /// One entry per enrolled track
    pub tracks: Vec<TrackProgress>,
}

impl TrackProgressSnapshot {
    /// Progress for one track.
    pub fn track(&self, track_id: &TrackId) -> Option<&TrackProgress> {
        self.tracks.iter().find(|t| &t.track_id == track_id)
    }

    /// Number of tracks whose required courses are all complete.
    pub fn completed_tracks(&self) -> usize {
        self.tracks
            .iter()
            .filter(|t| t.status == EnrollmentStatus::Completed)
            .count()
    }
}

/// Compute a learner's progress in every track they are enrolled in.
///
/// Enrollments for other users are ignored, as are enrollments whose track
/// is not in `tracks`.
pub fn build_track_progress_snapshot(input: SnapshotInput<'_>) -> TrackProgressSnapshot {
    let tracks = input
        .enrollments
        .iter()
        .filter(|e| &e.user_id == input.user_id)
        .filter_map(|enrollment| {
            let Some(track) = input.tracks.iter().find(|t| t.id == enrollment.track_id) else {
                debug!(track = %enrollment.track_id, "Skipping enrollment for unknown track");
                return None;
            };
            Some(track_progress(track, enrollment, input.course_progress, input.course_map))
        })
        .collect();

    TrackProgressSnapshot {
        user_id: input.user_id.clone(),
        tracks,
    }
}

fn track_progress(
    track: &LearningTrack,
    enrollment: &TrackEnrollment,
    course_progress: &CourseProgressMap,
    course_map: &CourseIdMap,
) -> TrackProgress {
    let required = required_courses(track);
    let done = |c: &TrackCourse| is_course_completed(&c.course_id, enrollment, course_progress, course_map);

    let total_required = required.len();
    let completed_required = required.iter().filter(|c| done(c)).count();
    let all_done = completed_required == total_required;

    let progress_percent = if total_required == 0 {
        100
    } else {
        percent(completed_required, total_required)
    };

    let status = match (all_done, enrollment.status) {
        (true, _) => EnrollmentStatus::Completed,
        // Stored completion without the evidence to back it
        (false, EnrollmentStatus::Completed) => EnrollmentStatus::InProgress,
        (false, stored) => stored,
    };

    let next_required_course = required
        .iter()
        .find(|c| !done(c))
        .map(|c| c.course_id.clone())
        .or_else(|| enrollment.next_course_id.clone());

    TrackProgress {
        track_id: track.id.clone(),
        title: track.title.clone(),
        status,
        progress_percent,
        completed_required,
        total_required,
        next_required_course,
        last_accessed_at: enrollment.last_accessed_at,
    }
}
