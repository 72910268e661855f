//! Track analytics across every enrollment in a track.
//!
//! Reports completion rate, average completion time, inactive learners and a
//! per-course drop-off funnel over the required courses.

use coursepath_core::{
    percent, AnalyticsConfig, CourseId, EnrollmentStatus, LearningTrack, TrackEnrollment, TrackId,
};
use serde::Serialize;
use tracing::debug;

use crate::runtime::required_courses;

/// Funnel row for one required course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseDropoff {
    /// Track-level course id
    pub course_id: CourseId,
    /// Course title
    pub title: String,
    /// Zero-based position among the required courses
    pub position: usize,
    /// Enrollments that got as far as this course
    pub reached_count: usize,
    /// Enrollments that list this course as completed
    pub completed_count: usize,
    /// Share of the previous course's reached learners lost here
    pub dropoff_rate: u8,
    /// `completed_count` over all enrollments
    pub completion_rate: u8,
}

/// The required course with the lowest completion rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BottleneckCourse {
    /// Track-level course id
    pub course_id: CourseId,
    /// Course title
    pub title: String,
    /// Share of enrollments that completed it
    pub completion_rate: u8,
}

/// Aggregate statistics for one track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackAnalyticsSnapshot {
    /// Analyzed track
    pub track_id: TrackId,
    /// Enrollments in the track
    pub total_enrollments: usize,
    /// Enrollments with completed status
    pub completed_enrollments: usize,
    /// Completed share, 0-100
    pub completion_rate: u8,
    /// Mean start-to-completion span; `None` without dated completions
    pub avg_completion_time_days: Option<i64>,
    /// In-progress learners idle past the threshold
    pub at_risk_learners: usize,
    /// One row per required course
    pub dropoff: Vec<CourseDropoff>,
    /// Required course with the lowest completion rate
    pub bottleneck: Option<BottleneckCourse>,
}

/// Builds analytics snapshots.
#[derive(Debug, Clone, Default)]
pub struct TrackAnalytics {
    config: AnalyticsConfig,
}

impl TrackAnalytics {
    /// Create an analyzer.
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Analyze the enrollments that belong to `track`; others are ignored.
    pub fn build(&self, track: &LearningTrack, enrollments: &[TrackEnrollment]) -> TrackAnalyticsSnapshot {
        let matching: Vec<&TrackEnrollment> = enrollments
            .iter()
            .filter(|e| e.track_id == track.id)
            .collect();
        let total = matching.len();
        let completed = matching.iter().filter(|e| e.is_completed()).count();

        let dropoff = self.dropoff_table(track, &matching);
        let bottleneck = dropoff
            .iter()
            .fold(None::<&CourseDropoff>, |best, row| match best {
                Some(b) if b.completion_rate <= row.completion_rate => Some(b),
                _ => Some(row),
            })
            .map(|row| BottleneckCourse {
                course_id: row.course_id.clone(),
                title: row.title.clone(),
                completion_rate: row.completion_rate,
            });

        let snapshot = TrackAnalyticsSnapshot {
            track_id: track.id.clone(),
            total_enrollments: total,
            completed_enrollments: completed,
            completion_rate: percent(completed, total),
            avg_completion_time_days: average_completion_days(&matching),
            at_risk_learners: self.at_risk_count(&matching),
            dropoff,
            bottleneck,
        };

        debug!(
            track = %track.id,
            total = snapshot.total_enrollments,
            completion_rate = snapshot.completion_rate,
            at_risk = snapshot.at_risk_learners,
            "Track analytics built"
        );
        snapshot
    }

    /// In-progress enrollments idle for at least the configured number of days.
    /// Enrollments with no recorded access are not counted.
    fn at_risk_count(&self, enrollments: &[&TrackEnrollment]) -> usize {
        enrollments
            .iter()
            .filter(|e| e.status == EnrollmentStatus::InProgress)
            .filter_map(|e| e.last_accessed_at)
            .filter(|accessed| {
                (self.config.reference_now - *accessed).num_days() >= self.config.at_risk_after_days
            })
            .count()
    }

    fn dropoff_table(&self, track: &LearningTrack, enrollments: &[&TrackEnrollment]) -> Vec<CourseDropoff> {
        let required = required_courses(track);
        let total = enrollments.len();

        // Required completions per enrollment, regardless of order
        let required_done: Vec<usize> = enrollments
            .iter()
            .map(|e| required.iter().filter(|c| e.has_completed(&c.course_id)).count())
            .collect();

        let mut previous_reached = total;
        required
            .iter()
            .enumerate()
            .map(|(position, course)| {
                let reached_count = enrollments
                    .iter()
                    .zip(&required_done)
                    .filter(|(e, done)| e.is_completed() || **done >= position)
                    .count();
                let completed_count = enrollments
                    .iter()
                    .filter(|e| e.has_completed(&course.course_id))
                    .count();

                let dropoff_rate = percent(previous_reached.saturating_sub(reached_count), previous_reached);
                previous_reached = reached_count;

                CourseDropoff {
                    course_id: course.course_id.clone(),
                    title: course.title.clone(),
                    position,
                    reached_count,
                    completed_count,
                    dropoff_rate,
                    completion_rate: percent(completed_count, total),
                }
            })
            .collect()
    }
}

/// Rounded mean of whole-day spans over completed, fully dated enrollments.
fn average_completion_days(enrollments: &[&TrackEnrollment]) -> Option<i64> {
    let spans: Vec<i64> = enrollments
        .iter()
        .filter(|e| e.is_completed())
        .filter_map(|e| Some((e.completed_on? - e.started_on?).num_days()))
        .collect();

    if spans.is_empty() {
        return None;
    }
    let mean = spans.iter().sum::<i64>() as f64 / spans.len() as f64;
    Some(mean.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{at, enrollment, track};
    use chrono::NaiveDate;
    use coursepath_core::CourseRequirement;

    fn two_required() -> LearningTrack {
        track("trk", &[
            ("a", 1, CourseRequirement::Required),
            ("e", 2, CourseRequirement::Elective),
            ("b", 3, CourseRequirement::Required),
        ])
    }

    #[test]
    fn test_dropoff_funnel_ten_enrollments() {
        let mut enrollments = Vec::new();
        for i in 0..6 {
            enrollments.push(enrollment(&format!("u{}", i), "trk", EnrollmentStatus::InProgress, &["a"]));
        }
        for i in 6..10 {
            enrollments.push(enrollment(&format!("u{}", i), "trk", EnrollmentStatus::InProgress, &[]));
        }

        let snapshot = TrackAnalytics::default().build(&two_required(), &enrollments);
        assert_eq!(snapshot.total_enrollments, 10);
        assert_eq!(snapshot.dropoff.len(), 2);

        let first = &snapshot.dropoff[0];
        assert_eq!(first.course_id, CourseId::new("a"));
        assert_eq!(first.reached_count, 10);
        assert_eq!(first.completed_count, 6);
        assert_eq!(first.dropoff_rate, 0);
        assert_eq!(first.completion_rate, 60);

        let second = &snapshot.dropoff[1];
        assert_eq!(second.course_id, CourseId::new("b"));
        assert_eq!(second.reached_count, 6);
        assert_eq!(second.completed_count, 0);
        assert_eq!(second.dropoff_rate, 40);

        let bottleneck = snapshot.bottleneck.unwrap();
        assert_eq!(bottleneck.course_id, CourseId::new("b"));
        assert_eq!(bottleneck.completion_rate, 0);
    }

    #[test]
    fn test_completed_enrollments_always_reach() {
        // Completed track but the completed list is empty (recorded elsewhere)
        let enrollments = vec![
            enrollment("u1", "trk", EnrollmentStatus::Completed, &[]),
            enrollment("u2", "trk", EnrollmentStatus::InProgress, &[]),
        ];
        let snapshot = TrackAnalytics::default().build(&two_required(), &enrollments);

        assert_eq!(snapshot.completion_rate, 50);
        assert_eq!(snapshot.dropoff[1].reached_count, 1);
        assert_eq!(snapshot.dropoff[1].dropoff_rate, 50);
    }

    #[test]
    fn test_completion_rate_and_average_days() {
        let mut done_fast = enrollment("u1", "trk", EnrollmentStatus::Completed, &["a", "b"]);
        done_fast.started_on = NaiveDate::from_ymd_opt(2024, 1, 1);
        done_fast.completed_on = NaiveDate::from_ymd_opt(2024, 1, 31);
        let mut done_slow = enrollment("u2", "trk", EnrollmentStatus::Completed, &["a", "b"]);
        done_slow.started_on = NaiveDate::from_ymd_opt(2024, 1, 1);
        done_slow.completed_on = NaiveDate::from_ymd_opt(2024, 3, 1);
        // Completed without dates is ignored for the average
        let undated = enrollment("u3", "trk", EnrollmentStatus::Completed, &["a", "b"]);
        let active = enrollment("u4", "trk", EnrollmentStatus::InProgress, &["a"]);
        let other_track = enrollment("u5", "other", EnrollmentStatus::Completed, &[]);

        let snapshot = TrackAnalytics::default()
            .build(&two_required(), &[done_fast, done_slow, undated, active, other_track]);

        assert_eq!(snapshot.total_enrollments, 4);
        assert_eq!(snapshot.completed_enrollments, 3);
        assert_eq!(snapshot.completion_rate, 75);
        // (30 + 60) / 2
        assert_eq!(snapshot.avg_completion_time_days, Some(45));
    }

    #[test]
    fn test_average_days_rounds() {
        let mut a = enrollment("u1", "trk", EnrollmentStatus::Completed, &[]);
        a.started_on = NaiveDate::from_ymd_opt(2024, 1, 1);
        a.completed_on = NaiveDate::from_ymd_opt(2024, 1, 11);
        let mut b = enrollment("u2", "trk", EnrollmentStatus::Completed, &[]);
        b.started_on = NaiveDate::from_ymd_opt(2024, 1, 1);
        b.completed_on = NaiveDate::from_ymd_opt(2024, 1, 12);

        let snapshot = TrackAnalytics::default().build(&two_required(), &[a, b]);
        // 10.5 rounds up
        assert_eq!(snapshot.avg_completion_time_days, Some(11));
    }

    #[test]
    fn test_at_risk_learners() {
        // Reference now is 2025-01-15T00:00:00Z
        let mut idle = enrollment("u1", "trk", EnrollmentStatus::InProgress, &[]);
        idle.last_accessed_at = Some(at("2025-01-01T00:00:00Z"));
        let mut recent = enrollment("u2", "trk", EnrollmentStatus::InProgress, &[]);
        recent.last_accessed_at = Some(at("2025-01-01T00:00:01Z"));
        let mut idle_but_done = enrollment("u3", "trk", EnrollmentStatus::Completed, &[]);
        idle_but_done.last_accessed_at = Some(at("2024-06-01T00:00:00Z"));

        let mut never_seen = enrollment("u4", "trk", EnrollmentStatus::InProgress, &[]);
        never_seen.last_accessed_at = None;

        let snapshot = TrackAnalytics::default()
            .build(&two_required(), &[idle, recent, idle_but_done, never_seen]);
        assert_eq!(snapshot.total_enrollments, 4);
        // No recorded access is never counted
        assert_eq!(snapshot.at_risk_learners, 1);
    }

    #[test]
    fn test_empty_track() {
        let snapshot = TrackAnalytics::default().build(&two_required(), &[]);
        assert_eq!(snapshot.total_enrollments, 0);
        assert_eq!(snapshot.completion_rate, 0);
        assert!(snapshot.avg_completion_time_days.is_none());
        assert!(snapshot.dropoff.iter().all(|r| r.dropoff_rate == 0 && r.reached_count == 0));
        // Every rate is zero, so the first required course is reported
        assert_eq!(snapshot.bottleneck.unwrap().course_id, CourseId::new("a"));
    }

    #[test]
    fn test_bottleneck_ties_keep_first() {
        let enrollments = vec![enrollment("u1", "trk", EnrollmentStatus::InProgress, &["a", "b"])];
        let snapshot = TrackAnalytics::default().build(&two_required(), &enrollments);
        assert_eq!(snapshot.bottleneck.unwrap().course_id, CourseId::new("a"));
    }
}
