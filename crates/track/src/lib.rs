//! Learning tracks (Layer 3)
//!
//! Track ordering, per-learner track progress and enrollment analytics.

#![warn(missing_docs)]

pub mod runtime;
pub mod analytics;

#[cfg(test)]
pub(crate) mod fixtures;

pub use runtime::{
    build_track_progress_snapshot, is_course_completed, ordered_track_courses,
    required_courses, SnapshotInput, TrackProgress, TrackProgressSnapshot,
};
pub use analytics::{BottleneckCourse, CourseDropoff, TrackAnalytics, TrackAnalyticsSnapshot};
