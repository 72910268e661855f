//! Coursepath core data models.
//!
//! This crate defines the data structures shared by the progression,
//! track and certification engines: learner course state, certificates,
//! learning tracks, enrollments and the static reference tables.

#![warn(missing_docs)]

// Identities
mod id;

// Course progress
mod course;
mod certificate;

// Tracks and policy
mod track;
mod policy;

// Support
mod calc;
mod clock;
mod config;
mod error;

// Re-exports
pub use id::*;

// Course
pub use course::{
    course_progress_map, CourseProgressMap, CourseState, CourseTemplate, Lesson, LessonStatus, LessonTemplate,
    LessonType, Module, ModuleStatus, ModuleTemplate, QuizResult, QuizStatus,
};
pub use certificate::{
    all_met, CertificateKind, CertificateRequirement, CertificateStatus, IssuedCertificate,
};

// Track
pub use track::{
    CompletionRule, CourseIdMap, CourseRequirement, EnrollmentStatus, LearningTrack,
    TrackCourse, TrackEnrollment,
};
pub use policy::{PathPolicy, PolicyTable, DEFAULT_VALIDITY_MONTHS};

// Support
pub use calc::{add_months, mean_percent, percent};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AnalyticsConfig, PathCertificateConfig, ProgressionConfig, Settings};
pub use error::ParseError;

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
