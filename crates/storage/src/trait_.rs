//! Storage trait abstraction.

use async_trait::async_trait;
use coursepath_core::{
    CourseId, CourseIdMap, CourseState, CourseTemplate, LearningTrack, PolicyTable, Settings,
    TrackEnrollment, TrackId, UserId,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Identifier not usable as a file name
    #[error("Invalid id: '{0}'")]
    InvalidId(String),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for CoursePath data.
///
/// Reference data (tracks, enrollments, policies, course map, templates) is
/// read-only. Course states are the only records written back.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Course state operations ===

    /// Save a learner's course state (create or replace).
    async fn save_course_state(&mut self, state: &CourseState) -> Result<()>;

    /// Load a learner's course state.
    async fn load_course_state(&self, user_id: &UserId, course_id: &CourseId) -> Result<Option<CourseState>>;

    /// List every course state held for a learner.
    async fn list_course_states(&self, user_id: &UserId) -> Result<Vec<CourseState>>;

    // === Catalog operations ===

    /// Load the template a course state is materialised from.
    async fn load_template(&self, course_id: &CourseId) -> Result<Option<CourseTemplate>>;

    /// List all learning tracks.
    async fn list_tracks(&self) -> Result<Vec<LearningTrack>>;

    /// Load a track by ID.
    async fn load_track(&self, id: &TrackId) -> Result<Option<LearningTrack>> {
        Ok(self.list_tracks().await?.into_iter().find(|t| &t.id == id))
    }

    // === Enrollment operations ===

    /// List all track enrollments.
    async fn list_enrollments(&self) -> Result<Vec<TrackEnrollment>>;

    /// List a learner's enrollments.
    async fn list_user_enrollments(&self, user_id: &UserId) -> Result<Vec<TrackEnrollment>> {
        Ok(self
            .list_enrollments()
            .await?
            .into_iter()
            .filter(|e| &e.user_id == user_id)
            .collect())
    }

    /// List the enrollments against one track.
    async fn list_track_enrollments(&self, track_id: &TrackId) -> Result<Vec<TrackEnrollment>> {
        Ok(self
            .list_enrollments()
            .await?
            .into_iter()
            .filter(|e| &e.track_id == track_id)
            .collect())
    }

    // === Static tables ===

    /// Per-track certification policies.
    async fn load_policies(&self) -> Result<PolicyTable>;

    /// Track course id to live course id map.
    async fn load_course_map(&self) -> Result<CourseIdMap>;

    /// Engine settings.
    async fn load_settings(&self) -> Result<Settings>;
}
