//! JSON file storage implementation.
//!
//! Reads reference data from a seed directory and keeps course states as one
//! JSON file per learner and course:
//!
//! ```text
//! <root>/tracks.json
//! <root>/enrollments.json
//! <root>/policies.json          (optional)
//! <root>/course_map.json        (optional)
//! <root>/settings.json          (optional)
//! <root>/templates/<course>.json
//! <root>/states/<user>/<course>.json
//! ```

use std::path::{Path, PathBuf};

use coursepath_core::{
    CourseId, CourseIdMap, CourseState, CourseTemplate, LearningTrack, PolicyTable, Settings,
    TrackEnrollment, UserId,
};
use tokio::fs;
use tracing::debug;

use super::{Result, Storage, StorageError};

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Open storage over an existing seed directory, creating the `states/`
    /// and `templates/` subdirectories if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !fs::try_exists(&root).await? {
            return Err(StorageError::NotFound(format!(
                "seed directory {}",
                root.display()
            )));
        }

        fs::create_dir_all(root.join("states")).await?;
        fs::create_dir_all(root.join("templates")).await?;

        Ok(Self { root })
    }

    /// Seed directory this storage reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn state_dir(&self, user_id: &UserId) -> Result<PathBuf> {
        Ok(self.root.join("states").join(path_component(user_id.as_str())?))
    }
    fn state_path(&self, user_id: &UserId, course_id: &CourseId) -> Result<PathBuf> {
        Ok(self
            .state_dir(user_id)?
            .join(format!("{}.json", path_component(course_id.as_str())?)))
    }
    fn template_path(&self, course_id: &CourseId) -> Result<PathBuf> {
        Ok(self
            .root
            .join("templates")
            .join(format!("{}.json", path_component(course_id.as_str())?)))
    }

    /// Read an optional table, falling back to its default when absent.
    async fn read_or_default<T>(&self, name: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match read_json(&self.root.join(name)).await? {
            Some(value) => Ok(value),
            None => {
                debug!(file = name, "Optional seed file missing, using defaults");
                Ok(T::default())
            }
        }
    }

    /// Read a required table.
    async fn read_required<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T> {
        read_json(&self.root.join(name))
            .await?
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_course_state(&mut self, state: &CourseState) -> Result<()> {
        fs::create_dir_all(self.state_dir(&state.user_id)?).await?;
        let path = self.state_path(&state.user_id, &state.course_id)?;
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&path, json.as_bytes()).await?;
        debug!(user = %state.user_id, course = %state.course_id, "Course state saved");
        Ok(())
    }

    async fn load_course_state(&self, user_id: &UserId, course_id: &CourseId) -> Result<Option<CourseState>> {
        read_json(&self.state_path(user_id, course_id)?).await
    }

    async fn list_course_states(&self, user_id: &UserId) -> Result<Vec<CourseState>> {
        let dir = self.state_dir(user_id)?;
        if !fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }
        let mut states = list_dir(&dir).await?;
        states.sort_by(|a: &CourseState, b| a.course_id.as_str().cmp(b.course_id.as_str()));
        Ok(states)
    }

    async fn load_template(&self, course_id: &CourseId) -> Result<Option<CourseTemplate>> {
        read_json(&self.template_path(course_id)?).await
    }

    async fn list_tracks(&self) -> Result<Vec<LearningTrack>> {
        self.read_required("tracks.json").await
    }

    async fn list_enrollments(&self) -> Result<Vec<TrackEnrollment>> {
        self.read_required("enrollments.json").await
    }

    async fn load_policies(&self) -> Result<PolicyTable> {
        self.read_or_default("policies.json").await
    }

    async fn load_course_map(&self) -> Result<CourseIdMap> {
        self.read_or_default("course_map.json").await
    }

    async fn load_settings(&self) -> Result<Settings> {
        self.read_or_default("settings.json").await
    }
}

/// An id used as a file or directory name must stay inside its parent.
fn path_component(id: &str) -> Result<&str> {
    if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
        return Err(StorageError::InvalidId(id.to_string()));
    }
    Ok(id)
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_json(&entry.path()).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => debug!(path = %entry.path().display(), error = %e, "Skipping unreadable file"),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use coursepath_core::{EnrollmentStatus, TrackId};
    use tempfile::TempDir;

    async fn seeded() -> (TempDir, JsonStorage) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        let tracks = serde_json::json!([{
            "id": "trk-cloud",
            "title": "Cloud Transformation",
            "completion_rule": "required-plus-electives",
            "minimum_electives": 1,
            "capstone_required": true,
            "courses": [
                {"course_id": "cloud-101", "title": "Cloud Basics", "sequence": 1, "requirement": "required"},
                {"course_id": "cloud-201", "title": "Migration", "sequence": 2, "requirement": "elective"}
            ]
        }]);
        let enrollments = serde_json::json!([
            {"user_id": "user-1", "track_id": "trk-cloud", "status": "in-progress",
             "completed_course_ids": ["cloud-101"], "last_accessed_at": "2025-01-10T09:00:00Z"},
            {"user_id": "user-2", "track_id": "trk-cloud", "status": "completed",
             "completed_course_ids": ["cloud-101", "cloud-201"], "completed_on": "2024-12-01",
             "capstone_completed": true}
        ]);
        let template = serde_json::json!({
            "course_id": "cloud-101",
            "title": "Cloud Basics",
            "modules": [{
                "id": "m1", "title": "Intro", "sequence": 1,
                "lessons": [
                    {"id": "m1-l1", "title": "Welcome", "type": "video", "duration_minutes": 5},
                    {"id": "m1-l2", "title": "Check", "type": "quiz"}
                ]
            }]
        });

        std::fs::write(root.join("tracks.json"), tracks.to_string()).unwrap();
        std::fs::write(root.join("enrollments.json"), enrollments.to_string()).unwrap();
        std::fs::create_dir_all(root.join("templates")).unwrap();
        std::fs::write(root.join("templates").join("cloud-101.json"), template.to_string()).unwrap();

        let storage = JsonStorage::new(root).await.unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_missing_root_is_not_found() {
        let dir = TempDir::new().unwrap();
        let result = JsonStorage::new(dir.path().join("nope")).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reads_tracks_and_enrollments() {
        let (_dir, storage) = seeded().await;

        let tracks = storage.list_tracks().await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].minimum_electives, 1);

        let track = storage.load_track(&TrackId::new("trk-cloud")).await.unwrap();
        assert!(track.is_some());
        assert!(storage.load_track(&TrackId::new("trk-none")).await.unwrap().is_none());

        let mine = storage.list_user_enrollments(&UserId::new("user-2")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].status, EnrollmentStatus::Completed);
        assert_eq!(mine[0].completed_on, NaiveDate::from_ymd_opt(2024, 12, 1));

        let all = storage.list_track_enrollments(&TrackId::new("trk-cloud")).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_optional_tables_default_when_absent() {
        let (_dir, storage) = seeded().await;

        assert_eq!(storage.load_policies().await.unwrap(), PolicyTable::default());
        assert!(storage.load_course_map().await.unwrap().is_empty());
        assert_eq!(storage.load_settings().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_optional_tables_are_read_when_present() {
        let (dir, storage) = seeded().await;
        let policies = serde_json::json!({
            "tracks": {"trk-cloud": {
                "path_version": "2024.2",
                "renewal_policy": "Recertify yearly.",
                "recertification_required": true,
                "validity_months": 12
            }}
        });
        std::fs::write(dir.path().join("policies.json"), policies.to_string()).unwrap();
        std::fs::write(dir.path().join("course_map.json"), r#"{"cloud-101": "course-cloud-101"}"#).unwrap();
        std::fs::write(dir.path().join("settings.json"), r#"{"progression": {"default_quiz_score": 90}}"#).unwrap();

        let table = storage.load_policies().await.unwrap();
        assert_eq!(table.policy_for(&TrackId::new("trk-cloud")).validity_months, 12);
        assert_eq!(table.policy_for(&TrackId::new("trk-other")).validity_months, 24);

        let map = storage.load_course_map().await.unwrap();
        assert_eq!(map.resolve(&CourseId::new("cloud-101")), Some(&CourseId::new("course-cloud-101")));

        let settings = storage.load_settings().await.unwrap();
        assert_eq!(settings.progression.default_quiz_score, 90);
        assert_eq!(settings.analytics.at_risk_after_days, 14);
    }

    #[tokio::test]
    async fn test_missing_required_table_is_not_found() {
        let dir = TempDir::new().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        assert!(matches!(storage.list_tracks().await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error() {
        let (dir, storage) = seeded().await;
        std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();
        assert!(matches!(storage.load_settings().await, Err(StorageError::Json(_))));
    }

    #[tokio::test]
    async fn test_ids_cannot_escape_seed_directory() {
        let (dir, mut storage) = seeded().await;
        let course = CourseId::new("cloud-101");

        for bad in ["../../x", "..", "a/b", "a\\b", ""] {
            let result = storage.load_course_state(&UserId::new(bad), &course).await;
            assert!(matches!(result, Err(StorageError::InvalidId(_))), "{bad:?} accepted");
            assert!(matches!(
                storage.load_template(&CourseId::new(bad)).await,
                Err(StorageError::InvalidId(_))
            ));
        }

        let template = storage.load_template(&course).await.unwrap().unwrap();
        let state = CourseState::from_template(&template, UserId::new("../../escaped"));
        assert!(matches!(storage.save_course_state(&state).await, Err(StorageError::InvalidId(_))));
        assert!(!dir.path().join("escaped").exists());
        assert!(!dir.path().parent().unwrap().join("escaped").exists());
        assert!(matches!(
            storage.list_course_states(&UserId::new("..")).await,
            Err(StorageError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn test_course_state_save_load_list() {
        let (_dir, mut storage) = seeded().await;
        let user = UserId::new("user-1");
        let course = CourseId::new("cloud-101");

        assert!(storage.load_course_state(&user, &course).await.unwrap().is_none());
        assert!(storage.list_course_states(&user).await.unwrap().is_empty());

        let template = storage.load_template(&course).await.unwrap().unwrap();
        let state = CourseState::from_template(&template, user.clone());
        storage.save_course_state(&state).await.unwrap();

        let loaded = storage.load_course_state(&user, &course).await.unwrap().unwrap();
        assert_eq!(loaded, state);

        let listed = storage.list_course_states(&user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(storage.list_course_states(&UserId::new("user-2")).await.unwrap().is_empty());
    }
}
