//! Per-track certification policy.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::TrackId;

/// Validity window applied when a track has no explicit policy.
pub const DEFAULT_VALIDITY_MONTHS: u32 = 24;

/// Certification policy for a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPolicy {
    /// Current version of the path content
    pub path_version: String,
    /// Human-readable renewal rules
    pub renewal_policy: String,
    /// Whether holders must recertify on a new version
    pub recertification_required: bool,
    /// Validity window in months
    pub validity_months: u32,
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self {
            path_version: "2025.1".to_string(),
            renewal_policy: "Renew by completing the latest path version before expiry.".to_string(),
            recertification_required: false,
            validity_months: DEFAULT_VALIDITY_MONTHS,
        }
    }
}

/// Static policy table keyed by track, with a global fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTable {
    /// Used for any track without an explicit entry
    #[serde(default)]
    pub default: PathPolicy,
    /// Explicit policies by track
    #[serde(default)]
    pub tracks: HashMap<TrackId, PathPolicy>,
}

impl PolicyTable {
    /// Table holding only the global default.
    pub fn new(default: PathPolicy) -> Self {
        Self {
            default,
            tracks: HashMap::new(),
        }
    }

    /// Add an explicit policy for a track.
    pub fn with_track(mut self, track_id: impl Into<TrackId>, policy: PathPolicy) -> Self {
        self.tracks.insert(track_id.into(), policy);
        self
    }

    /// The policy for a track, falling back to the default.
    pub fn policy_for(&self, track_id: &TrackId) -> &PathPolicy {
        self.tracks.get(track_id).unwrap_or(&self.default)
    }
}
