//! Identifiers for courses, modules, lessons, tracks and learners.
//!
//! Identifiers come from catalog and enrollment data, so they are plain
//! strings wrapped in distinct types to keep a lesson id from being passed
//! where a module id is expected.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Course-level identifier (the id used by course states and templates).
    CourseId
);
string_id!(
    /// Identifier of a module inside a course.
    ModuleId
);
string_id!(
    /// Identifier of a lesson inside a module.
    LessonId
);
string_id!(
    /// Identifier of a learner.
    UserId
);
string_id!(
    /// Identifier of a learning track.
    TrackId
);
string_id!(
    /// Identifier of an issued certificate.
    CertificateId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_transparent_in_json() {
        let id = CourseId::new("course-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"course-1\"");

        let parsed: TrackId = serde_json::from_str("\"trk-data\"").unwrap();
        assert_eq!(parsed.as_str(), "trk-data");
    }

    #[test]
    fn test_id_display_and_parse() {
        let id: LessonId = "l-2".parse().unwrap();
        assert_eq!(id.to_string(), "l-2");
        assert_eq!(UserId::from("u1"), UserId::new(String::from("u1")));
    }
}
