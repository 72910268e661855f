//! Path certification (Layer 4)
//!
//! Decides whether a learner has earned a track-level ("path") certificate.

#![warn(missing_docs)]

pub mod path;

pub use path::{path_certificate_id, PathCertificateState, PathCertifier};
