//! Course progression (Layer 2)
//!
//! Lesson completion, quiz grading, aggregate re-derivation and the course
//! certificate.

#![warn(missing_docs)]

pub mod engine;
pub mod certificate;
mod derive;

pub use engine::ProgressionEngine;
pub use certificate::course_certificate_id;
pub use derive::{REQUIREMENT_ALL_MODULES, REQUIREMENT_ALL_QUIZZES};
