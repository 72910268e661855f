//! Builders shared by the track tests.

use chrono::{DateTime, Utc};
use coursepath_core::{
    CompletionRule, CourseId, CourseRequirement, EnrollmentStatus, LearningTrack, TrackCourse,
    TrackEnrollment, TrackId, UserId,
};

pub fn track(id: &str, courses: &[(&str, u32, CourseRequirement)]) -> LearningTrack {
    LearningTrack {
        id: TrackId::new(id),
        title: format!("Track {}", id),
        courses: courses
            .iter()
            .map(|(course, sequence, requirement)| TrackCourse {
                course_id: CourseId::new(*course),
                title: course.to_uppercase(),
                sequence: *sequence,
                requirement: *requirement,
            })
            .collect(),
        completion_rule: CompletionRule::AllRequired,
        minimum_electives: 0,
        capstone_required: false,
    }
}

pub fn enrollment(user: &str, track: &str, status: EnrollmentStatus, completed: &[&str]) -> TrackEnrollment {
    TrackEnrollment {
        user_id: UserId::new(user),
        track_id: TrackId::new(track),
        status,
        overall_progress: 0,
        completed_course_ids: completed.iter().map(|c| CourseId::new(*c)).collect(),
        last_accessed_at: Some(at("2025-01-10T09:00:00Z")),
        started_on: None,
        completed_on: None,
        next_course_id: None,
        capstone_completed: None,
    }
}

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
}
