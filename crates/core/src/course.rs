//! Course progress model - modules, lessons and quiz results for one learner.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::certificate::{CertificateKind, CertificateRequirement, IssuedCertificate};
use crate::error::ParseError;
use crate::id::{CourseId, LessonId, ModuleId, UserId};

/// Kind of content a lesson delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LessonType {
    /// Video lesson
    Video,
    /// Reading material
    Reading,
    /// Gradable lesson; completing it goes through a quiz attempt
    Quiz,
    /// Hands-on exercise
    Exercise,
    /// Discussion prompt
    Discussion,
}

/// Lesson status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LessonStatus {
    /// Its module is still locked
    Locked,
    /// Open but not started
    NotStarted,
    /// Currently being worked on
    InProgress,
    /// Done
    Completed,
}

impl LessonStatus {
    /// Kebab-case name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonStatus::Locked => "locked",
            LessonStatus::NotStarted => "not-started",
            LessonStatus::InProgress => "in-progress",
            LessonStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LessonStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "locked" => Ok(LessonStatus::Locked),
            "not-started" | "not_started" => Ok(LessonStatus::NotStarted),
            "in-progress" | "in_progress" => Ok(LessonStatus::InProgress),
            "completed" => Ok(LessonStatus::Completed),
            _ => Err(ParseError::unknown("lesson status", s)),
        }
    }
}

/// The smallest unit of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson identifier
    pub id: LessonId,
    /// Lesson title
    pub title: String,
    /// Content kind
    #[serde(rename = "type")]
    pub lesson_type: LessonType,
    /// Expected duration in minutes
    pub duration_minutes: u32,
    /// Current status
    pub status: LessonStatus,
    /// Day the lesson was completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_on: Option<NaiveDate>,
}

impl Lesson {
    /// Whether the lesson has been completed.
    pub fn is_completed(&self) -> bool {
        self.status == LessonStatus::Completed
    }
}

/// Module status. Modules have no "not started" state: a module is either
/// locked behind its predecessor or open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleStatus {
    /// Waiting for the previous module
    Locked,
    /// Open
    InProgress,
    /// Every lesson completed
    Completed,
}

impl ModuleStatus {
    /// Kebab-case name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleStatus::Locked => "locked",
            ModuleStatus::InProgress => "in-progress",
            ModuleStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered unit inside a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Module identifier
    pub id: ModuleId,
    /// Module title
    pub title: String,
    /// Position within the course, starting at 1
    pub sequence: u32,
    /// Current status
    pub status: ModuleStatus,
    /// Completed-lesson ratio, 0-100
    pub progress: u8,
    /// Recorded quiz score, set on completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_score: Option<u8>,
    /// Lessons in order
    pub lessons: Vec<Lesson>,
}

impl Module {
    /// Look up a lesson.
    pub fn lesson(&self, id: &LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|l| &l.id == id)
    }

    /// Number of completed lessons.
    pub fn completed_lessons(&self) -> usize {
        self.lessons.iter().filter(|l| l.is_completed()).count()
    }

    /// All lessons completed. A module without lessons counts as complete.
    pub fn all_lessons_completed(&self) -> bool {
        self.lessons.iter().all(Lesson::is_completed)
    }

    /// The first gradable lesson, if the module has one.
    pub fn quiz_lesson(&self) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.lesson_type == LessonType::Quiz)
    }
}

/// Status of a module's quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuizStatus {
    /// Module not yet open
    Locked,
    /// Open but not yet passed
    Pending,
    /// Passed
    Passed,
}

impl std::fmt::Display for QuizStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuizStatus::Locked => write!(f, "locked"),
            QuizStatus::Pending => write!(f, "pending"),
            QuizStatus::Passed => write!(f, "passed"),
        }
    }
}

/// Grading record for the quiz of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    /// Module the quiz belongs to
    pub module_id: ModuleId,
    /// The gradable lesson
    pub lesson_id: LessonId,
    /// Latest submitted (or defaulted) score
    pub score: Option<u8>,
    /// Submissions so far, pass or fail
    pub attempts: u32,
    /// Derived from the module status
    pub status: QuizStatus,
}

/// A learner's state within one course ("user course data").
///
/// Everything except `modules` is derived; the progression engine recomputes
/// it after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseState {
    /// Course identifier
    pub course_id: CourseId,
    /// Learner
    pub user_id: UserId,
    /// Course title
    pub title: String,
    /// Modules in sequence order
    pub modules: Vec<Module>,
    /// One row per module with a quiz
    #[serde(default)]
    pub quiz_results: Vec<QuizResult>,
    /// Mean module progress, 0-100
    #[serde(default)]
    pub overall_progress: u8,
    /// Modules completed
    #[serde(default)]
    pub completed_modules: usize,
    /// Modules in the course
    #[serde(default)]
    pub total_modules: usize,
    /// Course certificate checklist
    #[serde(default)]
    pub certificate_requirements: Vec<CertificateRequirement>,
    /// Certificates issued for this course
    #[serde(default)]
    pub certificates: Vec<IssuedCertificate>,
}

impl CourseState {
    /// Materialize a fresh state from a template.
    ///
    /// Modules are ordered by sequence. The first module opens with its first
    /// lesson in progress; later modules start locked. Derived fields are left
    /// empty until the state is recomputed.
    pub fn from_template(template: &CourseTemplate, user_id: UserId) -> Self {
        let mut module_templates: Vec<&ModuleTemplate> = template.modules.iter().collect();
        module_templates.sort_by_key(|m| m.sequence);

        let modules = module_templates
            .into_iter()
            .enumerate()
            .map(|(index, mt)| {
                let open = index == 0;
                let lessons = mt
                    .lessons
                    .iter()
                    .enumerate()
                    .map(|(li, lt)| Lesson {
                        id: lt.id.clone(),
                        title: lt.title.clone(),
                        lesson_type: lt.lesson_type,
                        duration_minutes: lt.duration_minutes,
                        status: match (open, li) {
                            (false, _) => LessonStatus::Locked,
                            (true, 0) => LessonStatus::InProgress,
                            (true, _) => LessonStatus::NotStarted,
                        },
                        completed_on: None,
                    })
                    .collect();

                Module {
                    id: mt.id.clone(),
                    title: mt.title.clone(),
                    sequence: mt.sequence,
                    status: if open { ModuleStatus::InProgress } else { ModuleStatus::Locked },
                    progress: 0,
                    quiz_score: None,
                    lessons,
                }
            })
            .collect();

        Self {
            course_id: template.course_id.clone(),
            user_id,
            title: template.title.clone(),
            modules,
            quiz_results: Vec::new(),
            overall_progress: 0,
            completed_modules: 0,
            total_modules: 0,
            certificate_requirements: Vec::new(),
            certificates: Vec::new(),
        }
    }

    /// Look up a module.
    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| &m.id == id)
    }

    /// Position of a module in course order.
    pub fn module_index(&self, id: &ModuleId) -> Option<usize> {
        self.modules.iter().position(|m| &m.id == id)
    }

    /// Quiz result row for a module.
    pub fn quiz_result(&self, module_id: &ModuleId) -> Option<&QuizResult> {
        self.quiz_results.iter().find(|q| &q.module_id == module_id)
    }

    /// The course-level certificate, if one has been synced.
    pub fn course_certificate(&self) -> Option<&IssuedCertificate> {
        self.certificates
            .iter()
            .find(|c| c.kind == CertificateKind::Course)
    }

    /// Where the learner should continue: the first in-progress lesson.
    pub fn next_lesson(&self) -> Option<(&Module, &Lesson)> {
        self.modules
            .iter()
            .filter(|m| m.status == ModuleStatus::InProgress)
            .find_map(|m| {
                m.lessons
                    .iter()
                    .find(|l| l.status == LessonStatus::InProgress)
                    .map(|l| (m, l))
            })
    }

    /// Every module completed.
    pub fn is_complete(&self) -> bool {
        !self.modules.is_empty()
            && self.modules.iter().all(|m| m.status == ModuleStatus::Completed)
    }
}

/// Overall progress per course-level id, as consumed by track snapshots.
pub type CourseProgressMap = HashMap<CourseId, u8>;

/// Build the `course id -> overall progress` map read by track snapshots.
pub fn course_progress_map<'a>(
    states: impl IntoIterator<Item = &'a CourseState>,
) -> CourseProgressMap {
    states
        .into_iter()
        .map(|s| (s.course_id.clone(), s.overall_progress))
        .collect()
}

/// Catalog definition of a course, used to materialize learner state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseTemplate {
    /// Course identifier
    pub course_id: CourseId,
    /// Course title
    pub title: String,
    /// Module definitions
    pub modules: Vec<ModuleTemplate>,
}

/// Catalog definition of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTemplate {
    /// Module identifier
    pub id: ModuleId,
    /// Module title
    pub title: String,
    /// Position within the course
    pub sequence: u32,
    /// Lesson definitions in order
    pub lessons: Vec<LessonTemplate>,
}

/// Catalog definition of a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonTemplate {
    /// Lesson identifier
    pub id: LessonId,
    /// Lesson title
    pub title: String,
    /// Content kind
    #[serde(rename = "type")]
    pub lesson_type: LessonType,
    /// Expected length
    #[serde(default)]
    pub duration_minutes: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> CourseTemplate {
        let lesson = |id: &str, t: LessonType| LessonTemplate {
            id: LessonId::new(id),
            title: id.to_uppercase(),
            lesson_type: t,
            duration_minutes: 10,
        };
        CourseTemplate {
            course_id: CourseId::new("course-1"),
            title: "Course One".to_string(),
            // Deliberately out of order
            modules: vec![
                ModuleTemplate {
                    id: ModuleId::new("m2"),
                    title: "Second".to_string(),
                    sequence: 2,
                    lessons: vec![lesson("m2-l1", LessonType::Video), lesson("m2-l2", LessonType::Quiz)],
                },
                ModuleTemplate {
                    id: ModuleId::new("m1"),
                    title: "First".to_string(),
                    sequence: 1,
                    lessons: vec![lesson("m1-l1", LessonType::Reading), lesson("m1-l2", LessonType::Exercise)],
                },
            ],
        }
    }

    #[test]
    fn test_from_template_opens_first_module_only() {
        let state = CourseState::from_template(&template(), UserId::new("u1"));

        assert_eq!(state.modules[0].id, ModuleId::new("m1"));
        assert_eq!(state.modules[0].status, ModuleStatus::InProgress);
        assert_eq!(state.modules[0].lessons[0].status, LessonStatus::InProgress);
        assert_eq!(state.modules[0].lessons[1].status, LessonStatus::NotStarted);

        assert_eq!(state.modules[1].status, ModuleStatus::Locked);
        assert!(state.modules[1]
            .lessons
            .iter()
            .all(|l| l.status == LessonStatus::Locked));
    }

    #[test]
    fn test_next_lesson() {
        let state = CourseState::from_template(&template(), UserId::new("u1"));
        let (module, lesson) = state.next_lesson().unwrap();
        assert_eq!(module.id, ModuleId::new("m1"));
        assert_eq!(lesson.id, LessonId::new("m1-l1"));
    }

    #[test]
    fn test_quiz_lesson_lookup() {
        let state = CourseState::from_template(&template(), UserId::new("u1"));
        assert!(state.modules[0].quiz_lesson().is_none());
        assert_eq!(state.modules[1].quiz_lesson().unwrap().id, LessonId::new("m2-l2"));
    }

    #[test]
    fn test_lesson_status_parse() {
        assert_eq!("in-progress".parse::<LessonStatus>().unwrap(), LessonStatus::InProgress);
        assert_eq!("NOT_STARTED".parse::<LessonStatus>().unwrap(), LessonStatus::NotStarted);
        assert!("done".parse::<LessonStatus>().is_err());
    }

    #[test]
    fn test_lesson_serializes_type_field() {
        let state = CourseState::from_template(&template(), UserId::new("u1"));
        let json = serde_json::to_value(&state.modules[0].lessons[0]).unwrap();
        assert_eq!(json["type"], "reading");
        assert_eq!(json["status"], "in-progress");
        assert!(json.get("completed_on").is_none());
    }

    #[test]
    fn test_course_progress_map() {
        let mut a = CourseState::from_template(&template(), UserId::new("u1"));
        a.overall_progress = 100;
        let mut b = a.clone();
        b.course_id = CourseId::new("course-2");
        b.overall_progress = 40;

        let map = course_progress_map([&a, &b]);
        assert_eq!(map[&CourseId::new("course-1")], 100);
        assert_eq!(map[&CourseId::new("course-2")], 40);
    }
}
