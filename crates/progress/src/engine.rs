//! Progression engine - lesson completion and quiz grading.
//!
//! Both transitions are pure: they take the current state by reference and
//! return a new one. Acting on a locked or finished module, a locked lesson
//! or an unknown id is a no-op that hands back an unchanged copy, since the
//! caller is usually a UI event firing against stale state.

use coursepath_core::{
    percent, Clock, CourseState, CourseTemplate, LessonId, LessonStatus, LessonType, Module,
    ModuleId, ModuleStatus, ProgressionConfig, QuizResult, QuizStatus, SystemClock, UserId,
};
use tracing::debug;

use crate::derive::recompute;

/// Applies learner actions to course states.
#[derive(Debug, Clone)]
pub struct ProgressionEngine<C: Clock = SystemClock> {
    config: ProgressionConfig,
    clock: C,
}

impl ProgressionEngine<SystemClock> {
    /// Create an engine stamping dates from the system clock.
    pub fn new(config: ProgressionConfig) -> Self {
        Self {
            config,
            clock: SystemClock,
        }
    }
}

impl Default for ProgressionEngine<SystemClock> {
    fn default() -> Self {
        Self::new(ProgressionConfig::default())
    }
}

impl<C: Clock> ProgressionEngine<C> {
    /// Replace the clock.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> ProgressionEngine<C2> {
        ProgressionEngine {
            config: self.config,
            clock,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Materialize a learner's state for a course and derive its aggregates.
    ///
    /// Leading modules without lessons complete straight away.
    pub fn start_course(&self, template: &CourseTemplate, user_id: UserId) -> CourseState {
        let mut state = CourseState::from_template(template, user_id);
        if state.modules.first().is_some_and(|m| m.lessons.is_empty()) {
            self.settle_module(&mut state, 0);
        }
        recompute(state, &self.config, self.clock.today())
    }

    /// Mark a lesson completed.
    ///
    /// Promotes the next not-started lesson when nothing else is in progress,
    /// completes the module when its last lesson is done and opens the module
    /// after it.
    pub fn complete_lesson(
        &self,
        state: &CourseState,
        module_id: &ModuleId,
        lesson_id: &LessonId,
    ) -> CourseState {
        let mut next = state.clone();

        let Some(mi) = next.module_index(module_id) else {
            debug!(module = %module_id, "Ignoring lesson completion: unknown module");
            return next;
        };
        let module = &mut next.modules[mi];
        if module.status != ModuleStatus::InProgress {
            debug!(module = %module_id, status = %module.status, "Ignoring lesson completion: module not open");
            return next;
        }

        let Some(li) = module.lessons.iter().position(|l| &l.id == lesson_id) else {
            debug!(module = %module_id, lesson = %lesson_id, "Ignoring lesson completion: unknown lesson");
            return next;
        };
        let lesson = &mut module.lessons[li];
        if matches!(lesson.status, LessonStatus::Locked | LessonStatus::Completed) {
            debug!(lesson = %lesson_id, status = %lesson.status, "Ignoring lesson completion");
            return next;
        }

        lesson.status = LessonStatus::Completed;
        lesson.completed_on = Some(self.clock.today());
        promote_next_lesson(module);
        self.settle_module(&mut next, mi);

        recompute(next, &self.config, self.clock.today())
    }

    /// Record a quiz attempt for a gradable lesson.
    ///
    /// Every submission counts as an attempt. A passing score completes the
    /// lesson exactly like [`complete_lesson`](Self::complete_lesson); a
    /// failing one leaves the lesson in progress for a retry.
    ///
    /// Only quiz lessons are graded; an attempt on any other lesson type is
    /// a no-op, as is one on a locked module or lesson.
    pub fn submit_quiz_attempt(
        &self,
        state: &CourseState,
        module_id: &ModuleId,
        lesson_id: &LessonId,
        score: u8,
        pass_threshold: u8,
    ) -> CourseState {
        let mut next = state.clone();

        let Some(mi) = next.module_index(module_id) else {
            debug!(module = %module_id, "Ignoring quiz attempt: unknown module");
            return next;
        };
        if next.modules[mi].status == ModuleStatus::Locked {
            debug!(module = %module_id, "Ignoring quiz attempt: module locked");
            return next;
        }
        let Some(li) = next.modules[mi].lessons.iter().position(|l| &l.id == lesson_id) else {
            debug!(module = %module_id, lesson = %lesson_id, "Ignoring quiz attempt: unknown lesson");
            return next;
        };
        let lesson = &next.modules[mi].lessons[li];
        if lesson.status == LessonStatus::Locked {
            debug!(lesson = %lesson_id, "Ignoring quiz attempt: lesson locked");
            return next;
        }
        if lesson.lesson_type != LessonType::Quiz {
            debug!(lesson = %lesson_id, "Ignoring quiz attempt: lesson is not gradable");
            return next;
        }

        let passed = score >= pass_threshold;
        record_attempt(&mut next, module_id, lesson_id, score, passed);
        debug!(
            module = %module_id,
            lesson = %lesson_id,
            score,
            pass_threshold,
            passed,
            "Quiz attempt recorded"
        );

        let module = &mut next.modules[mi];
        let lesson = &mut module.lessons[li];
        match (passed, lesson.status) {
            (true, LessonStatus::Completed) => {
                // Retake of an already passed quiz
                module.quiz_score = Some(score);
            }
            (true, _) => {
                lesson.status = LessonStatus::Completed;
                lesson.completed_on = Some(self.clock.today());
                module.quiz_score = Some(score);
                promote_next_lesson(module);
                self.settle_module(&mut next, mi);
            }
            (false, LessonStatus::Completed) => {
                // Never reopen a passed quiz; the module may already have unlocked its successor
            }
            (false, _) => {
                lesson.status = LessonStatus::InProgress;
            }
        }

        recompute(next, &self.config, self.clock.today())
    }

    /// Bring module `mi`'s progress and status in line with its lessons and
    /// open the following module once it completes. A newly opened module
    /// without lessons completes at once, so the cascade continues past it.
    fn settle_module(&self, state: &mut CourseState, mut mi: usize) {
        loop {
            let module = &mut state.modules[mi];
            if !module.all_lessons_completed() {
                module.progress = percent(module.completed_lessons(), module.lessons.len());
                module.status = ModuleStatus::InProgress;
                return;
            }

            module.progress = 100;
            module.status = ModuleStatus::Completed;
            if module.quiz_score.is_none() {
                module.quiz_score = Some(self.config.default_quiz_score);
            }
            debug!(module = %module.id, "Module completed");

            match state.modules.get_mut(mi + 1) {
                Some(following) if following.status == ModuleStatus::Locked => {
                    unlock_module(following);
                    debug!(module = %following.id, "Module unlocked");
                    if !following.lessons.is_empty() {
                        return;
                    }
                    mi += 1;
                }
                _ => return,
            }
        }
    }
}

/// If no lesson is in progress, start the first not-started one.
fn promote_next_lesson(module: &mut Module) {
    if module.lessons.iter().any(|l| l.status == LessonStatus::InProgress) {
        return;
    }
    if let Some(lesson) = module
        .lessons
        .iter_mut()
        .find(|l| l.status == LessonStatus::NotStarted)
    {
        lesson.status = LessonStatus::InProgress;
    }
}

fn unlock_module(module: &mut Module) {
    module.status = ModuleStatus::InProgress;
    module.progress = 0;
    for (index, lesson) in module.lessons.iter_mut().enumerate() {
        lesson.status = if index == 0 {
            LessonStatus::InProgress
        } else {
            LessonStatus::NotStarted
        };
        lesson.completed_on = None;
    }
}

fn record_attempt(
    state: &mut CourseState,
    module_id: &ModuleId,
    lesson_id: &LessonId,
    score: u8,
    passed: bool,
) {
    let status = if passed { QuizStatus::Passed } else { QuizStatus::Pending };

    match state.quiz_results.iter_mut().find(|q| &q.module_id == module_id) {
        Some(result) => {
            result.attempts += 1;
            result.score = Some(score);
            result.status = status;
        }
        None => state.quiz_results.push(QuizResult {
            module_id: module_id.clone(),
            lesson_id: lesson_id.clone(),
            score: Some(score),
            attempts: 1,
            status,
        }),
    }
}
