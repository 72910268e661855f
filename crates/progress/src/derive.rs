//! Re-derivation of a course state's aggregates.
//!
//! Every transition ends here. Module counts, overall progress, quiz results,
//! the certificate checklist and the course certificate are only ever
//! written by [`recompute`].

use chrono::NaiveDate;
use coursepath_core::{
    mean_percent, CertificateRequirement, CourseState, ModuleStatus, ProgressionConfig,
    QuizResult, QuizStatus,
};

use crate::certificate::sync_course_certificate;

/// Checklist line for module completion.
pub const REQUIREMENT_ALL_MODULES: &str = "Complete all course modules";

/// Checklist line for quizzes.
pub const REQUIREMENT_ALL_QUIZZES: &str = "Pass all module quizzes";

/// Recompute every derived field of `state`.
pub(crate) fn recompute(
    mut state: CourseState,
    config: &ProgressionConfig,
    today: NaiveDate,
) -> CourseState {
    state.total_modules = state.modules.len();
    state.completed_modules = state
        .modules
        .iter()
        .filter(|m| m.status == ModuleStatus::Completed)
        .count();
    state.overall_progress = mean_percent(state.modules.iter().map(|m| m.progress));

    state.quiz_results = derive_quiz_results(&state, config);
    state.certificate_requirements = derive_requirements(&state);

    sync_course_certificate(&mut state, config, today);
    state
}

/// One row per module with a gradable lesson, carrying attempt counts over
/// from the previous rows.
fn derive_quiz_results(state: &CourseState, config: &ProgressionConfig) -> Vec<QuizResult> {
    state
        .modules
        .iter()
        .filter_map(|module| {
            let quiz = module.quiz_lesson()?;
            let previous = state.quiz_result(&module.id);
            let attempts = previous.map(|q| q.attempts).unwrap_or(0);
            let previous_score = previous.and_then(|q| q.score);

            let (status, score) = match module.status {
                ModuleStatus::Completed => (
                    QuizStatus::Passed,
                    Some(
                        module
                            .quiz_score
                            .or(previous_score)
                            .unwrap_or(config.default_quiz_score),
                    ),
                ),
                // Only a completed module counts its quiz as passed
                ModuleStatus::InProgress => (QuizStatus::Pending, previous_score),
                ModuleStatus::Locked => (QuizStatus::Locked, previous_score),
            };

            Some(QuizResult {
                module_id: module.id.clone(),
                lesson_id: quiz.id.clone(),
                score,
                attempts,
                status,
            })
        })
        .collect()
}

fn derive_requirements(state: &CourseState) -> Vec<CertificateRequirement> {
    let quizzes_passed = state
        .quiz_results
        .iter()
        .filter(|q| q.status == QuizStatus::Passed)
        .count();
    let quizzes_total = state.quiz_results.len();

    vec![
        CertificateRequirement::new(
            REQUIREMENT_ALL_MODULES,
            state.total_modules > 0 && state.completed_modules == state.total_modules,
            Some(format!("{}/{}", state.completed_modules, state.total_modules)),
        ),
        CertificateRequirement::new(
            REQUIREMENT_ALL_QUIZZES,
            quizzes_passed == quizzes_total,
            Some(format!("{}/{}", quizzes_passed, quizzes_total)),
        ),
    ]
}
