//! CoursePath CLI - course progression and path certification.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use coursepath_certification::{PathCertificateState, PathCertifier};
use coursepath_core::{
    course_progress_map, CourseId, CourseState, EnrollmentStatus, LessonId, ModuleId, Settings,
    TrackId, UserId,
};
use coursepath_progress::ProgressionEngine;
use coursepath_storage::{JsonStorage, Storage};
use coursepath_track::{build_track_progress_snapshot, SnapshotInput, TrackAnalytics, TrackAnalyticsSnapshot};

#[derive(Parser)]
#[command(name = "coursepath")]
#[command(about = "Course progression and path certification", long_about = None)]
struct Cli {
    /// Seed data directory
    #[arg(long, global = true, default_value = "data")]
    data: PathBuf,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with a learner's course
    Course {
        #[command(subcommand)]
        command: CourseCommand,
    },
    /// Learning track reports
    Track {
        #[command(subcommand)]
        command: TrackCommand,
    },
}

#[derive(Subcommand)]
enum CourseCommand {
    /// Show course progress, starting the course if needed
    Show {
        /// Course ID
        course: String,
        #[arg(long)]
        user: String,
    },
    /// Mark a lesson completed
    Complete {
        course: String,
        module: String,
        lesson: String,
        #[arg(long)]
        user: String,
    },
    /// Submit a quiz attempt
    Quiz {
        course: String,
        module: String,
        lesson: String,
        /// Score (0-100)
        #[arg(long)]
        score: u8,
        /// Pass threshold (0-100)
        #[arg(long, default_value = "80")]
        pass: u8,
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand)]
enum TrackCommand {
    /// Show a learner's progress across enrolled tracks
    Progress {
        #[arg(long)]
        user: String,
        /// Filter by derived status
        #[arg(long)]
        status: Option<String>,
    },
    /// Show a learner's path certificate for a track
    Certificate {
        /// Track ID
        track: String,
        #[arg(long)]
        user: String,
    },
    /// Show enrollment analytics for a track
    Analytics {
        /// Track ID
        track: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Open storage
    let mut storage = JsonStorage::new(&cli.data)
        .await
        .with_context(|| format!("opening seed directory {}", cli.data.display()))?;
    let settings = storage.load_settings().await?;

    match cli.command {
        Commands::Course { command } => run_course(&mut storage, &settings, command).await,
        Commands::Track { command } => run_track(&storage, &settings, command).await,
    }
}

async fn run_course(storage: &mut JsonStorage, settings: &Settings, command: CourseCommand) -> Result<()> {
    let engine = ProgressionEngine::new(settings.progression.clone());

    match command {
        CourseCommand::Show { course, user } => {
            let state = open_course(storage, &engine, &UserId::new(user), &CourseId::new(course)).await?;
            print_course(&state);
        }
        CourseCommand::Complete { course, module, lesson, user } => {
            let state = open_course(storage, &engine, &UserId::new(user), &CourseId::new(course)).await?;
            let next = engine.complete_lesson(&state, &ModuleId::new(module), &LessonId::new(lesson));
            if next == state {
                println!("No change: lesson is not available for completion");
            }
            storage.save_course_state(&next).await?;
            info!(course = %next.course_id, user = %next.user_id, progress = next.overall_progress, "Lesson completed");
            print_course(&next);
        }
        CourseCommand::Quiz { course, module, lesson, score, pass, user } => {
            anyhow::ensure!(score <= 100 && pass <= 100, "score and pass threshold must be 0-100");
            let state = open_course(storage, &engine, &UserId::new(user), &CourseId::new(course)).await?;
            let module_id = ModuleId::new(module);
            let next = engine.submit_quiz_attempt(&state, &module_id, &LessonId::new(lesson), score, pass);
            if next == state {
                println!("No change: quiz is not available");
            } else if let Some(result) = next.quiz_result(&module_id) {
                println!("Quiz {}: score {} after {} attempt(s), {}",
                    result.lesson_id,
                    score,
                    result.attempts,
                    result.status,
                );
            }
            storage.save_course_state(&next).await?;
            info!(course = %next.course_id, user = %next.user_id, score, "Quiz attempt recorded");
            print_course(&next);
        }
    }

    Ok(())
}

async fn run_track(storage: &JsonStorage, settings: &Settings, command: TrackCommand) -> Result<()> {
    match command {
        TrackCommand::Progress { user, status } => {
            let status: Option<EnrollmentStatus> = status.map(|s| s.parse()).transpose()?;
            let user_id = UserId::new(user);
            let tracks = storage.list_tracks().await?;
            let enrollments = storage.list_user_enrollments(&user_id).await?;
            let states = storage.list_course_states(&user_id).await?;
            let course_progress = course_progress_map(&states);
            let course_map = storage.load_course_map().await?;

            let snapshot = build_track_progress_snapshot(SnapshotInput {
                user_id: &user_id,
                tracks: &tracks,
                enrollments: &enrollments,
                course_progress: &course_progress,
                course_map: &course_map,
            });

            println!("Tracks for {} ({} completed)", snapshot.user_id, snapshot.completed_tracks());
            for track in snapshot.tracks.iter().filter(|t| status.map_or(true, |s| t.status == s)) {
                println!("  {} | {} | {}% ({}/{} required) - {}",
                    track.track_id,
                    format_enrollment(track.status),
                    track.progress_percent,
                    track.completed_required,
                    track.total_required,
                    track.title,
                );
                if let Some(next) = &track.next_required_course {
                    println!("      next: {}", next);
                }
            }
        }
        TrackCommand::Certificate { track, user } => {
            let track_id = TrackId::new(track);
            let user_id = UserId::new(user);
            let track = storage
                .load_track(&track_id)
                .await?
                .with_context(|| format!("track {} not found", track_id))?;
            let enrollment = storage
                .list_user_enrollments(&user_id)
                .await?
                .into_iter()
                .find(|e| e.track_id == track_id)
                .with_context(|| format!("{} is not enrolled in {}", user_id, track_id))?;
            let states = storage.list_course_states(&user_id).await?;

            let certifier = PathCertifier::new(
                settings.path_certificate.clone(),
                storage.load_policies().await?,
                storage.load_course_map().await?,
            );
            let certificate = certifier.build(&track, &enrollment, &course_progress_map(&states));
            print_path_certificate(&track.title, &certificate);
        }
        TrackCommand::Analytics { track } => {
            let track_id = TrackId::new(track);
            let track = storage
                .load_track(&track_id)
                .await?
                .with_context(|| format!("track {} not found", track_id))?;
            let enrollments = storage.list_track_enrollments(&track_id).await?;

            let snapshot = TrackAnalytics::new(settings.analytics.clone()).build(&track, &enrollments);
            print_analytics(&track.title, &snapshot);
        }
    }

    Ok(())
}

/// Load the learner's saved state, or start the course from its template.
async fn open_course(
    storage: &mut JsonStorage,
    engine: &ProgressionEngine,
    user_id: &UserId,
    course_id: &CourseId,
) -> Result<CourseState> {
    if let Some(state) = storage.load_course_state(user_id, course_id).await? {
        return Ok(state);
    }

    let template = storage
        .load_template(course_id)
        .await?
        .with_context(|| format!("no template for course {}", course_id))?;
    let state = engine.start_course(&template, user_id.clone());
    storage.save_course_state(&state).await?;
    info!(course = %course_id, user = %user_id, "Course started");
    Ok(state)
}

fn print_course(state: &CourseState) {
    println!("Course: {} - {}", state.course_id, state.title);
    println!("  Learner: {}", state.user_id);
    println!("  Progress: {}% ({}/{} modules)",
        state.overall_progress,
        state.completed_modules,
        state.total_modules,
    );
    for module in &state.modules {
        println!("  [{}] {} | {} | {}%", module.sequence, module.id, module.status, module.progress);
        for lesson in &module.lessons {
            println!("      {} | {}", lesson.id, lesson.status);
        }
    }
    if let Some((module, lesson)) = state.next_lesson() {
        println!("  Continue: {} / {} - {}", module.id, lesson.id, lesson.title);
    }
    for requirement in &state.certificate_requirements {
        println!("  {} {}{}",
            if requirement.met { "[x]" } else { "[ ]" },
            requirement.description,
            requirement.detail.as_deref().map(|d| format!(" ({})", d)).unwrap_or_default(),
        );
    }
    if let Some(cert) = state.course_certificate() {
        match (cert.is_earned(), cert.issued_on, cert.valid_until) {
            (true, Some(issued), Some(until)) => {
                println!("  Certificate: {} issued {} valid until {}", cert.id, issued, until)
            }
            _ => println!("  Certificate: in progress"),
        }
    }
}

fn print_path_certificate(title: &str, cert: &PathCertificateState) {
    println!("Path certificate: {} ({})", title, cert.track_id);
    println!("  Learner: {}", cert.user_id);
    for requirement in &cert.requirements {
        println!("  {} {}{}",
            if requirement.met { "[x]" } else { "[ ]" },
            requirement.description,
            requirement.detail.as_deref().map(|d| format!(" ({})", d)).unwrap_or_default(),
        );
    }
    match (&cert.certificate_id, cert.issued_on, cert.valid_until) {
        (Some(id), Some(issued), Some(until)) => {
            println!("  Earned: {} issued {} valid until {}", id, issued, until);
        }
        _ => println!("  Status: in progress"),
    }
    println!("  Path version: {}", cert.path_version);
    println!("  Validity: {} months{}",
        cert.validity_months,
        if cert.recertification_required { ", recertification required" } else { "" },
    );
    println!("  Renewal: {}", cert.renewal_policy);
}

fn print_analytics(title: &str, snapshot: &TrackAnalyticsSnapshot) {
    println!("Analytics: {} ({})", title, snapshot.track_id);
    println!("  Enrollments: {} ({} completed, {}%)",
        snapshot.total_enrollments,
        snapshot.completed_enrollments,
        snapshot.completion_rate,
    );
    match snapshot.avg_completion_time_days {
        Some(days) => println!("  Avg completion: {} days", days),
        None => println!("  Avg completion: n/a"),
    }
    println!("  At risk: {}", snapshot.at_risk_learners);
    for step in &snapshot.dropoff {
        println!("  #{} {} | reached {} | completed {} ({}%) | drop-off {}%",
            step.position + 1,
            step.course_id,
            step.reached_count,
            step.completed_count,
            step.completion_rate,
            step.dropoff_rate,
        );
    }
    if let Some(b) = &snapshot.bottleneck {
        println!("  Bottleneck: {} - {} ({}%)", b.course_id, b.title, b.completion_rate);
    }
}

fn format_enrollment(status: EnrollmentStatus) -> &'static str {
    match status {
        EnrollmentStatus::NotStarted => "NOT STARTED",
        EnrollmentStatus::InProgress => "IN PROGRESS",
        EnrollmentStatus::Completed => "COMPLETED",
    }
}
