//! HireVox terminal front-end.
//!
//! Drives the whole interview flow: parse a resume into a candidate profile,
//! run the realtime voice session against the live interviewer, then grade
//! the committed turns into a final report.

use hirevox_core::{api_key_from_env, FinalReport, GeminiClient, Turn};
use hirevox_voice::{InterviewSession, SessionConfig, SessionEvent, SessionHandle, VoiceState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const REPORT_FILE: &str = "interview_report.json";

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[hirevox] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let resume_path = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("Usage: hirevox-cli <resume.txt>");
            std::process::exit(2);
        }
    };

    let api_key = match api_key_from_env() {
        Some(key) => key,
        None => {
            eprintln!("Error: GEMINI_API_KEY is not set (API_KEY also accepted)");
            std::process::exit(1);
        }
    };

    let resume_text = match std::fs::read_to_string(&resume_path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", resume_path, e);
            std::process::exit(1);
        }
    };

    let client = GeminiClient::new(api_key.clone());

    println!("Parsing resume...");
    let profile = match client.parse_resume(&resume_text).await {
        Ok(profile) => profile,
        Err(e) => {
            eprintln!("Error: resume parsing failed: {}", e);
            std::process::exit(1);
        }
    };
    println!(
        "Candidate: {} ({} {}, {:.1} years)",
        profile.name, profile.seniority, profile.domain, profile.experience_years
    );

    let (session, handle) = InterviewSession::new(SessionConfig::new(api_key, profile.clone()));
    print_controls();
    spawn_console(handle);

    // The session future owns the audio devices and is not Send; it is
    // awaited here on the main task rather than spawned.
    let turns = match session.run().await {
        Ok(turns) => turns,
        Err(e) => {
            eprintln!("Error: session failed to start: {}", e);
            std::process::exit(1);
        }
    };

    if turns.is_empty() {
        println!("No completed turns; skipping the report.");
        return;
    }

    println!("\nGenerating report over {} turn(s)...", turns.len());
    match client.generate_report(&profile, &turns).await {
        Ok(report) => render_report(&report, &turns),
        Err(e) => eprintln!("Error: report generation failed: {}", e),
    }
}

fn print_controls() {
    println!();
    println!("Interview live. Controls:");
    println!("  m <enter>  toggle microphone mute");
    println!("  q <enter>  end the interview");
    println!();
}

/// Console loop: mute/end commands in, state and error events out.
fn spawn_console(mut handle: SessionHandle) {
    let events = handle.take_events();

    if let Some(mut events) = events {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    SessionEvent::StateChanged(state) => {
                        let label = match state {
                            VoiceState::Inactive => "session ended",
                            VoiceState::Thinking => "connecting...",
                            VoiceState::Listening => "listening (your turn)",
                            VoiceState::Speaking => "interviewer speaking",
                        };
                        println!("[{}] {}", state, label);
                    }
                    SessionEvent::Error { message } => {
                        eprintln!("[error] {}", message);
                    }
                }
            }
        });
    }

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match line.trim() {
                "m" => {
                    let muted = handle.toggle_muted();
                    println!("[mic] {}", if muted { "muted" } else { "live" });
                }
                "q" => {
                    handle.end();
                    break;
                }
                "" => {}
                other => println!("[?] unknown command: {}", other),
            }
        }
    });
}

fn render_report(report: &FinalReport, turns: &[Turn]) {
    println!();
    println!("=== Interview Report ===");
    println!("Generated: {}", chrono::Local::now().format("%Y-%m-%d %H:%M"));
    println!("Recommendation: {}", report.hiring_recommendation);
    println!("Industry readiness: {}", report.industry_readiness);
    println!();
    println!("Scores");
    println!("  technical knowledge: {:>5.1}", report.overall_scores.technical_knowledge);
    println!("  problem solving:     {:>5.1}", report.overall_scores.problem_solving);
    println!("  communication:       {:>5.1}", report.overall_scores.communication);
    println!("  confidence:          {:>5.1}", report.overall_scores.confidence);
    println!();
    println!(
        "Resume score: {:.1} (ATS compatibility: {})",
        report.resume_score, report.ats_compatibility
    );

    print_list("Strengths", "+", &report.strengths);
    print_list("Areas to improve", "-", &report.areas_to_improve);
    print_list("Skill gaps", "*", &report.skill_gaps);
    print_list("3-month plan", ">", &report.three_month_plan);
    print_list("Recommended certifications", "*", &report.recommended_certifications);
    print_list("Suitable roles", "*", &report.suitable_job_roles);

    println!("\nTranscript: {} committed turn(s)", turns.len());

    match serde_json::to_string_pretty(report) {
        Ok(json) => {
            if let Err(e) = std::fs::write(REPORT_FILE, json) {
                eprintln!("[warn] could not write {}: {}", REPORT_FILE, e);
            } else {
                println!("Report saved to {}", REPORT_FILE);
            }
        }
        Err(e) => eprintln!("[warn] could not serialize report: {}", e),
    }
}

fn print_list(title: &str, bullet: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("\n{}:", title);
    for item in items {
        println!("  {} {}", bullet, item);
    }
}
