//! Panelist - interview evaluation board CLI
//!
//! The `panelist` command scores candidates against a rubric and keeps a
//! live, multi-evaluator leaderboard.
//!
//! ## Commands
//!
//! - `login` / `logout` / `whoami`: gate access to the board
//! - `rubric`: show, replace or reset the scoring rubric
//! - `candidate`: add, import, list, show, update or delete candidates
//! - `evaluate`: score a candidate as this evaluator
//! - `leaderboard`: ranked candidates
//! - `timer`: interview countdown

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use panelist_core::metrics::METRICS;
use panelist_core::obs::SessionSpan;
use panelist_core::{
    login, logout, parse_tag, require_session, Board, CandidateId, CandidateInfo, CandidatePatch,
    EvaluationId, EvaluationSession, EvaluatorIdentity, InterviewTimer, PanelConfig, Polarity,
    Rubric, TimerPhase, ValidationError,
};
use panelist_state::SurrealHandle;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "panelist")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interview evaluation board with rubric scoring and live ranking", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Data directory for the device token, session flag and local database
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Evaluator display name (overrides the device token)
    #[arg(long, global = true)]
    evaluator: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the board
    Login {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        password: String,
    },

    /// Log out
    Logout,

    /// Show the logged-in user and evaluator identity
    Whoami,

    /// Manage the scoring rubric
    Rubric {
        #[command(subcommand)]
        action: RubricAction,
    },

    /// Manage candidates
    Candidate {
        #[command(subcommand)]
        action: CandidateAction,
    },

    /// Score a candidate as this evaluator
    Evaluate {
        /// Candidate id, or `new` to create one on save
        candidate: String,

        /// Candidate name (required for `new`)
        #[arg(long)]
        name: Option<String>,

        /// Candidate info field as key=value
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,

        /// Rubric score as key=value; values are clamped to the item range
        #[arg(short, long = "score", value_parser = parse_score)]
        scores: Vec<(String, i64)>,

        /// Tag as +text (positive) or -text (negative); repeat to toggle off
        #[arg(short, long = "tag", allow_hyphen_values = true)]
        tags: Vec<String>,

        /// Free-text note
        #[arg(short, long)]
        note: Option<String>,

        /// Mark a rubric category as reviewed
        #[arg(long)]
        reviewed: Vec<String>,
    },

    /// Manage individual evaluations
    Evaluation {
        #[command(subcommand)]
        action: EvaluationAction,
    },

    /// Show the ranked leaderboard
    Leaderboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run an interview countdown
    Timer {
        #[arg(short, long, default_value = "10")]
        minutes: u64,

        #[arg(short, long, default_value = "0")]
        seconds: u64,
    },
}

#[derive(Subcommand)]
enum RubricAction {
    /// Show the active rubric
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace the rubric from a JSON file
    Set { file: PathBuf },

    /// Restore the default rubric
    Reset,
}

#[derive(Subcommand)]
enum CandidateAction {
    /// Add a candidate
    Add {
        name: String,

        /// Info field as key=value
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },

    /// Create a candidate from a PDF document
    Import { file: String },

    /// List candidates, newest first
    List,

    /// Show a candidate with all evaluations
    Show {
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update a candidate's name or info fields
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        /// Info field as key=value
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },

    /// Delete a candidate and all of its evaluations
    Delete { id: String },
}

#[derive(Subcommand)]
enum EvaluationAction {
    /// Delete an evaluation
    Delete { id: String },

    /// Move an evaluation to another evaluator
    Reassign { id: String, evaluator: String },
}

/// Options for `evaluate`, gathered from the command line.
struct EvaluateArgs {
    candidate: String,
    name: Option<String>,
    fields: Vec<(String, String)>,
    scores: Vec<(String, i64)>,
    tags: Vec<String>,
    note: Option<String>,
    reviewed: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    panelist_core::init_tracing(cli.log_json, level);

    let mut config = PanelConfig::from_env();
    if let Some(home) = cli.home {
        config = config.with_home(home);
    }
    if let Some(name) = cli.evaluator {
        config = config.with_evaluator(name);
    }

    let result = run(cli.command, &config).await;
    METRICS.flush();
    result
}

async fn run(command: Commands, config: &PanelConfig) -> Result<()> {
    match command {
        Commands::Login { user, password } => cmd_login(config, &user, &password),
        Commands::Logout => cmd_logout(&config.home),
        Commands::Whoami => cmd_whoami(config),
        Commands::Timer { minutes, seconds } => {
            cmd_timer(Duration::from_secs(minutes * 60 + seconds)).await
        }
        command => {
            let board = open_board(config).await?;
            run_board_command(command, &board, config).await
        }
    }
}

async fn run_board_command(
    command: Commands,
    board: &Board<SurrealHandle>,
    config: &PanelConfig,
) -> Result<()> {
    match command {
        Commands::Rubric { action } => match action {
            RubricAction::Show { json } => cmd_rubric_show(board, json).await,
            RubricAction::Set { file } => cmd_rubric_set(board, &file).await,
            RubricAction::Reset => cmd_rubric_reset(board).await,
        },
        Commands::Candidate { action } => match action {
            CandidateAction::Add { name, fields } => {
                cmd_candidate_add(board, &name, fields).await
            }
            CandidateAction::Import { file } => cmd_candidate_import(board, &file).await,
            CandidateAction::List => cmd_candidate_list(board).await,
            CandidateAction::Show { id, json } => cmd_candidate_show(board, &id, json).await,
            CandidateAction::Update { id, name, fields } => {
                cmd_candidate_update(board, &id, name, fields).await
            }
            CandidateAction::Delete { id } => cmd_candidate_delete(board, &id).await,
        },
        Commands::Evaluate {
            candidate,
            name,
            fields,
            scores,
            tags,
            note,
            reviewed,
        } => {
            let identity = EvaluatorIdentity::load_or_create(&config.home)?
                .with_display_name(config.evaluator_name.as_deref());
            let args = EvaluateArgs {
                candidate,
                name,
                fields,
                scores,
                tags,
                note,
                reviewed,
            };
            cmd_evaluate(board, identity.evaluator_id(), args).await
        }
        Commands::Evaluation { action } => match action {
            EvaluationAction::Delete { id } => cmd_evaluation_delete(board, &id).await,
            EvaluationAction::Reassign { id, evaluator } => {
                cmd_evaluation_reassign(board, &id, &evaluator).await
            }
        },
        Commands::Leaderboard { json } => cmd_leaderboard(board, json).await,
        Commands::Login { .. } | Commands::Logout | Commands::Whoami | Commands::Timer { .. } => {
            unreachable!("handled before the board is opened")
        }
    }
}

/// Check the session flag, connect to the store and load the board.
async fn open_board(config: &PanelConfig) -> Result<Board<SurrealHandle>> {
    require_session(&config.home)?;

    let handle = SurrealHandle::setup_from_env(&config.home)
        .await
        .context("Failed to connect to Panelist database")?;
    Board::open(Arc::new(handle))
        .await
        .context("Failed to load the board")
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

fn parse_score(s: &str) -> std::result::Result<(String, i64), String> {
    let (key, value) = parse_key_value(s)?;
    let value = value
        .parse::<i64>()
        .map_err(|_| format!("score for '{}' must be an integer", key))?;
    Ok((key, value))
}

// ========== Access ==========

fn cmd_login(config: &PanelConfig, user: &str, password: &str) -> Result<()> {
    let session = login(&config.home, &config.credentials, user, password)?;
    println!("Logged in as {}", session.user);
    Ok(())
}

fn cmd_logout(home: &Path) -> Result<()> {
    if logout(home)? {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

fn cmd_whoami(config: &PanelConfig) -> Result<()> {
    let session = require_session(&config.home)?;
    let identity = EvaluatorIdentity::load_or_create(&config.home)?
        .with_display_name(config.evaluator_name.as_deref());

    println!("User:      {}", session.user);
    println!(
        "Since:     {}",
        session.logged_in_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Evaluator: {}", identity.evaluator_id());
    if identity.display_name().is_some() {
        println!("Device:    {}", identity.device_token());
    }
    Ok(())
}

// ========== Rubric ==========

async fn cmd_rubric_show(board: &Board<SurrealHandle>, json: bool) -> Result<()> {
    let rubric = board.rubric().await;
    if json {
        println!("{}", serde_json::to_string_pretty(rubric.as_ref())?);
        return Ok(());
    }

    for category in &rubric.categories {
        println!("{} ({})", category.label, category.maximum());
        for item in &category.items {
            println!("  {:<16} {:<24} max {}", item.key, item.label, item.max);
        }
    }
    println!("Total maximum: {}", rubric.total_maximum());
    Ok(())
}

async fn cmd_rubric_set(board: &Board<SurrealHandle>, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read rubric file {}", file.display()))?;
    let rubric: Rubric = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse rubric file {}", file.display()))?;

    let active = board.replace_rubric(rubric).await?;
    println!(
        "Rubric replaced: {} fields, total maximum {}",
        active.items().count(),
        active.total_maximum()
    );
    Ok(())
}

async fn cmd_rubric_reset(board: &Board<SurrealHandle>) -> Result<()> {
    let active = board.reset_rubric().await?;
    println!("Rubric reset to default (total maximum {})", active.total_maximum());
    Ok(())
}

// ========== Candidates ==========

async fn cmd_candidate_add(
    board: &Board<SurrealHandle>,
    name: &str,
    fields: Vec<(String, String)>,
) -> Result<()> {
    let mut info = panelist_core::blank_info();
    info.extend(fields);
    let candidate = board.create_candidate(name, info).await?;
    println!("Added {} ({})", candidate.name, candidate.candidate_id);
    Ok(())
}

async fn cmd_candidate_import(board: &Board<SurrealHandle>, file: &str) -> Result<()> {
    let candidate = board
        .import_document(file)
        .await
        .with_context(|| format!("Failed to import '{}'", file))?;
    println!("Imported {} ({})", candidate.name, candidate.candidate_id);
    Ok(())
}

async fn cmd_candidate_list(board: &Board<SurrealHandle>) -> Result<()> {
    let snapshot = board.snapshot().await;
    if snapshot.candidates.is_empty() {
        println!("No candidates yet. Add one with 'panelist candidate add'.");
        return Ok(());
    }

    for candidate in &snapshot.candidates {
        let evaluations = snapshot.evaluations_for(&candidate.candidate_id).count();
        println!(
            "{}  {}  {:<20} {} evaluation(s)",
            candidate.candidate_id,
            candidate.created_at.format("%Y-%m-%d %H:%M"),
            candidate.name,
            evaluations
        );
    }
    Ok(())
}

async fn cmd_candidate_show(board: &Board<SurrealHandle>, id: &str, json: bool) -> Result<()> {
    let detail = board.candidate_detail(&CandidateId::from(id)).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    println!("{} ({})", detail.candidate.name, detail.candidate.candidate_id);
    for (key, value) in detail.candidate.info.iter().filter(|(_, v)| !v.is_empty()) {
        println!("  {:<12} {}", key, value);
    }
    println!();
    println!(
        "Score: {:.1} ({:.1}%, {}){}",
        detail.aggregate.display,
        detail.percentage,
        detail.band,
        if detail.aggregate.trimmed {
            ", highest and lowest dropped"
        } else {
            ""
        }
    );
    for category in &detail.breakdown {
        println!(
            "  {:<22} {:>5.1} / {:<3} {:>5.1}%",
            category.label, category.awarded, category.maximum, category.percentage
        );
    }
    println!();
    println!("Evaluations ({}):", detail.evaluations.len());
    for evaluation in &detail.evaluations {
        println!(
            "  {}  {:<40} total {}",
            evaluation.evaluation_id, evaluation.evaluator_id, evaluation.total
        );
        if !evaluation.tags.is_empty() {
            let tags: Vec<String> = evaluation
                .tags
                .iter()
                .map(|t| match t.polarity {
                    Polarity::Positive => format!("+{}", t.text),
                    Polarity::Negative => format!("-{}", t.text),
                })
                .collect();
            println!("      tags: {}", tags.join(", "));
        }
        if let Some(note) = &evaluation.note {
            println!("      note: {}", note);
        }
    }
    Ok(())
}

async fn cmd_candidate_update(
    board: &Board<SurrealHandle>,
    id: &str,
    name: Option<String>,
    fields: Vec<(String, String)>,
) -> Result<()> {
    let id = CandidateId::from(id);
    let info = if fields.is_empty() {
        None
    } else {
        let snapshot = board.snapshot().await;
        let mut info: CandidateInfo = snapshot
            .candidate(&id)
            .map(|c| c.info.clone())
            .with_context(|| format!("Candidate '{}' not found", id))?;
        info.extend(fields);
        Some(info)
    };
    if name.is_none() && info.is_none() {
        bail!("Nothing to update; pass --name or --field");
    }

    let candidate = board
        .update_candidate(&id, CandidatePatch { name, info })
        .await?;
    println!("Updated {} ({})", candidate.name, candidate.candidate_id);
    Ok(())
}

async fn cmd_candidate_delete(board: &Board<SurrealHandle>, id: &str) -> Result<()> {
    board
        .delete_candidate(&CandidateId::from(id))
        .await
        .with_context(|| format!("Failed to delete candidate '{}'", id))?;
    println!("Deleted candidate {}", id);
    Ok(())
}

// ========== Evaluations ==========

async fn cmd_evaluate(
    board: &Board<SurrealHandle>,
    evaluator_id: &str,
    args: EvaluateArgs,
) -> Result<()> {
    let _span = SessionSpan::enter(evaluator_id);
    let mut session = EvaluationSession::new(evaluator_id, board.rubric().await);

    if args.candidate == "new" {
        session.start_new_candidate_draft(board).await;
    } else {
        session
            .select_candidate(board, &CandidateId::from(args.candidate.as_str()))
            .await
            .with_context(|| format!("Failed to load candidate '{}'", args.candidate))?;
    }

    if let Some(name) = &args.name {
        session.set_candidate_name(board, name).await?;
    }
    for (field, value) in &args.fields {
        session.set_candidate_field(board, field, value).await?;
    }
    for (key, value) in &args.scores {
        if !session.set_score(key, *value) {
            return Err(ValidationError::UnknownField { key: key.clone() }.into());
        }
    }
    for raw in &args.tags {
        let tag = parse_tag(raw).with_context(|| format!("Invalid tag '{}'", raw))?;
        session.toggle_tag(&tag.text, tag.polarity)?;
    }
    if let Some(note) = &args.note {
        session.set_note(note)?;
    }
    for label in &args.reviewed {
        session.toggle_checklist(label)?;
    }

    let record = session
        .save(board)
        .await
        .context("Failed to save evaluation")?;
    let (done, total) = session.checklist_progress();

    info!(evaluation_id = %record.evaluation_id, "Evaluation saved");
    println!(
        "Saved evaluation {} for candidate {}",
        record.evaluation_id, record.candidate_id
    );
    println!(
        "Total {} / {} ({:.1}%), {} of {} categories reviewed",
        record.total,
        session.rubric().total_maximum(),
        session.draft_percentage(),
        done,
        total
    );
    Ok(())
}

async fn cmd_evaluation_delete(board: &Board<SurrealHandle>, id: &str) -> Result<()> {
    board
        .delete_evaluation(&EvaluationId::from(id))
        .await
        .with_context(|| format!("Failed to delete evaluation '{}'", id))?;
    println!("Deleted evaluation {}", id);
    Ok(())
}

async fn cmd_evaluation_reassign(
    board: &Board<SurrealHandle>,
    id: &str,
    evaluator: &str,
) -> Result<()> {
    let record = board
        .reassign_evaluator(&EvaluationId::from(id), evaluator)
        .await
        .with_context(|| format!("Failed to reassign evaluation '{}'", id))?;
    println!(
        "Evaluation {} now belongs to {}",
        record.evaluation_id, record.evaluator_id
    );
    Ok(())
}

async fn cmd_leaderboard(board: &Board<SurrealHandle>, json: bool) -> Result<()> {
    let rows = board.leaderboard().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No candidates yet.");
        return Ok(());
    }

    println!("{:>4}  {:>6}  {:>6}  {:>5}  NAME", "RANK", "SCORE", "PCT", "EVALS");
    for row in rows {
        println!(
            "{:>4}  {:>6.1}  {:>5.1}%  {:>5}  {}{}",
            row.rank,
            row.display_score,
            row.percentage,
            row.evaluation_count,
            row.name,
            if row.trimmed { " (trimmed)" } else { "" }
        );
    }
    Ok(())
}

// ========== Timer ==========

async fn cmd_timer(duration: Duration) -> Result<()> {
    let mut timer = InterviewTimer::new(duration);
    let mut phase = timer.start();
    let mut ticks = tokio::time::interval(Duration::from_secs(1));
    ticks.tick().await;

    let mut stdout = std::io::stdout();
    loop {
        print!("\r{}  ", timer.display());
        stdout.flush()?;

        if phase == TimerPhase::Done {
            println!();
            println!("Time is up");
            return Ok(());
        }

        tokio::select! {
            _ = ticks.tick() => {
                let next = timer.tick(Duration::from_secs(1));
                if next == TimerPhase::Warning && phase != TimerPhase::Warning {
                    info!("One minute left");
                }
                phase = next;
            }
            _ = tokio::signal::ctrl_c() => {
                timer.pause();
                println!();
                println!("Paused at {}", timer.display());
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelist_core::Credentials;

    async fn board() -> Board<SurrealHandle> {
        let handle = SurrealHandle::setup_db().await.unwrap();
        Board::open(Arc::new(handle)).await.unwrap()
    }

    fn evaluate_args(candidate: &str) -> EvaluateArgs {
        EvaluateArgs {
            candidate: candidate.to_string(),
            name: None,
            fields: vec![],
            scores: vec![],
            tags: vec![],
            note: None,
            reviewed: vec![],
        }
    }

    #[test]
    fn test_cli_parses_evaluate_with_negative_tag() {
        let cli = Cli::try_parse_from([
            "panelist",
            "evaluate",
            "new",
            "--name",
            "Kim",
            "--score",
            "logic=4",
            "--tag",
            "-nervous",
            "--tag",
            "+well prepared",
        ])
        .unwrap();
        match cli.command {
            Commands::Evaluate { scores, tags, .. } => {
                assert_eq!(scores, vec![("logic".to_string(), 4)]);
                assert_eq!(tags, vec!["-nervous", "+well prepared"]);
            }
            _ => panic!("expected evaluate"),
        }
    }

    #[test]
    fn test_parse_key_value_and_score() {
        assert_eq!(
            parse_key_value("major = Economics").unwrap(),
            ("major".to_string(), "Economics".to_string())
        );
        assert!(parse_key_value("major").is_err());
        assert!(parse_key_value("=x").is_err());
        assert_eq!(parse_score("q1=-3").unwrap(), ("q1".to_string(), -3));
        assert!(parse_score("q1=high").is_err());
    }

    #[tokio::test]
    async fn test_board_commands_require_login() {
        let home = tempfile::tempdir().unwrap();
        let config = PanelConfig::default().with_home(home.path());

        let err = run(Commands::Leaderboard { json: false }, &config)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not logged in"));
    }

    #[tokio::test]
    async fn test_login_logout_round() {
        let home = tempfile::tempdir().unwrap();
        let config = PanelConfig::default().with_home(home.path());
        let demo = Credentials::demo();

        assert!(cmd_login(&config, &demo.user, "wrong").is_err());
        cmd_login(&config, &demo.user, "kah2026").unwrap();
        assert!(require_session(home.path()).is_ok());
        cmd_whoami(&config).unwrap();
        cmd_logout(home.path()).unwrap();
        assert!(require_session(home.path()).is_err());
    }

    #[tokio::test]
    async fn test_evaluate_new_candidate_then_second_evaluator() {
        let board = board().await;

        let mut first = evaluate_args("new");
        first.name = Some("Kim".to_string());
        first.scores = vec![("logic".to_string(), 9), ("q1".to_string(), 3)];
        first.tags = vec!["+logical".to_string()];
        first.reviewed = vec!["Impromptu Questions".to_string()];
        cmd_evaluate(&board, "alice", first).await.unwrap();

        let rows = board.leaderboard().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].display_score, 8.0);

        let mut second = evaluate_args(rows[0].candidate_id.as_str());
        second.scores = vec![("logic".to_string(), 2)];
        cmd_evaluate(&board, "bob", second).await.unwrap();

        let rows = board.leaderboard().await;
        assert_eq!(rows[0].evaluation_count, 2);
        assert_eq!(rows[0].display_score, 5.0);
    }

    #[tokio::test]
    async fn test_evaluate_rejects_unknown_field_without_saving() {
        let board = board().await;
        let mut args = evaluate_args("new");
        args.name = Some("Lee".to_string());
        args.scores = vec![("charisma".to_string(), 3)];

        let err = cmd_evaluate(&board, "alice", args).await.unwrap_err();
        assert!(err.to_string().contains("charisma"));
        assert!(board.leaderboard().await.is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_new_without_name_fails() {
        let board = board().await;
        let err = cmd_evaluate(&board, "alice", evaluate_args("new"))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("candidate name must not be blank"));
        assert!(board.snapshot().await.candidates.is_empty());
    }

    #[tokio::test]
    async fn test_candidate_update_merges_fields() {
        let board = board().await;
        cmd_candidate_add(&board, "Park", vec![("major".to_string(), "Law".to_string())])
            .await
            .unwrap();
        let id = board.snapshot().await.candidates[0].candidate_id.clone();

        cmd_candidate_update(
            &board,
            id.as_str(),
            None,
            vec![("grade".to_string(), "3".to_string())],
        )
        .await
        .unwrap();

        let snapshot = board.snapshot().await;
        let info = &snapshot.candidate(&id).unwrap().info;
        assert_eq!(info["major"], "Law");
        assert_eq!(info["grade"], "3");

        assert!(cmd_candidate_update(&board, id.as_str(), None, vec![])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_rubric_set_from_file_and_reset() {
        let board = board().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rubric.json");
        std::fs::write(
            &path,
            r#"{"categories":[{"label":"Reasoning","items":[{"key":"logic","label":"Logic","max":10}]}]}"#,
        )
        .unwrap();

        cmd_rubric_set(&board, &path).await.unwrap();
        assert_eq!(board.rubric().await.total_maximum(), 10);

        cmd_rubric_reset(&board).await.unwrap();
        assert_eq!(*board.rubric().await, Rubric::default());
    }

    #[tokio::test]
    async fn test_delete_commands_update_leaderboard() {
        let board = board().await;
        let mut args = evaluate_args("new");
        args.name = Some("Choi".to_string());
        args.scores = vec![("q2".to_string(), 4)];
        cmd_evaluate(&board, "alice", args).await.unwrap();

        let snapshot = board.snapshot().await;
        let evaluation_id = snapshot.evaluations[0].evaluation_id.clone();
        let candidate_id = snapshot.candidates[0].candidate_id.clone();

        cmd_evaluation_delete(&board, evaluation_id.as_str())
            .await
            .unwrap();
        assert_eq!(board.leaderboard().await[0].evaluation_count, 0);

        cmd_candidate_delete(&board, candidate_id.as_str())
            .await
            .unwrap();
        assert!(board.leaderboard().await.is_empty());
    }
}
