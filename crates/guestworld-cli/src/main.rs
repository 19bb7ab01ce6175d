use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use guestworld_cli::cli_args::Cli;
use guestworld_core::{
    LoggingDestination, Query, QueryClock, SCHEDULE_TZ, ScheduleStore, SessionContext,
    handle_query, init_logging, load_config,
};

const WORLD_ARTIFACT: &str = "GuestWorlds.csv";
const CHALLENGE_ARTIFACT: &str = "WeeklyChallenges.json";

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if let Err(err) = init_logging(LoggingDestination::FileAndStderr) {
        eprintln!("Warning: logging unavailable: {err}");
    }

    let load = load_config();
    for warning in &load.warnings {
        eprintln!("Warning: {warning}");
    }

    let world_path = resolve_artifact_path(
        cli.worlds_csv.as_deref(),
        load.config.artifacts.world_csv.as_deref(),
        WORLD_ARTIFACT,
    );
    let challenge_path = resolve_artifact_path(
        cli.challenges_json.as_deref(),
        load.config.artifacts.challenge_json.as_deref(),
        CHALLENGE_ARTIFACT,
    );

    // A missing or unreadable artifact degrades to the unavailable apology
    // rather than failing the invocation.
    let world_csv = fs::read_to_string(&world_path).ok();
    let challenge_json = fs::read_to_string(&challenge_path).ok();
    let store = ScheduleStore::load(world_csv.as_deref(), challenge_json.as_deref());

    let clock = match cli.reference_time()? {
        Some(at) => QueryClock::new(at),
        None => QueryClock::now_in(SCHEDULE_TZ),
    };

    let session = load_session(cli.session_file.as_deref())?;
    let locale = cli
        .locale
        .clone()
        .unwrap_or_else(|| load.config.speech.default_locale.clone());

    let answer = handle_query(&store, &clock, Query {
        intent: cli.intent.to_intent(),
        slots: cli.to_slots(),
        locale,
        session,
    });

    println!("{}", answer.text);
    if let Some(reprompt) = &answer.reprompt {
        eprintln!("(reprompt: {reprompt})");
    }

    if let Some(path) = cli.session_file.as_deref() {
        save_session(path, &answer.session)?;
    }
    Ok(())
}

fn resolve_artifact_path(flag: Option<&str>, configured: Option<&Path>, default: &str) -> PathBuf {
    if let Some(path) = flag {
        return PathBuf::from(path);
    }
    if let Some(path) = configured {
        return path.to_path_buf();
    }
    PathBuf::from(default)
}

fn load_session(path: Option<&str>) -> Result<SessionContext, String> {
    let Some(path) = path else {
        return Ok(SessionContext::default());
    };
    if !Path::new(path).exists() {
        return Ok(SessionContext::default());
    }
    let raw = fs::read_to_string(path).map_err(|err| format!("Failed to read {path}: {err}"))?;
    serde_json::from_str(&raw).map_err(|err| format!("Failed to parse {path}: {err}"))
}

fn save_session(path: &str, session: &SessionContext) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(session)
        .map_err(|err| format!("Failed to serialize session: {err}"))?;
    fs::write(path, raw).map_err(|err| format!("Failed to write {path}: {err}"))
}
