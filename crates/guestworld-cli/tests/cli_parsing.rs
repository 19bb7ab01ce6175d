use clap::Parser;
use guestworld_cli::cli_args::{Cli, IntentArg};
use guestworld_core::Intent;

// Integration tests for argument parsing and slot plumbing. The answer
// texts themselves are covered by the core crate's tests.

#[test]
fn defaults_to_the_today_intent() {
    let cli = Cli::try_parse_from(["guestworld-cli"]).expect("parse");
    assert_eq!(cli.intent, IntentArg::Today);
    assert_eq!(cli.intent.to_intent(), Intent::Today);
    let slots = cli.to_slots();
    assert!(slots.world.is_none());
    assert!(slots.date.is_none());
}

#[test]
fn when_world_takes_a_world_slot() {
    let cli = Cli::try_parse_from([
        "guestworld-cli",
        "--intent",
        "when-world",
        "--world",
        "Yorkshire",
    ])
    .expect("parse");
    assert_eq!(cli.intent.to_intent(), Intent::WhenWorld);
    assert_eq!(cli.to_slots().world.as_deref(), Some("Yorkshire"));
}

#[test]
fn challenge_slots_pass_through_verbatim() {
    let cli = Cli::try_parse_from([
        "guestworld-cli",
        "--intent",
        "weekly-challenge",
        "--challenge-type",
        "climb of the week",
        "--challenge-detail",
        "XP",
        "--timeframe",
        "next week",
    ])
    .expect("parse");
    let slots = cli.to_slots();
    assert_eq!(slots.challenge_type.as_deref(), Some("climb of the week"));
    assert_eq!(slots.challenge_detail.as_deref(), Some("XP"));
    assert_eq!(slots.challenge_timeframe.as_deref(), Some("next week"));
}

#[test]
fn reference_time_accepts_both_iso_precisions() {
    let cli = Cli::try_parse_from(["guestworld-cli", "--at", "2026-08-12T09:00:00"])
        .expect("parse");
    let at = cli.reference_time().expect("parse time").expect("present");
    assert_eq!(at.to_string(), "2026-08-12 09:00:00");

    let cli = Cli::try_parse_from(["guestworld-cli", "--at", "2026-08-12T09:00"]).expect("parse");
    assert!(cli.reference_time().expect("parse time").is_some());

    let cli = Cli::try_parse_from(["guestworld-cli", "--at", "noonish"]).expect("parse");
    assert!(cli.reference_time().is_err());
}

#[test]
fn unknown_intent_is_a_parse_error() {
    assert!(Cli::try_parse_from(["guestworld-cli", "--intent", "forecast"]).is_err());
}
