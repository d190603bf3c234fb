//! `borgctl backup`: create an archive, then apply the retention policy.
//!
//! # Pipeline stages (in order)
//!
//! | # | Stage   | Skipped by                    | Exit on failure |
//! |---|---------|-------------------------------|-----------------|
//! | 1 | Create  |                               | 3               |
//! | 2 | Prune   | `--no-prune`                  | 5               |
//! | 3 | Compact | `--no-prune`, `compact=false` | 5               |
//!
//! The repository lock is held across all three stages.  Each stage runs
//! behind a spinner; raw borg output is captured and replayed only when the
//! stage fails.  A failed stage aborts the pipeline after printing the
//! summary.
//!
//! `borg create` exiting with status 1 means "completed with warnings"
//! (e.g. a file changed while being read).  That is reported and treated as
//! success.

use anyhow::anyhow;
use chrono::Local;
use tracing::{info, warn};

use super::Session;
use crate::{
    error::{Error, Stage},
    runner::{build_compact, build_create, build_prune},
    ui::{StageOutcome, print_summary},
};

/// Borg's "finished with warnings" exit status.
const BORG_WARNING: i32 = 1;

// ─── Entry point ──────────────────────────────────────────────────────────────

pub fn run(session: &Session<'_>, no_prune: bool) -> Result<(), Error> {
    let profile = session.profile;
    let cfg = &profile.config;

    if cfg.backup.sources.is_empty() {
        return Err(anyhow!(
            "[backup].sources is empty in profile '{}'; nothing to back up",
            profile.name
        )
        .into());
    }
    let prune = !no_prune;
    if prune && !cfg.retention.keeps_anything() {
        return Err(anyhow!(
            "[retention] keeps nothing in profile '{}'; set a keep count or use --no-prune",
            profile.name
        )
        .into());
    }

    let _lock = session.lock()?;

    let archive = profile.archive_name(Local::now().naive_local());
    info!(%archive, repository = %profile.repository, "creating archive");

    println!();
    let mut outcomes: Vec<StageOutcome> = Vec::new();

    // 1. Create
    let create = tolerate_warning(session.captured(Stage::Create, &build_create(profile, &archive)));
    step(session, Stage::Create, create, &mut outcomes)?;

    // 2 & 3. Prune + Compact
    if prune {
        let outcome = session.captured(Stage::Prune, &build_prune(profile));
        step(session, Stage::Prune, outcome, &mut outcomes)?;

        if cfg.retention.compact {
            let outcome = session.captured(Stage::Compact, &build_compact(profile));
            step(session, Stage::Compact, outcome, &mut outcomes)?;
        }
    }

    if !session.dry_run() {
        print_summary("Backup", &outcomes);
    }
    Ok(())
}

/// Print `outcome`, record it, and abort the pipeline if it failed.
fn step(
    session: &Session<'_>,
    stage: Stage,
    outcome: StageOutcome,
    outcomes: &mut Vec<StageOutcome>,
) -> Result<(), Error> {
    // A tolerated create warning was already printed by `tolerate_warning`.
    let warned = stage == Stage::Create && outcome.code == Some(BORG_WARNING);
    if !session.dry_run() && !warned {
        outcome.print();
    }
    let failed = outcome.failed();
    let reason = outcome.reason();
    outcomes.push(outcome);
    if failed {
        print_summary("Backup", outcomes);
        return Err(Error::stage(stage, reason));
    }
    Ok(())
}

/// Downgrade borg's warning status to a success, printing the warning.
fn tolerate_warning(outcome: StageOutcome) -> StageOutcome {
    if outcome.code != Some(BORG_WARNING) {
        return outcome;
    }
    warn!(stage = %outcome.label, "borg finished with warnings");
    outcome.print_warning();
    StageOutcome {
        success: true,
        error: None,
        ..outcome
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
