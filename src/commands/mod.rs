//! Subcommand handlers.
//!
//! Each file in this module corresponds to one or two user-facing commands:
//!
//! | File             | Invocation                    | Locked | Exit on failure |
//! |------------------|-------------------------------|--------|-----------------|
//! | `init.rs`        | `borgctl init`                | yes    | 1               |
//! | `backup.rs`      | `borgctl backup`              | yes    | 3 / 5           |
//! | `list.rs`        | `borgctl list`, `info`        | no     | 4               |
//! | `delete.rs`      | `borgctl delete`              | yes    | 4               |
//! | `restore.rs`     | `borgctl restore`             | no     | 4               |
//! | `verify.rs`      | `borgctl verify`              | no     | 6               |
//! | `mount.rs`       | `borgctl mount`, `umount`     | no     | 7               |
//! | `repair.rs`      | `borgctl repair`              | yes    | 5               |
//! | `new_profile.rs` | `borgctl new-profile`         | no     | 2               |
//!
//! Handlers share a [`Session`], which owns the `--dry-run` switch, the lock
//! and the `latest` archive lookup so no handler has to special-case them.

pub mod backup;
pub mod delete;
pub mod init;
pub mod list;
pub mod mount;
pub mod new_profile;
pub mod repair;
pub mod restore;
pub mod verify;

use tracing::debug;

use crate::{
    cli::{Cli, Subcommand},
    error::{Error, Stage},
    lock::RepoLock,
    profile::Profile,
    runner::{Invocation, build_latest_lookup},
    ui::{StageOutcome, print_dry_run, run_attached, run_stage, skipped_stage},
};

/// Archive alias resolved to the newest archive of the profile.
pub const LATEST: &str = "latest";

/// Everything a handler needs: parsed flags plus the resolved profile.
pub struct Session<'a> {
    pub cli: &'a Cli,
    pub profile: &'a Profile,
}

impl<'a> Session<'a> {
    pub const fn new(cli: &'a Cli, profile: &'a Profile) -> Self {
        Self { cli, profile }
    }

    pub const fn dry_run(&self) -> bool {
        self.cli.dry_run
    }

    /// Take the repository lock, or nothing under `--dry-run`.
    pub fn lock(&self) -> Result<Option<RepoLock>, Error> {
        if self.dry_run() {
            return Ok(None);
        }
        RepoLock::acquire(&self.profile.config.lock.dir, &self.profile.repository).map(Some)
    }

    /// Run `inv` behind a spinner (or print it under `--dry-run`).
    pub fn captured(&self, stage: Stage, inv: &Invocation) -> StageOutcome {
        if self.dry_run() {
            print_dry_run(inv);
            return skipped_stage(stage.label());
        }
        run_stage(stage.label(), inv)
    }

    /// Run `inv` on the terminal (or print it under `--dry-run`).
    pub fn attached(&self, stage: Stage, inv: &Invocation) -> StageOutcome {
        if self.dry_run() {
            print_dry_run(inv);
            return skipped_stage(stage.label());
        }
        run_attached(stage.label(), inv)
    }

    /// Run a single captured stage and print its result line.
    pub fn run_captured(&self, stage: Stage, inv: &Invocation) -> Result<(), Error> {
        let outcome = self.captured(stage, inv);
        if !self.dry_run() {
            outcome.print();
        }
        check(stage, &outcome)
    }

    /// Run a single attached stage; only failures get a result line.
    pub fn run_attached(&self, stage: Stage, inv: &Invocation) -> Result<(), Error> {
        let outcome = self.attached(stage, inv);
        if outcome.failed() {
            outcome.print();
        }
        check(stage, &outcome)
    }

    /// Turn `latest` into the newest archive matching the profile prefix.
    ///
    /// Other names pass through untouched, as does `latest` under
    /// `--dry-run` (after printing the lookup that would run).
    pub fn resolve_archive(&self, stage: Stage, archive: &str) -> Result<String, Error> {
        if archive != LATEST {
            return Ok(archive.to_string());
        }

        let lookup = build_latest_lookup(self.profile);
        if self.dry_run() {
            print_dry_run(&lookup);
            return Ok(archive.to_string());
        }

        let outcome = run_stage("Find latest archive", &lookup);
        if outcome.failed() {
            outcome.print();
            return Err(Error::stage(stage, outcome.reason()));
        }

        let name = last_archive(&outcome.stdout).ok_or_else(|| {
            Error::stage(
                stage,
                format!("no archives matching {}", self.profile.archive_glob()),
            )
        })?;
        debug!(archive = %name, "resolved latest archive");
        Ok(name)
    }
}

/// Map a finished outcome onto the stage's error.
fn check(stage: Stage, outcome: &StageOutcome) -> Result<(), Error> {
    if outcome.failed() {
        Err(Error::stage(stage, outcome.reason()))
    } else {
        Ok(())
    }
}

/// Last non-empty line of `borg list --short` output.
fn last_archive(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .map(str::to_string)
}

/// Route a parsed subcommand to its handler.
///
/// `new-profile` never reaches here: it runs before any profile is loaded.
pub fn dispatch(session: &Session<'_>, command: &Subcommand) -> Result<(), Error> {
    match command {
        Subcommand::Init => init::run(session),
        Subcommand::Backup { no_prune } => backup::run(session, *no_prune),
        Subcommand::List { archive } => list::run_list(session, archive.as_deref()),
        Subcommand::Info { archive } => list::run_info(session, archive.as_deref()),
        Subcommand::Delete { archive } => delete::run(session, archive),
        Subcommand::Restore {
            archive,
            target,
            paths,
        } => restore::run(session, archive, target, paths),
        Subcommand::Verify { verify_data } => verify::run(session, *verify_data),
        Subcommand::Mount {
            mountpoint,
            archive,
        } => mount::run_mount(session, mountpoint, archive.as_deref()),
        Subcommand::Umount { mountpoint } => mount::run_umount(session, mountpoint),
        Subcommand::Repair => repair::run(session),
        Subcommand::NewProfile { force } => {
            new_profile::run(&session.cli.config_dir, &session.profile.name, *force)
        },
    }
}

// ─── Test helpers ─────────────────────────────────────────────────────────────
