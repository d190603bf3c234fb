//! borg invocation construction.
//!
//! This module is responsible for *building* the commands that will be run.
//! It deliberately does **not** execute anything; process execution lives
//! in [`crate::ui`] so that the spinner can own the terminal while commands
//! run.  Every builder here is pure and unit-testable without `borg`.
//!
//! Secrets travel through the environment (`BORG_PASSPHRASE`), never argv,
//! and are redacted by the [`fmt::Display`] impl used for `--dry-run` and
//! logging.

use std::{fmt, path::PathBuf};

use crate::profile::Profile;

/// Environment variables whose values must never be printed.
const SECRET_VARS: &[&str] = &["BORG_PASSPHRASE", "BORG_PASSCOMMAND"];

// ─── Invocation ───────────────────────────────────────────────────────────────

/// One external command: argv, extra environment, optional working dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub argv: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    fn arg(&mut self, a: impl Into<String>) -> &mut Self {
        self.argv.push(a.into());
        self
    }

    fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dir) = &self.cwd {
            write!(f, "(cd {} && ", quote(&dir.display().to_string()))?;
        }
        for (key, value) in &self.env {
            if SECRET_VARS.contains(&key.as_str()) {
                write!(f, "{key}=*** ")?;
            } else {
                write!(f, "{key}={} ", quote(value))?;
            }
        }
        let argv: Vec<String> = self.argv.iter().map(|a| quote(a)).collect();
        f.write_str(&argv.join(" "))?;
        if self.cwd.is_some() {
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Single-quote `arg` for a POSIX shell when it contains anything unusual.
fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

// ─── borg base command ────────────────────────────────────────────────────────

/// Builds the part shared by every borg call:
///
/// ```text
/// [BORG_PASSPHRASE=…] [BORG_RSH=…]  borg <subcommand> [--remote-path R]
/// ```
///
/// Callers append flags and the repository location.
pub fn borg(profile: &Profile, subcommand: &str) -> Invocation {
    let repo = &profile.config.repo;
    let mut env = Vec::new();
    if !repo.passphrase.is_empty() {
        env.push(("BORG_PASSPHRASE".into(), repo.passphrase.expose().to_string()));
    }
    if !repo.passcommand.is_empty() {
        env.push(("BORG_PASSCOMMAND".into(), repo.passcommand.clone()));
    }
    if !repo.rsh.is_empty() {
        env.push(("BORG_RSH".into(), repo.rsh.clone()));
    }

    let mut inv = Invocation {
        argv: vec![profile.config.borg.binary.clone(), subcommand.into()],
        env,
        cwd: None,
    };
    if !repo.remote_path.is_empty() {
        inv.args(["--remote-path", repo.remote_path.as_str()]);
    }
    inv
}

// ─── Builders ─────────────────────────────────────────────────────────────────

/// `borg init --encryption <mode> --make-parent-dirs <repo>`.
pub fn build_init(profile: &Profile) -> Invocation {
    let mut inv = borg(profile, "init");
    inv.args(["--encryption", profile.config.repo.encryption.as_str()])
        .arg("--make-parent-dirs")
        .arg(profile.location(None));
    inv
}

/// `borg create …  <repo>::<archive> <sources…>`.
pub fn build_create(profile: &Profile, archive: &str) -> Invocation {
    let b = &profile.config.backup;
    let mut inv = borg(profile, "create");
    inv.args(["--stats", "--compression", b.compression.as_str()]);
    if b.one_file_system {
        inv.arg("--one-file-system");
    }
    if b.exclude_caches {
        inv.arg("--exclude-caches");
    }
    if !b.exclude_if_present.is_empty() {
        inv.args(["--exclude-if-present", b.exclude_if_present.as_str()]);
    }
    for pattern in &b.excludes {
        inv.args(["--exclude", pattern.as_str()]);
    }
    inv.arg(profile.location(Some(archive)))
        .args(b.sources.iter().map(String::as_str));
    inv
}

/// `--keep-*` flags in within/hourly/…/yearly order, zero counts omitted.
pub fn retention_flags(profile: &Profile) -> Vec<String> {
    let r = &profile.config.retention;
    let mut flags = Vec::new();
    if !r.within.is_empty() {
        flags.extend(["--keep-within".to_string(), r.within.clone()]);
    }
    for (flag, n) in [
        ("--keep-hourly", r.hourly),
        ("--keep-daily", r.daily),
        ("--keep-weekly", r.weekly),
        ("--keep-monthly", r.monthly),
        ("--keep-yearly", r.yearly),
    ] {
        if n > 0 {
            flags.extend([flag.to_string(), n.to_string()]);
        }
    }
    flags
}

/// `borg prune --list --glob-archives <prefix>-<timestamp glob> --keep-… <repo>`.
pub fn build_prune(profile: &Profile) -> Invocation {
    let mut inv = borg(profile, "prune");
    inv.args(["--list", "--glob-archives"])
        .arg(profile.archive_glob())
        .args(retention_flags(profile))
        .arg(profile.location(None));
    inv
}

/// `borg compact <repo>`.
pub fn build_compact(profile: &Profile) -> Invocation {
    let mut inv = borg(profile, "compact");
    inv.arg(profile.location(None));
    inv
}

/// `borg list <repo>[::<archive>]`.
pub fn build_list(profile: &Profile, archive: Option<&str>) -> Invocation {
    let mut inv = borg(profile, "list");
    inv.arg(profile.location(archive));
    inv
}

/// `borg list --short --last 1 --glob-archives <prefix>-<timestamp glob> <repo>`.
pub fn build_latest_lookup(profile: &Profile) -> Invocation {
    let mut inv = borg(profile, "list");
    inv.args(["--short", "--last", "1", "--glob-archives"])
        .arg(profile.archive_glob())
        .arg(profile.location(None));
    inv
}

/// `borg info <repo>[::<archive>]`.
pub fn build_info(profile: &Profile, archive: Option<&str>) -> Invocation {
    let mut inv = borg(profile, "info");
    inv.arg(profile.location(archive));
    inv
}

/// `borg delete --stats <repo>::<archive>`.
pub fn build_delete(profile: &Profile, archive: &str) -> Invocation {
    let mut inv = borg(profile, "delete");
    inv.arg("--stats").arg(profile.location(Some(archive)));
    inv
}

/// `borg extract --list <repo>::<archive> [paths…]`, run inside `target`.
pub fn build_extract(
    profile: &Profile,
    archive: &str,
    paths: &[String],
    target: PathBuf,
) -> Invocation {
    let mut inv = borg(profile, "extract");
    inv.arg("--list")
        .arg(profile.location(Some(archive)))
        .args(paths.iter().map(String::as_str));
    inv.cwd = Some(target);
    inv
}

/// `borg check [--verify-data] <repo>`.
pub fn build_check(profile: &Profile, verify_data: bool) -> Invocation {
    let mut inv = borg(profile, "check");
    if verify_data {
        inv.arg("--verify-data");
    }
    inv.arg(profile.location(None));
    inv
}

/// `borg check --repair <repo>`, with the confirmation prompt pre-answered.
pub fn build_repair(profile: &Profile) -> Invocation {
    let mut inv = borg(profile, "check");
    inv.arg("--repair").arg(profile.location(None));
    inv.env
        .push(("BORG_CHECK_I_KNOW_WHAT_I_AM_DOING".into(), "YES".into()));
    inv
}

/// `borg mount <repo>[::<archive>] <mountpoint>`.
pub fn build_mount(profile: &Profile, archive: Option<&str>, mountpoint: &str) -> Invocation {
    let mut inv = borg(profile, "mount");
    inv.arg(profile.location(archive)).arg(mountpoint);
    inv
}

/// `borg umount <mountpoint>`.
pub fn build_umount(profile: &Profile, mountpoint: &str) -> Invocation {
    let mut inv = borg(profile, "umount");
    inv.arg(mountpoint);
    inv
}

// ─── Tests ────────────────────────────────────────────────────────────────────
