//! Configuration types and loading logic.
//!
//! A profile is assembled from three layers, merged field by field with the
//! later layer winning:
//!
//! 1. `<config-dir>/defaults.toml`: optional, shared by every profile
//! 2. `<config-dir>/<profile>.toml`: required
//! 3. `BORGCTL_*` environment overrides
//!
//! Each layer deserialises into a [`PartialConfig`] whose fields are all
//! `Option`s; [`PartialConfig::resolve`] fills the gaps with defaults and
//! produces the concrete [`Config`].
//!
//! # File format
//!
//! ```toml
//! [host]
//! name = "web01"
//!
//! [repo]
//! base        = "/var/backups/borg"   # repository = <base>/<host>
//! passphrase  = "correct horse"
//! encryption  = "repokey-blake2"
//!
//! [backup]
//! sources            = ["/etc", "/home"]
//! excludes           = ["/home/*/.cache"]
//! exclude_if_present = ".nobackup"
//! compression        = "lz4"
//!
//! [retention]
//! daily   = 7
//! weekly  = 4
//! monthly = 6
//!
//! [lock]
//! dir = "/run/borgctl"
//!
//! [borg]
//! binary = "/usr/bin/borg"
//! ```

use std::{
    fmt,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Name of the shared defaults file inside the configuration directory.
pub const DEFAULTS_FILE: &str = "defaults.toml";

// ─── Secret ───────────────────────────────────────────────────────────────────

/// A string that never shows up in `Debug` output.
///
/// Deserialise-only: nothing can write a secret back out as plain text.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("\"\"")
        } else {
            f.write_str("\"***\"")
        }
    }
}

// ─── Top-level ────────────────────────────────────────────────────────────────

/// Fully resolved configuration for one profile.
///
/// Built only by [`PartialConfig::resolve`]; files are parsed as layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub host: HostConfig,
    pub repo: RepoConfig,
    pub backup: BackupConfig,
    pub retention: RetentionConfig,
    pub lock: LockConfig,
    pub borg: BorgConfig,
}

// ─── [host] ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostConfig {
    /// Host name used for the repository path and archive prefix.
    ///
    /// `None` means "ask the system".
    pub name: Option<String>,
}

// ─── [repo] ───────────────────────────────────────────────────────────────────

/// Where the borg repository lives and how to open it.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoConfig {
    /// Parent of the per-host repositories.  The repository path becomes
    /// `<base>/<host>` unless [`RepoConfig::path`] is set.
    pub base: String,

    /// Explicit repository location (path or `ssh://` URL).  Wins over `base`.
    pub path: String,

    /// Exported as `BORG_PASSPHRASE` when non-empty.
    pub passphrase: Secret,

    /// Exported as `BORG_PASSCOMMAND` when non-empty.
    pub passcommand: String,

    /// Encryption mode passed to `borg init --encryption`.
    pub encryption: String,

    /// Exported as `BORG_RSH` when non-empty.
    pub rsh: String,

    /// Forwarded as `--remote-path` when non-empty.
    pub remote_path: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            base: default_repo_base(),
            path: String::new(),
            passphrase: Secret::default(),
            passcommand: String::new(),
            encryption: default_encryption(),
            rsh: String::new(),
            remote_path: String::new(),
        }
    }
}

// ─── [backup] ─────────────────────────────────────────────────────────────────

/// What goes into each archive.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupConfig {
    /// Paths to archive.  Must not be empty when running `backup`.
    pub sources: Vec<String>,

    /// Patterns forwarded one-per-flag as `--exclude`.
    pub excludes: Vec<String>,

    /// Directories containing a file with this name are skipped.  Empty
    /// disables the flag.
    pub exclude_if_present: String,

    /// Skip directories tagged with a `CACHEDIR.TAG`.
    pub exclude_caches: bool,

    /// Do not cross filesystem boundaries.
    pub one_file_system: bool,

    /// borg compression spec, e.g. `lz4` or `zstd,6`.
    pub compression: String,

    /// Archive name prefix.  Empty means "use the host name".
    pub archive_prefix: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            sources: vec![],
            excludes: vec![],
            exclude_if_present: default_exclude_marker(),
            exclude_caches: true,
            one_file_system: true,
            compression: default_compression(),
            archive_prefix: String::new(),
        }
    }
}

// ─── [retention] ──────────────────────────────────────────────────────────────

/// How many archives `borg prune` keeps per time window.
///
/// A count of `0` drops the corresponding `--keep-*` flag entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionConfig {
    /// Keep everything newer than this interval (`--keep-within`, e.g. `2d`).
    pub within: String,
    pub hourly: u32,
    pub daily: u32,
    pub weekly: u32,
    pub monthly: u32,
    pub yearly: u32,
    /// Run `borg compact` after pruning to reclaim segment space.
    pub compact: bool,
}

impl RetentionConfig {
    /// `true` if at least one keep rule is configured.
    pub fn keeps_anything(&self) -> bool {
        !self.within.is_empty()
            || [self.hourly, self.daily, self.weekly, self.monthly, self.yearly]
                .iter()
                .any(|&n| n > 0)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            within: String::new(),
            hourly: 0,
            daily: default_keep_daily(),
            weekly: default_keep_weekly(),
            monthly: default_keep_monthly(),
            yearly: 0,
            compact: true,
        }
    }
}

// ─── [lock] ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct LockConfig {
    /// Directory that holds `<repository>.lock` files.
    pub dir: PathBuf,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            dir: default_lock_dir(),
        }
    }
}

// ─── [borg] ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct BorgConfig {
    /// Engine executable.  A bare name is looked up on `PATH`; a relative
    /// path is resolved against the directory borgctl was started in.
    pub binary: String,
}

impl Default for BorgConfig {
    fn default() -> Self {
        Self {
            binary: default_borg_binary(),
        }
    }
}

// ─── Defaults ─────────────────────────────────────────────────────────────────

pub fn default_repo_base() -> String {
    "/var/backups/borg".into()
}

pub fn default_encryption() -> String {
    "repokey-blake2".into()
}

pub fn default_compression() -> String {
    "lz4".into()
}

pub fn default_exclude_marker() -> String {
    ".nobackup".into()
}

pub fn default_keep_daily() -> u32 {
    7
}
pub fn default_keep_weekly() -> u32 {
    4
}
pub fn default_keep_monthly() -> u32 {
    6
}

pub fn default_lock_dir() -> PathBuf {
    std::env::temp_dir().join("borgctl")
}

pub fn default_borg_binary() -> String {
    "borg".into()
}

// ─── Partial layers ───────────────────────────────────────────────────────────

/// One configuration layer.  `None` means "not set here, inherit".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartialConfig {
    pub host: PartialHost,
    pub repo: PartialRepo,
    pub backup: PartialBackup,
    pub retention: PartialRetention,
    pub lock: PartialLock,
    pub borg: PartialBorg,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartialHost {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartialRepo {
    pub base: Option<String>,
    pub path: Option<String>,
    pub passphrase: Option<Secret>,
    pub passcommand: Option<String>,
    pub encryption: Option<String>,
    pub rsh: Option<String>,
    pub remote_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartialBackup {
    pub sources: Option<Vec<String>>,
    pub excludes: Option<Vec<String>>,
    pub exclude_if_present: Option<String>,
    pub exclude_caches: Option<bool>,
    pub one_file_system: Option<bool>,
    pub compression: Option<String>,
    pub archive_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartialRetention {
    pub within: Option<String>,
    pub hourly: Option<u32>,
    pub daily: Option<u32>,
    pub weekly: Option<u32>,
    pub monthly: Option<u32>,
    pub yearly: Option<u32>,
    pub compact: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartialLock {
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartialBorg {
    pub binary: Option<String>,
}

impl PartialConfig {
    /// Overlay `over` on top of `self`; fields set in `over` win.
    #[must_use]
    pub fn merge(self, over: Self) -> Self {
        Self {
            host: PartialHost {
                name: over.host.name.or(self.host.name),
            },
            repo: PartialRepo {
                base: over.repo.base.or(self.repo.base),
                path: over.repo.path.or(self.repo.path),
                passphrase: over.repo.passphrase.or(self.repo.passphrase),
                passcommand: over.repo.passcommand.or(self.repo.passcommand),
                encryption: over.repo.encryption.or(self.repo.encryption),
                rsh: over.repo.rsh.or(self.repo.rsh),
                remote_path: over.repo.remote_path.or(self.repo.remote_path),
            },
            backup: PartialBackup {
                sources: over.backup.sources.or(self.backup.sources),
                excludes: over.backup.excludes.or(self.backup.excludes),
                exclude_if_present: over
                    .backup
                    .exclude_if_present
                    .or(self.backup.exclude_if_present),
                exclude_caches: over.backup.exclude_caches.or(self.backup.exclude_caches),
                one_file_system: over.backup.one_file_system.or(self.backup.one_file_system),
                compression: over.backup.compression.or(self.backup.compression),
                archive_prefix: over.backup.archive_prefix.or(self.backup.archive_prefix),
            },
            retention: PartialRetention {
                within: over.retention.within.or(self.retention.within),
                hourly: over.retention.hourly.or(self.retention.hourly),
                daily: over.retention.daily.or(self.retention.daily),
                weekly: over.retention.weekly.or(self.retention.weekly),
                monthly: over.retention.monthly.or(self.retention.monthly),
                yearly: over.retention.yearly.or(self.retention.yearly),
                compact: over.retention.compact.or(self.retention.compact),
            },
            lock: PartialLock {
                dir: over.lock.dir.or(self.lock.dir),
            },
            borg: PartialBorg {
                binary: over.borg.binary.or(self.borg.binary),
            },
        }
    }

    /// Fill every unset field with its default and expand `~/` paths.
    pub fn resolve(self) -> Config {
        self.resolve_with_home(dirs::home_dir().as_deref())
    }

    /// [`resolve`](Self::resolve) with an explicit home directory.
    pub fn resolve_with_home(self, home: Option<&Path>) -> Config {
        let d = Config::default();
        let expand = |s: String| expand_home(&s, home);

        Config {
            host: HostConfig {
                name: self.host.name.filter(|n| !n.is_empty()),
            },
            repo: RepoConfig {
                base: expand(self.repo.base.unwrap_or(d.repo.base)),
                path: expand(self.repo.path.unwrap_or(d.repo.path)),
                passphrase: self.repo.passphrase.unwrap_or(d.repo.passphrase),
                passcommand: self.repo.passcommand.unwrap_or(d.repo.passcommand),
                encryption: self.repo.encryption.unwrap_or(d.repo.encryption),
                rsh: self.repo.rsh.unwrap_or(d.repo.rsh),
                remote_path: self.repo.remote_path.unwrap_or(d.repo.remote_path),
            },
            backup: BackupConfig {
                sources: self
                    .backup
                    .sources
                    .unwrap_or(d.backup.sources)
                    .into_iter()
                    .map(expand)
                    .collect(),
                excludes: self.backup.excludes.unwrap_or(d.backup.excludes),
                exclude_if_present: self
                    .backup
                    .exclude_if_present
                    .unwrap_or(d.backup.exclude_if_present),
                exclude_caches: self.backup.exclude_caches.unwrap_or(d.backup.exclude_caches),
                one_file_system: self.backup.one_file_system.unwrap_or(d.backup.one_file_system),
                compression: self.backup.compression.unwrap_or(d.backup.compression),
                archive_prefix: self.backup.archive_prefix.unwrap_or(d.backup.archive_prefix),
            },
            retention: RetentionConfig {
                within: self.retention.within.unwrap_or(d.retention.within),
                hourly: self.retention.hourly.unwrap_or(d.retention.hourly),
                daily: self.retention.daily.unwrap_or(d.retention.daily),
                weekly: self.retention.weekly.unwrap_or(d.retention.weekly),
                monthly: self.retention.monthly.unwrap_or(d.retention.monthly),
                yearly: self.retention.yearly.unwrap_or(d.retention.yearly),
                compact: self.retention.compact.unwrap_or(d.retention.compact),
            },
            lock: LockConfig {
                dir: self
                    .lock
                    .dir
                    .map_or(d.lock.dir, |dir| PathBuf::from(expand(dir))),
            },
            borg: BorgConfig {
                binary: self.borg.binary.map_or(d.borg.binary, locate_binary),
            },
        }
    }

    /// Build the override layer from `BORGCTL_*` variables.
    ///
    /// Takes the variables as an iterator so tests never touch the real
    /// process environment.
    pub fn from_env<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            let key = key.as_ref();
            let value: String = value.into();
            match key {
                "BORGCTL_HOST" => layer.host.name = Some(value),
                "BORGCTL_REPO" => layer.repo.path = Some(value),
                "BORGCTL_KEEP_WITHIN" => layer.retention.within = Some(value),
                "BORGCTL_KEEP_HOURLY" => layer.retention.hourly = Some(parse_count(key, &value)?),
                "BORGCTL_KEEP_DAILY" => layer.retention.daily = Some(parse_count(key, &value)?),
                "BORGCTL_KEEP_WEEKLY" => layer.retention.weekly = Some(parse_count(key, &value)?),
                "BORGCTL_KEEP_MONTHLY" => {
                    layer.retention.monthly = Some(parse_count(key, &value)?);
                },
                "BORGCTL_KEEP_YEARLY" => layer.retention.yearly = Some(parse_count(key, &value)?),
                _ => {},
            }
        }
        Ok(layer)
    }
}

fn parse_count(key: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .with_context(|| format!("{key}={value:?} is not a non-negative integer"))
}

/// Replace a leading `~/` (or a bare `~`) with `home`.
fn expand_home(value: &str, home: Option<&Path>) -> String {
    match (value, home) {
        ("~", Some(h)) => h.display().to_string(),
        (v, Some(h)) if v.starts_with("~/") => h.join(&v[2..]).display().to_string(),
        (v, _) => v.to_string(),
    }
}

/// Pin a relative binary path such as `./bin/borg` to the current
/// directory, so commands run elsewhere (`restore`) still find it.  Bare
/// names stay as they are for the `PATH` lookup.
fn locate_binary(binary: String) -> String {
    if !binary.contains('/') || Path::new(&binary).is_absolute() {
        return binary;
    }
    std::path::absolute(&binary).map_or(binary, |p| p.display().to_string())
}

// ─── Loader ───────────────────────────────────────────────────────────────────

/// Reject profile names that could escape the configuration directory.
pub fn validate_profile_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("profile name must not be empty");
    }
    if name.starts_with('.') {
        bail!("profile name '{name}' must not start with '.'");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        bail!("profile name '{name}' may only contain letters, digits, '.', '_' and '-'");
    }
    if format!("{name}.toml") == DEFAULTS_FILE {
        bail!("'defaults' is reserved for the shared defaults file");
    }
    Ok(())
}

/// Path of the TOML file backing `profile`.
pub fn profile_path(config_dir: &Path, profile: &str) -> PathBuf {
    config_dir.join(format!("{profile}.toml"))
}

/// Parse one layer from `path`.
///
/// Returns `Ok(None)` when the file does not exist, and an error when it
/// exists but cannot be read or is not valid TOML.
pub fn parse_partial(path: &Path) -> Result<Option<PartialConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    toml::from_str(&text)
        .map(Some)
        .with_context(|| format!("parsing {}", path.display()))
}

/// Load and merge every layer for `profile`.
///
/// The profile file itself is mandatory; `defaults.toml` is not.
pub fn load_profile<I, K, V>(config_dir: &Path, profile: &str, env: I) -> Result<Config>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    validate_profile_name(profile)?;

    let defaults = parse_partial(&config_dir.join(DEFAULTS_FILE))?.unwrap_or_default();

    let path = profile_path(config_dir, profile);
    let Some(local) = parse_partial(&path)? else {
        bail!(
            "profile '{profile}' not found at {}\n\
             Run 'borgctl --profile {profile} new-profile' to generate one.",
            path.display()
        );
    };

    let env = PartialConfig::from_env(env)?;
    tracing::debug!(path = %path.display(), "loaded profile");

    Ok(defaults.merge(local).merge(env).resolve())
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const NO_ENV: [(&str, &str); 0] = [];

    fn partial(text: &str) -> PartialConfig {
        toml::from_str(text).expect("parse failed")
    }

    // ── Defaults ─────────────────────────────────────────────────────────────

    #[test]
    fn default_retention_keeps_something() {
        assert!(RetentionConfig::default().keeps_anything());
    }

    #[test]
    fn retention_with_only_within_keeps_something() {
        let r = RetentionConfig {
            within: "2d".into(),
            hourly: 0,
            daily: 0,
            weekly: 0,
            monthly: 0,
            yearly: 0,
            compact: false,
        };
        assert!(r.keeps_anything());
    }

    #[test]
    fn all_zero_retention_keeps_nothing() {
        let r = RetentionConfig {
            within: String::new(),
            hourly: 0,
            daily: 0,
            weekly: 0,
            monthly: 0,
            yearly: 0,
            compact: true,
        };
        assert!(!r.keeps_anything());
    }

    #[test]
    fn empty_partial_resolves_to_defaults() {
        let cfg = PartialConfig::default().resolve();
        assert_eq!(cfg, Config::default());
    }

    // ── Secret ───────────────────────────────────────────────────────────────

    #[test]
    fn secret_is_redacted_in_debug() {
        let cfg = partial(
            r#"
            [repo]
            passphrase = "hunter2"
            "#,
        )
        .resolve();
        let printed = format!("{cfg:#?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("***"));
        assert_eq!(cfg.repo.passphrase.expose(), "hunter2");
    }

    // ── merge ────────────────────────────────────────────────────────────────

    #[test]
    fn later_layer_wins_per_field() {
        let defaults = partial(
            r#"
            [repo]
            base = "/srv/borg"
            encryption = "none"

            [retention]
            daily = 3
            weekly = 2
            "#,
        );
        let local = partial(
            r#"
            [repo]
            encryption = "repokey"

            [retention]
            daily = 10
            "#,
        );
        let cfg = defaults.merge(local).resolve();
        assert_eq!(cfg.repo.base, "/srv/borg");
        assert_eq!(cfg.repo.encryption, "repokey");
        assert_eq!(cfg.retention.daily, 10);
        assert_eq!(cfg.retention.weekly, 2);
        assert_eq!(cfg.retention.monthly, default_keep_monthly());
    }

    #[test]
    fn explicit_empty_list_overrides_inherited_sources() {
        let defaults = partial(r#"backup = { sources = ["/etc"] }"#);
        let local = partial(r#"backup = { sources = [] }"#);
        let cfg = defaults.merge(local).resolve();
        assert!(cfg.backup.sources.is_empty());
    }

    // ── from_env ─────────────────────────────────────────────────────────────

    #[test]
    fn env_overrides_host_repo_and_counts() {
        let env = PartialConfig::from_env([
            ("BORGCTL_HOST", "db02"),
            ("BORGCTL_REPO", "ssh://backup@nas/./db02"),
            ("BORGCTL_KEEP_DAILY", "14"),
            ("BORGCTL_KEEP_YEARLY", " 2 "),
            ("BORGCTL_KEEP_WITHIN", "36H"),
            ("UNRELATED", "ignored"),
        ])
        .unwrap();
        let cfg = partial(r#"host = { name = "db01" }"#).merge(env).resolve();
        assert_eq!(cfg.host.name.as_deref(), Some("db02"));
        assert_eq!(cfg.repo.path, "ssh://backup@nas/./db02");
        assert_eq!(cfg.retention.daily, 14);
        assert_eq!(cfg.retention.yearly, 2);
        assert_eq!(cfg.retention.within, "36H");
    }

    #[test]
    fn env_rejects_non_numeric_count() {
        let err = PartialConfig::from_env([("BORGCTL_KEEP_WEEKLY", "four")]).unwrap_err();
        assert!(format!("{err:#}").contains("BORGCTL_KEEP_WEEKLY"));
    }

    #[test]
    fn env_rejects_negative_count() {
        assert!(PartialConfig::from_env([("BORGCTL_KEEP_DAILY", "-1")]).is_err());
    }

    // ── expand_home ──────────────────────────────────────────────────────────

    #[test]
    fn tilde_expands_against_home() {
        let home = Path::new("/home/alice");
        assert_eq!(expand_home("~/backups", Some(home)), "/home/alice/backups");
        assert_eq!(expand_home("~", Some(home)), "/home/alice");
        assert_eq!(expand_home("/abs/~/x", Some(home)), "/abs/~/x");
        assert_eq!(expand_home("~/backups", None), "~/backups");
    }

    #[test]
    fn resolve_expands_tilde_in_every_path_field() {
        let cfg = partial(
            r#"
            [repo]
            base = "~/borg"
            path = "~/borg/web01"

            [backup]
            sources = ["~/documents", "/etc", "~"]

            [lock]
            dir = "~/.cache/borgctl"
            "#,
        )
        .resolve_with_home(Some(Path::new("/home/op")));

        assert_eq!(cfg.repo.base, "/home/op/borg");
        assert_eq!(cfg.repo.path, "/home/op/borg/web01");
        assert_eq!(cfg.backup.sources, vec!["/home/op/documents", "/etc", "/home/op"]);
        assert_eq!(cfg.lock.dir, PathBuf::from("/home/op/.cache/borgctl"));
    }

    #[test]
    fn resolve_leaves_tilde_in_other_fields() {
        let cfg = partial("[backup]\nexcludes = [\"~/tmp\"]\n")
            .resolve_with_home(Some(Path::new("/home/op")));
        assert_eq!(cfg.backup.excludes, vec!["~/tmp"]);
    }

    // ── locate_binary ────────────────────────────────────────────────────────

    #[test]
    fn bare_and_absolute_binaries_are_untouched() {
        assert_eq!(locate_binary("borg".into()), "borg");
        assert_eq!(locate_binary("/usr/bin/borg".into()), "/usr/bin/borg");
    }

    #[test]
    fn relative_binary_is_pinned_to_current_dir() {
        let cfg = partial("[borg]\nbinary = \"./bin/borg\"\n").resolve();
        let expected = std::env::current_dir().unwrap().join("./bin/borg");
        assert!(Path::new(&cfg.borg.binary).is_absolute(), "{}", cfg.borg.binary);
        assert_eq!(
            Path::new(&cfg.borg.binary).components().collect::<Vec<_>>(),
            expected.components().collect::<Vec<_>>()
        );
    }

    // ── validate_profile_name ────────────────────────────────────────────────

    #[test]
    fn profile_names_are_validated() {
        for ok in ["default", "web-01", "db_main", "nas.weekly"] {
            assert!(validate_profile_name(ok).is_ok(), "{ok} should be accepted");
        }
        for bad in ["", ".hidden", "../etc/passwd", "a/b", "with space", "defaults"] {
            assert!(validate_profile_name(bad).is_err(), "{bad} should be rejected");
        }
    }

    // ── load_profile ─────────────────────────────────────────────────────────

    #[test]
    fn load_profile_errors_when_profile_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_profile(dir.path(), "nope", NO_ENV).unwrap_err();
        assert!(format!("{err:#}").contains("not found"));
    }

    #[test]
    fn load_profile_merges_defaults_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULTS_FILE),
            "[repo]\nbase = \"/srv/shared\"\n[borg]\nbinary = \"/opt/borg\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("web.toml"),
            "[backup]\nsources = [\"/var/www\"]\n",
        )
        .unwrap();

        let cfg = load_profile(dir.path(), "web", NO_ENV).unwrap();
        assert_eq!(cfg.repo.base, "/srv/shared");
        assert_eq!(cfg.borg.binary, "/opt/borg");
        assert_eq!(cfg.backup.sources, vec!["/var/www"]);
    }

    #[test]
    fn load_profile_applies_env_last() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("web.toml"), "[retention]\ndaily = 1\n").unwrap();
        let cfg = load_profile(dir.path(), "web", [("BORGCTL_KEEP_DAILY", "9")]).unwrap();
        assert_eq!(cfg.retention.daily, 9);
    }

    #[test]
    fn load_profile_errors_on_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("web.toml"), "not valid toml ][[[").unwrap();
        assert!(load_profile(dir.path(), "web", NO_ENV).is_err());
    }

    #[test]
    fn load_profile_errors_on_invalid_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DEFAULTS_FILE), "[[[").unwrap();
        fs::write(dir.path().join("web.toml"), "").unwrap();
        assert!(load_profile(dir.path(), "web", NO_ENV).is_err());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("web.toml"), "[repo]\nflavour = \"vanilla\"\n").unwrap();
        assert!(load_profile(dir.path(), "web", NO_ENV).is_ok());
    }

    #[test]
    fn parse_partial_returns_none_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(parse_partial(&dir.path().join("absent.toml")).unwrap().is_none());
    }
}
