//! Derived variables for a loaded profile.
//!
//! Everything a command needs beyond the raw [`Config`] is computed once
//! here: the host name, the repository location, and the archive naming
//! scheme.  Archive names look like `<prefix>-2024-05-01T03:00:00`, and
//! pruning plus `latest` lookups only match `<prefix>-` followed by exactly
//! that timestamp shape, so several hosts can share one repository without
//! pruning each other's archives, even when one prefix extends another
//! (`web` and `web-01`).

use chrono::NaiveDateTime;

use crate::config::Config;

/// Timestamp layout appended to the archive prefix.
pub const ARCHIVE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Shell pattern matching exactly what [`ARCHIVE_TIME_FORMAT`] produces.
const ARCHIVE_TIME_GLOB: &str = "????-??-??T??:??:??";

/// A profile with its derived variables resolved.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Profile name as given on the command line.
    pub name: String,
    /// Host name used for the repository path and archive prefix.
    pub host: String,
    /// Repository location handed to borg (path or URL).
    pub repository: String,
    /// Prefix shared by every archive this profile creates.
    pub archive_prefix: String,
    pub config: Config,
}

impl Profile {
    /// Resolve derived variables, asking the system for the host name when
    /// the config does not set one.
    pub fn resolve(name: &str, config: Config) -> Self {
        Self::resolve_with(name, config, system_hostname)
    }

    /// Like [`Profile::resolve`] but with an injectable host name source.
    pub fn resolve_with(name: &str, config: Config, system_host: impl FnOnce() -> String) -> Self {
        let host = config
            .host
            .name
            .clone()
            .unwrap_or_else(|| short_host(&system_host()));

        let repository = if config.repo.path.is_empty() {
            format!("{}/{host}", config.repo.base.trim_end_matches('/'))
        } else {
            config.repo.path.clone()
        };

        let archive_prefix = if config.backup.archive_prefix.is_empty() {
            host.clone()
        } else {
            config.backup.archive_prefix.clone()
        };

        Self {
            name: name.to_string(),
            host,
            repository,
            archive_prefix,
            config,
        }
    }

    /// Archive name for a backup started at `at`.
    pub fn archive_name(&self, at: NaiveDateTime) -> String {
        format!("{}-{}", self.archive_prefix, at.format(ARCHIVE_TIME_FORMAT))
    }

    /// Glob matching every archive this profile creates, and nothing else.
    pub fn archive_glob(&self) -> String {
        format!("{}-{ARCHIVE_TIME_GLOB}", self.archive_prefix)
    }

    /// `<repo>` or `<repo>::<archive>`.
    pub fn location(&self, archive: Option<&str>) -> String {
        match archive {
            Some(a) => format!("{}::{a}", self.repository),
            None => self.repository.clone(),
        }
    }
}

/// Best-effort system host name.
///
/// Tries the kernel, then `/etc/hostname`, then `$HOSTNAME`, and finally
/// gives up with `localhost`.
pub fn system_hostname() -> String {
    ["/proc/sys/kernel/hostname", "/etc/hostname"]
        .iter()
        .filter_map(|p| std::fs::read_to_string(p).ok())
        .chain(std::env::var("HOSTNAME").ok())
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".into())
}

/// Strip the domain part: `web01.example.org` → `web01`.
fn short_host(name: &str) -> String {
    let short = name.split('.').next().unwrap_or(name);
    if short.is_empty() {
        name.to_string()
    } else {
        short.to_string()
    }
}
