//! Typed failures and the process exit codes they map to.
//!
//! | Code | Meaning                                         |
//! |------|-------------------------------------------------|
//! | 0    | success                                         |
//! | 1    | `init` failed                                   |
//! | 2    | configuration or usage error                    |
//! | 3    | `backup` (archive creation) failed              |
//! | 4    | `list`, `info`, `delete` or `restore` failed    |
//! | 5    | `prune`, `compact` or `repair` failed           |
//! | 6    | `verify` failed                                 |
//! | 7    | `mount` or `umount` failed                      |
//! | 9    | repository lock held or not obtainable          |

use std::{fmt, path::PathBuf, process};

use thiserror::Error;

/// One borg operation, as seen by the exit-code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Create,
    Prune,
    Compact,
    List,
    Info,
    Delete,
    Restore,
    Verify,
    Repair,
    Mount,
    Umount,
}

impl Stage {
    /// Exit code reported when this stage fails.
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Init => 1,
            Self::Create => 3,
            Self::List | Self::Info | Self::Delete | Self::Restore => 4,
            Self::Prune | Self::Compact | Self::Repair => 5,
            Self::Verify => 6,
            Self::Mount | Self::Umount => 7,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::Create => "Create",
            Self::Prune => "Prune",
            Self::Compact => "Compact",
            Self::List => "List",
            Self::Info => "Info",
            Self::Delete => "Delete",
            Self::Restore => "Restore",
            Self::Verify => "Verify",
            Self::Repair => "Repair",
            Self::Mount => "Mount",
            Self::Umount => "Umount",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything that can end a `borgctl` run early.
#[derive(Debug, Error)]
pub enum Error {
    /// Profile missing or invalid, bad override, or another usage problem.
    #[error("{0:#}")]
    Config(anyhow::Error),

    /// Another process holds the lock for this repository.
    #[error("repository {repository} is locked by pid {holder} ({})", .path.display())]
    Locked {
        repository: String,
        holder: String,
        path: PathBuf,
    },

    /// The lock file could not be created or its directory is unusable.
    #[error("cannot create lock file {}: {source}", .path.display())]
    LockIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A borg invocation failed or could not be spawned.
    #[error("{stage} failed: {detail}")]
    Stage { stage: Stage, detail: String },
}

impl Error {
    pub fn stage(stage: Stage, detail: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            detail: detail.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Locked { .. } | Self::LockIo { .. } => 9,
            Self::Stage { stage, .. } => stage.exit_code(),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Config(err)
    }
}

impl From<&Error> for process::ExitCode {
    fn from(err: &Error) -> Self {
        process::ExitCode::from(err.exit_code())
    }
}
