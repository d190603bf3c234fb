//! Advisory per-repository lock file.
//!
//! Mutating commands (`init`, `backup`, `delete`, `repair`) hold a
//! [`RepoLock`] for their whole duration.  The lock is a file named after
//! the repository inside `[lock].dir`, containing the holder's PID.  It is
//! created exclusively and removed when the guard drops, on success and
//! failure paths alike.
//!
//! This is best effort: a crashed process leaves its lock file behind and
//! it must be removed by hand.

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::error::Error;

/// Held lock.  Removing the file happens in `Drop`.
#[derive(Debug)]
pub struct RepoLock {
    path: PathBuf,
}

impl RepoLock {
    /// Take the lock for `repository`, failing immediately if it is held.
    pub fn acquire(dir: &Path, repository: &str) -> Result<Self, Error> {
        let path = lock_path(dir, repository);

        fs::create_dir_all(dir).map_err(|source| Error::LockIo {
            path: path.clone(),
            source,
        })?;

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::Locked {
                    repository: repository.to_string(),
                    holder: read_holder(&path).unwrap_or_else(|| "unknown".into()),
                    path,
                });
            },
            Err(source) => return Err(Error::LockIo { path, source }),
        };

        // From here on the guard owns the file, so a failed write still
        // cleans up on drop.
        let lock = Self { path };
        writeln!(file, "{}", std::process::id()).map_err(|source| Error::LockIo {
            path: lock.path.clone(),
            source,
        })?;

        info!(path = %lock.path.display(), "acquired repository lock");
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "released repository lock"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "could not remove lock file"),
        }
    }
}

/// `<dir>/<sanitised repository>.lock`.
pub fn lock_path(dir: &Path, repository: &str) -> PathBuf {
    let name: String = repository
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("{name}.lock"))
}

/// PID recorded in an existing lock file, if readable.
fn read_holder(path: &Path) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    let pid = text.trim();
    (!pid.is_empty()).then(|| pid.to_string())
}
