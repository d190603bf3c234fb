//! `borgctl mount` / `borgctl umount`: FUSE access to archives.

use std::path::Path;

use anyhow::Context;

use super::Session;
use crate::{
    error::{Error, Stage},
    runner::{build_mount, build_umount},
};

/// Mount the repository, or one archive, on `mountpoint`.
///
/// The mountpoint is created if it does not exist yet.
pub fn run_mount(
    session: &Session<'_>,
    mountpoint: &Path,
    archive: Option<&str>,
) -> Result<(), Error> {
    let archive = archive
        .map(|a| session.resolve_archive(Stage::Mount, a))
        .transpose()?;

    if !session.dry_run() {
        std::fs::create_dir_all(mountpoint)
            .with_context(|| format!("creating mountpoint {}", mountpoint.display()))
            .map_err(|e| Error::stage(Stage::Mount, format!("{e:#}")))?;
    }

    let inv = build_mount(
        session.profile,
        archive.as_deref(),
        &mountpoint.display().to_string(),
    );
    session.run_attached(Stage::Mount, &inv)
}

/// Unmount `mountpoint`.  Runs captured: borg's output only shows on failure.
pub fn run_umount(session: &Session<'_>, mountpoint: &Path) -> Result<(), Error> {
    let inv = build_umount(session.profile, &mountpoint.display().to_string());
    session.run_captured(Stage::Umount, &inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::*;

    #[test]
    fn mount_creates_mountpoint() {
        let dir = tempfile::tempdir().unwrap();
        let borg = fake_borg(dir.path(), &[], "");
        let p = profile(dir.path(), &borg, "");
        let mnt = dir.path().join("mnt");
        let cli = cli(&["mount", "x"]);

        run_mount(&Session::new(&cli, &p), &mnt, Some("web01-a")).unwrap();
        assert!(mnt.is_dir());
        assert_eq!(calls(dir.path()), vec![format!(
            "mount {}::web01-a {}",
            p.repository,
            mnt.display()
        )]);
    }

    #[test]
    fn mount_failure_exits_seven() {
        let dir = tempfile::tempdir().unwrap();
        let borg = fake_borg(dir.path(), &[("mount", 1)], "");
        let p = profile(dir.path(), &borg, "");
        let cli = cli(&["mount", "x"]);

        let err = run_mount(&Session::new(&cli, &p), dir.path(), None).unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn umount_runs_borg_umount() {
        let dir = tempfile::tempdir().unwrap();
        let borg = fake_borg(dir.path(), &[], "");
        let p = profile(dir.path(), &borg, "");
        let mnt = dir.path().join("mnt");
        let cli = cli(&["umount", "x"]);

        run_umount(&Session::new(&cli, &p), &mnt).unwrap();
        assert_eq!(calls(dir.path()), vec![format!("umount {}", mnt.display())]);
    }

    #[test]
    fn umount_failure_exits_seven() {
        let dir = tempfile::tempdir().unwrap();
        let borg = fake_borg(dir.path(), &[("umount", 1)], "");
        let p = profile(dir.path(), &borg, "");
        let cli = cli(&["umount", "x"]);

        let err = run_umount(&Session::new(&cli, &p), dir.path()).unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }
}
