//! `borgctl restore <archive> [--target DIR] [PATHS…]`: extract an archive.
//!
//! `borg extract` always writes relative to its working directory, so the
//! target directory is created first and the engine is started inside it.

use std::path::Path;

use anyhow::Context;
use tracing::info;

use super::Session;
use crate::{
    error::{Error, Stage},
    runner::build_extract,
};

pub fn run(
    session: &Session<'_>,
    archive: &str,
    target: &Path,
    paths: &[String],
) -> Result<(), Error> {
    let archive = session.resolve_archive(Stage::Restore, archive)?;

    if !session.dry_run() {
        std::fs::create_dir_all(target)
            .with_context(|| format!("creating {}", target.display()))
            .map_err(|e| Error::stage(Stage::Restore, format!("{e:#}")))?;
    }

    info!(%archive, target = %target.display(), "restoring archive");
    let inv = build_extract(session.profile, &archive, paths, target.to_path_buf());
    session.run_attached(Stage::Restore, &inv)
}
