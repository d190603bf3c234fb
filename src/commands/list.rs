//! `borgctl list` and `borgctl info`: read-only queries, output attached.

use super::Session;
use crate::{
    error::{Error, Stage},
    runner::{build_info, build_list},
};

/// `borg list` for the repository, or for one archive's contents.
pub fn run_list(session: &Session<'_>, archive: Option<&str>) -> Result<(), Error> {
    let archive = archive
        .map(|a| session.resolve_archive(Stage::List, a))
        .transpose()?;
    session.run_attached(Stage::List, &build_list(session.profile, archive.as_deref()))
}

/// `borg info` for the repository, or for one archive.
pub fn run_info(session: &Session<'_>, archive: Option<&str>) -> Result<(), Error> {
    let archive = archive
        .map(|a| session.resolve_archive(Stage::Info, a))
        .transpose()?;
    session.run_attached(Stage::Info, &build_info(session.profile, archive.as_deref()))
}
