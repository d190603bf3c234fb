//! `borgctl delete <archive>`: remove one archive.

use tracing::info;

use super::Session;
use crate::{
    error::{Error, Stage},
    runner::build_delete,
};

pub fn run(session: &Session<'_>, archive: &str) -> Result<(), Error> {
    let _lock = session.lock()?;
    info!(archive, "deleting archive");
    session.run_captured(Stage::Delete, &build_delete(session.profile, archive))
}
