//! `borgctl init`: create the repository for the active profile.

use tracing::info;

use super::Session;
use crate::{
    error::{Error, Stage},
    runner::build_init,
};

/// Run `borg init` while holding the repository lock.
pub fn run(session: &Session<'_>) -> Result<(), Error> {
    let _lock = session.lock()?;
    info!(repository = %session.profile.repository, "initialising repository");
    session.run_captured(Stage::Init, &build_init(session.profile))
}
