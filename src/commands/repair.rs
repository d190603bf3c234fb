//! `borgctl repair`: `borg check --repair` under the repository lock.

use tracing::warn;

use super::Session;
use crate::{
    error::{Error, Stage},
    runner::build_repair,
};

pub fn run(session: &Session<'_>) -> Result<(), Error> {
    let _lock = session.lock()?;
    warn!(repository = %session.profile.repository, "running borg check --repair");
    session.run_captured(Stage::Repair, &build_repair(session.profile))
}
