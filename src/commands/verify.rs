//! `borgctl verify`: consistency check without repair.

use super::Session;
use crate::{
    error::{Error, Stage},
    runner::build_check,
};

pub fn run(session: &Session<'_>, verify_data: bool) -> Result<(), Error> {
    session.run_captured(Stage::Verify, &build_check(session.profile, verify_data))
}
