//! `borgctl`: profile-driven borg backups with locking and retention.
//!
//! # Overview
//!
//! This binary is a thin orchestration layer around [`borg`](https://borgbackup.org).
//! A named profile in `/etc/borgctl/<profile>.toml` describes what to back up
//! and where; `borgctl` derives the repository path and archive names from
//! the host name, guards mutating commands with a lock file, and forwards
//! everything else to borg.
//!
//! # Usage
//!
//! ```text
//! borgctl -p web init              # create the repository
//! borgctl -p web backup            # create + prune + compact
//! borgctl -p web list              # list archives
//! borgctl -p web restore latest -t /tmp/restore etc/nginx
//! borgctl -p web --dry-run backup  # print the borg commands only
//! borgctl -p web --print-config    # show the resolved profile
//! ```
//!
//! # Module layout
//!
//! | Module         | Responsibility                                       |
//! |----------------|------------------------------------------------------|
//! | [`cli`]        | Argument types parsed by clap                        |
//! | [`config`]     | Layered `Config` loading (TOML + environment)        |
//! | [`profile`]    | Host, repository and archive naming                  |
//! | [`lock`]       | Per-repository advisory lock file                    |
//! | [`runner`]     | borg invocation construction                         |
//! | [`ui`]         | Spinner, captured/attached execution, stage output   |
//! | [`error`]      | Typed errors and exit codes                          |
//! | [`commands`]   | One handler per subcommand                           |

mod cli;
mod commands;
mod config;
mod error;
mod lock;
mod profile;
mod runner;
mod ui;

use std::process::ExitCode;

use anyhow::anyhow;
use clap::Parser;
use cli::{Cli, Subcommand};
use commands::Session;
use console::style;
use error::Error;
use profile::Profile;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", style("error:").red().bold());
            ExitCode::from(&e)
        },
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    // ── borgctl new-profile (needs no existing profile) ───────────────────────
    if let Some(Subcommand::NewProfile { force }) = &cli.command {
        return commands::new_profile::run(&cli.config_dir, &cli.profile, *force);
    }

    let cfg = config::load_profile(&cli.config_dir, &cli.profile, env_vars())?;
    let profile = Profile::resolve(&cli.profile, cfg);
    debug!(
        profile = %profile.name,
        host = %profile.host,
        repository = %profile.repository,
        "resolved profile"
    );

    if cli.print_config {
        println!("{profile:#?}");
        return Ok(());
    }

    let Some(command) = &cli.command else {
        return Err(anyhow!("no subcommand given; see 'borgctl --help'").into());
    };

    commands::dispatch(&Session::new(cli, &profile), command)
}

/// Process environment, skipping entries that are not valid UTF-8.
fn env_vars() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os().filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
}

/// Log to stderr.  `RUST_LOG` wins; otherwise `-v` selects the level.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
