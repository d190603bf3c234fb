//! Command-line interface definition.
//!
//! All argument parsing lives here so the rest of the codebase can stay
//! agnostic to `clap`.  The `Cli` struct is parsed once in `main` and then
//! passed (by reference) into the command handlers.

use std::path::PathBuf;

use clap::Parser;

/// Top-level CLI arguments, shared across every subcommand.
#[derive(Parser, Debug)]
#[command(
    name    = "borgctl",
    about   = "Profile-driven borg backups with locking and retention",
    version,
    arg_required_else_help = true,
    // Show a compact two-column help layout.
    help_template = "\
{before-help}{name} {version}
{about}

{usage-heading} {usage}

{all-args}{after-help}"
)]
pub struct Cli {
    /// Directory holding `defaults.toml` and one `<profile>.toml` per profile.
    #[arg(long, env = "BORGCTL_CONFIG_DIR", default_value = "/etc/borgctl")]
    pub config_dir: PathBuf,

    /// Name of the profile to load from the configuration directory.
    #[arg(short, long, env = "BORGCTL_PROFILE", default_value = "default")]
    pub profile: String,

    /// Print the resolved profile and exit without running anything.
    ///
    /// Secrets are redacted.  Handy for checking which repository and
    /// archive prefix a profile resolves to on this host.
    #[arg(long)]
    pub print_config: bool,

    /// Print every borg command instead of running it.
    ///
    /// No lock is taken and no directory is created.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Increase log verbosity (`-v` debug, `-vv` trace).  `RUST_LOG` wins.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Subcommand>,
}

/// Explicit subcommands, one per borg operation.
#[derive(clap::Subcommand, Debug, PartialEq, Eq)]
pub enum Subcommand {
    /// Create the repository for this profile (`borg init`).
    Init,

    /// Create an archive, then apply the retention policy.
    Backup {
        /// Skip the `prune` and `compact` steps.
        ///
        /// All archives are kept; no space is reclaimed.
        #[arg(long)]
        no_prune: bool,
    },

    /// List archives, or the contents of one archive.
    List {
        /// Archive to list; omit to list the repository.
        archive: Option<String>,
    },

    /// Show repository or archive statistics.
    Info {
        /// Archive name or `latest`; omit for the repository.
        archive: Option<String>,
    },

    /// Delete one archive from the repository.
    Delete {
        /// Archive to delete.
        archive: String,
    },

    /// Extract an archive into a target directory.
    Restore {
        /// Archive name or `latest`.
        archive: String,

        /// Directory to extract into.  Created if missing.
        #[arg(short, long, default_value = ".")]
        target: PathBuf,

        /// Restrict extraction to these paths inside the archive.
        paths: Vec<String>,
    },

    /// Check repository and archive consistency (`borg check`).
    Verify {
        /// Also read and verify every data chunk.  Slow.
        #[arg(long)]
        verify_data: bool,
    },

    /// Mount the repository, or one archive, as a FUSE filesystem.
    Mount {
        /// Directory to mount on.  Created if missing.
        mountpoint: PathBuf,

        /// Archive name or `latest`; omit to mount the whole repository.
        archive: Option<String>,
    },

    /// Unmount a previously mounted repository or archive.
    Umount {
        /// Directory the repository is mounted on.
        mountpoint: PathBuf,
    },

    /// Repair repository inconsistencies (`borg check --repair`).
    Repair,

    /// Write a starter `<profile>.toml` into the configuration directory.
    ///
    /// Refuses to overwrite an existing profile unless `--force` is given.
    NewProfile {
        /// Overwrite an existing profile.
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("borgctl").chain(extra.iter().copied()))
    }

    #[test]
    fn defaults_apply_without_flags() {
        let cli = parse(&["init"]);
        assert_eq!(cli.command, Some(Subcommand::Init));
        assert!(!cli.dry_run);
        assert!(!cli.print_config);
    }

    #[test]
    fn backup_no_prune_flag() {
        let cli = parse(&["backup", "--no-prune"]);
        assert_eq!(cli.command, Some(Subcommand::Backup { no_prune: true }));
    }

    #[test]
    fn restore_collects_paths() {
        let cli = parse(&["restore", "latest", "--target", "/tmp/out", "etc/hosts", "etc/fstab"]);
        assert_eq!(
            cli.command,
            Some(Subcommand::Restore {
                archive: "latest".into(),
                target: "/tmp/out".into(),
                paths: vec!["etc/hosts".into(), "etc/fstab".into()],
            })
        );
    }

    #[test]
    fn verbose_is_counted() {
        let cli = parse(&["-vv", "list"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn delete_requires_archive() {
        let result = Cli::try_parse_from(["borgctl", "delete"]);
        assert!(result.is_err());
    }
}
