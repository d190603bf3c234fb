//! `borgctl new-profile`: scaffold `<config-dir>/<profile>.toml`.
//!
//! The generated file is pre-populated with sensible defaults:
//! - `[host].name` is left commented out so the system host name is used.
//! - `[repo].base` points at `/var/backups/borg`, giving `<base>/<host>`.
//! - Common system paths are listed as sources and cache directories excluded.
//!
//! Refuses to overwrite an existing profile unless `--force` is given.

use std::path::Path;

use anyhow::{Context, anyhow};
use console::style;
use tracing::info;

use crate::{
    config::{profile_path, validate_profile_name},
    error::Error,
    profile::system_hostname,
};

const TEMPLATE: &str = r#"# borgctl profile "{profile}"
#
# Repository: <[repo].base>/<host> unless [repo].path is set.
# Archives:   <host>-<timestamp>; pruning only touches <host>-*.

[host]
# name = "{host}"

[repo]
base       = "/var/backups/borg"
# path     = "ssh://backup@nas.lan/./{host}"
passphrase = ""
encryption = "repokey-blake2"
# rsh      = "ssh -i /root/.ssh/borg_ed25519"

[backup]
sources            = ["/etc", "/home", "/root"]
excludes           = ["/home/*/.cache", "*.pyc"]
exclude_if_present = ".nobackup"
exclude_caches     = true
one_file_system    = true
compression        = "lz4"

[retention]
daily   = 7
weekly  = 4
monthly = 6
compact = true
"#;

/// Render the starter profile for `profile` on `host`.
pub fn render(profile: &str, host: &str) -> String {
    TEMPLATE
        .replace("{profile}", profile)
        .replace("{host}", host)
}

pub fn run(config_dir: &Path, profile: &str, force: bool) -> Result<(), Error> {
    validate_profile_name(profile)?;

    let path = profile_path(config_dir, profile);
    if path.exists() && !force {
        return Err(anyhow!(
            "{} already exists; refusing to overwrite (use --force)",
            path.display()
        )
        .into());
    }

    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating {}", config_dir.display()))?;
    std::fs::write(&path, render(profile, &system_hostname()))
        .with_context(|| format!("writing {}", path.display()))?;

    info!(path = %path.display(), "wrote starter profile");
    println!(
        "  {}  {} {}",
        style("✓").green().bold(),
        style("Created").bold(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        config::{PartialConfig, load_profile},
        profile::Profile,
    };

    const NO_ENV: [(&str, &str); 0] = [];

    #[test]
    fn rendered_template_is_a_valid_profile() {
        let text = render("web", "web01");
        let layer: PartialConfig = toml::from_str(&text).expect("template must be valid TOML");
        let p = Profile::resolve_with("web", layer.resolve(), || "web01".into());
        assert_eq!(p.repository, "/var/backups/borg/web01");
        assert!(!p.config.backup.sources.is_empty());
        assert!(p.config.retention.keeps_anything());
    }

    #[test]
    fn rendered_template_mentions_profile_and_host() {
        let text = render("web", "web01");
        assert!(text.contains("\"web\""));
        assert!(text.contains("# name = \"web01\""));
    }

    #[test]
    fn writes_profile_into_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("etc").join("borgctl");
        run(&config_dir, "web", false).unwrap();
        assert!(config_dir.join("web.toml").exists());
        assert!(load_profile(&config_dir, "web", NO_ENV).is_ok());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("web.toml");
        fs::write(&path, "# existing").unwrap();

        let err = run(dir.path(), "web", false).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# existing");
    }

    #[test]
    fn force_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("web.toml");
        fs::write(&path, "# existing").unwrap();

        run(dir.path(), "web", true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[repo]"));
    }

    #[test]
    fn rejects_bad_profile_names() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(run(dir.path(), "../escape", false).unwrap_err().exit_code(), 2);
    }
}
