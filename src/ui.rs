//! Terminal UI: spinners, stage lines, and captured command output.
//!
//! # Design goals
//!
//! - **Clean by default.** While a captured stage is running the user sees only a spinner and a
//!   short label.  Raw borg output is buffered and hidden.
//! - **Informative on failure.** If a stage exits non-zero its captured stdout *and* stderr are
//!   printed in full so the operator can diagnose the problem without re-running manually.
//! - **Attached when the output is the point.** `list`, `info`, `restore` and `mount` inherit the
//!   terminal via [`run_attached`]; nothing is buffered.

use std::{
    process::{Command, Stdio},
    time::Duration,
};

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::runner::Invocation;

// ─── Icons ───────────────────────────────────────────────────────────────────

/// Braille spinner frames, same style as indicatif's default.
static SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

fn icon_ok() -> console::StyledObject<&'static str> {
    style("✓").green().bold()
}
fn icon_warn() -> console::StyledObject<&'static str> {
    style("!").yellow().bold()
}
fn icon_err() -> console::StyledObject<&'static str> {
    style("✗").red().bold()
}
fn icon_done() -> console::StyledObject<&'static str> {
    style("✓").cyan().bold()
}

// ─── Stage result ─────────────────────────────────────────────────────────────

/// The outcome of a single borg call.
///
/// Carries the stage label plus whatever the command wrote to stdout/stderr so
/// it can be replayed to the terminal when something goes wrong.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    /// Human-readable stage label, e.g. `"Prune"`.
    pub label: String,
    /// Whether the stage completed without error.
    pub success: bool,
    /// Exit status of the process, `None` if it never ran or was killed.
    pub code: Option<i32>,
    /// Captured stdout; always empty for attached stages.
    pub stdout: String,
    /// Captured stderr; always empty for attached stages.
    pub stderr: String,
    /// Error message, if any.
    pub error: Option<String>,
}

impl StageOutcome {
    fn from_run(label: &str, inv: &Invocation, result: Result<(Option<i32>, String, String)>) -> Self {
        match result {
            Ok((Some(0), stdout, stderr)) => Self {
                label: label.to_string(),
                success: true,
                code: Some(0),
                stdout,
                stderr,
                error: None,
            },
            Ok((code, stdout, stderr)) => Self {
                label: label.to_string(),
                success: false,
                code,
                stdout,
                stderr,
                error: Some(match code {
                    Some(c) => format!("exited with status {c}: {inv}"),
                    None => format!("terminated by signal: {inv}"),
                }),
            },
            Err(e) => Self {
                label: label.to_string(),
                success: false,
                code: None,
                stdout: String::new(),
                stderr: String::new(),
                error: Some(format!("{e:#}")),
            },
        }
    }

    /// Print the result line for this stage.
    ///
    /// A failure is followed by the error and whatever borg wrote, on stderr.
    pub fn print(&self) {
        let icon = if self.success { icon_ok() } else { icon_err() };
        println!("  {icon}  {}", style(&self.label).bold());
        if self.success {
            return;
        }
        if let Some(msg) = &self.error {
            eprintln!("\n  {} {msg}", style("Error:").red().bold());
        }
        replay("stdout", &self.stdout);
        replay("stderr", &self.stderr);
    }

    /// Result line for borg's "completed with warnings" status.
    pub fn print_warning(&self) {
        println!("  {}  {}", icon_warn(), style(&self.label).bold());
        replay("stderr", &self.stderr);
    }

    /// Returns `true` if the stage did not succeed.
    pub const fn failed(&self) -> bool {
        !self.success
    }

    /// Short reason for error messages.
    pub fn reason(&self) -> String {
        self.error.clone().unwrap_or_else(|| "unknown error".into())
    }
}

/// Echo captured borg output, indented under a heading.
fn replay(stream: &str, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    eprintln!("\n  {} borg {stream}:", style("►").dim());
    for line in text.lines() {
        eprintln!("    {line}");
    }
}

// ─── Spinner ──────────────────────────────────────────────────────────────────

/// Create and start an indeterminate spinner for `label`.
fn make_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner:.cyan}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(SPINNER_CHARS),
    );
    pb.set_message(format!("{}", style(label).dim()));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ─── Execution ────────────────────────────────────────────────────────────────

fn command(inv: &Invocation) -> Result<Command> {
    let (prog, rest) = inv
        .argv
        .split_first()
        .context("cannot run an empty command")?;
    let mut cmd = Command::new(prog);
    cmd.args(rest)
        .envs(inv.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    if let Some(dir) = &inv.cwd {
        cmd.current_dir(dir);
    }
    Ok(cmd)
}

/// Run a command, capturing both stdout and stderr.
///
/// Returns `(exit_code, stdout_text, stderr_text)`.
pub fn run_captured(inv: &Invocation) -> Result<(Option<i32>, String, String)> {
    debug!(command = %inv, "running captured");
    let output = command(inv)?
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("failed to spawn: {inv}"))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    Ok((output.status.code(), stdout, stderr))
}

/// Run a command with the terminal attached.
pub fn run_inherited(inv: &Invocation) -> Result<Option<i32>> {
    debug!(command = %inv, "running attached");
    let status = command(inv)?
        .status()
        .with_context(|| format!("failed to spawn: {inv}"))?;
    Ok(status.code())
}

// ─── High-level stage runners ─────────────────────────────────────────────────

/// Run a stage behind a spinner, returning a [`StageOutcome`].
///
/// The spinner is cleared before the outcome is returned, so the terminal
/// always shows a clean, static summary when the stage finishes.
pub fn run_stage(label: &str, inv: &Invocation) -> StageOutcome {
    let spinner = make_spinner(label);
    let result = run_captured(inv);
    spinner.finish_and_clear();
    StageOutcome::from_run(label, inv, result)
}

/// Run a stage with the terminal attached, returning a [`StageOutcome`] with
/// empty captured output.
pub fn run_attached(label: &str, inv: &Invocation) -> StageOutcome {
    let result = run_inherited(inv).map(|code| (code, String::new(), String::new()));
    StageOutcome::from_run(label, inv, result)
}

/// A synthetic success outcome, used for stages that did not actually run
/// (e.g. under `--dry-run`).
pub fn skipped_stage(label: &str) -> StageOutcome {
    StageOutcome {
        label: label.to_string(),
        success: true,
        code: None,
        stdout: String::new(),
        stderr: String::new(),
        error: None,
    }
}

/// Print a command instead of running it.
pub fn print_dry_run(inv: &Invocation) {
    println!("  {} {inv}", style("would run:").dim());
}

// ─── Summary banner ───────────────────────────────────────────────────────────

/// Print the final summary of a multi-stage command.
///
/// Shows a success banner when all stages passed, or a failure banner listing
/// the stages that failed.
pub fn print_summary(title: &str, outcomes: &[StageOutcome]) {
    let failed = failed_labels(outcomes);
    println!();
    if failed.is_empty() {
        println!(
            "  {} {}",
            icon_done(),
            style(format!("{title} completed successfully.")).cyan().bold()
        );
    } else {
        eprintln!("  {}  {}", icon_err(), style(format!("{title} failed.")).red().bold());
        for label in failed {
            eprintln!("    {} {}", icon_err(), style(label).red());
        }
    }
    println!();
}

/// Labels of the stages that failed, in run order.
fn failed_labels(outcomes: &[StageOutcome]) -> Vec<&str> {
    outcomes
        .iter()
        .filter(|o| o.failed())
        .map(|o| o.label.as_str())
        .collect()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn inv(argv: &[&str]) -> Invocation {
        Invocation {
            argv: argv.iter().map(|s| s.to_string()).collect(),
            env: vec![],
            cwd: None,
        }
    }

    fn sh(script: &str) -> Invocation {
        inv(&["sh", "-c", script])
    }

    // ── run_captured ─────────────────────────────────────────────────────────

    #[test]
    fn run_captured_reports_exit_code() {
        assert_eq!(run_captured(&inv(&["true"])).unwrap().0, Some(0));
        assert_eq!(run_captured(&sh("exit 3")).unwrap().0, Some(3));
    }

    #[test]
    fn run_captured_captures_both_streams() {
        let (code, out, err) = run_captured(&sh("echo hello; echo oops >&2")).unwrap();
        assert_eq!(code, Some(0));
        assert!(out.contains("hello"));
        assert!(err.contains("oops"));
    }

    #[test]
    fn run_captured_passes_env_and_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let mut i = sh("echo \"$BORGCTL_TEST_VAR\"; pwd");
        i.env.push(("BORGCTL_TEST_VAR".into(), "marker-42".into()));
        i.cwd = Some(dir.path().to_path_buf());
        let (_, out, _) = run_captured(&i).unwrap();
        assert!(out.contains("marker-42"));
        let canonical = dir.path().canonicalize().unwrap();
        assert!(out.contains(canonical.to_str().unwrap()));
    }

    #[test]
    fn run_captured_empty_args_errors() {
        assert!(run_captured(&inv(&[])).is_err());
    }

    #[test]
    fn run_captured_missing_binary_errors() {
        assert!(run_captured(&inv(&["/definitely/not/a/borg"])).is_err());
    }

    // ── run_stage ─────────────────────────────────────────────────────────────

    #[test]
    fn run_stage_success() {
        let o = run_stage("Test", &inv(&["true"]));
        assert!(o.success);
        assert_eq!(o.code, Some(0));
        assert_eq!(o.label, "Test");
        assert!(o.error.is_none());
    }

    #[test]
    fn run_stage_failure_keeps_output_and_code() {
        let o = run_stage("Test", &sh("echo bad output; exit 2"));
        assert!(o.failed());
        assert_eq!(o.code, Some(2));
        assert!(o.stdout.contains("bad output"));
        assert!(o.reason().contains("status 2"));
    }

    #[test]
    fn run_stage_spawn_failure_has_no_code() {
        let o = run_stage("Test", &inv(&["/definitely/not/a/borg"]));
        assert!(o.failed());
        assert_eq!(o.code, None);
        assert!(o.reason().contains("failed to spawn"));
    }

    #[test]
    fn run_attached_maps_exit_status() {
        assert!(run_attached("Ok", &inv(&["true"])).success);
        let o = run_attached("Bad", &sh("exit 4"));
        assert!(o.failed());
        assert_eq!(o.code, Some(4));
    }

    #[test]
    fn run_attached_honours_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let mut i = sh("touch created-here");
        i.cwd = Some(PathBuf::from(dir.path()));
        assert!(run_attached("Touch", &i).success);
        assert!(dir.path().join("created-here").exists());
    }

    // ── skipped_stage / summary ──────────────────────────────────────────────

    #[test]
    fn skipped_stage_is_success() {
        let o = skipped_stage("Prune");
        assert!(o.success);
        assert_eq!(o.code, None);
    }

    #[test]
    fn summary_lists_only_failed_stages() {
        let ok = skipped_stage("Create");
        let bad = run_stage("Prune", &inv(&["false"]));
        assert!(failed_labels(&[ok.clone()]).is_empty());
        assert_eq!(failed_labels(&[ok, bad.clone(), bad]), vec!["Prune", "Prune"]);
    }
}
