pub mod build;
pub mod init;
pub mod run;
pub mod ship;
pub mod version;

use indicatif::{ProgressBar, ProgressStyle};
use irongantry_core::{CoreError, ErrorKind};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_COLLABORATOR_ERROR: u8 = 3;

/// An error on its way out of the process: what to print and how to exit.
#[derive(Debug)]
pub struct CommandError {
    pub message: String,
    pub exit_code: u8,
}

impl CommandError {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: EXIT_FAILURE,
        }
    }
}

pub fn exit_code_for(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::InvalidInput => EXIT_MANIFEST_ERROR,
        ErrorKind::CollaboratorFailure => EXIT_COLLABORATOR_ERROR,
        ErrorKind::NotFound | ErrorKind::AlreadyExists | ErrorKind::Io => EXIT_FAILURE,
    }
}

impl From<CoreError> for CommandError {
    fn from(e: CoreError) -> Self {
        Self {
            exit_code: exit_code_for(e.kind()),
            message: e.to_string(),
        }
    }
}

/// Exit status for a finished entrypoint; signals and out-of-range codes map to failure.
pub fn forwarded_exit_code(code: Option<i32>) -> u8 {
    code.and_then(|c| u8::try_from(c).ok()).unwrap_or(EXIT_FAILURE)
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, CommandError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CommandError::failure(format!("JSON serialization failed: {e}")))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

/// Run `op` behind a spinner unless JSON output was requested.
pub fn with_spinner<T>(
    json: bool,
    working: &str,
    done: &str,
    failed: &str,
    op: impl FnOnce() -> Result<T, CoreError>,
) -> Result<T, CoreError> {
    let pb = if json { None } else { Some(spinner(working)) };
    let result = op();
    if let Some(ref pb) = pb {
        match &result {
            Ok(_) => spin_ok(pb, done),
            Err(_) => spin_fail(pb, failed),
        }
    }
    result
}

pub fn highlight(text: &str) -> String {
    console::Style::new().bold().apply_to(text).to_string()
}
