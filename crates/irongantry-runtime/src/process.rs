use crate::RuntimeError;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// An argument vector plus the context it runs in.
///
/// The first element is the program; every other element reaches the child
/// verbatim as exactly one argument. No shell is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub argv: Vec<OsString>,
    /// Complete environment for the child. `None` inherits the parent's.
    pub env: Option<BTreeMap<OsString, OsString>>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(argv: Vec<OsString>) -> Self {
        Self {
            argv,
            env: None,
            current_dir: None,
        }
    }

    #[must_use]
    pub fn with_env(mut self, env: BTreeMap<OsString, OsString>) -> Self {
        self.env = Some(env);
        self
    }

    #[must_use]
    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Lossy single-line rendering for logs. Never executed.
    pub fn display(&self) -> String {
        self.argv
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit status of a finished child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl std::fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {code}"),
            None => f.write_str("termination by signal"),
        }
    }
}

pub trait ProcessRunner: Send + Sync {
    /// Run the command to completion and report its exit status.
    ///
    /// A non-zero exit is not an error at this layer; callers decide.
    fn run(&self, spec: &CommandSpec) -> Result<ProcessExit, RuntimeError>;
}

/// Runs commands on the host with inherited stdio and no timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<ProcessExit, RuntimeError> {
        let (program, args) = spec.argv.split_first().ok_or(RuntimeError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(env) = &spec.env {
            cmd.env_clear().envs(env);
        }
        if let Some(dir) = &spec.current_dir {
            cmd.current_dir(dir);
        }

        debug!("exec: {}", spec.display());
        let status = cmd.status().map_err(|source| RuntimeError::Spawn {
            program: program.to_string_lossy().into_owned(),
            source,
        })?;
        Ok(ProcessExit {
            code: status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_argv_is_rejected() {
        let err = SystemRunner.run(&CommandSpec::new(Vec::new())).unwrap_err();
        assert!(matches!(err, RuntimeError::EmptyCommand));
    }

    #[test]
    fn missing_program_reports_spawn_error() {
        let spec = CommandSpec::new(vec![OsString::from(
            "/nonexistent/irongantry-test-binary",
        )]);
        let err = SystemRunner.run(&spec).unwrap_err();
        assert!(matches!(err, RuntimeError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn arguments_are_not_shell_interpreted() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("pwned");
        let spec = CommandSpec::new(vec![
            OsString::from("echo"),
            OsString::from(format!("; touch {}", marker.display())),
        ]);
        let exit = SystemRunner.run(&spec).unwrap();
        assert!(exit.success());
        assert!(!marker.exists());
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_reported_not_raised() {
        let spec = CommandSpec::new(vec![OsString::from("false")]);
        let exit = SystemRunner.run(&spec).unwrap();
        assert!(!exit.success());
        assert_eq!(exit.code, Some(1));
    }

    #[cfg(unix)]
    #[test]
    fn explicit_env_replaces_inherited_env() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("env.txt");
        let mut env = BTreeMap::new();
        env.insert(OsString::from("ONLY_VAR"), OsString::from("present"));
        env.insert(OsString::from("PATH"), OsString::from("/usr/bin:/bin"));
        let spec = CommandSpec::new(vec![
            OsString::from("/bin/sh"),
            OsString::from("-c"),
            OsString::from(format!("env > '{}'", out.display())),
        ])
        .with_env(env);
        assert!(SystemRunner.run(&spec).unwrap().success());
        let captured = std::fs::read_to_string(&out).unwrap();
        assert!(captured.contains("ONLY_VAR=present"));
        assert!(!captured.contains("CARGO_PKG_NAME="));
    }

    #[test]
    fn exit_display() {
        assert_eq!(ProcessExit::from_code(3).to_string(), "exit status 3");
        assert_eq!(
            ProcessExit { code: None }.to_string(),
            "termination by signal"
        );
    }
}
