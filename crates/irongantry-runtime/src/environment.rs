use crate::layout::EnvLayout;
use crate::RuntimeError;
use irongantry_schema::{validate_python_version, PythonVersion};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Interpreter names probed on `PATH`, in order, when no version is pinned.
const HOST_INTERPRETERS: [&str; 2] = ["python3", "python"];

const VERSION_PROBE: &str = "import sys; print('%d.%d' % sys.version_info[:2])";

pub trait EnvironmentBuilder: Send + Sync {
    fn name(&self) -> &str;

    /// `major.minor` of the interpreter new environments are created from.
    fn host_version(&self) -> Result<PythonVersion, RuntimeError>;

    /// Create a fresh environment at `env.root()`, which must not exist yet.
    ///
    /// `python` is the version the manifest pins, if any.
    fn create(&self, env: &EnvLayout, python: Option<&PythonVersion>)
        -> Result<(), RuntimeError>;
}

/// Creates environments with the host interpreter's `venv` module.
#[derive(Debug, Default, Clone)]
pub struct VenvBuilder;

impl VenvBuilder {
    pub fn new() -> Self {
        Self
    }

    fn default_interpreter() -> Result<PathBuf, RuntimeError> {
        HOST_INTERPRETERS
            .iter()
            .find_map(|name| which::which(name).ok())
            .ok_or_else(|| RuntimeError::InterpreterNotFound(HOST_INTERPRETERS.join(", ")))
    }

    /// Prefer `pythonX.Y` when a version is pinned, else the default interpreter.
    fn interpreter_for(python: Option<&PythonVersion>) -> Result<PathBuf, RuntimeError> {
        if let Some(version) = python {
            let pinned = format!("python{version}");
            if let Ok(path) = which::which(&pinned) {
                debug!("using pinned interpreter {}", path.display());
                return Ok(path);
            }
            let fallback = Self::default_interpreter()?;
            match probe_version(&fallback) {
                Ok(found) if found == *version => {}
                Ok(found) => warn!(
                    "{pinned} not found on PATH; falling back to {} (Python {found})",
                    fallback.display()
                ),
                Err(e) => warn!(
                    "{pinned} not found on PATH; falling back to {} (version unknown: {e})",
                    fallback.display()
                ),
            }
            return Ok(fallback);
        }
        Self::default_interpreter()
    }
}

fn probe_version(interpreter: &Path) -> Result<PythonVersion, RuntimeError> {
    let output = Command::new(interpreter)
        .args(["-c", VERSION_PROBE])
        .output()
        .map_err(|source| RuntimeError::Spawn {
            program: interpreter.to_string_lossy().into_owned(),
            source,
        })?;
    if !output.status.success() {
        return Err(RuntimeError::ExecFailed(format!(
            "version probe of {} failed: {}",
            interpreter.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(validate_python_version(&String::from_utf8_lossy(
        &output.stdout,
    ))?)
}

impl EnvironmentBuilder for VenvBuilder {
    fn name(&self) -> &'static str {
        "venv"
    }

    fn host_version(&self) -> Result<PythonVersion, RuntimeError> {
        probe_version(&Self::default_interpreter()?)
    }

    fn create(
        &self,
        env: &EnvLayout,
        python: Option<&PythonVersion>,
    ) -> Result<(), RuntimeError> {
        let interpreter = Self::interpreter_for(python)?;
        info!(
            "creating environment at {} with {}",
            env.root().display(),
            interpreter.display()
        );

        let output = Command::new(&interpreter)
            .args(["-m", "venv", "--clear"])
            .arg(env.root())
            .output()
            .map_err(|source| RuntimeError::Spawn {
                program: interpreter.to_string_lossy().into_owned(),
                source,
            })?;
        if !output.status.success() {
            return Err(RuntimeError::EnvCreationFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_of_missing_interpreter_is_spawn_error() {
        let err = probe_version(Path::new("/nonexistent/python3")).unwrap_err();
        assert!(matches!(err, RuntimeError::Spawn { .. }));
    }

    #[test]
    fn host_version_is_major_minor_when_python_present() {
        if VenvBuilder::default_interpreter().is_err() {
            eprintln!("skipping: no host python");
            return;
        }
        let version = VenvBuilder::new().host_version().unwrap();
        assert!(version.contains('.'));
    }
}
