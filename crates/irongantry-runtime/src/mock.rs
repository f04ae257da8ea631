use crate::environment::EnvironmentBuilder;
use crate::layout::EnvLayout;
use crate::process::{CommandSpec, ProcessExit, ProcessRunner};
use crate::RuntimeError;
use irongantry_schema::{validate_python_version, PythonVersion};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// File the mock installer appends installed requirements to, inside the env root.
pub const MOCK_INSTALL_LOG: &str = "mock-installed.txt";

/// One call the engine made into a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    CreateEnv {
        root: std::path::PathBuf,
        python: Option<String>,
    },
    Run(CommandSpec),
}

#[derive(Debug)]
struct MockState {
    invocations: Vec<Invocation>,
    exit_code: i32,
    installer_exit_code: i32,
    host_version: Option<String>,
    echo: bool,
}

/// Recording stand-in for both the environment builder and the process runner.
///
/// Clones share state, so a test can keep one handle and give another to the
/// engine. Created environments contain placeholder `python`/`pip` files;
/// installer runs append their requirements to [`MOCK_INSTALL_LOG`] so
/// rebuild behavior is observable on disk.
#[derive(Debug, Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                invocations: Vec::new(),
                exit_code: 0,
                installer_exit_code: 0,
                host_version: Some("3.12".to_owned()),
                echo: false,
            })),
        }
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit code reported for entrypoint runs.
    #[must_use]
    pub fn with_exit_code(self, code: i32) -> Self {
        if let Ok(mut s) = self.state.lock() {
            s.exit_code = code;
        }
        self
    }

    /// Exit code reported for installer runs (`<pip> install ...`).
    #[must_use]
    pub fn with_installer_exit_code(self, code: i32) -> Self {
        if let Ok(mut s) = self.state.lock() {
            s.installer_exit_code = code;
        }
        self
    }

    /// `None` simulates a host without a usable interpreter.
    #[must_use]
    pub fn with_host_version(self, version: Option<&str>) -> Self {
        if let Ok(mut s) = self.state.lock() {
            s.host_version = version.map(str::to_owned);
        }
        self
    }

    /// Print `mock-exec: <argv>` to stderr for every run, for subprocess tests.
    #[must_use]
    pub fn echoing(self) -> Self {
        if let Ok(mut s) = self.state.lock() {
            s.echo = true;
        }
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, MockState>, RuntimeError> {
        self.state
            .lock()
            .map_err(|e| RuntimeError::ExecFailed(format!("mutex poisoned: {e}")))
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.lock().map(|s| s.invocations.clone()).unwrap_or_default()
    }

    /// Only the process runs, in order.
    pub fn commands(&self) -> Vec<CommandSpec> {
        self.invocations()
            .into_iter()
            .filter_map(|i| match i {
                Invocation::Run(spec) => Some(spec),
                Invocation::CreateEnv { .. } => None,
            })
            .collect()
    }
}

fn is_install(spec: &CommandSpec) -> bool {
    spec.argv.get(1).is_some_and(|a| a == "install")
}

impl EnvironmentBuilder for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn host_version(&self) -> Result<PythonVersion, RuntimeError> {
        let version = self
            .lock()?
            .host_version
            .clone()
            .ok_or_else(|| RuntimeError::InterpreterNotFound("mock".to_owned()))?;
        Ok(validate_python_version(&version)?)
    }

    fn create(&self, env: &EnvLayout, python: Option<&PythonVersion>) -> Result<(), RuntimeError> {
        self.lock()?.invocations.push(Invocation::CreateEnv {
            root: env.root().to_path_buf(),
            python: python.map(|v| v.as_str().to_owned()),
        });

        std::fs::create_dir_all(env.bin_dir())?;
        std::fs::write(env.python_path(), "mock interpreter\n")?;
        std::fs::write(env.pip_path(), "mock installer\n")?;
        Ok(())
    }
}

impl ProcessRunner for MockBackend {
    fn run(&self, spec: &CommandSpec) -> Result<ProcessExit, RuntimeError> {
        if spec.argv.is_empty() {
            return Err(RuntimeError::EmptyCommand);
        }
        let (exit_code, installer_exit_code, echo) = {
            let mut state = self.lock()?;
            state.invocations.push(Invocation::Run(spec.clone()));
            (state.exit_code, state.installer_exit_code, state.echo)
        };

        if echo {
            eprintln!("mock-exec: {}", spec.display());
        }

        if is_install(spec) {
            if installer_exit_code == 0 {
                record_install(spec)?;
            }
            return Ok(ProcessExit::from_code(installer_exit_code));
        }
        Ok(ProcessExit::from_code(exit_code))
    }
}

/// `<env>/bin/pip install -- a b` appends `a` and `b` to `<env>/mock-installed.txt`.
fn record_install(spec: &CommandSpec) -> Result<(), RuntimeError> {
    let Some(env_root) = Path::new(&spec.argv[0]).parent().and_then(Path::parent) else {
        return Ok(());
    };
    if !env_root.is_dir() {
        return Ok(());
    }
    let mut log = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(env_root.join(MOCK_INSTALL_LOG))?;
    for pkg in spec.argv.iter().skip(2).filter(|a| *a != "--") {
        writeln!(log, "{}", pkg.to_string_lossy())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn create_lays_out_placeholder_binaries() {
        let dir = tempfile::tempdir().unwrap();
        let layout = EnvLayout::new(dir.path().join("env"));
        let mock = MockBackend::new();
        mock.create(&layout, None).unwrap();
        assert!(layout.is_materialized());
        assert!(layout.pip_path().is_file());
        assert_eq!(mock.invocations().len(), 1);
    }

    #[test]
    fn install_runs_are_logged_inside_env() {
        let dir = tempfile::tempdir().unwrap();
        let layout = EnvLayout::new(dir.path().join("env"));
        let mock = MockBackend::new();
        mock.create(&layout, None).unwrap();

        let spec = CommandSpec::new(vec![
            layout.pip_path().into_os_string(),
            OsString::from("install"),
            OsString::from("--"),
            OsString::from("requests"),
        ]);
        assert!(mock.run(&spec).unwrap().success());
        let log = std::fs::read_to_string(layout.root().join(MOCK_INSTALL_LOG)).unwrap();
        assert_eq!(log, "requests\n");
        assert_eq!(mock.commands(), vec![spec]);
    }

    #[test]
    fn configured_exit_codes_are_reported() {
        let mock = MockBackend::new()
            .with_exit_code(7)
            .with_installer_exit_code(2);
        let run = CommandSpec::new(vec![OsString::from("python"), OsString::from("x.py")]);
        assert_eq!(mock.run(&run).unwrap().code, Some(7));
        let install = CommandSpec::new(vec![
            OsString::from("/nowhere/bin/pip"),
            OsString::from("install"),
        ]);
        assert_eq!(mock.run(&install).unwrap().code, Some(2));
    }

    #[test]
    fn host_version_can_be_absent() {
        let mock = MockBackend::new().with_host_version(None);
        assert!(mock.host_version().is_err());
        assert_eq!(MockBackend::new().host_version().unwrap(), "3.12");
    }
}
