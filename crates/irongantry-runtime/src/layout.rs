use std::path::{Path, PathBuf};

#[cfg(windows)]
const BIN_DIR: &str = "Scripts";
#[cfg(windows)]
const PYTHON_BIN: &str = "python.exe";
#[cfg(windows)]
const PIP_BIN: &str = "pip.exe";

#[cfg(not(windows))]
const BIN_DIR: &str = "bin";
#[cfg(not(windows))]
const PYTHON_BIN: &str = "python";
#[cfg(not(windows))]
const PIP_BIN: &str = "pip";

/// Directory layout of an isolated interpreter environment.
///
/// The interpreter and installer live at fixed, platform-dependent subpaths
/// (`bin/python`, `bin/pip` on POSIX; `Scripts\python.exe`, `Scripts\pip.exe`
/// on Windows). Paths are only as absolute as the root handed to [`new`](Self::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvLayout {
    root: PathBuf,
}

impl EnvLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding executables; prepended to `PATH` for the entrypoint.
    #[inline]
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join(BIN_DIR)
    }

    #[inline]
    pub fn python_path(&self) -> PathBuf {
        self.bin_dir().join(PYTHON_BIN)
    }

    #[inline]
    pub fn pip_path(&self) -> PathBuf {
        self.bin_dir().join(PIP_BIN)
    }

    /// True when the environment's interpreter binary is present.
    pub fn is_materialized(&self) -> bool {
        self.python_path().is_file()
    }
}
