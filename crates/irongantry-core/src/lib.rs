//! Lifecycle engine for IronGantry projects.
//!
//! The `Engine` turns a validated manifest into filesystem operations and
//! argument vectors: declaring a project, materializing its environment,
//! executing its entrypoint inside that environment, and exporting a
//! self-bootstrapping archive. Every operation re-reads and re-validates the
//! manifest; environment creation, process execution, and archive writing are
//! delegated to the collaborators in `irongantry-runtime`.

pub mod command;
pub mod config;
pub mod engine;
pub mod export;

pub use config::{EngineConfig, DEFAULT_ENV_DIR, DEFAULT_MANIFEST_FILE};
pub use engine::{Declared, Engine, Executed, Exported, Materialized};

use irongantry_runtime::{ProcessExit, RuntimeError};
use irongantry_schema::{ManifestError, ValidationError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("manifest not found: {}\nRun 'irongantry init' first.", .0.display())]
    ManifestNotFound(PathBuf),
    #[error("{} already exists. Remove it first if you want to reinitialize.", .0.display())]
    ManifestExists(PathBuf),
    #[error("environment interpreter not found at {}\nRun 'irongantry build' first.", .0.display())]
    EnvironmentMissing(PathBuf),
    #[error("environment at {} has no interpreter after creation", .0.display())]
    EnvironmentIncomplete(PathBuf),
    #[error("package installer failed with {0}")]
    InstallerFailed(ProcessExit),
    #[error("path cannot be used in PATH: {0}")]
    UnusablePath(String),
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`CoreError`], used at the CLI boundary to pick
/// an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Schema or grammar violation; fixed by editing the manifest or argument.
    InvalidInput,
    /// An expected file is missing; fixed by running a prerequisite command.
    NotFound,
    /// Declaring over an existing manifest.
    AlreadyExists,
    /// Environment creation or package installation failed.
    CollaboratorFailure,
    Io,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Manifest(ManifestError::Io(_)) | Self::Io(_) => ErrorKind::Io,
            Self::Manifest(_) | Self::Validation(_) | Self::UnusablePath(_) => {
                ErrorKind::InvalidInput
            }
            Self::ManifestNotFound(_) | Self::EnvironmentMissing(_) => ErrorKind::NotFound,
            Self::ManifestExists(_) => ErrorKind::AlreadyExists,
            Self::EnvironmentIncomplete(_) | Self::InstallerFailed(_) => {
                ErrorKind::CollaboratorFailure
            }
            Self::Runtime(e) => match e {
                RuntimeError::Io(_) | RuntimeError::Archive(_) => ErrorKind::Io,
                RuntimeError::InvalidArchivePath(_) => ErrorKind::InvalidInput,
                _ => ErrorKind::CollaboratorFailure,
            },
        }
    }
}
