//! External collaborators for the IronGantry lifecycle engine.
//!
//! This crate implements the narrow interfaces the engine delegates to:
//! creating an isolated interpreter environment (`EnvironmentBuilder`),
//! executing an argument vector without a shell (`ProcessRunner`), and writing
//! a compressed archive (`ArchiveWriter`). It also knows the platform layout of
//! an environment directory, how to find a host interpreter, and ships a
//! recording mock backend for tests.

pub mod archive;
pub mod backend;
pub mod environment;
pub mod layout;
pub mod mock;
pub mod prereq;
pub mod process;

pub use archive::{ArchiveWriter, ZipArchiveWriter};
pub use backend::{select_backend, Backend};
pub use environment::{EnvironmentBuilder, VenvBuilder};
pub use layout::EnvLayout;
pub use mock::{Invocation, MockBackend};
pub use prereq::{check_python_prereqs, format_missing, MissingPrereq};
pub use process::{CommandSpec, ProcessExit, ProcessRunner, SystemRunner};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend '{0}' is not available")]
    BackendUnavailable(String),
    #[error("no Python interpreter found on PATH (tried: {0})")]
    InterpreterNotFound(String),
    #[error("interpreter reported an unusable version: {0}")]
    InterpreterVersion(#[from] irongantry_schema::ValidationError),
    #[error("environment creation failed: {0}")]
    EnvCreationFailed(String),
    #[error("refusing to execute an empty argument vector")]
    EmptyCommand,
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("archive entry name not allowed: '{0}'")]
    InvalidArchivePath(String),
    #[error("runtime execution failed: {0}")]
    ExecFailed(String),
}
