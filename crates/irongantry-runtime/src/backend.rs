use crate::environment::{EnvironmentBuilder, VenvBuilder};
use crate::mock::MockBackend;
use crate::process::{ProcessRunner, SystemRunner};
use crate::RuntimeError;

/// The pair of collaborators the engine drives: one that creates
/// environments and one that runs processes.
pub struct Backend {
    pub environments: Box<dyn EnvironmentBuilder>,
    pub processes: Box<dyn ProcessRunner>,
}

impl Backend {
    /// Host `venv` plus direct process execution.
    pub fn system() -> Self {
        Self {
            environments: Box::new(VenvBuilder::new()),
            processes: Box::new(SystemRunner),
        }
    }

    pub fn mock(mock: &MockBackend) -> Self {
        Self {
            environments: Box::new(mock.clone()),
            processes: Box::new(mock.clone()),
        }
    }

    pub fn name(&self) -> &str {
        self.environments.name()
    }
}

pub fn select_backend(name: &str) -> Result<Backend, RuntimeError> {
    match name {
        "system" | "venv" => Ok(Backend::system()),
        "mock" => Ok(Backend::mock(&MockBackend::new())),
        other => Err(RuntimeError::BackendUnavailable(other.to_owned())),
    }
}
