use crate::types::{Entrypoint, PackageSpec, ProjectName, PythonVersion};
use crate::validate::{validate_manifest, ValidationError};
use serde::Serialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Entrypoint written by a freshly declared project.
pub const DEFAULT_ENTRYPOINT: &str = "python main.py";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("invalid manifest: {0}")]
    Invalid(#[from] ValidationError),
    #[error("failed to render manifest: {0}")]
    Render(#[from] toml::ser::Error),
}

/// A validated `IronGantryfile`.
///
/// Only [`validate_manifest`] constructs one from untrusted input; the fields are
/// already normalized newtypes, so re-validating the rendered form yields an
/// identical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub project: ProjectName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python: Option<PythonVersion>,
    pub packages: Vec<PackageSpec>,
    pub entrypoint: Entrypoint,
}

impl Manifest {
    /// The manifest written for a newly declared project: no packages and the
    /// default `python main.py` entrypoint.
    pub fn declared(project: ProjectName, python: Option<PythonVersion>) -> Self {
        Self {
            project,
            python,
            packages: Vec::new(),
            entrypoint: Entrypoint::new(DEFAULT_ENTRYPOINT),
        }
    }

    pub fn to_value(&self) -> Result<toml::Value, ManifestError> {
        Ok(toml::Value::try_from(self)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ManifestError> {
        Ok(toml::to_string(self)?)
    }
}

pub fn parse_manifest_str(input: &str) -> Result<Manifest, ManifestError> {
    let table: toml::Table = toml::from_str(input)?;
    Ok(validate_manifest(&toml::Value::Table(table))?)
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<Manifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}
