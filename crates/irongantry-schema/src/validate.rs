//! Allow-list validation for every user-supplied manifest value.
//!
//! Each validator accepts one untrusted value and returns either the
//! normalized, typed value or a [`ValidationError`]. Validators are pure.

use crate::manifest::Manifest;
use crate::types::{Entrypoint, PackageSpec, ProjectName, PythonVersion};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// The only keys a manifest may contain.
pub const ALLOWED_MANIFEST_KEYS: [&str; 4] = ["project", "python", "packages", "entrypoint"];

/// The only words an entrypoint may start with.
pub const ALLOWED_INTERPRETERS: [&str; 2] = ["python", "python3"];

static PROJECT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid project name regex"));

static PYTHON_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]+$").expect("valid python version regex"));

// name, optional [extras], optional comma-separated comparator clauses.
static PACKAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    const CLAUSE: &str = r"[ ]*(?:===|==|!=|~=|<=|>=|<|>)[ ]*[A-Za-z0-9.*+!_-]+";
    Regex::new(&format!(
        r"^[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?(?:\[[A-Za-z0-9._-]+(?:,[A-Za-z0-9._-]+)*\])?(?:{CLAUSE}(?:[ ]*,{CLAUSE})*)?[ ]*$"
    ))
    .expect("valid package regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("project name must be a non-empty string")]
    EmptyProjectName,
    #[error(
        "invalid project name '{0}': only letters, digits, underscores, and hyphens are allowed"
    )]
    InvalidProjectName(String),
    #[error("package specifier must be a non-empty string")]
    EmptyPackage,
    #[error("invalid package specifier '{0}'")]
    InvalidPackage(String),
    #[error("entrypoint must be a non-empty string")]
    EmptyEntrypoint,
    #[error("entrypoint must start with 'python' or 'python3', got '{0}'")]
    InvalidInterpreter(String),
    #[error("entrypoint has unbalanced quoting: '{0}'")]
    UnbalancedQuoting(String),
    #[error("python version must be a non-empty string")]
    EmptyPythonVersion,
    #[error("invalid python version '{0}': expected 'major.minor' (e.g. '3.12')")]
    InvalidPythonVersion(String),
    #[error("manifest must be a TOML table, not a bare value")]
    NotATable,
    #[error("unknown manifest keys: {}", .0.join(", "))]
    UnknownKeys(Vec<String>),
    #[error("manifest must contain a '{0}' key")]
    MissingKey(&'static str),
    #[error("'{0}' must be a string")]
    NotAString(&'static str),
    #[error("'packages' must be a list of strings")]
    PackagesNotList,
}

/// Validate a project name: letters, digits, underscores, and hyphens only.
///
/// The name is returned unchanged; surrounding whitespace is an error, not
/// something to strip.
pub fn validate_project_name(name: &str) -> Result<ProjectName, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyProjectName);
    }
    if !PROJECT_NAME_RE.is_match(name) {
        return Err(ValidationError::InvalidProjectName(name.to_owned()));
    }
    Ok(ProjectName::new(name))
}

/// Validate one installer requirement such as `requests`, `uvicorn[standard]`
/// or `django>=4.2,<5`.
pub fn validate_package(spec: &str) -> Result<PackageSpec, ValidationError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(ValidationError::EmptyPackage);
    }
    if !PACKAGE_RE.is_match(spec) {
        return Err(ValidationError::InvalidPackage(spec.to_owned()));
    }
    Ok(PackageSpec::new(spec))
}

/// Validate the entrypoint command line.
pub fn validate_entrypoint(entry: &str) -> Result<Entrypoint, ValidationError> {
    let entry = entry.trim();
    let Some(first) = entry.split_whitespace().next() else {
        return Err(ValidationError::EmptyEntrypoint);
    };
    if !ALLOWED_INTERPRETERS.contains(&first) {
        return Err(ValidationError::InvalidInterpreter(first.to_owned()));
    }
    if shlex::split(entry).is_none() {
        return Err(ValidationError::UnbalancedQuoting(entry.to_owned()));
    }
    Ok(Entrypoint::new(entry))
}

/// Validate an interpreter version of the form `major.minor`.
pub fn validate_python_version(version: &str) -> Result<PythonVersion, ValidationError> {
    let version = version.trim();
    if version.is_empty() {
        return Err(ValidationError::EmptyPythonVersion);
    }
    if !PYTHON_VERSION_RE.is_match(version) {
        return Err(ValidationError::InvalidPythonVersion(version.to_owned()));
    }
    Ok(PythonVersion::new(version))
}

/// Validate a parsed manifest document.
///
/// Fails closed: any key outside [`ALLOWED_MANIFEST_KEYS`] rejects the whole
/// manifest, even when every recognized field is valid.
pub fn validate_manifest(value: &toml::Value) -> Result<Manifest, ValidationError> {
    let table = value.as_table().ok_or(ValidationError::NotATable)?;

    let mut unknown: Vec<String> = table
        .keys()
        .filter(|k| !ALLOWED_MANIFEST_KEYS.contains(&k.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        unknown.sort();
        return Err(ValidationError::UnknownKeys(unknown));
    }

    let project = required_str(table, "project")?;
    let project = validate_project_name(project)?;

    let entrypoint = required_str(table, "entrypoint")?;
    let entrypoint = validate_entrypoint(entrypoint)?;

    let python = match table.get("python") {
        Some(v) => {
            let s = v.as_str().ok_or(ValidationError::NotAString("python"))?;
            Some(validate_python_version(s)?)
        }
        None => None,
    };

    let packages = match table.get("packages") {
        Some(v) => {
            let list = v.as_array().ok_or(ValidationError::PackagesNotList)?;
            list.iter()
                .map(|item| {
                    item.as_str()
                        .ok_or(ValidationError::PackagesNotList)
                        .and_then(validate_package)
                })
                .collect::<Result<Vec<_>, _>>()?
        }
        None => Vec::new(),
    };

    Ok(Manifest {
        project,
        python,
        packages,
        entrypoint,
    })
}

fn required_str<'a>(table: &'a toml::Table, key: &'static str) -> Result<&'a str, ValidationError> {
    table
        .get(key)
        .ok_or(ValidationError::MissingKey(key))?
        .as_str()
        .ok_or(ValidationError::NotAString(key))
}
