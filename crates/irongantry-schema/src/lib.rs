//! Manifest schema and input validation for IronGantry.
//!
//! This crate is the validator layer: pure, allow-list based checks for every
//! piece of user-editable data (project name, package specifier, entrypoint,
//! interpreter version), the validated [`Manifest`] record, and TOML
//! parsing/rendering of the `IronGantryfile`. Nothing here touches the
//! filesystem except [`parse_manifest_file`].

pub mod manifest;
pub mod types;
pub mod validate;

pub use manifest::{
    parse_manifest_file, parse_manifest_str, Manifest, ManifestError, DEFAULT_ENTRYPOINT,
};
pub use types::{Entrypoint, PackageSpec, ProjectName, PythonVersion};
pub use validate::{
    validate_entrypoint, validate_manifest, validate_package, validate_project_name,
    validate_python_version, ValidationError, ALLOWED_INTERPRETERS, ALLOWED_MANIFEST_KEYS,
};
