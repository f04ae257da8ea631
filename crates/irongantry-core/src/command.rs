//! Argument-vector and environment construction.
//!
//! Nothing in this module produces a command *string*: installer and
//! entrypoint invocations are built as vectors whose elements reach the child
//! process one-to-one.

use crate::CoreError;
use irongantry_runtime::EnvLayout;
use irongantry_schema::{Entrypoint, PackageSpec, ValidationError};
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

pub const VIRTUAL_ENV: &str = "VIRTUAL_ENV";
pub const PATH: &str = "PATH";

/// `[<installer>, "install", "--", <pkg>...]`.
///
/// The `--` is always present so no requirement can be read as an installer
/// option, whatever it starts with.
pub fn install_argv(installer: &Path, packages: &[PackageSpec]) -> Vec<OsString> {
    let mut argv = Vec::with_capacity(packages.len() + 3);
    argv.push(installer.as_os_str().to_owned());
    argv.push(OsString::from("install"));
    argv.push(OsString::from("--"));
    argv.extend(packages.iter().map(|p| OsString::from(p.as_str())));
    argv
}

/// Split the entrypoint with shell-word rules and replace the first word
/// (`python`/`python3`) with the environment's interpreter.
///
/// Only the first token is substituted, so an argument that merely contains
/// the word `python` is passed through untouched.
pub fn entrypoint_argv(entry: &Entrypoint, interpreter: &Path) -> Result<Vec<OsString>, CoreError> {
    let words = entry
        .words()
        .ok_or_else(|| ValidationError::UnbalancedQuoting(entry.as_str().to_owned()))?;
    let mut argv = Vec::with_capacity(words.len());
    argv.push(interpreter.as_os_str().to_owned());
    argv.extend(words.into_iter().skip(1).map(OsString::from));
    Ok(argv)
}

fn is_path_key(key: &OsStr) -> bool {
    if cfg!(windows) {
        key.to_str().is_some_and(|k| k.eq_ignore_ascii_case(PATH))
    } else {
        key == PATH
    }
}

/// Copy of `base` with `VIRTUAL_ENV` set to the environment root and the
/// environment's executable directory prepended to `PATH`.
pub fn entrypoint_env<I>(base: I, env: &EnvLayout) -> Result<BTreeMap<OsString, OsString>, CoreError>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut vars: BTreeMap<OsString, OsString> = base.into_iter().collect();

    let path_key = vars
        .keys()
        .find(|k| is_path_key(k))
        .cloned()
        .unwrap_or_else(|| OsString::from(PATH));
    let inherited = vars.remove(&path_key).unwrap_or_default();

    // Inherited entries are kept as-is, empty ones included.
    let bin_dir = env.bin_dir();
    let inherited_entries: Vec<PathBuf> = if inherited.is_empty() {
        Vec::new()
    } else {
        std::env::split_paths(&inherited).collect()
    };
    let joined = std::env::join_paths(std::iter::once(bin_dir.clone()).chain(inherited_entries))
        .map_err(|_| CoreError::UnusablePath(bin_dir.display().to_string()))?;

    vars.insert(path_key, joined);
    vars.insert(
        OsString::from(VIRTUAL_ENV),
        env.root().as_os_str().to_owned(),
    );
    Ok(vars)
}
