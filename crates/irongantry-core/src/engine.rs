use crate::command::{entrypoint_argv, entrypoint_env, install_argv};
use crate::config::EngineConfig;
use crate::export::{archive_file_name, collect_project_files, write_bundle, SHIPPED_SUFFIX};
use crate::CoreError;
use irongantry_runtime::{Backend, CommandSpec, EnvLayout, ZipArchiveWriter};
use irongantry_schema::{
    parse_manifest_file, validate_project_name, Manifest, ManifestError, PackageSpec,
    ProjectName, PythonVersion,
};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Mode requested for the manifest and the shipped archive; the umask still applies.
#[cfg(unix)]
const PUBLISHED_MODE: u32 = 0o644;

/// Drives the four lifecycle operations for one project.
///
/// The engine holds no manifest state: every operation re-reads and
/// re-validates the manifest from disk, so manual edits between operations
/// are always picked up.
pub struct Engine {
    config: EngineConfig,
    backend: Backend,
}

/// Result of [`Engine::declare`].
#[derive(Debug, Clone, Serialize)]
pub struct Declared {
    pub manifest_path: PathBuf,
    pub project: ProjectName,
    pub python: Option<PythonVersion>,
}

/// Result of [`Engine::materialize`].
#[derive(Debug, Clone, Serialize)]
pub struct Materialized {
    pub env_path: PathBuf,
    pub installed: Vec<PackageSpec>,
}

/// Result of [`Engine::execute`]. A non-zero code is the program's own outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Executed {
    /// `None` when the entrypoint was terminated by a signal.
    pub exit_code: Option<i32>,
}

/// Result of [`Engine::export`].
#[derive(Debug, Clone, Serialize)]
pub struct Exported {
    pub archive_path: PathBuf,
    pub file_count: usize,
    /// blake3 hex digest of the finished archive.
    pub digest: String,
}

impl Engine {
    pub fn new(config: EngineConfig, backend: Backend) -> Self {
        Self { config, backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    fn root(&self) -> Result<PathBuf, CoreError> {
        Ok(std::path::absolute(self.config.project_root())?)
    }

    fn layout(&self) -> Result<EnvLayout, CoreError> {
        Ok(EnvLayout::new(self.root()?.join(&self.config.env_dir)))
    }

    fn load_manifest(&self) -> Result<Manifest, CoreError> {
        let path = self.config.manifest_path();
        match parse_manifest_file(&path) {
            Ok(manifest) => Ok(manifest),
            Err(ManifestError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                Err(CoreError::ManifestNotFound(path))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write a fresh manifest for `name`. Never overwrites an existing one.
    pub fn declare(&self, name: &str) -> Result<Declared, CoreError> {
        let project = validate_project_name(name)?;
        let manifest_path = self.config.manifest_path();
        if manifest_path.try_exists()? {
            return Err(CoreError::ManifestExists(manifest_path));
        }

        let python = match self.backend.environments.host_version() {
            Ok(version) => Some(version),
            Err(e) => {
                warn!("could not determine host Python version, omitting 'python': {e}");
                None
            }
        };
        let manifest = Manifest::declared(project.clone(), python.clone());
        let rendered = manifest.to_toml_string()?;

        let root = self.config.project_root();
        fs::create_dir_all(root)?;
        let mut tmp = published_tempfile().tempfile_in(root)?;
        tmp.write_all(rendered.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist_noclobber(&manifest_path).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                CoreError::ManifestExists(manifest_path.clone())
            } else {
                CoreError::Io(e.error)
            }
        })?;

        info!("declared project '{project}' at {}", manifest_path.display());
        Ok(Declared {
            manifest_path,
            project,
            python,
        })
    }

    /// Destroy and recreate the environment, then install the manifest's packages.
    pub fn materialize(&self) -> Result<Materialized, CoreError> {
        let manifest = self.load_manifest()?;
        let layout = self.layout()?;
        let env_path = layout.root().to_path_buf();

        if let Ok(meta) = fs::symlink_metadata(&env_path) {
            info!("removing existing environment at {}", env_path.display());
            if meta.is_dir() {
                fs::remove_dir_all(&env_path)?;
            } else {
                fs::remove_file(&env_path)?;
            }
        }

        info!(
            "creating environment for '{}' with backend '{}'",
            manifest.project,
            self.backend.name()
        );
        self.backend
            .environments
            .create(&layout, manifest.python.as_ref())?;
        if !layout.python_path().is_file() {
            return Err(CoreError::EnvironmentIncomplete(env_path));
        }

        if manifest.packages.is_empty() {
            debug!("no packages to install");
        } else {
            let spec = CommandSpec::new(install_argv(&layout.pip_path(), &manifest.packages))
                .with_current_dir(self.root()?);
            info!("installing {} package(s)", manifest.packages.len());
            debug!("install: {}", spec.display());
            let exit = self.backend.processes.run(&spec)?;
            if !exit.success() {
                return Err(CoreError::InstallerFailed(exit));
            }
        }

        info!("environment ready at {}", env_path.display());
        Ok(Materialized {
            env_path,
            installed: manifest.packages,
        })
    }

    /// Run the entrypoint inside the environment and report its exit status.
    pub fn execute(&self) -> Result<Executed, CoreError> {
        let manifest = self.load_manifest()?;
        let layout = self.layout()?;
        if !layout.is_materialized() {
            return Err(CoreError::EnvironmentMissing(layout.python_path()));
        }

        let argv = entrypoint_argv(&manifest.entrypoint, &layout.python_path())?;
        let env = entrypoint_env(std::env::vars_os(), &layout)?;
        let spec = CommandSpec::new(argv)
            .with_env(env)
            .with_current_dir(self.root()?);

        info!("running '{}'", manifest.entrypoint);
        debug!("exec: {}", spec.display());
        let exit = self.backend.processes.run(&spec)?;
        if !exit.success() {
            info!("entrypoint finished with {exit}");
        }
        Ok(Executed {
            exit_code: exit.code,
        })
    }

    /// Build `<project>_shipped.zip` in the project root.
    ///
    /// The archive is assembled in a temporary file next to its destination
    /// and renamed into place only once complete.
    pub fn export(&self) -> Result<Exported, CoreError> {
        let manifest = self.load_manifest()?;
        let root = self.root()?;
        let archive_path = root.join(archive_file_name(&manifest.project));

        let files = collect_project_files(&root, &self.config.env_dir)?;
        info!(
            "exporting {} project file(s) to {}",
            files.len(),
            archive_path.display()
        );

        let tmp = published_tempfile()
            .prefix(".")
            .suffix(SHIPPED_SUFFIX)
            .tempfile_in(&root)?;
        let mut writer = ZipArchiveWriter::new(tmp.as_file());
        let file_count = write_bundle(&mut writer, &files, self.config.engine_binary.as_deref())?;
        writer.finish()?;
        tmp.as_file().sync_all()?;

        let digest = digest_file(tmp.path())?;
        tmp.persist(&archive_path).map_err(|e| CoreError::Io(e.error))?;

        info!("exported {} ({file_count} entries)", archive_path.display());
        Ok(Exported {
            archive_path,
            file_count,
            digest,
        })
    }
}

/// Temp files that are renamed into place must end up with the mode a plain
/// create would give them, not the private 0600 `tempfile` defaults to.
fn published_tempfile<'a, 'b>() -> tempfile::Builder<'a, 'b> {
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(PUBLISHED_MODE));
    }
    builder
}

fn digest_file(path: &Path) -> Result<String, CoreError> {
    let mut hasher = blake3::Hasher::new();
    let mut file = fs::File::open(path)?;
    io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}
