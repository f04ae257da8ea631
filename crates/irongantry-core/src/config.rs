use std::path::{Path, PathBuf};

/// File name of the project manifest.
pub const DEFAULT_MANIFEST_FILE: &str = "IronGantryfile";
/// Directory name of the environment, relative to the project root.
pub const DEFAULT_ENV_DIR: &str = ".irongantry_env";

/// Everything the engine needs to know about where a project lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub project_root: PathBuf,
    pub manifest_file: String,
    pub env_dir: String,
    /// Executable bundled into exported archives so recipients can bootstrap
    /// without installing IronGantry. `None` exports without it.
    pub engine_binary: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

impl EngineConfig {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            manifest_file: DEFAULT_MANIFEST_FILE.to_owned(),
            env_dir: DEFAULT_ENV_DIR.to_owned(),
            engine_binary: None,
        }
    }

    #[must_use]
    pub fn with_engine_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.engine_binary = Some(path.into());
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.project_root.join(&self.manifest_file)
    }

    pub fn env_path(&self) -> PathBuf {
        self.project_root.join(&self.env_dir)
    }
}
