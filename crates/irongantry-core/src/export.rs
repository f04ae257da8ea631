//! Selection of project files for export and synthesis of the bootstrap.

use crate::CoreError;
use irongantry_runtime::ArchiveWriter;
use irongantry_schema::ProjectName;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Suffix of every exported archive; such files are never re-exported.
pub const SHIPPED_SUFFIX: &str = "_shipped.zip";

pub const BOOTSTRAP_FILE: &str = "bootstrap.py";

/// Archive path of the bundled engine executable.
#[cfg(windows)]
pub const BUNDLED_ENGINE_PATH: &str = "irongantry/bin/irongantry.exe";
#[cfg(not(windows))]
pub const BUNDLED_ENGINE_PATH: &str = "irongantry/bin/irongantry";

const CACHE_DIRS: [&str; 1] = ["__pycache__"];
const BYTECODE_SUFFIXES: [&str; 2] = [".pyc", ".pyo"];

#[cfg(not(unix))]
const FILE_MODE: u32 = 0o644;
const EXEC_MODE: u32 = 0o755;

/// A project file and the name it is stored under in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    pub archive_name: String,
    pub source: PathBuf,
    /// Permission bits recorded in the archive entry.
    pub mode: u32,
}

pub fn archive_file_name(project: &ProjectName) -> String {
    format!("{project}{SHIPPED_SUFFIX}")
}

fn is_pruned_dir(name: &str, env_dir: &str) -> bool {
    name == env_dir || name.starts_with('.') || CACHE_DIRS.contains(&name)
}

fn is_skipped_file(name: &str) -> bool {
    BYTECODE_SUFFIXES.iter().any(|s| name.ends_with(s)) || name.ends_with(SHIPPED_SUFFIX)
}

fn is_reserved(archive_name: &str) -> bool {
    archive_name == BOOTSTRAP_FILE || archive_name == BUNDLED_ENGINE_PATH
}

/// `/`-joined path of `path` relative to `root`, or `None` when it cannot be
/// expressed as plain UTF-8 components below the root.
pub fn relative_archive_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Walk the project tree and return the files that belong in an export,
/// sorted by path.
///
/// Pruned: the environment directory, hidden directories, and cache
/// directories. Skipped: compiled bytecode and previously shipped archives.
/// Symlinks are not followed.
pub fn collect_project_files(root: &Path, env_dir: &str) -> Result<Vec<ProjectFile>, CoreError> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            let keep = !is_pruned_dir(&name, env_dir);
            if !keep {
                debug!("pruning {}", e.path().display());
            }
            keep
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if is_skipped_file(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let Some(archive_name) = relative_archive_name(root, entry.path()) else {
            warn!("skipping {}: path is not valid UTF-8", entry.path().display());
            continue;
        };
        if is_reserved(&archive_name) {
            warn!("skipping {archive_name}: name is reserved in exported archives");
            continue;
        }
        let mode = source_mode(&entry)?;
        files.push(ProjectFile {
            archive_name,
            source: entry.into_path(),
            mode,
        });
    }
    Ok(files)
}

#[cfg(unix)]
fn source_mode(entry: &walkdir::DirEntry) -> Result<u32, CoreError> {
    use std::os::unix::fs::PermissionsExt;
    let meta = entry.metadata().map_err(std::io::Error::from)?;
    Ok(meta.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn source_mode(_entry: &walkdir::DirEntry) -> Result<u32, CoreError> {
    Ok(FILE_MODE)
}

/// Python script placed at the archive root. It only needs a bare interpreter:
/// it builds the environment and runs the entrypoint with the bundled engine.
pub fn bootstrap_script() -> String {
    let parts = BUNDLED_ENGINE_PATH
        .split('/')
        .map(|p| format!("\"{p}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#""""Bootstrap: build the environment and run the app with the bundled IronGantry engine."""
import os
import stat
import subprocess
import sys

here = os.path.dirname(os.path.abspath(__file__))
os.chdir(here)
engine = os.path.join(here, {parts})
if not os.path.isfile(engine):
    sys.exit("bootstrap: bundled IronGantry engine not found at " + engine)
os.chmod(engine, os.stat(engine).st_mode | stat.S_IXUSR | stat.S_IXGRP | stat.S_IXOTH)
subprocess.run([engine, "build"], check=True)
sys.exit(subprocess.run([engine, "run"]).returncode)
"#
    )
}

/// Write project files, the engine executable (if readable), and the
/// bootstrap into `writer`. Returns the number of entries written.
pub fn write_bundle(
    writer: &mut dyn ArchiveWriter,
    files: &[ProjectFile],
    engine_binary: Option<&Path>,
) -> Result<usize, CoreError> {
    let mut written = 0;
    for file in files {
        writer.add_file(&file.archive_name, &file.source, file.mode)?;
        written += 1;
    }

    match engine_binary {
        Some(binary) if binary.is_file() => {
            writer.add_file(BUNDLED_ENGINE_PATH, binary, EXEC_MODE)?;
            written += 1;
        }
        Some(binary) => warn!(
            "engine executable {} not found; archive will not be self-bootstrapping",
            binary.display()
        ),
        None => warn!("no engine executable configured; archive will not be self-bootstrapping"),
    }

    writer.add_bytes(BOOTSTRAP_FILE, bootstrap_script().as_bytes(), EXEC_MODE)?;
    written += 1;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use irongantry_runtime::RuntimeError;
    use irongantry_schema::validate_project_name;
    use std::fs;

    #[derive(Default)]
    struct RecordingWriter {
        entries: Vec<(String, Vec<u8>, u32)>,
    }

    impl ArchiveWriter for RecordingWriter {
        fn add_bytes(&mut self, name: &str, bytes: &[u8], mode: u32) -> Result<(), RuntimeError> {
            self.entries.push((name.to_owned(), bytes.to_vec(), mode));
            Ok(())
        }

        fn add_file(&mut self, name: &str, source: &Path, mode: u32) -> Result<(), RuntimeError> {
            let bytes = fs::read(source)?;
            self.add_bytes(name, &bytes, mode)
        }
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel).unwrap();
    }

    fn names(files: &[ProjectFile]) -> Vec<&str> {
        files.iter().map(|f| f.archive_name.as_str()).collect()
    }

    #[test]
    fn archive_file_name_uses_project() {
        let name = validate_project_name("demo").unwrap();
        assert_eq!(archive_file_name(&name), "demo_shipped.zip");
    }

    #[test]
    fn collect_prunes_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for rel in [
            "IronGantryfile",
            "main.py",
            "pkg/util.py",
            "pkg/__pycache__/util.cpython-312.pyc",
            "legacy.pyc",
            "legacy.pyo",
            ".irongantry_env/bin/python",
            ".git/HEAD",
            ".env",
            "nested/.hidden/secret.txt",
            "demo_shipped.zip",
            "old/other_shipped.zip",
        ] {
            touch(root, rel);
        }

        let files = collect_project_files(root, ".irongantry_env").unwrap();
        assert_eq!(
            names(&files),
            vec![".env", "IronGantryfile", "main.py", "pkg/util.py"]
        );
    }

    #[test]
    fn custom_env_dir_is_pruned_even_when_not_hidden() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "venv_dir/bin/python");
        touch(dir.path(), "app.py");
        let files = collect_project_files(dir.path(), "venv_dir").unwrap();
        assert_eq!(names(&files), vec!["app.py"]);
    }

    #[test]
    fn hidden_root_directory_is_still_walked() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(".project");
        touch(&root, "main.py");
        let files = collect_project_files(&root, ".irongantry_env").unwrap();
        assert_eq!(names(&files), vec!["main.py"]);
    }

    #[test]
    fn reserved_names_are_not_taken_from_project() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "bootstrap.py");
        touch(dir.path(), BUNDLED_ENGINE_PATH);
        touch(dir.path(), "main.py");
        let files = collect_project_files(dir.path(), ".irongantry_env").unwrap();
        assert_eq!(names(&files), vec!["main.py"]);
    }

    #[test]
    fn relative_names_use_forward_slashes() {
        let root = Path::new("/proj");
        assert_eq!(
            relative_archive_name(root, &root.join("a").join("b.py")),
            Some("a/b.py".to_owned())
        );
        assert_eq!(relative_archive_name(root, root), None);
        assert_eq!(relative_archive_name(root, Path::new("/elsewhere/x")), None);
    }

    #[test]
    fn bootstrap_builds_then_runs_bundled_engine() {
        let script = bootstrap_script();
        assert!(script.contains("os.chdir(here)"));
        let build = script.find("\"build\"").unwrap();
        let run = script.find("\"run\"").unwrap();
        assert!(build < run);
        assert!(script.contains("\"irongantry\", \"bin\""));
        assert!(script.contains("check=True"));
    }

    #[test]
    fn bootstrap_exits_cleanly_without_bundled_engine() {
        let script = bootstrap_script();
        let guard = script.find("if not os.path.isfile(engine):").unwrap();
        let chmod = script.find("os.chmod(engine").unwrap();
        assert!(guard < chmod);
        assert!(script.contains("sys.exit(\"bootstrap: bundled IronGantry engine not found"));
    }

    #[cfg(unix)]
    #[test]
    fn collect_keeps_executable_bit() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "run.sh");
        touch(dir.path(), "main.py");
        fs::set_permissions(dir.path().join("run.sh"), fs::Permissions::from_mode(0o755)).unwrap();
        fs::set_permissions(dir.path().join("main.py"), fs::Permissions::from_mode(0o640)).unwrap();

        let files = collect_project_files(dir.path(), ".irongantry_env").unwrap();
        let modes: Vec<(&str, u32)> = files
            .iter()
            .map(|f| (f.archive_name.as_str(), f.mode))
            .collect();
        assert_eq!(modes, vec![("main.py", 0o640), ("run.sh", 0o755)]);

        let mut writer = RecordingWriter::default();
        write_bundle(&mut writer, &files, None).unwrap();
        assert_eq!(writer.entries[1].0, "run.sh");
        assert_eq!(writer.entries[1].2, 0o755);
    }

    #[test]
    fn bundle_includes_engine_and_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "main.py");
        let engine = dir.path().join("engine-bin");
        fs::write(&engine, b"binary").unwrap();
        let files = collect_project_files(dir.path(), ".irongantry_env").unwrap();
        let files: Vec<_> = files
            .into_iter()
            .filter(|f| f.archive_name == "main.py")
            .collect();

        let mut writer = RecordingWriter::default();
        let count = write_bundle(&mut writer, &files, Some(&engine)).unwrap();
        assert_eq!(count, 3);
        let entry_names: Vec<&str> = writer.entries.iter().map(|e| e.0.as_str()).collect();
        assert_eq!(entry_names, vec!["main.py", BUNDLED_ENGINE_PATH, BOOTSTRAP_FILE]);
        assert_eq!(writer.entries[1].2, 0o755);
        assert_eq!(writer.entries[1].1, b"binary");
    }

    #[test]
    fn bundle_without_engine_still_has_bootstrap() {
        let mut writer = RecordingWriter::default();
        let count = write_bundle(&mut writer, &[], Some(Path::new("/nonexistent/engine"))).unwrap();
        assert_eq!(count, 1);
        assert_eq!(writer.entries[0].0, BOOTSTRAP_FILE);
    }
}
