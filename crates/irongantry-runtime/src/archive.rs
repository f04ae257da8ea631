use crate::RuntimeError;
use std::fs::File;
use std::io::{self, Seek, Write};
use std::path::{Component, Path};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Sink for `(archive-internal path, bytes)` pairs.
pub trait ArchiveWriter {
    fn add_bytes(&mut self, name: &str, bytes: &[u8], mode: u32) -> Result<(), RuntimeError>;

    fn add_file(&mut self, name: &str, source: &Path, mode: u32) -> Result<(), RuntimeError>;
}

/// Entry names are relative, `/`-separated, and never climb out of the archive.
fn check_entry_name(name: &str) -> Result<(), RuntimeError> {
    let invalid = name.is_empty()
        || name.starts_with('/')
        || name.contains('\\')
        || Path::new(name)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
    if invalid {
        return Err(RuntimeError::InvalidArchivePath(name.to_owned()));
    }
    Ok(())
}

/// Deflate-compressed zip container.
pub struct ZipArchiveWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
}

impl<W: Write + Seek> ZipArchiveWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            zip: ZipWriter::new(inner),
        }
    }

    fn start(&mut self, name: &str, mode: u32) -> Result<(), RuntimeError> {
        check_entry_name(name)?;
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(mode);
        self.zip.start_file(name, options)?;
        Ok(())
    }

    /// Write the central directory and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W, RuntimeError> {
        Ok(self.zip.finish()?)
    }
}

impl<W: Write + Seek> ArchiveWriter for ZipArchiveWriter<W> {
    fn add_bytes(&mut self, name: &str, bytes: &[u8], mode: u32) -> Result<(), RuntimeError> {
        self.start(name, mode)?;
        self.zip.write_all(bytes)?;
        Ok(())
    }

    fn add_file(&mut self, name: &str, source: &Path, mode: u32) -> Result<(), RuntimeError> {
        let mut file = File::open(source)?;
        self.start(name, mode)?;
        io::copy(&mut file, &mut self.zip)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    #[test]
    fn writes_readable_zip() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("main.py");
        std::fs::write(&src, "print('hi')\n").unwrap();

        let mut writer = ZipArchiveWriter::new(Cursor::new(Vec::new()));
        writer.add_file("main.py", &src, 0o644).unwrap();
        writer
            .add_bytes("pkg/data.txt", b"payload", 0o644)
            .unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut content = String::new();
        archive
            .by_name("pkg/data.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "payload");
    }

    #[test]
    fn preserves_unix_mode() {
        let mut writer = ZipArchiveWriter::new(Cursor::new(Vec::new()));
        writer.add_bytes("bin/tool", b"\x7fELF", 0o755).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let entry = archive.by_name("bin/tool").unwrap();
        assert_eq!(entry.unix_mode().map(|m| m & 0o777), Some(0o755));
    }

    #[test]
    fn rejects_escaping_entry_names() {
        let mut writer = ZipArchiveWriter::new(Cursor::new(Vec::new()));
        for name in ["", "/etc/passwd", "../up.txt", "a/../../b", "./a", "dir\\file"] {
            assert!(
                matches!(
                    writer.add_bytes(name, b"x", 0o644),
                    Err(RuntimeError::InvalidArchivePath(_))
                ),
                "{name:?} must be rejected"
            );
        }
    }
}
