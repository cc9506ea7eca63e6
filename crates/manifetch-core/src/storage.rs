//! Staging files for downloads.
//!
//! Bytes land in `<target>.<pid>-<n>.part` and are renamed onto the target
//! only once a transfer completes, so an interrupted attempt never leaves a
//! truncated file under the final name. Every call gets its own staging
//! name: a manifest listed twice fetches the same targets concurrently.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Suffix of the staging file next to the target.
pub const TEMP_SUFFIX: &str = ".part";

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// `file.iso` → `file.iso.<pid>-<n>.part`, unique within this process.
pub fn staging_path(final_path: &Path) -> PathBuf {
    let n = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut o = final_path.as_os_str().to_owned();
    o.push(format!(".{}-{}{}", std::process::id(), n, TEMP_SUFFIX));
    PathBuf::from(o)
}

/// A staging file being filled by a transfer. Removed on drop unless
/// [`PartFile::commit`] renamed it into place.
#[derive(Debug)]
pub struct PartFile {
    path: PathBuf,
    file: Option<File>,
    written: u64,
}

impl PartFile {
    /// Create (or truncate) the staging file for `final_path`, creating
    /// parent directories as needed.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        if let Some(parent) = final_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let path = staging_path(final_path);
        let file = File::create(&path)?;
        Ok(Self {
            path,
            file: Some(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "part file already closed"))?;
        file.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Flush to disk and atomically rename onto `final_path`.
    pub fn commit(mut self, final_path: &Path) -> io::Result<u64> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        std::fs::rename(&self.path, final_path)?;
        self.path = PathBuf::new();
        Ok(self.written)
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        self.file.take();
        if !self.path.as_os_str().is_empty() {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_path_sits_next_to_target() {
        let staged = staging_path(Path::new("/tmp/archive.zip"));
        assert_eq!(staged.parent(), Some(Path::new("/tmp")));
        let name = staged.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("archive.zip."), "{}", name);
        assert!(name.ends_with(TEMP_SUFFIX), "{}", name);
    }

    #[test]
    fn same_target_stages_to_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("shared.bin");

        let mut first = PartFile::create(&target).unwrap();
        let mut second = PartFile::create(&target).unwrap();
        assert_ne!(first.path(), second.path());

        first.write_all(b"one").unwrap();
        second.write_all(b"two").unwrap();
        first.commit(&target).unwrap();
        second.commit(&target).unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"two");
    }

    #[test]
    fn commit_renames_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/out.bin");

        let mut part = PartFile::create(&target).unwrap();
        let staging = part.path().to_path_buf();
        part.write_all(b"hello ").unwrap();
        part.write_all(b"world").unwrap();
        assert!(staging.exists());

        assert_eq!(part.commit(&target).unwrap(), 11);
        assert!(!staging.exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"hello world");
    }

    #[test]
    fn drop_without_commit_removes_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.bin");
        let staging = {
            let mut part = PartFile::create(&target).unwrap();
            part.write_all(b"partial").unwrap();
            part.path().to_path_buf()
        };
        assert!(!staging.exists());
        assert!(!target.exists());
    }
}
