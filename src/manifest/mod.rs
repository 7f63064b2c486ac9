//! Dataset manifest
//!
//! The manifest is a plain text file, one relative dataset path per line, no
//! header and no escaping. It is the only interface between the generator
//! and the orchestrator.

use crate::error::{ClimpackError, ErrorCode, Result};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::Path;

pub mod generator;

pub use generator::ManifestGenerator;

/// Relative path to one output artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DatasetPath(String);

impl DatasetPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn belongs_to(&self, segment: &str) -> bool {
        self.0.contains(segment)
    }
}

impl fmt::Display for DatasetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DatasetPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<DatasetPath>,
}

impl Manifest {
    pub fn new(entries: Vec<DatasetPath>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DatasetPath] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry containing `segment`, in manifest order, duplicates kept
    pub fn select(&self, segment: &str) -> Vec<DatasetPath> {
        self.entries
            .iter()
            .filter(|entry| entry.belongs_to(segment))
            .cloned()
            .collect()
    }

    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(DatasetPath::new)
            .collect();
        Self { entries }
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.entries.iter().map(|e| e.0.len() + 1).sum());
        for entry in &self.entries {
            out.push_str(entry.as_str());
            out.push('\n');
        }
        out
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClimpackError::storage_with_code(
                ErrorCode::STORAGE_MANIFEST_READ,
                format!("failed to read manifest: {}", e),
                Some(path.to_path_buf()),
            )
            .with_source(e)
        })?;
        let manifest = Self::parse(&content);
        tracing::debug!(
            "Read {} manifest entries from {}",
            manifest.len(),
            path.display()
        );
        Ok(manifest)
    }

    /// Replace `path` with this manifest.
    ///
    /// The content goes to a temporary file in the destination directory
    /// first and is renamed over the target, so readers never observe a
    /// truncated manifest. An existing manifest keeps its permissions; a new
    /// one is created world-readable like a plainly written file.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let write_err = |e: std::io::Error| {
            ClimpackError::storage_with_code(
                ErrorCode::STORAGE_MANIFEST_WRITE,
                format!("failed to write manifest: {}", e),
                Some(path.to_path_buf()),
            )
            .with_source(e)
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        temp.write_all(self.render().as_bytes()).map_err(write_err)?;
        if let Some(permissions) = target_permissions(path) {
            temp.as_file()
                .set_permissions(permissions)
                .map_err(write_err)?;
        }
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(path).map_err(|e| write_err(e.error))?;

        tracing::info!("Wrote {} manifest entries to {}", self.len(), path.display());
        Ok(())
    }
}

/// Permissions for the renamed temp file, which is created owner-only
fn target_permissions(path: &Path) -> Option<std::fs::Permissions> {
    match std::fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => new_file_permissions(),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest(lines: &[&str]) -> Manifest {
        Manifest::new(lines.iter().map(|l| DatasetPath::new(*l)).collect())
    }

    #[test]
    fn test_select_preserves_order_and_duplicates() {
        let m = manifest(&[
            "model_outputs/expA/clm/temp",
            "model_outputs/expB/clm/temp",
            "model_outputs/expA/clm/ann/uvqt_clm.npz",
            "model_outputs/expA/clm/temp",
        ]);
        let selected = m.select("expA");
        assert_eq!(
            selected,
            vec![
                DatasetPath::new("model_outputs/expA/clm/temp"),
                DatasetPath::new("model_outputs/expA/clm/ann/uvqt_clm.npz"),
                DatasetPath::new("model_outputs/expA/clm/temp"),
            ]
        );
        assert!(m.select("expC").is_empty());
    }

    #[test]
    fn test_parse_trims_and_skips_blank_lines() {
        let m = Manifest::parse("a/b\r\n\n  c/d  \n");
        assert_eq!(m, manifest(&["a/b", "c/d"]));
    }

    #[test]
    fn test_render_one_entry_per_line() {
        let m = manifest(&["a", "b"]);
        assert_eq!(m.render(), "a\nb\n");
        assert_eq!(Manifest::default().render(), "");
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file_paths.txt");
        let m = manifest(&["x/expA/1", "x/expB/2"]);

        m.write_atomic(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x/expA/1\nx/expB/2\n");
        assert_eq!(Manifest::read(&path).unwrap(), m);
    }

    #[test]
    fn test_write_overwrites_in_full() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file_paths.txt");
        std::fs::write(&path, "old/1\nold/2\nold/3\n").unwrap();

        manifest(&["new/1"]).write_atomic(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new/1\n");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file_paths.txt");
        std::fs::write(&path, "old/1\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        manifest(&["new/1"]).write_atomic(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn test_new_manifest_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file_paths.txt");

        manifest(&["a"]).write_atomic(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);

        // A rewrite of a 0644 file stays 0644
        manifest(&["b"]).write_atomic(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("file_paths.txt");
        let err = manifest(&["a"]).write_atomic(&path).unwrap_err();
        assert_eq!(err.code(), ErrorCode::STORAGE_MANIFEST_WRITE);
    }

    #[test]
    fn test_read_missing_manifest() {
        let err = Manifest::read(Path::new("/nonexistent/file_paths.txt")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::STORAGE_MANIFEST_READ);
        assert_eq!(err.exit_code(), 4);
    }
}
