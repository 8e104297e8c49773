use std::path::{Path, PathBuf};

use {
    tracing::{debug, info, warn},
    uuid::Uuid,
};

use crate::error::{Context, Result};

/// The directory every transient artifact lives in.
///
/// Paths are handed out by [`TempArea::allocate`] and only paths under the
/// area are ever deleted by [`TempArea::cleanup`].
#[derive(Debug, Clone)]
pub struct TempArea {
    root: PathBuf,
}

impl TempArea {
    /// Open (creating if needed) the temp area at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create temp dir {}", root.display()))?;
        let root = root
            .canonicalize()
            .with_context(|| format!("resolve temp dir {}", root.display()))?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A fresh, collision-free path with the given extension. Nothing is created.
    #[must_use]
    pub fn allocate(&self, extension: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", Uuid::new_v4().simple(), extension))
    }

    /// Template for tools that pick the extension themselves (`%(ext)s`).
    #[must_use]
    pub fn allocate_template(&self) -> PathBuf {
        self.root
            .join(format!("{}.%(ext)s", Uuid::new_v4().simple()))
    }

    /// Whether `path` lies inside the area. Relative paths and `..` escapes
    /// are resolved against the real filesystem when possible.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        let resolved = match path.parent().map(Path::canonicalize) {
            Some(Ok(parent)) => match path.file_name() {
                Some(name) => parent.join(name),
                None => return false,
            },
            _ => return false,
        };
        resolved.starts_with(&self.root) && resolved != self.root
    }

    /// Delete `path` if it is a file inside the area.
    ///
    /// Returns `false` for paths outside the area, missing files, and
    /// deletion errors; never fails.
    pub fn cleanup(&self, path: &Path) -> bool {
        if !self.contains(path) {
            debug!(path = %path.display(), "refusing to delete path outside temp area");
            return false;
        }
        if !path.is_file() {
            return false;
        }
        match std::fs::remove_file(path) {
            Ok(()) => {
                info!(path = %path.display(), "deleted temporary file");
                true
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to delete temporary file");
                false
            },
        }
    }

    /// Delete every file whose name starts with `stem`, e.g. the `.part` and
    /// fragment files a downloader leaves next to an aborted output.
    pub fn cleanup_stem(&self, stem: &str) -> usize {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return 0;
        };
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(stem))
            })
            .filter(|path| self.cleanup(path))
            .count()
    }

    /// Remove every file left in the area, e.g. by a previous run that died
    /// mid-job. Returns the number of files removed.
    pub fn purge(&self) -> Result<usize> {
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("read temp dir {}", self.root.display()))?;
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && self.cleanup(&path) {
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, dir = %self.root.display(), "purged leftover temporary files");
        }
        Ok(removed)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_is_unique_and_inside() {
        let dir = tempfile::tempdir().unwrap();
        let area = TempArea::open(dir.path()).unwrap();
        let a = area.allocate("mp4");
        let b = area.allocate("mp4");
        assert_ne!(a, b);
        assert!(a.starts_with(area.root()));
        assert_eq!(a.extension().unwrap(), "mp4");
    }

    #[test]
    fn cleanup_twice_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let area = TempArea::open(dir.path()).unwrap();
        let path = area.allocate("mp4");
        std::fs::write(&path, b"x").unwrap();
        assert!(area.cleanup(&path));
        assert!(!path.exists());
        assert!(!area.cleanup(&path));
    }

    #[test]
    fn cleanup_refuses_outside_paths() {
        let area_dir = tempfile::tempdir().unwrap();
        let other_dir = tempfile::tempdir().unwrap();
        let area = TempArea::open(area_dir.path()).unwrap();
        let outside = other_dir.path().join("keep.mp4");
        std::fs::write(&outside, b"x").unwrap();
        assert!(!area.cleanup(&outside));
        assert!(outside.exists());
    }

    #[test]
    fn cleanup_refuses_dot_dot_escape() {
        let parent = tempfile::tempdir().unwrap();
        let area = TempArea::open(parent.path().join("temp")).unwrap();
        let victim = parent.path().join("victim.txt");
        std::fs::write(&victim, b"x").unwrap();
        let sneaky = area.root().join("..").join("victim.txt");
        assert!(!area.cleanup(&sneaky));
        assert!(victim.exists());
    }

    #[test]
    fn cleanup_refuses_the_root_itself() {
        let dir = tempfile::tempdir().unwrap();
        let area = TempArea::open(dir.path()).unwrap();
        assert!(!area.cleanup(area.root()));
        assert!(area.root().exists());
    }

    #[test]
    fn cleanup_stem_only_touches_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        let area = TempArea::open(dir.path()).unwrap();
        std::fs::write(area.root().join("abc.mp4.part"), b"x").unwrap();
        std::fs::write(area.root().join("abc.f137.mp4"), b"x").unwrap();
        std::fs::write(area.root().join("other.mp4"), b"x").unwrap();
        assert_eq!(area.cleanup_stem("abc"), 2);
        assert!(area.root().join("other.mp4").exists());
    }

    #[test]
    fn purge_removes_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let area = TempArea::open(dir.path()).unwrap();
        for _ in 0..3 {
            std::fs::write(area.allocate("part"), b"x").unwrap();
        }
        assert_eq!(area.purge().unwrap(), 3);
        assert_eq!(std::fs::read_dir(area.root()).unwrap().count(), 0);
    }
}
