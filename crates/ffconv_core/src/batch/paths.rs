//! Path token resolution and directory expansion.
//!
//! Input tokens must exist and expand to concrete `*.mkv` leaves; output
//! tokens are created eagerly so a failure later in the run cannot leave
//! half of the target tree missing.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{BatchError, BatchResult};
use crate::models::{sanitized_file_name, PathKind};

/// Extensions accepted for the output container.
pub const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "mkv", "webm", "mov", "avi"];

/// A resolved CLI path token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub path: PathBuf,
    pub kind: PathKind,
}

impl PathEntry {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: PathKind::File,
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: PathKind::Directory,
        }
    }
}

/// Resolve an input token. The path must exist.
pub fn resolve_input(raw: &str) -> BatchResult<PathEntry> {
    let path = absolute(Path::new(raw))?;
    if !path.exists() {
        return Err(BatchError::PathNotFound(path));
    }
    if path.is_file() {
        Ok(PathEntry::file(path))
    } else {
        Ok(PathEntry::directory(path))
    }
}

/// Resolve an output token.
///
/// A token with a file-extension-like suffix is treated as a target file
/// and its parent directory is created; anything else is treated as a
/// target directory and created. Creation happens here, at resolution
/// time, before any conversion starts.
pub fn resolve_output(raw: &str) -> BatchResult<PathEntry> {
    let path = absolute(Path::new(raw))?;
    if path.extension().is_some() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| BatchError::io(format!("creating directory `{}`", parent.display()), e))?;
        }
        Ok(PathEntry::file(path))
    } else {
        fs::create_dir_all(&path)
            .map_err(|e| BatchError::io(format!("creating directory `{}`", path.display()), e))?;
        Ok(PathEntry::directory(path))
    }
}

/// Resolve a preset token. The path must exist and be a file.
pub fn resolve_preset_path(raw: &str) -> BatchResult<PathBuf> {
    let path = absolute(Path::new(raw))?;
    if !path.exists() {
        return Err(BatchError::PathNotFound(path));
    }
    if !path.is_file() {
        return Err(BatchError::NotAFile(path));
    }
    Ok(path)
}

/// Validate and normalize the output extension (leading dot stripped).
pub fn validate_extension(raw: &str) -> BatchResult<String> {
    let stripped = raw.trim_start_matches('.').to_ascii_lowercase();
    if VIDEO_EXTENSIONS.contains(&stripped.as_str()) {
        Ok(stripped)
    } else {
        Err(BatchError::InvalidExtension(stripped))
    }
}

/// Collect the files with one of the given extensions under a directory,
/// recursively, in traversal order.
pub fn files_in_dir(dir: &Path, extensions: &[&str]) -> BatchResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| {
            BatchError::io(
                format!("walking directory `{}`", dir.display()),
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("walkdir error")),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if matches {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Expand an input entry to its physical files and strip quote characters
/// from their names on disk.
///
/// The rename is required because the file path is later interpolated into
/// a single-quoted ffmpeg `subtitles=` filter expression. Re-running on an
/// already-clean name is a no-op.
pub fn sanitize_batch(entry: &PathEntry) -> BatchResult<Vec<PathBuf>> {
    let mut files = match entry.kind {
        PathKind::File => vec![entry.path.clone()],
        PathKind::Directory => files_in_dir(&entry.path, &["mkv"])?,
    };

    for file in files.iter_mut() {
        if let Some(cleaned) = sanitized_file_name(file) {
            let target = file.with_file_name(&cleaned);
            tracing::debug!("Renaming `{}` -> `{}`", file.display(), target.display());
            fs::rename(&file, &target)
                .map_err(|e| BatchError::io(format!("renaming `{}`", file.display()), e))?;
            *file = target;
        }
    }

    Ok(files)
}

/// Make a path absolute against the current directory without requiring it
/// to exist (outputs may not exist yet).
fn absolute(path: &Path) -> BatchResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| BatchError::io("reading current directory", e))?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resolve_input_missing_path_fails() {
        let err = resolve_input("/nonexistent/file.mkv").unwrap_err();
        assert!(matches!(err, BatchError::PathNotFound(_)));
    }

    #[test]
    fn resolve_output_creates_directory_eagerly() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested").join("out");
        let entry = resolve_output(target.to_str().unwrap()).unwrap();
        assert_eq!(entry.kind, PathKind::Directory);
        assert!(target.is_dir());
    }

    #[test]
    fn resolve_output_with_suffix_is_a_file_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("sub").join("movie.mp4");
        let entry = resolve_output(target.to_str().unwrap()).unwrap();
        assert_eq!(entry.kind, PathKind::File);
        // Parent exists, the file itself does not yet.
        assert!(target.parent().unwrap().is_dir());
        assert!(!target.exists());
    }

    #[test]
    fn extension_validation() {
        assert_eq!(validate_extension(".mp4").unwrap(), "mp4");
        assert_eq!(validate_extension("MKV").unwrap(), "mkv");
        assert!(matches!(
            validate_extension("docx"),
            Err(BatchError::InvalidExtension(_))
        ));
    }

    #[test]
    fn files_in_dir_filters_extension() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.mkv"), b"x").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"x").unwrap();
        let sub = dir.path().join("season");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("c.mkv"), b"x").unwrap();

        let files = files_in_dir(dir.path(), &["mkv"]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "mkv"));
    }

    #[test]
    fn sanitize_rename_is_idempotent() {
        let dir = tempdir().unwrap();
        let dirty = dir.path().join("it's a 'file'.mkv");
        std::fs::write(&dirty, b"x").unwrap();

        let entry = PathEntry::directory(dir.path());
        let first = sanitize_batch(&entry).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(
            first[0].file_name().unwrap().to_str().unwrap(),
            "its a file.mkv"
        );
        assert!(first[0].exists());

        // Second pass changes nothing.
        let second = sanitize_batch(&entry).unwrap();
        assert_eq!(first, second);
    }
}
