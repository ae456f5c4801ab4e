//! Font collection for attachment injection.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::batch::files_in_dir;

/// Font extensions accepted for attachment.
pub const FONT_EXTENSIONS: [&str; 3] = ["ttf", "otf", "eot"];

#[derive(Error, Debug)]
pub enum FontError {
    /// The file suffix is not a known font extension.
    #[error("`{0}` is not a supported font file (expected .ttf, .otf or .eot)")]
    UnsupportedExtension(PathBuf),

    /// The font directory held nothing attachable.
    #[error("No font files found under `{0}`")]
    NoFontsFound(PathBuf),

    /// Filesystem error while scanning.
    #[error(transparent)]
    Scan(#[from] crate::batch::BatchError),
}

pub type FontResult<T> = Result<T, FontError>;

/// A font ready to attach: path on disk plus the name and MIME type the
/// container entry will carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFile {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: &'static str,
}

/// MIME type for a font extension (without the dot, any case).
pub fn mimetype_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "ttf" => Some("application/x-truetype-font"),
        "otf" => Some("application/vnd.ms-opentype"),
        "eot" => Some("application/vnd.ms-fontobject"),
        _ => None,
    }
}

/// Classify a single font file.
pub fn font_file(path: &Path) -> FontResult<FontFile> {
    let mime = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(mimetype_for_extension)
        .ok_or_else(|| FontError::UnsupportedExtension(path.to_path_buf()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| FontError::UnsupportedExtension(path.to_path_buf()))?;
    Ok(FontFile {
        path: path.to_path_buf(),
        file_name,
        mime_type: mime,
    })
}

/// Collect all attachable fonts under a directory (recursive), sorted by
/// file name so the attachment order is stable across runs.
pub fn collect_fonts(dir: &Path) -> FontResult<Vec<FontFile>> {
    let mut fonts = files_in_dir(dir, &FONT_EXTENSIONS)?
        .iter()
        .map(|p| font_file(p))
        .collect::<FontResult<Vec<_>>>()?;
    if fonts.is_empty() {
        return Err(FontError::NoFontsFound(dir.to_path_buf()));
    }
    fonts.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(fonts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn mime_table_matches_extensions() {
        assert_eq!(
            mimetype_for_extension("TTF"),
            Some("application/x-truetype-font")
        );
        assert_eq!(
            mimetype_for_extension("otf"),
            Some("application/vnd.ms-opentype")
        );
        assert_eq!(
            mimetype_for_extension("eot"),
            Some("application/vnd.ms-fontobject")
        );
        assert_eq!(mimetype_for_extension("woff2"), None);
    }

    #[test]
    fn collect_is_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("zeta.otf"), b"x").unwrap();
        std::fs::write(dir.path().join("alpha.ttf"), b"x").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"x").unwrap();

        let fonts = collect_fonts(dir.path()).unwrap();
        assert_eq!(fonts.len(), 2);
        assert_eq!(fonts[0].file_name, "alpha.ttf");
        assert_eq!(fonts[1].file_name, "zeta.otf");
        assert_eq!(fonts[1].mime_type, "application/vnd.ms-opentype");
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            collect_fonts(dir.path()),
            Err(FontError::NoFontsFound(_))
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            font_file(Path::new("/f/font.woff2")),
            Err(FontError::UnsupportedExtension(_))
        ));
    }
}
