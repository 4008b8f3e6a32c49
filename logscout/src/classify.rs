use std::path::Path;

use crate::entry::EntryKind;

/// File extensions (lower case, without the dot) treated as archives
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "jar", "7z", "tar"];

/// Checks if the final path component carries a recognized archive extension
pub fn has_archive_extension(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        if let Some(ext_str) = ext.to_str() {
            return ARCHIVE_EXTENSIONS
                .iter()
                .any(|&archive_ext| archive_ext.eq_ignore_ascii_case(ext_str));
        }
    }
    false
}

/// Classifies a real or synthetic ("archive + member name") path.
///
/// A directory on disk wins; otherwise the name decides between
/// [`EntryKind::Archive`] and [`EntryKind::File`]. Nothing is cached, so the
/// answer is only as fresh as the single `stat` it performs.
pub fn classify(path: &Path) -> EntryKind {
    if path.is_dir() {
        EntryKind::Directory
    } else if has_archive_extension(path) {
        EntryKind::Archive
    } else {
        EntryKind::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_has_archive_extension() {
        assert!(has_archive_extension(Path::new("bundle.zip")));
        assert!(has_archive_extension(Path::new("bundle.ZIP")));
        assert!(has_archive_extension(Path::new("old/logs.7z")));
        assert!(has_archive_extension(Path::new("rotated.tar")));
        assert!(has_archive_extension(Path::new("lib.jar")));
        assert!(!has_archive_extension(Path::new("app.log")));
        assert!(!has_archive_extension(Path::new("zip")));
        assert!(!has_archive_extension(Path::new("notes.zipx")));
    }

    #[test]
    fn test_classify_real_paths() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("app.log");
        fs::write(&log, "line\n").unwrap();

        assert_eq!(classify(dir.path()), EntryKind::Directory);
        assert_eq!(classify(&log), EntryKind::File);
        assert_eq!(classify(&dir.path().join("bundle.zip")), EntryKind::Archive);
    }

    #[test]
    fn test_directory_named_like_archive_is_directory() {
        let dir = tempdir().unwrap();
        let odd = dir.path().join("exported.zip");
        fs::create_dir(&odd).unwrap();
        assert_eq!(classify(&odd), EntryKind::Directory);
    }

    #[test]
    fn test_classify_synthetic_member_paths() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("bundle.zip");
        assert_eq!(classify(&archive.join("nested.zip")), EntryKind::Archive);
        assert_eq!(classify(&archive.join("logs/app.log")), EntryKind::File);
        assert_eq!(classify(&archive.join("logs/")), EntryKind::File);
    }
}
