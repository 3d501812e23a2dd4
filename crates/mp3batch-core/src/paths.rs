//! Collision-free destination paths

use std::path::{Path, PathBuf};

/// First of `<dir>/<base>.<ext>`, `<dir>/<base>_1.<ext>`, `<dir>/<base>_2.<ext>`, ...
/// that does not exist yet.
///
/// The answer is only valid at the moment of the check; another process may
/// claim the path before the extractor writes it.
pub fn unique_destination(dir: &Path, base: &str, extension: &str) -> PathBuf {
    let mut path = dir.join(format!("{}.{}", base, extension));
    let mut count: u32 = 1;
    while path.exists() {
        path = dir.join(format!("{}_{}.{}", base, count, extension));
        count += 1;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_free_name_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            unique_destination(dir.path(), "title", "mp3"),
            dir.path().join("title.mp3")
        );
    }

    #[test]
    fn test_first_available_suffix() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("title.mp3"), b"").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "title", "mp3"),
            dir.path().join("title_1.mp3")
        );

        fs::write(dir.path().join("title_1.mp3"), b"").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "title", "mp3"),
            dir.path().join("title_2.mp3")
        );
    }

    #[test]
    fn test_gap_in_suffixes_is_filled() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("title.mp3"), b"").unwrap();
        fs::write(dir.path().join("title_2.mp3"), b"").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "title", "mp3"),
            dir.path().join("title_1.mp3")
        );
    }

    #[test]
    fn test_other_extensions_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("title.webm"), b"").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "title", "mp3"),
            dir.path().join("title.mp3")
        );
    }
}
