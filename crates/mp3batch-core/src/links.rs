//! Reading the list of links to process

use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Trimmed, non-empty lines in their original order
pub fn parse_links(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Read a UTF-8 link file, one URL per line
pub async fn read_links(path: &Path) -> std::io::Result<Vec<String>> {
    let content = fs::read_to_string(path).await?;
    let links = parse_links(&content);
    debug!("Read {} links from {}", links.len(), path.display());
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_dropped() {
        assert_eq!(parse_links("a\n\n  \nb  "), vec!["a", "b"]);
    }

    #[test]
    fn test_order_and_crlf() {
        let links = parse_links("https://youtu.be/2\r\nhttps://youtu.be/1\r\n\r\n");
        assert_eq!(links, vec!["https://youtu.be/2", "https://youtu.be/1"]);
    }

    #[test]
    fn test_no_comment_syntax() {
        assert_eq!(parse_links("# not a comment\n"), vec!["# not a comment"]);
    }

    #[tokio::test]
    async fn test_read_links_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");
        std::fs::write(&path, "a\n\n  \nb  \n").unwrap();
        assert_eq!(read_links(&path).await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_links(&dir.path().join("missing.txt")).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
