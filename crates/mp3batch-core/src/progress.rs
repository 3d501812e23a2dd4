//! Transfer progress samples
//!
//! The extractor reports `(downloaded, total)` byte counts while a transfer is
//! active. Samples are cheap to build and render so they can be forwarded at
//! the rate the extractor produces them.

use std::fmt;

/// Prefix of the lines produced by [`PROGRESS_TEMPLATE`]
pub const PROGRESS_PREFIX: &str = "mp3batch:";

/// yt-dlp `--progress-template` that yields lines understood by [`parse_progress_line`]
pub const PROGRESS_TEMPLATE: &str = concat!(
    "download:mp3batch:",
    "%(progress.downloaded_bytes)s:",
    "%(progress.total_bytes)s:",
    "%(progress.total_bytes_estimate)s"
);

const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSample {
    pub downloaded: u64,
    /// Exact size, or the extractor's estimate when the size is not known up front
    pub total: Option<u64>,
}

impl ProgressSample {
    pub fn new(downloaded: u64, total: Option<u64>) -> Self {
        Self { downloaded, total }
    }

    /// Percentage in `0.0..=100.0`, or `0.0` when the total is unknown
    pub fn percent(&self) -> f64 {
        match self.total {
            Some(total) if total > 0 => {
                (self.downloaded as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
            }
            _ => 0.0,
        }
    }
}

impl fmt::Display for ProgressSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} ({:.1}%)",
            format_mb(self.downloaded),
            format_size(self.total),
            self.percent()
        )
    }
}

/// Byte count in MB with two decimals
pub fn format_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / MIB)
}

/// Size of a whole transfer, `?` when unknown or zero
pub fn format_size(bytes: Option<u64>) -> String {
    match bytes {
        Some(n) if n > 0 => format_mb(n),
        Some(_) | None => "?".to_string(),
    }
}

/// Parse a progress line emitted with [`PROGRESS_TEMPLATE`]
///
/// Fields yt-dlp cannot fill are printed as `NA`; an exact total takes
/// precedence over the estimate.
pub fn parse_progress_line(line: &str) -> Option<ProgressSample> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.split(':');

    let downloaded = parse_bytes(fields.next()?).unwrap_or(0);
    let total = fields.next().and_then(parse_bytes);
    let estimate = fields.next().and_then(parse_bytes);

    Some(ProgressSample::new(downloaded, total.or(estimate)))
}

fn parse_bytes(field: &str) -> Option<u64> {
    let field = field.trim();
    // Estimates are printed as floats
    field
        .parse::<u64>()
        .ok()
        .or_else(|| field.parse::<f64>().ok().filter(|v| *v >= 0.0).map(|v| v as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(ProgressSample::new(50, Some(100)).percent(), 50.0);
        assert_eq!(ProgressSample::new(50, Some(0)).percent(), 0.0);
        assert_eq!(ProgressSample::new(50, None).percent(), 0.0);
    }

    #[test]
    fn test_percent_clamps_overshooting_estimate() {
        assert_eq!(ProgressSample::new(150, Some(100)).percent(), 100.0);
    }

    #[test]
    fn test_display() {
        let sample = ProgressSample::new(5 * 1024 * 1024, Some(10 * 1024 * 1024));
        assert_eq!(sample.to_string(), "5.00 MB / 10.00 MB (50.0%)");

        let unknown = ProgressSample::new(1024 * 1024, None);
        assert_eq!(unknown.to_string(), "1.00 MB / ? (0.0%)");

        let zero_total = ProgressSample::new(1024 * 1024, Some(0));
        assert_eq!(zero_total.to_string(), "1.00 MB / ? (0.0%)");
    }

    #[test]
    fn test_display_nothing_downloaded_yet() {
        let fresh = ProgressSample::new(0, Some(10 * 1024 * 1024));
        assert_eq!(fresh.to_string(), "0.00 MB / 10.00 MB (0.0%)");
        assert_eq!(ProgressSample::default().to_string(), "0.00 MB / ? (0.0%)");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(None), "?");
        assert_eq!(format_size(Some(0)), "?");
        assert_eq!(format_mb(0), "0.00 MB");
        assert_eq!(format_size(Some(1536 * 1024)), "1.50 MB");
    }

    #[test]
    fn test_parse_exact_total() {
        assert_eq!(
            parse_progress_line("mp3batch:1024:4096:NA"),
            Some(ProgressSample::new(1024, Some(4096)))
        );
    }

    #[test]
    fn test_parse_falls_back_to_estimate() {
        assert_eq!(
            parse_progress_line("mp3batch:1024:NA:8192.5"),
            Some(ProgressSample::new(1024, Some(8192)))
        );
    }

    #[test]
    fn test_parse_unknown_total() {
        assert_eq!(
            parse_progress_line("  mp3batch:NA:NA:NA  "),
            Some(ProgressSample::new(0, None))
        );
    }

    #[test]
    fn test_parse_ignores_other_output() {
        assert_eq!(parse_progress_line("[ExtractAudio] Destination: a.mp3"), None);
        assert_eq!(parse_progress_line(""), None);
    }
}
