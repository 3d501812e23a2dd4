//! Filesystem-safe names for downloaded tracks

/// Characters that are reserved on at least one common filesystem
const RESERVED: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Replace reserved characters with `_`, leaving everything else untouched
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect()
}
