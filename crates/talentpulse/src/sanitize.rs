//! Helpers for sanitizing data before it reaches the filesystem or
//! tracing span attributes.
//!
//! Traces are safe to share for debugging — these functions ensure no
//! sensitive data (full upload paths, home directories) leaks into spans.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields — reveals file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Reduces an arbitrary client-supplied filename to something safe to join
/// onto an upload directory.
///
/// Strips any directory components, then replaces every character outside
/// `[A-Za-z0-9._-]` with `_`. An empty or fully-stripped name becomes
/// `"document"` so the result is always a usable path segment.
pub fn safe_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    // A name of only dots would resolve to "." or ".." when joined.
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "document".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_path_returns_filename() {
        assert_eq!(
            redact_path(Path::new("/home/user/uploads/resume.pdf")),
            "resume.pdf"
        );
    }

    #[test]
    fn test_redact_path_no_filename() {
        assert_eq!(redact_path(Path::new("/")), "<unknown>");
    }

    #[test]
    fn test_safe_filename_passthrough() {
        assert_eq!(safe_filename("resume-v2.pdf"), "resume-v2.pdf");
    }

    #[test]
    fn test_safe_filename_strips_directories() {
        assert_eq!(safe_filename("../../etc/passwd"), "passwd");
        assert_eq!(safe_filename("/tmp/upload.docx"), "upload.docx");
    }

    #[test]
    fn test_safe_filename_replaces_unsafe_chars() {
        assert_eq!(safe_filename("my resume (final).pdf"), "my_resume__final_.pdf");
    }

    #[test]
    fn test_safe_filename_empty_becomes_document() {
        assert_eq!(safe_filename(""), "document");
        assert_eq!(safe_filename("..."), "document");
        assert_eq!(safe_filename("///"), "document");
    }
}
