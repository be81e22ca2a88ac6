use std::fs;
use std::path::Path;

use crate::error::ExtractError;

use super::{DocumentFormat, TextExtractor};

/// Reads plain text files, substituting replacement characters for
/// invalid UTF-8 instead of failing the job.
pub struct TextFileExtractor;

impl TextFileExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextFileExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for TextFileExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = fs::read(path).map_err(|e| ExtractError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_extract_text_file() {
        let mut temp_file = NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(temp_file, "Line one").unwrap();
        writeln!(temp_file, "Line two").unwrap();

        let extractor = TextFileExtractor::new();
        let text = extractor.extract(temp_file.path()).unwrap();

        assert!(text.contains("Line one"));
        assert!(text.contains("Line two"));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let temp_file = NamedTempFile::with_suffix(".txt").unwrap();
        std::fs::write(temp_file.path(), b"caf\xe9 manager").unwrap();

        let extractor = TextFileExtractor::new();
        let text = extractor.extract(temp_file.path()).unwrap();

        assert!(text.starts_with("caf"));
        assert!(text.ends_with("manager"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_missing_file_reports_read_error() {
        let extractor = TextFileExtractor::new();

        let result = extractor.extract(Path::new("/nonexistent/resume.txt"));
        match result {
            Err(ExtractError::ReadDocument { path, .. }) => {
                assert_eq!(path, Path::new("/nonexistent/resume.txt"));
            }
            other => panic!("Expected ReadDocument error, got {other:?}"),
        }
    }

    #[test]
    fn test_supports_only_text() {
        let extractor = TextFileExtractor::new();

        assert!(extractor.supports(DocumentFormat::Text));
        assert!(!extractor.supports(DocumentFormat::Pdf));
        assert!(!extractor.supports(DocumentFormat::Docx));
    }
}
