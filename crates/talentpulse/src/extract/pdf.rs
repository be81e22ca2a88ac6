use std::path::Path;

use lopdf::Document;

use crate::error::ExtractError;

use super::{DocumentFormat, TextExtractor};

pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let doc = Document::load(path).map_err(|e| ExtractError::Pdf(e.to_string()))?;

        // A page without a text layer contributes nothing, so a fully
        // scanned PDF extracts to an empty string rather than an error.
        let mut text = String::new();
        for (page_num, _) in doc.get_pages() {
            if let Ok(page_text) = doc.extract_text(&[page_num]) {
                text.push_str(&page_text);
                text.push('\n');
            }
        }

        Ok(text)
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::Pdf
    }
}
