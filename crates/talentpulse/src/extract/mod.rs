//! Text extraction from candidate documents.
//!
//! Each supported format has its own extractor; the registry routes a path
//! to the right one by extension, falling back to a MIME guess for
//! extensions not in the table.

pub mod docx;
pub mod pdf;
pub mod text;

use std::path::Path;

use crate::error::ExtractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Text,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "text" | "md" => Some(Self::Text),
            _ => None,
        }
    }

    /// Extension lookup first; MIME guess covers spellings the table
    /// does not list (e.g. `.markdown`, `.log`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if let Some(format) = Self::from_extension(extension) {
            return Some(format);
        }

        let mime = mime_guess::from_path(path).first()?;
        match mime.essence_str() {
            "application/pdf" => Some(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            _ if mime.type_() == mime_guess::mime::TEXT => Some(Self::Text),
            _ => None,
        }
    }
}

pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
    fn supports(&self, format: DocumentFormat) -> bool;
}

pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        let extractors: Vec<Box<dyn TextExtractor>> = vec![
            Box::new(text::TextFileExtractor::new()),
            Box::new(pdf::PdfExtractor::new()),
            Box::new(docx::DocxExtractor::new()),
        ];

        Self { extractors }
    }

    pub fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let format = DocumentFormat::from_path(path)
            .ok_or_else(|| ExtractError::UnsupportedFormat(extension.to_string()))?;

        for extractor in &self.extractors {
            if extractor.supports(format) {
                return extractor.extract(path);
            }
        }

        Err(ExtractError::UnsupportedFormat(extension.to_string()))
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
