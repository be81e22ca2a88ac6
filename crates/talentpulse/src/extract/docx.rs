use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ExtractError;

use super::{DocumentFormat, TextExtractor};

/// Pulls paragraph text out of the `word/document.xml` entry of a DOCX
/// archive. Runs within a paragraph are concatenated; each closed
/// paragraph appends a newline.
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parse_document_xml(xml: &str) -> Result<String, ExtractError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut text = String::new();
        let mut in_text_element = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    if e.local_name().as_ref() == b"t" {
                        in_text_element = true;
                    }
                }
                Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                    b"t" => in_text_element = false,
                    b"p" => text.push('\n'),
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if in_text_element {
                        text.push_str(&e.unescape().unwrap_or_default());
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(ExtractError::Docx(e.to_string())),
                _ => {}
            }
        }

        Ok(text)
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for DocxExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let file = File::open(path).map_err(|e| ExtractError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut archive =
            zip::ZipArchive::new(file).map_err(|e| ExtractError::Docx(e.to_string()))?;

        let mut document_xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| ExtractError::Docx(format!("missing word/document.xml: {e}")))?
            .read_to_string(&mut document_xml)
            .map_err(|e| ExtractError::Docx(e.to_string()))?;

        Self::parse_document_xml(&document_xml)
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::Docx
    }
}
