//! PDF document parser using pdf-extract
//!
//! Extracts the text of every page and joins pages with a newline so
//! that sentence segmentation never sees a form feed.

use std::path::Path;

use crate::{DocumentParser, FileType, ParsedDocument, ParserError, Result};

/// PDF document parser
pub struct PdfParser {
    /// Drop pages that contain no text
    pub skip_blank_pages: bool,
}

impl PdfParser {
    /// Create a new PDF parser with default settings
    pub fn new() -> Self {
        Self {
            skip_blank_pages: true,
        }
    }

    /// Keep or drop blank pages
    pub fn with_blank_pages(mut self, keep: bool) -> Self {
        self.skip_blank_pages = !keep;
        self
    }

    /// Extract text from a PDF file
    fn extract_text(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path).map_err(|e| ParserError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ParserError::PdfError(e.to_string()))
    }

    /// Split on form feeds and rejoin pages, each terminated by a newline
    fn join_pages(&self, raw: &str) -> (String, u32) {
        let mut text = String::with_capacity(raw.len());
        let mut pages = 0u32;

        for page in raw.split('\x0C') {
            pages += 1;
            if self.skip_blank_pages && page.trim().is_empty() {
                continue;
            }
            text.push_str(page);
            text.push('\n');
        }

        (text, pages)
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for PdfParser {
    fn parse(&self, path: &Path) -> Result<ParsedDocument> {
        let raw = self.extract_text(path)?;
        let (content, pages) = self.join_pages(&raw);

        let mut doc = ParsedDocument::new(path.display().to_string(), FileType::Pdf)
            .with_content(content);
        doc.page_count = Some(pages);

        if !doc.has_text() {
            tracing::warn!("No text layer found in {}", doc.file_path);
        }

        Ok(doc)
    }

    fn supported_types(&self) -> &[FileType] {
        &[FileType::Pdf]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_pages() {
        let parser = PdfParser::new();
        let (text, pages) = parser.join_pages("Page one.\x0C\x0CPage three.");

        assert_eq!(pages, 3);
        assert_eq!(text, "Page one.\nPage three.\n");
        assert!(!text.contains('\x0C'));
    }

    #[test]
    fn test_join_pages_keeps_blank_pages() {
        let parser = PdfParser::new().with_blank_pages(true);
        let (text, pages) = parser.join_pages("A.\x0C");

        assert_eq!(pages, 2);
        assert_eq!(text, "A.\n\n");
    }

    #[test]
    fn test_supported_types() {
        let parser = PdfParser::new();
        assert!(parser.can_parse(FileType::Pdf));
        assert!(!parser.can_parse(FileType::Docx));
    }

    #[test]
    fn test_missing_file() {
        let err = PdfParser::new()
            .parse(Path::new("/nonexistent/data.pdf"))
            .unwrap_err();
        assert!(matches!(err, ParserError::IoError { .. }));
    }
}
