//! GHG Parser - Raw text extraction from report documents
//!
//! Supports:
//! - PDF documents
//! - Microsoft Word (DOCX)
//! - Markdown and plain text files
//!
//! Each parser implements the `DocumentParser` trait and produces a
//! `ParsedDocument` whose `content` is the text blob fed to the
//! extraction pipeline.

use std::path::Path;
use thiserror::Error;

pub mod docx;
pub mod pdf;

pub use docx::DocxParser;
pub use pdf::PdfParser;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during document parsing
#[derive(Error, Debug)]
pub enum ParserError {
    /// File format is not supported
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// IO error while reading the file
    #[error("IO error reading file: {path}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// PDF parsing error
    #[error("PDF parsing error: {0}")]
    PdfError(String),

    /// DOCX parsing error
    #[error("DOCX parsing error: {0}")]
    DocxError(String),
}

pub type Result<T> = std::result::Result<T, ParserError>;

// ============================================================================
// Parsed Document Types
// ============================================================================

/// A parsed document with extracted text
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Original file path
    pub file_path: String,

    /// Detected file type
    pub file_type: FileType,

    /// Extracted text content
    pub content: String,

    /// Number of pages, when the format has pages
    pub page_count: Option<u32>,
}

impl ParsedDocument {
    /// Create a new parsed document
    pub fn new(file_path: impl Into<String>, file_type: FileType) -> Self {
        Self {
            file_path: file_path.into(),
            file_type,
            content: String::new(),
            page_count: None,
        }
    }

    /// Set content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Get total word count (approximate)
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    /// Whether any non-whitespace text was extracted
    pub fn has_text(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Supported file types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Docx,
    Markdown,
    PlainText,
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "md" | "markdown" => Self::Markdown,
            "txt" => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Docx => write!(f, "docx"),
            Self::Markdown => write!(f, "markdown"),
            Self::PlainText => write!(f, "text"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// ============================================================================
// Parser Trait
// ============================================================================

/// Trait for document parsers
pub trait DocumentParser: Send + Sync {
    /// Parse a document from a file path
    fn parse(&self, path: &Path) -> Result<ParsedDocument>;

    /// Get supported file types
    fn supported_types(&self) -> &[FileType];

    /// Check if this parser can handle a file type
    fn can_parse(&self, file_type: FileType) -> bool {
        self.supported_types().contains(&file_type)
    }
}

// ============================================================================
// Parser Registry
// ============================================================================

/// Registry of available parsers
pub struct ParserRegistry {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl ParserRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Registry with every built-in parser
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PdfParser::new());
        registry.register(DocxParser::new());
        registry.register(PlainTextParser);
        registry
    }

    /// Register a parser
    pub fn register<P: DocumentParser + 'static>(&mut self, parser: P) {
        self.parsers.push(Box::new(parser));
    }

    /// Find a parser for a file type
    pub fn find_parser(&self, file_type: FileType) -> Option<&dyn DocumentParser> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(file_type))
            .map(|p| p.as_ref())
    }

    /// Parse a file using the appropriate parser
    pub fn parse(&self, path: &Path) -> Result<ParsedDocument> {
        let file_type = FileType::from_path(path);

        if file_type == FileType::Unknown {
            return Err(ParserError::UnsupportedFormat(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("none")
                    .to_string(),
            ));
        }

        let parser = self
            .find_parser(file_type)
            .ok_or_else(|| ParserError::UnsupportedFormat(file_type.to_string()))?;

        let doc = parser.parse(path)?;
        tracing::debug!(
            "Parsed {} as {}: {} words",
            doc.file_path,
            doc.file_type,
            doc.word_count()
        );
        Ok(doc)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Plain text parser
pub struct PlainTextParser;

impl DocumentParser for PlainTextParser {
    fn parse(&self, path: &Path) -> Result<ParsedDocument> {
        let content = std::fs::read_to_string(path).map_err(|e| ParserError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Ok(
            ParsedDocument::new(path.display().to_string(), FileType::from_path(path))
                .with_content(content),
        )
    }

    fn supported_types(&self) -> &[FileType] {
        &[FileType::PlainText, FileType::Markdown]
    }
}

// ============================================================================
// Tests
// ============================================================================
