//! DOCX document parser using docx-rs
//!
//! Paragraphs become lines; each table row becomes one line with its
//! cells separated by ` | `.

use std::path::Path;

use docx_rs::read_docx;

use crate::{DocumentParser, FileType, ParsedDocument, ParserError, Result};

/// DOCX document parser
pub struct DocxParser {
    /// Whether table rows are included in the text
    pub include_tables: bool,
}

impl DocxParser {
    /// Create a new DOCX parser with default settings
    pub fn new() -> Self {
        Self {
            include_tables: true,
        }
    }

    /// Include or skip tables
    pub fn with_tables(mut self, enabled: bool) -> Self {
        self.include_tables = enabled;
        self
    }
}

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &para.children {
        if let docx_rs::ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let docx_rs::RunChild::Text(t) = run_child {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text
}

fn table_lines(tbl: &docx_rs::Table) -> Vec<String> {
    let mut lines = Vec::new();

    for row in &tbl.rows {
        let docx_rs::TableChild::TableRow(tr) = row;
        let mut cells = Vec::new();

        for cell in &tr.cells {
            let docx_rs::TableRowChild::TableCell(tc) = cell;
            let mut cell_text = String::new();

            for child in &tc.children {
                if let docx_rs::TableCellContent::Paragraph(para) = child {
                    cell_text.push_str(&paragraph_text(para));
                }
            }

            let cell_text = cell_text.trim();
            if !cell_text.is_empty() {
                cells.push(cell_text.to_string());
            }
        }

        if !cells.is_empty() {
            lines.push(cells.join(" | "));
        }
    }

    lines
}

impl DocumentParser for DocxParser {
    fn parse(&self, path: &Path) -> Result<ParsedDocument> {
        let buf = std::fs::read(path).map_err(|e| ParserError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let docx = read_docx(&buf).map_err(|e| ParserError::DocxError(e.to_string()))?;

        let mut content = String::new();

        for child in &docx.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(para) => {
                    content.push_str(&paragraph_text(para));
                    content.push('\n');
                }
                docx_rs::DocumentChild::Table(tbl) if self.include_tables => {
                    for line in table_lines(tbl) {
                        content.push_str(&line);
                        content.push('\n');
                    }
                }
                _ => {}
            }
        }

        Ok(ParsedDocument::new(path.display().to_string(), FileType::Docx).with_content(content))
    }

    fn supported_types(&self) -> &[FileType] {
        &[FileType::Docx]
    }
}
