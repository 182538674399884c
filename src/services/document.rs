// Document Text Source
// Raw text from PDF, DOCX and plain-text policy documents

use docx_rs::{DocumentChild, ParagraphChild, RunChild, TableCellContent, TableChild, TableRowChild};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use super::text_processor::char_len;

/// Below this many characters a document is treated as image-only
pub const MIN_DOCUMENT_CHARS: usize = 200;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
    #[error("Unsupported document type: {0}")]
    UnsupportedType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" | "text" | "md" => Ok(Self::PlainText),
            other => Err(DocumentError::UnsupportedType(if other.is_empty() {
                path.display().to_string()
            } else {
                other.to_string()
            })),
        }
    }
}

/// Text content of an in-memory document
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, DocumentError> {
    let text = match kind {
        DocumentKind::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| DocumentError::Pdf(e.to_string()))?
        }
        DocumentKind::Docx => extract_docx_text(bytes)?,
        DocumentKind::PlainText => String::from_utf8_lossy(bytes).into_owned(),
    };
    Ok(text.trim().to_string())
}

// One line per paragraph with blank lines between them, so the paragraph
// segmenter sees the document's own structure. Table cells become paragraphs.
#[allow(irrefutable_let_patterns)]
fn extract_docx_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| DocumentError::Docx(e.to_string()))?;
    let mut paragraphs: Vec<String> = Vec::new();

    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => paragraphs.push(paragraph_text(&p.children)),
            DocumentChild::Table(table) => {
                for row in &table.rows {
                    let TableChild::TableRow(row) = row else { continue };
                    for cell in &row.cells {
                        let TableRowChild::TableCell(cell) = cell else { continue };
                        for content in &cell.children {
                            if let TableCellContent::Paragraph(p) = content {
                                paragraphs.push(paragraph_text(&p.children));
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(paragraphs
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n"))
}

fn paragraph_text(children: &[ParagraphChild]) -> String {
    let mut out = String::new();
    for child in children {
        if let ParagraphChild::Run(run) = child {
            for rc in &run.children {
                match rc {
                    RunChild::Text(t) => out.push_str(&t.text),
                    RunChild::Tab(_) => out.push('\t'),
                    RunChild::Break(_) => out.push('\n'),
                    _ => {}
                }
            }
        }
    }
    out
}

/// Read a policy document from disk and return its text
pub fn load_document_text(path: &Path) -> Result<String, DocumentError> {
    let kind = DocumentKind::from_path(path)?;
    let bytes = fs::read(path).map_err(|source| DocumentError::Io {
        path: path.display().to_string(),
        source,
    })?;
    debug!("[document] Read {} bytes from {}", bytes.len(), path.display());

    let text = extract_text(kind, &bytes)?;
    info!(
        "[document] Extracted {} chars from {:?} document",
        char_len(&text),
        kind
    );
    Ok(text)
}

/// Whether extracted text is long enough to be a text-based document
pub fn has_enough_text(text: &str) -> bool {
    char_len(text.trim()) >= MIN_DOCUMENT_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("policy.PDF")).unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("a/b.docx")).unwrap(), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_path(Path::new("wording.txt")).unwrap(), DocumentKind::PlainText);
        assert!(matches!(
            DocumentKind::from_path(Path::new("scan.png")),
            Err(DocumentError::UnsupportedType(ext)) if ext == "png"
        ));
        assert!(DocumentKind::from_path(Path::new("README")).is_err());
    }

    #[test]
    fn test_plain_text_file() {
        let path: PathBuf = std::env::temp_dir().join(format!("policy_{}.txt", uuid::Uuid::new_v4()));
        fs::write(&path, "  Section 4: Exclusions\n\nDental treatment is excluded.  \n").unwrap();
        let text = load_document_text(&path).unwrap();
        assert_eq!(text, "Section 4: Exclusions\n\nDental treatment is excluded.");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join(format!("missing_{}.pdf", uuid::Uuid::new_v4()));
        assert!(matches!(load_document_text(&path), Err(DocumentError::Io { .. })));
    }

    #[test]
    fn test_docx_paragraphs_are_separated() {
        use docx_rs::{Docx, Paragraph, Run};

        let mut buf = std::io::Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Section 4: Exclusions")))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Dental treatment is excluded.")))
            .build()
            .pack(&mut buf)
            .unwrap();

        let text = extract_text(DocumentKind::Docx, buf.get_ref()).unwrap();
        assert_eq!(text, "Section 4: Exclusions\n\nDental treatment is excluded.");
    }

    #[test]
    fn test_minimum_length() {
        assert!(!has_enough_text(&" ".repeat(500)));
        assert!(!has_enough_text(&"x".repeat(MIN_DOCUMENT_CHARS - 1)));
        assert!(has_enough_text(&"x".repeat(MIN_DOCUMENT_CHARS)));
    }
}
