//! Text-layer extraction with lopdf.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info_span, warn};

use crate::error::ConvertError;
use crate::types::{ConversionMetadata, ConversionOutput, Converter};

/// Placeholder emitted for pages without a usable text layer.
const EMPTY_PAGE: &str = "_No extractable text on this page._";

/// Converts PDFs by extracting the embedded text of each page.
///
/// Scanned documents without a text layer produce placeholder sections; OCR is
/// not attempted.
#[derive(Debug, Clone)]
pub struct PdfTextConverter {
    language: String,
}

impl PdfTextConverter {
    /// `language` is reported as-is in the conversion metadata.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }
}

impl Default for PdfTextConverter {
    fn default() -> Self {
        Self::new("fr")
    }
}

#[async_trait]
impl Converter for PdfTextConverter {
    fn name(&self) -> &str {
        "pdf"
    }

    async fn convert(
        &self,
        document_id: &str,
        path: &Path,
    ) -> Result<ConversionOutput, ConvertError> {
        let path: PathBuf = path.to_path_buf();
        let id = document_id.to_string();

        let pages = tokio::task::spawn_blocking(move || extract_pages(&id, &path))
            .await
            .map_err(|e| ConvertError::Join(e.to_string()))??;

        let page_count = u32::try_from(pages.len())
            .map_err(|_| ConvertError::Failure("too many pages".to_string()))?;

        Ok(ConversionOutput {
            markdown: render_markdown(document_id, &pages),
            metadata: ConversionMetadata {
                page_count,
                language: self.language.clone(),
                extracted_at: Utc::now(),
            },
        })
    }
}

fn extract_pages(document_id: &str, path: &Path) -> Result<Vec<String>, ConvertError> {
    let _span = info_span!("converter.pdf", document_id).entered();

    let bytes = std::fs::read(path).map_err(|e| ConvertError::ReadInput {
        path: path.to_path_buf(),
        source: e,
    })?;

    let doc = lopdf::Document::load_mem(&bytes)
        .map_err(|e| ConvertError::Failure(format!("failed to load PDF: {e}")))?;

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Err(ConvertError::Failure("PDF has no pages".to_string()));
    }

    let pages = page_numbers
        .into_iter()
        .map(|page| match doc.extract_text(&[page]) {
            Ok(text) => text,
            Err(e) => {
                warn!(page, error = %e, "could not extract text from page");
                String::new()
            }
        })
        .collect::<Vec<_>>();

    debug!(pages = pages.len(), "text extracted");
    Ok(pages)
}

/// Lay the extracted pages out as a Markdown document.
fn render_markdown(document_id: &str, pages: &[String]) -> String {
    let mut out = format!("# Document {document_id}\n");

    for (index, text) in pages.iter().enumerate() {
        out.push_str(&format!("\n## Page {}\n\n", index + 1));
        let body = normalize_text(text);
        if body.is_empty() {
            out.push_str(EMPTY_PAGE);
        } else {
            out.push_str(&body);
        }
        out.push('\n');
    }

    out
}

/// Trim trailing whitespace per line and collapse runs of blank lines.
fn normalize_text(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = 0usize;

    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 || lines.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }
        lines.push(line);
    }

    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}
