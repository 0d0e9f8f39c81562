//! PDF page text extraction.
//!
//! Pages are extracted one at a time so a single malformed page is skipped
//! with a warning while the rest of the document still gets indexed. A
//! document that cannot be opened at all fails extraction for that file
//! only; callers skip the file and keep going.

use std::path::Path;

use crate::report::Reporter;

/// Extraction failure for a whole document.
#[derive(Debug)]
pub enum ExtractError {
    /// The document could not be opened or its page list read.
    Open(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Open(e) => write!(f, "PDF open failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extract per-page text from a PDF, in page order.
pub fn pdf_pages(path: &Path, reporter: &Reporter) -> Result<Vec<String>, ExtractError> {
    let doc = lopdf::Document::load(path).map_err(|e| ExtractError::Open(e.to_string()))?;

    let mut pages = Vec::new();
    for (page_no, _) in doc.get_pages() {
        match doc.extract_text(&[page_no]) {
            Ok(text) => pages.push(text),
            Err(e) => reporter.warn(&format!(
                "skipping page {} of {}: {}",
                page_no,
                path.display(),
                e
            )),
        }
    }
    Ok(pages)
}
