//! File-type handlers and chunk production.
//!
//! Splits a source file into a finite sequence of `(locator, text)` pairs,
//! each text at most `chunk_size` characters and never empty. Chunking is
//! deterministic and cheap, so the same sequence is re-derived at query time
//! instead of being stored alongside the vectors.
//!
//! Plain-text chunks partition the input exactly: concatenating them
//! reproduces the original file byte for byte. PDF chunks are rebuilt from
//! whitespace-normalized page text and carry no such guarantee.

use std::path::Path;

use anyhow::{Context, Result};

use crate::extract;
use crate::report::Reporter;

/// File types with a chunking handler. Anything else is excluded from the
/// directory walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Plain-text family (`txt`, `md`, `xml`), chunked in character windows
    /// with `"line {n}"` locators.
    Text,
    /// PDF, chunked through a rolling page buffer with `"page {n}"` locators.
    Pdf,
}

/// Map a path to its handler via the lowercased extension after the last `.`.
pub fn kind_for(path: &Path) -> Option<FileKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "txt" | "md" | "xml" => Some(FileKind::Text),
        "pdf" => Some(FileKind::Pdf),
        // TODO: epub handler
        _ => None,
    }
}

/// Produce the full `(locator, chunk)` sequence for one source file.
///
/// An error means the file as a whole could not be read or opened; callers
/// skip the file with a warning rather than aborting the run.
pub fn chunk_file(
    path: &Path,
    chunk_size: usize,
    reporter: &Reporter,
) -> Result<Vec<(String, String)>> {
    match kind_for(path) {
        Some(FileKind::Text) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(chunk_plain_text(&text, chunk_size))
        }
        Some(FileKind::Pdf) => {
            let pages = extract::pdf_pages(path, reporter)
                .with_context(|| format!("failed to extract {}", path.display()))?;
            Ok(chunk_pdf_pages(&pages, chunk_size))
        }
        None => anyhow::bail!("no handler for {}", path.display()),
    }
}

/// Split text into windows of at most `chunk_size` characters, cutting at
/// the last whitespace inside the window when there is one.
///
/// The locator counter starts at line 1 and advances by each chunk's own
/// newline count before tagging it, so a chunk's locator reflects the line
/// count observed through its end. The emitted pieces partition the input
/// exactly.
pub fn chunk_plain_text(text: &str, chunk_size: usize) -> Vec<(String, String)> {
    if chunk_size == 0 {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut rest = text;
    let mut line: u64 = 1;

    while !rest.is_empty() {
        let piece = match rest.char_indices().nth(chunk_size) {
            // The remainder fits in one window.
            None => rest,
            Some((window_end, _)) => {
                let window = &rest[..window_end];
                match window.rfind(char::is_whitespace) {
                    // Keep the whitespace in the left piece so nothing is lost.
                    Some(ws) => {
                        let ws_char = rest[ws..].chars().next().expect("index from rfind");
                        &rest[..ws + ws_char.len_utf8()]
                    }
                    // No boundary in the whole window: hard cut.
                    None => window,
                }
            }
        };

        line += piece.matches('\n').count() as u64;
        out.push((format!("line {}", line), piece.to_string()));
        rest = &rest[piece.len()..];
    }

    out
}

/// Accumulate page text into a rolling buffer and cut bounded chunks at
/// whitespace boundaries.
///
/// Page text is whitespace-normalized before buffering. Whenever the buffer
/// exceeds `chunk_size` characters a chunk is cut at the last space at or
/// before the limit, the `"page {n}"` counter advances, and the remainder
/// carries into the next round. Whatever is left at end of document is
/// flushed as one final chunk.
pub fn chunk_pdf_pages(pages: &[String], chunk_size: usize) -> Vec<(String, String)> {
    if chunk_size == 0 {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut buffer = String::new();
    let mut page_no: u64 = 1;

    for page in pages {
        let cleaned = page.split_whitespace().collect::<Vec<_>>().join(" ");
        if cleaned.is_empty() {
            continue;
        }
        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(&cleaned);

        while let Some((window_end, _)) = buffer.char_indices().nth(chunk_size) {
            let window = &buffer[..window_end];
            let split = window.rfind(' ').unwrap_or(window_end);
            let head = buffer[..split].trim_end().to_string();
            let tail = buffer[split..].trim_start().to_string();
            if !head.is_empty() {
                out.push((format!("page {}", page_no), head));
                page_no += 1;
            }
            buffer = tail;
        }
    }

    let tail = buffer.trim();
    if !tail.is_empty() {
        out.push((format!("page {}", page_no), tail.to_string()));
    }

    out
}
