//! PDF: the text layer of every page, in page order.

use std::path::Path;

use crate::{DocumentFormat, ReadError, tidy_lines};

pub(crate) fn read(path: &Path) -> Result<String, ReadError> {
    let bytes = std::fs::read(path).map_err(|e| ReadError::io(path, e))?;
    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .map_err(|e| ReadError::parse(path, DocumentFormat::Pdf, e))?;
    tracing::debug!(path = %path.display(), pages = pages.len(), "Extracted PDF pages");
    Ok(join_pages(&pages))
}

/// One tidied block per page, pages separated by a blank line. Pages without
/// a text layer are skipped.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| tidy_lines(page))
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
