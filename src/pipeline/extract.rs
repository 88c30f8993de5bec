//! Text extraction: PDF bytes → page-ordered plain text.
//!
//! ## Why spawn_blocking?
//!
//! Parsing a PDF and decoding its content streams is CPU-bound and can take
//! seconds on large documents. `tokio::task::spawn_blocking` keeps that work
//! off the async worker threads. It also contains parser panics on hostile
//! input: a panic surfaces as a `JoinError`, which becomes an ordinary
//! extraction error.
//!
//! Scanned documents carry no text layer; they fail here with a message
//! saying so rather than reaching the model as an empty prompt.

use crate::config::PageSeparator;
use crate::error::PipelineError;
use crate::output::{ExtractedText, RawDocument, PDF_MIME};
use tracing::{debug, info};

/// Magic bytes every PDF starts with.
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extract the text of every page of `document`, in page order.
///
/// # Errors
/// [`PipelineError::Extraction`] when the declared type is not PDF, the bytes
/// are not a PDF, the parser rejects them, or no page has any text.
pub async fn extract_text(
    document: &RawDocument,
    separator: &PageSeparator,
) -> Result<ExtractedText, PipelineError> {
    check_document(document)?;

    let bytes = document.bytes.clone();
    let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&bytes))
        .await
        .map_err(|e| PipelineError::Extraction {
            reason: format!("PDF parser aborted: {e}"),
        })?
        .map_err(|e| PipelineError::Extraction {
            reason: format!("not a readable PDF: {e}"),
        })?;

    let extracted = join_pages(&pages, separator)?;
    info!(
        "Extracted {} chars from {}/{} pages of {}",
        extracted.char_count(),
        extracted.pages_with_text,
        extracted.page_count,
        document.display_name()
    );
    Ok(extracted)
}

/// Reject documents that cannot be PDFs before handing them to the parser.
pub fn check_document(document: &RawDocument) -> Result<(), PipelineError> {
    let essence = document
        .mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    if essence != PDF_MIME {
        return Err(PipelineError::Extraction {
            reason: format!(
                "unsupported document type '{}' (expected {})",
                document.mime_type, PDF_MIME
            ),
        });
    }

    if !document.bytes.starts_with(PDF_MAGIC) {
        let head: Vec<u8> = document.bytes.iter().take(4).copied().collect();
        return Err(PipelineError::Extraction {
            reason: format!("not a PDF: first bytes are {:?}", head),
        });
    }
    Ok(())
}

/// Join page texts in order, skipping pages with no text.
///
/// The separator is rendered with the 1-indexed source page number of the
/// page that follows it.
pub fn join_pages(pages: &[String], separator: &PageSeparator) -> Result<ExtractedText, PipelineError> {
    let mut text = String::new();
    let mut pages_with_text = 0;

    for (idx, page) in pages.iter().enumerate() {
        let page_text = page.trim();
        if page_text.is_empty() {
            debug!("Page {} has no text layer", idx + 1);
            continue;
        }
        if pages_with_text > 0 {
            text.push_str(&separator.render(idx + 1));
        }
        text.push_str(page_text);
        pages_with_text += 1;
    }

    if pages_with_text == 0 {
        return Err(PipelineError::Extraction {
            reason: format!(
                "none of the {} pages contains text. This might be a scanned document; \
                 OCR is not supported.",
                pages.len()
            ),
        });
    }

    Ok(ExtractedText {
        text,
        page_count: pages.len(),
        pages_with_text,
    })
}
