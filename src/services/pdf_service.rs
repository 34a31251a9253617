use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use lopdf::Document;

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("could not parse PDF: {0}")]
    Load(#[source] lopdf::Error),

    #[error("could not extract text from page {page}: {source}")]
    Text {
        page: u32,
        #[source]
        source: lopdf::Error,
    },

    /// lopdf asserts on some malformed documents instead of returning an error.
    #[error("PDF parser panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstPage {
    pub page_count: usize,
    pub text: String,
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .unwrap_or_else(|| "unknown panic".to_string()),
    }
}

/// Reads the page count and the plain text of the first page. A document with
/// no pages yields empty text rather than an error. A panic inside the parser
/// is caught and reported as `PdfError::Panicked`.
pub fn read_first_page(path: &Path) -> Result<FirstPage, PdfError> {
    panic::catch_unwind(AssertUnwindSafe(|| parse_first_page(path)))
        .unwrap_or_else(|payload| Err(PdfError::Panicked(panic_message(payload))))
}

fn parse_first_page(path: &Path) -> Result<FirstPage, PdfError> {
    let doc = Document::load(path).map_err(PdfError::Load)?;
    let pages = doc.get_pages();

    let Some(&first) = pages.keys().next() else {
        return Ok(FirstPage {
            page_count: 0,
            text: String::new(),
        });
    };

    let text = doc
        .extract_text(&[first])
        .map_err(|source| PdfError::Text {
            page: first,
            source,
        })?;

    Ok(FirstPage {
        page_count: pages.len(),
        text,
    })
}
