use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::services::pdf_service::{self, PdfError};

pub const UNREADABLE_PLACEHOLDER: &str = "(no legible)";
const FIRST_LINE_MAX_CHARS: usize = 80;

// Captures stay on the keyword's line: `[\w \t]` rather than `[\w\s]`.
static PROVIDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"proveedor[:\s]+([\w \t]+)").expect("provider pattern"));
static ISSUER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"emitid[oa] por[:\s]+([\w \t]+)").expect("issuer pattern"));

/// Outcome of describing one file, so the caller can count failures without
/// the failure ever reaching it as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Description {
    Derived(String),
    Unreadable,
}

impl Description {
    pub fn into_text(self) -> String {
        match self {
            Description::Derived(text) => text,
            Description::Unreadable => UNREADABLE_PLACEHOLDER.to_string(),
        }
    }
}

/// `"Documento "` followed by the lower-cased extension with its dot. A file
/// without an extension gets `"Documento "` with the trailing space.
pub fn generic_label(path: &Path) -> String {
    let suffix = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    format!("Documento {suffix}")
}

fn labelled_capture(label: &str, re: &Regex, haystack: &str) -> String {
    let captured = re
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or("");
    format!("{label} {captured}").trim().to_string()
}

/// Applies the invoice/certificate heuristics to a page of text, falling back
/// to its first line.
pub fn describe_text(text: &str) -> String {
    let lower = text.to_lowercase();

    if lower.contains("factura") || lower.contains("invoice") {
        return labelled_capture("Factura", &PROVIDER_RE, &lower);
    }
    if lower.contains("certificado") {
        return labelled_capture("Certificado", &ISSUER_RE, &lower);
    }

    text.trim()
        .lines()
        .next()
        .map(|line| line.chars().take(FIRST_LINE_MAX_CHARS).collect())
        .unwrap_or_default()
}

pub fn describe_pdf(path: &Path) -> Description {
    match pdf_service::read_first_page(path) {
        Ok(page) => {
            tracing::debug!(
                file = %path.display(),
                pages = page.page_count,
                "extracted first page text"
            );
            Description::Derived(describe_text(&page.text))
        }
        Err(PdfError::Load(e)) => {
            tracing::debug!(file = %path.display(), error = %e, "pdf did not parse");
            Description::Unreadable
        }
        Err(err @ PdfError::Text { .. }) => {
            tracing::debug!(file = %path.display(), error = %err, "pdf text extraction failed");
            Description::Unreadable
        }
        Err(PdfError::Panicked(message)) => {
            tracing::warn!(file = %path.display(), %message, "pdf parser panicked");
            Description::Unreadable
        }
    }
}

pub fn describe_file(path: &Path) -> Description {
    if pdf_service::is_pdf(path) {
        describe_pdf(path)
    } else {
        Description::Derived(generic_label(path))
    }
}

/// Describes any file. PDFs go through the text heuristics; everything else
/// gets the generic label. Never fails: unreadable PDFs get the placeholder.
pub fn describe(path: &Path) -> String {
    describe_file(path).into_text()
}
