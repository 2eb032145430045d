//! Plain-text extraction for binary reference documents.
//!
//! Loaders hand over raw bytes plus a content type; this module returns the
//! UTF-8 text that the chunker works on.

use thiserror::Error;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// Guess the content type of a document from its location.
pub fn content_type_for(location: &str) -> &'static str {
    let path = location.split(['?', '#']).next().unwrap_or(location);
    if path.to_ascii_lowercase().ends_with(".pdf") {
        MIME_PDF
    } else {
        MIME_TEXT
    }
}

/// Decode `bytes` as text. Plain text is decoded lossily.
pub fn extract_text(bytes: &[u8], content_type: &str) -> Result<String, ExtractError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        MIME_PDF => extract_pdf(bytes),
        MIME_TEXT | "text/markdown" | "application/octet-stream" | "" => {
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }
        _ => Err(ExtractError::UnsupportedContentType(content_type.to_string())),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("knowledge/automater7.txt"), MIME_TEXT);
        assert_eq!(content_type_for("knowledge/AUTOMATER7.PDF"), MIME_PDF);
        assert_eq!(content_type_for("https://host/doc.pdf?v=2"), MIME_PDF);
    }

    #[test]
    fn test_plain_text_with_charset() {
        let text = extract_text("7.6 Logik".as_bytes(), "text/plain; charset=utf-8").unwrap();
        assert_eq!(text, "7.6 Logik");
    }

    #[test]
    fn test_unsupported() {
        let err = extract_text(b"x", "image/png").unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn test_invalid_pdf_is_an_error() {
        assert!(matches!(
            extract_text(b"not a pdf", MIME_PDF),
            Err(ExtractError::Pdf(_))
        ));
    }
}
