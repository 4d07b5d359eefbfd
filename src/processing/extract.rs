//! Pluggable text extraction seam.
//!
//! Format parsing is a collaborator, not part of the pipeline core: the service only needs a
//! `extract(bytes, kind) -> text` capability. The built-in extractor covers the UTF-8 text
//! kinds and strips markup from HTML; binary formats are rejected up front so no indexing
//! work begins for them.

use thiserror::Error;

/// Document formats recognized by the upload surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Plain text.
    Txt,
    /// Markdown source.
    Markdown,
    /// HTML pages.
    Html,
    /// PDF documents.
    Pdf,
    /// Word documents.
    Docx,
}

impl DocumentKind {
    /// Resolve a kind from a filename extension.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "txt" => Ok(Self::Txt),
            "md" => Ok(Self::Markdown),
            "html" | "htm" => Ok(Self::Html),
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            other => Err(ExtractError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Stable label stored in chunk payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

/// Errors raised while turning uploaded bytes into text.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No extractor is registered for the requested format.
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),
    /// The payload was not valid text for a text-based format.
    #[error("Document is not valid UTF-8 text")]
    InvalidEncoding,
}

/// Capability turning raw file bytes into indexable text.
///
/// Implementations must be deterministic: identical bytes always produce identical text.
pub trait TextExtractor: Send + Sync {
    /// Extract UTF-8 text from the given bytes.
    fn extract(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractError>;
}

/// Built-in extractor for text-based formats.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractError> {
        match kind {
            DocumentKind::Txt | DocumentKind::Markdown => decode_utf8(bytes),
            DocumentKind::Html => Ok(strip_html(&decode_utf8(bytes)?)),
            DocumentKind::Pdf | DocumentKind::Docx => Err(ExtractError::UnsupportedFormat(
                format!("no extractor registered for {}", kind.as_str()),
            )),
        }
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String, ExtractError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| ExtractError::InvalidEncoding)
}

/// Remove tags from an HTML document, keeping text content.
///
/// Script and style bodies are dropped entirely.
fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        let after = &rest[open..];

        let lowered = after.to_ascii_lowercase();
        let skip_until = if lowered.starts_with("<script") {
            lowered.find("</script>").map(|end| end + "</script>".len())
        } else if lowered.starts_with("<style") {
            lowered.find("</style>").map(|end| end + "</style>".len())
        } else {
            after.find('>').map(|end| end + 1)
        };

        match skip_until {
            Some(offset) => {
                // Tag boundaries separate words in rendered text.
                if !text.ends_with(char::is_whitespace) && !text.is_empty() {
                    text.push(' ');
                }
                rest = &after[offset..];
            }
            None => {
                rest = "";
            }
        }
    }

    text.push_str(rest);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_resolution_follows_extension() {
        assert_eq!(DocumentKind::from_filename("a.txt").unwrap(), DocumentKind::Txt);
        assert_eq!(
            DocumentKind::from_filename("notes.MD").unwrap(),
            DocumentKind::Markdown
        );
        assert_eq!(
            DocumentKind::from_filename("page.htm").unwrap(),
            DocumentKind::Html
        );
        assert!(matches!(
            DocumentKind::from_filename("archive.zip"),
            Err(ExtractError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            DocumentKind::from_filename("no-extension"),
            Err(ExtractError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn plain_text_round_trips() {
        let extractor = PlainTextExtractor;
        let text = extractor
            .extract(b"machine learning basics", DocumentKind::Txt)
            .unwrap();
        assert_eq!(text, "machine learning basics");
    }

    #[test]
    fn html_tags_are_stripped() {
        let extractor = PlainTextExtractor;
        let html = b"<html><body><h1>Title</h1><p>Some <b>bold</b> text.</p>\
            <script>ignore();</script></body></html>";
        let text = extractor.extract(html, DocumentKind::Html).unwrap();
        assert_eq!(text, "Title Some bold text.");
    }

    #[test]
    fn binary_kinds_are_rejected() {
        let extractor = PlainTextExtractor;
        assert!(matches!(
            extractor.extract(b"%PDF-1.4", DocumentKind::Pdf),
            Err(ExtractError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let extractor = PlainTextExtractor;
        assert!(matches!(
            extractor.extract(&[0xff, 0xfe, 0x00], DocumentKind::Txt),
            Err(ExtractError::InvalidEncoding)
        ));
    }
}
