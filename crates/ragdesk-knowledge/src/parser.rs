//! Document parsing — raw bytes to plain text.

use std::path::Path;

use ragdesk_core::error::{RagDeskError, Result};

/// Turns a raw document into the text that gets chunked.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, raw: &[u8]) -> Result<String>;
}

/// UTF-8 plain text. A leading byte-order mark is dropped and CRLF line
/// endings are normalised to LF.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextParser;

impl DocumentParser for PlainTextParser {
    fn parse(&self, raw: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| RagDeskError::Other(format!("document is not valid UTF-8: {e}")))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Ok(text.replace("\r\n", "\n"))
    }
}

/// Read a document from disk and parse it.
pub async fn load_document(path: &Path, parser: &dyn DocumentParser) -> Result<String> {
    let raw = tokio::fs::read(path).await.map_err(|e| {
        RagDeskError::Config(format!("cannot read document {}: {e}", path.display()))
    })?;
    parser.parse(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let text = PlainTextParser.parse("\u{feff}line one\r\nline two".as_bytes()).unwrap();
        assert_eq!(text, "line one\nline two");
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(PlainTextParser.parse(&[0xff, 0xfe, 0x00]).is_err());
    }

    #[tokio::test]
    async fn test_load_missing_document() {
        let path = std::env::temp_dir().join("ragdesk-does-not-exist.txt");
        let err = load_document(&path, &PlainTextParser).await.unwrap_err();
        assert!(matches!(err, RagDeskError::Config(_)));
    }

    #[tokio::test]
    async fn test_load_document() {
        let path = std::env::temp_dir().join(format!("ragdesk-parser-{}.txt", std::process::id()));
        tokio::fs::write(&path, "Le RAG combine recherche et génération.")
            .await
            .unwrap();
        let text = load_document(&path, &PlainTextParser).await.unwrap();
        assert!(text.starts_with("Le RAG"));
        let _ = tokio::fs::remove_file(&path).await;
    }
}
