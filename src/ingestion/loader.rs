//! Loading source documents into ordered text segments.

use std::path::Path;

use tokio::fs;

use crate::types::RagError;

/// Page separator used by the paginated format (the `pdftotext` convention).
const PAGE_SEPARATOR: char = '\u{0C}';

/// Declared shape of an uploaded document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    /// A single unstructured text file; loads as one segment.
    PlainText,
    /// Form-feed delimited pages; loads one segment per non-empty page.
    Paginated,
}

/// Reads the document at `path` and returns its ordered segments.
///
/// The returned sequence is never empty; an unreadable or empty document
/// fails with [`RagError::Load`].
pub async fn load_document(
    path: impl AsRef<Path>,
    format: DocumentFormat,
) -> Result<Vec<String>, RagError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .await
        .map_err(|err| RagError::Load(format!("unable to read {}: {err}", path.display())))?;
    segments_from(&raw, format)
}

/// Splits raw document text into segments per the declared format.
pub fn segments_from(raw: &str, format: DocumentFormat) -> Result<Vec<String>, RagError> {
    if raw.trim().is_empty() {
        return Err(RagError::Load("document is empty".to_string()));
    }

    match format {
        DocumentFormat::PlainText => Ok(vec![raw.to_string()]),
        DocumentFormat::Paginated => {
            let pages: Vec<String> = raw
                .split(PAGE_SEPARATOR)
                .filter(|page| !page.trim().is_empty())
                .map(str::to_string)
                .collect();
            if pages.is_empty() {
                return Err(RagError::Load(
                    "paginated document contains no readable pages".to_string(),
                ));
            }
            Ok(pages)
        }
    }
}
