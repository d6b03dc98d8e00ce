//! Plain text rendering.

use crate::error::Result;
use crate::model::Document;

/// Convert a document to plain text.
///
/// Paragraphs are separated by newlines; table rows become tab-separated
/// lines.
pub fn to_text(doc: &Document) -> Result<String> {
    Ok(doc.plain_text().trim().to_string())
}
