use std::path::Path;

use crate::error::StoreError;

/// Check that a document id can be used as a single path component.
pub fn validate_document_id(document_id: &str) -> Result<(), StoreError> {
    let trimmed = document_id.trim();
    let bad = trimmed.is_empty()
        || trimmed != document_id
        || document_id == "."
        || document_id == ".."
        || document_id.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::InvalidKey(document_id.to_string()));
    }
    Ok(())
}

/// Reduce a client-supplied filename to its final component.
///
/// Browsers may send full paths (`C:\Users\me\report.pdf`), so both separator
/// styles are stripped.
pub fn sanitize_filename(filename: &str) -> Result<String, StoreError> {
    let last = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let name = Path::new(last)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." || name.contains('\0') {
        return Err(StoreError::InvalidFilename(filename.to_string()));
    }
    Ok(name.to_string())
}
