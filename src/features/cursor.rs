//! Opaque cursor pagination for feature listings.
//!
//! A cursor is the base64 encoding of a decimal item offset. Clients must
//! treat it as opaque; the encoding exists so the wire value never invites
//! arithmetic. Decoding is strict: anything that is not valid base64 over a
//! decimal integer is an invalid cursor, surfaced to the caller as an
//! invalid-params failure rather than silently clamped.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};

use super::error::FeatureError;

/// Encodes an item offset as an opaque cursor.
#[must_use]
pub fn encode_cursor(offset: usize) -> String {
    BASE64_STANDARD.encode(offset.to_string())
}

/// Decodes an opaque cursor back to an item offset.
///
/// # Errors
///
/// Fails with [`FeatureError::InvalidCursor`] if the cursor is not base64,
/// not UTF-8 or not a decimal integer.
pub fn decode_cursor(cursor: &str) -> Result<usize, FeatureError> {
    let bytes = BASE64_STANDARD
        .decode(cursor)
        .map_err(|_| FeatureError::InvalidCursor)?;
    let text = std::str::from_utf8(&bytes).map_err(|_| FeatureError::InvalidCursor)?;
    text.parse().map_err(|_| FeatureError::InvalidCursor)
}

/// Selects one page of `items`, returning the page and the cursor for the
/// next page when more items remain.
///
/// A missing cursor starts at the beginning. A cursor pointing exactly at
/// the end of the list yields an empty final page; one pointing past the
/// end is invalid.
///
/// # Errors
///
/// Fails with [`FeatureError::InvalidCursor`] if the cursor does not decode
/// or points past the end of the list.
pub fn paginate<'a, T>(
    items: &'a [T],
    cursor: Option<&str>,
    page_size: usize,
) -> Result<(&'a [T], Option<String>), FeatureError> {
    let start = match cursor {
        Some(cursor) => decode_cursor(cursor)?,
        None => 0,
    };
    if start > items.len() {
        return Err(FeatureError::InvalidCursor);
    }
    let end = start.saturating_add(page_size).min(items.len());
    let next = (end < items.len()).then(|| encode_cursor(end));
    Ok((&items[start..end], next))
}
