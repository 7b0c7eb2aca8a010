//! Helpers shared by the outbound HTTP service clients.

use url::Url;

use crate::error::{CounterlensError, Result};

/// Join a relative path onto a base URL, preserving any base path segment.
pub fn join_path(base: &Url, path: &str) -> Result<Url> {
    let mut joined = base.clone();
    {
        let mut segments = joined
            .path_segments_mut()
            .map_err(|_| CounterlensError::config(format!("URL cannot be a base: {base}")))?;
        segments.pop_if_empty();
        for segment in path.split('/') {
            segments.push(segment);
        }
    }
    Ok(joined)
}

/// Truncate to at most `max` characters, never splitting a multibyte
/// character. Used when embedding response bodies in error messages.
pub fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
