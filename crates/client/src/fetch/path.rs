//! Request path normalization for consistent cache identity.

/// Error type for path normalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,

    #[error("absolute URL not allowed for same-origin request: {0}")]
    Absolute(String),
}

/// Normalize a same-origin request path for cache identity and manifest
/// matching.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Reject absolute URLs (everything here is same-origin)
/// 3. Drop a `./` prefix, collapse repeated leading slashes
/// 4. Ensure a single leading `/`
/// 5. Remove fragment (#...)
/// 6. Keep query string intact
pub fn normalize(input: &str) -> Result<String, PathError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(PathError::Empty);
    }

    if trimmed.contains("://") {
        return Err(PathError::Absolute(trimmed.to_string()));
    }

    let without_fragment = match trimmed.split_once('#') {
        Some((before, _)) => before,
        None => trimmed,
    };

    let relative = without_fragment.strip_prefix("./").unwrap_or(without_fragment);
    let relative = relative.trim_start_matches('/');

    if relative.is_empty() {
        return Ok("/".to_string());
    }

    Ok(format!("/{relative}"))
}

/// The path component of a normalized path, with any query string removed.
///
/// Manifest membership is decided on the path component alone; cache identity
/// keeps the query.
pub fn without_query(path: &str) -> &str {
    match path.split_once('?') {
        Some((before, _)) => before,
        None => path,
    }
}
