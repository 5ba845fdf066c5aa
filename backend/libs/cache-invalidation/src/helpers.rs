//! Path helpers for revalidation messages

use crate::{InvalidationError, Result};

/// Normalize a revalidation path.
///
/// Paths are opaque tokens to the publisher, but subscribers key their caches
/// on them, so `threads/`, `/threads` and ` /threads ` must agree.
///
/// # Example
///
/// ```
/// use cache_invalidation::normalize_path;
///
/// assert_eq!(normalize_path("threads/").unwrap(), "/threads");
/// assert_eq!(normalize_path("/").unwrap(), "/");
/// assert!(normalize_path("   ").is_err());
/// ```
pub fn normalize_path(path: &str) -> Result<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(InvalidationError::InvalidMessage(
            "revalidation path must not be empty".to_string(),
        ));
    }

    let body = trimmed.trim_matches('/');
    if body.is_empty() {
        return Ok("/".to_string());
    }

    Ok(format!("/{}", body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/").unwrap(), "/");
        assert_eq!(normalize_path("//").unwrap(), "/");
        assert_eq!(normalize_path("/threads").unwrap(), "/threads");
        assert_eq!(normalize_path("threads/").unwrap(), "/threads");
        assert_eq!(normalize_path(" /thread/abc/ ").unwrap(), "/thread/abc");
        assert!(normalize_path("").is_err());
    }
}
