//! Shared utility functions for the darkroom application.

use axum::http::HeaderMap;
use rusqlite::Connection;

use crate::error::Result;

/// Extract a Bearer token from the Authorization header.
///
/// Returns the token string without the "Bearer " prefix, or None if
/// the header is missing, malformed, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Turn a category name into a URL slug: lowercase, alphanumerics kept,
/// runs of anything else collapsed to single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut prev_dash = true; // suppress leading dash
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    // Slug column is capped at 40 chars like the original field
    slug.truncate(40);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Derive a slug that is unique among categories, appending "-2", "-3", ...
/// when the plain slug is already taken.
pub fn unique_slug(conn: &Connection, name: &str) -> Result<String> {
    let base = slugify(name);
    let base = if base.is_empty() { "category".to_string() } else { base };

    if !crate::db::queries::slug_exists(conn, &base)? {
        return Ok(base);
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !crate::db::queries::slug_exists(conn, &candidate)? {
            return Ok(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Portraits"), "portraits");
        assert_eq!(slugify("Black & White"), "black-white");
        assert_eq!(slugify("  Weddings 2015  "), "weddings-2015");
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "a".repeat(60);
        assert_eq!(slugify(&long).len(), 40);
    }
}
