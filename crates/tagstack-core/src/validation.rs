//! Input normalization shared by every store implementation.

use uuid::Uuid;

use crate::error::{Error, Result};

/// Maximum tag name length, in characters.
pub const MAX_TAG_NAME_LEN: usize = 100;

/// Validate and normalize a tag name.
///
/// Names are case-insensitive: they are trimmed and stored lowercase. The
/// length limit applies to the stored form, since lowercasing can add
/// characters.
pub fn normalize_tag_name(name: &str) -> Result<String> {
    let normalized = name.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(Error::InvalidInput(
            "tag name should not be blank".to_string(),
        ));
    }
    if normalized.chars().count() > MAX_TAG_NAME_LEN {
        return Err(Error::InvalidInput(format!(
            "tag name must be {} characters or less",
            MAX_TAG_NAME_LEN
        )));
    }
    Ok(normalized)
}

/// Validate a bookmark url, returning it trimmed.
pub fn require_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("url should not be blank".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Reject a blank search fragment. The fragment is matched as given,
/// surrounding whitespace included.
pub fn require_fragment<'a>(field: &str, fragment: &'a str) -> Result<&'a str> {
    if fragment.trim().is_empty() {
        return Err(Error::InvalidInput(format!(
            "{} should not be blank",
            field
        )));
    }
    Ok(fragment)
}

/// Case-insensitive substring match used by the in-memory store.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Drop duplicate tag ids while keeping first-seen order.
pub fn dedupe_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
