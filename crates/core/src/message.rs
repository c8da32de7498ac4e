//! Commit message formatting.
//!
//! Messages are limited in length as given, must be non-empty once trimmed,
//! and are stored trimmed with their first character uppercased.

use crate::errors::StoreError;

/// Maximum commit message length in characters.
pub const MAX_MESSAGE_LEN: usize = 200;

/// Validate and normalise a commit message.
///
/// Length is counted in characters of the message as given, surrounding
/// whitespace included. The stored value is trimmed, and only its first
/// character is changed.
pub fn format_commit_message(message: &str, max_len: usize) -> Result<String, StoreError> {
    let len = message.chars().count();
    if len > max_len {
        return Err(StoreError::InvalidMessage(format!(
            "message is {len} characters, limit is {max_len}"
        )));
    }

    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidMessage(
            "message must not be empty".into(),
        ));
    }

    let mut chars = trimmed.chars();
    let formatted = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    Ok(formatted)
}
