//! Conversation title derivation.
//!
//! After the first exchange, the conversation's placeholder title is
//! replaced by a preview of the user's first message: its first five
//! whitespace-separated words joined with single spaces, plus an ellipsis
//! marker. The title is never re-derived after that.

/// Number of leading words kept from the first user message.
const TITLE_WORD_COUNT: usize = 5;

/// Marker appended to every derived title.
const TITLE_SUFFIX: &str = "...";

/// Message count at or below which the title is (re)derived.
///
/// A conversation's first exchange appends exactly two messages, so a count
/// of two or less after an exchange means it was the first one.
pub const FIRST_EXCHANGE_MESSAGE_COUNT: u32 = 2;

/// Derive a conversation title from the first user message.
pub fn derive_title(content: &str) -> String {
    let preview = content
        .split_whitespace()
        .take(TITLE_WORD_COUNT)
        .collect::<Vec<_>>()
        .join(" ");
    format!("{preview}{TITLE_SUFFIX}")
}
