//! Bounded error messages for logs.
//!
//! API failures can carry a complete HTML error page (inline base64 images
//! included) in their message, e.g.
//! `GET https://api.digitalocean.com/v2/account/keys: 504 <!DOCTYPE html>...`.

use std::fmt::Display;

/// Longest message kept verbatim, in characters.
pub const MAX_ERROR_LEN: usize = 50;

/// Appended when a message is cut.
pub const TRUNCATION_MARKER: &str = "...";

/// Render an optional error as a short string.
///
/// Messages shorter than [`MAX_ERROR_LEN`] characters are returned unchanged;
/// longer ones keep their first [`MAX_ERROR_LEN`] characters followed by
/// [`TRUNCATION_MARKER`]. No error gives an empty string.
pub fn summarize<E: Display + ?Sized>(err: Option<&E>) -> String {
    let Some(err) = err else {
        return String::new();
    };

    let message = err.to_string();
    match message.char_indices().nth(MAX_ERROR_LEN) {
        None if message.chars().count() < MAX_ERROR_LEN => message,
        Some((cut, _)) => format!("{}{}", &message[..cut], TRUNCATION_MARKER),
        None => format!("{}{}", message, TRUNCATION_MARKER),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_error_is_empty() {
        assert_eq!(summarize::<std::io::Error>(None), "");
    }

    #[test]
    fn test_short_message_unchanged() {
        let err = std::io::Error::other("connection refused");
        assert_eq!(summarize(Some(&err)), "connection refused");
    }

    #[test]
    fn test_49_characters_unchanged() {
        let message = "a".repeat(49);
        assert_eq!(summarize(Some(&message)), message);
    }

    #[test]
    fn test_exactly_50_characters_gets_marker() {
        let message = "b".repeat(50);
        assert_eq!(summarize(Some(&message)), format!("{}...", message));
    }

    #[test]
    fn test_long_html_error_truncated() {
        let message = format!(
            "GET https://api.digitalocean.com/v2/account/keys: 504 <!DOCTYPE html>{}",
            "<img src=\"data:image/svg+xml;base64,AAAA\">".repeat(1000)
        );
        let summary = summarize(Some(&message));

        assert_eq!(summary.chars().count(), MAX_ERROR_LEN + TRUNCATION_MARKER.len());
        assert_eq!(
            summary,
            "GET https://api.digitalocean.com/v2/account/keys: ..."
        );
    }

    #[test]
    fn test_multibyte_characters_not_split() {
        let message = "é".repeat(60);
        let summary = summarize(Some(&message));
        assert_eq!(summary, format!("{}...", "é".repeat(50)));
    }

    #[test]
    fn test_works_with_trait_objects() {
        let err: Box<dyn std::error::Error> = "boom".into();
        assert_eq!(summarize(Some(err.as_ref())), "boom");
    }
}
