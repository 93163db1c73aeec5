//! CTCP ACTION handling.
//!
//! ACTION (`/me waves`) is the only CTCP message this crate interprets. It is
//! embedded in a PRIVMSG body as `\x01ACTION <text>\x01`.
//!
//! # Reference
//! - CTCP specification: <https://modern.ircdocs.horse/ctcp.html>
//!
//! # Example
//!
//! ```
//! use slirc_client::ctcp;
//!
//! assert_eq!(ctcp::action_text("\x01ACTION waves\x01"), Some("waves"));
//! assert_eq!(ctcp::format_action("dances"), "\x01ACTION dances\x01");
//! ```

/// The CTCP delimiter character (`\x01`).
pub(crate) const CTCP_DELIM: char = '\x01';

const ACTION_PREFIX: &str = "\x01ACTION ";

/// The visible text of an ACTION body, or `None` if `body` is not exactly
/// `\x01ACTION <text>\x01`.
pub fn action_text(body: &str) -> Option<&str> {
    body.strip_prefix(ACTION_PREFIX)?.strip_suffix(CTCP_DELIM)
}

/// Wrap `text` as an ACTION body.
pub fn format_action(text: &str) -> String {
    format!("{}{}{}", ACTION_PREFIX, text, CTCP_DELIM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_text() {
        assert_eq!(action_text("\x01ACTION waves\x01"), Some("waves"));
        assert_eq!(action_text("\x01ACTION \x01"), Some(""));
    }

    #[test]
    fn test_not_action() {
        assert_eq!(action_text("waves"), None);
        assert_eq!(action_text("\x01ACTION waves"), None);
        assert_eq!(action_text("\x01VERSION\x01"), None);
        assert_eq!(action_text("\x01ACTIONwaves\x01"), None);
    }

    #[test]
    fn test_format_action() {
        let body = format_action("dances");
        assert_eq!(body, "\x01ACTION dances\x01");
        assert_eq!(action_text(&body), Some("dances"));
    }
}
