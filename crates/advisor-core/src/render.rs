//! Message rendering
//!
//! Turns a sender label and arbitrary text into an inert entry for the
//! message list. Nothing in user or model text can inject structure: markup
//! characters are escaped and newlines become explicit line breaks.

use crate::surface::{ChatSurface, EntryHandle};

/// A message as it appears in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEntry {
    /// Sender label as given, e.g. "User".
    pub sender: String,
    /// Lower-cased sender, used as a style/category hook.
    pub class: String,
    /// The unescaped text, for front ends that draw plain text.
    pub text: String,
    /// `<strong>{sender}:</strong> {escaped text}`
    pub markup: String,
}

impl RenderedEntry {
    pub fn new(sender: &str, text: Option<&str>) -> Self {
        let text = text.unwrap_or_default().to_string();
        let markup = format!("<strong>{}:</strong> {}", sender, escape_markup(&text));
        Self {
            sender: sender.to_string(),
            class: sender_class(sender),
            text,
            markup,
        }
    }
}

/// Escape `&`, `<` and `>` and turn newlines into `<br>`.
///
/// The ampersand is replaced first so the entities produced for the angle
/// brackets are not escaped twice.
pub fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\n', "<br>")
}

pub fn sender_class(sender: &str) -> String {
    sender.to_lowercase()
}

/// Append a message to the end of the list and scroll to it.
///
/// Returns the handle of the new entry so the caller can remove it later
/// (only the loading placeholder is ever removed).
pub fn add_message<S>(surface: &mut S, sender: &str, text: Option<&str>) -> EntryHandle
where
    S: ChatSurface + ?Sized,
{
    let handle = surface.append(RenderedEntry::new(sender, text));
    surface.scroll_to_bottom();
    handle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MessageLog;

    #[test]
    fn test_script_tag_is_inert() {
        let entry = RenderedEntry::new("User", Some("<script>alert(1)</script>"));
        assert_eq!(
            entry.markup,
            "<strong>User:</strong> &lt;script&gt;alert(1)&lt;/script&gt;"
        );
        assert_eq!(entry.text, "<script>alert(1)</script>");
    }

    #[test]
    fn test_ampersand_escaped_once() {
        assert_eq!(escape_markup("a & b <c>"), "a &amp; b &lt;c&gt;");
        assert_eq!(escape_markup("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_newlines_become_breaks() {
        assert_eq!(escape_markup("Step 1\nStep 2"), "Step 1<br>Step 2");
    }

    #[test]
    fn test_missing_text_renders_empty() {
        let entry = RenderedEntry::new("Assistant", None);
        assert_eq!(entry.text, "");
        assert_eq!(entry.markup, "<strong>Assistant:</strong> ");
        assert_eq!(entry.class, "assistant");
    }

    #[test]
    fn test_add_message_appends_and_scrolls() {
        let mut log = MessageLog::new();
        log.scroll_up(3);

        let first = add_message(&mut log, "User", Some("hi"));
        let second = add_message(&mut log, "Assistant", Some("hello"));

        assert_ne!(first, second);
        assert_eq!(log.entries().len(), 2);
        assert_eq!(log.entries()[1].entry.text, "hello");
        assert!(log.follows_tail());
    }
}
