//! The UI state a chat turn works against
//!
//! The controller never talks to a concrete widget. It gets a [`ChatSurface`]
//! injected, which owns the input line and the message list. [`MessageLog`]
//! is the in-memory implementation used by the terminal front end and the
//! tests.

use crate::persona::GREETING;
use crate::render::{escape_markup, RenderedEntry};
use crate::state::{ChatMessage, ChatRole};

/// Identifies one entry in the message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle(u64);

/// Input control plus append-only message list.
pub trait ChatSurface: Send {
    /// Current contents of the input control.
    fn input_text(&self) -> String;
    fn clear_input(&mut self);
    fn set_input_enabled(&mut self, enabled: bool);

    /// Add an entry at the end of the list.
    fn append(&mut self, entry: RenderedEntry) -> EntryHandle;
    /// Remove a previously appended entry. Returns false if it was not found.
    fn remove(&mut self, handle: EntryHandle) -> bool;
    fn scroll_to_bottom(&mut self);
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub handle: EntryHandle,
    pub entry: RenderedEntry,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Clone)]
pub struct MessageLog {
    greeting: String,
    entries: Vec<LogEntry>,
    next_handle: u64,

    // Input line
    input: String,
    cursor: usize, // cursor position in chars
    input_enabled: bool,

    // Lines scrolled back from the bottom; 0 means the latest entry is shown
    scroll_back: u16,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageLog {
    pub fn new() -> Self {
        Self::with_greeting(GREETING)
    }

    pub fn with_greeting(greeting: &str) -> Self {
        Self {
            greeting: greeting.to_string(),
            entries: Vec::new(),
            next_handle: 0,
            input: String::new(),
            cursor: 0,
            input_enabled: true,
            scroll_back: 0,
        }
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries whose sender maps to a chat role, in display order.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.entries
            .iter()
            .filter_map(|e| {
                ChatRole::from_label(&e.entry.sender).map(|role| ChatMessage {
                    role,
                    content: e.entry.text.clone(),
                })
            })
            .collect()
    }

    pub fn contains(&self, handle: EntryHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    /// The whole list as HTML, greeting first.
    pub fn to_html(&self) -> String {
        let mut html = escape_markup(&self.greeting);
        html.push('\n');
        for e in &self.entries {
            html.push_str(&format!(
                "<div class=\"message {}\">{}</div>\n",
                e.entry.class, e.entry.markup
            ));
        }
        html
    }

    // Input line editing. Keystrokes are ignored while the input is disabled.

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn set_input(&mut self, text: &str) {
        if !self.input_enabled {
            return;
        }
        self.input = text.to_string();
        self.cursor = self.input.chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        if !self.input_enabled {
            return;
        }
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if !self.input_enabled || self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.remove(byte_pos);
    }

    pub fn delete(&mut self) {
        if !self.input_enabled {
            return;
        }
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input.chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    // Scrolling

    pub fn scroll_back(&self) -> u16 {
        self.scroll_back
    }

    pub fn follows_tail(&self) -> bool {
        self.scroll_back == 0
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    /// Keep `scroll_back` within the content actually available.
    pub fn clamp_scroll(&mut self, max_back: u16) {
        self.scroll_back = self.scroll_back.min(max_back);
    }
}

impl ChatSurface for MessageLog {
    fn input_text(&self) -> String {
        self.input.clone()
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    fn append(&mut self, entry: RenderedEntry) -> EntryHandle {
        let handle = EntryHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(LogEntry { handle, entry });
        handle
    }

    fn remove(&mut self, handle: EntryHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_back = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::add_message;

    #[test]
    fn test_handles_are_unique_after_removal() {
        let mut log = MessageLog::new();
        let a = add_message(&mut log, "Assistant", Some("Thinking..."));
        assert!(log.remove(a));
        let b = add_message(&mut log, "Assistant", Some("Done"));

        assert_ne!(a, b);
        assert!(!log.contains(a));
        assert!(!log.remove(a));
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn test_messages_map_roles() {
        let mut log = MessageLog::new();
        add_message(&mut log, "User", Some("hi"));
        add_message(&mut log, "Assistant", Some("hello"));

        let messages = log.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[1].content, "hello");
    }

    #[test]
    fn test_unicode_editing() {
        let mut log = MessageLog::new();
        for c in "crème".chars() {
            log.insert_char(c);
        }
        log.cursor_left();
        log.backspace();
        assert_eq!(log.input(), "crèe");
        log.cursor_home();
        log.delete();
        assert_eq!(log.input(), "rèe");
        log.cursor_end();
        assert_eq!(log.cursor(), 3);
    }

    #[test]
    fn test_disabled_input_ignores_keys() {
        let mut log = MessageLog::new();
        log.set_input("draft");
        log.set_input_enabled(false);
        log.insert_char('x');
        log.backspace();
        log.delete();
        assert_eq!(log.input(), "draft");
    }

    #[test]
    fn test_html_export() {
        let mut log = MessageLog::with_greeting("Hi <there>");
        add_message(&mut log, "User", Some("a & b"));
        assert_eq!(
            log.to_html(),
            "Hi &lt;there&gt;\n<div class=\"message user\"><strong>User:</strong> a &amp; b</div>\n"
        );
    }

    #[test]
    fn test_scroll_clamps() {
        let mut log = MessageLog::new();
        log.scroll_up(10);
        log.clamp_scroll(4);
        assert_eq!(log.scroll_back(), 4);
        log.scroll_down(10);
        assert!(log.follows_tail());
    }
}
