//! Terminal-agnostic keyboard input and the message input line.

/// Keyboard input abstraction.
///
/// Decouples the controller from terminal libraries so simulation can feed
/// keys directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter/Return key (submit).
    Enter,
    /// Backspace key (delete character before cursor).
    Backspace,
    /// Delete key (delete character at cursor).
    Delete,
    /// Tab key (next room).
    Tab,
    /// Shift+Tab (previous room).
    BackTab,
    /// Escape key (quit).
    Esc,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Up arrow key (previous room).
    Up,
    /// Down arrow key (next room).
    Down,
    /// Home key (cursor to start).
    Home,
    /// End key (cursor to end).
    End,
    /// Page Up (scroll feed back).
    PageUp,
    /// Page Down (scroll feed forward).
    PageDown,
}

/// Single-line text input with a cursor.
///
/// The cursor counts characters, not bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLine {
    buffer: String,
    cursor: usize,
}

impl InputLine {
    /// Empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the input holds no text.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Insert a character at the cursor.
    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.buffer.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_offset(self.cursor);
        self.buffer.remove(at);
    }

    /// Delete the character under the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_offset(self.cursor);
            self.buffer.remove(at);
        }
    }

    /// Move the cursor one character left.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move the cursor one character right.
    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    /// Move the cursor to the start.
    pub fn home(&mut self) {
        self.cursor = 0;
    }

    /// Move the cursor to the end.
    pub fn end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Replace the contents, cursor at the end.
    pub fn set(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.cursor = self.char_len();
    }

    /// Empty the input.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    fn char_len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.buffer.char_indices().nth(chars).map_or(self.buffer.len(), |(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_at_cursor() {
        let mut input = InputLine::new();
        for c in "hllo".chars() {
            input.insert(c);
        }
        input.home();
        input.move_right();
        input.insert('e');

        assert_eq!(input.text(), "hello");
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn multibyte_characters() {
        let mut input = InputLine::new();
        input.set("héé");
        input.backspace();
        input.move_left();
        input.delete();

        assert_eq!(input.text(), "h");
        assert_eq!(input.cursor(), 1);
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut input = InputLine::new();
        input.backspace();
        input.delete();
        input.move_left();
        input.move_right();

        assert_eq!(input.cursor(), 0);
        assert!(input.is_empty());
    }
}
