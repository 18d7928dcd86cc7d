//! Rendered message feed for the current room.

use crate::RenderedLine;

/// Append-only list of rendered lines.
///
/// Cleared wholesale on room switch. `follow_tail` models "scroll the newest
/// line into view": appending re-enables it, scrolling up disables it.
#[derive(Debug, Clone)]
pub struct Feed {
    lines: Vec<RenderedLine>,
    follow_tail: bool,
    /// Lines scrolled up from the bottom. Zero while following the tail.
    scroll_back: usize,
}

impl Default for Feed {
    fn default() -> Self {
        Self { lines: Vec::new(), follow_tail: true, scroll_back: 0 }
    }
}

impl Feed {
    /// Create an empty feed that follows the tail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line and scroll it into view.
    pub fn append(&mut self, line: RenderedLine) {
        self.lines.push(line);
        self.scroll_into_view();
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.scroll_into_view();
    }

    /// Jump back to the newest line.
    pub fn scroll_into_view(&mut self) {
        self.follow_tail = true;
        self.scroll_back = 0;
    }

    /// Scroll towards older lines.
    pub fn scroll_up(&mut self, lines: usize) {
        let max = self.lines.len().saturating_sub(1);
        self.scroll_back = (self.scroll_back + lines).min(max);
        self.follow_tail = self.scroll_back == 0;
    }

    /// Scroll towards newer lines.
    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
        self.follow_tail = self.scroll_back == 0;
    }

    /// Lines in append order.
    pub fn lines(&self) -> &[RenderedLine] {
        &self.lines
    }

    /// Whether the newest line is in view.
    pub fn follows_tail(&self) -> bool {
        self.follow_tail
    }

    /// Lines scrolled up from the bottom.
    pub fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the feed is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Segment;

    fn line(text: &str) -> RenderedLine {
        RenderedLine { author: "a".into(), timestamp: 1, segments: vec![Segment::Text(text.into())] }
    }

    #[test]
    fn append_keeps_order_and_follows_tail() {
        let mut feed = Feed::new();
        feed.append(line("one"));
        feed.append(line("two"));

        let texts: Vec<_> = feed.lines().iter().map(RenderedLine::plain_text).collect();
        assert_eq!(texts, ["one", "two"]);
        assert!(feed.follows_tail());
    }

    #[test]
    fn scroll_is_clamped_and_append_resets_it() {
        let mut feed = Feed::new();
        for i in 0..3 {
            feed.append(line(&i.to_string()));
        }

        feed.scroll_up(10);
        assert_eq!(feed.scroll_back(), 2);
        assert!(!feed.follows_tail());

        feed.append(line("new"));
        assert_eq!(feed.scroll_back(), 0);
        assert!(feed.follows_tail());
    }

    #[test]
    fn clear_empties_everything() {
        let mut feed = Feed::new();
        feed.append(line("x"));
        feed.scroll_up(1);
        feed.clear();

        assert!(feed.is_empty());
        assert!(feed.follows_tail());
    }
}
