//! Input line
//!
//! Displays the input buffer with cursor, or a dim hint naming the room the
//! message will go to while the buffer is empty.

use dover_app::{FeedController, Phase};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

const PROMPT: &str = "> ";
const PROMPT_WIDTH: u16 = 3; // border + "> "
const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border
const RIGHT_PADDING: u16 = 1; // inside right border

/// Render the input line.
pub fn render(frame: &mut Frame, controller: &FeedController, area: Rect) {
    let input = controller.input();
    let block = Block::default().borders(Borders::ALL);

    let body = match controller.current_room() {
        Some(room) if input.is_empty() && *controller.phase() == Phase::Ready => Span::styled(
            format!("Message {}", room.name),
            Style::default().fg(Color::DarkGray),
        ),
        _ => Span::raw(input.text().to_string()),
    };
    let line = Line::from(vec![Span::raw(PROMPT), body]);

    let paragraph = Paragraph::new(line).style(Style::default().fg(Color::White)).block(block);
    frame.render_widget(paragraph, area);

    let available_width = area.width.saturating_sub(PROMPT_WIDTH + RIGHT_PADDING);
    let cursor_offset = u16::try_from(input.cursor()).unwrap_or(u16::MAX).min(available_width);

    let cursor_x = area.x.saturating_add(PROMPT_WIDTH).saturating_add(cursor_offset);
    let cursor_y = area.y.saturating_add(INPUT_LINE_OFFSET_Y);
    let max_x = area.x.saturating_add(area.width).saturating_sub(RIGHT_PADDING);

    frame.set_cursor_position((cursor_x.min(max_x), cursor_y));
}
