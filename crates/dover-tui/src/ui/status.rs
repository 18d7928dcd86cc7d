//! Status bar
//!
//! Displays connection state, the current room and the latest status notice.

use dover_app::{ConnectionState, FeedController, StatusLevel};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Render the status bar.
pub fn render(frame: &mut Frame, controller: &FeedController, area: Rect) {
    let connection_status = match controller.connection_state() {
        ConnectionState::Disconnected => {
            Span::styled("Disconnected", Style::default().fg(Color::Red))
        },
        ConnectionState::Connecting => {
            Span::styled("Connecting...", Style::default().fg(Color::Yellow))
        },
        ConnectionState::Connected => Span::styled(
            "Connected",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    };

    let room_info = controller.current_room().map_or_else(String::new, |room| {
        let msg_count = controller.feed().len();
        format!(" | Room: {} ({}) | Messages: {msg_count}", room.name, room.code)
    });

    let mut spans = vec![
        Span::raw(" "),
        connection_status,
        Span::styled(room_info, Style::default().fg(Color::Gray)),
    ];

    if let Some(status) = controller.status() {
        let color = match status.level {
            StatusLevel::Info => Color::White,
            StatusLevel::Warning => Color::Yellow,
            StatusLevel::Error => Color::Red,
        };
        spans.push(Span::styled(format!(" | {}", status.text), Style::default().fg(color)));
    }

    let paragraph =
        Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}
