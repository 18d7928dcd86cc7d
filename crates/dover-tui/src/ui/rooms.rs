//! Rooms sidebar
//!
//! Displays the room listing in server order with the current room marked.

use dover_app::FeedController;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const ACTIVE_PREFIX: &str = ">";
const INACTIVE_PREFIX: &str = " ";

/// Render the rooms sidebar.
pub fn render(frame: &mut Frame, controller: &FeedController, area: Rect) {
    let current = controller.current_room().map(|room| &room.code);

    let items: Vec<ListItem> = controller
        .directory()
        .rooms()
        .iter()
        .map(|room| {
            let (prefix, style) = if current == Some(&room.code) {
                (ACTIVE_PREFIX, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            } else {
                (INACTIVE_PREFIX, Style::default())
            };

            ListItem::new(Line::from(vec![
                Span::raw(prefix),
                Span::styled(room.name.clone(), style),
            ]))
        })
        .collect();

    let block = Block::default().borders(Borders::ALL).title(" Rooms ");
    let list = List::new(items).block(block);

    frame.render_widget(list, area);
}
