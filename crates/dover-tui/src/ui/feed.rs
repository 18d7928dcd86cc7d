//! Feed area
//!
//! Displays the current room's messages, newest at the bottom, honoring the
//! feed's scroll position.

use std::fmt;

use chrono::TimeZone;
use dover_app::{FeedController, Phase, RenderedLine, Segment};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const BORDER_SIZE: u16 = 2;

/// Render the feed area.
pub fn render<Tz>(frame: &mut Frame, controller: &FeedController, tz: &Tz, area: Rect)
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let feed = controller.feed();

    let title = match controller.current_room() {
        Some(room) if feed.scroll_back() > 0 => format!(" {} [-{}] ", room.name, feed.scroll_back()),
        Some(room) => format!(" {} ", room.name),
        None => " No Room ".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    let items: Vec<ListItem> = match controller.phase() {
        Phase::Failed(reason) => {
            vec![notice(reason.clone(), Color::Red), notice("Press Esc to quit", Color::DarkGray)]
        },
        Phase::Booting => vec![notice("Loading rooms...", Color::DarkGray)],
        Phase::Ready if feed.is_empty() && controller.pending_replay().is_some() => {
            vec![notice("Loading history...", Color::DarkGray)]
        },
        Phase::Ready if feed.is_empty() => vec![notice("No messages yet", Color::DarkGray)],
        Phase::Ready => {
            let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
            let lines = feed.lines();
            let end = lines.len().saturating_sub(feed.scroll_back());
            let start = end.saturating_sub(visible_height);

            lines[start..end].iter().map(|line| message_item(line, tz)).collect()
        },
    };

    let list = List::new(items).block(block);

    frame.render_widget(list, area);
}

fn notice(text: impl Into<String>, color: Color) -> ListItem<'static> {
    ListItem::new(Line::from(Span::styled(text.into(), Style::default().fg(color))))
}

fn message_item<Tz>(line: &RenderedLine, tz: &Tz) -> ListItem<'static>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut spans = vec![
        Span::styled(line.time_label(tz), Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(
            line.author.clone(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw(": "),
    ];

    spans.extend(line.segments.iter().map(|segment| match segment {
        Segment::Text(text) => Span::raw(text.clone()),
        Segment::Link(url) => Span::styled(
            url.clone(),
            Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
        ),
    }));

    ListItem::new(Line::from(spans))
}
