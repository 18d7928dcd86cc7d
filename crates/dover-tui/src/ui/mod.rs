//! UI rendering
//!
//! Rendering functions that convert controller state into terminal output
//! using ratatui widgets. All functions are pure (no I/O), taking state and
//! drawing into a frame.

mod feed;
mod input;
mod rooms;
mod status;

use std::fmt;

use chrono::TimeZone;
use dover_app::FeedController;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
};

/// Render the entire UI. Time labels are shown in `tz`.
pub fn render<Tz>(frame: &mut Frame, controller: &FeedController, tz: &Tz)
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [main_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    render_main_area(frame, controller, tz, *main_area);
    input::render(frame, controller, *input_area);
    status::render(frame, controller, *status_area);
}

/// Render the main area (rooms sidebar + feed).
fn render_main_area<Tz>(frame: &mut Frame, controller: &FeedController, tz: &Tz, area: Rect)
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    const ROOM_SIDEBAR_WIDTH: u16 = 16;
    const FEED_AREA_MIN_WIDTH: u16 = 20;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(ROOM_SIDEBAR_WIDTH), Constraint::Min(FEED_AREA_MIN_WIDTH)])
        .split(area);

    let [rooms_area, feed_area] = chunks.as_ref() else {
        return;
    };

    rooms::render(frame, controller, *rooms_area);
    feed::render(frame, controller, tz, *feed_area);
}
