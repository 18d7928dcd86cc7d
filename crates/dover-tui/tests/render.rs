//! Rendering tests against ratatui's `TestBackend`.
//!
//! Controller state is built through its public event API, drawn into an
//! in-memory buffer, and checked as text. Time labels use UTC so the output
//! is stable across machines.

use chrono::Utc;
use dover_app::{AppEvent, ControllerConfig, FeedController, HistoryError, KeyInput};
use dover_proto::{RawTimestamp, Room, WireMessage};
use dover_tui::ui;
use ratatui::{Terminal, backend::TestBackend};

fn rooms() -> Vec<Room> {
    vec![Room::new("r1", "General"), Room::new("r2", "Random")]
}

fn booted(history: Vec<WireMessage>) -> FeedController {
    let mut controller = FeedController::new(ControllerConfig::default());
    controller.bootstrap();
    controller.handle(AppEvent::DirectoryLoaded { result: Ok(rooms()), restored: None });

    let ticket = controller.pending_replay().cloned().unwrap();
    controller.handle(AppEvent::HistoryLoaded { ticket, result: Ok(history), received_at: 0 });
    controller.handle(AppEvent::Connected);
    controller
}

fn message(text: &str) -> WireMessage {
    WireMessage::new(Some("ana"), Some(RawTimestamp::Integer(1_600_000_000_000)), text)
}

/// Draw and return the screen as text, one row per line, trailing blanks
/// trimmed.
fn screen(controller: &FeedController, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(|frame| ui::render(frame, controller, &Utc)).unwrap();

    let buffer = terminal.backend().buffer();
    (0..height)
        .map(|y| {
            let row: String = (0..width).map(|x| buffer[(x, y)].symbol()).collect();
            row.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn ready_room_layout() {
    let controller = booted(vec![message("see http://x.co/a!")]);

    insta::assert_snapshot!(screen(&controller, 64, 9), @r"
    ┌ Rooms ───────┐┌ General ─────────────────────────────────────┐
    │>General      ││9/13/2020, 12:26:40 PM ana: see http://x.co/a!│
    │ Random       ││                                              │
    │              ││                                              │
    └──────────────┘└──────────────────────────────────────────────┘
    ┌──────────────────────────────────────────────────────────────┐
    │> Message General                                             │
    └──────────────────────────────────────────────────────────────┘
     Connected | Room: General (r1) | Messages: 1
    ");
}

#[test]
fn booting_shows_loading_notice() {
    let mut controller = FeedController::new(ControllerConfig::default());
    controller.bootstrap();

    let text = screen(&controller, 80, 10);

    assert!(text.contains("No Room"));
    assert!(text.contains("Loading rooms..."));
    assert!(text.contains("Disconnected"));
}

#[test]
fn failed_listing_explains_and_offers_quit() {
    let mut controller = FeedController::new(ControllerConfig::default());
    controller.bootstrap();
    controller.handle(AppEvent::DirectoryLoaded {
        result: Err(HistoryError::Status { endpoint: "/userrooms".into(), status: 503 }),
        restored: None,
    });

    let text = screen(&controller, 100, 10);

    assert!(text.contains("Could not load rooms: /userrooms returned status 503"));
    assert!(text.contains("Press Esc to quit"));
}

#[test]
fn switch_shows_loading_until_replay() {
    let mut controller = booted(vec![message("old")]);
    controller.handle(AppEvent::Key(KeyInput::Tab));

    let text = screen(&controller, 80, 10);

    assert!(text.contains("┌ Random "));
    assert!(text.contains(">Random"));
    assert!(text.contains("Loading history..."));
    assert!(!text.contains("old"));
}

#[test]
fn history_failure_shows_warning() {
    let mut controller = booted(vec![]);
    controller.handle(AppEvent::Key(KeyInput::Tab));
    let ticket = controller.pending_replay().cloned().unwrap();
    controller.handle(AppEvent::HistoryLoaded {
        ticket,
        result: Err(HistoryError::Request("connection reset".into())),
        received_at: 0,
    });

    let text = screen(&controller, 120, 10);

    assert!(text.contains("No messages yet"));
    assert!(text.contains("Could not load history for Random: request failed: connection reset"));
}

#[test]
fn scrolling_back_hides_the_tail() {
    let history = (0..30).map(|i| message(&format!("m{i:02}"))).collect();
    let mut controller = booted(history);

    let text = screen(&controller, 80, 12);
    assert!(text.contains("m29"));

    controller.handle(AppEvent::Key(KeyInput::PageUp));
    let text = screen(&controller, 80, 12);

    assert!(text.contains("General [-12]"));
    assert!(text.contains("m17"));
    assert!(!text.contains("m29"));
}

#[test]
fn input_buffer_replaces_the_hint() {
    let mut controller = booted(vec![]);
    assert!(screen(&controller, 80, 10).contains("│> Message General"));

    controller.set_input("hello there");
    let text = screen(&controller, 80, 10);

    assert!(text.contains("│> hello there"));
    assert!(!text.contains("Message General"));
}
