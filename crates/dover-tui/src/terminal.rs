//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. The channel is a WebSocket
//! owned by [`ChannelClient`].

use std::{
    io::{self, Stdout, stdout},
    time::Duration,
};

use chrono::{Local, Utc};
use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use dover_app::{AppEvent, Driver, DriverEvent, FeedController, KeyInput, Timestamp};
use dover_client::{ChannelClient, ChannelConfig, TransportError};
use dover_proto::{ClientFrame, ServerFrame};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;

use crate::ui;

/// Interval between [`AppEvent::Tick`]s when nothing else happens.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Handles terminal I/O (crossterm), rendering (ratatui) and the channel
/// (tokio-tungstenite via [`ChannelClient`]).
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    channel: Option<ChannelClient>,
    channel_config: ChannelConfig,
}

impl TerminalDriver {
    /// Take over the terminal. The channel starts on [`Driver::connect`].
    pub fn new(channel_config: ChannelConfig) -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        let event_stream = EventStream::new();

        Ok(Self { terminal, event_stream, channel: None, channel_config })
    }
}

/// Convert a crossterm key press to a [`KeyInput`].
///
/// Ctrl-C maps to [`KeyInput::Esc`] so it quits like Esc does.
pub fn convert_key(key: KeyEvent) -> Option<KeyInput> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(KeyInput::Esc);
    }

    match key.code {
        KeyCode::Char(c) => Some(KeyInput::Char(c)),
        KeyCode::Enter => Some(KeyInput::Enter),
        KeyCode::Backspace => Some(KeyInput::Backspace),
        KeyCode::Delete => Some(KeyInput::Delete),
        KeyCode::Tab => Some(KeyInput::Tab),
        KeyCode::BackTab => Some(KeyInput::BackTab),
        KeyCode::Esc => Some(KeyInput::Esc),
        KeyCode::Left => Some(KeyInput::Left),
        KeyCode::Right => Some(KeyInput::Right),
        KeyCode::Up => Some(KeyInput::Up),
        KeyCode::Down => Some(KeyInput::Down),
        KeyCode::Home => Some(KeyInput::Home),
        KeyCode::End => Some(KeyInput::End),
        KeyCode::PageUp => Some(KeyInput::PageUp),
        KeyCode::PageDown => Some(KeyInput::PageDown),
        _ => None,
    }
}

/// Next frame from the channel; pending forever before connect.
async fn next_frame(channel: &mut Option<ChannelClient>) -> Option<ServerFrame> {
    match channel {
        Some(channel) => channel.recv().await,
        None => std::future::pending().await,
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn next_event(&mut self) -> Result<DriverEvent, Self::Error> {
        loop {
            tokio::select! {
                biased;

                maybe_event = self.event_stream.next() => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(input) = convert_key(key) {
                            return Ok(DriverEvent::Input(AppEvent::Key(input)));
                        }
                    },
                    Some(Ok(Event::Resize(cols, rows))) => {
                        return Ok(DriverEvent::Input(AppEvent::Resize(cols, rows)));
                    },
                    Some(Ok(_)) => {},
                    Some(Err(e)) => return Err(TerminalError::Io(e)),
                    None => return Ok(DriverEvent::Closed),
                },

                frame = next_frame(&mut self.channel) => match frame {
                    Some(frame) => return Ok(DriverEvent::Frame(frame)),
                    None => {
                        tracing::warn!("channel task ended");
                        return Ok(DriverEvent::Closed);
                    },
                },

                () = tokio::time::sleep(TICK_INTERVAL) => {
                    return Ok(DriverEvent::Input(AppEvent::Tick));
                }
            }
        }
    }

    async fn send_frame(&mut self, frame: ClientFrame) -> Result<(), Self::Error> {
        match &self.channel {
            Some(channel) => channel.send(frame).await.map_err(TerminalError::from),
            None => {
                tracing::debug!(event = frame.event_name(), "no channel, dropping frame");
                Ok(())
            },
        }
    }

    async fn connect(&mut self) -> Result<(), Self::Error> {
        self.channel = Some(ChannelClient::connect(self.channel_config.clone())?);
        Ok(())
    }

    fn now(&self) -> Timestamp {
        Utc::now().timestamp_millis()
    }

    fn render(&mut self, controller: &FeedController) -> Result<(), Self::Error> {
        self.terminal.draw(|frame| {
            ui::render(frame, controller, &Local);
        })?;
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(channel) = &mut self.channel {
            channel.close().await;
        }
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Option<KeyInput> {
        convert_key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn maps_editing_and_navigation_keys() {
        assert_eq!(press(KeyCode::Char('a'), KeyModifiers::NONE), Some(KeyInput::Char('a')));
        assert_eq!(press(KeyCode::Char('A'), KeyModifiers::SHIFT), Some(KeyInput::Char('A')));
        assert_eq!(press(KeyCode::BackTab, KeyModifiers::SHIFT), Some(KeyInput::BackTab));
        assert_eq!(press(KeyCode::PageUp, KeyModifiers::NONE), Some(KeyInput::PageUp));
        assert_eq!(press(KeyCode::F(5), KeyModifiers::NONE), None);
    }

    #[test]
    fn ctrl_c_quits() {
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::CONTROL), Some(KeyInput::Esc));
    }
}
