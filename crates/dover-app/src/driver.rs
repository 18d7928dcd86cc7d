//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the runtime from the terminal, the channel
//! and the clock. Each front end implements it, while the generic
//! [`crate::Runtime`] handles all orchestration.

use std::future::Future;

use dover_proto::{ClientFrame, ServerFrame};

use crate::{AppEvent, FeedController, Timestamp};

/// Something the driver has for the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    /// User or system input.
    Input(AppEvent),
    /// Frame from the channel.
    Frame(ServerFrame),
    /// Input source is gone; the runtime should stop.
    Closed,
}

/// Abstracts I/O operations for the runtime.
///
/// # Implementations
///
/// - **TUI**: crossterm for terminal events, WebSocket channel transport
/// - **Simulation**: in-memory queues fed by the test
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input or channel frame.
    ///
    /// Must be cancel-safe: the runtime races it against fetch completions
    /// and drops it when a fetch wins.
    fn next_event(&mut self) -> impl Future<Output = Result<DriverEvent, Self::Error>> + Send;

    /// Send a frame on the channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame could not be handed to the transport.
    fn send_frame(
        &mut self,
        frame: ClientFrame,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Start the channel. Reconnection after this is the transport's job.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be started.
    fn connect(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Wall-clock time in epoch milliseconds.
    fn now(&self) -> Timestamp;

    /// Render the controller state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, controller: &FeedController) -> Result<(), Self::Error>;

    /// Stop the channel and clean up resources. Frames already handed to
    /// [`Driver::send_frame`] should reach the server before the channel
    /// closes.
    fn stop(&mut self) -> impl Future<Output = ()> + Send;
}
