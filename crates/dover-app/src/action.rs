//! Controller side effects.
//!
//! [`AppAction`] is every instruction the [`crate::FeedController`] hands to
//! the runtime. Actions are executed in the order they are returned.

use dover_proto::{AckId, ClientFrame, RoomCode};

use crate::ReplayTicket;

/// Actions produced by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Fetch the room listing and read the session slot.
    LoadRooms,

    /// Fetch recent history for a room.
    FetchHistory {
        /// Tag to return with the result.
        ticket: ReplayTicket,
        /// Maximum number of messages.
        limit: usize,
    },

    /// Send a frame on the channel.
    Emit(ClientFrame),

    /// Acknowledge a rendered delivery.
    Acknowledge(AckId),

    /// Remember the room in the session slot.
    PersistRoom(RoomCode),
}
