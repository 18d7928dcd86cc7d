//! Controller input events.
//!
//! [`AppEvent`] is every input that drives the [`crate::FeedController`].
//! Events come from three places:
//! - the user (keys, resize) and the clock,
//! - the channel, translated by the [`crate::Bridge`],
//! - completed fetches, delivered by the [`crate::Runtime`].

use dover_proto::{AckId, Room, RoomCode, WireMessage};

use crate::{HistoryError, KeyInput, ReplayTicket, Timestamp};

/// Events processed by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Channel connection in progress.
    Connecting,

    /// Channel is up.
    Connected,

    /// Channel dropped.
    Disconnected,

    /// Room listing fetch finished.
    DirectoryLoaded {
        /// Listing or the reason it failed.
        result: Result<Vec<Room>, HistoryError>,
        /// Code read from the session slot.
        restored: Option<RoomCode>,
    },

    /// History fetch finished.
    HistoryLoaded {
        /// Tag issued when the fetch started.
        ticket: ReplayTicket,
        /// Messages or the reason the fetch failed.
        result: Result<Vec<WireMessage>, HistoryError>,
        /// Clock reading when the result arrived.
        received_at: Timestamp,
    },

    /// Live chat message.
    MessageReceived {
        /// Message record.
        message: WireMessage,
        /// Acknowledgment owed after rendering.
        ack: Option<AckId>,
        /// Clock reading when the frame arrived.
        received_at: Timestamp,
    },

    /// Someone entered a room.
    UserJoined {
        /// Server notice.
        notice: String,
    },

    /// Someone left a room.
    UserLeft {
        /// Server notice.
        notice: String,
    },

    /// User picked a room from the directory.
    RoomPicked {
        /// Target room.
        code: RoomCode,
    },
}
