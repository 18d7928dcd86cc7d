//! Application layer for Dover.
//!
//! Pure state machines and a generic runtime for the room session
//! synchronizer, so deterministic simulation runs the same code as the
//! terminal client.
//!
//! # Components
//!
//! - [`format_message`]: raw record to display-ready [`RenderedLine`]
//! - [`HistoryLoader`]: room listing and history source
//! - [`RoomSession`]: current-room state machine with stale replay guard
//! - [`Bridge`]: channel frame translation and outbound queue
//! - [`FeedController`]: composition root producing the live feed
//! - [`Driver`]: trait for platform-specific I/O
//! - [`Runtime`]: generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod bridge;
mod controller;
mod directory;
mod driver;
mod event;
mod feed;
mod format;
mod history;
mod input;
mod runtime;
mod session;
mod slot;
mod state;

pub use action::AppAction;
pub use bridge::{Bridge, CONNECT_GREETING};
pub use controller::{ControllerConfig, FeedController};
pub use directory::RoomDirectory;
pub use driver::{Driver, DriverEvent};
pub use event::AppEvent;
pub use feed::Feed;
pub use format::{
    DEFAULT_AUTHOR, RenderedLine, Segment, Timestamp, format_message, linkify, resolve_timestamp,
};
pub use history::{DEFAULT_HISTORY_LIMIT, HistoryError, HistoryLoader};
pub use input::{InputLine, KeyInput};
pub use runtime::{DEFAULT_HISTORY_TIMEOUT, Flow, Runtime, RuntimeConfig};
pub use session::{ReplayTicket, RoomSession, SessionAction, SessionError, SessionState};
pub use slot::{FileSlot, MemorySlot, SessionSlot};
pub use state::{ConnectionState, Phase, Status, StatusLevel};
