//! Client I/O
//!
//! Production implementations of the two network surfaces the runtime talks
//! to. Protocol logic stays in [`dover_app`]; this crate only moves bytes.
//!
//! # Components
//!
//! - [`HttpHistoryLoader`]: [`dover_app::HistoryLoader`] over the
//!   `/userrooms` and `/last-msgs` endpoints
//! - [`transport::ChannelClient`]: WebSocket channel with automatic
//!   reconnection, surfaced as [`dover_proto::ServerFrame`]s
//! - [`TransportError`]: failures of either surface that are not per-fetch

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod http;
pub mod transport;

pub use error::TransportError;
pub use http::{HttpHistoryLoader, LAST_MESSAGES_PATH, ROOMS_PATH};
pub use transport::{CHANNEL_PATH, ChannelClient, ChannelConfig};
