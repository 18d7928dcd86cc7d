//! Wire schema for the Dover chat protocol.
//!
//! Two surfaces share these types:
//!
//! - The request/response history endpoints (`/userrooms`, `/last-msgs`),
//!   decoded into [`Room`] lists and [`WireMessage`] records.
//! - The persistent channel, carrying [`ClientFrame`]s outbound and
//!   [`ServerFrame`]s inbound as JSON text envelopes.
//!
//! Message records have changed field names over the protocol's history.
//! [`WireMessage`] accepts every known variant and exposes one canonical shape
//! (`author`, `timestamp`, `text`); see its docs for the precedence order.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
mod frame;
mod message;
mod room;

pub use errors::{ProtocolError, Result};
pub use frame::{AckId, ClientFrame, ServerFrame};
pub use message::{RawTimestamp, WireMessage};
pub use room::{Room, RoomCode, parse_room_listing};
