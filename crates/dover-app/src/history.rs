//! History loader seam.
//!
//! The room list and message history come from request/response endpoints.
//! [`HistoryLoader`] abstracts them so the runtime can drive either the HTTP
//! client or a scripted loader in simulation.

use std::{future::Future, time::Duration};

use dover_proto::{Room, RoomCode, WireMessage};
use thiserror::Error;

/// Messages replayed per room when nothing else is configured.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Failure of a single fetch. No retry is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Request never produced a response.
    #[error("request failed: {0}")]
    Request(String),

    /// Response had a non-success status.
    #[error("{endpoint} returned status {status}")]
    Status {
        /// Endpoint path.
        endpoint: String,
        /// HTTP status code.
        status: u16,
    },

    /// Body did not decode.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Fetch exceeded the configured bound.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Source of room listings and recent history.
///
/// Both operations are single-shot. Implementations must be cheap to clone
/// since each in-flight fetch owns a copy.
pub trait HistoryLoader: Clone + Send + Sync + 'static {
    /// Ordered room listing.
    ///
    /// # Errors
    ///
    /// Any failure; a partial listing is never returned.
    fn list_rooms(&self) -> impl Future<Output = Result<Vec<Room>, HistoryError>> + Send;

    /// Up to `limit` recent messages for `room`, in server order
    /// (oldest first).
    ///
    /// # Errors
    ///
    /// Any failure.
    fn last_messages(
        &self,
        room: &RoomCode,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<WireMessage>, HistoryError>> + Send;
}
