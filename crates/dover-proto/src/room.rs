//! Rooms and the `/userrooms` listing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Stable, opaque room key.
///
/// Codes are compared byte-for-byte; the client never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wrap a raw code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The code as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// A room the user may enter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Unique key within a session.
    pub code: RoomCode,
    /// Display name. Not unique.
    pub name: String,
}

impl Room {
    /// Create a room from a code and display name.
    pub fn new(code: impl Into<RoomCode>, name: impl Into<String>) -> Self {
        Self { code: code.into(), name: name.into() }
    }
}

/// One entry of the `/userrooms` response.
///
/// Current servers send `[code, name]` pairs. The earlier simplified mode
/// sent bare names that double as the code.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListingEntry {
    Pair(String, String),
    Name(String),
}

impl From<ListingEntry> for Room {
    fn from(entry: ListingEntry) -> Self {
        match entry {
            ListingEntry::Pair(code, name) => Self::new(code, name),
            ListingEntry::Name(name) => Self::new(name.clone(), name),
        }
    }
}

/// Decode a `/userrooms` body, preserving server order.
///
/// # Errors
///
/// - `ProtocolError::JsonDecode` if the body is not an array of pairs or
///   names. A single bad entry fails the whole listing.
pub fn parse_room_listing(body: &[u8]) -> Result<Vec<Room>> {
    let entries: Vec<ListingEntry> = serde_json::from_slice(body)?;
    Ok(entries.into_iter().map(Room::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_of_pairs_keeps_order() {
        let rooms = parse_room_listing(br#"[["r1","General"],["r2","Random"]]"#).unwrap();

        assert_eq!(rooms, vec![Room::new("r1", "General"), Room::new("r2", "Random")]);
    }

    #[test]
    fn listing_of_names_uses_name_as_code() {
        let rooms = parse_room_listing(br#"["lobby","ops"]"#).unwrap();

        assert_eq!(rooms[0].code.as_str(), "lobby");
        assert_eq!(rooms[0].name, "lobby");
        assert_eq!(rooms[1].code.as_str(), "ops");
    }

    #[test]
    fn listing_with_bad_entry_is_rejected() {
        assert!(parse_room_listing(br#"[["r1","General"], 42]"#).is_err());
        assert!(parse_room_listing(b"{}").is_err());
    }

    #[test]
    fn duplicate_names_are_allowed() {
        let rooms = parse_room_listing(br#"[["a","Same"],["b","Same"]]"#).unwrap();
        assert_eq!(rooms.len(), 2);
    }
}
