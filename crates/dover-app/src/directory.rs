//! Room directory.
//!
//! Built once per session from the `/userrooms` listing and read-only
//! afterwards. Keeps the server's order for the room picker.

use std::collections::HashMap;

use dover_proto::{Room, RoomCode};

/// Ordered `code → name` mapping.
///
/// # Invariants
///
/// - Codes are unique. When the listing repeats a code, the first occurrence
///   wins and later ones are dropped.
/// - `index[code]` is the position of that code in `rooms`.
#[derive(Debug, Clone, Default)]
pub struct RoomDirectory {
    rooms: Vec<Room>,
    index: HashMap<RoomCode, usize>,
}

impl RoomDirectory {
    /// Build a directory from a listing, preserving order.
    pub fn from_rooms(listing: impl IntoIterator<Item = Room>) -> Self {
        let mut directory = Self::default();

        for room in listing {
            if directory.index.contains_key(&room.code) {
                tracing::warn!(code = %room.code, "duplicate room code in listing, keeping first");
                continue;
            }
            directory.index.insert(room.code.clone(), directory.rooms.len());
            directory.rooms.push(room);
        }

        directory
    }

    /// Rooms in listing order.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Room with the given code.
    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.index.get(code).and_then(|&i| self.rooms.get(i))
    }

    /// Whether the code is listed.
    pub fn contains(&self, code: &RoomCode) -> bool {
        self.index.contains_key(code)
    }

    /// First room in listing order.
    pub fn first(&self) -> Option<&Room> {
        self.rooms.first()
    }

    /// Position of a code in listing order.
    pub fn position(&self, code: &RoomCode) -> Option<usize> {
        self.index.get(code).copied()
    }

    /// Room after `code`, wrapping around. Used by the picker.
    pub fn next_after(&self, code: &RoomCode) -> Option<&Room> {
        let len = self.rooms.len();
        let next = self.position(code).map_or(0, |i| (i + 1) % len);
        self.rooms.get(next)
    }

    /// Room before `code`, wrapping around.
    pub fn prev_before(&self, code: &RoomCode) -> Option<&Room> {
        let len = self.rooms.len();
        let prev = self.position(code).map_or(0, |i| (i + len - 1) % len);
        self.rooms.get(prev)
    }

    /// Number of rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether the listing was empty.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
