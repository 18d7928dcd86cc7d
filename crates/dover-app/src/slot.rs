//! Last-room memory.
//!
//! A session slot holds exactly one value: the code of the room the user was
//! last in. Reading it is best effort. A missing or unreadable slot just means
//! the session starts in the first listed room.

use std::{fs, io, path::PathBuf};

use dover_proto::RoomCode;

/// Storage for the last active room code.
pub trait SessionSlot: Send {
    /// Previously stored code, if any.
    fn load(&self) -> Option<RoomCode>;

    /// Replace the stored code. Failures are logged, never surfaced.
    fn store(&mut self, code: &RoomCode);
}

/// In-process slot. Lives as long as the runtime.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    code: Option<RoomCode>,
}

impl MemorySlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with a code, as after a reload.
    pub fn with_code(code: impl Into<RoomCode>) -> Self {
        Self { code: Some(code.into()) }
    }
}

impl SessionSlot for MemorySlot {
    fn load(&self) -> Option<RoomCode> {
        self.code.clone()
    }

    fn store(&mut self, code: &RoomCode) {
        self.code = Some(code.clone());
    }
}

/// Slot backed by a single small file.
///
/// The parent directory is created on first store.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    /// Slot stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write(&self, code: &RoomCode) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, code.as_str())
    }
}

impl SessionSlot for FileSlot {
    fn load(&self) -> Option<RoomCode> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let code = contents.trim();
                (!code.is_empty()).then(|| RoomCode::new(code))
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session slot unreadable");
                None
            },
        }
    }

    fn store(&mut self, code: &RoomCode) {
        if let Err(e) = self.write(code) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to persist room");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_slot_keeps_last_value() {
        let mut slot = MemorySlot::new();
        assert_eq!(slot.load(), None);

        slot.store(&"r1".into());
        slot.store(&"r2".into());
        assert_eq!(slot.load(), Some("r2".into()));
    }

    #[test]
    fn file_slot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session").join("room");

        let mut slot = FileSlot::new(&path);
        assert_eq!(slot.load(), None);
        slot.store(&"r2".into());

        assert_eq!(FileSlot::new(&path).load(), Some("r2".into()));
    }

    #[test]
    fn blank_file_means_no_room() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room");
        fs::write(&path, "  \n").unwrap();

        assert_eq!(FileSlot::new(path).load(), None);
    }
}
