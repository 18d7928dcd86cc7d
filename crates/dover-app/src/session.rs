//! Room session state machine.
//!
//! [`RoomSession`] owns which room the user is "in". It never performs I/O:
//! each transition returns the ordered list of side effects the caller must
//! carry out, so leave-before-join ordering is decided here and nowhere else.
//!
//! # States
//!
//! ```text
//! Uninitialized --bootstrap--> Active(room) --switch_room--> Active(room')
//! ```
//!
//! There is no way back to `Uninitialized`.
//!
//! # Staleness
//!
//! Every transition bumps a generation counter and hands out a
//! [`ReplayTicket`] for the history fetch it starts. A fetch result is only
//! applied while its ticket is still current, so a slow replay for a room the
//! user already left is dropped instead of leaking into the new feed.

use dover_proto::{ClientFrame, Room, RoomCode};
use thiserror::Error;

use crate::RoomDirectory;

/// Tag attached to an in-flight history replay.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplayTicket {
    /// Room the replay was requested for.
    pub room: RoomCode,
    /// Session generation at request time.
    pub generation: u64,
}

/// Errors from session transitions. None of them change state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// `switch_room` before `bootstrap`.
    #[error("no active room yet")]
    NotActive,

    /// `bootstrap` called twice.
    #[error("session already bootstrapped")]
    AlreadyActive,

    /// Target code is not in the directory.
    #[error("unknown room: {0}")]
    UnknownRoom(RoomCode),

    /// The directory has no rooms to choose from.
    #[error("room directory is empty")]
    EmptyDirectory,
}

/// Side effects of a session transition, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Send a frame on the channel.
    Emit(ClientFrame),
    /// Drop every line from the feed.
    ClearFeed,
    /// Remember the code in the session slot.
    Persist(RoomCode),
    /// Fetch and replay recent history.
    FetchHistory(ReplayTicket),
}

/// Lifecycle of the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Before the directory has loaded.
    #[default]
    Uninitialized,
    /// In a room.
    Active {
        /// The current room.
        room: Room,
    },
}

/// Current-room state machine.
#[derive(Debug, Clone, Default)]
pub struct RoomSession {
    state: SessionState,
    generation: u64,
}

impl RoomSession {
    /// Create an uninitialized session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the first room.
    ///
    /// `restored` wins when it is listed in the directory, otherwise the first
    /// room is used. Bootstrap does not write the slot: the restored value is
    /// either already there or the slot stays empty until the first switch.
    ///
    /// # Errors
    ///
    /// - `SessionError::AlreadyActive` if called more than once.
    /// - `SessionError::EmptyDirectory` if there is no room to enter.
    pub fn bootstrap(
        &mut self,
        directory: &RoomDirectory,
        restored: Option<&RoomCode>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        if matches!(self.state, SessionState::Active { .. }) {
            return Err(SessionError::AlreadyActive);
        }

        let restored_room = restored.and_then(|code| directory.get(code));
        if restored.is_some() && restored_room.is_none() {
            tracing::info!(code = ?restored, "restored room no longer listed, using first room");
        }

        let room = restored_room.or_else(|| directory.first()).ok_or(SessionError::EmptyDirectory)?;
        let room = room.clone();

        self.generation += 1;
        let ticket = ReplayTicket { room: room.code.clone(), generation: self.generation };
        let join = ClientFrame::Join { room_code: room.code.clone() };

        tracing::info!(code = %room.code, name = %room.name, "session bootstrapped");
        self.state = SessionState::Active { room };

        Ok(vec![SessionAction::Emit(join), SessionAction::FetchHistory(ticket)])
    }

    /// Move to another room (or re-enter the current one).
    ///
    /// The returned actions are, in order: leave the old room, clear the
    /// feed, persist the new code, join the new room, fetch its history. The
    /// current room is updated before this returns.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotActive` before bootstrap.
    /// - `SessionError::UnknownRoom` if `code` is not listed. Nothing is
    ///   emitted.
    pub fn switch_room(
        &mut self,
        directory: &RoomDirectory,
        code: &RoomCode,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let SessionState::Active { room: current } = &self.state else {
            return Err(SessionError::NotActive);
        };
        let target = directory.get(code).ok_or_else(|| SessionError::UnknownRoom(code.clone()))?;

        let leave = ClientFrame::Leave { room_code: current.code.clone() };
        let target = target.clone();

        self.generation += 1;
        tracing::debug!(from = %current.code, to = %target.code, generation = self.generation, "switching room");
        self.state = SessionState::Active { room: target.clone() };

        Ok(vec![
            SessionAction::Emit(leave),
            SessionAction::ClearFeed,
            SessionAction::Persist(target.code.clone()),
            SessionAction::Emit(ClientFrame::Join { room_code: target.code.clone() }),
            SessionAction::FetchHistory(ReplayTicket {
                room: target.code,
                generation: self.generation,
            }),
        ])
    }

    /// Whether a replay result may still be applied.
    pub fn is_current(&self, ticket: &ReplayTicket) -> bool {
        ticket.generation == self.generation && self.current_code() == Some(&ticket.room)
    }

    /// Lifecycle state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether bootstrap has completed.
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    /// Current room. `None` before bootstrap.
    pub fn current(&self) -> Option<&Room> {
        match &self.state {
            SessionState::Active { room } => Some(room),
            SessionState::Uninitialized => None,
        }
    }

    /// Current room code. `None` before bootstrap.
    pub fn current_code(&self) -> Option<&RoomCode> {
        self.current().map(|room| &room.code)
    }

    /// Current room display name. `None` before bootstrap.
    pub fn current_name(&self) -> Option<&str> {
        self.current().map(|room| room.name.as_str())
    }

    /// Transition counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
