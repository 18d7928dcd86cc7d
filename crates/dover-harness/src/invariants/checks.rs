//! Standard invariant checks.
//!
//! These capture properties that must hold after every render, whatever
//! order inputs and fetch completions arrive in.

use dover_proto::{ClientFrame, RoomCode};

use super::{Invariant, InvariantResult, SessionSnapshot, Violation};

/// Current room must be listed in the directory.
pub struct CurrentRoomListed;

impl Invariant for CurrentRoomListed {
    fn name(&self) -> &'static str {
        "current_room_listed"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        match &state.current {
            Some(current) if !state.directory.contains(current) => Err(Violation {
                invariant: self.name(),
                message: format!("current room {current} not in directory {:?}", state.directory),
            }),
            _ => Ok(()),
        }
    }
}

/// A ready session always has a current room; a failed one never does.
pub struct ReadyHasRoom;

impl Invariant for ReadyHasRoom {
    fn name(&self) -> &'static str {
        "ready_has_room"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.ready && state.current.is_none() {
            return Err(Violation { invariant: self.name(), message: "ready without a room".into() });
        }
        if state.failed && state.current.is_some() {
            return Err(Violation {
                invariant: self.name(),
                message: format!("failed but in room {:?}", state.current),
            });
        }
        Ok(())
    }
}

/// The replay the feed waits on belongs to the current room and generation.
///
/// While waiting, the feed must be empty: history always lands first.
pub struct PendingReplayIsCurrent;

impl Invariant for PendingReplayIsCurrent {
    fn name(&self) -> &'static str {
        "pending_replay_is_current"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let Some(ticket) = &state.pending_replay else {
            return Ok(());
        };

        if state.current.as_ref() != Some(&ticket.room) || ticket.generation != state.generation {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "waiting on {}#{} while in {:?}#{}",
                    ticket.room, ticket.generation, state.current, state.generation
                ),
            });
        }
        if state.feed_len > 0 {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{} lines in feed before replay landed", state.feed_len),
            });
        }
        Ok(())
    }
}

/// Live messages are only held while something is still loading.
pub struct HeldOnlyWhileLoading;

impl Invariant for HeldOnlyWhileLoading {
    fn name(&self) -> &'static str {
        "held_only_while_loading"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let loading = state.pending_replay.is_some() || (!state.ready && !state.failed);
        if state.held > 0 && !loading {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{} messages held with nothing loading", state.held),
            });
        }
        Ok(())
    }
}

/// A `join` for another room is always preceded by a `leave` of the old one.
///
/// Re-joining the same room (reconnect) is allowed.
pub struct LeaveBeforeJoin;

impl Invariant for LeaveBeforeJoin {
    fn name(&self) -> &'static str {
        "leave_before_join"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let mut joined: Option<&RoomCode> = None;

        for (index, frame) in state.sent.iter().enumerate() {
            match frame {
                ClientFrame::Join { room_code } => {
                    if let Some(current) = joined
                        && current != room_code
                    {
                        return Err(Violation {
                            invariant: self.name(),
                            message: format!(
                                "frame {index}: join {room_code} while still in {current}"
                            ),
                        });
                    }
                    joined = Some(room_code);
                },
                ClientFrame::Leave { room_code } => {
                    if joined != Some(room_code) {
                        return Err(Violation {
                            invariant: self.name(),
                            message: format!("frame {index}: leave {room_code} while in {joined:?}"),
                        });
                    }
                    joined = None;
                },
                ClientFrame::ChatConnect { .. }
                | ClientFrame::Broadcast { .. }
                | ClientFrame::Ack { .. }
                | ClientFrame::Disconnect => {},
            }
        }
        Ok(())
    }
}
