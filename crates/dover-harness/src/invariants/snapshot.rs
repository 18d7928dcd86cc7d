//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture what a front end could observe at one point in time,
//! plus the frames sent so far. Invariants operate on snapshots rather than
//! live state so each check sees a consistent view.

use dover_app::{FeedController, Phase, ReplayTicket};
use dover_proto::{ClientFrame, RoomCode};

/// Snapshot of one client session.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Whether bootstrap completed.
    pub ready: bool,
    /// Whether bootstrap failed.
    pub failed: bool,
    /// Current room. `None` before bootstrap.
    pub current: Option<RoomCode>,
    /// Listed room codes in order.
    pub directory: Vec<RoomCode>,
    /// Session transition counter.
    pub generation: u64,
    /// Replay the feed is waiting on.
    pub pending_replay: Option<ReplayTicket>,
    /// Lines in the feed.
    pub feed_len: usize,
    /// Live messages held back for a replay.
    pub held: usize,
    /// Every frame sent so far, in order.
    pub sent: Vec<ClientFrame>,
}

impl SessionSnapshot {
    /// Capture the controller's observable state.
    pub fn from_controller(controller: &FeedController) -> Self {
        Self {
            ready: *controller.phase() == Phase::Ready,
            failed: matches!(controller.phase(), Phase::Failed(_)),
            current: controller.current_room().map(|room| room.code.clone()),
            directory: controller.directory().rooms().iter().map(|room| room.code.clone()).collect(),
            generation: controller.session().generation(),
            pending_replay: controller.pending_replay().cloned(),
            feed_len: controller.feed().len(),
            held: controller.held_count(),
            sent: Vec::new(),
        }
    }

    /// Attach the sent frame log.
    #[must_use]
    pub fn with_sent(mut self, sent: Vec<ClientFrame>) -> Self {
        self.sent = sent;
        self
    }
}
