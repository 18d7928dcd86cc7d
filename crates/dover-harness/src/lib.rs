//! Deterministic simulation harness for the Dover client.
//!
//! In-memory implementations of the [`dover_app::Driver`] and
//! [`dover_app::HistoryLoader`] traits, so the production runtime can be
//! driven step by step with fetch completion order under test control.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks behavioral properties after every render.
//! Invariants verify WHAT must be true across all interleavings, not specific
//! scenarios. Use [`InvariantRegistry::standard()`] for the full set.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod scripted_loader;
pub mod sim_driver;
pub mod simulation;

pub use invariants::{
    CurrentRoomListed, HeldOnlyWhileLoading, Invariant, InvariantRegistry, InvariantResult,
    LeaveBeforeJoin, PendingReplayIsCurrent, ReadyHasRoom, SessionSnapshot, Violation,
};
pub use scripted_loader::ScriptedLoader;
pub use sim_driver::{SIM_EPOCH, SimDriver, SimDriverError, SimHandle};
pub use simulation::{SETTLE_WINDOW, Simulation};
