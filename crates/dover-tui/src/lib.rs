//! Terminal UI for Dover
//!
//! A thin shell over [`dover_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`dover_app::Runtime`].
//!
//! This crate only handles terminal input, rendering, and process setup.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli;
pub mod terminal;
pub mod ui;

pub use cli::Args;
pub use dover_app::{AppAction, AppEvent, Bridge, Driver, FeedController, KeyInput, Runtime};
pub use terminal::{TerminalDriver, TerminalError};
