//! Whole-runtime simulation.
//!
//! [`Simulation`] wires a [`Runtime`] to a [`SimDriver`], a
//! [`ScriptedLoader`] and a [`MemorySlot`], with the standard invariants
//! checked on every render.
//!
//! Tests inject input through [`Simulation::handle`] and then call
//! [`Simulation::settle`], which steps the runtime until nothing is left to
//! do. Run under a paused tokio clock (`start_paused = true`) so the settle
//! window and fetch timeouts advance virtually.

use std::time::Duration;

use dover_app::{
    ControllerConfig, FeedController, Flow, MemorySlot, Runtime, RuntimeConfig, SessionSlot,
};
use dover_proto::RoomCode;

use crate::{InvariantRegistry, ScriptedLoader, SimDriver, SimDriverError, SimHandle};

/// How long the runtime must stay idle before [`Simulation::settle`] returns.
pub const SETTLE_WINDOW: Duration = Duration::from_millis(50);

/// Runtime under test plus the handles that drive it.
pub struct Simulation {
    runtime: Runtime<SimDriver, ScriptedLoader, MemorySlot>,
    handle: SimHandle,
    loader: ScriptedLoader,
    flow: Flow,
}

impl Simulation {
    /// Simulation with an empty slot and no fetch timeout.
    pub fn new(loader: ScriptedLoader) -> Self {
        Self::with_slot(loader, MemorySlot::new())
    }

    /// Simulation starting from a pre-filled slot, as after a reload.
    pub fn with_slot(loader: ScriptedLoader, slot: MemorySlot) -> Self {
        Self::with_config(loader, slot, RuntimeConfig { history_timeout: None })
    }

    /// Simulation with explicit runtime tunables.
    pub fn with_config(loader: ScriptedLoader, slot: MemorySlot, config: RuntimeConfig) -> Self {
        let (driver, handle) = SimDriver::new();
        let driver = driver.with_invariants(InvariantRegistry::standard());
        let runtime =
            Runtime::new(driver, loader.clone(), slot, ControllerConfig::default(), config);

        Self { runtime, handle, loader, flow: Flow::Continue }
    }

    /// Start the runtime and settle.
    pub async fn start(&mut self) -> Result<Flow, SimDriverError> {
        self.flow = self.runtime.start().await?;
        self.settle().await
    }

    /// Step until the runtime quits or stays idle for [`SETTLE_WINDOW`].
    pub async fn settle(&mut self) -> Result<Flow, SimDriverError> {
        while self.flow == Flow::Continue {
            match tokio::time::timeout(SETTLE_WINDOW, self.runtime.step()).await {
                Ok(flow) => self.flow = flow?,
                Err(_) => break,
            }
        }

        if self.flow == Flow::Quit {
            self.runtime.shutdown().await;
        }
        Ok(self.flow)
    }

    /// Test-side driver handle.
    pub fn handle(&self) -> &SimHandle {
        &self.handle
    }

    /// Scripted loader shared with the runtime.
    pub fn loader(&self) -> &ScriptedLoader {
        &self.loader
    }

    /// Controller state.
    pub fn controller(&self) -> &FeedController {
        self.runtime.controller()
    }

    /// Room stored in the session slot.
    pub fn stored_room(&self) -> Option<RoomCode> {
        self.runtime.slot().load()
    }

    /// Plain text of every feed line, in order.
    pub fn feed_texts(&self) -> Vec<String> {
        self.controller().feed().lines().iter().map(|line| line.plain_text()).collect()
    }

    /// Current room code.
    pub fn current_code(&self) -> Option<&str> {
        self.controller().current_room().map(|room| room.code.as_str())
    }

    /// Fetches still running.
    pub fn fetches_in_flight(&self) -> usize {
        self.runtime.fetches_in_flight()
    }

    /// Fail with the first invariant violation seen, if any.
    ///
    /// # Errors
    ///
    /// Returns the violation report.
    pub fn check(&self) -> Result<(), SimDriverError> {
        match self.handle.violation() {
            Some(report) => Err(SimDriverError(format!("invariant violation:\n  {report}"))),
            None => Ok(()),
        }
    }
}
