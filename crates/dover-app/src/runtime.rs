//! Generic runtime for application orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`FeedController`]: room and feed state machine
//! - [`Bridge`]: channel frame translation
//! - [`Driver`]: platform-specific I/O
//! - [`HistoryLoader`] and [`SessionSlot`]: fetches and last-room memory
//!
//! Fetches run as tasks in a [`JoinSet`] so any number can be in flight and
//! finish in any order. Their results come back through the same loop as
//! input and channel frames, which keeps every controller mutation on one
//! logical thread.

use std::{future::Future, time::Duration};

use dover_proto::{Room, RoomCode, WireMessage};
use tokio::task::JoinSet;

use crate::{
    AppAction, AppEvent, Bridge, ControllerConfig, Driver, DriverEvent, FeedController,
    HistoryError, HistoryLoader, ReplayTicket, SessionSlot,
};

/// Default bound on a single fetch.
pub const DEFAULT_HISTORY_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Bound on each fetch. `None` waits forever.
    pub history_timeout: Option<Duration>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { history_timeout: Some(DEFAULT_HISTORY_TIMEOUT) }
    }
}

/// Whether the loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep stepping.
    Continue,
    /// Stop the loop.
    Quit,
}

/// Completed fetch, before it is stamped with the driver clock.
enum Fetched {
    Directory { result: Result<Vec<Room>, HistoryError>, restored: Option<RoomCode> },
    History { ticket: ReplayTicket, result: Result<Vec<WireMessage>, HistoryError> },
}

/// Generic runtime that orchestrates the controller, bridge and driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `L`: Room listing and history source
/// - `S`: Last-room memory
pub struct Runtime<D, L, S>
where
    D: Driver,
    L: HistoryLoader,
    S: SessionSlot,
{
    driver: D,
    loader: L,
    slot: S,
    controller: FeedController,
    bridge: Bridge,
    fetches: JoinSet<Fetched>,
    config: RuntimeConfig,
}

impl<D, L, S> Runtime<D, L, S>
where
    D: Driver,
    L: HistoryLoader,
    S: SessionSlot,
{
    /// Create a runtime. Nothing happens until [`Runtime::start`].
    pub fn new(
        driver: D,
        loader: L,
        slot: S,
        controller: ControllerConfig,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            driver,
            loader,
            slot,
            controller: FeedController::new(controller),
            bridge: Bridge::new(),
            fetches: JoinSet::new(),
            config,
        }
    }

    /// Run the main event loop until the controller quits or input closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        let mut flow = self.start().await?;
        while flow == Flow::Continue {
            flow = self.step().await?;
        }

        self.shutdown().await;
        Ok(())
    }

    /// Render, start the channel and begin loading rooms.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to render or connect.
    pub async fn start(&mut self) -> Result<Flow, D::Error> {
        self.driver.render(&self.controller)?;

        let actions = self.controller.handle(AppEvent::Connecting);
        self.process_actions(actions).await?;
        self.driver.connect().await?;

        let actions = self.controller.bootstrap();
        self.process_actions(actions).await
    }

    /// Wait for one input, frame or finished fetch and process it.
    ///
    /// Cancel-safe between iterations: dropping the future while it waits
    /// loses nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn step(&mut self) -> Result<Flow, D::Error> {
        tokio::select! {
            biased;

            Some(joined) = self.fetches.join_next() => match joined {
                Ok(fetched) => {
                    let event = self.stamp(fetched);
                    let actions = self.controller.handle(event);
                    self.process_actions(actions).await
                },
                Err(e) => {
                    tracing::error!(error = %e, "fetch task failed");
                    Ok(Flow::Continue)
                },
            },
            event = self.driver.next_event() => match event? {
                DriverEvent::Input(event) => {
                    let actions = self.controller.handle(event);
                    self.process_actions(actions).await
                },
                DriverEvent::Frame(frame) => {
                    let now = self.driver.now();
                    let events = self.bridge.handle_frame(frame, now);
                    self.send_outgoing_frames().await;
                    self.process_bridge_events(events).await
                },
                DriverEvent::Closed => Ok(Flow::Quit),
            },
        }
    }

    /// Abort outstanding fetches and stop the driver.
    pub async fn shutdown(&mut self) {
        self.fetches.abort_all();
        self.driver.stop().await;
    }

    /// Execute controller actions in order.
    async fn process_actions(&mut self, actions: Vec<AppAction>) -> Result<Flow, D::Error> {
        for action in actions {
            match action {
                AppAction::Render => self.driver.render(&self.controller)?,
                AppAction::Quit => {
                    self.send_outgoing_frames().await;
                    return Ok(Flow::Quit);
                },
                AppAction::LoadRooms => self.spawn_directory_load(),
                AppAction::FetchHistory { ticket, limit } => self.spawn_history_fetch(ticket, limit),
                AppAction::PersistRoom(code) => self.slot.store(&code),
                AppAction::Emit(_) | AppAction::Acknowledge(_) => {
                    self.bridge.process_app_action(&action);
                    self.send_outgoing_frames().await;
                },
            }
        }
        Ok(Flow::Continue)
    }

    /// Feed bridge events back into the controller.
    async fn process_bridge_events(&mut self, events: Vec<AppEvent>) -> Result<Flow, D::Error> {
        for event in events {
            let actions = self.controller.handle(event);
            if self.process_actions(actions).await? == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    fn spawn_directory_load(&mut self) {
        let loader = self.loader.clone();
        let restored = self.slot.load();
        let timeout = self.config.history_timeout;

        self.fetches.spawn(async move {
            let result = bounded(timeout, loader.list_rooms()).await;
            Fetched::Directory { result, restored }
        });
    }

    fn spawn_history_fetch(&mut self, ticket: ReplayTicket, limit: usize) {
        let loader = self.loader.clone();
        let timeout = self.config.history_timeout;

        self.fetches.spawn(async move {
            let result = bounded(timeout, loader.last_messages(&ticket.room, limit)).await;
            Fetched::History { ticket, result }
        });
    }

    fn stamp(&self, fetched: Fetched) -> AppEvent {
        match fetched {
            Fetched::Directory { result, restored } => AppEvent::DirectoryLoaded { result, restored },
            Fetched::History { ticket, result } => {
                AppEvent::HistoryLoaded { ticket, result, received_at: self.driver.now() }
            },
        }
    }

    /// Send all pending outgoing frames. Emits are fire-and-forget.
    async fn send_outgoing_frames(&mut self) {
        for frame in self.bridge.take_outgoing() {
            let event = frame.event_name();
            if let Err(e) = self.driver.send_frame(frame).await {
                tracing::warn!(event, error = %e, "failed to send frame");
            }
        }
    }

    /// Get a reference to the controller.
    pub fn controller(&self) -> &FeedController {
        &self.controller
    }

    /// Get a reference to the driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the driver.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Get a reference to the session slot.
    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Get a reference to the bridge.
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Number of fetches still running.
    pub fn fetches_in_flight(&self) -> usize {
        self.fetches.len()
    }
}

async fn bounded<T>(
    limit: Option<Duration>,
    fetch: impl Future<Output = Result<T, HistoryError>>,
) -> Result<T, HistoryError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fetch)
            .await
            .unwrap_or_else(|_| Err(HistoryError::Timeout(limit))),
        None => fetch.await,
    }
}
