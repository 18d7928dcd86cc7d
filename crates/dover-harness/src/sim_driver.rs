//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing, so the same [`dover_app::Runtime`] orchestration
//! code runs in both production and simulation. The test keeps a
//! [`SimHandle`] to inject input and channel frames, move the clock and
//! inspect what was sent.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dover_app::{AppEvent, Driver, DriverEvent, FeedController, KeyInput, Timestamp};
use dover_proto::{ClientFrame, ServerFrame};
use tokio::sync::mpsc;

use crate::invariants::{InvariantRegistry, SessionSnapshot};

/// Error type for simulation driver.
#[derive(Debug, Clone, thiserror::Error)]
#[error("SimDriverError: {0}")]
pub struct SimDriverError(pub String);

/// Clock reading the simulation starts at.
pub const SIM_EPOCH: Timestamp = 1_700_000_000_000;

/// State shared between the driver and its handle.
#[derive(Debug)]
struct SharedState {
    sent: Vec<ClientFrame>,
    clock: Timestamp,
    renders: usize,
    connected: bool,
    stopped: bool,
    /// First invariant violation seen during a render.
    violation: Option<String>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            sent: Vec::new(),
            clock: SIM_EPOCH,
            renders: 0,
            connected: false,
            stopped: false,
            violation: None,
        }
    }
}

fn lock(state: &Mutex<SharedState>) -> MutexGuard<'_, SharedState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulation driver for deterministic testing.
pub struct SimDriver {
    events: mpsc::UnboundedReceiver<DriverEvent>,
    state: Arc<Mutex<SharedState>>,
    invariants: Option<InvariantRegistry>,
}

/// Test-side handle to a [`SimDriver`].
///
/// Dropping every handle closes the driver's input, which stops the runtime.
#[derive(Clone)]
pub struct SimHandle {
    events: mpsc::UnboundedSender<DriverEvent>,
    state: Arc<Mutex<SharedState>>,
}

impl SimDriver {
    /// Create a driver and its handle.
    pub fn new() -> (Self, SimHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(SharedState::default()));
        let driver = Self { events: rx, state: Arc::clone(&state), invariants: None };
        (driver, SimHandle { events: tx, state })
    }

    /// Enable invariant checking on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    fn check_invariants(&self, controller: &FeedController) {
        let Some(registry) = &self.invariants else {
            return;
        };

        let mut state = lock(&self.state);
        let snapshot = SessionSnapshot::from_controller(controller).with_sent(state.sent.clone());
        if let Err(violations) = registry.check_all(&snapshot)
            && state.violation.is_none()
        {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            tracing::error!(violations = ?messages, "invariant violated");
            state.violation = Some(messages.join("\n  "));
        }
    }
}

impl SimHandle {
    /// Inject an `AppEvent` for processing.
    pub fn inject_event(&self, event: AppEvent) {
        self.push(DriverEvent::Input(event));
    }

    /// Inject a key press.
    pub fn press(&self, key: KeyInput) {
        self.inject_event(AppEvent::Key(key));
    }

    /// Type text into the input line, one key per character.
    pub fn type_text(&self, text: &str) {
        for c in text.chars() {
            self.press(KeyInput::Char(c));
        }
    }

    /// Inject a frame from the server.
    pub fn inject_frame(&self, frame: ServerFrame) {
        self.push(DriverEvent::Frame(frame));
    }

    /// Inject a tick event.
    pub fn inject_tick(&self) {
        self.inject_event(AppEvent::Tick);
    }

    /// Ask the runtime to stop as if input closed.
    pub fn close(&self) {
        self.push(DriverEvent::Closed);
    }

    /// Move the simulated wall clock forward.
    pub fn advance_clock(&self, millis: i64) {
        lock(&self.state).clock += millis;
    }

    /// Current simulated wall clock.
    pub fn clock(&self) -> Timestamp {
        lock(&self.state).clock
    }

    /// Every frame sent so far, in order.
    pub fn sent(&self) -> Vec<ClientFrame> {
        lock(&self.state).sent.clone()
    }

    /// Number of renders performed.
    pub fn renders(&self) -> usize {
        lock(&self.state).renders
    }

    /// Whether the runtime asked the driver to connect.
    pub fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }

    /// Whether the runtime stopped the driver.
    pub fn is_stopped(&self) -> bool {
        lock(&self.state).stopped
    }

    /// First invariant violation observed, if any.
    pub fn violation(&self) -> Option<String> {
        lock(&self.state).violation.clone()
    }

    fn push(&self, event: DriverEvent) {
        if self.events.send(event).is_err() {
            tracing::warn!("simulation driver dropped, event discarded");
        }
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn next_event(&mut self) -> Result<DriverEvent, Self::Error> {
        Ok(self.events.recv().await.unwrap_or(DriverEvent::Closed))
    }

    async fn send_frame(&mut self, frame: ClientFrame) -> Result<(), Self::Error> {
        lock(&self.state).sent.push(frame);
        Ok(())
    }

    async fn connect(&mut self) -> Result<(), Self::Error> {
        lock(&self.state).connected = true;
        Ok(())
    }

    fn now(&self) -> Timestamp {
        lock(&self.state).clock
    }

    fn render(&mut self, controller: &FeedController) -> Result<(), Self::Error> {
        lock(&self.state).renders += 1;
        self.check_invariants(controller);
        Ok(())
    }

    async fn stop(&mut self) {
        let mut state = lock(&self.state);
        state.stopped = true;
        state.connected = false;
    }
}

#[cfg(test)]
mod tests {
    use dover_app::ControllerConfig;

    use super::*;

    #[tokio::test]
    async fn injected_events_arrive_in_order() {
        let (mut driver, handle) = SimDriver::new();
        handle.press(KeyInput::Char('a'));
        handle.inject_frame(ServerFrame::Connect);

        assert_eq!(
            driver.next_event().await.unwrap(),
            DriverEvent::Input(AppEvent::Key(KeyInput::Char('a')))
        );
        assert_eq!(driver.next_event().await.unwrap(), DriverEvent::Frame(ServerFrame::Connect));
    }

    #[tokio::test]
    async fn dropping_handle_closes_input() {
        let (mut driver, handle) = SimDriver::new();
        drop(handle);

        assert_eq!(driver.next_event().await.unwrap(), DriverEvent::Closed);
    }

    #[tokio::test]
    async fn send_frame_captures() {
        let (mut driver, handle) = SimDriver::new();
        driver.send_frame(ClientFrame::Disconnect).await.unwrap();

        assert_eq!(handle.sent(), vec![ClientFrame::Disconnect]);
    }

    #[test]
    fn clock_is_controlled_by_handle() {
        let (driver, handle) = SimDriver::new();
        handle.advance_clock(5);

        assert_eq!(driver.now(), SIM_EPOCH + 5);
    }

    #[test]
    fn render_counts_and_checks() {
        let (driver, handle) = SimDriver::new();
        let mut driver = driver.with_invariants(InvariantRegistry::standard());
        let controller = FeedController::new(ControllerConfig::default());
        driver.render(&controller).unwrap();

        assert_eq!(handle.renders(), 1);
        assert!(handle.violation().is_none());
    }
}
