//! Feed controller.
//!
//! [`FeedController`] is the composition root of the client. It owns the
//! room directory, the [`RoomSession`], the rendered [`Feed`] and the input
//! line, and is the only place they change.
//!
//! This is a pure state machine: it consumes [`AppEvent`]s and produces
//! [`AppAction`]s. Fetches, channel writes and slot writes are carried out by
//! the runtime.
//!
//! # Replay ordering
//!
//! After a switch the feed stays empty until the replay for the new room
//! resolves. Live messages that arrive in the meantime are held back and
//! appended right after the replayed history, so history always precedes live
//! traffic. Held messages are acknowledged once appended. If the user
//! switches again before the replay lands, held messages are dropped with the
//! old feed and acknowledged immediately.

use dover_proto::{AckId, ClientFrame, Room, RoomCode, WireMessage};

use crate::{
    AppAction, AppEvent, ConnectionState, DEFAULT_HISTORY_LIMIT, Feed, HistoryError, InputLine,
    KeyInput, Phase, ReplayTicket, RoomDirectory, RoomSession, SessionAction, Status, Timestamp,
    format_message,
};

/// Controller tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Messages replayed per room.
    pub history_limit: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { history_limit: DEFAULT_HISTORY_LIMIT }
    }
}

/// Live message waiting for a replay to land.
#[derive(Debug, Clone)]
struct HeldMessage {
    message: WireMessage,
    ack: Option<AckId>,
    received_at: Timestamp,
}

/// Room feed state machine.
#[derive(Debug, Clone)]
pub struct FeedController {
    config: ControllerConfig,
    phase: Phase,
    connection: ConnectionState,
    directory: RoomDirectory,
    session: RoomSession,
    feed: Feed,
    input: InputLine,
    /// Replay the feed is waiting on. `None` once it resolved.
    pending_replay: Option<ReplayTicket>,
    held: Vec<HeldMessage>,
    status: Option<Status>,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
}

impl FeedController {
    /// Create a controller waiting for bootstrap.
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            phase: Phase::Booting,
            connection: ConnectionState::Disconnected,
            directory: RoomDirectory::default(),
            session: RoomSession::new(),
            feed: Feed::new(),
            input: InputLine::new(),
            pending_replay: None,
            held: Vec::new(),
            status: None,
            terminal_size: (80, 24),
        }
    }

    /// Start loading the room listing.
    pub fn bootstrap(&mut self) -> Vec<AppAction> {
        self.phase = Phase::Booting;
        self.status = Some(Status::info("Loading rooms..."));
        vec![AppAction::LoadRooms, AppAction::Render]
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Tick => vec![],
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::Connecting => {
                self.connection = ConnectionState::Connecting;
                vec![AppAction::Render]
            },
            AppEvent::Connected => {
                tracing::info!("channel connected");
                self.connection = ConnectionState::Connected;
                vec![AppAction::Render]
            },
            AppEvent::Disconnected => {
                tracing::info!("channel disconnected");
                self.connection = ConnectionState::Disconnected;
                self.status = Some(Status::warning("Connection lost, reconnecting..."));
                vec![AppAction::Render]
            },
            AppEvent::DirectoryLoaded { result, restored } => {
                self.on_directory_loaded(result, restored)
            },
            AppEvent::HistoryLoaded { ticket, result, received_at } => {
                self.on_history_loaded(&ticket, result, received_at)
            },
            AppEvent::MessageReceived { message, ack, received_at } => {
                self.on_incoming_message(message, ack, received_at)
            },
            AppEvent::UserJoined { notice } | AppEvent::UserLeft { notice } => {
                self.status = Some(Status::info(notice));
                vec![AppAction::Render]
            },
            AppEvent::RoomPicked { code } => self.on_room_picked(&code),
        }
    }

    /// Finish bootstrap with the room listing.
    ///
    /// A failed or empty listing is fatal: the controller enters
    /// [`Phase::Failed`] and only quitting remains possible.
    pub fn on_directory_loaded(
        &mut self,
        result: Result<Vec<Room>, HistoryError>,
        restored: Option<RoomCode>,
    ) -> Vec<AppAction> {
        if self.phase != Phase::Booting {
            tracing::warn!("room listing arrived after bootstrap, ignoring");
            return vec![];
        }

        let rooms = match result {
            Ok(rooms) => rooms,
            Err(e) => return self.fail(format!("Could not load rooms: {e}")),
        };

        self.directory = RoomDirectory::from_rooms(rooms);
        match self.session.bootstrap(&self.directory, restored.as_ref()) {
            Ok(steps) => {
                self.phase = Phase::Ready;
                self.status = None;
                let mut actions = self.apply(steps);
                actions.push(AppAction::Render);
                actions
            },
            Err(e) => self.fail(format!("Could not enter a room: {e}")),
        }
    }

    /// Apply a finished history fetch.
    ///
    /// Results whose ticket is no longer current are discarded. A failed
    /// fetch leaves the feed empty and shows a warning; the next switch
    /// retries.
    pub fn on_history_loaded(
        &mut self,
        ticket: &ReplayTicket,
        result: Result<Vec<WireMessage>, HistoryError>,
        received_at: Timestamp,
    ) -> Vec<AppAction> {
        if self.pending_replay.as_ref() != Some(ticket) || !self.session.is_current(ticket) {
            tracing::debug!(room = %ticket.room, generation = ticket.generation, "discarding stale replay");
            return vec![];
        }
        self.pending_replay = None;

        match result {
            Ok(messages) => {
                tracing::debug!(room = %ticket.room, count = messages.len(), "replaying history");
                for message in &messages {
                    self.feed.append(format_message(message, received_at));
                }
            },
            Err(e) => {
                tracing::warn!(room = %ticket.room, error = %e, "history load failed");
                let name = self.session.current_name().unwrap_or(ticket.room.as_str());
                self.status = Some(Status::warning(format!("Could not load history for {name}: {e}")));
            },
        }

        let mut actions = vec![AppAction::Render];
        for held in std::mem::take(&mut self.held) {
            self.feed.append(format_message(&held.message, held.received_at));
            actions.extend(held.ack.map(AppAction::Acknowledge));
        }
        actions
    }

    /// Append a live message in receive order.
    ///
    /// The acknowledgment, if any, follows the render. Routing is the
    /// server's job, so a message tagged for another room is still shown.
    pub fn on_incoming_message(
        &mut self,
        message: WireMessage,
        ack: Option<AckId>,
        received_at: Timestamp,
    ) -> Vec<AppAction> {
        if let Some(room) = self.foreign_room(&message) {
            tracing::debug!(%room, "message tagged for another room");
        }

        match self.phase {
            Phase::Failed(_) => {
                tracing::debug!("dropping message while failed");
                ack.map(AppAction::Acknowledge).into_iter().collect()
            },
            Phase::Booting => {
                self.held.push(HeldMessage { message, ack, received_at });
                vec![]
            },
            Phase::Ready if self.pending_replay.is_some() => {
                self.held.push(HeldMessage { message, ack, received_at });
                vec![]
            },
            Phase::Ready => {
                self.feed.append(format_message(&message, received_at));
                let mut actions = vec![AppAction::Render];
                actions.extend(ack.map(AppAction::Acknowledge));
                actions
            },
        }
    }

    /// Room a message claims to belong to, when that is not the current one.
    fn foreign_room<'m>(&self, message: &'m WireMessage) -> Option<&'m RoomCode> {
        let current = &self.session.current()?.code;
        message.room_code.as_ref().filter(|room| *room != current)
    }

    /// Send `text` to the current room.
    ///
    /// Only the exact empty string is rejected; whitespace is sent as is. The
    /// input line is cleared once the frame is queued.
    pub fn submit(&mut self, text: &str) -> Vec<AppAction> {
        if text.is_empty() {
            return vec![];
        }

        let Some(room_code) = self.session.current_code().cloned() else {
            self.status = Some(Status::warning("Not in a room yet"));
            return vec![AppAction::Render];
        };

        self.input.clear();
        vec![
            AppAction::Emit(ClientFrame::Broadcast { message_text: text.to_string(), room_code }),
            AppAction::Render,
        ]
    }

    /// Switch to the picked room.
    pub fn on_room_picked(&mut self, code: &RoomCode) -> Vec<AppAction> {
        if self.phase != Phase::Ready {
            tracing::debug!(%code, "room picked before bootstrap, ignoring");
            return vec![];
        }

        match self.session.switch_room(&self.directory, code) {
            Ok(steps) => {
                self.status = None;
                let mut actions = self.apply(steps);
                actions.push(AppAction::Render);
                actions
            },
            Err(e) => {
                tracing::warn!(%code, error = %e, "room switch rejected");
                self.status = Some(Status::warning(e.to_string()));
                vec![AppAction::Render]
            },
        }
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        if key == KeyInput::Esc {
            return vec![AppAction::Emit(ClientFrame::Disconnect), AppAction::Quit];
        }
        if matches!(self.phase, Phase::Failed(_)) {
            return vec![];
        }

        match key {
            KeyInput::Enter => {
                let text = self.input.text().to_string();
                self.submit(&text)
            },
            KeyInput::Tab | KeyInput::Down => self.pick_neighbor(RoomDirectory::next_after),
            KeyInput::BackTab | KeyInput::Up => self.pick_neighbor(RoomDirectory::prev_before),
            KeyInput::PageUp => {
                self.feed.scroll_up(self.page_size());
                vec![AppAction::Render]
            },
            KeyInput::PageDown => {
                self.feed.scroll_down(self.page_size());
                vec![AppAction::Render]
            },
            KeyInput::Char(c) => {
                self.input.insert(c);
                vec![AppAction::Render]
            },
            KeyInput::Backspace => {
                self.input.backspace();
                vec![AppAction::Render]
            },
            KeyInput::Delete => {
                self.input.delete();
                vec![AppAction::Render]
            },
            KeyInput::Left => {
                self.input.move_left();
                vec![AppAction::Render]
            },
            KeyInput::Right => {
                self.input.move_right();
                vec![AppAction::Render]
            },
            KeyInput::Home => {
                self.input.home();
                vec![AppAction::Render]
            },
            KeyInput::End => {
                self.input.end();
                vec![AppAction::Render]
            },
            KeyInput::Esc => vec![],
        }
    }

    /// Replace the input line, e.g. for paste.
    pub fn set_input(&mut self, text: &str) {
        self.input.set(text);
    }

    fn pick_neighbor(
        &mut self,
        neighbor: for<'a> fn(&'a RoomDirectory, &RoomCode) -> Option<&'a Room>,
    ) -> Vec<AppAction> {
        let target = self
            .session
            .current_code()
            .and_then(|code| neighbor(&self.directory, code))
            .map(|room| room.code.clone());

        match target {
            Some(code) => self.on_room_picked(&code),
            None => vec![],
        }
    }

    fn apply(&mut self, steps: Vec<SessionAction>) -> Vec<AppAction> {
        let mut actions = Vec::with_capacity(steps.len());

        for step in steps {
            match step {
                SessionAction::Emit(frame) => actions.push(AppAction::Emit(frame)),
                SessionAction::ClearFeed => {
                    self.feed.clear();
                    self.pending_replay = None;
                    for held in std::mem::take(&mut self.held) {
                        actions.extend(held.ack.map(AppAction::Acknowledge));
                    }
                },
                SessionAction::Persist(code) => actions.push(AppAction::PersistRoom(code)),
                SessionAction::FetchHistory(ticket) => {
                    self.pending_replay = Some(ticket.clone());
                    actions.push(AppAction::FetchHistory {
                        ticket,
                        limit: self.config.history_limit,
                    });
                },
            }
        }

        actions
    }

    fn fail(&mut self, reason: String) -> Vec<AppAction> {
        tracing::error!(%reason, "bootstrap failed");
        let mut actions = Vec::new();
        for held in std::mem::take(&mut self.held) {
            actions.extend(held.ack.map(AppAction::Acknowledge));
        }
        self.status = Some(Status::error(reason.clone()));
        self.phase = Phase::Failed(reason);
        actions.push(AppAction::Render);
        actions
    }

    fn page_size(&self) -> usize {
        usize::from(self.terminal_size.1 / 2).max(1)
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Channel connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    /// Room listing. Empty until bootstrap.
    pub fn directory(&self) -> &RoomDirectory {
        &self.directory
    }

    /// Session state machine.
    pub fn session(&self) -> &RoomSession {
        &self.session
    }

    /// Current room. `None` before bootstrap.
    pub fn current_room(&self) -> Option<&Room> {
        self.session.current()
    }

    /// Rendered feed for the current room.
    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    /// Input line.
    pub fn input(&self) -> &InputLine {
        &self.input
    }

    /// Transient status line. `None` if nothing to show.
    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// Replay the feed is waiting on.
    pub fn pending_replay(&self) -> Option<&ReplayTicket> {
        self.pending_replay.as_ref()
    }

    /// Number of live messages waiting for a replay.
    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Controller tunables.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}
