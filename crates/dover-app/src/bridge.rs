//! Channel-to-controller translation layer.
//!
//! The [`Bridge`] sits between the persistent channel and the controller.
//!
//! # Responsibilities
//!
//! - Translates inbound [`ServerFrame`]s into [`AppEvent`]s.
//! - Turns [`AppAction::Emit`] and [`AppAction::Acknowledge`] into outbound
//!   [`ClientFrame`]s, accumulated until the runtime drains them.
//! - Sends the connect greeting and, after a reconnect, re-joins the room the
//!   client was last in. The transport reconnects on its own but the server
//!   forgets room membership with the old socket.

use dover_proto::{ClientFrame, RoomCode, ServerFrame};

use crate::{AppAction, AppEvent, Timestamp};

/// Greeting sent on every connect.
pub const CONNECT_GREETING: &str = "Client connected!";

/// Bridge between the controller and the channel.
#[derive(Debug, Default)]
pub struct Bridge {
    outgoing: Vec<ClientFrame>,
    /// Room of the last `join` not followed by a `leave`.
    joined: Option<RoomCode>,
    connected: bool,
    ever_connected: bool,
}

impl Bridge {
    /// Create a bridge with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue frames for an action. Actions without a wire effect are ignored.
    pub fn process_app_action(&mut self, action: &AppAction) {
        match action {
            AppAction::Emit(frame) => self.emit(frame.clone()),
            AppAction::Acknowledge(id) => self.emit(ClientFrame::Ack { id: *id }),
            AppAction::Render
            | AppAction::Quit
            | AppAction::LoadRooms
            | AppAction::FetchHistory { .. }
            | AppAction::PersistRoom(_) => {},
        }
    }

    /// Queue an outbound frame.
    pub fn emit(&mut self, frame: ClientFrame) {
        match &frame {
            ClientFrame::Join { room_code } => self.joined = Some(room_code.clone()),
            ClientFrame::Leave { room_code } if self.joined.as_ref() == Some(room_code) => {
                self.joined = None;
            },
            _ => {},
        }
        self.outgoing.push(frame);
    }

    /// Handle a frame from the server.
    ///
    /// `now` stamps live messages for the formatter's fallback.
    pub fn handle_frame(&mut self, frame: ServerFrame, now: Timestamp) -> Vec<AppEvent> {
        match frame {
            ServerFrame::Connect => {
                let reconnect = self.ever_connected;
                self.connected = true;
                self.ever_connected = true;

                self.outgoing.push(ClientFrame::ChatConnect { data: CONNECT_GREETING.to_string() });
                if reconnect && let Some(room_code) = self.joined.clone() {
                    tracing::info!(%room_code, "reconnected, re-joining room");
                    self.outgoing.push(ClientFrame::Join { room_code });
                }
                vec![AppEvent::Connected]
            },
            ServerFrame::Disconnect => {
                self.connected = false;
                vec![AppEvent::Disconnected]
            },
            ServerFrame::UserJoined { notice } => vec![AppEvent::UserJoined { notice }],
            ServerFrame::UserLeft { notice } => vec![AppEvent::UserLeft { notice }],
            ServerFrame::MyResponse { message, ack } => {
                vec![AppEvent::MessageReceived { message, ack, received_at: now }]
            },
        }
    }

    /// Take pending outgoing frames.
    pub fn take_outgoing(&mut self) -> Vec<ClientFrame> {
        std::mem::take(&mut self.outgoing)
    }

    /// Room a reconnect would re-join.
    pub fn joined(&self) -> Option<&RoomCode> {
        self.joined.as_ref()
    }

    /// Whether the channel is currently up.
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}
