//! WebSocket channel transport.
//!
//! Provides [`ChannelClient`], which owns a background task holding the
//! socket. Frames go in and come out through channels; protocol logic stays
//! in [`dover_app::Bridge`].
//!
//! The task reconnects on its own with exponential backoff. Each successful
//! open is reported as [`ServerFrame::Connect`] and each loss as
//! [`ServerFrame::Disconnect`]. Outbound frames submitted while the socket is
//! down wait in the queue and go out after the next open.
//!
//! [`ChannelClient::close`] flushes the outbound queue and sends a close
//! frame before the task ends. Dropping the client aborts the task instead.

use std::time::Duration;

use dover_proto::{ClientFrame, ServerFrame};
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::TransportError;

/// Channel path, relative to the server base.
pub const CHANNEL_PATH: &str = "chat";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Channel transport tunables.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// WebSocket URL (`ws` or `wss`).
    pub url: String,
    /// Delay before the first reconnect attempt.
    pub initial_backoff: Duration,
    /// Upper bound on the reconnect delay.
    pub max_backoff: Duration,
    /// Capacity of the inbound and outbound queues.
    pub queue_capacity: usize,
    /// How long [`ChannelClient::close`] waits for the queue to flush.
    pub close_grace: Duration,
}

impl ChannelConfig {
    /// Defaults for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
            queue_capacity: 256,
            close_grace: Duration::from_secs(1),
        }
    }

    /// Defaults for the channel of the server at `base`: same host, `ws`
    /// for `http` and `wss` for `https`, path `/chat` under any base path.
    pub fn for_server(base: &str) -> Result<Self, TransportError> {
        let invalid = |reason: &str| TransportError::InvalidUrl {
            url: base.to_string(),
            reason: reason.to_string(),
        };

        let mut url = Url::parse(base).map_err(|e| invalid(&e.to_string()))?;
        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            _ => return Err(invalid("scheme must be http or https")),
        };
        url.set_scheme(scheme).map_err(|()| invalid("scheme cannot be changed"))?;
        url.path_segments_mut()
            .map_err(|()| invalid("not a base url"))?
            .pop_if_empty()
            .push(CHANNEL_PATH);
        url.set_query(None);

        Ok(Self::new(url))
    }
}

/// Handle to the channel task.
pub struct ChannelClient {
    /// `None` once closing.
    to_server: Option<mpsc::Sender<ClientFrame>>,
    from_server: mpsc::Receiver<ServerFrame>,
    task: JoinHandle<()>,
    close_grace: Duration,
}

impl ChannelClient {
    /// Start the channel task. Returns immediately; the first
    /// [`ServerFrame::Connect`] arrives once the socket opens.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(config: ChannelConfig) -> Result<Self, TransportError> {
        let scheme = config.url.split_once("://").map(|(scheme, _)| scheme);
        if !matches!(scheme, Some("ws" | "wss")) {
            return Err(TransportError::InvalidUrl {
                url: config.url,
                reason: "scheme must be ws or wss".to_string(),
            });
        }

        let capacity = config.queue_capacity.max(1);
        let (to_server_tx, to_server_rx) = mpsc::channel(capacity);
        let (from_server_tx, from_server_rx) = mpsc::channel(capacity);

        let close_grace = config.close_grace;
        let task = tokio::spawn(connection_loop(config, to_server_rx, from_server_tx));

        Ok(Self { to_server: Some(to_server_tx), from_server: from_server_rx, task, close_grace })
    }

    /// Queue a frame for the server.
    ///
    /// # Errors
    ///
    /// `TransportError::Closed` once the task is gone or closing.
    pub async fn send(&self, frame: ClientFrame) -> Result<(), TransportError> {
        let Some(to_server) = &self.to_server else {
            return Err(TransportError::Closed);
        };
        to_server.send(frame).await.map_err(|_| TransportError::Closed)
    }

    /// Next frame from the server, or `None` once the task is gone.
    ///
    /// Cancel-safe.
    pub async fn recv(&mut self) -> Option<ServerFrame> {
        self.from_server.recv().await
    }

    /// Close the channel. Frames already queued go out on an open socket,
    /// followed by a close frame. If that takes longer than
    /// [`ChannelConfig::close_grace`], or the socket is down, the task is
    /// aborted.
    pub async fn close(&mut self) {
        if self.to_server.take().is_none() {
            return;
        }

        match tokio::time::timeout(self.close_grace, &mut self.task).await {
            Ok(Ok(())) => tracing::info!("channel closed"),
            Ok(Err(e)) => tracing::warn!(error = %e, "channel task failed"),
            Err(_) => {
                tracing::warn!(grace = ?self.close_grace, "channel did not close in time, aborting");
                self.task.abort();
            },
        }
    }
}

impl Drop for ChannelClient {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// How a socket session ended.
enum SessionEnd {
    /// Socket dropped; reconnect.
    Lost,
    /// Client closed or gone; stop.
    Shutdown,
}

/// Keep a socket open, reconnecting with backoff until the client goes away.
async fn connection_loop(
    config: ChannelConfig,
    mut to_server: mpsc::Receiver<ClientFrame>,
    from_server: mpsc::Sender<ServerFrame>,
) {
    let mut backoff = config.initial_backoff;

    loop {
        tracing::info!(url = %config.url, "connecting channel");

        match connect_async(config.url.as_str()).await {
            Ok((socket, _response)) => {
                backoff = config.initial_backoff;
                tracing::info!("channel connected");

                if from_server.send(ServerFrame::Connect).await.is_err() {
                    return;
                }

                if let SessionEnd::Shutdown =
                    run_session(socket, &mut to_server, &from_server).await
                {
                    return;
                }
                if from_server.send(ServerFrame::Disconnect).await.is_err() {
                    return;
                }
            },
            Err(e) => tracing::warn!(error = %e, "channel connect failed"),
        }

        tracing::warn!(?backoff, "reconnecting channel");
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(config.max_backoff);
    }
}

/// Pump frames both ways until the socket or the client goes away.
async fn run_session(
    socket: Socket,
    to_server: &mut mpsc::Receiver<ClientFrame>,
    from_server: &mpsc::Sender<ServerFrame>,
) -> SessionEnd {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let Some(frame) = decode_frame(&text) else { continue };
                    if from_server.send(frame).await.is_err() {
                        return SessionEnd::Shutdown;
                    }
                },
                Some(Ok(Message::Close(_))) | None => return SessionEnd::Lost,
                Some(Ok(_)) => {},
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "channel read failed");
                    return SessionEnd::Lost;
                },
            },

            outgoing = to_server.recv() => {
                let Some(frame) = outgoing else {
                    if let Err(e) = sink.close().await {
                        tracing::debug!(error = %e, "channel close handshake failed");
                    }
                    return SessionEnd::Shutdown;
                };
                let text = match frame.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(error = %e, event = frame.event_name(), "dropping unencodable frame");
                        continue;
                    },
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    tracing::warn!(error = %e, event = frame.event_name(), "channel write failed");
                    return SessionEnd::Lost;
                }
            },
        }
    }
}

/// Decode an inbound text frame.
///
/// Connection lifecycle is reported by the transport itself, so lifecycle
/// events arriving on the wire are dropped along with anything undecodable.
fn decode_frame(text: &str) -> Option<ServerFrame> {
    match ServerFrame::from_json(text) {
        Ok(ServerFrame::Connect | ServerFrame::Disconnect) => {
            tracing::debug!("ignoring lifecycle event from server");
            None
        },
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::warn!(error = %e, "dropping undecodable frame");
            None
        },
    }
}
