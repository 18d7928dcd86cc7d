//! Observable controller state.
//!
//! These are the view-model types a front end reads when rendering. They carry
//! no protocol detail beyond what the status bar shows.

/// Channel connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected. The transport may be retrying.
    #[default]
    Disconnected,
    /// Connection in progress.
    Connecting,
    /// Channel is up.
    Connected,
}

/// Controller lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// Waiting for the room listing.
    #[default]
    Booting,
    /// In a room.
    Ready,
    /// Room listing failed. Only quitting is possible.
    Failed(String),
}

/// Severity of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Informational notice.
    Info,
    /// Recoverable problem.
    Warning,
    /// Error reported by a lower layer.
    Error,
}

/// Transient status line shown under the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Severity.
    pub level: StatusLevel,
    /// Text shown to the user.
    pub text: String,
}

impl Status {
    /// Informational status.
    pub fn info(text: impl Into<String>) -> Self {
        Self { level: StatusLevel::Info, text: text.into() }
    }

    /// Warning status.
    pub fn warning(text: impl Into<String>) -> Self {
        Self { level: StatusLevel::Warning, text: text.into() }
    }

    /// Error status.
    pub fn error(text: impl Into<String>) -> Self {
        Self { level: StatusLevel::Error, text: text.into() }
    }
}
