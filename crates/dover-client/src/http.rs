//! HTTP history loader.
//!
//! Thin layer over the two request/response endpoints. Decoding is delegated
//! to the parsers in [`dover_proto`], so every historical payload shape they
//! accept is accepted here too.

use dover_app::{HistoryError, HistoryLoader};
use dover_proto::{Room, RoomCode, WireMessage, parse_room_listing};
use reqwest::{Client, Url};

use crate::TransportError;

/// Room listing endpoint, relative to the server base.
pub const ROOMS_PATH: &str = "userrooms";

/// Recent history endpoint, relative to the server base.
pub const LAST_MESSAGES_PATH: &str = "last-msgs";

/// [`HistoryLoader`] backed by the server's HTTP endpoints.
///
/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpHistoryLoader {
    client: Client,
    base: Url,
}

impl HttpHistoryLoader {
    /// Loader for the server at `base` (`http` or `https`).
    ///
    /// Endpoint paths are appended to whatever path `base` already has, so a
    /// server mounted under a prefix works.
    pub fn new(base: &str) -> Result<Self, TransportError> {
        let invalid = |reason: &str| TransportError::InvalidUrl {
            url: base.to_string(),
            reason: reason.to_string(),
        };

        let base = Url::parse(base).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if base.cannot_be_a_base() {
            return Err(invalid("not a base url"));
        }

        let client = Client::builder().build()?;
        Ok(Self { client, base })
    }

    /// Server base URL.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URL of the room listing.
    pub fn rooms_url(&self) -> Url {
        self.endpoint(ROOMS_PATH)
    }

    /// URL of the last `limit` messages for `room`.
    pub fn last_messages_url(&self, room: &RoomCode, limit: usize) -> Url {
        let mut url = self.endpoint(LAST_MESSAGES_PATH);
        url.query_pairs_mut()
            .append_pair("room_code", room.as_str())
            .append_pair("n", &limit.to_string());
        url
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        // Checked in `new`.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(path);
        }
        url
    }

    async fn get(&self, url: Url, endpoint: &str) -> Result<Vec<u8>, HistoryError> {
        tracing::debug!(%url, "fetching");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HistoryError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HistoryError::Status {
                endpoint: format!("/{endpoint}"),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| HistoryError::Request(e.to_string()))?;
        Ok(body.to_vec())
    }
}

impl HistoryLoader for HttpHistoryLoader {
    async fn list_rooms(&self) -> Result<Vec<Room>, HistoryError> {
        let body = self.get(self.rooms_url(), ROOMS_PATH).await?;
        parse_room_listing(&body).map_err(|e| HistoryError::Decode(e.to_string()))
    }

    async fn last_messages(
        &self,
        room: &RoomCode,
        limit: usize,
    ) -> Result<Vec<WireMessage>, HistoryError> {
        let body = self.get(self.last_messages_url(room, limit), LAST_MESSAGES_PATH).await?;
        WireMessage::parse_history(&body).map_err(|e| HistoryError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_hang_off_the_base() {
        let loader = HttpHistoryLoader::new("http://localhost:5000").unwrap();

        assert_eq!(loader.rooms_url().as_str(), "http://localhost:5000/userrooms");
        assert_eq!(
            loader.last_messages_url(&"r1".into(), 20).as_str(),
            "http://localhost:5000/last-msgs?room_code=r1&n=20"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let loader = HttpHistoryLoader::new("https://chat.example/api/").unwrap();
        assert_eq!(loader.rooms_url().as_str(), "https://chat.example/api/userrooms");

        let loader = HttpHistoryLoader::new("https://chat.example/api").unwrap();
        assert_eq!(loader.rooms_url().as_str(), "https://chat.example/api/userrooms");
    }

    #[test]
    fn room_code_is_query_encoded() {
        let loader = HttpHistoryLoader::new("http://localhost:5000").unwrap();
        let url = loader.last_messages_url(&"a b&c".into(), 5);

        assert_eq!(url.query(), Some("room_code=a+b%26c&n=5"));
    }

    #[test]
    fn rejects_unusable_bases() {
        assert!(matches!(
            HttpHistoryLoader::new("ws://localhost:5000"),
            Err(TransportError::InvalidUrl { .. })
        ));
        assert!(matches!(
            HttpHistoryLoader::new("not a url"),
            Err(TransportError::InvalidUrl { .. })
        ));
    }
}
