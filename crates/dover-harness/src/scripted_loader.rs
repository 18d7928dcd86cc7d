//! Scripted history loader.
//!
//! [`ScriptedLoader`] answers `list_rooms` and `last_messages` from canned
//! data. Rooms can be *held*: fetches for a held room park until the test
//! releases it, which is how out-of-order completion is produced on demand.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::{HashMap, HashSet},
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use dover_app::{HistoryError, HistoryLoader};
use dover_proto::{Room, RoomCode, WireMessage};
use tokio::sync::oneshot;

#[derive(Debug)]
struct Script {
    rooms: Result<Vec<Room>, HistoryError>,
    histories: HashMap<RoomCode, Vec<WireMessage>>,
    failures: HashMap<RoomCode, HistoryError>,
    held: HashSet<RoomCode>,
    parked: HashMap<RoomCode, Vec<oneshot::Sender<()>>>,
    requests: Vec<(RoomCode, usize)>,
}

fn lock(script: &Mutex<Script>) -> MutexGuard<'_, Script> {
    script.lock().unwrap_or_else(PoisonError::into_inner)
}

/// History loader driven by test script.
#[derive(Debug, Clone)]
pub struct ScriptedLoader {
    script: Arc<Mutex<Script>>,
}

impl ScriptedLoader {
    /// Loader listing `rooms` with no history anywhere.
    pub fn new(rooms: impl IntoIterator<Item = Room>) -> Self {
        Self::from_listing(Ok(rooms.into_iter().collect()))
    }

    /// Loader whose room listing fails.
    pub fn failing_listing(error: HistoryError) -> Self {
        Self::from_listing(Err(error))
    }

    fn from_listing(rooms: Result<Vec<Room>, HistoryError>) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                rooms,
                histories: HashMap::new(),
                failures: HashMap::new(),
                held: HashSet::new(),
                parked: HashMap::new(),
                requests: Vec::new(),
            })),
        }
    }

    /// Set the history returned for a room.
    #[must_use]
    pub fn with_history(self, room: impl Into<RoomCode>, messages: Vec<WireMessage>) -> Self {
        self.set_history(room, messages);
        self
    }

    /// Set the history returned for a room.
    pub fn set_history(&self, room: impl Into<RoomCode>, messages: Vec<WireMessage>) {
        lock(&self.script).histories.insert(room.into(), messages);
    }

    /// Make fetches for a room fail.
    pub fn fail(&self, room: impl Into<RoomCode>, error: HistoryError) {
        lock(&self.script).failures.insert(room.into(), error);
    }

    /// Park future fetches for a room until [`ScriptedLoader::release`].
    pub fn hold(&self, room: impl Into<RoomCode>) {
        lock(&self.script).held.insert(room.into());
    }

    /// Let parked and future fetches for a room complete.
    pub fn release(&self, room: impl Into<RoomCode>) {
        let room = room.into();
        let mut script = lock(&self.script);
        script.held.remove(&room);
        for gate in script.parked.remove(&room).unwrap_or_default() {
            let _ = gate.send(());
        }
    }

    /// Number of fetches for a room currently parked.
    pub fn parked(&self, room: &RoomCode) -> usize {
        lock(&self.script).parked.get(room).map_or(0, Vec::len)
    }

    /// Every history request made so far, as `(room, limit)`.
    pub fn requests(&self) -> Vec<(RoomCode, usize)> {
        lock(&self.script).requests.clone()
    }
}

impl HistoryLoader for ScriptedLoader {
    fn list_rooms(&self) -> impl Future<Output = Result<Vec<Room>, HistoryError>> + Send {
        let script = Arc::clone(&self.script);
        async move { lock(&script).rooms.clone() }
    }

    fn last_messages(
        &self,
        room: &RoomCode,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<WireMessage>, HistoryError>> + Send {
        let script = Arc::clone(&self.script);
        let room = room.clone();

        async move {
            let gate = {
                let mut script = lock(&script);
                script.requests.push((room.clone(), limit));
                if script.held.contains(&room) {
                    let (tx, rx) = oneshot::channel();
                    script.parked.entry(room.clone()).or_default().push(tx);
                    Some(rx)
                } else {
                    None
                }
            };

            if let Some(gate) = gate {
                // A dropped sender means the loader itself went away.
                if gate.await.is_err() {
                    return Err(HistoryError::Request("loader dropped".into()));
                }
            }

            let script = lock(&script);
            if let Some(error) = script.failures.get(&room) {
                return Err(error.clone());
            }
            let history = script.histories.get(&room).map(Vec::as_slice).unwrap_or_default();
            Ok(history[history.len().saturating_sub(limit)..].to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(text: &str) -> WireMessage {
        WireMessage::new(None, None, text)
    }

    #[tokio::test]
    async fn returns_last_messages_up_to_limit() {
        let loader = ScriptedLoader::new([Room::new("r1", "General")])
            .with_history("r1", vec![msg("a"), msg("b"), msg("c")]);

        let got = loader.last_messages(&"r1".into(), 2).await.unwrap();
        let texts: Vec<_> = got.iter().map(|m| m.text.as_str()).collect();

        assert_eq!(texts, ["b", "c"]);
        assert_eq!(loader.requests(), vec![(RoomCode::new("r1"), 2)]);
    }

    #[tokio::test]
    async fn unknown_room_has_empty_history() {
        let loader = ScriptedLoader::new([]);
        assert!(loader.last_messages(&"zz".into(), 20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn held_room_waits_for_release() {
        let loader = ScriptedLoader::new([]).with_history("r1", vec![msg("late")]);
        loader.hold("r1");

        let fetch = tokio::spawn({
            let loader = loader.clone();
            async move { loader.last_messages(&"r1".into(), 20).await }
        });
        tokio::task::yield_now().await;
        assert_eq!(loader.parked(&"r1".into()), 1);

        loader.release("r1");
        let got = fetch.await.unwrap().unwrap();
        assert_eq!(got.len(), 1);
    }

    #[tokio::test]
    async fn scripted_failures() {
        let loader = ScriptedLoader::failing_listing(HistoryError::Status {
            endpoint: "/userrooms".into(),
            status: 500,
        });
        loader.fail("r1", HistoryError::Decode("bad".into()));

        assert!(loader.list_rooms().await.is_err());
        assert_eq!(
            loader.last_messages(&"r1".into(), 20).await,
            Err(HistoryError::Decode("bad".into()))
        );
    }
}
