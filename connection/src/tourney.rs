//! Chess events (tournaments and other postings) announced by the server.

use std::collections::HashMap;
use std::sync::Arc;

use datagram::TourneyInfo;

use crate::error::{ConnectionError, ConnectionResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChessEvent {
    pub id: u32,
    pub description: String,
    pub join_command: Option<String>,
    pub watch_command: Option<String>,
    pub info_command: Option<String>,
    /// Question to put to the user before sending the join command.
    pub confirm_text: Option<String>,
}

impl From<TourneyInfo> for ChessEvent {
    fn from(info: TourneyInfo) -> Self {
        Self {
            id: info.id,
            description: info.description,
            join_command: info.join,
            watch_command: info.watch,
            info_command: info.info,
            confirm_text: info.confirm,
        }
    }
}

#[derive(Debug, Default)]
pub struct ChessEventTable {
    events: HashMap<u32, Arc<ChessEvent>>,
}

impl ChessEventTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event, returning the one it replaces under the same id.
    pub fn add(&mut self, event: Arc<ChessEvent>) -> Option<Arc<ChessEvent>> {
        self.events.insert(event.id, event)
    }

    pub fn remove(&mut self, id: u32) -> ConnectionResult<Arc<ChessEvent>> {
        self.events
            .remove(&id)
            .ok_or(ConnectionError::NoSuchChessEvent(id))
    }

    pub fn get(&self, id: u32) -> Option<&Arc<ChessEvent>> {
        self.events.get(&id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
