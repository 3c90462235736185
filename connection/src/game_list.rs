//! Collects game-list items until the announced total has arrived.

use datagram::{GameListEntry, GameListHeader};

use crate::error::{ConnectionError, ConnectionResult};

/// What kind of listing the server is sending, from the command that asked
/// for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameListCategory {
    History,
    Search,
    Stored,
    Library,
}

impl GameListCategory {
    pub fn from_command(command: &str) -> ConnectionResult<Self> {
        let word = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match word.as_str() {
            "history" | "hi" => Ok(Self::History),
            "search" | "se" => Ok(Self::Search),
            "stored" | "sto" => Ok(Self::Stored),
            "liblist" => Ok(Self::Library),
            _ => Err(ConnectionError::UnknownGameListCategory(command.to_string())),
        }
    }
}

/// One complete listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameList {
    pub category: GameListCategory,
    pub header: GameListHeader,
    pub items: Vec<GameListEntry>,
}

#[derive(Debug)]
pub struct GameListAccumulator {
    list: GameList,
    expected: usize,
}

impl GameListAccumulator {
    /// Start a listing. Returns the finished list right away when it holds
    /// no items.
    pub fn begin(header: GameListHeader) -> ConnectionResult<(Self, Option<GameList>)> {
        let category = GameListCategory::from_command(&header.command)?;
        let expected = if header.hits == 0 || header.last < header.first {
            0
        } else {
            (header.last - header.first + 1) as usize
        };
        let acc = Self {
            list: GameList {
                category,
                header,
                items: Vec::with_capacity(expected),
            },
            expected,
        };
        if expected == 0 {
            let done = acc.list.clone();
            return Ok((acc, Some(done)));
        }
        Ok((acc, None))
    }

    /// Add an item; returns the list once the last expected item is in.
    pub fn push(&mut self, item: GameListEntry) -> Option<GameList> {
        self.list.items.push(item);
        if self.list.items.len() < self.expected {
            return None;
        }
        let items = std::mem::take(&mut self.list.items);
        self.expected = 0;
        Some(GameList {
            category: self.list.category,
            header: self.list.header.clone(),
            items,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.list.items.len() >= self.expected
    }
}
