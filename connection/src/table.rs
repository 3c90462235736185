//! Per-game session state: the active game table and the staging area for
//! games whose initial position has not arrived yet.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chess::Side;
use datagram::Offers;

use crate::error::{ConnectionError, ConnectionResult};
use crate::game::{GameAttributes, GameRecord};

/// One side's clock as last reported by the server.
#[derive(Debug, Clone, Copy)]
pub struct ClockState {
    /// Remaining time at `stamp`. May go negative on time forfeits.
    pub millis: i64,
    pub running: bool,
    pub stamp: Instant,
}

impl ClockState {
    pub fn new(millis: i64, stamp: Instant) -> Self {
        Self {
            millis,
            running: false,
            stamp,
        }
    }

    /// The value the clock shows at `now`, counting down while running.
    pub fn projected(&self, now: Instant) -> i64 {
        if !self.running {
            return self.millis;
        }
        let elapsed = now.saturating_duration_since(self.stamp).as_millis();
        self.millis - i64::try_from(elapsed).unwrap_or(i64::MAX)
    }

    /// Rebase onto `now` keeping the projected value and the running flag.
    pub fn carried(&self, now: Instant) -> Self {
        Self {
            millis: self.projected(now),
            running: self.running,
            stamp: now,
        }
    }
}

/// Live tracking of one active game.
#[derive(Debug, Clone)]
pub struct GameInfo {
    pub record: Arc<GameRecord>,
    pub game: chess::Game,
    /// Moves the server still has to send before the line is caught up.
    pub moves_expected: u32,
    /// Indexed by `Side::index`.
    pub clocks: [ClockState; 2],
    pub flipped: bool,
    pub offers: Offers,
}

impl GameInfo {
    pub fn clock(&self, side: Side) -> &ClockState {
        &self.clocks[side.index()]
    }

    pub fn clock_mut(&mut self, side: Side) -> &mut ClockState {
        &mut self.clocks[side.index()]
    }
}

/// Properties collected from a start notification, waiting for the position.
#[derive(Debug, Clone)]
pub struct PendingGame {
    pub attributes: GameAttributes,
    pub flipped: Option<bool>,
}

#[derive(Debug, Default)]
pub struct GameTable {
    active: HashMap<u32, GameInfo>,
    pending: HashMap<u32, PendingGame>,
}

impl GameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, game: u32) -> ConnectionResult<&GameInfo> {
        self.active.get(&game).ok_or(ConnectionError::NoSuchGame(game))
    }

    pub fn lookup_mut(&mut self, game: u32) -> ConnectionResult<&mut GameInfo> {
        self.active
            .get_mut(&game)
            .ok_or(ConnectionError::NoSuchGame(game))
    }

    pub fn is_active(&self, game: u32) -> bool {
        self.active.contains_key(&game)
    }

    pub fn is_staged(&self, game: u32) -> bool {
        self.pending.contains_key(&game)
    }

    /// Stage a game. Allowed once per number until the bag is taken.
    pub fn stage(&mut self, game: u32, attributes: GameAttributes) -> ConnectionResult<()> {
        if self.pending.contains_key(&game) {
            return Err(ConnectionError::AlreadyStaged(game));
        }
        self.pending.insert(
            game,
            PendingGame {
                attributes,
                flipped: None,
            },
        );
        Ok(())
    }

    pub fn pending_mut(&mut self, game: u32) -> Option<&mut PendingGame> {
        self.pending.get_mut(&game)
    }

    pub fn take_pending(&mut self, game: u32) -> Option<PendingGame> {
        self.pending.remove(&game)
    }

    pub fn insert(&mut self, info: GameInfo) {
        self.active.insert(info.record.number(), info);
    }

    pub fn remove(&mut self, game: u32) -> ConnectionResult<GameInfo> {
        self.active
            .remove(&game)
            .ok_or(ConnectionError::NoSuchGame(game))
    }

    pub fn active_games(&self) -> impl Iterator<Item = &GameInfo> {
        self.active.values()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Forget every active and staged game.
    pub fn clear(&mut self) {
        self.active.clear();
        self.pending.clear();
    }
}
