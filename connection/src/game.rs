//! Immutable game records handed to listeners.
//!
//! A record never changes once announced. When the attributes of a game change
//! (names, ratings, examined vs. played, the user's part in it) the old record
//! is ended and a fresh one is started in its place, so consumers holding the
//! old `Arc` know it is retired.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use chess::{Side, Variant};
use cozy_chess::Board;
use datagram::GameStartInfo;

use crate::error::{ConnectionError, ConnectionResult};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameKind {
    /// Played or examined by the user.
    MyGame,
    ObservedGame,
    /// A one-off board display with no live move stream.
    IsolatedBoard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    InProgress,
    WhiteWins,
    BlackWins,
    Draw,
    Unknown,
}

impl GameResult {
    /// Map the server's score string.
    pub fn from_score(score: &str) -> Self {
        match score.trim() {
            "1-0" => Self::WhiteWins,
            "0-1" => Self::BlackWins,
            "1/2-1/2" => Self::Draw,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub name: String,
    /// `None` when the server reports no rating.
    pub rating: Option<u32>,
    pub titles: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeControl {
    pub initial_millis: i64,
    pub increment_millis: i64,
}

impl TimeControl {
    pub fn from_minutes(minutes: u32, increment_seconds: u32) -> Self {
        Self {
            initial_millis: i64::from(minutes) * 60_000,
            increment_millis: i64::from(increment_seconds) * 1000,
        }
    }
}

/// Descriptive attributes of a game, shared by staging and records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameAttributes {
    pub kind: GameKind,
    pub variant: Variant,
    pub white: PlayerInfo,
    pub black: PlayerInfo,
    pub white_time: TimeControl,
    pub black_time: TimeControl,
    pub rated: bool,
    pub rating_category: String,
    /// `false` for examined games.
    pub played: bool,
    pub game_id: String,
    /// The user's color when they play in the game.
    pub user_side: Option<Side>,
}

impl GameAttributes {
    /// Build attributes from a started/changed notification. `None` when the
    /// ruleset is not supported.
    pub fn from_start(info: &GameStartInfo, kind: GameKind, username: Option<&str>) -> Option<Self> {
        let variant = Variant::from_wild(info.wild)?;
        let user_side = match (kind, info.played, username) {
            (GameKind::MyGame, true, Some(user)) => {
                if info.white.eq_ignore_ascii_case(user) {
                    Some(Side::White)
                } else if info.black.eq_ignore_ascii_case(user) {
                    Some(Side::Black)
                } else {
                    None
                }
            }
            _ => None,
        };

        Some(Self {
            kind,
            variant,
            white: PlayerInfo {
                name: info.white.clone(),
                rating: (info.white_rating > 0).then_some(info.white_rating),
                titles: info.white_titles.clone(),
            },
            black: PlayerInfo {
                name: info.black.clone(),
                rating: (info.black_rating > 0).then_some(info.black_rating),
                titles: info.black_titles.clone(),
            },
            white_time: TimeControl::from_minutes(
                info.white_initial_minutes,
                info.white_increment_seconds,
            ),
            black_time: TimeControl::from_minutes(
                info.black_initial_minutes,
                info.black_increment_seconds,
            ),
            rated: info.rated,
            rating_category: info.rating_category.clone(),
            played: info.played,
            game_id: info.game_id.clone(),
            user_side,
        })
    }

    /// The side `name` plays, compared the way the server compares handles.
    pub fn side_named(&self, name: &str) -> Option<Side> {
        if self.white.name.eq_ignore_ascii_case(name) {
            Some(Side::White)
        } else if self.black.name.eq_ignore_ascii_case(name) {
            Some(Side::Black)
        } else {
            None
        }
    }

    pub fn time(&self, side: Side) -> TimeControl {
        match side {
            Side::White => self.white_time,
            Side::Black => self.black_time,
        }
    }
}

/// One announced game. Shared as `Arc<GameRecord>`; identity is `serial`,
/// since server game numbers are recycled.
#[derive(Debug)]
pub struct GameRecord {
    serial: u64,
    number: u32,
    attributes: GameAttributes,
    /// Only an examine-mode board reset changes this after creation.
    initial_position: RwLock<Board>,
    flipped: bool,
    result: OnceLock<GameResult>,
}

impl GameRecord {
    pub(crate) fn new(
        number: u32,
        attributes: GameAttributes,
        initial_position: Board,
        flipped: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            number,
            attributes,
            initial_position: RwLock::new(initial_position),
            flipped,
            result: OnceLock::new(),
        })
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// The server's game number. Unique only among concurrently active games.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn attributes(&self) -> &GameAttributes {
        &self.attributes
    }

    pub fn kind(&self) -> GameKind {
        self.attributes.kind
    }

    pub fn variant(&self) -> Variant {
        self.attributes.variant
    }

    pub fn white(&self) -> &PlayerInfo {
        &self.attributes.white
    }

    pub fn black(&self) -> &PlayerInfo {
        &self.attributes.black
    }

    pub fn is_played(&self) -> bool {
        self.attributes.played
    }

    pub fn user_side(&self) -> Option<Side> {
        self.attributes.user_side
    }

    pub fn initial_position(&self) -> Board {
        self.initial_position
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_initial_position(&self, position: Board) {
        *self
            .initial_position
            .write()
            .unwrap_or_else(PoisonError::into_inner) = position;
    }

    /// Whether the board was flipped when this record was created.
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn result(&self) -> GameResult {
        self.result.get().copied().unwrap_or(GameResult::InProgress)
    }

    /// The result to report when the record is retired.
    pub fn final_result(&self) -> GameResult {
        match self.result() {
            GameResult::InProgress => GameResult::Unknown,
            known => known,
        }
    }

    /// Record the outcome. The server reports a result once per record; a
    /// second report means our view of the game is wrong.
    pub(crate) fn set_result(&self, result: GameResult) -> ConnectionResult<()> {
        self.result
            .set(result)
            .map_err(|_| ConnectionError::ResultAlreadySet { game: self.number })
    }

    pub fn same_record(&self, other: &GameRecord) -> bool {
        self.serial == other.serial
    }
}
