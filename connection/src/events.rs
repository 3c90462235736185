use std::sync::Arc;

use chess::{HistoryEntry, Side};
use cozy_chess::{Board, Square};
use datagram::MatchInfo;

use crate::game::{GameRecord, GameResult};
use crate::seeks::Seek;
use crate::tourney::ChessEvent;

/// Session-level events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Established,
    LoginSucceeded { name: String, titles: String },
    LoginFailed { code: i64, reason: String },
    /// Informational text for the user.
    Notice(String),
    Lost { reason: Option<String> },
}

/// Events about one game record.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum GameEvent {
    Started {
        game: Arc<GameRecord>,
        position: Board,
    },
    MoveMade {
        game: Arc<GameRecord>,
        entry: HistoryEntry,
        /// Position after the move.
        position: Board,
        /// `false` while the server is catching us up on earlier moves, and
        /// for moves re-announced to a replacement record.
        is_new: bool,
        /// Diagnostic only.
        variation: Option<i64>,
    },
    /// The line was reset to a new initial position (examine mode).
    PositionChanged {
        game: Arc<GameRecord>,
        position: Board,
    },
    Takeback {
        game: Arc<GameRecord>,
        count: u32,
        position: Board,
    },
    /// One of the user's own moves was rejected.
    IllegalMove {
        game: Arc<GameRecord>,
        text: String,
        reason: i64,
    },
    ClockAdjusted {
        game: Arc<GameRecord>,
        side: Side,
        millis: i64,
        running: bool,
    },
    BoardFlipped {
        game: Arc<GameRecord>,
        flipped: bool,
    },
    OfferUpdated {
        game: Arc<GameRecord>,
        offer: Offer,
        side: Side,
        made: bool,
    },
    Ended {
        game: Arc<GameRecord>,
        result: GameResult,
    },
}

impl GameEvent {
    pub fn game(&self) -> &Arc<GameRecord> {
        match self {
            Self::Started { game, .. }
            | Self::MoveMade { game, .. }
            | Self::PositionChanged { game, .. }
            | Self::Takeback { game, .. }
            | Self::IllegalMove { game, .. }
            | Self::ClockAdjusted { game, .. }
            | Self::BoardFlipped { game, .. }
            | Self::OfferUpdated { game, .. }
            | Self::Ended { game, .. } => game,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "game-started",
            Self::MoveMade { .. } => "move-made",
            Self::PositionChanged { .. } => "position-changed",
            Self::Takeback { .. } => "takeback",
            Self::IllegalMove { .. } => "illegal-move",
            Self::ClockAdjusted { .. } => "clock-adjusted",
            Self::BoardFlipped { .. } => "board-flipped",
            Self::OfferUpdated { .. } => "offer-updated",
            Self::Ended { .. } => "game-ended",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Draw,
    Adjourn,
    Abort,
    /// Plies requested.
    Takeback(u32),
}

/// Board markup made by an examiner.
#[derive(Debug, Clone)]
pub struct AnnotationEvent {
    pub game: Arc<GameRecord>,
    pub examiner: String,
    pub annotation: Annotation,
    /// `false` when the markup was removed.
    pub added: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    Circle(Square),
    Arrow(Square, Square),
}

#[derive(Debug, Clone)]
pub enum SeekEvent {
    Added(Arc<Seek>),
    Removed(Arc<Seek>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FriendsEvent {
    Connected(String),
    Disconnected(String),
    Added(String),
    Removed(String),
}

#[derive(Debug, Clone)]
pub enum ChessEventUpdate {
    Added(Arc<ChessEvent>),
    Removed(Arc<ChessEvent>),
}

#[derive(Debug, Clone)]
pub enum MatchOfferEvent {
    Made(Arc<MatchInfo>),
    Withdrawn {
        challenger: String,
        receiver: String,
        explanation: String,
    },
}
