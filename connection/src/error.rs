//! Error types for the connection core

use datagram::DatagramError;
use thiserror::Error;

pub type ConnectionResult<T> = Result<T, ConnectionError>;

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("No such game: {0}")]
    NoSuchGame(u32),

    #[error("No such seek: {0}")]
    NoSuchSeek(u32),

    #[error("No such chess event: {0}")]
    NoSuchChessEvent(u32),

    #[error("Result of game {game} was already set")]
    ResultAlreadySet { game: u32 },

    #[error("Game {0} is already staged")]
    AlreadyStaged(u32),

    #[error("Unrecognized game list category: {0}")]
    UnknownGameListCategory(String),

    #[error("Game list item arrived without a list header")]
    OrphanGameListItem,

    #[error("Undecodable datagram: {0}")]
    Decode(#[from] DatagramError),

    #[error("Game {game} diverged from the server: {source}")]
    Diverged {
        game: u32,
        #[source]
        source: chess::GameError,
    },

    #[error("Bad position for game {game}: {source}")]
    BadPosition {
        game: u32,
        #[source]
        source: chess::FenError,
    },

    #[error("Bad square in game {game}: {source}")]
    BadSquare {
        game: u32,
        #[source]
        source: chess::NotationError,
    },

    #[error("Connection task closed")]
    Closed,
}

impl ConnectionError {
    /// Routine races between server notifications and client-side filtering.
    /// Callers drop the notification and carry on.
    pub fn is_expected_absence(&self) -> bool {
        matches!(
            self,
            Self::NoSuchGame(_) | Self::NoSuchSeek(_) | Self::NoSuchChessEvent(_)
        )
    }

    /// The client's view of the server state can no longer be trusted.
    pub fn is_desync(&self) -> bool {
        !self.is_expected_absence() && !matches!(self, Self::Closed)
    }
}
