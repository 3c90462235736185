//! Rules-side helpers for tracking server games on top of cozy-chess.

pub mod fen;
pub mod game;
pub mod notation;
pub mod types;
pub mod variant;

pub use fen::{format_fen, parse_fen, FenError};
pub use game::{Game, GameError, HistoryEntry, PlayedMove};
pub use notation::{
    format_outbound, format_square, parse_smith, parse_square, Castle, NotationError, SmithCoords,
    SmithMove,
};
pub use types::Side;
pub use variant::Variant;
