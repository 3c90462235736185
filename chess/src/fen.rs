use cozy_chess::Board;

use crate::variant::Variant;

/// Parse a FEN string into a Board.
///
/// An empty (or blank) string stands for the variant's default start, which is
/// the standard array for every supported ruleset.
pub fn parse_fen(fen: &str, variant: Variant) -> Result<Board, FenError> {
    let fen = fen.trim();
    if fen.is_empty() {
        return Ok(Board::default());
    }

    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(FenError::InvalidFormat(fen.to_string()));
    }

    // Servers sometimes omit the move counters.
    let full = if parts.len() == 4 {
        format!("{} 0 1", fen)
    } else {
        fen.to_string()
    };

    Board::from_fen(&full, variant.is_chess960())
        .or_else(|_| Board::from_fen(&full, !variant.is_chess960()))
        .map_err(|_| FenError::InvalidBoardLayout(fen.to_string()))
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format: {0}")]
    InvalidFormat(String),
    #[error("Invalid board layout: {0}")]
    InvalidBoardLayout(String),
}
