//! Smith-Warren move notation as used by the server's move datagrams.
//!
//! A move is the origin and destination squares followed by optional suffix
//! letters: a lowercase letter names the captured piece, `c`/`C` mark short and
//! long castling, `E` marks en passant and an uppercase piece letter is the
//! promotion (`e2e4`, `e1g1c`, `b7a8rQ`, `e5d6E`). In fog-of-war games a bare
//! `?` means nothing about the move is known and `??e4` that only its
//! destination is.

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

use crate::variant::Variant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Castle {
    Short,
    Long,
}

/// A decoded move string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmithMove {
    Visible(SmithCoords),
    Hidden { to: Option<Square> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmithCoords {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
    pub captured: Option<Piece>,
    pub castle: Option<Castle>,
    pub en_passant: bool,
}

/// Parse a Smith-Warren move string.
pub fn parse_smith(s: &str) -> Result<SmithMove, NotationError> {
    let s = s.trim();
    if s == "?" {
        return Ok(SmithMove::Hidden { to: None });
    }
    if let Some(rest) = s.strip_prefix("??") {
        let to = parse_square(rest.get(0..2).unwrap_or(rest))?;
        return Ok(SmithMove::Hidden { to: Some(to) });
    }
    if s.len() < 4 || !s.is_ascii() {
        return Err(NotationError::InvalidMove(s.to_string()));
    }

    let mut coords = SmithCoords {
        from: parse_square(&s[0..2])?,
        to: parse_square(&s[2..4])?,
        promotion: None,
        captured: None,
        castle: None,
        en_passant: false,
    };

    for c in s[4..].chars() {
        match c {
            '=' => {}
            'c' => coords.castle = Some(Castle::Short),
            'C' => coords.castle = Some(Castle::Long),
            'E' => coords.en_passant = true,
            'p' | 'n' | 'b' | 'r' | 'q' | 'k' => coords.captured = piece_from_char(c),
            'N' | 'B' | 'R' | 'Q' | 'K' => coords.promotion = piece_from_char(c),
            _ => return Err(NotationError::InvalidPromotion(s.to_string())),
        }
    }

    Ok(SmithMove::Visible(coords))
}

impl SmithCoords {
    /// Resolve into the cozy-chess move for `board`.
    ///
    /// cozy-chess encodes castling as the king capturing its own rook, so both
    /// the explicit castle flags and the conventional two-square king move are
    /// translated. Legality is left to the caller.
    pub fn to_board_move(&self, board: &Board) -> Result<Move, NotationError> {
        if let Some(castle) = self.castle {
            return castle_move(board, castle)
                .ok_or_else(|| NotationError::NoCastling(format_square(self.from)));
        }

        let mv = Move {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        };
        if board.is_legal(mv) {
            return Ok(mv);
        }

        let king_move = board.piece_on(self.from) == Some(Piece::King)
            && self.from.rank() == self.to.rank()
            && (self.from.file() as i8 - self.to.file() as i8).abs() == 2;
        if king_move {
            let castle = if self.to.file() as u8 > self.from.file() as u8 {
                Castle::Short
            } else {
                Castle::Long
            };
            if let Some(castling) = castle_move(board, castle) {
                return Ok(castling);
            }
        }

        Ok(mv)
    }
}

fn castle_move(board: &Board, castle: Castle) -> Option<Move> {
    let color = board.side_to_move();
    let king = board.king(color);
    let rights = board.castle_rights(color);
    let rook_file = match castle {
        Castle::Short => rights.short,
        Castle::Long => rights.long,
    }?;
    let mv = Move {
        from: king,
        to: Square::new(rook_file, king.rank()),
        promotion: None,
    };
    board.is_legal(mv).then_some(mv)
}

/// Format a move the way the server expects it typed (`e2e4`, `e7e8=Q`).
///
/// Castling goes out as the king's two-square move, or as `o-o`/`o-o-o` in
/// Fischer random where that would be ambiguous.
pub fn format_outbound(board: &Board, mv: Move, variant: Variant) -> String {
    let is_castle = board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to).is_some()
        && board.color_on(mv.to) == board.color_on(mv.from);

    if is_castle {
        let short = mv.to.file() as u8 > mv.from.file() as u8;
        if variant.is_chess960() {
            return if short { "o-o" } else { "o-o-o" }.to_string();
        }
        let file = if short { File::G } else { File::C };
        return format!(
            "{}{}",
            format_square(mv.from),
            format_square(Square::new(file, mv.from.rank()))
        );
    }

    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push('=');
        s.push(piece_to_char(promo));
    }
    s
}

fn piece_from_char(c: char) -> Option<Piece> {
    match c.to_ascii_lowercase() {
        'p' => Some(Piece::Pawn),
        'n' => Some(Piece::Knight),
        'b' => Some(Piece::Bishop),
        'r' => Some(Piece::Rook),
        'q' => Some(Piece::Queen),
        'k' => Some(Piece::King),
        _ => None,
    }
}

fn piece_to_char(p: Piece) -> char {
    match p {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

pub fn parse_square(s: &str) -> Result<Square, NotationError> {
    let mut chars = s.chars();
    let (Some(f), Some(r), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(NotationError::InvalidSquare(s.to_string()));
    };

    let file = match f {
        'a' => File::A,
        'b' => File::B,
        'c' => File::C,
        'd' => File::D,
        'e' => File::E,
        'f' => File::F,
        'g' => File::G,
        'h' => File::H,
        _ => return Err(NotationError::InvalidSquare(s.to_string())),
    };

    let rank = match r {
        '1' => Rank::First,
        '2' => Rank::Second,
        '3' => Rank::Third,
        '4' => Rank::Fourth,
        '5' => Rank::Fifth,
        '6' => Rank::Sixth,
        '7' => Rank::Seventh,
        '8' => Rank::Eighth,
        _ => return Err(NotationError::InvalidSquare(s.to_string())),
    };

    Ok(Square::new(file, rank))
}

pub fn format_square(sq: Square) -> String {
    let file = match sq.file() {
        File::A => 'a',
        File::B => 'b',
        File::C => 'c',
        File::D => 'd',
        File::E => 'e',
        File::F => 'f',
        File::G => 'g',
        File::H => 'h',
    };
    format!("{}{}", file, sq.rank() as u8 + 1)
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum NotationError {
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid suffix in move: {0}")]
    InvalidPromotion(String),
    #[error("No castling available for king on {0}")]
    NoCastling(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        parse_square(s).unwrap()
    }

    fn visible(s: &str) -> SmithCoords {
        match parse_smith(s).unwrap() {
            SmithMove::Visible(c) => c,
            other => panic!("expected a visible move, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_plain_move() {
        let c = visible("e2e4");
        assert_eq!(c.from, sq("e2"));
        assert_eq!(c.to, sq("e4"));
        assert_eq!(c.promotion, None);
    }

    #[test]
    fn test_parse_capture_promotion() {
        let c = visible("b7a8rQ");
        assert_eq!(c.captured, Some(Piece::Rook));
        assert_eq!(c.promotion, Some(Piece::Queen));
        assert_eq!(visible("e7e8=N").promotion, Some(Piece::Knight));
    }

    #[test]
    fn test_parse_hidden_moves() {
        assert_eq!(parse_smith("?").unwrap(), SmithMove::Hidden { to: None });
        assert_eq!(
            parse_smith("??e4").unwrap(),
            SmithMove::Hidden { to: Some(sq("e4")) }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_smith("e2").is_err());
        assert!(parse_smith("i2e4").is_err());
        assert!(parse_smith("e2e4x").is_err());
    }

    #[test]
    fn test_castling_resolves_to_king_takes_rook() {
        let board: Board = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
        let short = visible("e1g1c").to_board_move(&board).unwrap();
        assert_eq!(short.to, sq("h1"));
        let long = visible("e1c1").to_board_move(&board).unwrap();
        assert_eq!(long.to, sq("a1"));
        assert_eq!(format_outbound(&board, short, Variant::Chess), "e1g1");
        assert_eq!(format_outbound(&board, long, Variant::FischerRandom), "o-o-o");
    }

    #[test]
    fn test_format_outbound_promotion() {
        let board: Board = "8/4P3/8/8/8/k7/8/K7 w - - 0 1".parse().unwrap();
        let mv = visible("e7e8Q").to_board_move(&board).unwrap();
        assert_eq!(format_outbound(&board, mv, Variant::Chess), "e7e8=Q");
    }
}
