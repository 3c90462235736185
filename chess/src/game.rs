use cozy_chess::{Board, BoardBuilder, Color, File, Move, Piece, Rank, Square};

use crate::notation::{NotationError, SmithMove};
use crate::variant::Variant;

/// A move line: the initial position, every move made from it, and the live
/// position those moves lead to.
///
/// The live position is always the replay of `history` onto `start`; takebacks
/// truncate the history and replay rather than undoing move by move.
///
/// In fog-of-war variants the board is only a best guess: unseen captures
/// leave stale pieces behind, so moves the guess rejects are placed without a
/// legality check and never fail.
#[derive(Debug, Clone)]
pub struct Game {
    variant: Variant,
    start: Board,
    position: Board,
    history: Vec<HistoryEntry>,
}

/// One move of the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub played: PlayedMove,
    /// The notation the server sent for this move.
    pub smith: String,
    /// Algebraic notation as announced by the server, if it sent one.
    pub algebraic: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayedMove {
    Move(Move),
    /// A fog-of-war move; the turn passes but the board is unchanged.
    Hidden { to: Option<Square> },
}

impl Game {
    pub fn new(variant: Variant, start: Board) -> Self {
        Self {
            variant,
            position: start.clone(),
            start,
            history: Vec::new(),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Get the initial position of the line
    pub fn start(&self) -> &Board {
        &self.start
    }

    /// Get the current board position
    pub fn position(&self) -> &Board {
        &self.position
    }

    /// Get the move history
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Play a server-announced move onto the live position.
    pub fn play(
        &mut self,
        smith: &str,
        algebraic: Option<String>,
    ) -> Result<HistoryEntry, GameError> {
        let played = match crate::notation::parse_smith(smith)? {
            SmithMove::Visible(coords) => match coords.to_board_move(&self.position) {
                Ok(mv) => PlayedMove::Move(mv),
                Err(NotationError::NoCastling(_)) if self.variant.allows_hidden_moves() => {
                    PlayedMove::Move(Move {
                        from: coords.from,
                        to: coords.to,
                        promotion: coords.promotion,
                    })
                }
                Err(e) => return Err(e.into()),
            },
            SmithMove::Hidden { to } => {
                if !self.variant.allows_hidden_moves() {
                    return Err(GameError::HiddenMoveNotAllowed(self.variant));
                }
                PlayedMove::Hidden { to }
            }
        };

        apply(&mut self.position, played, self.variant)?;

        let entry = HistoryEntry {
            played,
            smith: smith.to_string(),
            algebraic,
        };
        self.history.push(entry.clone());
        Ok(entry)
    }

    /// Drop the last `count` moves (all of them if there are fewer) and replay
    /// the rest from the initial position.
    pub fn truncate(&mut self, count: usize) -> Result<(), GameError> {
        let keep = self.history.len().saturating_sub(count);
        self.history.truncate(keep);
        self.rebuild_position()
    }

    /// Start over from a new initial position with an empty move list.
    pub fn reset(&mut self, start: Board) {
        self.position = start.clone();
        self.start = start;
        self.history.clear();
    }

    /// Every move of the line paired with the position it led to.
    pub fn positions_after_moves(&self) -> Result<Vec<(HistoryEntry, Board)>, GameError> {
        let mut board = self.start.clone();
        let mut line = Vec::with_capacity(self.history.len());
        for entry in &self.history {
            apply(&mut board, entry.played, self.variant)?;
            line.push((entry.clone(), board.clone()));
        }
        Ok(line)
    }

    /// Play the same moves from `start` under another ruleset.
    pub fn replayed_as(&self, variant: Variant) -> Result<Game, GameError> {
        let mut game = Game::new(variant, self.start.clone());
        for entry in &self.history {
            game.play(&entry.smith, entry.algebraic.clone())?;
        }
        Ok(game)
    }

    /// Rebuild position from start + history
    fn rebuild_position(&mut self) -> Result<(), GameError> {
        let mut board = self.start.clone();
        for entry in &self.history {
            apply(&mut board, entry.played, self.variant)?;
        }
        self.position = board;
        Ok(())
    }
}

fn apply(board: &mut Board, played: PlayedMove, variant: Variant) -> Result<(), GameError> {
    match played {
        PlayedMove::Move(mv) => {
            if board.try_play(mv).is_ok() {
                return Ok(());
            }
            if !variant.allows_hidden_moves() {
                return Err(GameError::IllegalMove(mv));
            }
            // A guess that cannot hold the move is kept as it is, identically
            // on replay.
            if let Some(next) = place(board, mv) {
                *board = next;
            }
            Ok(())
        }
        PlayedMove::Hidden { .. } => {
            if let Some(next) = board.null_move().or_else(|| pass(board)) {
                *board = next;
            }
            Ok(())
        }
    }
}

/// Hand the turn over without moving anything, even out of check.
fn pass(board: &Board) -> Option<Board> {
    let mut builder = BoardBuilder::from_board(board);
    builder.side_to_move = !board.side_to_move();
    builder.en_passant = None;
    builder.build().ok()
}

/// Move a piece on a fog-of-war guess. The mover is whoever owns the piece on
/// the origin square, and whatever stands on the destination is replaced.
fn place(board: &Board, mv: Move) -> Option<Board> {
    let mut builder = BoardBuilder::from_board(board);
    let (piece, color) = builder.square(mv.from)?;
    let back_rank = Rank::First.relative_to(color);

    *builder.square_mut(mv.from) = None;
    let rook = castling_rook(&builder, piece, color, mv);
    match rook {
        Some(rook) => {
            let short = rook.file() > mv.from.file();
            let (king_file, rook_file) = if short {
                (File::G, File::F)
            } else {
                (File::C, File::D)
            };
            *builder.square_mut(rook) = None;
            *builder.square_mut(Square::new(king_file, back_rank)) = Some((Piece::King, color));
            *builder.square_mut(Square::new(rook_file, back_rank)) = Some((Piece::Rook, color));
        }
        None => {
            *builder.square_mut(mv.to) = Some((mv.promotion.unwrap_or(piece), color));
        }
    }

    if piece == Piece::King {
        let rights = builder.castle_rights_mut(color);
        rights.short = None;
        rights.long = None;
    }
    for &side in &Color::ALL {
        let back_rank = Rank::First.relative_to(side);
        let rights = builder.castle_rights_mut(side);
        for right in [&mut rights.short, &mut rights.long] {
            if let Some(file) = *right {
                let corner = Square::new(file, back_rank);
                if corner == mv.from || corner == mv.to {
                    *right = None;
                }
            }
        }
    }

    builder.side_to_move = !color;
    builder.en_passant = None;
    builder.halfmove_clock = 0;
    if color == Color::Black {
        builder.fullmove_number = builder.fullmove_number.saturating_add(1);
    }
    builder.build().ok()
}

/// The rook a king move castles with: either the king lands on its own rook,
/// or it steps two files along the back rank towards a castling rook.
fn castling_rook(builder: &BoardBuilder, piece: Piece, color: Color, mv: Move) -> Option<Square> {
    if piece != Piece::King {
        return None;
    }
    if builder.square(mv.to) == Some((Piece::Rook, color)) {
        return Some(mv.to);
    }
    let back_rank = Rank::First.relative_to(color);
    let steps = (mv.from.file() as i8 - mv.to.file() as i8).abs();
    if mv.from.rank() != back_rank || mv.to.rank() != back_rank || steps != 2 {
        return None;
    }
    let rights = builder.castle_rights(color);
    let file = if mv.to.file() > mv.from.file() {
        rights.short
    } else {
        rights.long
    }?;
    let rook = Square::new(file, back_rank);
    (builder.square(rook) == Some((Piece::Rook, color))).then_some(rook)
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move: {0}")]
    IllegalMove(Move),
    #[error("Hidden moves are not part of {0}")]
    HiddenMoveNotAllowed(Variant),
    #[error("Notation error: {0}")]
    Notation(#[from] NotationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::format_fen;
    use proptest::prelude::*;

    fn standard() -> Game {
        Game::new(Variant::Chess, Board::default())
    }

    #[test]
    fn test_play_and_truncate() {
        let mut game = standard();
        game.play("e2e4", Some("e4".into())).unwrap();
        game.play("e7e5", None).unwrap();
        assert_eq!(game.len(), 2);

        game.truncate(1).unwrap();
        assert_eq!(game.len(), 1);
        let mut expected = Board::default();
        expected.play("e2e4".parse().unwrap());
        assert_eq!(format_fen(game.position()), format_fen(&expected));
        assert_eq!(game.history()[0].algebraic.as_deref(), Some("e4"));
    }

    #[test]
    fn test_truncate_past_start_clears_history() {
        let mut game = standard();
        game.play("g1f3", None).unwrap();
        game.truncate(9999).unwrap();
        assert!(game.is_empty());
        assert_eq!(format_fen(game.position()), format_fen(&Board::default()));
    }

    #[test]
    fn test_positions_after_moves_end_at_live_position() {
        let mut game = standard();
        game.play("e2e4", None).unwrap();
        game.play("c7c5", None).unwrap();
        game.play("g1f3", None).unwrap();

        let line = game.positions_after_moves().unwrap();
        assert_eq!(line.len(), 3);
        assert_eq!(line[1].0.smith, "c7c5");
        assert_eq!(format_fen(&line[2].1), format_fen(game.position()));

        let replayed = game.replayed_as(Variant::Wild(2)).unwrap();
        assert_eq!(replayed.len(), 3);
        assert_eq!(format_fen(replayed.position()), format_fen(game.position()));
    }

    #[test]
    fn test_illegal_move_is_rejected() {
        let mut game = standard();
        assert!(matches!(
            game.play("e2e5", None),
            Err(GameError::IllegalMove(_))
        ));
        assert!(game.is_empty());
    }

    #[test]
    fn test_hidden_moves_only_in_kriegspiel() {
        let mut game = standard();
        assert!(game.play("?", None).is_err());

        let mut kriegspiel = Game::new(Variant::Kriegspiel, Board::default());
        kriegspiel.play("e2e4", None).unwrap();
        kriegspiel.play("??e5", None).unwrap();
        assert_eq!(kriegspiel.position().side_to_move(), cozy_chess::Color::White);
    }

    #[test]
    fn test_kriegspiel_tolerates_unseen_captures() {
        let mut game = Game::new(Variant::Kriegspiel, Board::default());
        game.play("e2e4", None).unwrap();
        game.play("?", None).unwrap();
        // Black's hidden move was d7d5; on the guess d5 is still empty.
        let entry = game.play("e4d5", None).unwrap();
        assert_eq!(entry.played, PlayedMove::Move("e4d5".parse().unwrap()));
        assert_eq!(game.len(), 3);

        let position = game.position();
        assert_eq!(position.side_to_move(), cozy_chess::Color::Black);
        assert_eq!(position.piece_on(Square::D5), Some(cozy_chess::Piece::Pawn));
        assert_eq!(position.piece_on(Square::E4), None);

        let replayed = game.positions_after_moves().unwrap();
        assert_eq!(format_fen(&replayed[2].1), format_fen(position));
        game.truncate(1).unwrap();
        assert_eq!(game.position().piece_on(Square::E4), Some(cozy_chess::Piece::Pawn));
        assert_eq!(game.position().side_to_move(), cozy_chess::Color::White);
    }

    #[test]
    fn test_kriegspiel_hidden_move_out_of_check() {
        let start = crate::fen::parse_fen("4k3/8/8/8/8/8/8/4KQ2 w - - 0 1", Variant::Kriegspiel).unwrap();
        let mut game = Game::new(Variant::Kriegspiel, start);
        game.play("f1f7", None).unwrap();
        assert!(!game.position().checkers().is_empty());

        // The king steps out of check unseen, and White carries on.
        game.play("?", None).unwrap();
        game.play("e1d2", None).unwrap();
        assert_eq!(game.len(), 3);
        assert_eq!(game.position().piece_on(Square::D2), Some(cozy_chess::Piece::King));
    }

    #[test]
    fn test_kriegspiel_castles_on_a_stale_guess() {
        // The rook on e8 was taken unseen, so White castles out of a check
        // that only the guess still shows.
        let start = crate::fen::parse_fen("4r1k1/8/8/8/8/8/8/R3K2R w KQ - 0 1", Variant::Kriegspiel)
            .unwrap();
        let mut game = Game::new(Variant::Kriegspiel, start);
        game.play("e1g1c", None).unwrap();

        let position = game.position();
        assert_eq!(position.piece_on(Square::G1), Some(cozy_chess::Piece::King));
        assert_eq!(position.piece_on(Square::F1), Some(cozy_chess::Piece::Rook));
        assert_eq!(position.piece_on(Square::H1), None);
        assert_eq!(position.castle_rights(cozy_chess::Color::White).long, None);
        assert_eq!(position.side_to_move(), cozy_chess::Color::Black);
    }

    #[test]
    fn test_illegal_move_still_rejected_in_chess() {
        let mut game = standard();
        game.play("e2e4", None).unwrap();
        game.play("e7e5", None).unwrap();
        assert!(matches!(
            game.play("e4d5", None),
            Err(GameError::IllegalMove(_))
        ));
    }

    /// Random legal lines: truncating `k` moves equals replaying the first `n - k`.
    fn random_line(seed: u64, len: usize) -> Vec<Move> {
        let mut board = Board::default();
        let mut line = Vec::new();
        let mut state = seed;
        for _ in 0..len {
            let mut moves = Vec::new();
            board.generate_moves(|mvs| {
                moves.extend(mvs);
                false
            });
            if moves.is_empty() {
                break;
            }
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let mv = moves[(state >> 33) as usize % moves.len()];
            board.play_unchecked(mv);
            line.push(mv);
        }
        line
    }

    proptest! {
        #[test]
        fn prop_truncate_equals_replay(seed in any::<u64>(), len in 0usize..40, back in 0usize..45) {
            let line = random_line(seed, len);
            let mut game = standard();
            for mv in &line {
                let smith = crate::notation::format_square(mv.from) + &crate::notation::format_square(mv.to);
                let suffix = match mv.promotion {
                    Some(cozy_chess::Piece::Knight) => "N",
                    Some(cozy_chess::Piece::Bishop) => "B",
                    Some(cozy_chess::Piece::Rook) => "R",
                    Some(_) => "Q",
                    None => "",
                };
                let played = game.play(&(smith + suffix), None);
                prop_assert!(played.is_ok());
            }
            game.truncate(back).unwrap();

            let kept = line.len().saturating_sub(back);
            let mut expected = Board::default();
            for mv in &line[..kept] {
                expected.play_unchecked(*mv);
            }
            prop_assert_eq!(game.len(), kept);
            prop_assert_eq!(format_fen(game.position()), format_fen(&expected));
        }
    }
}
