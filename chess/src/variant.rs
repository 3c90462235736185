//! Rulesets the server can announce, keyed by its "wild" number.

use std::fmt;

/// A ruleset the client knows how to track.
///
/// Wild numbers without an entry here (losers, crazyhouse, bughouse, atomic,
/// two-king setups, ...) are unsupported: games announced with them are never
/// staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Chess,
    /// Orthodox rules played from a server-supplied setup (shuffles, odds games).
    Wild(u8),
    FischerRandom,
    /// Fog-of-war chess: observers may only see part of each move.
    Kriegspiel,
}

/// Wild numbers whose rules are plain chess from a non-standard setup.
const ORTHODOX_WILDS: &[u8] = &[2, 3, 4, 7, 8, 10, 11, 12, 13, 14, 15, 18, 19, 20, 21];

impl Variant {
    /// Map a server wild number to a ruleset. `None` means unsupported.
    pub fn from_wild(number: u32) -> Option<Self> {
        match number {
            0 => Some(Self::Chess),
            16 => Some(Self::Kriegspiel),
            22 => Some(Self::FischerRandom),
            n => u8::try_from(n)
                .ok()
                .filter(|n| ORTHODOX_WILDS.contains(n))
                .map(Self::Wild),
        }
    }

    pub fn wild_number(self) -> u32 {
        match self {
            Self::Chess => 0,
            Self::Wild(n) => u32::from(n),
            Self::Kriegspiel => 16,
            Self::FischerRandom => 22,
        }
    }

    /// Castling is encoded king-takes-rook and FENs use shredder castling files.
    pub fn is_chess960(self) -> bool {
        matches!(self, Self::FischerRandom)
    }

    /// Whether move notifications may arrive with the origin (or the whole move) hidden.
    pub fn allows_hidden_moves(self) -> bool {
        matches!(self, Self::Kriegspiel)
    }

    pub fn name(self) -> String {
        match self {
            Self::Chess => "chess".to_string(),
            Self::Wild(n) => format!("wild/{}", n),
            Self::FischerRandom => "fischer random".to_string(),
            Self::Kriegspiel => "kriegspiel".to_string(),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
