//! Reference-counted datagram subscriptions.
//!
//! Each listener family depends on a fixed group of datagram kinds. The group
//! is enabled in order when the family gets its first listener; the last kind
//! of each group is the family's sentinel, after which all related state is
//! known to be arriving. Removal disables the same group in reverse order.

use std::collections::HashMap;

use datagram::{DatagramKind, Outbound};

/// An externally visible event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Connection,
    Chat,
    Game,
    Seek,
    GameList,
    Friends,
    ChessEvent,
    MatchOffer,
}

impl Family {
    pub const ALL: [Family; 8] = [
        Family::Connection,
        Family::Chat,
        Family::Game,
        Family::Seek,
        Family::GameList,
        Family::Friends,
        Family::ChessEvent,
        Family::MatchOffer,
    ];

    /// The datagram kinds this family needs, in enable order.
    pub fn datagrams(self) -> &'static [DatagramKind] {
        use DatagramKind as K;

        match self {
            // Login datagrams are requested by the transport at login.
            Family::Connection => &[],
            Family::Chat => &[
                K::PersonalTell,
                K::PersonalQTell,
                K::Shout,
                K::ChannelTell,
                K::ChannelQTell,
                K::Kibitz,
            ],
            Family::Game => &[
                K::MoveAlgebraic,
                K::MoveSmith,
                K::MoveTime,
                K::MoveClock,
                K::SendMoves,
                K::Backward,
                K::Takeback,
                K::IllegalMove,
                K::Msec,
                K::SetClock,
                K::MoreTime,
                K::Flip,
                K::OffersInMyGame,
                K::Circle,
                K::Uncircle,
                K::Arrow,
                K::Unarrow,
                K::PositionBegin,
                K::MyGameResult,
                K::MyGameChange,
                K::MyRelationToGame,
                K::MyGameEnded,
                K::StopObserving,
                K::ExaminedGameIsGone,
                K::IsolatedBoard,
                K::StartedObserving,
                K::MyGameStarted,
            ],
            Family::Seek => &[K::SeekRemoved, K::Seek],
            Family::GameList => &[K::GameListItem, K::GameListBegin],
            Family::Friends => &[K::NotifyLeft, K::MyNotifyList, K::NotifyArrived],
            Family::ChessEvent => &[K::RemoveTourney, K::Tourney],
            Family::MatchOffer => &[K::MatchRemoved, K::Match],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Family::Connection => "connection",
            Family::Chat => "chat",
            Family::Game => "game",
            Family::Seek => "seek",
            Family::GameList => "game-list",
            Family::Friends => "friends",
            Family::ChessEvent => "chess-event",
            Family::MatchOffer => "match-offer",
        }
    }
}

#[derive(Debug, Default)]
pub struct DatagramRegistry {
    counts: HashMap<DatagramKind, u32>,
}

impl DatagramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more interested party; the directive is only needed on 0→1.
    pub fn enable(&mut self, kind: DatagramKind) -> Option<Outbound> {
        let count = self.counts.entry(kind).or_insert(0);
        *count += 1;
        (*count == 1).then_some(Outbound::SetDatagram {
            kind,
            enabled: true,
        })
    }

    /// Count one less interested party; the directive is only needed on 1→0.
    /// Disabling a kind nobody enabled does nothing.
    pub fn disable(&mut self, kind: DatagramKind) -> Option<Outbound> {
        let count = self.counts.get_mut(&kind)?;
        *count -= 1;
        if *count > 0 {
            return None;
        }
        self.counts.remove(&kind);
        Some(Outbound::SetDatagram {
            kind,
            enabled: false,
        })
    }

    pub fn is_enabled(&self, kind: DatagramKind) -> bool {
        self.counts.contains_key(&kind)
    }

    pub fn subscribe(&mut self, family: Family) -> Vec<Outbound> {
        family
            .datagrams()
            .iter()
            .filter_map(|&kind| self.enable(kind))
            .collect()
    }

    pub fn unsubscribe(&mut self, family: Family) -> Vec<Outbound> {
        family
            .datagrams()
            .iter()
            .rev()
            .filter_map(|&kind| self.disable(kind))
            .collect()
    }
}
