//! Datagram type numbers as assigned by the server.

use std::fmt;

/// A datagram type the client subscribes to or decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum DatagramKind {
    WhoAmI = 0,
    ExaminedGameIsGone = 14,
    MyGameStarted = 15,
    MyGameResult = 16,
    MyGameEnded = 17,
    StartedObserving = 18,
    StopObserving = 19,
    OffersInMyGame = 21,
    Takeback = 22,
    Backward = 23,
    SendMoves = 24,
    Kibitz = 26,
    ChannelTell = 28,
    Match = 29,
    MatchRemoved = 30,
    PersonalTell = 31,
    Shout = 32,
    MoveAlgebraic = 33,
    MoveSmith = 34,
    MoveTime = 35,
    MoveClock = 36,
    SetClock = 38,
    Flip = 39,
    IsolatedBoard = 40,
    IllegalMove = 42,
    MyRelationToGame = 43,
    Seek = 50,
    SeekRemoved = 51,
    Msec = 56,
    Circle = 60,
    Arrow = 61,
    MoreTime = 62,
    NotifyArrived = 65,
    NotifyLeft = 66,
    MyNotifyList = 69,
    LoginFailed = 70,
    GameListBegin = 73,
    GameListItem = 74,
    ChannelQTell = 83,
    PersonalQTell = 84,
    Uncircle = 90,
    Unarrow = 91,
    MyGameChange = 99,
    PositionBegin = 101,
    Tourney = 103,
    RemoveTourney = 104,
}

const ALL: &[DatagramKind] = &[
    DatagramKind::WhoAmI,
    DatagramKind::ExaminedGameIsGone,
    DatagramKind::MyGameStarted,
    DatagramKind::MyGameResult,
    DatagramKind::MyGameEnded,
    DatagramKind::StartedObserving,
    DatagramKind::StopObserving,
    DatagramKind::OffersInMyGame,
    DatagramKind::Takeback,
    DatagramKind::Backward,
    DatagramKind::SendMoves,
    DatagramKind::Kibitz,
    DatagramKind::ChannelTell,
    DatagramKind::Match,
    DatagramKind::MatchRemoved,
    DatagramKind::PersonalTell,
    DatagramKind::Shout,
    DatagramKind::MoveAlgebraic,
    DatagramKind::MoveSmith,
    DatagramKind::MoveTime,
    DatagramKind::MoveClock,
    DatagramKind::SetClock,
    DatagramKind::Flip,
    DatagramKind::IsolatedBoard,
    DatagramKind::IllegalMove,
    DatagramKind::MyRelationToGame,
    DatagramKind::Seek,
    DatagramKind::SeekRemoved,
    DatagramKind::Msec,
    DatagramKind::Circle,
    DatagramKind::Arrow,
    DatagramKind::MoreTime,
    DatagramKind::NotifyArrived,
    DatagramKind::NotifyLeft,
    DatagramKind::MyNotifyList,
    DatagramKind::LoginFailed,
    DatagramKind::GameListBegin,
    DatagramKind::GameListItem,
    DatagramKind::ChannelQTell,
    DatagramKind::PersonalQTell,
    DatagramKind::Uncircle,
    DatagramKind::Unarrow,
    DatagramKind::MyGameChange,
    DatagramKind::PositionBegin,
    DatagramKind::Tourney,
    DatagramKind::RemoveTourney,
];

impl DatagramKind {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Self> {
        ALL.iter().copied().find(|kind| kind.code() == code)
    }
}

impl fmt::Display for DatagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}
