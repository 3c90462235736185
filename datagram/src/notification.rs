//! Typed views of the datagrams the core reacts to.

use chess::Side;

use crate::codec::Datagram;
use crate::kind::DatagramKind;
use crate::DatagramError;

/// A decoded server notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    WhoAmI {
        name: String,
        titles: String,
    },
    LoginFailed {
        code: i64,
        reason: String,
    },
    /// A game the user plays, observes, or asked to see as a single board.
    GameStarted {
        origin: StartOrigin,
        info: GameStartInfo,
    },
    /// The descriptive attributes of one of the user's games changed.
    GameChanged(GameStartInfo),
    PositionBegin {
        game: u32,
        fen: String,
        moves_to_follow: u32,
    },
    Move(MoveInfo),
    /// Examine-mode `backward` or an accepted takeback; both rewind the line.
    Backward {
        game: u32,
        count: u32,
    },
    IllegalMove {
        game: u32,
        text: String,
        reason: i64,
    },
    Relation {
        game: u32,
        relation: Relation,
    },
    GameResult(GameResultInfo),
    /// The game ended for the user (own game over, stopped observing, examined
    /// game gone).
    GameGone {
        game: u32,
    },
    Msec {
        game: u32,
        side: Side,
        millis: i64,
        running: bool,
    },
    SetClock {
        game: u32,
        white_millis: i64,
        black_millis: i64,
    },
    MoreTime {
        game: u32,
        side: Side,
        seconds: i64,
    },
    Flip {
        game: u32,
        flipped: bool,
    },
    Offers {
        game: u32,
        offers: Offers,
    },
    Circle {
        game: u32,
        examiner: String,
        square: String,
        added: bool,
    },
    Arrow {
        game: u32,
        examiner: String,
        from: String,
        to: String,
        added: bool,
    },
    Chat(ChatLine),
    Seek(SeekInfo),
    SeekRemoved {
        index: u32,
        reason: i64,
    },
    GameListBegin(GameListHeader),
    GameListItem(GameListEntry),
    Tourney(TourneyInfo),
    TourneyRemoved {
        id: u32,
    },
    FriendArrived {
        name: String,
    },
    FriendLeft {
        name: String,
    },
    NotifyList {
        name: String,
        added: bool,
    },
    Match(MatchInfo),
    MatchRemoved {
        challenger: String,
        receiver: String,
        explanation: String,
    },
    /// A datagram that only modifies the layout of others.
    Ignored(DatagramKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOrigin {
    MyGame,
    Observing,
    IsolatedBoard,
}

/// Attributes shared by the game-started family and game-change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStartInfo {
    pub game: u32,
    pub white: String,
    pub black: String,
    pub wild: u32,
    pub rating_category: String,
    pub rated: bool,
    pub white_initial_minutes: u32,
    pub white_increment_seconds: u32,
    pub black_initial_minutes: u32,
    pub black_increment_seconds: u32,
    pub played: bool,
    pub white_rating: u32,
    pub black_rating: u32,
    pub game_id: String,
    pub white_titles: String,
    pub black_titles: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveInfo {
    pub game: u32,
    pub algebraic: Option<String>,
    pub smith: String,
    pub time_taken: Option<i64>,
    pub clock: Option<i64>,
    pub variation: Option<i64>,
}

/// The user's relation to a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    PlayingWhite,
    PlayingBlack,
    Examining,
    /// Playing in a simul from the giver's side.
    PlayingSimul,
    Observing,
    ObservingSimul,
    Nothing,
}

impl Relation {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "PW" => Some(Self::PlayingWhite),
            "PB" => Some(Self::PlayingBlack),
            "PE" => Some(Self::Examining),
            "PP" => Some(Self::PlayingSimul),
            "O" => Some(Self::Observing),
            "SE" => Some(Self::ObservingSimul),
            "X" => Some(Self::Nothing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResultInfo {
    pub game: u32,
    pub becomes_examined: bool,
    pub code: String,
    /// `1-0`, `0-1`, `1/2-1/2` or `*`.
    pub score: String,
    pub description: String,
}

/// Standing offers in a game; takebacks carry the requested ply count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Offers {
    pub draw: [bool; 2],
    pub adjourn: [bool; 2],
    pub abort: [bool; 2],
    pub takeback: [u32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatKind {
    Say,
    Tell,
    PartnerTell,
    QTell,
    AdminTell,
    Shout,
    IShout,
    SShout,
    Announcement,
    ChannelTell,
    ChannelATell,
    ChannelQTell,
    Kibitz,
    Whisper,
}

/// Where a chat line was said, beyond the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Forum {
    Channel(u32),
    Game(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub kind: ChatKind,
    pub sender: String,
    pub titles: String,
    pub text: String,
    pub forum: Option<Forum>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeekInfo {
    pub index: u32,
    pub name: String,
    pub titles: String,
    pub rating: u32,
    pub provisional: bool,
    pub wild: u32,
    pub rating_category: String,
    pub minutes: u32,
    pub increment: u32,
    pub rated: bool,
    /// `-1` any, `0` black, `1` white.
    pub color: i64,
    pub min_rating: u32,
    pub max_rating: u32,
    pub manual: bool,
    pub formula: bool,
    pub registered: bool,
    pub computer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameListHeader {
    pub command: String,
    pub params: String,
    pub hits: u32,
    pub first: u32,
    pub last: u32,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameListEntry {
    pub index: u32,
    pub game_id: String,
    pub event: String,
    pub date: String,
    pub time: String,
    pub white: String,
    pub white_rating: u32,
    pub black: String,
    pub black_rating: u32,
    pub rated: bool,
    pub rating_category: String,
    pub wild: u32,
    pub initial_minutes: u32,
    pub increment_seconds: u32,
    pub eco: String,
    pub status: i64,
    pub color: i64,
    pub mode: i64,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TourneyInfo {
    pub id: u32,
    pub bits: i64,
    pub description: String,
    pub join: Option<String>,
    pub watch: Option<String>,
    pub info: Option<String>,
    pub confirm: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInfo {
    pub challenger: String,
    pub challenger_rating: u32,
    pub challenger_titles: String,
    pub receiver: String,
    pub receiver_rating: u32,
    pub receiver_titles: String,
    pub wild: u32,
    pub rating_category: String,
    pub rated: bool,
    pub adjourned: bool,
    pub challenger_minutes: u32,
    pub challenger_increment: u32,
    pub receiver_minutes: u32,
    pub receiver_increment: u32,
    /// `-1` no preference, `0` black, `1` white.
    pub color: i64,
}

impl Notification {
    /// Decode a datagram into its typed form.
    pub fn decode(dg: &Datagram) -> Result<Self, DatagramError> {
        use DatagramKind as K;

        let n = match dg.kind {
            K::WhoAmI => Self::WhoAmI {
                name: dg.string(0)?.to_string(),
                titles: dg.opt_string(1).unwrap_or_default().to_string(),
            },
            K::LoginFailed => Self::LoginFailed {
                code: dg.int(0)?,
                reason: dg.opt_string(1).unwrap_or_default().to_string(),
            },
            K::MyGameStarted => Self::GameStarted {
                origin: StartOrigin::MyGame,
                info: decode_start(dg)?,
            },
            K::StartedObserving => Self::GameStarted {
                origin: StartOrigin::Observing,
                info: decode_start(dg)?,
            },
            K::IsolatedBoard => Self::GameStarted {
                origin: StartOrigin::IsolatedBoard,
                info: decode_start(dg)?,
            },
            K::MyGameChange => Self::GameChanged(decode_start(dg)?),
            K::PositionBegin => Self::PositionBegin {
                game: dg.uint(0)?,
                fen: dg.string(1)?.to_string(),
                moves_to_follow: dg.uint(2)?,
            },
            K::SendMoves => Self::Move(MoveInfo {
                game: dg.uint(0)?,
                algebraic: dg.opt_string(1).map(str::to_string),
                smith: dg.string(2)?.to_string(),
                time_taken: dg.opt_int(3)?,
                clock: dg.opt_int(4)?,
                variation: dg.opt_int(5)?,
            }),
            K::Backward | K::Takeback => Self::Backward {
                game: dg.uint(0)?,
                count: dg.uint(1)?,
            },
            K::IllegalMove => Self::IllegalMove {
                game: dg.uint(0)?,
                text: dg.string(1)?.to_string(),
                reason: dg.opt_int(2)?.unwrap_or(0),
            },
            K::MyRelationToGame => {
                let symbol = dg.string(1)?;
                let relation =
                    Relation::from_symbol(symbol).ok_or_else(|| DatagramError::UnknownSymbol {
                        kind: dg.kind,
                        value: symbol.to_string(),
                    })?;
                Self::Relation {
                    game: dg.uint(0)?,
                    relation,
                }
            }
            K::MyGameResult => Self::GameResult(GameResultInfo {
                game: dg.uint(0)?,
                becomes_examined: dg.boolean(1)?,
                code: dg.string(2)?.to_string(),
                score: dg.string(3)?.to_string(),
                description: dg.opt_string(4).unwrap_or_default().to_string(),
            }),
            K::MyGameEnded | K::StopObserving | K::ExaminedGameIsGone => Self::GameGone {
                game: dg.uint(0)?,
            },
            K::Msec => Self::Msec {
                game: dg.uint(0)?,
                side: side(dg, 1)?,
                millis: dg.int(2)?,
                running: dg.boolean(3)?,
            },
            K::SetClock => Self::SetClock {
                game: dg.uint(0)?,
                white_millis: dg.int(1)? * 1000,
                black_millis: dg.int(2)? * 1000,
            },
            K::MoreTime => Self::MoreTime {
                game: dg.uint(0)?,
                side: side(dg, 1)?,
                seconds: dg.int(2)?,
            },
            K::Flip => Self::Flip {
                game: dg.uint(0)?,
                flipped: dg.boolean(1)?,
            },
            K::OffersInMyGame => Self::Offers {
                game: dg.uint(0)?,
                offers: Offers {
                    draw: [dg.boolean(1)?, dg.boolean(2)?],
                    adjourn: [dg.boolean(3)?, dg.boolean(4)?],
                    abort: [dg.boolean(5)?, dg.boolean(6)?],
                    takeback: [dg.uint(7)?, dg.uint(8)?],
                },
            },
            K::Circle | K::Uncircle => Self::Circle {
                game: dg.uint(0)?,
                examiner: dg.string(1)?.to_string(),
                square: dg.string(2)?.to_string(),
                added: dg.kind == K::Circle,
            },
            K::Arrow | K::Unarrow => Self::Arrow {
                game: dg.uint(0)?,
                examiner: dg.string(1)?.to_string(),
                from: dg.string(2)?.to_string(),
                to: dg.string(3)?.to_string(),
                added: dg.kind == K::Arrow,
            },
            K::PersonalTell => {
                let kind = match dg.int(3)? {
                    0 => ChatKind::Say,
                    1 => ChatKind::Tell,
                    2 => ChatKind::PartnerTell,
                    3 => ChatKind::QTell,
                    4 => ChatKind::AdminTell,
                    other => return Err(unknown(dg, other)),
                };
                Self::Chat(chat(dg, kind, 0, 2, None)?)
            }
            K::PersonalQTell => Self::Chat(chat(dg, ChatKind::QTell, 0, 2, None)?),
            K::Shout => {
                let kind = match dg.int(2)? {
                    0 => ChatKind::Shout,
                    1 => ChatKind::IShout,
                    2 => ChatKind::SShout,
                    3 => ChatKind::Announcement,
                    other => return Err(unknown(dg, other)),
                };
                Self::Chat(chat(dg, kind, 0, 3, None)?)
            }
            K::ChannelTell => {
                let kind = match dg.opt_int(4)?.unwrap_or(1) {
                    1 => ChatKind::ChannelTell,
                    2 => ChatKind::ChannelATell,
                    other => return Err(unknown(dg, other)),
                };
                let forum = Some(Forum::Channel(dg.uint(0)?));
                Self::Chat(chat(dg, kind, 1, 3, forum)?)
            }
            K::ChannelQTell => {
                let forum = Some(Forum::Channel(dg.uint(0)?));
                Self::Chat(chat(dg, ChatKind::ChannelQTell, 1, 3, forum)?)
            }
            K::Kibitz => {
                let kind = if dg.boolean(3)? {
                    ChatKind::Kibitz
                } else {
                    ChatKind::Whisper
                };
                let forum = Some(Forum::Game(dg.uint(0)?));
                Self::Chat(chat(dg, kind, 1, 4, forum)?)
            }
            K::Seek => Self::Seek(SeekInfo {
                index: dg.uint(0)?,
                name: dg.string(1)?.to_string(),
                titles: dg.string(2)?.to_string(),
                rating: dg.uint(3)?,
                provisional: dg.boolean(4)?,
                wild: dg.uint(5)?,
                rating_category: dg.string(6)?.to_string(),
                minutes: dg.uint(7)?,
                increment: dg.uint(8)?,
                rated: dg.boolean(9)?,
                color: dg.int(10)?,
                min_rating: dg.uint(11)?,
                max_rating: dg.uint(12)?,
                manual: !dg.boolean(13)?,
                formula: dg.boolean(14)?,
                registered: dg.opt_int(15)?.map_or(true, |v| v != 0),
                computer: dg.opt_int(16)?.is_some_and(|v| v != 0),
            }),
            K::SeekRemoved => Self::SeekRemoved {
                index: dg.uint(0)?,
                reason: dg.opt_int(1)?.unwrap_or(0),
            },
            K::GameListBegin => Self::GameListBegin(GameListHeader {
                command: dg.string(0)?.to_string(),
                params: dg.string(1)?.to_string(),
                hits: dg.uint(2)?,
                first: dg.uint(3)?,
                last: dg.uint(4)?,
                summary: dg.opt_string(5).unwrap_or_default().to_string(),
            }),
            K::GameListItem => Self::GameListItem(GameListEntry {
                index: dg.uint(0)?,
                game_id: dg.string(1)?.to_string(),
                event: dg.string(2)?.to_string(),
                date: dg.string(3)?.to_string(),
                time: dg.string(4)?.to_string(),
                white: dg.string(5)?.to_string(),
                white_rating: dg.uint(6)?,
                black: dg.string(7)?.to_string(),
                black_rating: dg.uint(8)?,
                rated: dg.boolean(9)?,
                rating_category: dg.string(10)?.to_string(),
                wild: dg.uint(11)?,
                initial_minutes: dg.uint(12)?,
                increment_seconds: dg.uint(13)?,
                eco: dg.string(14)?.to_string(),
                status: dg.int(15)?,
                color: dg.int(16)?,
                mode: dg.int(17)?,
                note: dg.opt_string(18).unwrap_or_default().to_string(),
            }),
            K::Tourney => Self::Tourney(TourneyInfo {
                id: dg.uint(0)?,
                bits: dg.int(1)?,
                description: dg.string(2)?.to_string(),
                join: dg.opt_string(3).map(str::to_string),
                watch: dg.opt_string(4).map(str::to_string),
                info: dg.opt_string(5).map(str::to_string),
                confirm: dg.opt_string(6).map(str::to_string),
            }),
            K::RemoveTourney => Self::TourneyRemoved { id: dg.uint(0)? },
            K::NotifyArrived => Self::FriendArrived {
                name: dg.string(0)?.to_string(),
            },
            K::NotifyLeft => Self::FriendLeft {
                name: dg.string(0)?.to_string(),
            },
            K::MyNotifyList => Self::NotifyList {
                name: dg.string(0)?.to_string(),
                added: dg.boolean(1)?,
            },
            K::Match => Self::Match(MatchInfo {
                challenger: dg.string(0)?.to_string(),
                challenger_rating: dg.uint(1)?,
                challenger_titles: dg.string(2)?.to_string(),
                receiver: dg.string(3)?.to_string(),
                receiver_rating: dg.uint(4)?,
                receiver_titles: dg.string(5)?.to_string(),
                wild: dg.uint(6)?,
                rating_category: dg.string(7)?.to_string(),
                rated: dg.boolean(8)?,
                adjourned: dg.boolean(9)?,
                challenger_minutes: dg.uint(10)?,
                challenger_increment: dg.uint(11)?,
                receiver_minutes: dg.uint(12)?,
                receiver_increment: dg.uint(13)?,
                color: dg.int(14)?,
            }),
            K::MatchRemoved => Self::MatchRemoved {
                challenger: dg.string(0)?.to_string(),
                receiver: dg.string(1)?.to_string(),
                explanation: dg.opt_string(2).unwrap_or_default().to_string(),
            },
            K::MoveAlgebraic | K::MoveSmith | K::MoveTime | K::MoveClock => Self::Ignored(dg.kind),
        };

        Ok(n)
    }

    /// The game number a per-game notification refers to.
    pub fn game(&self) -> Option<u32> {
        match self {
            Self::GameStarted { info, .. } | Self::GameChanged(info) => Some(info.game),
            Self::Move(m) => Some(m.game),
            Self::GameResult(r) => Some(r.game),
            Self::PositionBegin { game, .. }
            | Self::Backward { game, .. }
            | Self::IllegalMove { game, .. }
            | Self::Relation { game, .. }
            | Self::GameGone { game }
            | Self::Msec { game, .. }
            | Self::SetClock { game, .. }
            | Self::MoreTime { game, .. }
            | Self::Flip { game, .. }
            | Self::Offers { game, .. }
            | Self::Circle { game, .. }
            | Self::Arrow { game, .. } => Some(*game),
            _ => None,
        }
    }
}

fn decode_start(dg: &Datagram) -> Result<GameStartInfo, DatagramError> {
    Ok(GameStartInfo {
        game: dg.uint(0)?,
        white: dg.string(1)?.to_string(),
        black: dg.string(2)?.to_string(),
        wild: dg.uint(3)?,
        rating_category: dg.string(4)?.to_string(),
        rated: dg.boolean(5)?,
        white_initial_minutes: dg.uint(6)?,
        white_increment_seconds: dg.uint(7)?,
        black_initial_minutes: dg.uint(8)?,
        black_increment_seconds: dg.uint(9)?,
        played: dg.boolean(10)?,
        white_rating: dg.uint(11)?,
        black_rating: dg.uint(12)?,
        game_id: dg.opt_string(13).unwrap_or_default().to_string(),
        white_titles: dg.opt_string(14).unwrap_or_default().to_string(),
        black_titles: dg.opt_string(15).unwrap_or_default().to_string(),
    })
}

fn chat(
    dg: &Datagram,
    kind: ChatKind,
    name_at: usize,
    text_at: usize,
    forum: Option<Forum>,
) -> Result<ChatLine, DatagramError> {
    Ok(ChatLine {
        kind,
        sender: dg.string(name_at)?.to_string(),
        titles: dg.string(name_at + 1)?.to_string(),
        text: dg.string(text_at)?.to_string(),
        forum,
    })
}

fn side(dg: &Datagram, index: usize) -> Result<Side, DatagramError> {
    let code = dg.string(index)?;
    Side::from_code(code).ok_or_else(|| DatagramError::UnknownSymbol {
        kind: dg.kind,
        value: code.to_string(),
    })
}

fn unknown(dg: &Datagram, value: i64) -> DatagramError {
    DatagramError::UnknownSymbol {
        kind: dg.kind,
        value: value.to_string(),
    }
}
