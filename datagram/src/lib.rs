//! Server datagram protocol: type numbers, the level-2 field codec, typed
//! notifications and outbound directives.
//!
//! Framing of the byte stream belongs to the transport; this crate starts at a
//! deframed datagram body such as `24 12 e4 e2e4 3 297 0`.

mod codec;
mod error;
mod kind;
mod notification;
mod outbound;

pub use codec::{parse_datagram, Datagram};
pub use error::DatagramError;
pub use kind::DatagramKind;
pub use notification::{
    ChatKind, ChatLine, Forum, GameListEntry, GameListHeader, GameResultInfo, GameStartInfo,
    MatchInfo, MoveInfo, Notification, Offers, Relation, SeekInfo, StartOrigin, TourneyInfo,
};
pub use outbound::Outbound;
