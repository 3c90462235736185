//! Session core for a chess-server datagram connection.
//!
//! Consumes the server's decoded notifications, keeps the per-game state in
//! step with the server and hands domain events to registered listeners.

pub mod config;
mod connection;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod game;
pub mod game_list;
pub mod listeners;
pub mod registry;
pub mod seeks;
pub mod session;
pub mod table;
pub mod tourney;
mod translator;
pub mod unechoed;

pub use config::ConnectionConfig;
pub use connection::{Connection, GameAction};
pub use dispatch::{Dispatcher, InlineDispatcher, Job, QueueDispatcher};
pub use error::{ConnectionError, ConnectionResult};
pub use events::{
    Annotation, AnnotationEvent, ChessEventUpdate, ConnectionEvent, FriendsEvent, GameEvent,
    MatchOfferEvent, Offer, SeekEvent,
};
pub use game::{GameAttributes, GameKind, GameRecord, GameResult, PlayerInfo, TimeControl};
pub use game_list::{GameList, GameListCategory};
pub use listeners::{AnnotationListener, FamilyEvent, GameListener, Listener};
pub use registry::Family;
pub use seeks::Seek;
pub use session::{spawn_connection, ConnectionHandle};
pub use tourney::ChessEvent;
