//! Printing what the session core reports.

use std::sync::Arc;

use chess::format_square;
use connection::{
    Annotation, AnnotationEvent, AnnotationListener, ChessEventUpdate, Connection,
    ConnectionEvent, FriendsEvent, GameEvent, GameList, GameListener, Listener, MatchOfferEvent,
    SeekEvent,
};
use datagram::{ChatLine, Outbound};
use serde::Serialize;

/// One printed line of the replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub family: &'static str,
    pub event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<u32>,
    pub detail: String,
}

impl EventRecord {
    fn new(family: &'static str, event: &'static str, detail: impl Into<String>) -> Self {
        Self {
            family,
            event,
            game: None,
            detail: detail.into(),
        }
    }

    fn in_game(mut self, game: u32) -> Self {
        self.game = Some(game);
        self
    }
}

impl From<&GameEvent> for EventRecord {
    fn from(event: &GameEvent) -> Self {
        let record = event.game();
        let detail = match event {
            GameEvent::Started { game, .. } => format!(
                "{} vs {} ({}, {:?})",
                game.white().name,
                game.black().name,
                game.variant(),
                game.kind()
            ),
            GameEvent::MoveMade { entry, is_new, .. } => {
                let shown = entry.algebraic.as_deref().unwrap_or(&entry.smith);
                if *is_new {
                    shown.to_string()
                } else {
                    format!("{} (catch-up)", shown)
                }
            }
            GameEvent::PositionChanged { position, .. } => chess::format_fen(position),
            GameEvent::Takeback { count, .. } => format!("{} plies", count),
            GameEvent::IllegalMove { text, reason, .. } => format!("{} (reason {})", text, reason),
            GameEvent::ClockAdjusted {
                side,
                millis,
                running,
                ..
            } => format!(
                "{:?} {}ms{}",
                side,
                millis,
                if *running { " running" } else { "" }
            ),
            GameEvent::BoardFlipped { flipped, .. } => flipped.to_string(),
            GameEvent::OfferUpdated {
                offer, side, made, ..
            } => format!(
                "{:?} {:?} {}",
                side,
                offer,
                if *made { "made" } else { "withdrawn" }
            ),
            GameEvent::Ended { result, .. } => format!("{:?}", result),
        };
        Self::new("game", event.name(), detail).in_game(record.number())
    }
}

impl From<&AnnotationEvent> for EventRecord {
    fn from(event: &AnnotationEvent) -> Self {
        let (name, squares) = match event.annotation {
            Annotation::Circle(square) => ("circle", format_square(square)),
            Annotation::Arrow(from, to) => {
                ("arrow", format!("{}{}", format_square(from), format_square(to)))
            }
        };
        let verb = if event.added { "added" } else { "removed" };
        Self::new(
            "annotation",
            name,
            format!("{} {} by {}", squares, verb, event.examiner),
        )
        .in_game(event.game.number())
    }
}

impl From<&ConnectionEvent> for EventRecord {
    fn from(event: &ConnectionEvent) -> Self {
        match event {
            ConnectionEvent::Established => Self::new("connection", "established", ""),
            ConnectionEvent::LoginSucceeded { name, titles } => {
                Self::new("connection", "login", format!("{}{}", name, titles))
            }
            ConnectionEvent::LoginFailed { code, reason } => {
                Self::new("connection", "login-failed", format!("{}: {}", code, reason))
            }
            ConnectionEvent::Notice(text) => Self::new("connection", "notice", text.as_str()),
            ConnectionEvent::Lost { reason } => {
                Self::new("connection", "lost", reason.as_deref().unwrap_or(""))
            }
        }
    }
}

impl From<&ChatLine> for EventRecord {
    fn from(line: &ChatLine) -> Self {
        Self::new(
            "chat",
            "line",
            format!("{:?} {}: {}", line.kind, line.sender, line.text),
        )
    }
}

impl From<&SeekEvent> for EventRecord {
    fn from(event: &SeekEvent) -> Self {
        let (name, seek) = match event {
            SeekEvent::Added(seek) => ("added", seek),
            SeekEvent::Removed(seek) => ("removed", seek),
        };
        let rating = seek
            .rating
            .map_or_else(|| "----".to_string(), |r| r.to_string());
        Self::new(
            "seek",
            name,
            format!(
                "#{} {} ({}) {} {}+{}",
                seek.id,
                seek.name,
                rating,
                seek.rating_category,
                seek.time.initial_millis / 60_000,
                seek.time.increment_millis / 1000
            ),
        )
    }
}

impl From<&GameList> for EventRecord {
    fn from(list: &GameList) -> Self {
        Self::new(
            "game-list",
            "list",
            format!(
                "{:?} {}: {} games",
                list.category,
                list.header.params,
                list.items.len()
            ),
        )
    }
}

impl From<&FriendsEvent> for EventRecord {
    fn from(event: &FriendsEvent) -> Self {
        let (name, who) = match event {
            FriendsEvent::Connected(who) => ("connected", who),
            FriendsEvent::Disconnected(who) => ("disconnected", who),
            FriendsEvent::Added(who) => ("added", who),
            FriendsEvent::Removed(who) => ("removed", who),
        };
        Self::new("friends", name, who.as_str())
    }
}

impl From<&ChessEventUpdate> for EventRecord {
    fn from(update: &ChessEventUpdate) -> Self {
        let (name, event) = match update {
            ChessEventUpdate::Added(event) => ("added", event),
            ChessEventUpdate::Removed(event) => ("removed", event),
        };
        Self::new(
            "chess-event",
            name,
            format!("#{} {}", event.id, event.description),
        )
    }
}

impl From<&MatchOfferEvent> for EventRecord {
    fn from(event: &MatchOfferEvent) -> Self {
        match event {
            MatchOfferEvent::Made(offer) => Self::new(
                "match-offer",
                "made",
                format!("{} -> {}", offer.challenger, offer.receiver),
            ),
            MatchOfferEvent::Withdrawn {
                challenger,
                receiver,
                explanation,
            } => Self::new(
                "match-offer",
                "withdrawn",
                format!("{} -> {}: {}", challenger, receiver, explanation),
            ),
        }
    }
}

/// Renders records either as text or as one JSON object per line.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    json: bool,
}

impl Reporter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn render(&self, record: &EventRecord) -> String {
        if self.json {
            match serde_json::to_string(record) {
                Ok(line) => return line,
                Err(e) => tracing::warn!("Failed to serialize event: {}", e),
            }
        }
        let game = record.game.map(|n| format!(" [{}]", n)).unwrap_or_default();
        format!(
            "{:<11} {:<16}{} {}",
            record.family, record.event, game, record.detail
        )
        .trim_end()
        .to_string()
    }

    pub fn print(&self, record: &EventRecord) {
        println!("{}", self.render(record));
    }

    pub fn print_outbound(&self, line: &Outbound) {
        self.print(&EventRecord::new("outbound", "send", line.to_line()));
    }
}

/// Game listener that also wants examiner markup.
struct GameReport {
    reporter: Reporter,
    annotations: bool,
}

impl GameListener for GameReport {
    fn game_event(&self, event: &GameEvent) {
        self.reporter.print(&EventRecord::from(event));
    }

    fn annotations(&self) -> Option<&dyn AnnotationListener> {
        self.annotations.then_some(self as &dyn AnnotationListener)
    }
}

impl AnnotationListener for GameReport {
    fn annotation(&self, event: &AnnotationEvent) {
        self.reporter.print(&EventRecord::from(event));
    }
}

fn printer<E>(reporter: Reporter) -> Arc<dyn Listener<E>>
where
    E: 'static,
    for<'a> EventRecord: From<&'a E>,
{
    Arc::new(move |event: &E| reporter.print(&EventRecord::from(event)))
}

/// Listen to every family, which subscribes the server to all of them.
pub fn register(connection: &mut Connection, reporter: Reporter, annotations: bool) {
    connection.add_listener::<ConnectionEvent>(printer(reporter));
    connection.add_listener::<ChatLine>(printer(reporter));
    connection.add_listener::<SeekEvent>(printer(reporter));
    connection.add_listener::<GameList>(printer(reporter));
    connection.add_listener::<FriendsEvent>(printer(reporter));
    connection.add_listener::<ChessEventUpdate>(printer(reporter));
    connection.add_listener::<MatchOfferEvent>(printer(reporter));
    connection.add_game_listener(Arc::new(GameReport {
        reporter,
        annotations,
    }));
}
