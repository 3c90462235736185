//! Applies server notifications to the session tables and turns them into
//! domain events.
//!
//! Per game number the state runs unknown → staged → active → unknown. A start
//! notification stages the game's attributes, the position-begin that follows
//! promotes them into an active record, and the end of the game removes it.
//! Notifications for numbers in neither table are dropped: that is the normal
//! fate of games in variants we do not support.

use std::sync::Arc;
use std::time::Instant;

use chess::{parse_fen, parse_square, PlayedMove, Side};
use datagram::{Datagram, GameResultInfo, GameStartInfo, MoveInfo, Notification, Relation};
use datagram::{Offers, StartOrigin};

use crate::connection::Connection;
use crate::error::{ConnectionError, ConnectionResult};
use crate::events::{
    Annotation, AnnotationEvent, ChessEventUpdate, ConnectionEvent, FriendsEvent, GameEvent,
    MatchOfferEvent, Offer, SeekEvent,
};
use crate::game::{GameAttributes, GameKind, GameRecord, GameResult};
use crate::game_list::GameListAccumulator;
use crate::seeks::Seek;
use crate::table::{ClockState, GameInfo, PendingGame};
use crate::tourney::ChessEvent;

const SIDES: [Side; 2] = [Side::White, Side::Black];

impl Connection {
    /// Decode and apply one datagram.
    pub fn handle_datagram(&mut self, datagram: &Datagram) -> ConnectionResult<()> {
        let notification = Notification::decode(datagram)?;
        self.handle(notification)
    }

    pub fn handle(&mut self, notification: Notification) -> ConnectionResult<()> {
        self.handle_at(notification, Instant::now())
    }

    /// Apply a notification as if it arrived at `now`.
    ///
    /// References to games, seeks or events we do not track are dropped
    /// quietly. Any other error means our view of the server can no longer
    /// be trusted.
    pub fn handle_at(&mut self, notification: Notification, now: Instant) -> ConnectionResult<()> {
        let game = notification.game();
        match self.apply(notification, now) {
            Err(e) if e.is_expected_absence() => {
                tracing::debug!(?game, "Dropping notification: {}", e);
                Ok(())
            }
            other => other,
        }
    }

    fn apply(&mut self, notification: Notification, now: Instant) -> ConnectionResult<()> {
        match notification {
            Notification::WhoAmI { name, titles } => {
                tracing::info!(user = %name, "Logged in");
                self.username = Some(name.clone());
                self.emit(ConnectionEvent::LoginSucceeded { name, titles });
            }
            Notification::LoginFailed { code, reason } => {
                tracing::warn!(code, "Login failed: {}", reason);
                self.emit(ConnectionEvent::LoginFailed { code, reason });
            }
            Notification::GameStarted { origin, info } => self.game_started(origin, &info)?,
            Notification::GameChanged(info) => self.game_changed(&info, now)?,
            Notification::PositionBegin {
                game,
                fen,
                moves_to_follow,
            } => self.position_begin(game, &fen, moves_to_follow, now)?,
            Notification::Move(mv) => self.move_made(mv)?,
            Notification::Backward { game, count } => {
                let info = self.games.lookup_mut(game)?;
                info.game
                    .truncate(count as usize)
                    .map_err(|source| ConnectionError::Diverged { game, source })?;
                let event = GameEvent::Takeback {
                    game: info.record.clone(),
                    count,
                    position: info.game.position().clone(),
                };
                self.listeners.deliver_game(event);
            }
            Notification::IllegalMove { game, text, reason } => {
                let record = self.games.lookup(game)?.record.clone();
                if self.unechoed.reject(game, &text) {
                    tracing::info!(game, mv = %text, reason, "Own move rejected");
                    self.listeners.deliver_game(GameEvent::IllegalMove {
                        game: record,
                        text,
                        reason,
                    });
                } else {
                    tracing::debug!(game, mv = %text, "Illegal move not sent by us");
                }
            }
            Notification::Relation { game, relation } => self.relation_changed(game, relation, now)?,
            Notification::GameResult(result) => self.game_result(result, now)?,
            Notification::GameGone { game } => {
                if self.games.take_pending(game).is_some() {
                    tracing::debug!(game, "Staged game gone before its position arrived");
                } else {
                    self.end_game(game)?;
                }
            }
            Notification::Msec {
                game,
                side,
                millis,
                running,
            } => {
                let info = self.games.lookup_mut(game)?;
                *info.clock_mut(side) = ClockState {
                    millis,
                    running,
                    stamp: now,
                };
                let event = clock_event(info, side);
                self.listeners.deliver_game(event);
            }
            Notification::SetClock {
                game,
                white_millis,
                black_millis,
            } => {
                let info = self.games.lookup_mut(game)?;
                for (side, millis) in [(Side::White, white_millis), (Side::Black, black_millis)] {
                    let clock = info.clock_mut(side);
                    clock.millis = millis;
                    clock.stamp = now;
                }
                let info: &GameInfo = info;
                let events = SIDES.map(|side| clock_event(info, side));
                for event in events {
                    self.listeners.deliver_game(event);
                }
            }
            Notification::MoreTime {
                game,
                side,
                seconds,
            } => {
                let info = self.games.lookup_mut(game)?;
                let clock = info.clock_mut(side);
                clock.millis = clock.projected(now) + seconds * 1000;
                clock.stamp = now;
                let event = clock_event(info, side);
                self.listeners.deliver_game(event);
            }
            Notification::Flip { game, flipped } => {
                if let Some(pending) = self.games.pending_mut(game) {
                    pending.flipped = Some(flipped);
                    return Ok(());
                }
                let info = self.games.lookup_mut(game)?;
                info.flipped = flipped;
                let event = GameEvent::BoardFlipped {
                    game: info.record.clone(),
                    flipped,
                };
                self.listeners.deliver_game(event);
            }
            Notification::Offers { game, offers } => {
                let info = self.games.lookup_mut(game)?;
                let previous = std::mem::replace(&mut info.offers, offers);
                let record = info.record.clone();
                for (offer, side, made) in offer_changes(&previous, &offers) {
                    self.listeners.deliver_game(GameEvent::OfferUpdated {
                        game: record.clone(),
                        offer,
                        side,
                        made,
                    });
                }
            }
            Notification::Circle {
                game,
                examiner,
                square,
                added,
            } => {
                let record = self.games.lookup(game)?.record.clone();
                let square = parse_square(&square)
                    .map_err(|source| ConnectionError::BadSquare { game, source })?;
                self.listeners.deliver_annotation(AnnotationEvent {
                    game: record,
                    examiner,
                    annotation: Annotation::Circle(square),
                    added,
                });
            }
            Notification::Arrow {
                game,
                examiner,
                from,
                to,
                added,
            } => {
                let record = self.games.lookup(game)?.record.clone();
                let parse = |s: &str| {
                    parse_square(s).map_err(|source| ConnectionError::BadSquare { game, source })
                };
                let annotation = Annotation::Arrow(parse(&from)?, parse(&to)?);
                self.listeners.deliver_annotation(AnnotationEvent {
                    game: record,
                    examiner,
                    annotation,
                    added,
                });
            }
            Notification::Chat(line) => self.listeners.deliver(line),
            Notification::Seek(info) => {
                let seek = Arc::new(Seek::from(info));
                if let Some(old) = self.seeks.add(seek.clone()) {
                    self.listeners.deliver(SeekEvent::Removed(old));
                }
                self.listeners.deliver(SeekEvent::Added(seek));
            }
            Notification::SeekRemoved { index, reason } => {
                let seek = self.seeks.remove(index)?;
                tracing::trace!(seek = index, reason, "Seek removed");
                self.listeners.deliver(SeekEvent::Removed(seek));
            }
            Notification::GameListBegin(header) => {
                if self.game_list.as_ref().is_some_and(|acc| !acc.is_complete()) {
                    tracing::warn!("Game list started before the previous one completed");
                }
                let (acc, done) = GameListAccumulator::begin(header)?;
                match done {
                    Some(list) => {
                        self.game_list = None;
                        self.listeners.deliver(list);
                    }
                    None => self.game_list = Some(acc),
                }
            }
            Notification::GameListItem(item) => {
                let acc = self
                    .game_list
                    .as_mut()
                    .filter(|acc| !acc.is_complete())
                    .ok_or(ConnectionError::OrphanGameListItem)?;
                if let Some(list) = acc.push(item) {
                    self.game_list = None;
                    self.listeners.deliver(list);
                }
            }
            Notification::Tourney(info) => {
                let event = Arc::new(ChessEvent::from(info));
                if let Some(old) = self.chess_events.add(event.clone()) {
                    self.listeners.deliver(ChessEventUpdate::Removed(old));
                }
                self.listeners.deliver(ChessEventUpdate::Added(event));
            }
            Notification::TourneyRemoved { id } => {
                let event = self.chess_events.remove(id)?;
                self.listeners.deliver(ChessEventUpdate::Removed(event));
            }
            Notification::FriendArrived { name } => {
                self.listeners.deliver(FriendsEvent::Connected(name))
            }
            Notification::FriendLeft { name } => {
                self.listeners.deliver(FriendsEvent::Disconnected(name))
            }
            Notification::NotifyList { name, added } => {
                let event = if added {
                    FriendsEvent::Added(name)
                } else {
                    FriendsEvent::Removed(name)
                };
                self.listeners.deliver(event);
            }
            Notification::Match(info) => {
                self.listeners.deliver(MatchOfferEvent::Made(Arc::new(info)))
            }
            Notification::MatchRemoved {
                challenger,
                receiver,
                explanation,
            } => self.listeners.deliver(MatchOfferEvent::Withdrawn {
                challenger,
                receiver,
                explanation,
            }),
            Notification::Ignored(kind) => tracing::trace!(%kind, "Modifier datagram"),
        }
        Ok(())
    }

    // ========================================================================
    // Game lifecycle
    // ========================================================================

    fn game_started(&mut self, origin: StartOrigin, info: &GameStartInfo) -> ConnectionResult<()> {
        let kind = match origin {
            StartOrigin::MyGame => GameKind::MyGame,
            StartOrigin::Observing => GameKind::ObservedGame,
            StartOrigin::IsolatedBoard => GameKind::IsolatedBoard,
        };
        let Some(attributes) = GameAttributes::from_start(info, kind, self.username.as_deref())
        else {
            tracing::info!(game = info.game, wild = info.wild, "Unsupported variant");
            self.emit(ConnectionEvent::Notice(format!(
                "Game {} is played under rules (wild {}) this client does not support. \
                 Please abort or unobserve it.",
                info.game, info.wild
            )));
            return Ok(());
        };
        tracing::debug!(game = info.game, ?kind, "Game staged");
        self.games.stage(info.game, attributes)
    }

    fn position_begin(
        &mut self,
        game: u32,
        fen: &str,
        moves_to_follow: u32,
        now: Instant,
    ) -> ConnectionResult<()> {
        if let Some(pending) = self.games.take_pending(game) {
            return self.promote(game, pending, fen, moves_to_follow, now);
        }

        let info = self.games.lookup_mut(game)?;
        let start = parse_fen(fen, info.record.variant())
            .map_err(|source| ConnectionError::BadPosition { game, source })?;
        info.record.set_initial_position(start.clone());
        info.game.reset(start);
        info.moves_expected = moves_to_follow;
        let event = GameEvent::PositionChanged {
            game: info.record.clone(),
            position: info.game.position().clone(),
        };
        self.listeners.deliver_game(event);
        Ok(())
    }

    /// Turn a staged game into an active one.
    fn promote(
        &mut self,
        game: u32,
        pending: PendingGame,
        fen: &str,
        moves_to_follow: u32,
        now: Instant,
    ) -> ConnectionResult<()> {
        let attributes = pending.attributes;
        let start = parse_fen(fen, attributes.variant)
            .map_err(|source| ConnectionError::BadPosition { game, source })?;
        if self.games.is_active(game) {
            tracing::warn!(game, "Game number reused while still active");
            self.end_game(game)?;
        }

        let kind = attributes.kind;
        let variant = attributes.variant;
        let flipped = pending.flipped.unwrap_or(false);
        let clocks = SIDES.map(|side| ClockState::new(attributes.time(side).initial_millis, now));
        let record = GameRecord::new(game, attributes, start.clone(), flipped);

        self.games.insert(GameInfo {
            record: record.clone(),
            game: chess::Game::new(variant, start.clone()),
            moves_expected: moves_to_follow,
            clocks,
            flipped,
            offers: Offers::default(),
        });
        tracing::info!(game, ?kind, %variant, moves_to_follow, "Game started");
        self.listeners.deliver_game(GameEvent::Started {
            game: record,
            position: start,
        });

        if moves_to_follow == 0 && kind == GameKind::IsolatedBoard {
            self.end_game(game)?;
        }
        Ok(())
    }

    fn move_made(&mut self, mv: MoveInfo) -> ConnectionResult<()> {
        let game = mv.game;
        let info = self.games.lookup_mut(game)?;
        let entry = info
            .game
            .play(&mv.smith, mv.algebraic)
            .map_err(|source| ConnectionError::Diverged { game, source })?;

        let is_new = info.moves_expected == 0;
        if !is_new {
            info.moves_expected -= 1;
        }
        let caught_up = !is_new && info.moves_expected == 0;
        let record = info.record.clone();
        let position = info.game.position().clone();
        tracing::debug!(game, smith = %mv.smith, is_new, variation = ?mv.variation, "Move");

        if let PlayedMove::Move(played) = entry.played {
            if self.unechoed.confirm(game, &played) {
                tracing::debug!(game, "Own move echoed");
            }
        }

        self.listeners.deliver_game(GameEvent::MoveMade {
            game: record.clone(),
            entry,
            position,
            is_new,
            variation: mv.variation,
        });

        if caught_up && record.kind() == GameKind::IsolatedBoard {
            self.end_game(game)?;
        }
        Ok(())
    }

    fn game_changed(&mut self, info: &GameStartInfo, now: Instant) -> ConnectionResult<()> {
        let game = info.game;
        let username = self.username.clone();

        if let Some(pending) = self.games.pending_mut(game) {
            if let Some(next) = changed_attributes(&pending.attributes, info, username.as_deref()) {
                pending.attributes = next;
            }
            return Ok(());
        }

        let current = self.games.lookup(game)?.record.attributes().clone();
        match changed_attributes(&current, info, username.as_deref()) {
            Some(next) if next != current => self.replace(game, next, now),
            Some(_) => Ok(()),
            None => {
                self.emit(ConnectionEvent::Notice(format!(
                    "Game {} changed to rules (wild {}) this client does not support.",
                    game, info.wild
                )));
                self.end_game(game)
            }
        }
    }

    fn relation_changed(
        &mut self,
        game: u32,
        relation: Relation,
        now: Instant,
    ) -> ConnectionResult<()> {
        if relation == Relation::Nothing {
            if self.games.take_pending(game).is_some() {
                tracing::debug!(game, "Staged game dropped");
                return Ok(());
            }
            return self.end_game(game);
        }

        if let Some(pending) = self.games.pending_mut(game) {
            pending.attributes = related(&pending.attributes, relation, self.username.as_deref());
            return Ok(());
        }

        let current = self.games.lookup(game)?.record.attributes().clone();
        let next = related(&current, relation, self.username.as_deref());
        if next != current {
            self.replace(game, next, now)?;
        }
        Ok(())
    }

    fn game_result(&mut self, result: GameResultInfo, now: Instant) -> ConnectionResult<()> {
        let game = result.game;
        let record = self.games.lookup(game)?.record.clone();
        let outcome = GameResult::from_score(&result.score);
        record.set_result(outcome)?;
        tracing::info!(
            game,
            ?outcome,
            code = %result.code,
            "Result: {}",
            result.description
        );

        if result.becomes_examined {
            let mut next = record.attributes().clone();
            next.played = false;
            self.replace(game, next, now)?;
        }
        Ok(())
    }

    /// Retire the record of an active game and announce a new one with
    /// `attributes` in its place, carrying the move line, clocks and flip.
    /// Every carried move is re-announced so the new record's observers see
    /// the same history.
    fn replace(
        &mut self,
        game: u32,
        attributes: GameAttributes,
        now: Instant,
    ) -> ConnectionResult<()> {
        let old = self.games.remove(game)?;
        let result = old.record.final_result();
        tracing::info!(game, "Replacing game record");
        self.listeners.deliver_game(GameEvent::Ended {
            game: old.record.clone(),
            result,
        });

        let line = if attributes.variant == old.game.variant() {
            old.game
        } else {
            old.game
                .replayed_as(attributes.variant)
                .map_err(|source| ConnectionError::Diverged { game, source })?
        };
        let record = GameRecord::new(game, attributes, line.start().clone(), old.flipped);
        let known = old.record.result();
        if known != GameResult::InProgress {
            record.set_result(known)?;
        }

        let clocks = old.clocks.map(|clock| clock.carried(now));
        let replay = line
            .positions_after_moves()
            .map_err(|source| ConnectionError::Diverged { game, source })?;
        let start = line.start().clone();
        self.games.insert(GameInfo {
            record: record.clone(),
            game: line,
            moves_expected: old.moves_expected,
            clocks,
            flipped: old.flipped,
            offers: old.offers,
        });

        self.listeners.deliver_game(GameEvent::Started {
            game: record.clone(),
            position: start,
        });
        for (entry, position) in replay {
            self.listeners.deliver_game(GameEvent::MoveMade {
                game: record.clone(),
                entry,
                position,
                is_new: false,
                variation: None,
            });
        }
        for side in SIDES {
            let clock = clocks[side.index()];
            self.listeners.deliver_game(GameEvent::ClockAdjusted {
                game: record.clone(),
                side,
                millis: clock.millis,
                running: clock.running,
            });
        }
        if old.flipped {
            self.listeners.deliver_game(GameEvent::BoardFlipped {
                game: record,
                flipped: true,
            });
        }
        Ok(())
    }
}

fn clock_event(info: &GameInfo, side: Side) -> GameEvent {
    let clock = info.clock(side);
    GameEvent::ClockAdjusted {
        game: info.record.clone(),
        side,
        millis: clock.millis,
        running: clock.running,
    }
}

/// New attributes from a game-change notification, keeping what the
/// notification does not say (kind, the user's color when the server did not
/// name the user). `None` when the new ruleset is unsupported.
fn changed_attributes(
    current: &GameAttributes,
    info: &GameStartInfo,
    username: Option<&str>,
) -> Option<GameAttributes> {
    let mut next = GameAttributes::from_start(info, current.kind, username)?;
    if next.user_side.is_none() && next.played && next.kind == GameKind::MyGame {
        next.user_side = current.user_side;
    }
    Some(next)
}

/// Attributes after the user's relation to the game changed.
fn related(
    current: &GameAttributes,
    relation: Relation,
    username: Option<&str>,
) -> GameAttributes {
    let mut next = current.clone();
    match relation {
        Relation::PlayingWhite | Relation::PlayingBlack => {
            next.kind = GameKind::MyGame;
            next.played = true;
            next.user_side = Some(if relation == Relation::PlayingWhite {
                Side::White
            } else {
                Side::Black
            });
        }
        Relation::Examining => {
            next.kind = GameKind::MyGame;
            next.played = false;
            next.user_side = None;
        }
        Relation::PlayingSimul => {
            next.kind = GameKind::MyGame;
            next.played = true;
            if let Some(side) = username.and_then(|name| current.side_named(name)) {
                next.user_side = Some(side);
            }
        }
        Relation::Observing | Relation::ObservingSimul => {
            if next.kind != GameKind::IsolatedBoard {
                next.kind = GameKind::ObservedGame;
            }
            next.user_side = None;
        }
        Relation::Nothing => {}
    }
    next
}

/// Offers that appeared or disappeared between two reports.
fn offer_changes(previous: &Offers, current: &Offers) -> Vec<(Offer, Side, bool)> {
    let mut changes = Vec::new();
    for side in SIDES {
        let i = side.index();
        let flags = [
            (Offer::Draw, previous.draw[i], current.draw[i]),
            (Offer::Adjourn, previous.adjourn[i], current.adjourn[i]),
            (Offer::Abort, previous.abort[i], current.abort[i]),
        ];
        for (offer, before, now) in flags {
            if before != now {
                changes.push((offer, side, now));
            }
        }

        let (before, now) = (previous.takeback[i], current.takeback[i]);
        if before != now {
            if before > 0 {
                changes.push((Offer::Takeback(before), side, false));
            }
            if now > 0 {
                changes.push((Offer::Takeback(now), side, true));
            }
        }
    }
    changes
}
