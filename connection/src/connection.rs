//! The session core: owns every server-side table, the listener hub and the
//! outbound line to the transport.
//!
//! Inbound notifications are applied in `translator`; this file holds
//! construction, listener registration and the commands the user can send.

use std::sync::Arc;

use chess::{format_outbound, Side};
use cozy_chess::{Board, Move};
use datagram::{DatagramKind, Outbound};
use tokio::sync::mpsc;

use crate::config::ConnectionConfig;
use crate::dispatch::Dispatcher;
use crate::error::{ConnectionError, ConnectionResult};
use crate::events::{ConnectionEvent, GameEvent};
use crate::game::{GameKind, GameRecord};
use crate::game_list::GameListAccumulator;
use crate::listeners::{FamilyEvent, GameListener, Listener, Listeners};
use crate::registry::{DatagramRegistry, Family};
use crate::seeks::{Seek, SeekTable};
use crate::table::{ClockState, GameTable};
use crate::tourney::{ChessEvent, ChessEventTable};
use crate::unechoed::UnechoedMoves;

/// Something the user asks to do in one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameAction {
    Move(Move),
    Resign,
    OfferDraw,
    OfferAbort,
    OfferAdjourn,
    RequestTakeback(u32),
    Backward(u32),
    Forward(u32),
    RewindToStart,
    /// Stop observing, stop examining, or resign, depending on the game.
    Quit,
}

pub struct Connection {
    config: ConnectionConfig,
    pub(crate) username: Option<String>,
    pub(crate) games: GameTable,
    pub(crate) unechoed: UnechoedMoves,
    pub(crate) seeks: SeekTable,
    pub(crate) chess_events: ChessEventTable,
    pub(crate) game_list: Option<GameListAccumulator>,
    registry: DatagramRegistry,
    pub(crate) listeners: Listeners,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl Connection {
    /// Create the core. Everything it wants sent to the server comes out of
    /// the returned receiver.
    pub fn new(
        config: ConnectionConfig,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let connection = Self {
            username: config.username.clone(),
            config,
            games: GameTable::new(),
            unechoed: UnechoedMoves::new(),
            seeks: SeekTable::new(),
            chess_events: ChessEventTable::new(),
            game_list: None,
            registry: DatagramRegistry::new(),
            listeners: Listeners::new(dispatcher),
            outbound,
        };
        (connection, rx)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    pub fn add_listener<E: FamilyEvent>(&mut self, listener: Arc<dyn Listener<E>>) {
        if self.listeners.add(listener) {
            self.family_opened(E::FAMILY);
        }
    }

    pub fn remove_listener<E: FamilyEvent>(&mut self, listener: &Arc<dyn Listener<E>>) {
        if self.listeners.remove(listener) {
            self.family_closed(E::FAMILY);
        }
    }

    pub fn add_game_listener(&mut self, listener: Arc<dyn GameListener>) {
        if self.listeners.add_game(listener) {
            self.family_opened(Family::Game);
        }
    }

    pub fn remove_game_listener(&mut self, listener: &Arc<dyn GameListener>) {
        if self.listeners.remove_game(listener) {
            self.family_closed(Family::Game);
        }
    }

    pub fn listener_count(&self, family: Family) -> usize {
        self.listeners.count(family)
    }

    pub fn is_enabled(&self, kind: DatagramKind) -> bool {
        self.registry.is_enabled(kind)
    }

    fn family_opened(&mut self, family: Family) {
        tracing::debug!(family = family.name(), "First listener registered");
        for directive in self.registry.subscribe(family) {
            self.send(directive);
        }
        match family {
            Family::Game => self.send(Outbound::command(self.config.style_command.clone())),
            Family::ChessEvent => {
                self.send(Outbound::command(self.config.event_list_command.clone()))
            }
            _ => {}
        }
    }

    fn family_closed(&mut self, family: Family) {
        tracing::debug!(family = family.name(), "Last listener removed");
        for directive in self.registry.unsubscribe(family) {
            self.send(directive);
        }
        match family {
            Family::Game => {
                self.games.clear();
                self.unechoed.clear();
            }
            Family::Seek => self.seeks.clear(),
            Family::ChessEvent => self.chess_events.clear(),
            Family::GameList => self.game_list = None,
            _ => {}
        }
    }

    pub(crate) fn emit(&self, event: ConnectionEvent) {
        self.listeners.deliver(event);
    }

    // ========================================================================
    // State access
    // ========================================================================

    pub fn game(&self, game: u32) -> Option<Arc<GameRecord>> {
        self.games.lookup(game).ok().map(|info| info.record.clone())
    }

    pub fn position(&self, game: u32) -> Option<&Board> {
        self.games.lookup(game).ok().map(|info| info.game.position())
    }

    pub fn games(&self) -> Vec<Arc<GameRecord>> {
        self.games
            .active_games()
            .map(|info| info.record.clone())
            .collect()
    }

    /// The clock of `side` as last reported, not projected.
    pub fn clock(&self, game: u32, side: Side) -> Option<ClockState> {
        self.games.lookup(game).ok().map(|info| *info.clock(side))
    }

    pub fn is_staged(&self, game: u32) -> bool {
        self.games.is_staged(game)
    }

    pub fn unechoed_moves(&self, game: u32) -> usize {
        self.unechoed.pending(game)
    }

    pub fn seek(&self, id: u32) -> Option<Arc<Seek>> {
        self.seeks.get(id).cloned()
    }

    pub fn chess_event(&self, id: u32) -> Option<Arc<ChessEvent>> {
        self.chess_events.get(id).cloned()
    }

    // ========================================================================
    // Outbound commands
    // ========================================================================

    pub fn perform(&mut self, game: u32, action: GameAction) -> ConnectionResult<()> {
        match action {
            GameAction::Move(mv) => self.make_move(game, mv),
            GameAction::Resign => self.game_command(game, "resign".to_string()),
            GameAction::OfferDraw => self.game_command(game, "draw".to_string()),
            GameAction::OfferAbort => self.game_command(game, "abort".to_string()),
            GameAction::OfferAdjourn => self.game_command(game, "adjourn".to_string()),
            GameAction::RequestTakeback(plies) => {
                self.game_command(game, format!("takeback {}", plies))
            }
            GameAction::Backward(plies) => self.game_command(game, format!("backward {}", plies)),
            GameAction::Forward(plies) => self.game_command(game, format!("forward {}", plies)),
            GameAction::RewindToStart => self.game_command(game, "backward 9999".to_string()),
            GameAction::Quit => self.quit_game(game),
        }
    }

    /// Send one of the user's moves. It is tracked until the server echoes or
    /// rejects it.
    pub fn make_move(&mut self, game: u32, mv: Move) -> ConnectionResult<()> {
        let info = self.games.lookup(game)?;
        let text = format_outbound(info.game.position(), mv, info.record.variant());
        self.unechoed.record_sent(game, mv, text.clone());
        tracing::debug!(game, mv = %text, "Sending move");
        self.send(Outbound::Command(text));
        Ok(())
    }

    pub fn resign(&mut self, game: u32) -> ConnectionResult<()> {
        self.perform(game, GameAction::Resign)
    }

    pub fn offer_draw(&mut self, game: u32) -> ConnectionResult<()> {
        self.perform(game, GameAction::OfferDraw)
    }

    pub fn offer_abort(&mut self, game: u32) -> ConnectionResult<()> {
        self.perform(game, GameAction::OfferAbort)
    }

    pub fn offer_adjourn(&mut self, game: u32) -> ConnectionResult<()> {
        self.perform(game, GameAction::OfferAdjourn)
    }

    pub fn request_takeback(&mut self, game: u32, plies: u32) -> ConnectionResult<()> {
        self.perform(game, GameAction::RequestTakeback(plies))
    }

    pub fn go_backward(&mut self, game: u32, plies: u32) -> ConnectionResult<()> {
        self.perform(game, GameAction::Backward(plies))
    }

    pub fn go_forward(&mut self, game: u32, plies: u32) -> ConnectionResult<()> {
        self.perform(game, GameAction::Forward(plies))
    }

    pub fn rewind_to_start(&mut self, game: u32) -> ConnectionResult<()> {
        self.perform(game, GameAction::RewindToStart)
    }

    /// Leave a game the way its kind requires. Isolated boards have no
    /// server-side session and are ended locally.
    pub fn quit_game(&mut self, game: u32) -> ConnectionResult<()> {
        let record = self.games.lookup(game)?.record.clone();
        match record.kind() {
            GameKind::ObservedGame => self.send(Outbound::command(format!("unobserve {}", game))),
            GameKind::MyGame if !record.is_played() => self.send(Outbound::command("unexamine")),
            GameKind::MyGame => self.send(Outbound::command("resign")),
            GameKind::IsolatedBoard => self.end_game(game)?,
        }
        Ok(())
    }

    pub fn send_tell(&mut self, name: &str, text: &str) {
        self.send(Outbound::command(format!("tell {} {}", name, text)));
    }

    pub fn send_channel_tell(&mut self, channel: u32, text: &str) {
        self.send(Outbound::command(format!("tell {} {}", channel, text)));
    }

    pub fn send_shout(&mut self, text: &str) {
        self.send(Outbound::command(format!("shout {}", text)));
    }

    pub fn accept_seek(&mut self, id: u32) -> ConnectionResult<()> {
        self.seeks.get(id).ok_or(ConnectionError::NoSuchSeek(id))?;
        self.send(Outbound::command(format!("play {}", id)));
        Ok(())
    }

    /// Send a raw command line.
    pub fn send_command(&mut self, command: &str) {
        self.send(Outbound::command(command));
    }

    fn game_command(&mut self, game: u32, command: String) -> ConnectionResult<()> {
        self.games.lookup(game)?;
        self.send(Outbound::Command(command));
        Ok(())
    }

    pub(crate) fn send(&self, line: Outbound) {
        if self.outbound.send(line).is_err() {
            tracing::warn!("Transport closed, dropping outbound line");
        }
    }

    /// Remove an active game and announce its end.
    pub(crate) fn end_game(&mut self, game: u32) -> ConnectionResult<()> {
        let info = self.games.remove(game)?;
        self.unechoed.drop_game(game);
        let result = info.record.final_result();
        tracing::info!(game, ?result, "Game ended");
        self.listeners.deliver_game(GameEvent::Ended {
            game: info.record,
            result,
        });
        Ok(())
    }
}
