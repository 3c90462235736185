use std::sync::Arc;

use cozy_chess::Move;
use tokio::sync::{mpsc, oneshot};

use super::commands::ConnectionCommand;
use crate::connection::{Connection, GameAction};
use crate::error::{ConnectionError, ConnectionResult};
use crate::game::GameRecord;
use crate::listeners::{FamilyEvent, GameListener, Listener};

/// Cheap, cloneable handle to a running connection task.
#[derive(Clone)]
pub struct ConnectionHandle {
    cmd_tx: mpsc::Sender<ConnectionCommand>,
}

impl ConnectionHandle {
    pub(crate) fn new(cmd_tx: mpsc::Sender<ConnectionCommand>) -> Self {
        Self { cmd_tx }
    }

    pub async fn make_move(&self, game: u32, mv: Move) -> ConnectionResult<()> {
        self.game_action(game, GameAction::Move(mv)).await
    }

    pub async fn resign(&self, game: u32) -> ConnectionResult<()> {
        self.game_action(game, GameAction::Resign).await
    }

    pub async fn offer_draw(&self, game: u32) -> ConnectionResult<()> {
        self.game_action(game, GameAction::OfferDraw).await
    }

    pub async fn offer_abort(&self, game: u32) -> ConnectionResult<()> {
        self.game_action(game, GameAction::OfferAbort).await
    }

    pub async fn offer_adjourn(&self, game: u32) -> ConnectionResult<()> {
        self.game_action(game, GameAction::OfferAdjourn).await
    }

    pub async fn request_takeback(&self, game: u32, plies: u32) -> ConnectionResult<()> {
        self.game_action(game, GameAction::RequestTakeback(plies))
            .await
    }

    pub async fn go_backward(&self, game: u32, plies: u32) -> ConnectionResult<()> {
        self.game_action(game, GameAction::Backward(plies)).await
    }

    pub async fn go_forward(&self, game: u32, plies: u32) -> ConnectionResult<()> {
        self.game_action(game, GameAction::Forward(plies)).await
    }

    pub async fn quit_game(&self, game: u32) -> ConnectionResult<()> {
        self.game_action(game, GameAction::Quit).await
    }

    pub async fn game_action(&self, game: u32, action: GameAction) -> ConnectionResult<()> {
        let (tx, rx) = oneshot::channel();
        self.send(ConnectionCommand::Game {
            game,
            action,
            reply: tx,
        })
        .await?;
        rx.await.map_err(|_| ConnectionError::Closed)?
    }

    pub async fn send_tell(&self, name: &str, text: &str) -> ConnectionResult<()> {
        self.send(ConnectionCommand::Tell {
            name: name.to_string(),
            text: text.to_string(),
        })
        .await
    }

    pub async fn send_channel_tell(&self, channel: u32, text: &str) -> ConnectionResult<()> {
        self.send(ConnectionCommand::ChannelTell {
            channel,
            text: text.to_string(),
        })
        .await
    }

    pub async fn send_shout(&self, text: &str) -> ConnectionResult<()> {
        self.send(ConnectionCommand::Shout {
            text: text.to_string(),
        })
        .await
    }

    pub async fn accept_seek(&self, id: u32) -> ConnectionResult<()> {
        let (tx, rx) = oneshot::channel();
        self.send(ConnectionCommand::AcceptSeek { id, reply: tx })
            .await?;
        rx.await.map_err(|_| ConnectionError::Closed)?
    }

    pub async fn send_command(&self, command: &str) -> ConnectionResult<()> {
        self.send(ConnectionCommand::Send {
            command: command.to_string(),
        })
        .await
    }

    pub async fn add_listener<E: FamilyEvent>(
        &self,
        listener: Arc<dyn Listener<E>>,
    ) -> ConnectionResult<()> {
        self.call(move |conn| conn.add_listener(listener)).await
    }

    pub async fn remove_listener<E: FamilyEvent>(
        &self,
        listener: Arc<dyn Listener<E>>,
    ) -> ConnectionResult<()> {
        self.call(move |conn| conn.remove_listener(&listener)).await
    }

    pub async fn add_game_listener(&self, listener: Arc<dyn GameListener>) -> ConnectionResult<()> {
        self.call(move |conn| conn.add_game_listener(listener)).await
    }

    pub async fn remove_game_listener(
        &self,
        listener: Arc<dyn GameListener>,
    ) -> ConnectionResult<()> {
        self.call(move |conn| conn.remove_game_listener(&listener))
            .await
    }

    pub async fn game(&self, game: u32) -> ConnectionResult<Option<Arc<GameRecord>>> {
        self.call(move |conn| conn.game(game)).await
    }

    pub async fn games(&self) -> ConnectionResult<Vec<Arc<GameRecord>>> {
        self.call(|conn| conn.games()).await
    }

    /// Run `f` on the connection task and return its result.
    pub async fn call<R, F>(&self, f: F) -> ConnectionResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut Connection) -> R + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.send(ConnectionCommand::Apply(Box::new(move |conn| {
            let _ = tx.send(f(conn));
        })))
        .await?;
        rx.await.map_err(|_| ConnectionError::Closed)
    }

    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(ConnectionCommand::Shutdown).await;
    }

    async fn send(&self, cmd: ConnectionCommand) -> ConnectionResult<()> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| ConnectionError::Closed)
    }
}
