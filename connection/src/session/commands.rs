use tokio::sync::oneshot;

use crate::connection::{Connection, GameAction};
use crate::error::ConnectionResult;

/// Work run against the connection on its own task.
pub type ConnectionJob = Box<dyn FnOnce(&mut Connection) + Send>;

/// Commands sent to the connection task. Each that can fail embeds a
/// oneshot for the reply.
pub enum ConnectionCommand {
    Game {
        game: u32,
        action: GameAction,
        reply: oneshot::Sender<ConnectionResult<()>>,
    },
    Tell {
        name: String,
        text: String,
    },
    ChannelTell {
        channel: u32,
        text: String,
    },
    Shout {
        text: String,
    },
    AcceptSeek {
        id: u32,
        reply: oneshot::Sender<ConnectionResult<()>>,
    },
    Send {
        command: String,
    },
    /// Listener registration and state queries.
    Apply(ConnectionJob),
    Shutdown,
}
