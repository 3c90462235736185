pub mod actor;
pub mod commands;
pub mod handle;

use datagram::Datagram;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::connection::Connection;
use crate::error::ConnectionResult;
pub use actor::run_connection;
pub use commands::{ConnectionCommand, ConnectionJob};
pub use handle::ConnectionHandle;

/// Spawn the connection task over an inbound datagram stream.
pub fn spawn_connection(
    connection: Connection,
    inbound: mpsc::Receiver<Datagram>,
) -> (ConnectionHandle, JoinHandle<ConnectionResult<()>>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(connection.config().command_capacity);
    let task = tokio::spawn(run_connection(connection, inbound, cmd_rx));
    (ConnectionHandle::new(cmd_tx), task)
}
