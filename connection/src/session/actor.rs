use datagram::Datagram;
use tokio::sync::mpsc;
use tracing::Instrument;

use super::commands::ConnectionCommand;
use crate::connection::Connection;
use crate::error::ConnectionResult;
use crate::events::ConnectionEvent;

/// The connection task.
///
/// Sole consumer of the inbound datagram stream and sole writer of every
/// table. Commands from handles are interleaved between datagrams. Returns
/// when the stream ends, on shutdown, or with the error that desynchronized
/// it from the server.
pub async fn run_connection(
    connection: Connection,
    inbound: mpsc::Receiver<Datagram>,
    cmd_rx: mpsc::Receiver<ConnectionCommand>,
) -> ConnectionResult<()> {
    let user = connection.username().unwrap_or("-").to_string();
    run_connection_inner(connection, inbound, cmd_rx)
        .instrument(tracing::info_span!("connection", user = %user))
        .await
}

async fn run_connection_inner(
    mut connection: Connection,
    mut inbound: mpsc::Receiver<Datagram>,
    mut cmd_rx: mpsc::Receiver<ConnectionCommand>,
) -> ConnectionResult<()> {
    tracing::info!("Connection task started");
    connection.emit(ConnectionEvent::Established);
    let mut commands_open = true;

    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv(), if commands_open => {
                match cmd {
                    Some(ConnectionCommand::Shutdown) => {
                        tracing::info!("Connection task shutting down");
                        connection.emit(ConnectionEvent::Lost {
                            reason: Some("shut down".to_string()),
                        });
                        return Ok(());
                    }
                    Some(cmd) => handle_command(&mut connection, cmd),
                    // Handles are gone; keep following the server.
                    None => commands_open = false,
                }
            }

            datagram = inbound.recv() => {
                let Some(datagram) = datagram else {
                    tracing::info!("Inbound stream ended");
                    connection.emit(ConnectionEvent::Lost { reason: None });
                    return Ok(());
                };
                if let Err(e) = connection.handle_datagram(&datagram) {
                    tracing::error!(kind = %datagram.kind, error = %e, "Lost sync with the server");
                    connection.emit(ConnectionEvent::Lost {
                        reason: Some(e.to_string()),
                    });
                    return Err(e);
                }
            }
        }
    }
}

fn handle_command(connection: &mut Connection, cmd: ConnectionCommand) {
    match cmd {
        ConnectionCommand::Game {
            game,
            action,
            reply,
        } => {
            let _ = reply.send(connection.perform(game, action));
        }
        ConnectionCommand::Tell { name, text } => connection.send_tell(&name, &text),
        ConnectionCommand::ChannelTell { channel, text } => {
            connection.send_channel_tell(channel, &text)
        }
        ConnectionCommand::Shout { text } => connection.send_shout(&text),
        ConnectionCommand::AcceptSeek { id, reply } => {
            let _ = reply.send(connection.accept_seek(id));
        }
        ConnectionCommand::Send { command } => connection.send_command(&command),
        ConnectionCommand::Apply(job) => job(connection),
        // Intercepted by the task loop.
        ConnectionCommand::Shutdown => {}
    }
}
