//! dgreplay - replays a recorded datagram transcript through the session core.
//!
//! Every family is subscribed, so the printout shows both the domain events
//! the core reports and the directives it would have sent to the server.

mod report;
mod transcript;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use connection::{spawn_connection, Connection, ConnectionConfig, QueueDispatcher};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use report::Reporter;

#[derive(Parser)]
#[command(name = "dgreplay", about = "Replay a chess-server datagram transcript")]
struct Cli {
    /// Transcript with one datagram body per line.
    transcript: PathBuf,

    /// Login name to assume. Defaults to `CHESSCLUB_USER`, then to the
    /// transcript's who-am-i datagram.
    #[arg(short, long)]
    user: Option<String>,

    /// Write logs to daily files in this directory instead of stderr.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Print one JSON object per line.
    #[arg(long)]
    json: bool,

    /// Also print examiner circles and arrows.
    #[arg(long)]
    annotations: bool,
}

fn init_tracing(log_dir: Option<&PathBuf>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "dgreplay");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true),
                )
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(dir) = &cli.log_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    }
    let _guard = init_tracing(cli.log_dir.as_ref());

    let mut config = ConnectionConfig::from_env();
    if let Some(user) = cli.user.clone() {
        config.username = Some(user);
    }
    let capacity = config.inbound_capacity;
    tracing::info!(transcript = %cli.transcript.display(), "Starting replay");

    // Listener callbacks run on their own task, off the connection task.
    let (dispatcher, mut jobs) = QueueDispatcher::new();
    let (mut connection, mut outbound) = Connection::new(config, Arc::new(dispatcher));
    let reporter = Reporter::new(cli.json);
    report::register(&mut connection, reporter, cli.annotations);

    let listener_task = tokio::spawn(async move {
        while let Some(job) = jobs.recv().await {
            job();
        }
    });
    let outbound_task = tokio::spawn(async move {
        while let Some(line) = outbound.recv().await {
            reporter.print_outbound(&line);
        }
    });

    let (tx, rx) = mpsc::channel(capacity);
    let (handle, mut task) = spawn_connection(connection, rx);
    let path = cli.transcript.clone();
    let feeder = tokio::spawn(async move { transcript::feed(&path, tx).await });

    let result = tokio::select! {
        joined = &mut task => joined,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            handle.shutdown().await;
            task.await
        }
    }
    .context("connection task panicked")?;

    let sent = feeder.await.context("transcript reader panicked")??;
    listener_task.await.context("listener task panicked")?;
    outbound_task.await.context("outbound task panicked")?;
    tracing::info!(datagrams = sent, "Replay finished");

    result.context("replay lost sync with the server")?;
    Ok(())
}
