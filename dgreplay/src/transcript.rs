//! Reading recorded datagram transcripts.
//!
//! A transcript holds one deframed datagram body per line. Blank lines and
//! lines starting with `#` are skipped.

use std::path::Path;

use anyhow::Context;
use datagram::{parse_datagram, Datagram, DatagramError};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Parse one transcript line, or `None` when the line carries no datagram.
pub fn parse_line(line: &str) -> Option<Result<Datagram, DatagramError>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(parse_datagram(line))
}

/// Stream the transcript at `path` into `tx`, returning how many datagrams
/// were sent. Malformed lines are logged and skipped. Stops early if the
/// receiving side goes away.
pub async fn feed(path: &Path, tx: mpsc::Sender<Datagram>) -> anyhow::Result<usize> {
    let file = File::open(path)
        .await
        .with_context(|| format!("failed to open transcript {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();
    let mut sent = 0;
    let mut number = 0;

    while let Some(line) = lines.next_line().await? {
        number += 1;
        let datagram = match parse_line(&line) {
            None => continue,
            Some(Ok(datagram)) => datagram,
            Some(Err(e)) => {
                tracing::warn!(line = number, "Skipping malformed datagram: {}", e);
                continue;
            }
        };
        if tx.send(datagram).await.is_err() {
            tracing::info!(line = number, "Connection stopped reading");
            break;
        }
        sent += 1;
    }

    tracing::debug!(sent, "Transcript exhausted");
    Ok(sent)
}
