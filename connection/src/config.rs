//! Runtime tunables for the connection core.
//!
//! Every value has a compile-time default; the ones an operator is likely to
//! touch can be overridden through a dedicated environment variable.

/// Default capacity of the inbound datagram channel.
const DEFAULT_INBOUND_CAPACITY: usize = 256;

/// Default capacity of the control command channel.
const DEFAULT_COMMAND_CAPACITY: usize = 32;

/// Sent once the first game listener registers, to switch the server to
/// datagram-style board updates.
const DEFAULT_STYLE_COMMAND: &str = "set-quietly style 13";

/// The server does not replay the event list to a client that re-enables the
/// event datagrams, so it is asked for explicitly.
const DEFAULT_EVENT_LIST_COMMAND: &str = "tell 0 events";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Login name, if known up front. Otherwise learned from who-am-i.
    pub username: Option<String>,
    pub inbound_capacity: usize,
    pub command_capacity: usize,
    pub style_command: String,
    pub event_list_command: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            username: None,
            inbound_capacity: DEFAULT_INBOUND_CAPACITY,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            style_command: DEFAULT_STYLE_COMMAND.to_string(),
            event_list_command: DEFAULT_EVENT_LIST_COMMAND.to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Defaults overridden by whatever `CHESSCLUB_*` variables are set.
    pub fn from_env() -> Self {
        Self {
            username: get_username(),
            inbound_capacity: get_inbound_capacity(),
            command_capacity: get_command_capacity(),
            ..Self::default()
        }
    }
}

/// Get the login name.
///
/// Priority:
/// 1. `CHESSCLUB_USER` env variable if set and non-empty
/// 2. none (the server's who-am-i datagram supplies it)
pub fn get_username() -> Option<String> {
    std::env::var("CHESSCLUB_USER")
        .ok()
        .filter(|name| !name.trim().is_empty())
}

/// Get the inbound datagram channel capacity.
///
/// Priority:
/// 1. `CHESSCLUB_INBOUND_CAPACITY` env variable if set (falls back to default
///    if the value cannot be parsed as a positive `usize`)
/// 2. `256` as fallback
pub fn get_inbound_capacity() -> usize {
    parse_capacity(
        std::env::var("CHESSCLUB_INBOUND_CAPACITY").ok(),
        DEFAULT_INBOUND_CAPACITY,
    )
}

/// Get the control command channel capacity.
///
/// Priority:
/// 1. `CHESSCLUB_COMMAND_CAPACITY` env variable if set (same parsing rules)
/// 2. `32` as fallback
pub fn get_command_capacity() -> usize {
    parse_capacity(
        std::env::var("CHESSCLUB_COMMAND_CAPACITY").ok(),
        DEFAULT_COMMAND_CAPACITY,
    )
}

fn parse_capacity(raw: Option<String>, default: usize) -> usize {
    raw.and_then(|v| v.trim().parse().ok())
        .filter(|&n: &usize| n > 0)
        .unwrap_or(default)
}
