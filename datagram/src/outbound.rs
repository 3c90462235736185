use crate::kind::DatagramKind;

/// A line the core hands to the transport for sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A plain command as a user would type it (`resign`, `e2e4`, `tell bob hi`).
    Command(String),
    /// Turn delivery of one datagram type on or off.
    SetDatagram { kind: DatagramKind, enabled: bool },
}

impl Outbound {
    pub fn command(text: impl Into<String>) -> Self {
        Self::Command(text.into())
    }

    pub fn to_line(&self) -> String {
        match self {
            Self::Command(text) => text.clone(),
            Self::SetDatagram { kind, enabled } => {
                format!("set-2 {} {}", kind.code(), u8::from(*enabled))
            }
        }
    }
}
