use crate::kind::DatagramKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatagramError {
    #[error("Malformed datagram: {0}")]
    Malformed(String),
    #[error("Unterminated quoted field in: {0}")]
    Unterminated(String),
    #[error("Unknown datagram code: {0}")]
    UnknownCode(u16),
    #[error("{kind}: missing field {index}")]
    MissingField { kind: DatagramKind, index: usize },
    #[error("{kind}: field {index} is not an integer: {value}")]
    BadInteger {
        kind: DatagramKind,
        index: usize,
        value: String,
    },
    #[error("{kind}: field {index} is not a boolean: {value}")]
    BadBoolean {
        kind: DatagramKind,
        index: usize,
        value: String,
    },
    #[error("{kind}: unrecognized code {value}")]
    UnknownSymbol { kind: DatagramKind, value: String },
}
