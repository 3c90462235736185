//! Level-2 datagram field codec.
//!
//! A datagram body is its type number followed by space-separated fields.
//! Fields containing spaces are quoted either with braces (`{Hello there}`) or,
//! when the text may itself contain braces, with `^Y{` ... `^Y}`. The transport
//! strips the outer `^Y(` ... `^Y)` frame; it is tolerated here as well.

use crate::kind::DatagramKind;
use crate::DatagramError;

const CTRL_Y: char = '\u{19}';

/// One decoded datagram: its type and raw positional fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub kind: DatagramKind,
    pub fields: Vec<String>,
}

/// Parse a datagram body line.
pub fn parse_datagram(line: &str) -> Result<Datagram, DatagramError> {
    let body = strip_frame(line.trim());
    let mut tokens = tokenize(body)?.into_iter();

    let code_token = tokens
        .next()
        .ok_or_else(|| DatagramError::Malformed(line.to_string()))?;
    let code: u16 = code_token
        .parse()
        .map_err(|_| DatagramError::Malformed(line.to_string()))?;
    let kind = DatagramKind::from_code(code).ok_or(DatagramError::UnknownCode(code))?;

    Ok(Datagram {
        kind,
        fields: tokens.collect(),
    })
}

fn strip_frame(body: &str) -> &str {
    let body = body
        .strip_prefix(CTRL_Y)
        .and_then(|b| b.strip_prefix('('))
        .unwrap_or(body);
    body.strip_suffix(')')
        .and_then(|b| b.strip_suffix(CTRL_Y))
        .unwrap_or(body)
}

fn tokenize(body: &str) -> Result<Vec<String>, DatagramError> {
    let mut tokens = Vec::new();
    let mut chars = body.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '{' => {
                chars.next();
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => field.push(ch),
                        None => return Err(DatagramError::Unterminated(body.to_string())),
                    }
                }
                tokens.push(field);
            }
            CTRL_Y => {
                chars.next();
                if chars.next() != Some('{') {
                    return Err(DatagramError::Malformed(body.to_string()));
                }
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some(CTRL_Y) if chars.peek() == Some(&'}') => {
                            chars.next();
                            break;
                        }
                        Some(ch) => field.push(ch),
                        None => return Err(DatagramError::Unterminated(body.to_string())),
                    }
                }
                tokens.push(field);
            }
            _ => {
                let mut field = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch == ' ' || ch == '\t' {
                        break;
                    }
                    field.push(ch);
                    chars.next();
                }
                tokens.push(field);
            }
        }
    }

    Ok(tokens)
}

impl Datagram {
    pub fn new(kind: DatagramKind, fields: &[&str]) -> Self {
        Self {
            kind,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn string(&self, index: usize) -> Result<&str, DatagramError> {
        self.fields
            .get(index)
            .map(String::as_str)
            .ok_or(DatagramError::MissingField {
                kind: self.kind,
                index,
            })
    }

    pub fn int(&self, index: usize) -> Result<i64, DatagramError> {
        let raw = self.string(index)?;
        raw.parse().map_err(|_| DatagramError::BadInteger {
            kind: self.kind,
            index,
            value: raw.to_string(),
        })
    }

    pub fn uint(&self, index: usize) -> Result<u32, DatagramError> {
        let raw = self.string(index)?;
        raw.parse().map_err(|_| DatagramError::BadInteger {
            kind: self.kind,
            index,
            value: raw.to_string(),
        })
    }

    pub fn boolean(&self, index: usize) -> Result<bool, DatagramError> {
        match self.string(index)? {
            "1" => Ok(true),
            "0" => Ok(false),
            other => Err(DatagramError::BadBoolean {
                kind: self.kind,
                index,
                value: other.to_string(),
            }),
        }
    }

    /// A trailing field that only appears when a modifier datagram is enabled.
    pub fn opt_int(&self, index: usize) -> Result<Option<i64>, DatagramError> {
        if index >= self.fields.len() {
            return Ok(None);
        }
        self.int(index).map(Some)
    }

    pub fn opt_string(&self, index: usize) -> Option<&str> {
        self.fields
            .get(index)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_fields() {
        let dg = parse_datagram("24 12 e4 e2e4 3 297").unwrap();
        assert_eq!(dg.kind, DatagramKind::SendMoves);
        assert_eq!(dg.uint(0).unwrap(), 12);
        assert_eq!(dg.string(2).unwrap(), "e2e4");
        assert_eq!(dg.opt_int(5).unwrap(), None);
    }

    #[test]
    fn test_parse_braced_and_ctrl_y_fields() {
        let line = "\u{19}(31 Alice {C} \u{19}{hi {there}\u{19}} 1\u{19})";
        let dg = parse_datagram(line).unwrap();
        assert_eq!(dg.kind, DatagramKind::PersonalTell);
        assert_eq!(dg.fields, vec!["Alice", "C", "hi {there}", "1"]);
    }

    #[test]
    fn test_empty_braces_are_an_empty_field() {
        let dg = parse_datagram("101 7 {} 0").unwrap();
        assert_eq!(dg.string(1).unwrap(), "");
        assert_eq!(dg.opt_string(1), None);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse_datagram("9999 1 2"),
            Err(DatagramError::UnknownCode(9999))
        ));
        assert!(matches!(
            parse_datagram("31 Bob {unterminated"),
            Err(DatagramError::Unterminated(_))
        ));
        assert!(matches!(parse_datagram(""), Err(DatagramError::Malformed(_))));

        let dg = parse_datagram("39 5 maybe").unwrap();
        assert!(matches!(dg.boolean(1), Err(DatagramError::BadBoolean { .. })));
        assert!(matches!(dg.int(7), Err(DatagramError::MissingField { index: 7, .. })));
    }
}
