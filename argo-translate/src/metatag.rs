//! Codec for serialized metatag values.
//!
//! Metatag fields store their tag map as a single string in PHP
//! `serialize()` format, e.g. `a:1:{s:5:"title";s:5:"Hello";}`. String
//! lengths count bytes, not characters. Arrays decode to JSON objects.

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetatagError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("expected {expected} at byte {pos}")]
    Unexpected { pos: usize, expected: &'static str },

    #[error("invalid UTF-8 in string at byte {0}")]
    InvalidUtf8(usize),

    #[error("unsupported number at byte {0}")]
    InvalidNumber(usize),

    #[error("top-level value is not a tag map")]
    NotAMap,

    #[error("trailing data at byte {0}")]
    TrailingData(usize),
}

/// Decodes a serialized tag map.
pub fn decode(input: &str) -> Result<Map<String, Value>, MetatagError> {
    let mut parser = Parser {
        bytes: input.as_bytes(),
        pos: 0,
    };
    let value = parser.value()?;
    if parser.pos != parser.bytes.len() {
        return Err(MetatagError::TrailingData(parser.pos));
    }
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(MetatagError::NotAMap),
    }
}

/// Serializes a tag map.
pub fn encode(tags: &Map<String, Value>) -> String {
    let mut out = String::new();
    encode_map(tags.iter().map(|(k, v)| (k.as_str(), v)), tags.len(), &mut out);
    out
}

fn encode_map<'a>(entries: impl Iterator<Item = (&'a str, &'a Value)>, len: usize, out: &mut String) {
    out.push_str(&format!("a:{len}:{{"));
    for (key, value) in entries {
        encode_key(key, out);
        encode_value(value, out);
    }
    out.push('}');
}

fn encode_key(key: &str, out: &mut String) {
    match key.parse::<i64>() {
        Ok(n) if n.to_string() == key => out.push_str(&format!("i:{n};")),
        _ => encode_str(key, out),
    }
}

fn encode_str(s: &str, out: &mut String) {
    out.push_str(&format!("s:{}:\"{}\";", s.len(), s));
}

fn encode_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("N;"),
        Value::Bool(b) => out.push_str(if *b { "b:1;" } else { "b:0;" }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => out.push_str(&format!("i:{i};")),
            None => out.push_str(&format!("d:{};", n.as_f64().unwrap_or_default())),
        },
        Value::String(s) => encode_str(s, out),
        Value::Array(items) => {
            let keys: Vec<String> = (0..items.len()).map(|i| i.to_string()).collect();
            encode_map(keys.iter().map(String::as_str).zip(items.iter()), items.len(), out);
        }
        Value::Object(map) => encode_map(map.iter().map(|(k, v)| (k.as_str(), v)), map.len(), out),
    }
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Result<u8, MetatagError> {
        self.bytes.get(self.pos).copied().ok_or(MetatagError::UnexpectedEnd)
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> Result<(), MetatagError> {
        if self.peek()? != byte {
            return Err(MetatagError::Unexpected { pos: self.pos, expected });
        }
        self.pos += 1;
        Ok(())
    }

    /// Reads up to (not including) `terminator` and consumes the terminator.
    fn until(&mut self, terminator: u8) -> Result<&str, MetatagError> {
        let start = self.pos;
        let len = self.bytes[start..]
            .iter()
            .position(|b| *b == terminator)
            .ok_or(MetatagError::UnexpectedEnd)?;
        self.pos = start + len + 1;
        std::str::from_utf8(&self.bytes[start..start + len]).map_err(|_| MetatagError::InvalidUtf8(start))
    }

    fn value(&mut self) -> Result<Value, MetatagError> {
        let tag = self.peek()?;
        self.pos += 1;
        match tag {
            b'N' => {
                self.expect(b';', "';'")?;
                Ok(Value::Null)
            }
            b'b' => {
                self.expect(b':', "':'")?;
                let at = self.pos;
                match self.until(b';')? {
                    "0" => Ok(Value::Bool(false)),
                    "1" => Ok(Value::Bool(true)),
                    _ => Err(MetatagError::Unexpected { pos: at, expected: "0 or 1" }),
                }
            }
            b'i' => {
                self.expect(b':', "':'")?;
                let at = self.pos;
                let n: i64 = self.until(b';')?.parse().map_err(|_| MetatagError::InvalidNumber(at))?;
                Ok(Value::Number(n.into()))
            }
            b'd' => {
                self.expect(b':', "':'")?;
                let at = self.pos;
                let f: f64 = self.until(b';')?.parse().map_err(|_| MetatagError::InvalidNumber(at))?;
                Number::from_f64(f).map(Value::Number).ok_or(MetatagError::InvalidNumber(at))
            }
            b's' => self.string().map(Value::String),
            b'a' => self.array(),
            _ => Err(MetatagError::Unexpected {
                pos: self.pos - 1,
                expected: "a value type (N, b, i, d, s, a)",
            }),
        }
    }

    /// Parses the remainder of `s:<len>:"<bytes>";` after the `s`.
    fn string(&mut self) -> Result<String, MetatagError> {
        self.expect(b':', "':'")?;
        let at = self.pos;
        let len: usize = self.until(b':')?.parse().map_err(|_| MetatagError::InvalidNumber(at))?;
        self.expect(b'"', "'\"'")?;
        let start = self.pos;
        let end = start.checked_add(len).ok_or(MetatagError::InvalidNumber(at))?;
        let raw = self.bytes.get(start..end).ok_or(MetatagError::UnexpectedEnd)?;
        let s = std::str::from_utf8(raw).map_err(|_| MetatagError::InvalidUtf8(start))?;
        self.pos = end;
        self.expect(b'"', "'\"'")?;
        self.expect(b';', "';'")?;
        Ok(s.to_string())
    }

    fn array(&mut self) -> Result<Value, MetatagError> {
        self.expect(b':', "':'")?;
        let at = self.pos;
        let count: usize = self.until(b':')?.parse().map_err(|_| MetatagError::InvalidNumber(at))?;
        self.expect(b'{', "'{'")?;
        let mut map = Map::new();
        for _ in 0..count {
            let key = match self.peek()? {
                b'i' => {
                    self.pos += 1;
                    self.expect(b':', "':'")?;
                    let key_at = self.pos;
                    let n: i64 = self.until(b';')?.parse().map_err(|_| MetatagError::InvalidNumber(key_at))?;
                    n.to_string()
                }
                b's' => {
                    self.pos += 1;
                    self.string()?
                }
                _ => {
                    return Err(MetatagError::Unexpected {
                        pos: self.pos,
                        expected: "an integer or string key",
                    });
                }
            };
            let value = self.value()?;
            map.insert(key, value);
        }
        self.expect(b'}', "'}'")?;
        Ok(Value::Object(map))
    }
}
