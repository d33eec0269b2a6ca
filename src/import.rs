//! CBOR ingestion.
//!
//! Decoded CBOR documents map onto heap values as follows:
//!
//! | CBOR                         | Value                               |
//! |------------------------------|-------------------------------------|
//! | null                         | `Null`                              |
//! | bool, integer, float, text   | primitive (integers become numbers) |
//! | byte string                  | `Uint8Array`                        |
//! | array                        | array                               |
//! | map with only text keys      | plain record                        |
//! | any other map                | `Map`                               |
//! | tag 0 (RFC 3339 text)        | date, invalid if unparsable         |
//! | tag 1 (epoch seconds)        | date                                |
//!
//! Other tags are rejected. Every import allocates fresh objects, so two
//! imports of the same bytes are equal but not identical.

use crate::error::CongruenceError;
use crate::heap::Heap;
use crate::object::TypedArray;
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde_cbor::Value as Cbor;

const TAG_DATETIME_TEXT: u64 = 0;
const TAG_DATETIME_EPOCH: u64 = 1;

impl Heap {
    /// Decodes `bytes` as one CBOR item and imports it.
    pub fn decode_cbor(&mut self, bytes: &[u8]) -> Result<Value, CongruenceError> {
        let item: Cbor =
            serde_cbor::from_slice(bytes).map_err(|e| CongruenceError::Cbor(e.to_string()))?;
        self.import_cbor(&item)
    }

    /// Imports an already decoded CBOR item.
    pub fn import_cbor(&mut self, item: &Cbor) -> Result<Value, CongruenceError> {
        let value = match item {
            Cbor::Null => Value::Null,
            Cbor::Bool(b) => Value::Bool(*b),
            Cbor::Integer(i) => Value::Number(*i as f64),
            Cbor::Float(f) => Value::Number(*f),
            Cbor::Text(s) => Value::String(s.clone()),
            Cbor::Bytes(bytes) => self.typed_array(TypedArray::Uint8(bytes.clone())),
            Cbor::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.import_cbor(item))
                    .collect::<Result<Vec<_>, _>>()?;
                self.array(items)
            }
            Cbor::Map(entries) => {
                if entries.keys().all(|k| matches!(k, Cbor::Text(_))) {
                    let mut fields = Vec::with_capacity(entries.len());
                    for (key, value) in entries {
                        if let Cbor::Text(key) = key {
                            fields.push((key.clone(), self.import_cbor(value)?));
                        }
                    }
                    self.record(fields)
                } else {
                    let mut pairs = Vec::with_capacity(entries.len());
                    for (key, value) in entries {
                        pairs.push((self.import_cbor(key)?, self.import_cbor(value)?));
                    }
                    self.map(pairs)
                }
            }
            Cbor::Tag(TAG_DATETIME_TEXT, inner) => match inner.as_ref() {
                Cbor::Text(text) => match DateTime::parse_from_rfc3339(text) {
                    Ok(instant) => self.date(instant.with_timezone(&Utc)),
                    Err(_) => self.invalid_date(),
                },
                other => return Err(unsupported("tag 0 around", other)),
            },
            Cbor::Tag(TAG_DATETIME_EPOCH, inner) => match inner.as_ref() {
                Cbor::Integer(secs) => match i64::try_from(*secs) {
                    Ok(secs) => self.date_millis(secs.saturating_mul(1000)),
                    Err(_) => self.invalid_date(),
                },
                Cbor::Float(secs) if secs.is_finite() => self.date_millis((secs * 1000.0) as i64),
                Cbor::Float(_) => self.invalid_date(),
                other => return Err(unsupported("tag 1 around", other)),
            },
            Cbor::Tag(tag, _) => {
                return Err(CongruenceError::UnsupportedCbor(format!("tag {tag}")));
            }
            other => return Err(unsupported("item", other)),
        };
        Ok(value)
    }
}

fn unsupported(context: &str, item: &Cbor) -> CongruenceError {
    CongruenceError::UnsupportedCbor(format!("{context} {item:?}"))
}
