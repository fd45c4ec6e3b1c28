//! JSON codec for generated unions.
//!
//! Three envelope shapes are supported, picked by [`JsonMode`]:
//!
//! - external: `{"B":123}`
//! - tuple: `["B",123]`
//! - adjacent: `{"t":"B","c":123}` (tag field first)
//!
//! Unit variants carry `null`. With `numeric_tag` the ordinal text is written
//! instead of the wire name (`{"t":"1","c":123}`); decoding always accepts
//! both, as well as a bare integer tag in the tuple and adjacent shapes.
//!
//! The tag is resolved against the union's wire table before the payload is
//! looked at, so an unknown tag is reported as such even when the payload is
//! also broken.

mod error;
mod options;

pub use error::*;
pub use options::*;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{Union, UnionMeta};

/// JSON support, implemented by unions declared with `json(...)`.
pub trait WireUnion: Union {
    /// Options given in the declaration.
    const OPTIONS: JsonOptions;

    /// Encode the active payload (`null` for unit variants).
    fn encode_content(&self) -> Result<Value, EncodeError>;

    /// Build the variant with the given ordinal from its payload.
    fn decode_content(ordinal: usize, content: Value) -> Result<Self, DecodeError>;
}

/// Encode with the declared options.
pub fn to_value<U: WireUnion>(value: &U) -> Result<Value, EncodeError> {
    to_value_with(value, &U::OPTIONS)
}

/// Encode with explicit options.
pub fn to_value_with<U: WireUnion>(value: &U, options: &JsonOptions) -> Result<Value, EncodeError> {
    let ordinal = value.ordinal();
    let tag = tag_for(U::META, ordinal, options)?;
    let content = value.encode_content()?;
    trace!("{}: encoding tag {:?} in {:?} mode", U::META.name(), tag, options.mode);

    Ok(match options.mode {
        JsonMode::External => {
            let mut map = Map::new();
            map.insert(tag, content);
            Value::Object(map)
        }
        JsonMode::Tuple => Value::Array(vec![Value::String(tag), content]),
        JsonMode::Adjacent => {
            let mut map = Map::new();
            map.insert(options.tag_field.to_string(), Value::String(tag));
            map.insert(options.content_field.to_string(), content);
            Value::Object(map)
        }
    })
}

/// Encode to a compact string with the declared options.
pub fn to_string<U: WireUnion>(value: &U) -> Result<String, EncodeError> {
    to_string_with(value, &U::OPTIONS)
}

/// Encode to a compact string with explicit options.
pub fn to_string_with<U: WireUnion>(
    value: &U,
    options: &JsonOptions,
) -> Result<String, EncodeError> {
    let doc = to_value_with(value, options)?;
    serde_json::to_string(&doc).map_err(|e| encode_error::<U>(value, e))
}

/// Encode to an indented string with the declared options.
pub fn to_string_pretty<U: WireUnion>(value: &U) -> Result<String, EncodeError> {
    to_string_pretty_with(value, &U::OPTIONS)
}

/// Encode to an indented string with explicit options.
pub fn to_string_pretty_with<U: WireUnion>(
    value: &U,
    options: &JsonOptions,
) -> Result<String, EncodeError> {
    let doc = to_value_with(value, options)?;
    serde_json::to_string_pretty(&doc).map_err(|e| encode_error::<U>(value, e))
}

/// Decode with the declared options.
pub fn from_value<U: WireUnion>(value: Value) -> Result<U, DecodeError> {
    from_value_with(value, &U::OPTIONS)
}

/// Decode with explicit options.
pub fn from_value_with<U: WireUnion>(value: Value, options: &JsonOptions) -> Result<U, DecodeError> {
    let meta = U::META;
    let (tag, content) = split_envelope(meta, value, options)?;
    let Some(ordinal) = meta.resolve_wire(&tag) else {
        debug!("{}: unknown tag {:?}", meta.name(), tag);
        return Err(DecodeError::new(
            meta.name(),
            DecodeErrorKind::UnknownTag { tag },
        ));
    };
    trace!("{}: tag {:?} resolved to #{}", meta.name(), tag, ordinal);
    U::decode_content(ordinal, content)
}

/// Decode a string with the declared options.
pub fn from_str<U: WireUnion>(s: &str) -> Result<U, DecodeError> {
    from_str_with(s, &U::OPTIONS)
}

/// Decode a string with explicit options.
pub fn from_str_with<U: WireUnion>(s: &str, options: &JsonOptions) -> Result<U, DecodeError> {
    let value: Value = serde_json::from_str(s).map_err(|e| {
        DecodeError::new(
            U::META.name(),
            DecodeErrorKind::MalformedEnvelope {
                expected: "a JSON document",
                got: e.to_string(),
            },
        )
    })?;
    from_value_with(value, options)
}

/// `Serialize` body for generated unions.
pub fn serialize<U, S>(value: &U, serializer: S) -> Result<S::Ok, S::Error>
where
    U: WireUnion,
    S: Serializer,
{
    let doc = to_value(value).map_err(<S::Error as serde::ser::Error>::custom)?;
    doc.serialize(serializer)
}

/// `Deserialize` body for generated unions.
pub fn deserialize<'de, U, D>(deserializer: D) -> Result<U, D::Error>
where
    U: WireUnion,
    D: Deserializer<'de>,
{
    let doc = Value::deserialize(deserializer)?;
    from_value(doc).map_err(<D::Error as serde::de::Error>::custom)
}

/// Encode one payload; used by generated `encode_content`.
pub fn encode_payload<T: Serialize + ?Sized>(
    meta: &UnionMeta,
    ordinal: usize,
    payload: &T,
) -> Result<Value, EncodeError> {
    serde_json::to_value(payload).map_err(|e| EncodeError {
        union: meta.name(),
        variant: meta.name_of(ordinal),
        message: e.to_string(),
    })
}

/// Decode one payload; used by generated `decode_content`.
pub fn decode_payload<T: DeserializeOwned>(
    meta: &UnionMeta,
    ordinal: usize,
    content: Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(content).map_err(|e| {
        DecodeError::new(
            meta.name(),
            DecodeErrorKind::PayloadTypeMismatch {
                variant: meta.name_of(ordinal).unwrap_or("?"),
                message: e.to_string(),
            },
        )
    })
}

/// Check that a unit variant carries `null`.
pub fn decode_unit(meta: &UnionMeta, ordinal: usize, content: Value) -> Result<(), DecodeError> {
    if content.is_null() {
        return Ok(());
    }
    Err(DecodeError::new(
        meta.name(),
        DecodeErrorKind::PayloadTypeMismatch {
            variant: meta.name_of(ordinal).unwrap_or("?"),
            message: format!("expected null, got {}", error::describe(&content)),
        },
    ))
}

/// The error for an ordinal with no decodable variant.
pub fn unknown_ordinal(meta: &UnionMeta, ordinal: usize) -> DecodeError {
    DecodeError::new(
        meta.name(),
        DecodeErrorKind::UnknownTag {
            tag: ordinal.to_string(),
        },
    )
}

fn tag_for(meta: &UnionMeta, ordinal: usize, options: &JsonOptions) -> Result<String, EncodeError> {
    if options.numeric_tag {
        return Ok(ordinal.to_string());
    }
    meta.wire_name_of(ordinal)
        .map(str::to_owned)
        .ok_or_else(|| EncodeError {
            union: meta.name(),
            variant: None,
            message: format!("no variant with ordinal {ordinal}"),
        })
}

fn encode_error<U: WireUnion>(value: &U, e: serde_json::Error) -> EncodeError {
    EncodeError {
        union: U::META.name(),
        variant: U::META.name_of(value.ordinal()),
        message: e.to_string(),
    }
}

/// Pull `(tag, content)` out of an envelope.
fn split_envelope(
    meta: &UnionMeta,
    value: Value,
    options: &JsonOptions,
) -> Result<(String, Value), DecodeError> {
    let union = meta.name();
    match options.mode {
        JsonMode::External => {
            const EXPECTED: &str = "an object with exactly one key";
            let Value::Object(map) = value else {
                return Err(DecodeError::malformed(union, EXPECTED, &value));
            };
            if map.len() != 1 {
                return Err(DecodeError::malformed(union, EXPECTED, &Value::Object(map)));
            }
            match map.into_iter().next() {
                Some(entry) => Ok(entry),
                None => Err(DecodeError::malformed(union, EXPECTED, &Value::Null)),
            }
        }
        JsonMode::Tuple => {
            const EXPECTED: &str = "a two-element array";
            let Value::Array(items) = value else {
                return Err(DecodeError::malformed(union, EXPECTED, &value));
            };
            let [tag, content]: [Value; 2] = match items.try_into() {
                Ok(pair) => pair,
                Err(items) => {
                    return Err(DecodeError::malformed(union, EXPECTED, &Value::Array(items)));
                }
            };
            Ok((tag_text(union, tag)?, content))
        }
        JsonMode::Adjacent => {
            const EXPECTED: &str = "an object with a tag field and a content field";
            let Value::Object(mut map) = value else {
                return Err(DecodeError::malformed(union, EXPECTED, &value));
            };
            let Some(tag) = map.remove(options.tag_field) else {
                return Err(DecodeError::new(
                    union,
                    DecodeErrorKind::MalformedEnvelope {
                        expected: EXPECTED,
                        got: format!("an object without `{}`", options.tag_field),
                    },
                ));
            };
            let content = map.remove(options.content_field).unwrap_or(Value::Null);
            if let Some(extra) = map.keys().next() {
                return Err(DecodeError::new(
                    union,
                    DecodeErrorKind::MalformedEnvelope {
                        expected: EXPECTED,
                        got: format!("an object with extra field `{extra}`"),
                    },
                ));
            }
            Ok((tag_text(union, tag)?, content))
        }
    }
}

/// A tag is a string, or a non-negative integer taken as ordinal text.
fn tag_text(union: &'static str, tag: Value) -> Result<String, DecodeError> {
    match tag {
        Value::String(s) => Ok(s),
        Value::Number(n) if n.is_u64() => Ok(n.to_string()),
        other => Err(DecodeError::malformed(
            union,
            "a string or integer tag",
            &other,
        )),
    }
}
