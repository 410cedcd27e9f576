//! Binary wire codec for commands and components.
//!
//! bincode's standard configuration: enum variants are written as a varint tag
//! (a single byte for every current `CommandKind`), integers as varints, floats
//! as little-endian IEEE bits, fields in declaration order.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::commands::Command;

/// Errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("{remaining} trailing bytes after record")]
    TrailingBytes { remaining: usize },
}

fn config() -> bincode::config::Configuration {
    bincode::config::standard()
}

/// Encode any serializable value.
pub fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serde::encode_to_vec(value, config())?)
}

/// Decode a value that must span the whole slice.
pub fn decode_value<T: DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
    let (value, consumed) = bincode::serde::decode_from_slice(data, config())?;
    if consumed != data.len() {
        return Err(CodecError::TrailingBytes {
            remaining: data.len() - consumed,
        });
    }
    Ok(value)
}

/// Encode a command to its wire record.
pub fn encode(command: &Command) -> Result<Vec<u8>, CodecError> {
    encode_value(command)
}

/// Decode one command record.
pub fn decode(data: &[u8]) -> Result<Command, CodecError> {
    decode_value(data)
}
