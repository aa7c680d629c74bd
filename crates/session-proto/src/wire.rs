// SPDX-License-Identifier: Apache-2.0
//! Encode/decode helpers for the session wire format.
//!
//! Unlike the teacher's CBOR framing (`echo-session-proto::wire`, which
//! length-prefixes each packet because its transport is a raw byte stream),
//! this wire is JSON carried over WebSocket text frames: the transport
//! already delimits one message per frame, so there is no framing to add
//! here — just a plain `serde_json` round trip.

use serde::{de::DeserializeOwned, Serialize};

/// Errors produced while encoding or decoding a wire message.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The payload failed to serialize to JSON.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
    /// The payload failed to parse as the expected JSON shape.
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Serializes a message to a JSON byte string suitable for a WebSocket text
/// frame.
///
/// # Errors
/// Returns [`WireError::Encode`] if `value` cannot be serialized.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    serde_json::to_vec(value).map_err(WireError::Encode)
}

/// Deserializes a message from the bytes of a single WebSocket text frame.
///
/// # Errors
/// Returns [`WireError::Decode`] if `bytes` is not valid JSON, or does not
/// match `T`'s shape.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    serde_json::from_slice(bytes).map_err(WireError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        a: u32,
        b: String,
    }

    #[test]
    fn round_trips_through_json_bytes() {
        let value = Sample {
            a: 7,
            b: "hex".to_owned(),
        };
        let bytes = encode(&value).expect("encode");
        let decoded: Sample = decode(&bytes).expect("decode");
        assert_eq!(value, decoded);
    }

    #[test]
    fn decode_rejects_garbage() {
        let result: Result<Sample, _> = decode(b"not json");
        assert!(result.is_err());
    }
}
