// Outcome Channel codec
//
// Wire format (big-endian):
//
//   [len: u32][tag: u8][body: len - 1 bytes]
//
// `len` covers the tag byte and the body. Tag 0x00 carries the JSON of the
// value a task returned, tag 0x01 the JSON string of its diagnostic message.
// The framing layer (`encode_frame` / `decode_frame`) knows nothing about
// tags and can carry any payload in either direction.

use forkpool_core::ExecutorError;
use serde_json::Value;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Size of the length prefix in bytes
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Largest payload a frame may carry (64 MiB)
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

const TAG_SUCCESS: u8 = 0x00;
const TAG_FAILURE: u8 = 0x01;

/// Codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("frame truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("frame too large: {0} bytes (max {max})", max = MAX_FRAME_LEN)]
    TooLarge(usize),

    #[error("{0} trailing bytes after frame")]
    Trailing(usize),

    #[error("empty outcome payload")]
    EmptyPayload,

    #[error("unknown outcome tag {0:#04x}")]
    UnknownTag(u8),

    #[error("payload decode failed: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<CodecError> for ExecutorError {
    fn from(err: CodecError) -> Self {
        ExecutorError::Codec(err.to_string())
    }
}

/// What a worker reports back to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum WireOutcome {
    /// Value returned by the task
    Success(Value),
    /// Diagnostic message of the task's fault
    Failure(String),
}

/// Prefix `payload` with its length
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(CodecError::TooLarge(payload.len()));
    }
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Read the payload length from the first four bytes of `bytes`
pub fn decode_length(bytes: &[u8]) -> Result<usize, CodecError> {
    let prefix: [u8; LENGTH_PREFIX_LEN] = bytes
        .get(..LENGTH_PREFIX_LEN)
        .and_then(|b| b.try_into().ok())
        .ok_or(CodecError::Truncated {
            expected: LENGTH_PREFIX_LEN,
            actual: bytes.len(),
        })?;
    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_FRAME_LEN {
        return Err(CodecError::TooLarge(len));
    }
    Ok(len)
}

/// Extract the payload of exactly one complete frame
pub fn decode_frame(bytes: &[u8]) -> Result<&[u8], CodecError> {
    let len = decode_length(bytes)?;
    let expected = LENGTH_PREFIX_LEN + len;
    if bytes.len() < expected {
        return Err(CodecError::Truncated {
            expected,
            actual: bytes.len(),
        });
    }
    if bytes.len() > expected {
        return Err(CodecError::Trailing(bytes.len() - expected));
    }
    Ok(&bytes[LENGTH_PREFIX_LEN..])
}

/// Tag + JSON body
pub fn encode_outcome(outcome: &WireOutcome) -> Result<Vec<u8>, CodecError> {
    let (tag, body) = match outcome {
        WireOutcome::Success(value) => (TAG_SUCCESS, serde_json::to_vec(value)?),
        WireOutcome::Failure(message) => (TAG_FAILURE, serde_json::to_vec(message)?),
    };
    let mut payload = Vec::with_capacity(1 + body.len());
    payload.push(tag);
    payload.extend_from_slice(&body);
    Ok(payload)
}

pub fn decode_outcome(payload: &[u8]) -> Result<WireOutcome, CodecError> {
    let (&tag, body) = payload.split_first().ok_or(CodecError::EmptyPayload)?;
    match tag {
        TAG_SUCCESS => Ok(WireOutcome::Success(serde_json::from_slice(body)?)),
        TAG_FAILURE => Ok(WireOutcome::Failure(serde_json::from_slice(body)?)),
        other => Err(CodecError::UnknownTag(other)),
    }
}

/// Write one length-prefixed frame
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), CodecError> {
    let frame = encode_frame(payload)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Read exactly one length-prefixed frame (blocking)
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, CodecError> {
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    reader.read_exact(&mut prefix)?;
    let len = decode_length(&prefix)?;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

/// Encode and frame a worker outcome onto `writer`
pub fn write_outcome<W: Write>(writer: &mut W, outcome: &WireOutcome) -> Result<(), CodecError> {
    let payload = encode_outcome(outcome)?;
    write_frame(writer, &payload)
}

/// Read and decode one framed worker outcome
pub fn read_outcome<R: Read>(reader: &mut R) -> Result<WireOutcome, CodecError> {
    let payload = read_frame(reader)?;
    decode_outcome(&payload)
}
