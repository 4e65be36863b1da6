//! Length-prefixed framing for byte streams.
//!
//! Every message on the wire is a length-prefixed frame:
//!
//! ```text
//! +-------------------+--------------------+
//! | length (4 bytes)  |   payload          |
//! | u32 big-endian    |   (length bytes)   |
//! +-------------------+--------------------+
//! ```
//!
//! The length counts only the payload bytes. The payload is JSON, so it is
//! self-describing and any structured value (maps, sequences, scalars, null)
//! survives a round trip. The framer knows nothing about message types;
//! [`crate::protocol`] layers those on top.
//!
//! Decoding is incremental: bytes are accumulated in a per-connection
//! [`FrameBuffer`] and complete frames are taken out of it as they arrive.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Size of the length prefix in bytes.
pub const HEADER_LEN: usize = 4;

/// Configuration for the framing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum allowed payload size in bytes. Default: 1 MB.
    pub max_payload_size: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: 1_048_576,
        }
    }
}

/// Errors that can occur during framing operations.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload size exceeds the configured maximum.
    #[error("payload size {size} exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: u32 },

    #[error("failed to serialize payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to deserialize payload: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Result of one incremental decode attempt over a byte buffer.
#[derive(Debug)]
pub enum Decoded<'a, T> {
    /// The buffer does not yet hold a complete frame.
    NeedMoreData,
    /// A complete frame was decoded; `remaining` is everything after it.
    Message { payload: T, remaining: &'a [u8] },
    /// The header or payload is corrupt. The connection must be dropped.
    Malformed(FrameError),
}

/// Serializes `payload` and prepends its big-endian length.
pub fn encode<T: Serialize + ?Sized>(
    payload: &T,
    config: &FrameConfig,
) -> Result<Vec<u8>, FrameError> {
    let body = serde_json::to_vec(payload).map_err(FrameError::Encode)?;
    if body.len() > config.max_payload_size as usize {
        return Err(FrameError::PayloadTooLarge {
            size: body.len(),
            max: config.max_payload_size,
        });
    }

    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Attempts to decode the first frame in `buffer`.
///
/// Never consumes anything on `NeedMoreData`; the caller keeps the bytes
/// and retries once more have arrived.
pub fn decode_incremental<'a, T: DeserializeOwned>(
    buffer: &'a [u8],
    config: &FrameConfig,
) -> Decoded<'a, T> {
    if buffer.len() < HEADER_LEN {
        return Decoded::NeedMoreData;
    }

    let mut header = [0u8; HEADER_LEN];
    header.copy_from_slice(&buffer[..HEADER_LEN]);
    let payload_len = u32::from_be_bytes(header);

    // Enforce maximum size before waiting on a body that may never come
    if payload_len > config.max_payload_size {
        return Decoded::Malformed(FrameError::PayloadTooLarge {
            size: payload_len as usize,
            max: config.max_payload_size,
        });
    }

    let end = HEADER_LEN + payload_len as usize;
    if buffer.len() < end {
        return Decoded::NeedMoreData;
    }

    match serde_json::from_slice(&buffer[HEADER_LEN..end]) {
        Ok(payload) => Decoded::Message {
            payload,
            remaining: &buffer[end..],
        },
        Err(e) => Decoded::Malformed(FrameError::Decode(e)),
    }
}

/// Per-connection accumulator for partially received frames.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: Vec<u8>,
    config: FrameConfig,
}

impl FrameBuffer {
    pub fn new(config: FrameConfig) -> Self {
        Self {
            pending: Vec::new(),
            config,
        }
    }

    /// Appends freshly received bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Takes the next complete frame out of the buffer, if there is one.
    pub fn next_message<T: DeserializeOwned>(&mut self) -> Result<Option<T>, FrameError> {
        let total = self.pending.len();
        match decode_incremental(&self.pending, &self.config) {
            Decoded::NeedMoreData => Ok(None),
            Decoded::Message { payload, remaining } => {
                let consumed = total - remaining.len();
                self.pending.drain(..consumed);
                Ok(Some(payload))
            }
            Decoded::Malformed(e) => Err(e),
        }
    }

    /// Bytes received but not yet part of a complete frame.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
