//! NDJSON wire framing for the telemetry stream: one JSON envelope per
//! line over a persistent byte stream.

use crate::{ControlCommand, StatsPayload, VehicleStatsPayload};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use thiserror::Error;

pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024;
pub const STREAM_PROTOCOL_VERSION: u16 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamEnvelope {
    #[serde(default = "default_version", deserialize_with = "deserialize_version")]
    pub version: u16,
    pub client_id: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub msg: StreamMsg,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum StreamMsg {
    Hello(HelloPayload),
    Stats(StatsPayload),
    VehicleStats(VehicleStatsPayload),
    Message(String),
    #[serde(rename = "broadcast_logging_control")]
    LoggingControl(ControlCommand),
}

/// Client identification sent once after connecting, the wire analog of
/// the browser client's X-Username handshake header.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HelloPayload {
    pub username: String,
    #[serde(default)]
    pub role: String,
}

fn default_version() -> u16 {
    STREAM_PROTOCOL_VERSION
}

/// Accept the version as a number or a string ("1" / "v1"); older
/// publishers are inconsistent about it.
fn deserialize_version<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_u64()
            .and_then(|raw| u16::try_from(raw).ok())
            .ok_or_else(|| de::Error::custom("protocol version out of range")),
        Value::String(text) => text
            .trim()
            .trim_start_matches('v')
            .parse::<u16>()
            .map_err(|err| de::Error::custom(format!("invalid protocol version: {err}"))),
        Value::Null => Ok(STREAM_PROTOCOL_VERSION),
        _ => Err(de::Error::custom(
            "expected string or number for protocol version",
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame exceeds max size: {size} > {max}")]
    OversizedFrame { size: usize, max: usize },
    #[error("buffer exceeds max size without delimiter: {size} > {max}")]
    OversizedBuffer { size: usize, max: usize },
    #[error("frame encode failed: {0}")]
    Encode(String),
    #[error("frame decode failed: {0}")]
    Decode(String),
}

pub fn encode_frame<T: Serialize>(
    value: &T,
    max_frame_bytes: usize,
) -> Result<Vec<u8>, FrameError> {
    let mut encoded =
        serde_json::to_vec(value).map_err(|err| FrameError::Encode(err.to_string()))?;
    if encoded.len() > max_frame_bytes {
        return Err(FrameError::OversizedFrame {
            size: encoded.len(),
            max: max_frame_bytes,
        });
    }
    encoded.push(b'\n');
    Ok(encoded)
}

pub fn decode_frame<T: DeserializeOwned>(
    bytes: &[u8],
    max_frame_bytes: usize,
) -> Result<T, FrameError> {
    let raw = trim_line_ending(bytes);
    if raw.len() > max_frame_bytes {
        return Err(FrameError::OversizedFrame {
            size: raw.len(),
            max: max_frame_bytes,
        });
    }
    serde_json::from_slice(raw).map_err(|err| FrameError::Decode(err.to_string()))
}

fn trim_line_ending(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

/// Frames and errors produced by one feed of bytes. A malformed line is
/// reported and skipped; decoding continues with the next line.
#[derive(Debug, Clone)]
pub struct FrameBatch<T> {
    pub frames: Vec<T>,
    pub errors: Vec<FrameError>,
}

impl<T> Default for FrameBatch<T> {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Incremental NDJSON decoder over arbitrarily chunked reads.
pub struct StreamFrameDecoder<T> {
    max_frame_bytes: usize,
    pending: Vec<u8>,
    marker: PhantomData<T>,
}

impl<T> StreamFrameDecoder<T> {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            max_frame_bytes,
            pending: Vec::new(),
            marker: PhantomData,
        }
    }
}

impl<T> Default for StreamFrameDecoder<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl<T: DeserializeOwned> StreamFrameDecoder<T> {
    pub fn feed(&mut self, chunk: &[u8]) -> FrameBatch<T> {
        self.pending.extend_from_slice(chunk);

        let mut batch = FrameBatch::default();
        while let Some(newline_at) = self.pending.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline_at).collect();
            let line = trim_line_ending(&line);
            if line.is_empty() {
                continue;
            }
            self.decode_line(line, &mut batch);
        }

        if self.pending.len() > self.max_frame_bytes {
            batch.errors.push(FrameError::OversizedBuffer {
                size: self.pending.len(),
                max: self.max_frame_bytes,
            });
            self.pending.clear();
        }

        batch
    }

    /// Decode whatever remains after the stream ends (a final frame
    /// without a trailing newline).
    pub fn flush(&mut self) -> FrameBatch<T> {
        let mut batch = FrameBatch::default();
        if self.pending.is_empty() {
            return batch;
        }
        let remainder = std::mem::take(&mut self.pending);
        self.decode_line(trim_line_ending(&remainder), &mut batch);
        batch
    }

    fn decode_line(&self, line: &[u8], batch: &mut FrameBatch<T>) {
        if line.len() > self.max_frame_bytes {
            batch.errors.push(FrameError::OversizedFrame {
                size: line.len(),
                max: self.max_frame_bytes,
            });
            return;
        }
        match serde_json::from_slice(line) {
            Ok(frame) => batch.frames.push(frame),
            Err(err) => batch.errors.push(FrameError::Decode(err.to_string())),
        }
    }
}
