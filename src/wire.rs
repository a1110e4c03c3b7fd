//! Wire format for network pixel frames.
//!
//! Every packet starts with a 24 byte header, all fields little-endian:
//!
//! | Offset | Size | Field         |
//! |--------|------|---------------|
//! | 0      | 2    | command       |
//! | 2      | 2    | channel       |
//! | 4      | 4    | pixel count   |
//! | 8      | 8    | seconds       |
//! | 16     | 8    | microseconds  |
//!
//! The header is followed by `pixel_count` packed RGB triples. Trailing
//! bytes after the pixel data are ignored.

use thiserror::Error;

use crate::frame::{Frame, Timestamp};

/// Size of the fixed packet header
pub const HEADER_LEN: usize = 24;

/// Bytes per packed RGB pixel
pub const BYTES_PER_PIXEL: usize = 3;

/// Command code senders use for plain pixel frames
pub const COMMAND_PIXELDATA: u16 = 3;

/// Reasons a packet is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("packet is {len} bytes, shorter than the {HEADER_LEN} byte header")]
    TooShort { len: usize },
    #[error("packet declares {expected} bytes but carries {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("packet declares {pixel_count} pixels, display holds {max_pixels}")]
    CapacityExceeded { pixel_count: u32, max_pixels: usize },
}

/// Reasons a frame cannot be encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("encoded frame needs {needed} bytes, buffer has {available}")]
pub struct EncodeError {
    pub needed: usize,
    pub available: usize,
}

/// Parsed packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    pub command: u16,
    pub channel: u16,
    pub pixel_count: u32,
    pub timestamp: Timestamp,
}

impl WireHeader {
    /// Parse the header without looking at the payload.
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        let Some(header) = bytes.first_chunk::<HEADER_LEN>() else {
            return Err(DecodeError::TooShort { len: bytes.len() });
        };

        Ok(Self {
            command: u16::from_le_bytes([header[0], header[1]]),
            channel: u16::from_le_bytes([header[2], header[3]]),
            pixel_count: u32::from_le_bytes([header[4], header[5], header[6], header[7]]),
            timestamp: Timestamp::new(read_u64(header, 8), read_u64(header, 16)),
        })
    }

    /// Total packet length this header declares
    pub const fn packet_len(&self) -> usize {
        HEADER_LEN.saturating_add((self.pixel_count as usize).saturating_mul(BYTES_PER_PIXEL))
    }

    pub fn write(&self, out: &mut [u8; HEADER_LEN]) {
        out[0..2].copy_from_slice(&self.command.to_le_bytes());
        out[2..4].copy_from_slice(&self.channel.to_le_bytes());
        out[4..8].copy_from_slice(&self.pixel_count.to_le_bytes());
        out[8..16].copy_from_slice(&self.timestamp.seconds.to_le_bytes());
        out[16..24].copy_from_slice(&self.timestamp.micros.to_le_bytes());
    }
}

fn read_u64(header: &[u8; HEADER_LEN], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&header[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

/// A packet whose header and length have been validated against a display
/// of `max_pixels`.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedPacket<'a> {
    pub header: WireHeader,
    pub pixel_bytes: &'a [u8],
}

/// Validate a raw packet without touching any frame.
///
/// Capacity is checked before the length so that an oversized declaration is
/// reported as such even when the payload is also truncated.
pub fn validate(bytes: &[u8], max_pixels: usize) -> Result<ValidatedPacket<'_>, DecodeError> {
    let header = WireHeader::parse(bytes)?;

    if header.pixel_count as usize > max_pixels {
        return Err(DecodeError::CapacityExceeded {
            pixel_count: header.pixel_count,
            max_pixels,
        });
    }

    let expected = header.packet_len();
    if bytes.len() < expected {
        return Err(DecodeError::SizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }

    Ok(ValidatedPacket {
        header,
        pixel_bytes: &bytes[HEADER_LEN..expected],
    })
}

/// Decode `bytes` into `frame`.
///
/// The frame is only written once the whole packet has validated, so a
/// rejected packet leaves it untouched.
pub fn decode_into<const MAX_PIXELS: usize>(
    bytes: &[u8],
    frame: &mut Frame<MAX_PIXELS>,
) -> Result<WireHeader, DecodeError> {
    let packet = validate(bytes, MAX_PIXELS)?;
    frame.fill_packed(
        packet.pixel_bytes,
        packet.header.timestamp,
        packet.header.channel,
    );
    Ok(packet.header)
}

/// Decode `bytes` into a fresh frame
pub fn decode<const MAX_PIXELS: usize>(bytes: &[u8]) -> Result<Frame<MAX_PIXELS>, DecodeError> {
    let mut frame = Frame::new();
    decode_into(bytes, &mut frame)?;
    Ok(frame)
}

/// Encode `frame` into `out`, returning the number of bytes written.
#[allow(clippy::cast_possible_truncation)]
pub fn encode<const MAX_PIXELS: usize>(
    frame: &Frame<MAX_PIXELS>,
    command: u16,
    out: &mut [u8],
) -> Result<usize, EncodeError> {
    let header = WireHeader {
        command,
        channel: frame.channel(),
        pixel_count: frame.pixel_count() as u32,
        timestamp: frame.captured_at(),
    };
    let needed = header.packet_len();
    if out.len() < needed {
        return Err(EncodeError {
            needed,
            available: out.len(),
        });
    }

    let (head, body) = out.split_at_mut(HEADER_LEN);
    if let Some(head) = head.first_chunk_mut::<HEADER_LEN>() {
        header.write(head);
    }
    for (dst, pixel) in body.chunks_exact_mut(BYTES_PER_PIXEL).zip(frame.pixels()) {
        dst[0] = pixel.r;
        dst[1] = pixel.g;
        dst[2] = pixel.b;
    }

    Ok(needed)
}
