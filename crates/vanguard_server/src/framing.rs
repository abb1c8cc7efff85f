//! Order wire framing.
//!
//! Each packet on the wire is a 4-byte little-endian total length
//! (counting the frame number field but not itself), a 4-byte
//! little-endian frame number, and an opaque payload of
//! `total_length - 4` bytes. [`FrameDecoder`] reassembles packets from
//! arbitrarily chunked reads; [`encode_frame`] produces them.

use crate::error::{Result, ServerError};

/// Largest payload a single order packet may declare, in bytes.
pub const MAX_ORDER_LENGTH: usize = 131_072;

/// Wire header size: length field plus frame number.
pub const HEADER_LENGTH: usize = 8;

/// One reassembled order packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFrame {
    /// Simulation frame the orders apply to.
    pub frame: i32,
    /// Opaque order payload.
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
enum DecodeState {
    Header,
    Data { frame: i32, expect: usize },
}

/// Incremental reassembler for the inbound order byte stream.
///
/// Bytes are appended as network reads arrive; each [`feed`] call pops
/// as many complete packets as the buffer holds. A declared length
/// outside the valid range faults the decoder permanently: the
/// connection carrying it must be dropped.
///
/// [`feed`]: FrameDecoder::feed
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    state: DecodeState,
    most_recent_frame: i32,
    faulted: bool,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Fresh decoder awaiting its first header.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            state: DecodeState::Header,
            most_recent_frame: 0,
            faulted: false,
        }
    }

    /// Highest frame number seen so far. Never regresses.
    #[must_use]
    pub fn most_recent_frame(&self) -> i32 {
        self.most_recent_frame
    }

    /// Whether a protocol fault has poisoned this decoder.
    #[must_use]
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Append freshly read bytes and pop every complete packet.
    ///
    /// One call may yield zero packets (partial data) or many (a large
    /// read spanning several packets). After an `Err` the decoder stays
    /// faulted and yields nothing further.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<OrderFrame>> {
        if self.faulted {
            return Err(ServerError::DecoderFaulted);
        }

        self.buffer.extend_from_slice(bytes);
        let mut frames = Vec::new();

        loop {
            match self.state {
                DecodeState::Header => {
                    if self.buffer.len() < HEADER_LENGTH {
                        break;
                    }
                    let header: Vec<u8> = self.buffer.drain(..HEADER_LENGTH).collect();
                    let total = i32::from_le_bytes([header[0], header[1], header[2], header[3]]);
                    let frame = i32::from_le_bytes([header[4], header[5], header[6], header[7]]);

                    // Widen before subtracting so a hostile length field
                    // cannot wrap.
                    let expect = i64::from(total) - 4;
                    if expect < 0 || expect > MAX_ORDER_LENGTH as i64 {
                        self.faulted = true;
                        return Err(ServerError::InvalidLength(expect));
                    }

                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let expect = expect as usize;
                    self.state = DecodeState::Data { frame, expect };
                }
                DecodeState::Data { frame, expect } => {
                    if self.buffer.len() < expect {
                        break;
                    }
                    let payload: Vec<u8> = self.buffer.drain(..expect).collect();
                    self.most_recent_frame = self.most_recent_frame.max(frame);
                    frames.push(OrderFrame { frame, payload });
                    self.state = DecodeState::Header;
                }
            }
        }

        Ok(frames)
    }
}

/// Encode one order packet for the wire.
///
/// Fails if the payload exceeds [`MAX_ORDER_LENGTH`], which no
/// well-formed order batch should.
pub fn encode_frame(frame: i32, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_ORDER_LENGTH {
        return Err(ServerError::InvalidLength(payload.len() as i64));
    }

    let total = i32::try_from(payload.len() + 4)
        .map_err(|_| ServerError::InvalidLength(payload.len() as i64))?;

    let mut out = Vec::with_capacity(HEADER_LENGTH + payload.len());
    out.extend_from_slice(&total.to_le_bytes());
    out.extend_from_slice(&frame.to_le_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}
