//! RTCP reception report blocks as defined in RFC 3550 Section 6.4.1.
//!
//! A report block is carried inside Sender and Receiver Reports, one per
//! synchronization source being reported on. Only the block itself is modelled
//! here; the enclosing RTCP packet belongs to the transport layer.

use thiserror::Error;

/// Size of a reception report block on the wire.
pub const RECEPTION_REPORT_LEN: usize = 24;

/// Largest value the 24-bit cumulative loss field can carry.
pub const MAX_TOTAL_LOST: u32 = 0x00ff_ffff;

/// Errors raised while decoding report blocks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Buffer too small for reception report: expected {expected} bytes, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },
}

/// A reception report block.
///
/// Wire format:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 SSRC_1 (SSRC of first source)                 |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// | fraction lost |       cumulative number of packets lost       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           extended highest sequence number received           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                      interarrival jitter                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         last SR (LSR)                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                   delay since last SR (DLSR)                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReceptionReport {
    /// Source the report is about.
    pub ssrc: u32,
    /// Fraction of packets lost since the previous report, in 1/256 units.
    pub fraction_lost: u8,
    /// Cumulative packets lost (24 bits on the wire).
    pub total_lost: u32,
    /// Extended highest sequence number received.
    pub last_sequence_number: u32,
    /// Interarrival jitter in RTP timestamp units.
    pub jitter: u32,
    /// Middle 32 bits of the NTP timestamp of the last Sender Report
    /// received from this source, or 0 if none has arrived yet.
    pub last_sender_report: u32,
    /// Delay between receiving that Sender Report and sending this block,
    /// in 1/65536 second units.
    pub delay: u32,
}

impl ReceptionReport {
    /// Serializes the block to its 24-byte big-endian wire format.
    ///
    /// `total_lost` is truncated to its low 24 bits.
    pub fn to_bytes(&self) -> [u8; RECEPTION_REPORT_LEN] {
        let mut buf = [0u8; RECEPTION_REPORT_LEN];
        buf[0..4].copy_from_slice(&self.ssrc.to_be_bytes());
        buf[4..8].copy_from_slice(
            &((u32::from(self.fraction_lost) << 24) | (self.total_lost & MAX_TOTAL_LOST))
                .to_be_bytes(),
        );
        buf[8..12].copy_from_slice(&self.last_sequence_number.to_be_bytes());
        buf[12..16].copy_from_slice(&self.jitter.to_be_bytes());
        buf[16..20].copy_from_slice(&self.last_sender_report.to_be_bytes());
        buf[20..24].copy_from_slice(&self.delay.to_be_bytes());
        buf
    }

    /// Deserializes a block from big-endian wire format.
    ///
    /// Trailing bytes beyond the first 24 are ignored.
    ///
    /// # Errors
    /// Returns [`PacketError::BufferTooSmall`] if fewer than 24 bytes are given.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < RECEPTION_REPORT_LEN {
            return Err(PacketError::BufferTooSmall {
                expected: RECEPTION_REPORT_LEN,
                actual: buf.len(),
            });
        }
        let loss = read_u32(buf, 4);
        Ok(Self {
            ssrc: read_u32(buf, 0),
            fraction_lost: (loss >> 24) as u8,
            total_lost: loss & MAX_TOTAL_LOST,
            last_sequence_number: read_u32(buf, 8),
            jitter: read_u32(buf, 12),
            last_sender_report: read_u32(buf, 16),
            delay: read_u32(buf, 20),
        })
    }
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}
