//! Source RCON packet framing.
//!
//! Wire format (all integers little-endian):
//! ```text
//! i32 length | i32 request id | i32 type | payload bytes | 0x00 0x00
//! ```
//! `length` counts everything after itself.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::error::RconError;

/// Response packet carrying command output.
pub const SERVERDATA_RESPONSE_VALUE: i32 = 0;
/// Command execution request.
pub const SERVERDATA_EXECCOMMAND: i32 = 2;
/// Authentication reply. Shares its wire value with `SERVERDATA_EXECCOMMAND`.
pub const SERVERDATA_AUTH_RESPONSE: i32 = 2;
/// Authentication request.
pub const SERVERDATA_AUTH: i32 = 3;

/// Highest request id handed out before wrapping back to 1.
pub const MAX_REQUEST_ID: i32 = 0x7FFF_FFF0;

const HEADER_LEN: usize = 8;

/// Largest body accepted from a peer.
pub const MAX_BODY_LEN: usize = 1 << 20;
const TERMINATOR: &[u8] = b"\0\0";

/// A single RCON packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub kind: i32,
    pub payload: Bytes,
}

impl Packet {
    pub fn new(id: i32, kind: i32, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            kind,
            payload: payload.into(),
        }
    }

    /// Encode the full frame, length prefix included.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn encode(&self) -> Bytes {
        let body_len = HEADER_LEN + self.payload.len() + TERMINATOR.len();
        let mut frame = BytesMut::with_capacity(4 + body_len);
        frame.put_i32_le(body_len as i32);
        frame.put_i32_le(self.id);
        frame.put_i32_le(self.kind);
        frame.put_slice(&self.payload);
        frame.put_slice(TERMINATOR);
        frame.freeze()
    }

    /// Decode a packet body (everything after the length prefix).
    ///
    /// Strips the two-NUL terminator. Some servers send a single NUL or none
    /// at all, in which case trailing NULs are trimmed instead.
    pub fn decode_body(mut body: Bytes) -> Result<Self, RconError> {
        if body.len() < HEADER_LEN {
            return Err(RconError::Malformed(format!(
                "body of {} bytes is shorter than the packet header",
                body.len()
            )));
        }

        let id = body.get_i32_le();
        let kind = body.get_i32_le();

        let payload = if body.ends_with(TERMINATOR) {
            body.slice(..body.len() - TERMINATOR.len())
        } else {
            let end = body.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1);
            body.slice(..end)
        };

        Ok(Self { id, kind, payload })
    }
}

/// Monotonic request-id generator.
///
/// Ids are always positive: 0 is used by servers for some unsolicited replies
/// and -1 signals an authentication failure.
#[derive(Debug, Default)]
pub struct RequestIds {
    last: i32,
}

impl RequestIds {
    pub const fn new() -> Self {
        Self { last: 0 }
    }

    /// Generator whose next id follows `last`.
    pub const fn starting_after(last: i32) -> Self {
        Self { last }
    }

    #[allow(clippy::should_implement_trait)]
    pub const fn next(&mut self) -> i32 {
        self.last = if self.last >= MAX_REQUEST_ID || self.last < 0 {
            1
        } else {
            self.last + 1
        };
        self.last
    }

    pub const fn reset(&mut self) {
        self.last = 0;
    }
}

/// Write one packet and flush, bounded by `io_timeout`.
pub async fn write_packet<W>(
    writer: &mut W,
    packet: &Packet,
    io_timeout: Duration,
) -> Result<(), RconError>
where
    W: AsyncWrite + Unpin,
{
    let frame = packet.encode();
    timeout(io_timeout, async {
        writer.write_all(&frame).await?;
        writer.flush().await
    })
    .await
    .map_err(|_| RconError::Timeout("write"))??;
    Ok(())
}

/// Read one packet, bounding each exact read by `io_timeout`.
pub async fn read_packet<R>(reader: &mut R, io_timeout: Duration) -> Result<Packet, RconError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    read_exact(reader, &mut len_buf, io_timeout).await?;

    let length = i32::from_le_bytes(len_buf);
    let length = usize::try_from(length)
        .ok()
        .filter(|&len| (HEADER_LEN..=MAX_BODY_LEN).contains(&len))
        .ok_or_else(|| RconError::Malformed(format!("invalid packet length {length}")))?;

    let mut body = vec![0u8; length];
    read_exact(reader, &mut body, io_timeout).await?;

    Packet::decode_body(Bytes::from(body))
}

async fn read_exact<R>(reader: &mut R, buf: &mut [u8], io_timeout: Duration) -> Result<(), RconError>
where
    R: AsyncRead + Unpin,
{
    timeout(io_timeout, reader.read_exact(buf))
        .await
        .map_err(|_| RconError::Timeout("read"))??;
    Ok(())
}
