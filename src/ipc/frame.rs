//! Wire framing for the local presence socket.
//!
//! Each frame is an opcode (`u32`, little endian), a body length (`u32`,
//! little endian) and a UTF-8 JSON body of that length.

use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest body accepted from the host
pub const MAX_FRAME_LEN: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown opcode {0}")]
    UnknownOpcode(u32),

    #[error("frame body of {0} bytes exceeds limit")]
    Oversized(usize),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Handshake = 0,
    Frame = 1,
    Close = 2,
    Ping = 3,
    Pong = 4,
}

impl TryFrom<u32> for Opcode {
    type Error = FrameError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Opcode::Handshake),
            1 => Ok(Opcode::Frame),
            2 => Ok(Opcode::Close),
            3 => Ok(Opcode::Ping),
            4 => Ok(Opcode::Pong),
            other => Err(FrameError::UnknownOpcode(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub opcode: Opcode,
    pub body: Value,
}

impl Frame {
    pub fn new(opcode: Opcode, body: Value) -> Self {
        Self { opcode, body }
    }

    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let body = serde_json::to_vec(&self.body)?;
        if body.len() > MAX_FRAME_LEN {
            return Err(FrameError::Oversized(body.len()));
        }
        let mut buf = Vec::with_capacity(8 + body.len());
        buf.extend_from_slice(&(self.opcode as u32).to_le_bytes());
        buf.extend_from_slice(&(body.len() as u32).to_le_bytes());
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    /// `evt` field of a FRAME body, if any
    pub fn event(&self) -> Option<&str> {
        self.body.get("evt").and_then(Value::as_str)
    }

    /// `message` of a CLOSE or ERROR body
    pub fn message(&self) -> Option<&str> {
        self.body
            .get("message")
            .or_else(|| self.body.get("data").and_then(|data| data.get("message")))
            .and_then(Value::as_str)
    }
}

pub async fn read_frame<R: AsyncRead + Unpin + ?Sized>(reader: &mut R) -> Result<Frame, FrameError> {
    let mut header = [0u8; 8];
    reader.read_exact(&mut header).await?;

    let opcode = Opcode::try_from(u32::from_le_bytes([header[0], header[1], header[2], header[3]]))?;
    let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::Oversized(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)?
    };

    Ok(Frame { opcode, body })
}

pub async fn write_frame<W: AsyncWrite + Unpin + ?Sized>(
    writer: &mut W,
    frame: &Frame,
) -> Result<(), FrameError> {
    let bytes = frame.encode()?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}
