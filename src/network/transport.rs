//! Newline-delimited JSON framing over any async byte stream.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::error::TransportError;

pub struct FrameReader<R> {
    inner: R,
    frame: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            frame: Vec::new(),
        }
    }

    /// Next raw frame without its terminator, or `None` once the peer has closed.
    ///
    /// Bytes are returned undecoded so that a frame which is not UTF-8 surfaces
    /// as a decode error for that frame rather than an I/O error on the stream.
    pub async fn next_frame(&mut self) -> Result<Option<&[u8]>, TransportError> {
        self.frame.clear();
        let read = self.inner.read_until(b'\n', &mut self.frame).await?;
        if read == 0 {
            return Ok(None);
        }
        let mut end = self.frame.len();
        while end > 0 && matches!(self.frame[end - 1], b'\r' | b'\n') {
            end -= 1;
        }
        Ok(Some(&self.frame[..end]))
    }

    /// Next frame decoded as `T`, skipping blank lines.
    pub async fn recv<T: DeserializeOwned>(&mut self) -> Result<Option<T>, TransportError> {
        loop {
            match self.next_frame().await? {
                None => return Ok(None),
                Some(frame) if is_blank(frame) => continue,
                Some(frame) => return Ok(Some(serde_json::from_slice(frame)?)),
            }
        }
    }
}

pub fn is_blank(frame: &[u8]) -> bool {
    frame.iter().all(u8::is_ascii_whitespace)
}

pub struct FrameWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub async fn send<T: Serialize>(&mut self, frame: &T) -> Result<(), TransportError> {
        let mut bytes = serde_json::to_vec(frame)?;
        bytes.push(b'\n');
        self.inner.write_all(&bytes).await?;
        self.inner.flush().await?;
        Ok(())
    }
}

/// Split a TCP stream into a framed reader/writer pair.
pub fn framed(stream: TcpStream) -> (FrameReader<BufReader<OwnedReadHalf>>, FrameWriter<OwnedWriteHalf>) {
    if let Err(err) = stream.set_nodelay(true) {
        log::debug!("Failed to set TCP_NODELAY: {err}");
    }
    let (read_half, write_half) = stream.into_split();
    (
        FrameReader::new(BufReader::new(read_half)),
        FrameWriter::new(write_half),
    )
}
