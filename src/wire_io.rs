//! Thin `tokio`-level glue between the wire codec and a socket: every read is
//! wrapped in the session's configured timeout, per §4.D/§5.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::{WireDecode, WireEncode};
use crate::error::FatalSessionError;
use crate::protocol::ReplyHeader;

/// Borrowed handle to a connection's stream plus its read timeout. Handlers
/// read their request body and write their reply through this rather than
/// touching the socket directly.
pub struct Io<'a, S> {
    stream: &'a mut S,
    timeout: Duration,
}

impl<'a, S> Io<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: &'a mut S, timeout: Duration) -> Self {
        Self { stream, timeout }
    }

    /// Reads exactly `T::SIZE` bytes and decodes them. A timeout here is
    /// mid-message: fatal, per §5's "timeout mid-message is a fatal framing
    /// error", unlike a timeout on the top-of-loop header read.
    pub async fn read_body<T>(&mut self) -> Result<T, FatalSessionError>
    where
        T: WireDecode + WireEncode,
    {
        let mut buf = BytesMut::zeroed(T::SIZE);
        tokio::time::timeout(self.timeout, self.stream.read_exact(&mut buf))
            .await
            .map_err(|_| FatalSessionError::Timeout)?
            .map_err(FatalSessionError::Io)?;
        Ok(T::decode(&buf)?)
    }

    pub async fn write_reply<T>(&mut self, header: ReplyHeader, body: &T) -> Result<(), FatalSessionError>
    where
        T: WireEncode,
    {
        let mut buf = Vec::with_capacity(2 + T::SIZE);
        header.encode(&mut buf);
        body.encode(&mut buf);
        self.stream.write_all(&buf).await.map_err(FatalSessionError::Io)
    }
}

/// Reads the one-byte `message_type` header at the top of the dispatch loop.
/// `Ok(None)` means the peer closed the connection cleanly; a timeout here
/// surfaces as an `io::Error` of kind `TimedOut` so the caller can classify
/// it as `DisconnectedExpectedly` rather than a fatal error, per §5.
pub async fn read_header_byte<S>(stream: &mut S, timeout: Duration) -> std::io::Result<Option<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut byte = [0u8; 1];
    match tokio::time::timeout(timeout, stream.read(&mut byte)).await {
        Ok(Ok(0)) => Ok(None),
        Ok(Ok(_)) => Ok(Some(byte[0])),
        Ok(Err(e)) => Err(e),
        Err(_elapsed) => Err(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "top-of-loop read timed out",
        )),
    }
}
