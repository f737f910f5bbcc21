// src/exec/limiter.rs

//! Output channel plumbing and the per-channel byte limit.
//!
//! - [`pump`] runs as its own Tokio task per channel and forwards raw reads
//!   to the supervisor as [`ProcessEvent`]s.
//! - [`StreamLimiter`] is owned by the execution core and decides, chunk by
//!   chunk, whether the bytes are kept or the channel has overflowed.

use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::buffer::ChannelBuffer;
use super::{Channel, ProcessEvent};

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// What happened to a chunk offered to a [`StreamLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Stored in the channel buffer.
    Appended,
    /// This chunk pushed the channel past its limit. Not stored.
    Overflowed,
    /// The channel overflowed earlier; the chunk is discarded.
    Dropped,
}

/// Enforces `max_buffer` on one output channel.
#[derive(Debug)]
pub struct StreamLimiter {
    channel: Channel,
    max_buffer: usize,
    /// Bytes seen on this channel, including the chunk that overflowed it.
    seen: usize,
    overflowed: bool,
    buffer: ChannelBuffer,
}

impl StreamLimiter {
    pub fn new(channel: Channel, max_buffer: usize) -> Self {
        Self {
            channel,
            max_buffer,
            seen: 0,
            overflowed: false,
            buffer: ChannelBuffer::new(),
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn buffer(&self) -> &ChannelBuffer {
        &self.buffer
    }

    /// Count `chunk` against the limit and store it if it still fits.
    ///
    /// The chunk that crosses the limit is excluded from the buffer; its
    /// bytes only count toward the overflow decision.
    pub fn admit(&mut self, chunk: Vec<u8>) -> Admission {
        if self.overflowed {
            return Admission::Dropped;
        }

        self.seen = self.seen.saturating_add(chunk.len());
        if self.seen > self.max_buffer {
            self.overflowed = true;
            debug!(
                channel = %self.channel,
                seen = self.seen,
                max_buffer = self.max_buffer,
                "channel exceeded maxBuffer"
            );
            return Admission::Overflowed;
        }

        self.buffer.append(chunk);
        Admission::Appended
    }

    /// Message used for the overflow failure, e.g. `"stdout maxBuffer exceeded"`.
    pub fn overflow_message(&self) -> String {
        format!("{} maxBuffer exceeded", self.channel)
    }
}

/// Read `reader` to EOF, forwarding every chunk as [`ProcessEvent::Chunk`]
/// and finishing with [`ProcessEvent::Closed`].
///
/// Stops early if the supervisor has gone away. Read errors other than
/// `Interrupted` end the channel as if it had closed.
pub async fn pump<R>(mut reader: R, channel: Channel, events: mpsc::Sender<ProcessEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                trace!(%channel, bytes = n, "read chunk");
                let event = ProcessEvent::Chunk {
                    channel,
                    bytes: buf[..n].to_vec(),
                };
                if events.send(event).await.is_err() {
                    debug!(%channel, "supervisor gone; stopping pump");
                    return;
                }
            }
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(%channel, error = %e, "read failed; treating channel as closed");
                break;
            }
        }
    }

    let _ = events.send(ProcessEvent::Closed(channel)).await;
}
