//! Bounded in-memory byte stream with one writer and one reader.
//!
//! The writer blocks once `capacity` chunks are in flight and the reader
//! blocks while the stream is empty and the writer is still alive.
//! Dropping (or [`ByteSender::close`]-ing) the writer is the only way the
//! reader observes end-of-stream.

use std::io::{self, Read, Write};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

/// Creates a byte channel holding at most `capacity` chunks of at most
/// `chunk_size` bytes each. A `chunk_size` of zero is treated as one.
#[must_use]
pub fn byte_channel(capacity: usize, chunk_size: usize) -> (ByteSender, ByteReceiver) {
    let (tx, rx) = sync_channel(capacity);
    (
        ByteSender {
            tx,
            chunk_size: chunk_size.max(1),
        },
        ByteReceiver {
            rx,
            pending: Vec::new(),
            offset: 0,
        },
    )
}

/// Write end of a byte channel.
#[derive(Debug)]
pub struct ByteSender {
    tx: SyncSender<Vec<u8>>,
    chunk_size: usize,
}

impl ByteSender {
    /// Closes the write end, signalling end-of-stream to the reader.
    pub fn close(self) {
        drop(self);
    }
}

impl Write for ByteSender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let len = buf.len().min(self.chunk_size);
        let chunk = buf[..len].to_vec();
        self.tx.send(chunk).map_err(|_| reader_dropped())?;
        Ok(len)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn reader_dropped() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "byte channel reader dropped")
}

/// Read end of a byte channel.
#[derive(Debug)]
pub struct ByteReceiver {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    offset: usize,
}

impl Read for ByteReceiver {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.offset >= self.pending.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.offset = 0;
                }
                Err(_) => return Ok(0),
            }
        }
        let available = &self.pending[self.offset..];
        let len = available.len().min(buf.len());
        buf[..len].copy_from_slice(&available[..len]);
        self.offset += len;
        Ok(len)
    }
}
