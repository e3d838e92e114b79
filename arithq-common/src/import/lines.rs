//! Line reassembly over a chunked byte source
//!
//! Bytes arrive in chunks whose boundaries bear no relation to line
//! boundaries. [`LineBuffer`] holds the bytes of the current partial line
//! between chunks; [`read_lines`] and [`lines_from_chunks`] drive it from an
//! async reader or a stream of chunks and yield complete lines in order.

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Line delimiter used by import files
pub const DEFAULT_DELIMITER: u8 = b'\n';

/// Read size for [`read_lines`]
const CHUNK_SIZE: usize = 8 * 1024;

/// Pending-bytes buffer carried across chunk boundaries
///
/// Lines are returned without the delimiter. After `push` returns, the
/// pending buffer never contains a delimiter byte.
#[derive(Debug)]
pub struct LineBuffer {
    delimiter: u8,
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            pending: Vec::new(),
        }
    }

    /// Append a chunk and return every line it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();

        // Earlier pending bytes hold no delimiter, so only the new bytes are scanned
        let mut scan_from = self.pending.len();
        self.pending.extend_from_slice(chunk);

        let mut line_start = 0;
        while let Some(offset) = self.pending[scan_from..]
            .iter()
            .position(|&b| b == self.delimiter)
        {
            let line_end = scan_from + offset;
            lines.push(self.pending[line_start..line_end].to_vec());
            line_start = line_end + 1;
            scan_from = line_start;
        }

        self.pending.drain(..line_start);
        lines
    }

    /// Bytes of the unterminated final line, if any
    pub fn finish(self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending)
        }
    }
}

fn decode(line: Vec<u8>) -> io::Result<String> {
    String::from_utf8(line).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Reassemble lines from a stream of byte chunks
///
/// A chunk error ends the stream with that error and no final flush.
pub fn lines_from_chunks<S, B>(chunks: S, delimiter: u8) -> impl Stream<Item = io::Result<String>>
where
    S: Stream<Item = io::Result<B>> + Unpin,
    B: AsRef<[u8]>,
{
    try_stream! {
        let mut chunks = chunks;
        let mut buffer = LineBuffer::new(delimiter);

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            for line in buffer.push(chunk.as_ref()) {
                yield decode(line)?;
            }
        }

        if let Some(line) = buffer.finish() {
            yield decode(line)?;
        }
    }
}

/// Reassemble lines from an async reader
pub fn read_lines<R>(reader: R, delimiter: u8) -> impl Stream<Item = io::Result<String>>
where
    R: AsyncRead + Unpin,
{
    try_stream! {
        let mut reader = reader;
        let mut buffer = LineBuffer::new(delimiter);
        let mut chunk = vec![0u8; CHUNK_SIZE];

        loop {
            let read = reader.read(&mut chunk).await?;
            if read == 0 {
                break;
            }
            for line in buffer.push(&chunk[..read]) {
                yield decode(line)?;
            }
        }

        if let Some(line) = buffer.finish() {
            yield decode(line)?;
        }
    }
}
