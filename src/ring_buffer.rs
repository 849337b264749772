//! Fixed-capacity growable byte buffer with in-place compaction.
//!
//! The buffer holds the live, unconsumed tail of the request body. It grows
//! by doubling up to `memory_ceiling` and is compacted in place once a match
//! has been found and its prefix handed off, so steady-state operation never
//! allocates beyond the one copy returned to the caller.

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::MultipartError;

/// Initial capacity, chosen slightly above typical 64 KiB chunk sizes.
const INITIAL_CAPACITY: usize = 65 * 1024;

/// Fixed-ceiling growable byte buffer used as the parser's scan window.
#[derive(Debug)]
pub struct RingBuffer {
    data: Vec<u8>,
    /// Count of bytes holding live data at `[0, valid)`.
    valid: usize,
    /// Start of the most recent match recorded by the scanner.
    start: usize,
    /// End (exclusive) of the most recent match recorded by the scanner.
    end: usize,
    ceiling: usize,
}

impl RingBuffer {
    /// Creates an empty buffer with the given hard ceiling.
    pub fn new(ceiling: usize) -> Self {
        let initial = INITIAL_CAPACITY.min(ceiling).max(1);
        Self {
            data: vec![0u8; initial],
            valid: 0,
            start: 0,
            end: 0,
            ceiling,
        }
    }

    /// Bytes currently holding live data.
    pub fn valid(&self) -> usize {
        self.valid
    }

    /// The live region `[0, valid)`.
    pub fn window(&self) -> &[u8] {
        &self.data[..self.valid]
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Records scan-result indices; called only by [`crate::scanner::Scanner`].
    pub fn set_match(&mut self, start: usize, end: usize) {
        self.start = start;
        self.end = end;
    }

    /// Appends `chunk` at position `valid`, growing capacity by doubling
    /// (capped at `memory_ceiling`) if necessary.
    pub fn append(&mut self, chunk: &[u8]) -> Result<(), MultipartError> {
        let required = self.valid + chunk.len();
        if required > self.ceiling {
            debug!(required, ceiling = self.ceiling, "ring buffer memory ceiling exceeded");
            return Err(MultipartError::MemoryLimit {
                ceiling: self.ceiling,
            });
        }
        if required > self.data.len() {
            let mut new_cap = self.data.len().max(1);
            while new_cap < required {
                new_cap = (new_cap * 2).min(self.ceiling).max(new_cap + 1);
            }
            trace!(old_capacity = self.data.len(), new_capacity = new_cap, "growing ring buffer");
            self.data.resize(new_cap, 0);
        }
        self.data[self.valid..required].copy_from_slice(chunk);
        self.valid = required;
        Ok(())
    }

    /// Returns a copy of `[0, start)` and compacts `[end, valid)` down to `[0, valid - end)`.
    ///
    /// After this call `start == end == 0` and `valid` equals the count of
    /// bytes that followed the consumed match.
    pub fn shift_to(&mut self, end: usize) -> Bytes {
        let prefix = Bytes::copy_from_slice(&self.data[..self.start]);
        let tail_len = self.valid - end;
        self.data.copy_within(end..self.valid, 0);
        self.valid = tail_len;
        self.start = 0;
        self.end = 0;
        prefix
    }

    /// Discards the entire live region without returning it; used while
    /// draining the epilogue, where the bytes are never inspected.
    pub fn discard_all(&mut self) {
        self.valid = 0;
        self.start = 0;
        self.end = 0;
    }
}
