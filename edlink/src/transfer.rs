//! Transfer accounting for the chunked file-write loop.

/// Progress counters for an in-flight file transfer.
///
/// `offset + remaining == total` holds before and after every chunk; the
/// transfer is complete when `remaining` reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferState {
    total: u32,
    remaining: u32,
    offset: u32,
}

impl TransferState {
    /// Start tracking a transfer of `total` bytes.
    pub fn new(total: u32) -> Self {
        Self {
            total,
            remaining: total,
            offset: 0,
        }
    }

    /// Size of the next chunk, bounded by `max_block`.
    pub fn next_block(&self, max_block: u32) -> u32 {
        self.remaining.min(max_block)
    }

    /// Record `written` bytes accepted by the transport.
    ///
    /// Partial writes are fine; the counters advance by whatever the
    /// transport actually took.
    pub fn advance(&mut self, written: u32) {
        debug_assert!(written <= self.remaining);
        self.remaining -= written;
        self.offset += written;
    }

    /// Whether the whole payload has been written.
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    /// Total transfer length in bytes.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Bytes not yet written.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Bytes already written; doubles as the read offset into the payload.
    pub fn offset(&self) -> u32 {
        self.offset
    }
}
