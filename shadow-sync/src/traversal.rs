//! Lazy background traversal over `[0, len)` in fixed-size chunks.

use shadow_store::IndexRange;

/// Finite, forward-only sequence of chunk ranges covering `[0, len)`.
#[derive(Debug, Clone)]
pub struct Traversal {
    next: usize,
    len: usize,
    chunk: usize,
}

impl Traversal {
    pub fn new(len: usize, chunk: usize) -> Self {
        Self {
            next: 0,
            len,
            chunk: chunk.max(1),
        }
    }

    /// Items per chunk.
    pub fn chunk(&self) -> usize {
        self.chunk
    }

    /// First index not yet yielded.
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn is_exhausted(&self) -> bool {
        self.next >= self.len
    }
}

impl Iterator for Traversal {
    type Item = IndexRange;

    fn next(&mut self) -> Option<IndexRange> {
        if self.is_exhausted() {
            return None;
        }
        let start = self.next;
        let stop = start.saturating_add(self.chunk).min(self.len);
        self.next = stop;
        Some(IndexRange::contiguous(start, stop))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.len - self.next.min(self.len)).div_ceil(self.chunk);
        (remaining, Some(remaining))
    }
}
