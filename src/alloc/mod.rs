pub mod aligned;
pub mod allocator;
pub mod buffer;
pub mod chunked;
pub mod sync;

use buffer::MmapBuffer;
use chunked::ChunkSequence;

/// Result of a plain allocation: one buffer, or several when the mapping is
/// larger than a single buffer may be.
#[derive(Debug)]
pub enum Allocation {
    Single(MmapBuffer),
    Chunked(ChunkSequence),
}

impl Allocation {
    /// Total bytes visible across all buffers.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(buf) => buf.len(),
            Self::Chunked(seq) => seq.total_len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn is_chunked(&self) -> bool {
        matches!(self, Self::Chunked(_))
    }

    /// The buffers in address order, a single buffer being a sequence of one.
    #[must_use]
    pub fn into_buffers(self) -> Vec<MmapBuffer> {
        match self {
            Self::Single(buf) => vec![buf],
            Self::Chunked(seq) => seq.into_vec(),
        }
    }

    /// The buffer, if the allocation was not split.
    #[must_use]
    pub fn into_single(self) -> Option<MmapBuffer> {
        match self {
            Self::Single(buf) => Some(buf),
            Self::Chunked(_) => None,
        }
    }
}

// Re-export the main allocator for easy access
pub use allocator::Allocator;
