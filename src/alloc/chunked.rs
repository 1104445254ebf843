use super::Allocation;
use super::buffer::MmapBuffer;
use crate::config::AllocatorConfig;
use crate::error::MmapResult;
use crate::sys::flags::{MapMode, Protection};
use crate::sys::mapper;
use crate::utils::chunk_count;
use std::ops::Index;
use std::os::fd::RawFd;
use std::slice;
use std::vec;

/// Buffers covering one mapping, in address order.
///
/// Each chunk unmaps only its own range, so chunks may be dropped in any order.
#[derive(Debug)]
pub struct ChunkSequence {
    chunks: Vec<MmapBuffer>,
}

impl ChunkSequence {
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Sum of the chunk lengths; equals the length originally requested.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.chunks.iter().map(MmapBuffer::len).sum()
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&MmapBuffer> {
        self.chunks.get(idx)
    }

    #[must_use]
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut MmapBuffer> {
        self.chunks.get_mut(idx)
    }

    pub fn iter(&self) -> slice::Iter<'_, MmapBuffer> {
        self.chunks.iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, MmapBuffer> {
        self.chunks.iter_mut()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<MmapBuffer> {
        self.chunks
    }
}

impl Index<usize> for ChunkSequence {
    type Output = MmapBuffer;

    fn index(&self, idx: usize) -> &MmapBuffer {
        &self.chunks[idx]
    }
}

impl IntoIterator for ChunkSequence {
    type Item = MmapBuffer;
    type IntoIter = vec::IntoIter<MmapBuffer>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChunkSequence {
    type Item = &'a MmapBuffer;
    type IntoIter = slice::Iter<'a, MmapBuffer>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

/// Maps `len` bytes in one call and wraps them in as many buffers as `max_chunk` requires.
///
/// `max_chunk` must be a non-zero multiple of the page size; it is checked before
/// anything is mapped.
///
/// # Errors
/// Returns `MmapError::InvalidConfig` for a bad `max_chunk` and `MmapError::Map`
/// if the OS refuses the mapping.
pub fn alloc(
    len: usize,
    prot: Protection,
    mode: MapMode,
    fd: Option<RawFd>,
    offset: i64,
    max_chunk: usize,
) -> MmapResult<Allocation> {
    AllocatorConfig { max_chunk }.validate()?;

    let region = mapper::map(len, prot, mode, fd, offset)?;

    if len <= max_chunk {
        return Ok(Allocation::Single(MmapBuffer::from_region(&region)));
    }

    let count = chunk_count(len, max_chunk);
    log::debug!(
        "alloc: splitting {len} bytes at {} into {count} chunks of up to {max_chunk}",
        region.addr()
    );

    let chunks = (0..count)
        .map(|i| {
            let start = i * max_chunk;
            let chunk_len = max_chunk.min(len - start);
            MmapBuffer::owning(&region, start, chunk_len, chunk_len)
        })
        .collect();

    Ok(Allocation::Chunked(ChunkSequence { chunks }))
}
