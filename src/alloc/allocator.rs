use super::buffer::MmapBuffer;
use super::{Allocation, aligned, chunked, sync};
use crate::config::AllocatorConfig;
use crate::error::MmapResult;
use crate::sys::flags::{MapMode, Protection, SyncFlags};
use std::os::fd::{AsRawFd, RawFd};

/// Front-end over the mapper that hands out owned buffers.
///
/// Holds no mappings itself; every buffer it returns is responsible for its own
/// release, so the allocator can be dropped while buffers are still in use.
#[derive(Debug, Clone, Default)]
pub struct Allocator {
    config: AllocatorConfig,
}

impl Allocator {
    /// # Errors
    /// Returns `MmapError::InvalidConfig` if the configuration does not validate.
    pub fn new(config: AllocatorConfig) -> MmapResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Maps `len` bytes, split into chunks if `len` exceeds `max_chunk`.
    ///
    /// # Errors
    /// Returns `MmapError::Map` if the OS refuses the mapping.
    pub fn alloc(
        &self,
        len: usize,
        prot: Protection,
        mode: MapMode,
        fd: Option<RawFd>,
        offset: i64,
    ) -> MmapResult<Allocation> {
        chunked::alloc(len, prot, mode, fd, offset, self.config.max_chunk)
    }

    /// Maps `len` bytes starting on an `alignment` boundary.
    ///
    /// # Errors
    /// See [`aligned::aligned_alloc`].
    pub fn aligned_alloc(
        &self,
        len: usize,
        prot: Protection,
        mode: MapMode,
        fd: Option<RawFd>,
        offset: i64,
        alignment: usize,
    ) -> MmapResult<MmapBuffer> {
        aligned::aligned_alloc(len, prot, mode, fd, offset, alignment, self.config.max_chunk)
    }

    /// Anonymous private memory.
    ///
    /// # Errors
    /// Returns `MmapError::Map` if the OS refuses the mapping.
    pub fn alloc_anonymous(&self, len: usize, prot: Protection) -> MmapResult<Allocation> {
        self.alloc(len, prot, MapMode::anon_private(), None, 0)
    }

    /// Maps `len` bytes of `file` starting at `offset`.
    ///
    /// The descriptor only needs to stay open for the duration of this call;
    /// the mapping keeps its own reference to the file.
    ///
    /// # Errors
    /// Returns `MmapError::Map` if the OS refuses the mapping.
    pub fn map_file<F: AsRawFd>(
        &self,
        file: &F,
        len: usize,
        prot: Protection,
        mode: MapMode,
        offset: i64,
    ) -> MmapResult<Allocation> {
        let mut mode = mode;
        mode.anonymous = false;
        self.alloc(len, prot, mode, Some(file.as_raw_fd()), offset)
    }

    /// Flushes part of a buffer to its backing store.
    ///
    /// # Errors
    /// See [`sync::sync`].
    pub fn sync(
        &self,
        buf: &MmapBuffer,
        offset: usize,
        len: Option<usize>,
        flags: SyncFlags,
    ) -> MmapResult<()> {
        sync::sync(buf, offset, len, flags)
    }
}
