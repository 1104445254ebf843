use super::buffer::MmapBuffer;
use crate::error::{MmapError, MmapResult, RangeError};
use crate::sys::consts::page_size;
use crate::sys::flags::SyncFlags;
use crate::sys::mapper;

/// Validates a flush request against `buf` and returns the clamped length.
fn check_range(
    buf: &MmapBuffer,
    offset: usize,
    len: Option<usize>,
) -> Result<usize, RangeError> {
    if offset >= buf.len() {
        return Err(RangeError::OffsetOutOfBounds {
            offset,
            len: buf.len(),
        });
    }

    let page = page_size();
    if offset > 0 && offset % page != 0 {
        return Err(RangeError::MisalignedOffset {
            offset,
            page_size: page,
        });
    }

    let remaining = buf.len() - offset;
    Ok(len.map_or(remaining, |l| l.min(remaining)))
}

/// Flushes dirty pages in `buf[offset..offset + len]` to the backing store.
///
/// `offset` must be inside the buffer and, unless zero, on a page boundary.
/// `len` defaults to the rest of the buffer and is clamped to it; a zero
/// length succeeds without touching the OS.
///
/// # Errors
/// `MmapError::Range` for an invalid offset, `MmapError::Syscall` if `msync` fails.
pub fn sync(
    buf: &MmapBuffer,
    offset: usize,
    len: Option<usize>,
    flags: SyncFlags,
) -> MmapResult<()> {
    let len = check_range(buf, offset, len)?;
    if len == 0 {
        return Ok(());
    }

    let ptr = unsafe { buf.as_non_null().add(offset) };
    unsafe { mapper::flush(ptr, len, flags) }.map_err(MmapError::Syscall)
}

impl MmapBuffer {
    /// Synchronously flushes the whole buffer.
    ///
    /// # Errors
    /// Returns `MmapError::Syscall` if `msync` fails.
    pub fn flush(&self) -> MmapResult<()> {
        sync(self, 0, None, SyncFlags::SYNC)
    }

    /// Flushes `len` bytes from `offset` with the given write-back flags.
    ///
    /// # Errors
    /// See [`sync`].
    pub fn flush_range(&self, offset: usize, len: usize, flags: SyncFlags) -> MmapResult<()> {
        sync(self, offset, Some(len), flags)
    }
}
