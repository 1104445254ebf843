use super::consts::page_size;
use super::flags::{MapMode, Placement, Protection, SyncFlags};
use crate::error::MapError;
use crate::utils::align_up;
use std::fmt;
use std::io;
use std::num::NonZeroUsize;
use std::os::fd::RawFd;
use std::ptr::{self, NonNull};

/// Opaque address of a mapping.
///
/// Only the allocator can produce one. It can be compared, printed, checked for
/// alignment, or handed back as a fixed placement request, but not offset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionAddr(NonZeroUsize);

impl RegionAddr {
    pub(crate) fn from_ptr(ptr: NonNull<u8>) -> Self {
        Self(ptr.addr())
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }

    #[must_use]
    pub const fn is_aligned_to(self, align: usize) -> bool {
        align.is_power_of_two() && self.0.get() & (align - 1) == 0
    }
}

impl fmt::Debug for RegionAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionAddr(0x{:x})", self.0.get())
    }
}

impl fmt::Display for RegionAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0.get())
    }
}

/// A contiguous range of virtual memory returned by `mmap`.
///
/// The region is not released on drop; ownership of the unmap belongs to
/// whichever buffer the allocator wraps it in.
#[must_use]
#[derive(Debug)]
pub struct MappedRegion {
    ptr: NonNull<u8>,
    len: usize,
    mapped_len: usize,
    prot: Protection,
    mode: MapMode,
    fd: Option<RawFd>,
    offset: i64,
}

impl MappedRegion {
    #[must_use]
    pub fn addr(&self) -> RegionAddr {
        RegionAddr::from_ptr(self.ptr)
    }

    pub(crate) const fn as_non_null(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Length requested from the mapper.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length the kernel actually reserved, rounded up to whole pages.
    #[must_use]
    pub const fn mapped_len(&self) -> usize {
        self.mapped_len
    }

    #[must_use]
    pub const fn protection(&self) -> Protection {
        self.prot
    }

    #[must_use]
    pub const fn mode(&self) -> MapMode {
        self.mode
    }

    #[must_use]
    pub const fn fd(&self) -> Option<RawFd> {
        self.fd
    }

    #[must_use]
    pub const fn file_offset(&self) -> i64 {
        self.offset
    }
}

/// Maps `len` bytes with the given protection and mode.
///
/// `fd` is ignored for anonymous mappings; `offset` must be page aligned for
/// file-backed ones (the kernel enforces this).
///
/// # Errors
/// `MapError::ZeroLength` for an empty request, `MapError::AnonymousUnsupported` if the
/// host cannot express the mode, and `MapError::SyscallFailed` carrying `errno` otherwise.
pub fn map(
    len: usize,
    prot: Protection,
    mode: MapMode,
    fd: Option<RawFd>,
    offset: i64,
) -> Result<MappedRegion, MapError> {
    if len == 0 {
        return Err(MapError::ZeroLength);
    }

    let flags = mode.to_raw_flags()?;
    let mapped_len = align_up(len, page_size())
        .ok_or_else(|| MapError::SyscallFailed(io::Error::from_raw_os_error(libc::ENOMEM)))?;

    let hint = mode
        .placement
        .hint()
        .map_or(ptr::null_mut(), |addr| ptr::without_provenance_mut(addr.get()));

    let raw_fd = if mode.anonymous { -1 } else { fd.unwrap_or(-1) };

    let file_offset = libc::off_t::try_from(offset)
        .map_err(|_| MapError::SyscallFailed(io::Error::from_raw_os_error(libc::EOVERFLOW)))?;

    let ret = unsafe { libc::mmap(hint, len, prot.bits(), flags, raw_fd, file_offset) };
    if ret == libc::MAP_FAILED {
        let err = io::Error::last_os_error();
        log::trace!("mmap(len={len}, prot=0x{:x}, flags=0x{flags:x}) failed: {err}", prot.bits());
        return Err(MapError::SyscallFailed(err));
    }

    let Some(ptr) = NonNull::new(ret.cast::<u8>()) else {
        return Err(MapError::SyscallFailed(io::Error::from_raw_os_error(
            libc::ENOMEM,
        )));
    };

    // Kernels older than 4.17 treat MAP_FIXED_NOREPLACE as a plain hint.
    if let Placement::FixedNoReplace(want) = mode.placement {
        if RegionAddr::from_ptr(ptr) != want {
            if unsafe { libc::munmap(ret, len) } < 0 {
                log::warn!(
                    "munmap({ret:p}, {len}) of misplaced mapping failed: {}",
                    io::Error::last_os_error()
                );
            }
            return Err(MapError::SyscallFailed(io::Error::from_raw_os_error(
                libc::EEXIST,
            )));
        }
    }

    log::trace!(
        "mmap(len={len}, prot=0x{:x}, flags=0x{flags:x}, fd={raw_fd}, off={offset}) = {:p}",
        prot.bits(),
        ret
    );

    Ok(MappedRegion {
        ptr,
        len,
        mapped_len,
        prot,
        mode,
        fd: if mode.anonymous { None } else { fd },
        offset,
    })
}

/// Releases `[ptr, ptr + len)` back to the OS.
///
/// # Safety
/// The range must lie within a live mapping created by [`map`], must start on a page
/// boundary, and nothing may touch it afterwards. Each distinct sub-range may be
/// unmapped at most once.
pub unsafe fn unmap(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
    let ret = unsafe { libc::munmap(ptr.as_ptr().cast(), len) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    log::trace!("munmap({:p}, {len})", ptr.as_ptr());
    Ok(())
}

/// Writes dirty pages in `[ptr, ptr + len)` back to the backing store.
///
/// # Safety
/// The range must lie within a live mapping and `ptr` must be page aligned.
pub unsafe fn flush(ptr: NonNull<u8>, len: usize, flags: SyncFlags) -> io::Result<()> {
    let ret = unsafe { libc::msync(ptr.as_ptr().cast(), len, flags.bits()) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    log::trace!("msync({:p}, {len}, 0x{:x})", ptr.as_ptr(), flags.bits());
    Ok(())
}
