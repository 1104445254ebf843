use crate::error::{MmapError, MmapResult};
use crate::sys::flags::{MapMode, Protection};
use crate::sys::mapper::{self, MappedRegion, RegionAddr};
use std::fmt;
use std::io;
use std::ops::{Bound, Deref, DerefMut, RangeBounds};
use std::ptr::NonNull;
use std::slice;
use std::sync::Arc;

/// What happens to the underlying pages when a buffer is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReleaseAction {
    /// Unmap exactly this range.
    Unmap { ptr: NonNull<u8>, len: usize },
    /// Leave the pages alone; another buffer owns the unmap.
    Retain,
}

/// A byte view over mapped memory that unmaps its range when dropped.
///
/// Buffers are only created by the allocator. The release action runs exactly
/// once: the pending action is taken out of the buffer before it runs, so
/// neither an explicit [`MmapBuffer::unmap`] nor a later drop can repeat it.
///
/// A buffer produced by slicing holds a strong reference to its parent. The
/// parent, and the unmap it carries, outlives every slice taken from it.
pub struct MmapBuffer {
    ptr: NonNull<u8>,
    len: usize,
    prot: Protection,
    mode: MapMode,
    release: Option<ReleaseAction>,
    parent: Option<Arc<MmapBuffer>>,
}

// A buffer handed out by value has its bytes to itself: either it owns the range
// or every `Arc` link to its parent is unique. Shared views only hand out `&[u8]`.
unsafe impl Send for MmapBuffer {}
unsafe impl Sync for MmapBuffer {}

impl MmapBuffer {
    /// Wraps a whole region. Releasing the buffer unmaps the full region.
    pub(crate) fn from_region(region: &MappedRegion) -> Self {
        Self::owning(region, 0, region.len(), region.len())
    }

    /// A buffer starting `start` bytes into `region`, showing `visible` bytes and
    /// unmapping `unmap_len` bytes from `start` when released.
    pub(crate) fn owning(
        region: &MappedRegion,
        start: usize,
        visible: usize,
        unmap_len: usize,
    ) -> Self {
        debug_assert!(visible <= unmap_len);
        debug_assert!(start + unmap_len <= region.len());

        let ptr = unsafe { region.as_non_null().add(start) };
        Self {
            ptr,
            len: visible,
            prot: region.protection(),
            mode: region.mode(),
            release: Some(ReleaseAction::Unmap {
                ptr,
                len: unmap_len,
            }),
            parent: None,
        }
    }

    /// A view of `len` bytes at `offset` into `parent` that never unmaps on its own.
    ///
    /// The parent stays mapped until the last slice referring to it is gone.
    pub(crate) fn slice_of(parent: Arc<Self>, offset: usize, len: usize) -> Self {
        debug_assert!(offset + len <= parent.span());

        let ptr = unsafe { parent.ptr.add(offset) };
        Self {
            ptr,
            len,
            prot: parent.prot,
            mode: parent.mode,
            release: Some(ReleaseAction::Retain),
            parent: Some(parent),
        }
    }

    /// Bytes addressable from `ptr` while the buffer is alive, including any
    /// over-allocation hidden past the visible length.
    fn span(&self) -> usize {
        match self.release {
            Some(ReleaseAction::Unmap { len, .. }) => len,
            _ => self.len,
        }
    }

    #[must_use]
    pub fn addr(&self) -> RegionAddr {
        RegionAddr::from_ptr(self.ptr)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes that will be unmapped when this buffer (and, for a slice, its
    /// parent) is released.
    #[must_use]
    pub fn mapped_len(&self) -> usize {
        match (&self.release, &self.parent) {
            (Some(ReleaseAction::Unmap { len, .. }), _) => *len,
            (_, Some(parent)) => parent.mapped_len(),
            _ => 0,
        }
    }

    /// Start of the range that [`MmapBuffer::mapped_len`] describes.
    #[must_use]
    pub fn mapped_addr(&self) -> RegionAddr {
        match (&self.release, &self.parent) {
            (Some(ReleaseAction::Unmap { ptr, .. }), _) => RegionAddr::from_ptr(*ptr),
            (_, Some(parent)) => parent.mapped_addr(),
            _ => self.addr(),
        }
    }

    #[must_use]
    pub const fn protection(&self) -> Protection {
        self.prot
    }

    #[must_use]
    pub const fn mode(&self) -> MapMode {
        self.mode
    }

    /// Whether this buffer is a view kept alive by a parent mapping.
    #[must_use]
    pub const fn is_slice(&self) -> bool {
        self.parent.is_some()
    }

    #[must_use]
    pub const fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    #[must_use]
    pub const fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub(crate) const fn as_non_null(&self) -> NonNull<u8> {
        self.ptr
    }

    /// The visible bytes.
    ///
    /// # Panics
    /// If the mapping was made without `READ`; touching it would fault.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        assert!(
            self.prot.contains(Protection::READ),
            "buffer at {} is mapped {:?}, not readable",
            self.addr(),
            self.prot
        );
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The visible bytes, mutably.
    ///
    /// # Panics
    /// If the mapping lacks `READ` or `WRITE`.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        assert!(
            self.prot.contains(Protection::read_write()),
            "buffer at {} is mapped {:?}, not read-write",
            self.addr(),
            self.prot
        );
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Converts into a clonable, read-only handle.
    #[must_use]
    pub fn into_shared(self) -> SharedBuffer {
        SharedBuffer(Arc::new(self))
    }

    /// Releases the buffer now, reporting an unmap failure instead of aborting.
    ///
    /// If this buffer was the last holder of its parent, the parent is released too.
    ///
    /// # Errors
    /// Returns `MmapError::Syscall` if `munmap` fails.
    pub fn unmap(mut self) -> MmapResult<()> {
        self.run_release().map_err(MmapError::Syscall)?;

        if let Some(parent) = self.parent.take() {
            if let Ok(parent) = Arc::try_unwrap(parent) {
                parent.unmap()?;
            }
        }
        Ok(())
    }

    /// Whether no other handle can reach these bytes through a shared parent.
    fn owns_exclusively(&mut self) -> bool {
        match self.parent.as_mut() {
            None => true,
            Some(parent) => Arc::get_mut(parent).is_some_and(Self::owns_exclusively),
        }
    }

    fn run_release(&mut self) -> io::Result<()> {
        match self.release.take() {
            Some(ReleaseAction::Unmap { ptr, len }) => unsafe { mapper::unmap(ptr, len) },
            Some(ReleaseAction::Retain) | None => Ok(()),
        }
    }
}

impl Drop for MmapBuffer {
    fn drop(&mut self) {
        let pending = self.release;
        if let Err(e) = self.run_release() {
            // A failing munmap here means two owners claimed the same pages.
            log::error!("release of {pending:?} failed: {e}");
            if !std::thread::panicking() {
                panic!("munmap failed during buffer release: {e}");
            }
        }
    }
}

impl Deref for MmapBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl DerefMut for MmapBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl AsRef<[u8]> for MmapBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsMut<[u8]> for MmapBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl fmt::Debug for MmapBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MmapBuffer")
            .field("addr", &self.addr())
            .field("len", &self.len)
            .field("mapped_len", &self.mapped_len())
            .field("prot", &self.prot)
            .field("slice", &self.is_slice())
            .finish()
    }
}

/// A reference-counted, read-only buffer handle.
///
/// Clones share one mapping; it is released when the last clone (or the last
/// slice taken from one) is dropped.
#[derive(Debug, Clone)]
pub struct SharedBuffer(Arc<MmapBuffer>);

impl SharedBuffer {
    /// A read-only view of `range` that keeps this mapping alive.
    ///
    /// # Errors
    /// Returns `MmapError::InvalidArgument` if the range falls outside the buffer.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> MmapResult<Self> {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.0.len(),
        };

        if start > end || end > self.0.len() {
            return Err(MmapError::InvalidArgument(format!(
                "slice {start}..{end} out of range for buffer of {} bytes",
                self.0.len()
            )));
        }

        Ok(Self(Arc::new(MmapBuffer::slice_of(
            Arc::clone(&self.0),
            start,
            end - start,
        ))))
    }

    /// Number of live handles (clones and slices) on this exact buffer.
    #[must_use]
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Recovers exclusive ownership if this is the only handle left.
    ///
    /// For a slice, every buffer it was sliced from must also have no other
    /// handle, since those still see the same bytes.
    ///
    /// # Errors
    /// Returns the handle unchanged if other clones or slices still exist.
    pub fn try_unwrap(self) -> Result<MmapBuffer, Self> {
        let mut inner = self.0;
        if !Arc::get_mut(&mut inner).is_some_and(MmapBuffer::owns_exclusively) {
            return Err(Self(inner));
        }
        Arc::try_unwrap(inner).map_err(Self)
    }
}

impl Deref for SharedBuffer {
    type Target = MmapBuffer;

    fn deref(&self) -> &MmapBuffer {
        &self.0
    }
}

impl AsRef<[u8]> for SharedBuffer {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}
