use super::consts::{ANONYMOUS_SUPPORTED, MAP_ANON, MAP_FIXED, MAP_PRIVATE, MAP_SHARED};
use super::mapper::RegionAddr;
use crate::error::{MapError, MmapError, MmapResult};
use bitflags::bitflags;

#[cfg(any(target_os = "linux", target_os = "android"))]
const MAP_FIXED_NOREPLACE: i32 = libc::MAP_FIXED_NOREPLACE;
// Without kernel support the address is passed as a hint and checked after the call.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const MAP_FIXED_NOREPLACE: i32 = 0;

bitflags! {
    /// Page protection for a mapping. The empty set is `PROT_NONE`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Protection: i32 {
        const READ = libc::PROT_READ;
        const WRITE = libc::PROT_WRITE;
        const EXEC = libc::PROT_EXEC;
    }
}

impl Protection {
    pub const NONE: Self = Self::empty();

    #[must_use]
    pub const fn read_write() -> Self {
        Self::READ.union(Self::WRITE)
    }
}

bitflags! {
    /// Write-back behavior for `msync`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SyncFlags: i32 {
        const ASYNC = libc::MS_ASYNC;
        const SYNC = libc::MS_SYNC;
        const INVALIDATE = libc::MS_INVALIDATE;
    }
}

impl Default for SyncFlags {
    fn default() -> Self {
        Self::SYNC
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sharing {
    /// Copy-on-write; writes never reach the backing store.
    #[default]
    Private,
    /// Writes are visible to other mappings and carried to the backing file.
    Shared,
}

/// Where the kernel may place a new mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    Anywhere,
    /// Map exactly at the address, replacing whatever was mapped there.
    Fixed(RegionAddr),
    /// Map exactly at the address, failing with `EEXIST` if any of it is in use.
    FixedNoReplace(RegionAddr),
}

impl Placement {
    #[must_use]
    pub const fn hint(self) -> Option<RegionAddr> {
        match self {
            Self::Anywhere => None,
            Self::Fixed(addr) | Self::FixedNoReplace(addr) => Some(addr),
        }
    }
}

/// Mapping mode: sharing semantics, backing, and placement.
///
/// Placement is only set through the builders, so replacing live pages with
/// [`MapMode::fixed`] always goes through `unsafe`.
///
/// ```compile_fail,E0451
/// use mmap_alloc::{MapMode, Placement};
///
/// fn replace_at(addr: mmap_alloc::RegionAddr) -> MapMode {
///     MapMode { placement: Placement::Fixed(addr), ..MapMode::anon_private() }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapMode {
    pub sharing: Sharing,
    pub anonymous: bool,
    pub(crate) placement: Placement,
    /// Host-specific bits passed through untouched (e.g. `MAP_POPULATE`).
    pub extra: i32,
}

impl MapMode {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn private(mut self) -> Self {
        self.sharing = Sharing::Private;
        self
    }

    #[must_use]
    pub const fn shared(mut self) -> Self {
        self.sharing = Sharing::Shared;
        self
    }

    #[must_use]
    pub const fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Maps exactly at `addr`, replacing whatever is mapped there.
    ///
    /// # Safety
    /// No live [`MmapBuffer`](crate::MmapBuffer) or other mapping the caller
    /// does not own may overlap the requested range. Replaced pages are
    /// unmapped again by the new buffer, so an overlapping owner would be left
    /// pointing at freed memory and would unmap it a second time.
    ///
    /// ```compile_fail,E0133
    /// use mmap_alloc::{Allocator, MapMode, Protection};
    ///
    /// let allocator = Allocator::default();
    /// let live = allocator.alloc_anonymous(4096, Protection::READ).unwrap();
    /// let addr = live.into_buffers()[0].addr();
    /// let _ = MapMode::anon_private().fixed(addr);
    /// ```
    #[must_use]
    pub const unsafe fn fixed(mut self, addr: RegionAddr) -> Self {
        self.placement = Placement::Fixed(addr);
        self
    }

    #[must_use]
    pub const fn fixed_noreplace(mut self, addr: RegionAddr) -> Self {
        self.placement = Placement::FixedNoReplace(addr);
        self
    }

    #[must_use]
    pub const fn placement(&self) -> Placement {
        self.placement
    }

    #[must_use]
    pub const fn extra(mut self, bits: i32) -> Self {
        self.extra |= bits;
        self
    }

    /// Anonymous private memory, the common case for scratch buffers.
    #[must_use]
    pub const fn anon_private() -> Self {
        Self {
            sharing: Sharing::Private,
            anonymous: true,
            placement: Placement::Anywhere,
            extra: 0,
        }
    }

    /// Decodes a raw `MAP_*` bitmask handed in by a host layer.
    ///
    /// Exactly one of `MAP_PRIVATE`/`MAP_SHARED` must be set. `MAP_FIXED` carries no
    /// address in this form, so it is rejected; use [`MapMode::fixed`] instead.
    ///
    /// # Errors
    /// Returns `MmapError::InvalidArgument` for bitmasks that cannot be represented.
    pub fn from_raw(bits: i32) -> MmapResult<Self> {
        if bits & MAP_FIXED != 0 {
            return Err(MmapError::InvalidArgument(
                "MAP_FIXED requires an explicit address".into(),
            ));
        }

        let sharing = match (bits & MAP_PRIVATE != 0, bits & MAP_SHARED != 0) {
            (true, false) => Sharing::Private,
            (false, true) => Sharing::Shared,
            _ => {
                return Err(MmapError::InvalidArgument(format!(
                    "exactly one of MAP_PRIVATE or MAP_SHARED must be set (flags 0x{bits:x})"
                )));
            }
        };

        let anonymous = ANONYMOUS_SUPPORTED && bits & MAP_ANON != 0;
        let known = MAP_PRIVATE | MAP_SHARED | if anonymous { MAP_ANON } else { 0 };

        Ok(Self {
            sharing,
            anonymous,
            placement: Placement::Anywhere,
            extra: bits & !known,
        })
    }

    /// Converts the mode into the raw bitmask expected by `mmap`.
    ///
    /// # Errors
    /// Returns `MapError::AnonymousUnsupported` if an anonymous mapping is requested
    /// on a host with no anonymous flag.
    pub fn to_raw_flags(self) -> Result<i32, MapError> {
        let mut flags = self.extra;

        flags |= match self.sharing {
            Sharing::Private => MAP_PRIVATE,
            Sharing::Shared => MAP_SHARED,
        };

        if self.anonymous {
            if !ANONYMOUS_SUPPORTED {
                return Err(MapError::AnonymousUnsupported);
            }
            flags |= MAP_ANON;
        }

        match self.placement {
            Placement::Anywhere => {}
            Placement::Fixed(_) => flags |= MAP_FIXED,
            Placement::FixedNoReplace(_) => flags |= MAP_FIXED_NOREPLACE,
        }

        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_private_flags() {
        let flags = MapMode::anon_private().to_raw_flags().unwrap();
        assert_eq!(flags & MAP_PRIVATE, MAP_PRIVATE);
        assert_eq!(flags & MAP_ANON, MAP_ANON);
        assert_eq!(flags & MAP_SHARED, 0);
        assert_eq!(flags & MAP_FIXED, 0);
    }

    #[test]
    fn builder_overrides_sharing() {
        let mode = MapMode::new().private().shared();
        assert_eq!(mode.sharing, Sharing::Shared);
        assert!(!mode.anonymous);
    }

    #[test]
    fn from_raw_roundtrips_known_bits() {
        let mode = MapMode::from_raw(MAP_SHARED | MAP_ANON).unwrap();
        assert_eq!(mode.sharing, Sharing::Shared);
        assert_eq!(mode.anonymous, ANONYMOUS_SUPPORTED);
        assert_eq!(mode.extra, 0);
        assert_eq!(mode.to_raw_flags().unwrap(), MAP_SHARED | MAP_ANON);
    }

    #[test]
    fn from_raw_rejects_ambiguous_sharing() {
        assert!(MapMode::from_raw(MAP_ANON).is_err());
        assert!(MapMode::from_raw(MAP_SHARED | MAP_PRIVATE).is_err());
        assert!(MapMode::from_raw(MAP_PRIVATE | MAP_FIXED).is_err());
    }

    #[test]
    fn placement_builders() {
        let addr = RegionAddr::from_ptr(std::ptr::NonNull::<u8>::dangling());
        assert_eq!(MapMode::anon_private().placement(), Placement::Anywhere);

        let mode = MapMode::anon_private().fixed_noreplace(addr);
        assert_eq!(mode.placement(), Placement::FixedNoReplace(addr));
        assert_eq!(mode.placement().hint(), Some(addr));

        let mode = unsafe { MapMode::anon_private().fixed(addr) };
        assert_eq!(mode.placement(), Placement::Fixed(addr));
        assert_eq!(mode.to_raw_flags().unwrap() & MAP_FIXED, MAP_FIXED);
    }

    #[test]
    fn protection_none_is_empty() {
        assert_eq!(Protection::NONE.bits(), libc::PROT_NONE);
        assert_eq!(
            Protection::read_write().bits(),
            libc::PROT_READ | libc::PROT_WRITE
        );
    }

    #[test]
    fn sync_defaults_to_synchronous() {
        assert_eq!(SyncFlags::default(), SyncFlags::SYNC);
    }
}
