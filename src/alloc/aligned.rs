use super::buffer::MmapBuffer;
use crate::config::AllocatorConfig;
use crate::error::{MapError, MmapError, MmapResult};
use crate::sys::flags::{MapMode, Protection};
use crate::sys::mapper;
use crate::utils::align_offset;
use std::os::fd::RawFd;
use std::sync::Arc;

/// Maps `len` bytes whose start address is a multiple of `alignment`.
///
/// Over-maps `len + alignment` bytes so an aligned start always exists inside the
/// mapping, then returns either the mapping itself (already aligned) or a slice
/// of it. Either way the whole over-sized mapping is unmapped exactly once, when
/// the returned buffer is released.
///
/// # Errors
/// `MmapError::InvalidConfig` if `capacity` is not a non-zero page multiple,
/// `MmapError::InvalidArgument` if `alignment` is not a power of two or the padded
/// length overflows, `MmapError::ExceedsCapacity` if it exceeds `capacity`, and
/// `MmapError::Map` if the OS refuses the mapping.
pub fn aligned_alloc(
    len: usize,
    prot: Protection,
    mode: MapMode,
    fd: Option<RawFd>,
    offset: i64,
    alignment: usize,
    capacity: usize,
) -> MmapResult<MmapBuffer> {
    AllocatorConfig {
        max_chunk: capacity,
    }
    .validate()?;

    if len == 0 {
        return Err(MapError::ZeroLength.into());
    }
    if !alignment.is_power_of_two() {
        return Err(MmapError::InvalidArgument(format!(
            "alignment {alignment} is not a power of two"
        )));
    }

    let padded = len.checked_add(alignment).ok_or_else(|| {
        MmapError::InvalidArgument(format!("{len} + {alignment} overflows the address space"))
    })?;

    if padded > capacity {
        return Err(MmapError::ExceedsCapacity {
            requested: padded,
            capacity,
        });
    }
    let region = mapper::map(padded, prot, mode, fd, offset)?;
    debug_assert_eq!(region.len(), padded);

    // The whole padded region is unmapped by this buffer, whichever one is returned.
    let full = MmapBuffer::owning(&region, 0, len, padded);

    let slice_offset = align_offset(region.addr().get(), alignment);
    if slice_offset == 0 {
        return Ok(full);
    }

    log::debug!(
        "aligned_alloc: base {} is off a {alignment}-byte boundary, slicing at +{slice_offset}",
        region.addr()
    );

    Ok(MmapBuffer::slice_of(Arc::new(full), slice_offset, len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_CHUNK;
    use crate::sys::consts::page_size;
    use crate::test_support::{is_unmapped, serial};

    fn alloc(len: usize, alignment: usize) -> MmapResult<MmapBuffer> {
        aligned_alloc(
            len,
            Protection::read_write(),
            MapMode::anon_private(),
            None,
            0,
            alignment,
            DEFAULT_MAX_CHUNK,
        )
    }

    #[test]
    fn result_is_aligned_with_exact_length() {
        let _guard = serial();
        for shift in [4, 12, 16, 20, 21] {
            let alignment = 1usize << shift;
            let mut buf = alloc(page_size(), alignment).unwrap();
            assert!(buf.addr().is_aligned_to(alignment), "alignment {alignment}");
            assert_eq!(buf.len(), page_size());
            buf[0] = 123;
            buf[page_size() - 1] = 45;
        }
    }

    #[test]
    fn small_alignment_returns_whole_mapping() {
        let _guard = serial();
        // mmap always returns page-aligned memory, so no slice is needed.
        let buf = alloc(100, 64).unwrap();
        assert!(!buf.is_slice());
        assert_eq!(buf.len(), 100);
        assert_eq!(buf.mapped_len(), 164);
    }

    #[test]
    fn release_unmaps_padded_region() {
        let _guard = serial();
        let alignment = 1 << 20;
        let len = 2 * page_size();
        let buf = alloc(len, alignment).unwrap();
        assert_eq!(buf.mapped_len(), len + alignment);

        let base = buf.mapped_addr();
        assert!(base.get() <= buf.addr().get());
        assert!(buf.addr().get() - base.get() < alignment);

        drop(buf);
        assert!(is_unmapped(base, len + alignment));
    }

    #[test]
    fn rejects_bad_alignment() {
        let _guard = serial();
        assert!(matches!(alloc(4096, 0), Err(MmapError::InvalidArgument(_))));
        assert!(matches!(alloc(4096, 3000), Err(MmapError::InvalidArgument(_))));
        assert!(matches!(
            alloc(usize::MAX, 4096),
            Err(MmapError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_padded_length_over_capacity() {
        let _guard = serial();
        let err = aligned_alloc(
            page_size(),
            Protection::READ,
            MapMode::anon_private(),
            None,
            0,
            page_size(),
            page_size(),
        )
        .unwrap_err();
        assert!(matches!(err, MmapError::ExceedsCapacity { .. }));
    }

    #[test]
    fn rejects_capacity_off_page() {
        let _guard = serial();
        for capacity in [0, page_size() + 1] {
            let err = aligned_alloc(
                100,
                Protection::read_write(),
                MapMode::anon_private(),
                None,
                0,
                64,
                capacity,
            )
            .unwrap_err();
            assert!(matches!(err, MmapError::InvalidConfig(_)), "capacity {capacity}");
        }
    }

    #[test]
    fn zero_length_is_rejected() {
        let _guard = serial();
        assert!(matches!(
            alloc(0, 4096),
            Err(MmapError::Map(MapError::ZeroLength))
        ));
    }
}
