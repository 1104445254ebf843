//! Small integer helpers for page and alignment arithmetic.

/// Rounds `val` up to the next multiple of `align`, which must be a power of two.
///
/// Returns `None` on overflow.
#[must_use]
pub const fn align_up(val: usize, align: usize) -> Option<usize> {
    match val.checked_add(align - 1) {
        Some(v) => Some(v & !(align - 1)),
        None => None,
    }
}

/// Distance from `addr` to the next `align` boundary, or 0 if already aligned.
#[must_use]
pub const fn align_offset(addr: usize, align: usize) -> usize {
    let rem = addr & (align - 1);
    if rem == 0 { 0 } else { align - rem }
}

#[must_use]
pub const fn is_multiple_of(val: usize, unit: usize) -> bool {
    unit != 0 && val % unit == 0
}

/// Number of `chunk`-sized pieces needed to cover `len` bytes.
#[must_use]
pub const fn chunk_count(len: usize, chunk: usize) -> usize {
    len.div_ceil(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_boundary() {
        assert_eq!(align_up(0, 4096), Some(0));
        assert_eq!(align_up(1, 4096), Some(4096));
        assert_eq!(align_up(4096, 4096), Some(4096));
        assert_eq!(align_up(4097, 4096), Some(8192));
        assert_eq!(align_up(usize::MAX, 4096), None);
    }

    #[test]
    fn align_offset_is_zero_when_aligned() {
        assert_eq!(align_offset(0x10_0000, 0x10_0000), 0);
        assert_eq!(align_offset(0x7f00_0000_1000, 0x10_0000), 0xf_f000);
        assert_eq!(align_offset(0x1000, 16), 0);
    }

    #[test]
    fn chunk_count_covers_remainder() {
        assert_eq!(chunk_count(10, 5), 2);
        assert_eq!(chunk_count(11, 5), 3);
        assert_eq!(chunk_count(1, 5), 1);
    }

    #[test]
    fn multiple_of_rejects_zero_unit() {
        assert!(is_multiple_of(8192, 4096));
        assert!(!is_multiple_of(100, 4096));
        assert!(!is_multiple_of(4096, 0));
    }
}
