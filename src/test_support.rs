use crate::sys::flags::{MapMode, Protection};
use crate::sys::mapper::{self, RegionAddr};
use std::sync::{Mutex, MutexGuard, PoisonError};

static ADDRESS_SPACE: Mutex<()> = Mutex::new(());

/// Serializes tests that map memory, so a hole left by one test is not
/// refilled by another before it is probed.
pub fn serial() -> MutexGuard<'static, ()> {
    ADDRESS_SPACE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// True if no page of `[addr, addr + len)` is mapped.
pub fn is_unmapped(addr: RegionAddr, len: usize) -> bool {
    match mapper::map(
        len,
        Protection::NONE,
        MapMode::anon_private().fixed_noreplace(addr),
        None,
        0,
    ) {
        Ok(region) => {
            unsafe { mapper::unmap(region.as_non_null(), len).unwrap() };
            true
        }
        Err(_) => false,
    }
}
