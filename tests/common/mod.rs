#![allow(dead_code)]

use mmap_alloc::{Allocator, MapMode, Protection, RegionAddr};
use std::sync::{Mutex, MutexGuard, PoisonError};

static ADDRESS_SPACE: Mutex<()> = Mutex::new(());

/// Serializes tests that probe the address space.
pub fn serial() -> MutexGuard<'static, ()> {
    ADDRESS_SPACE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// True if a fresh mapping can be placed at `addr` without replacing anything.
pub fn is_unmapped(addr: RegionAddr, len: usize) -> bool {
    Allocator::default()
        .alloc(
            len,
            Protection::NONE,
            MapMode::anon_private().fixed_noreplace(addr),
            None,
            0,
        )
        .is_ok()
}

pub fn rw() -> Protection {
    Protection::READ | Protection::WRITE
}
