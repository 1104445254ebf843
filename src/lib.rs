//! Managed memory mappings.
//!
//! Pages come from the OS mapper (`mmap`) and are handed out as owned
//! [`MmapBuffer`]s that unmap exactly their own range once released. On top of
//! plain allocation the crate provides aligned allocation by over-mapping and
//! slicing, splitting of oversized mappings into independently released chunks,
//! and page-validated `msync` of dirty ranges.

#![cfg(unix)]

pub mod alloc;
pub mod config;
pub mod error;
pub mod sys;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use alloc::buffer::{MmapBuffer, SharedBuffer};
pub use alloc::chunked::ChunkSequence;
pub use alloc::sync::sync;
pub use alloc::{Allocation, Allocator};
pub use config::AllocatorConfig;
pub use error::{MapError, MmapError, MmapResult, RangeError};
pub use sys::{MapMode, Placement, Protection, RegionAddr, Sharing, SyncFlags, page_size};
