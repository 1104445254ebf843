//! Raw OS mapping calls and the flag tables that feed them.

pub mod consts;
pub mod flags;
pub mod mapper;

pub use consts::page_size;
pub use flags::{MapMode, Placement, Protection, Sharing, SyncFlags};
pub use mapper::{MappedRegion, RegionAddr};
