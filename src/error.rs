use std::io;
use thiserror::Error;

/// Failure to establish a mapping.
#[derive(Error, Debug)]
pub enum MapError {
    #[error("Mapping length must be greater than zero")]
    ZeroLength,

    #[error("Anonymous mappings are not supported on this host")]
    AnonymousUnsupported,

    #[error("mmap() call failed: {0}")]
    SyscallFailed(#[source] io::Error),
}

impl MapError {
    /// The OS error code, if the failure came from the kernel.
    #[must_use]
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::SyscallFailed(e) => e.raw_os_error(),
            _ => None,
        }
    }
}

/// Caller-supplied sync parameters that fall outside the buffer or off a page boundary.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    #[error("Offset {offset} is out of bounds for a buffer of {len} bytes")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("Offset {offset} is not a multiple of the page size ({page_size})")]
    MisalignedOffset { offset: usize, page_size: usize },
}

#[derive(Error, Debug)]
pub enum MmapError {
    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("System call failed: {0}")]
    Syscall(#[source] io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Requested {requested} bytes exceeds the single buffer capacity of {capacity}")]
    ExceedsCapacity { requested: usize, capacity: usize },

    #[error("Invalid allocator configuration: {0}")]
    InvalidConfig(String),
}

impl MmapError {
    /// The OS error code carried by a syscall failure, if any.
    #[must_use]
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Map(e) => e.errno(),
            Self::Syscall(e) => e.raw_os_error(),
            _ => None,
        }
    }
}

// A convenient alias
pub type MmapResult<T> = Result<T, MmapError>;
