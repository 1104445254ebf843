use crate::error::{MmapError, MmapResult};
use crate::sys::consts::page_size;
use crate::utils::is_multiple_of;

/// Largest single buffer handed out by default (1 GiB).
pub const DEFAULT_MAX_CHUNK: usize = 1 << 30;

/// Allocator tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorConfig {
    /// Maximum length of one buffer. Larger mappings are split into chunks of
    /// this size. Must be a non-zero multiple of the page size, since every
    /// chunk is unmapped on its own and `munmap` needs a page-aligned start.
    pub max_chunk: usize,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            max_chunk: DEFAULT_MAX_CHUNK,
        }
    }
}

impl AllocatorConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn max_chunk(mut self, max_chunk: usize) -> Self {
        self.max_chunk = max_chunk;
        self
    }

    /// # Errors
    /// Returns `MmapError::InvalidConfig` if `max_chunk` is zero or not page aligned.
    pub fn validate(&self) -> MmapResult<()> {
        let page = page_size();
        if !is_multiple_of(self.max_chunk, page) || self.max_chunk == 0 {
            return Err(MmapError::InvalidConfig(format!(
                "max_chunk ({}) must be a non-zero multiple of the page size ({page})",
                self.max_chunk
            )));
        }
        Ok(())
    }
}
