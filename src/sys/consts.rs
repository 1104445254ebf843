#![allow(clippy::cast_sign_loss)]

use std::sync::LazyLock;

// Protection bits
pub const PROT_NONE: i32 = libc::PROT_NONE;
pub const PROT_READ: i32 = libc::PROT_READ;
pub const PROT_WRITE: i32 = libc::PROT_WRITE;
pub const PROT_EXEC: i32 = libc::PROT_EXEC;

// Mapping mode bits
pub const MAP_ANON: i32 = libc::MAP_ANON;
pub const MAP_PRIVATE: i32 = libc::MAP_PRIVATE;
pub const MAP_SHARED: i32 = libc::MAP_SHARED;
pub const MAP_FIXED: i32 = libc::MAP_FIXED;

/// Whether this host has a distinct, non-zero flag for anonymous mappings.
///
/// Callers passing raw flags must check this before relying on `MAP_ANON`;
/// a zero value would otherwise silently request a file-backed mapping.
pub const ANONYMOUS_SUPPORTED: bool = MAP_ANON != 0;

// msync() bits
pub const MS_ASYNC: i32 = libc::MS_ASYNC;
pub const MS_SYNC: i32 = libc::MS_SYNC;
pub const MS_INVALIDATE: i32 = libc::MS_INVALIDATE;

const FALLBACK_PAGE_SIZE: usize = 4096;

static PAGE_SIZE: LazyLock<usize> = LazyLock::new(|| {
    let ret = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if ret > 0 {
        ret as usize
    } else {
        log::warn!("sysconf(_SC_PAGESIZE) failed, assuming {FALLBACK_PAGE_SIZE} bytes");
        FALLBACK_PAGE_SIZE
    }
});

/// The host page size, queried on first use and fixed for the life of the process.
#[must_use]
pub fn page_size() -> usize {
    *PAGE_SIZE
}

/// A named numeric constant advertised to an embedding host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constant {
    pub name: &'static str,
    pub value: i64,
}

/// The full constant surface, in the order a host layer would publish it.
#[must_use]
pub fn constant_table() -> Vec<Constant> {
    let c = |name, value: i32| Constant {
        name,
        value: i64::from(value),
    };

    vec![
        c("PROT_NONE", PROT_NONE),
        c("PROT_READ", PROT_READ),
        c("PROT_WRITE", PROT_WRITE),
        c("PROT_EXEC", PROT_EXEC),
        c("MAP_ANON", MAP_ANON),
        c("MAP_PRIVATE", MAP_PRIVATE),
        c("MAP_SHARED", MAP_SHARED),
        c("MAP_FIXED", MAP_FIXED),
        c("MAP_ANON_SUPPORTED", i32::from(ANONYMOUS_SUPPORTED)),
        c("MS_ASYNC", MS_ASYNC),
        c("MS_SYNC", MS_SYNC),
        c("MS_INVALIDATE", MS_INVALIDATE),
        Constant {
            name: "PAGE_SIZE",
            value: page_size() as i64,
        },
    ]
}
