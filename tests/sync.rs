mod common;

use common::{rw, serial};
use mmap_alloc::{
    Allocator, MapMode, MmapError, RangeError, SyncFlags, page_size, sync,
};
use std::fs::{self, OpenOptions};
use std::io::Write;

#[test]
fn sync_writes_back_to_file() {
    let _guard = serial();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.txt");
    fs::write(&path, "Hello World").unwrap();

    let file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
    // Only bytes inside the file's length reach the disk.
    file.set_len(23).unwrap();

    let allocator = Allocator::default();
    let mut buf = allocator
        .map_file(&file, page_size(), rw(), MapMode::new().shared(), 0)
        .unwrap()
        .into_single()
        .unwrap();
    drop(file);

    buf[11..23].copy_from_slice(b"! Greetings.");
    allocator.sync(&buf, 0, Some(23), SyncFlags::SYNC).unwrap();
    assert_eq!(&buf[..23], b"Hello World! Greetings.");
    drop(buf);

    assert_eq!(fs::read_to_string(&path).unwrap(), "Hello World! Greetings.");
}

#[test]
fn sync_at_page_offset_of_large_file() {
    let _guard = serial();
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&vec![b'.'; 3 * page_size()]).unwrap();

    let mut buf = Allocator::default()
        .map_file(&file, 3 * page_size(), rw(), MapMode::new().shared(), 0)
        .unwrap()
        .into_single()
        .unwrap();

    buf[2 * page_size()] = b'#';
    sync(&buf, 2 * page_size(), None, SyncFlags::ASYNC | SyncFlags::INVALIDATE).unwrap();
    buf.flush().unwrap();
}

#[test]
fn sync_validates_offsets() {
    let _guard = serial();
    let buf = Allocator::default()
        .alloc_anonymous(2 * page_size(), rw())
        .unwrap()
        .into_single()
        .unwrap();

    let err = sync(&buf, 2 * page_size(), None, SyncFlags::SYNC).unwrap_err();
    assert!(matches!(
        err,
        MmapError::Range(RangeError::OffsetOutOfBounds { .. })
    ));

    let err = sync(&buf, 100, None, SyncFlags::SYNC).unwrap_err();
    assert!(matches!(
        err,
        MmapError::Range(RangeError::MisalignedOffset { offset: 100, .. })
    ));

    // Oversized lengths clamp instead of failing.
    sync(&buf, page_size(), Some(usize::MAX), SyncFlags::SYNC).unwrap();
    sync(&buf, 0, Some(0), SyncFlags::SYNC).unwrap();
}
