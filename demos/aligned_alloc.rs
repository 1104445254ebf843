use mmap_alloc::{Allocator, MapMode, MmapResult, Protection, page_size};

fn main() -> MmapResult<()> {
    let allocator = Allocator::default();
    let prot = Protection::READ | Protection::WRITE;

    println!("--- Aligned Allocation ---");
    println!("Page size: {} bytes", page_size());

    for alignment in [page_size(), 64 * 1024, 1024 * 1024, 2 * 1024 * 1024] {
        let mut buf =
            allocator.aligned_alloc(page_size(), prot, MapMode::anon_private(), None, 0, alignment)?;
        buf[0] = 0xAA;

        println!(
            "  align {:>8} -> {} (mapping at {}, {} bytes, slice: {})",
            alignment,
            buf.addr(),
            buf.mapped_addr(),
            buf.mapped_len(),
            buf.is_slice()
        );
    }

    Ok(())
}
