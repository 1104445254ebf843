use mmap_alloc::{Allocation, Allocator, AllocatorConfig, MmapResult, Protection, page_size};

fn main() -> MmapResult<()> {
    let max_chunk = 16 * page_size();
    let allocator = Allocator::new(AllocatorConfig::new().max_chunk(max_chunk))?;

    let len = 3 * max_chunk + 1234;
    println!("--- Chunked Allocation ---");
    println!("Requesting {len} bytes with max_chunk = {max_chunk}");

    match allocator.alloc_anonymous(len, Protection::READ | Protection::WRITE)? {
        Allocation::Single(buf) => println!("  single buffer of {} bytes", buf.len()),
        Allocation::Chunked(seq) => {
            for (i, chunk) in seq.iter().enumerate() {
                println!("  chunk {i}: {} (+{} bytes)", chunk.addr(), chunk.len());
            }
            println!("  total: {} bytes in {} chunks", seq.total_len(), seq.len());

            // Release from the back; each chunk unmaps only its own range.
            let mut chunks = seq.into_vec();
            while let Some(chunk) = chunks.pop() {
                let addr = chunk.addr();
                chunk.unmap()?;
                println!("  released {addr}");
            }
        }
    }

    Ok(())
}
