use mmap_alloc::sys::consts::{ANONYMOUS_SUPPORTED, constant_table};

fn main() {
    println!("--- Host Mapping Constants ---");
    for constant in constant_table() {
        println!("  {:<20} {:#x}", constant.name, constant.value);
    }

    if !ANONYMOUS_SUPPORTED {
        println!("\n  WARNING: MAP_ANON is 0 on this host; anonymous mappings are unavailable.");
    }
}
