pub const FRAME_SIZE: usize = 4096;

/// Conventional memory, BIOS data and legacy MMIO live below this boundary.
pub const LOW_MEMORY_END: usize = 0x10_0000;

pub const BITMAP_ENTRY_SIZE: usize = 32;
pub const FULL_BITMAP_ENTRY: u32 = 0xFFFF_FFFF;

pub const BOOT_STACK_SIZE: usize = 16 * 1024;
