/// Value a Multiboot2 loader leaves in EAX.
pub const BOOTLOADER_MAGIC: u32 = 0x36D7_6289;

/// Header magic the loader searches for in the kernel image.
pub const HEADER_MAGIC: u32 = 0xE852_50D6;
pub const HEADER_ARCHITECTURE_I386: u32 = 0;

pub const HEADER_TAG_END: u16 = 0;
pub const HEADER_TAG_FRAMEBUFFER: u16 = 5;

pub const TAG_ALIGN: usize = 8;
/// Size of the fixed `total_size`/`reserved` prefix of the info blob.
pub const INFO_HEADER_SIZE: usize = 8;
pub const TAG_HEADER_SIZE: usize = 8;
