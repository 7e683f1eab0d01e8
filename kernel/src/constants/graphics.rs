pub const REQUESTED_WIDTH: u32 = 1024;
pub const REQUESTED_HEIGHT: u32 = 768;
pub const REQUESTED_DEPTH: u32 = 32;

pub const BYTES_PER_PIXEL: usize = 4;

pub const PANIC_MARGIN: i64 = 80;
pub const PANIC_TITLE_BAR_HEIGHT: i64 = 28;
