/// Input clock of the 8253/8254 PIT in Hz.
pub const PIT_FREQUENCY: u32 = 1_193_182;
pub const PIT_TICKS_PER_MS: u32 = 1193;

/// Channel 0, lobyte/hibyte access, mode 2 (rate generator), binary.
pub const PIT_RATE_GENERATOR: u8 = 0x34;
/// Channel 0 counter latch.
pub const PIT_LATCH: u8 = 0x00;
pub const PIT_RELOAD: u16 = 0xFFFF;
