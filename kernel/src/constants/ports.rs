//! I/O port definitions.

/// Base I/O port address for the first serial port (COM1).
pub const SERIAL_PORT: u16 = 0x3F8;

/// PIT channel 0 data port.
pub const PIT_CHANNEL0: u16 = 0x40;
/// PIT mode/command register.
pub const PIT_COMMAND: u16 = 0x43;
