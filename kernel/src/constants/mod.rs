//! System-wide constants and hardware-specific values.

pub mod graphics;
pub mod memory;
pub mod multiboot2;
pub mod ports;
pub mod timer;
