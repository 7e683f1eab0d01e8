//! Hardware the kernel drives directly: COM1, the PIT and the loader's
//! linear framebuffer.

pub mod display;
pub mod serial;
pub mod timer;
