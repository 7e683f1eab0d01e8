//! Physical memory management.
//!
//! Bring-up starts with an [`EarlyAllocator`] bumping upward from the end of
//! the kernel image. Once the memory size is known, [`PhysicalMemory`]
//! places a frame bitmap in early memory and hands out 4 KiB frames from
//! then on.

pub mod bitmap_frame_allocator;
pub mod early_allocator;
pub mod error;
pub mod frame_allocator;

pub use bitmap_frame_allocator::BitmapFrameAllocator;
pub use early_allocator::EarlyAllocator;
pub use error::FrameError;
pub use frame_allocator::PhysicalMemory;
