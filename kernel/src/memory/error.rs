use thiserror::Error;

/// Misuse of the physical frame allocator.
///
/// Every operation that returns one of these has left the bitmap untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame allocator is not initialized")]
    Uninitialized,
    #[error("frame allocator is already initialized")]
    AlreadyInitialized,
    #[error("no room for a {words}-word bitmap in early memory")]
    BitmapStorage { words: usize },
    #[error("address {0:#x} is outside physical memory")]
    OutOfRange(u64),
    #[error("frame at {0:#x} is already free")]
    DoubleFree(u64),
}
