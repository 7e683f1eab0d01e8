//! Early Allocator
//!
//! - Provides memory before the frame allocator is set up
//! - Hands out addresses from a single cursor that starts at the end of the
//!   kernel image and only ever moves up
//! - Nothing it returns is ever freed

/// Placement (bump) allocator used during bring-up.
///
/// * `kernel_end`: first byte after the loaded kernel image
/// * `cursor`: the next address to hand out
#[derive(Debug)]
pub struct EarlyAllocator {
    kernel_end: usize,
    cursor: usize,
}

impl EarlyAllocator {
    pub const fn new(kernel_end: usize) -> Self {
        EarlyAllocator {
            kernel_end,
            cursor: kernel_end,
        }
    }

    /// Hands out `size` bytes at the current cursor.
    ///
    /// # Returns
    /// `None` for a zero-sized request or if the cursor would wrap
    pub fn allocate(&mut self, size: usize) -> Option<usize> {
        if size == 0 {
            return None;
        }
        let addr = self.cursor;
        self.cursor = addr.checked_add(size)?;
        Some(addr)
    }

    /// Like [`Self::allocate`], but first rounds the cursor up to `align`.
    ///
    /// # Returns
    /// `None` for a zero-sized request, an alignment that is not a power of
    /// two, or if the cursor would wrap. The cursor is unchanged on `None`.
    pub fn allocate_aligned(&mut self, size: usize, align: usize) -> Option<usize> {
        if size == 0 || !align.is_power_of_two() {
            return None;
        }
        let addr = self.cursor.checked_next_multiple_of(align)?;
        self.cursor = addr.checked_add(size)?;
        Some(addr)
    }

    /// Address the next allocation will start at, before alignment.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn kernel_end(&self) -> usize {
        self.kernel_end
    }

    /// Bytes handed out so far, including alignment padding.
    pub fn used(&self) -> usize {
        self.cursor - self.kernel_end
    }
}
