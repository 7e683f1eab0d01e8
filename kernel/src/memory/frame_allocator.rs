use core::{mem, slice};

use crate::memory::{
    bitmap_frame_allocator::BitmapFrameAllocator, early_allocator::EarlyAllocator,
    error::FrameError,
};
use log::info;
use x86_64::{
    structures::paging::{FrameAllocator, FrameDeallocator, PhysFrame, Size4KiB},
    PhysAddr,
};

/// Physical memory manager, before and after the bitmap exists.
///
/// Starts out as `Early`, where only the placement allocator works and every
/// frame request fails, and becomes `Bitmap` for good after
/// [`PhysicalMemory::initialize`].
pub enum PhysicalMemory<'a> {
    Early(EarlyAllocator),
    Bitmap(BitmapFrameAllocator<'a>),
}

impl<'a> PhysicalMemory<'a> {
    pub const fn new(kernel_end: usize) -> Self {
        PhysicalMemory::Early(EarlyAllocator::new(kernel_end))
    }

    /// Carves the frame bitmap out of early memory and switches to it.
    ///
    /// The reserved boundary is the placement cursor read after the bitmap
    /// was placed, so the kernel image and the bitmap are both protected.
    ///
    /// # Safety
    /// Memory from the early cursor up to the size of the bitmap must be
    /// identity mapped, unused, and valid for `'a`.
    pub unsafe fn initialize(&mut self, memory_size: usize) -> Result<(), FrameError> {
        let early = match self {
            PhysicalMemory::Early(early) => early,
            PhysicalMemory::Bitmap(_) => return Err(FrameError::AlreadyInitialized),
        };

        let words = BitmapFrameAllocator::bitmap_entries(memory_size);
        let bitmap: &'a mut [u32] = if words == 0 {
            &mut []
        } else {
            let addr = early
                .allocate_aligned(words * mem::size_of::<u32>(), mem::align_of::<u32>())
                .ok_or(FrameError::BitmapStorage { words })?;
            // SAFETY: the caller guarantees the placed range is ours to use.
            unsafe { slice::from_raw_parts_mut(addr as *mut u32, words) }
        };

        let reserved_end = early.cursor();
        info!(
            "Physical memory: {} KiB, bitmap {} words, reserved up to {:#x}",
            memory_size / 1024,
            words,
            reserved_end
        );

        *self = PhysicalMemory::Bitmap(BitmapFrameAllocator::new(bitmap, memory_size, reserved_end));
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self, PhysicalMemory::Bitmap(_))
    }

    pub fn bitmap(&self) -> Option<&BitmapFrameAllocator<'a>> {
        match self {
            PhysicalMemory::Bitmap(bitmap) => Some(bitmap),
            PhysicalMemory::Early(_) => None,
        }
    }

    /// The placement allocator, until the bitmap takes over.
    pub fn early(&mut self) -> Option<&mut EarlyAllocator> {
        match self {
            PhysicalMemory::Early(early) => Some(early),
            PhysicalMemory::Bitmap(_) => None,
        }
    }

    pub fn allocate_frames(&mut self, count: usize) -> Option<PhysFrame> {
        match self {
            PhysicalMemory::Bitmap(bitmap) => bitmap.allocate_frames(count),
            PhysicalMemory::Early(_) => None,
        }
    }

    pub fn free_frame(&mut self, addr: PhysAddr) -> Result<(), FrameError> {
        self.with_bitmap(|bitmap| bitmap.free_frame(addr))
    }

    pub fn free_frames(&mut self, addr: PhysAddr, count: usize) -> Result<(), FrameError> {
        self.with_bitmap(|bitmap| bitmap.free_frames(addr, count))
    }

    pub fn reserve_frame(&mut self, addr: PhysAddr) -> Result<(), FrameError> {
        self.with_bitmap(|bitmap| bitmap.reserve_frame(addr))
    }

    pub fn reserve_range(&mut self, start: usize, end: usize) -> Result<usize, FrameError> {
        self.with_bitmap(|bitmap| Ok(bitmap.reserve_range(start, end)))
    }

    pub fn is_frame_free(&self, addr: PhysAddr) -> bool {
        self.bitmap().is_some_and(|bitmap| bitmap.is_frame_free(addr))
    }

    pub fn total_frames(&self) -> usize {
        self.bitmap().map_or(0, BitmapFrameAllocator::total_frames)
    }

    pub fn free_frame_count(&self) -> usize {
        self.bitmap().map_or(0, BitmapFrameAllocator::free_frame_count)
    }

    pub fn used_frames(&self) -> usize {
        self.bitmap().map_or(0, BitmapFrameAllocator::used_frames)
    }

    fn with_bitmap<F, R>(&mut self, f: F) -> Result<R, FrameError>
    where
        F: FnOnce(&mut BitmapFrameAllocator<'a>) -> Result<R, FrameError>,
    {
        match self {
            PhysicalMemory::Bitmap(bitmap) => f(bitmap),
            PhysicalMemory::Early(_) => Err(FrameError::Uninitialized),
        }
    }
}

unsafe impl FrameAllocator<Size4KiB> for PhysicalMemory<'_> {
    fn allocate_frame(&mut self) -> Option<PhysFrame<Size4KiB>> {
        match self {
            PhysicalMemory::Bitmap(bitmap) => bitmap.allocate_frame(),
            PhysicalMemory::Early(_) => None,
        }
    }
}

impl FrameDeallocator<Size4KiB> for PhysicalMemory<'_> {
    unsafe fn deallocate_frame(&mut self, frame: PhysFrame<Size4KiB>) {
        if let PhysicalMemory::Bitmap(bitmap) = self {
            unsafe { bitmap.deallocate_frame(frame) }
        }
    }
}
