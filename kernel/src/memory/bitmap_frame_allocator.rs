//! Bitmap Frame Allocator
//!
//! - One bit per 4 KiB physical frame: 0 = free, 1 = used or reserved
//! - First-fit single and contiguous allocation
//! - The cached free count moves in the same step as every bit

use crate::{
    constants::memory::{BITMAP_ENTRY_SIZE, FRAME_SIZE, FULL_BITMAP_ENTRY, LOW_MEMORY_END},
    memory::error::FrameError,
};
use log::debug;
use x86_64::{
    structures::paging::{FrameAllocator, FrameDeallocator, PhysFrame, Size4KiB},
    PhysAddr,
};

/// Tracks every frame of physical memory in a caller-provided bitmap.
///
/// * `total_frames`: frames covered; bits past this index are never touched
/// * `free_frames`: frames currently clear in the bitmap
/// * `reserved_end`: end of the kernel image and bitmap reservation
/// * `bitmap`: backing words, bit `i % 32` of word `i / 32` is frame `i`
pub struct BitmapFrameAllocator<'a> {
    total_frames: usize,
    free_frames: usize,
    reserved_end: usize,
    bitmap: &'a mut [u32],
}

impl<'a> BitmapFrameAllocator<'a> {
    /// Number of bitmap words needed to cover `memory_size` bytes.
    pub const fn bitmap_entries(memory_size: usize) -> usize {
        (memory_size / FRAME_SIZE).div_ceil(BITMAP_ENTRY_SIZE)
    }

    /// Builds an allocator over `memory_size` bytes of physical memory.
    ///
    /// Everything below 1 MiB and everything in `[1 MiB, reserved_end)` is
    /// reserved before the allocator is returned. `reserved_end` must cover
    /// the kernel image and `bitmap` itself.
    ///
    /// If `bitmap` is shorter than [`Self::bitmap_entries`] the allocator
    /// only manages the frames the bitmap can describe.
    pub fn new(bitmap: &'a mut [u32], memory_size: usize, reserved_end: usize) -> Self {
        let total_frames = (memory_size / FRAME_SIZE).min(bitmap.len() * BITMAP_ENTRY_SIZE);
        bitmap.fill(0);

        let mut allocator = Self {
            total_frames,
            free_frames: total_frames,
            reserved_end,
            bitmap,
        };

        let low = allocator.reserve_range(0, LOW_MEMORY_END);
        let image = allocator.reserve_range(LOW_MEMORY_END, reserved_end);

        debug!(
            "Frame bitmap: {} frames in {} words, reserved {} low + {} image",
            total_frames,
            allocator.bitmap.len(),
            low,
            image
        );

        allocator
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    /// Address up to which construction reserved memory above 1 MiB.
    pub fn reserved_end(&self) -> usize {
        self.reserved_end
    }

    pub fn free_frame_count(&self) -> usize {
        self.free_frames
    }

    pub fn used_frames(&self) -> usize {
        self.total_frames - self.free_frames
    }

    pub fn total_memory(&self) -> usize {
        self.total_frames * FRAME_SIZE
    }

    pub fn free_memory(&self) -> usize {
        self.free_frames * FRAME_SIZE
    }

    pub fn used_memory(&self) -> usize {
        self.used_frames() * FRAME_SIZE
    }

    /// Allocates `count` physically contiguous frames, first fit from frame 0.
    ///
    /// # Returns
    /// The first frame of the run, or `None` if `count` is 0 or no run of
    /// that length exists. The bitmap is unchanged on `None`.
    pub fn allocate_frames(&mut self, count: usize) -> Option<PhysFrame> {
        if count == 0 || count > self.free_frames {
            return None;
        }

        let mut run_start = 0;
        let mut run_len = 0;
        let mut frame_index = 0;

        while frame_index < self.total_frames {
            if frame_index % BITMAP_ENTRY_SIZE == 0
                && self.bitmap[frame_index / BITMAP_ENTRY_SIZE] == FULL_BITMAP_ENTRY
            {
                frame_index += BITMAP_ENTRY_SIZE;
                run_start = frame_index;
                run_len = 0;
                continue;
            }

            if self.is_bit_set(frame_index) {
                run_start = frame_index + 1;
                run_len = 0;
            } else {
                run_len += 1;
                if run_len == count {
                    for index in run_start..run_start + count {
                        self.set_bit(index);
                    }
                    return Some(frame_at(run_start));
                }
            }
            frame_index += 1;
        }

        None
    }

    /// Returns a frame to the pool.
    ///
    /// Freeing a frame that is already free, or one past the end of memory,
    /// changes nothing and reports the misuse.
    pub fn free_frame(&mut self, addr: PhysAddr) -> Result<(), FrameError> {
        let frame_index = self.frame_index(addr)?;
        if self.clear_bit(frame_index) {
            Ok(())
        } else {
            Err(FrameError::DoubleFree(addr.as_u64()))
        }
    }

    /// Frees `count` frames starting at `addr`.
    ///
    /// Every frame inside memory is processed; the first misuse encountered
    /// is returned. Frames past the end of memory count as one misuse.
    pub fn free_frames(&mut self, addr: PhysAddr, count: usize) -> Result<(), FrameError> {
        let frame_size = FRAME_SIZE as u64;
        let in_range = (self.total_frames as u64)
            .saturating_sub(addr.as_u64() / frame_size)
            .min(count as u64);

        let mut result = Ok(());
        for i in 0..in_range {
            let freed = self.free_frame(addr + i * frame_size);
            if result.is_ok() {
                result = freed;
            }
        }
        if result.is_ok() && in_range < count as u64 {
            result = Err(FrameError::OutOfRange(
                addr.as_u64().saturating_add(in_range * frame_size),
            ));
        }
        result
    }

    /// Marks the frame containing `addr` as used. Reserving a used frame is
    /// a no-op.
    pub fn reserve_frame(&mut self, addr: PhysAddr) -> Result<(), FrameError> {
        let frame_index = self.frame_index(addr)?;
        self.set_bit(frame_index);
        Ok(())
    }

    /// Marks every frame overlapping `[start, end)` as used, clamped to the
    /// end of memory.
    ///
    /// # Returns
    /// How many frames went from free to used
    pub fn reserve_range(&mut self, start: usize, end: usize) -> usize {
        let first = start / FRAME_SIZE;
        let last = end.div_ceil(FRAME_SIZE).min(self.total_frames);

        (first..last)
            .filter(|&frame_index| self.set_bit(frame_index))
            .count()
    }

    /// `false` for used frames and for addresses past the end of memory.
    pub fn is_frame_free(&self, addr: PhysAddr) -> bool {
        self.frame_index(addr)
            .is_ok_and(|frame_index| !self.is_bit_set(frame_index))
    }

    fn frame_index(&self, addr: PhysAddr) -> Result<usize, FrameError> {
        usize::try_from(addr.as_u64() / FRAME_SIZE as u64)
            .ok()
            .filter(|&frame_index| frame_index < self.total_frames)
            .ok_or(FrameError::OutOfRange(addr.as_u64()))
    }

    /// Set a bit (used). Returns whether it was previously clear.
    fn set_bit(&mut self, frame_index: usize) -> bool {
        debug_assert!(frame_index < self.total_frames);

        let entry = &mut self.bitmap[frame_index / BITMAP_ENTRY_SIZE];
        let mask = 1 << (frame_index % BITMAP_ENTRY_SIZE);
        if *entry & mask != 0 {
            return false;
        }
        *entry |= mask;
        self.free_frames -= 1;
        true
    }

    /// Clear a bit (free). Returns whether it was previously set.
    fn clear_bit(&mut self, frame_index: usize) -> bool {
        debug_assert!(frame_index < self.total_frames);

        let entry = &mut self.bitmap[frame_index / BITMAP_ENTRY_SIZE];
        let mask = 1 << (frame_index % BITMAP_ENTRY_SIZE);
        if *entry & mask == 0 {
            return false;
        }
        *entry &= !mask;
        self.free_frames += 1;
        true
    }

    fn is_bit_set(&self, frame_index: usize) -> bool {
        let mask = 1 << (frame_index % BITMAP_ENTRY_SIZE);
        self.bitmap[frame_index / BITMAP_ENTRY_SIZE] & mask != 0
    }
}

fn frame_at(frame_index: usize) -> PhysFrame {
    PhysFrame::containing_address(PhysAddr::new((frame_index * FRAME_SIZE) as u64))
}

unsafe impl FrameAllocator<Size4KiB> for BitmapFrameAllocator<'_> {
    /// First free frame, skipping fully used bitmap words.
    fn allocate_frame(&mut self) -> Option<PhysFrame> {
        if self.free_frames == 0 {
            return None;
        }

        let (entry_index, entry) = self
            .bitmap
            .iter()
            .copied()
            .enumerate()
            .find(|&(_, entry)| entry != FULL_BITMAP_ENTRY)?;

        let frame_index = entry_index * BITMAP_ENTRY_SIZE + (!entry).trailing_zeros() as usize;
        if frame_index >= self.total_frames {
            return None;
        }

        self.set_bit(frame_index);
        Some(frame_at(frame_index))
    }
}

impl FrameDeallocator<Size4KiB> for BitmapFrameAllocator<'_> {
    unsafe fn deallocate_frame(&mut self, frame: PhysFrame<Size4KiB>) {
        // Double frees and foreign frames leave the bitmap as it was.
        let _ = self.free_frame(frame.start_address());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: usize = 1024 * 1024;

    fn storage(memory_size: usize) -> Vec<u32> {
        vec![0xDEAD_BEEF; BitmapFrameAllocator::bitmap_entries(memory_size)]
    }

    fn addr(frame_index: usize) -> PhysAddr {
        PhysAddr::new((frame_index * FRAME_SIZE) as u64)
    }

    fn index_of(frame: PhysFrame) -> usize {
        frame.start_address().as_u64() as usize / FRAME_SIZE
    }

    /// Frees the frames an allocator reserved at construction so tests can
    /// place used frames exactly.
    fn unreserved(bitmap: &mut [u32], memory_size: usize) -> BitmapFrameAllocator<'_> {
        let mut allocator = BitmapFrameAllocator::new(bitmap, memory_size, 0);
        allocator
            .free_frames(PhysAddr::new(0), LOW_MEMORY_END / FRAME_SIZE)
            .unwrap();
        allocator
    }

    fn assert_conserved(allocator: &BitmapFrameAllocator) {
        let used = (0..allocator.total_frames())
            .filter(|&i| !allocator.is_frame_free(addr(i)))
            .count();
        assert_eq!(allocator.free_frame_count() + used, allocator.total_frames());
    }

    #[test]
    fn bitmap_sizing() {
        assert_eq!(BitmapFrameAllocator::bitmap_entries(0), 0);
        assert_eq!(BitmapFrameAllocator::bitmap_entries(4095), 0);
        assert_eq!(BitmapFrameAllocator::bitmap_entries(4096), 1);
        assert_eq!(BitmapFrameAllocator::bitmap_entries(32 * 4096), 1);
        assert_eq!(BitmapFrameAllocator::bitmap_entries(33 * 4096), 2);
        assert_eq!(BitmapFrameAllocator::bitmap_entries(16 * MIB), 128);
    }

    #[test]
    fn sixteen_mib_with_two_mib_reserved() {
        let mut bitmap = storage(16 * MIB);
        let mut allocator = BitmapFrameAllocator::new(&mut bitmap, 16 * MIB, 2 * MIB);

        assert_eq!(allocator.total_frames(), 4096);
        assert_eq!(allocator.free_frame_count(), 3584);
        assert_eq!(allocator.used_memory(), 2 * MIB);
        assert_eq!(allocator.free_memory(), 14 * MIB);

        let frame = allocator.allocate_frame().unwrap();
        assert_eq!(frame.start_address().as_u64(), 0x20_0000);
        assert_conserved(&allocator);
    }

    #[test]
    fn everything_below_reserved_end_is_used() {
        let reserved_end = 0x12_3456;
        let mut bitmap = storage(8 * MIB);
        let allocator = BitmapFrameAllocator::new(&mut bitmap, 8 * MIB, reserved_end);

        for frame_index in 0..reserved_end.div_ceil(FRAME_SIZE) {
            assert!(!allocator.is_frame_free(addr(frame_index)));
        }
        assert!(allocator.is_frame_free(addr(reserved_end.div_ceil(FRAME_SIZE))));
        assert_conserved(&allocator);
    }

    #[test]
    fn reserved_end_is_kept() {
        let mut bitmap = storage(4 * MIB);
        let allocator = BitmapFrameAllocator::new(&mut bitmap, 4 * MIB, 0x12_3456);
        assert_eq!(allocator.reserved_end(), 0x12_3456);
    }

    #[test]
    fn low_memory_is_reserved_even_with_small_reserved_end() {
        let mut bitmap = storage(4 * MIB);
        let allocator = BitmapFrameAllocator::new(&mut bitmap, 4 * MIB, 0x1000);

        assert_eq!(allocator.free_frame_count(), 768);
        assert!(!allocator.is_frame_free(PhysAddr::new(0xF_F000)));
        assert!(allocator.is_frame_free(PhysAddr::new(0x10_0000)));
    }

    #[test]
    fn first_fit_after_used_frames() {
        let mut bitmap = storage(MIB);
        let mut allocator = unreserved(&mut bitmap, MIB);
        for i in 0..3 {
            allocator.reserve_frame(addr(i)).unwrap();
        }

        assert_eq!(index_of(allocator.allocate_frame().unwrap()), 3);
        assert_eq!(index_of(allocator.allocate_frame().unwrap()), 4);
        assert_conserved(&allocator);
    }

    #[test]
    fn first_fit_skips_full_words() {
        let mut bitmap = storage(MIB);
        let mut allocator = unreserved(&mut bitmap, MIB);
        allocator.reserve_range(0, 70 * FRAME_SIZE);

        assert_eq!(index_of(allocator.allocate_frame().unwrap()), 70);
    }

    #[test]
    fn contiguous_run_before_used_frame() {
        let mut bitmap = storage(MIB);
        let mut allocator = unreserved(&mut bitmap, MIB);
        allocator.reserve_frame(addr(5)).unwrap();

        let frame = allocator.allocate_frames(4).unwrap();
        assert_eq!(index_of(frame), 0);
        for i in 0..4 {
            assert!(!allocator.is_frame_free(addr(i)));
        }
        assert!(allocator.is_frame_free(addr(4)));
        assert_eq!(allocator.free_frame_count(), 256 - 5);
        assert_conserved(&allocator);
    }

    #[test]
    fn contiguous_run_continues_past_gap_that_is_too_small() {
        let mut bitmap = storage(MIB);
        let mut allocator = unreserved(&mut bitmap, MIB);
        allocator.reserve_frame(addr(3)).unwrap();

        assert_eq!(index_of(allocator.allocate_frames(4).unwrap()), 4);
        assert_eq!(index_of(allocator.allocate_frames(3).unwrap()), 0);
        assert_eq!(index_of(allocator.allocate_frame().unwrap()), 8);
        assert_conserved(&allocator);
    }

    #[test]
    fn contiguous_run_spanning_bitmap_words() {
        let mut bitmap = storage(MIB);
        let mut allocator = unreserved(&mut bitmap, MIB);
        allocator.reserve_range(0, 30 * FRAME_SIZE);
        allocator.reserve_range(32 * FRAME_SIZE, 64 * FRAME_SIZE);

        // Frames 30 and 31 are too few; the full second word is skipped.
        let frame = allocator.allocate_frames(40).unwrap();
        assert_eq!(index_of(frame), 64);
        assert_conserved(&allocator);
    }

    #[test]
    fn zero_or_oversized_runs_are_refused() {
        let mut bitmap = storage(MIB);
        let mut allocator = unreserved(&mut bitmap, MIB);
        allocator.reserve_frame(addr(128)).unwrap();

        assert!(allocator.allocate_frames(0).is_none());
        assert!(allocator.allocate_frames(256).is_none());
        // Enough frames in total, but no run is long enough.
        assert!(allocator.allocate_frames(200).is_none());
        assert_eq!(allocator.free_frame_count(), 255);
    }

    #[test]
    fn no_frame_is_handed_out_twice() {
        let mut bitmap = storage(2 * MIB);
        let mut allocator = BitmapFrameAllocator::new(&mut bitmap, 2 * MIB, 0);
        let mut seen = Vec::new();

        while let Some(frame) = allocator.allocate_frame() {
            assert!(!seen.contains(&frame));
            seen.push(frame);
        }
        assert_eq!(seen.len(), 256);
        assert_eq!(allocator.free_frame_count(), 0);
    }

    #[test]
    fn exhaustion_leaves_bitmap_unchanged() {
        let mut bitmap = storage(MIB + 8 * FRAME_SIZE);
        let mut allocator = BitmapFrameAllocator::new(&mut bitmap, MIB + 8 * FRAME_SIZE, 0);
        assert_eq!(allocator.allocate_frames(8).map(index_of), Some(256));

        let before = allocator.bitmap.to_vec();
        assert!(allocator.allocate_frame().is_none());
        assert!(allocator.allocate_frames(1).is_none());
        assert_eq!(allocator.bitmap.to_vec(), before);
        assert_eq!(allocator.free_frame_count(), 0);
    }

    #[test]
    fn free_is_idempotent() {
        let mut bitmap = storage(2 * MIB);
        let mut allocator = BitmapFrameAllocator::new(&mut bitmap, 2 * MIB, 0);
        let frame = allocator.allocate_frame().unwrap();
        let free = allocator.free_frame_count();

        assert_eq!(allocator.free_frame(frame.start_address()), Ok(()));
        assert_eq!(allocator.free_frame_count(), free + 1);
        assert_eq!(
            allocator.free_frame(frame.start_address()),
            Err(FrameError::DoubleFree(0x10_0000))
        );
        assert_eq!(allocator.free_frame_count(), free + 1);
        assert_conserved(&allocator);
    }

    #[test]
    fn out_of_range_requests_are_ignored() {
        let mut bitmap = storage(2 * MIB);
        let mut allocator = BitmapFrameAllocator::new(&mut bitmap, 2 * MIB, 0);
        let free = allocator.free_frame_count();
        let past_end = PhysAddr::new(2 * MIB as u64);

        assert_eq!(
            allocator.free_frame(past_end),
            Err(FrameError::OutOfRange(0x20_0000))
        );
        assert_eq!(
            allocator.reserve_frame(past_end),
            Err(FrameError::OutOfRange(0x20_0000))
        );
        assert!(!allocator.is_frame_free(past_end));
        assert_eq!(allocator.reserve_range(MIB, 64 * MIB), 256);
        assert_eq!(allocator.free_frame_count(), free - 256);
    }

    #[test]
    fn free_frames_reports_first_misuse_but_frees_the_rest() {
        let mut bitmap = storage(2 * MIB);
        let mut allocator = BitmapFrameAllocator::new(&mut bitmap, 2 * MIB, 0);
        let run = allocator.allocate_frames(4).unwrap().start_address();
        allocator.free_frame(run + FRAME_SIZE as u64).unwrap();
        let free = allocator.free_frame_count();

        assert_eq!(
            allocator.free_frames(run, 4),
            Err(FrameError::DoubleFree(run.as_u64() + FRAME_SIZE as u64))
        );
        assert_eq!(allocator.free_frame_count(), free + 3);
        assert_conserved(&allocator);
    }

    #[test]
    fn free_frames_stops_at_end_of_memory() {
        let mut bitmap = storage(2 * MIB);
        let mut allocator = BitmapFrameAllocator::new(&mut bitmap, 2 * MIB, 0);
        let run = allocator.allocate_frames(256).unwrap().start_address();
        let last = run + 254 * FRAME_SIZE as u64;
        let free = allocator.free_frame_count();

        assert_eq!(
            allocator.free_frames(last, usize::MAX),
            Err(FrameError::OutOfRange(2 * MIB as u64))
        );
        assert_eq!(allocator.free_frame_count(), free + 2);
        assert!(allocator.is_frame_free(last));

        let past_end = PhysAddr::new(64 * MIB as u64);
        assert_eq!(
            allocator.free_frames(past_end, usize::MAX),
            Err(FrameError::OutOfRange(64 * MIB as u64))
        );
        assert_conserved(&allocator);
    }

    #[test]
    fn reserving_counts_only_newly_used_frames() {
        let mut bitmap = storage(2 * MIB);
        let mut allocator = BitmapFrameAllocator::new(&mut bitmap, 2 * MIB, 0);
        let free = allocator.free_frame_count();

        assert_eq!(allocator.reserve_range(MIB, MIB + 3 * FRAME_SIZE), 3);
        assert_eq!(allocator.reserve_range(MIB, MIB + 5 * FRAME_SIZE), 2);
        assert_eq!(allocator.reserve_frame(PhysAddr::new(MIB as u64)), Ok(()));
        assert_eq!(allocator.free_frame_count(), free - 5);
        assert_conserved(&allocator);
    }

    #[test]
    fn deallocate_via_trait() {
        let mut bitmap = storage(2 * MIB);
        let mut allocator = BitmapFrameAllocator::new(&mut bitmap, 2 * MIB, 0);
        let frame = allocator.allocate_frame().unwrap();

        unsafe {
            allocator.deallocate_frame(frame);
            allocator.deallocate_frame(frame);
        }
        assert!(allocator.is_frame_free(frame.start_address()));
        assert_eq!(allocator.free_frame_count(), 256);
    }

    #[test]
    fn short_bitmap_limits_managed_memory() {
        let mut bitmap = vec![0u32; 4];
        let allocator = BitmapFrameAllocator::new(&mut bitmap, 16 * MIB, 0);
        assert_eq!(allocator.total_frames(), 128);
        assert_eq!(allocator.free_frame_count(), 0);
    }

    #[test]
    fn tail_bits_of_last_word_are_never_allocated() {
        let memory_size = MIB + 3 * FRAME_SIZE;
        let mut bitmap = storage(memory_size);
        let mut allocator = BitmapFrameAllocator::new(&mut bitmap, memory_size, 0);

        assert_eq!(allocator.total_frames(), 259);
        for expected in 256..259 {
            assert_eq!(index_of(allocator.allocate_frame().unwrap()), expected);
        }
        assert!(allocator.allocate_frame().is_none());
        assert!(allocator.allocate_frames(1).is_none());
    }
}
