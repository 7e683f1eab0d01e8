//! Multiboot2 boot information reader.
//!
//! The loader passes a pointer to a blob made of an 8-byte header
//! (`total_size`, `reserved`) followed by 8-byte aligned tags, each
//! starting with `{type: u32, size: u32}`. Everything here borrows from
//! the blob; nothing is copied or allocated.

mod framebuffer;
mod memory_map;
mod tags;

#[cfg(test)]
pub(crate) mod testing;

use core::{ffi::CStr, marker::PhantomData, ptr};

use crate::constants::multiboot2::{BOOTLOADER_MAGIC, INFO_HEADER_SIZE};

pub use framebuffer::{FramebufferTag, FramebufferType};
pub use memory_map::{
    BasicMemoryInfo, MemoryArea, MemoryAreaIter, MemoryAreaType, MemoryMapTag, UnavailableRanges,
};
pub use tags::{Tag, TagIter, TagType};

/// Checks the value the loader left in EAX.
pub const fn is_valid(magic: u32) -> bool {
    magic == BOOTLOADER_MAGIC
}

/// Handle to the boot information blob.
#[derive(Clone, Copy)]
pub struct BootInformation<'a> {
    start: *const u8,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> BootInformation<'a> {
    /// # Safety
    ///
    /// `addr` must point to an 8-byte aligned Multiboot2 information blob
    /// whose tag sequence is terminated by an End tag, and the blob must
    /// stay mapped and unmodified for `'a`. Tag walking trusts the End tag
    /// alone and does not check against `total_size`.
    pub unsafe fn load(addr: usize) -> Self {
        BootInformation {
            start: addr as *const u8,
            _marker: PhantomData,
        }
    }

    pub fn start_address(&self) -> usize {
        self.start as usize
    }

    pub fn total_size(&self) -> u32 {
        // SAFETY: the header is part of the blob `load` was given.
        unsafe { ptr::read_unaligned(self.start as *const u32) }
    }

    pub fn tags(&self) -> TagIter<'a> {
        // SAFETY: tags follow the fixed header, as required by `load`.
        unsafe { TagIter::new(self.start.wrapping_add(INFO_HEADER_SIZE)) }
    }

    /// First tag of `tag_type`, or `None` once the End tag is reached.
    pub fn find_tag(&self, tag_type: TagType) -> Option<Tag<'a>> {
        self.tags().find(|tag| tag.raw_type() == tag_type as u32)
    }

    pub fn basic_memory_info(&self) -> Option<BasicMemoryInfo> {
        BasicMemoryInfo::parse(self.find_tag(TagType::BasicMemoryInfo)?.payload())
    }

    pub fn memory_map_tag(&self) -> Option<MemoryMapTag<'a>> {
        MemoryMapTag::parse(self.find_tag(TagType::MemoryMap)?.payload())
    }

    /// The framebuffer descriptor, whatever its type.
    pub fn framebuffer_tag(&self) -> Option<FramebufferTag> {
        FramebufferTag::parse(self.find_tag(TagType::Framebuffer)?.payload())
    }

    pub fn command_line(&self) -> Option<&'a str> {
        self.string_tag(TagType::CommandLine)
    }

    pub fn bootloader_name(&self) -> Option<&'a str> {
        self.string_tag(TagType::BootloaderName)
    }

    fn string_tag(&self, tag_type: TagType) -> Option<&'a str> {
        let payload = self.find_tag(tag_type)?.payload();
        CStr::from_bytes_until_nul(payload).ok()?.to_str().ok()
    }

    /// Sum of the lengths of all available regions.
    ///
    /// Falls back to the basic memory info estimate without a memory map,
    /// and to 0 without either tag.
    pub fn total_available_memory(&self) -> u64 {
        match self.memory_map_tag() {
            Some(map) => map
                .available_areas()
                .fold(0u64, |total, area| total.saturating_add(area.length)),
            None => self.fallback_memory_size(),
        }
    }

    /// Highest end address of any available region, with the same
    /// fallbacks as [`Self::total_available_memory`].
    pub fn highest_memory_address(&self) -> u64 {
        match self.memory_map_tag() {
            Some(map) => map
                .available_areas()
                .map(|area| area.end_address())
                .max()
                .unwrap_or(0),
            None => self.fallback_memory_size(),
        }
    }

    fn fallback_memory_size(&self) -> u64 {
        self.basic_memory_info()
            .map_or(0, |info| info.memory_size())
    }
}
