//! Generic tag headers and the iterator that walks them.

use core::{marker::PhantomData, ptr, slice};

use crate::constants::multiboot2::{TAG_ALIGN, TAG_HEADER_SIZE};

/// Tag types defined by the Multiboot2 specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TagType {
    End = 0,
    CommandLine = 1,
    BootloaderName = 2,
    Module = 3,
    BasicMemoryInfo = 4,
    BootDevice = 5,
    MemoryMap = 6,
    Vbe = 7,
    Framebuffer = 8,
    ElfSections = 9,
    Apm = 10,
    Efi32 = 11,
    Efi64 = 12,
    Smbios = 13,
    AcpiOld = 14,
    AcpiNew = 15,
    Network = 16,
    EfiMemoryMap = 17,
    EfiBootServices = 18,
    Efi32ImageHandle = 19,
    Efi64ImageHandle = 20,
    LoadBaseAddr = 21,
}

impl TagType {
    pub fn from_u32(value: u32) -> Option<Self> {
        let tag_type = match value {
            0 => Self::End,
            1 => Self::CommandLine,
            2 => Self::BootloaderName,
            3 => Self::Module,
            4 => Self::BasicMemoryInfo,
            5 => Self::BootDevice,
            6 => Self::MemoryMap,
            7 => Self::Vbe,
            8 => Self::Framebuffer,
            9 => Self::ElfSections,
            10 => Self::Apm,
            11 => Self::Efi32,
            12 => Self::Efi64,
            13 => Self::Smbios,
            14 => Self::AcpiOld,
            15 => Self::AcpiNew,
            16 => Self::Network,
            17 => Self::EfiMemoryMap,
            18 => Self::EfiBootServices,
            19 => Self::Efi32ImageHandle,
            20 => Self::Efi64ImageHandle,
            21 => Self::LoadBaseAddr,
            _ => return None,
        };
        Some(tag_type)
    }
}

/// One record of the boot information blob.
///
/// `size` is the logical length including the 8-byte header; `payload`
/// is everything after the header.
#[derive(Debug, Clone, Copy)]
pub struct Tag<'a> {
    typ: u32,
    size: u32,
    payload: &'a [u8],
}

impl<'a> Tag<'a> {
    pub fn raw_type(&self) -> u32 {
        self.typ
    }

    pub fn tag_type(&self) -> Option<TagType> {
        TagType::from_u32(self.typ)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }
}

/// Walks tags until the End tag.
///
/// There is no bound other than the End tag itself; see
/// [`BootInformation::load`](super::BootInformation::load).
pub struct TagIter<'a> {
    current: *const u8,
    finished: bool,
    _marker: PhantomData<&'a [u8]>,
}

impl TagIter<'_> {
    /// # Safety
    ///
    /// `first` must point at an 8-byte aligned tag header of a sequence
    /// terminated by an End tag, valid for the iterator's lifetime.
    pub(super) unsafe fn new(first: *const u8) -> Self {
        TagIter {
            current: first,
            finished: false,
            _marker: PhantomData,
        }
    }
}

impl<'a> Iterator for TagIter<'a> {
    type Item = Tag<'a>;

    fn next(&mut self) -> Option<Tag<'a>> {
        if self.finished {
            return None;
        }

        // SAFETY: the constructor's contract keeps `current` on a tag header.
        let (typ, size) = unsafe {
            let header = self.current as *const u32;
            (ptr::read_unaligned(header), ptr::read_unaligned(header.add(1)))
        };

        if typ == TagType::End as u32 {
            self.finished = true;
            return None;
        }

        let payload_len = (size as usize).saturating_sub(TAG_HEADER_SIZE);
        // SAFETY: the loader guarantees `size` bytes follow the tag start.
        let payload =
            unsafe { slice::from_raw_parts(self.current.add(TAG_HEADER_SIZE), payload_len) };

        // A size below the header length would stall the walk.
        let step = (size as usize).max(TAG_HEADER_SIZE).next_multiple_of(TAG_ALIGN);
        self.current = self.current.wrapping_add(step);

        Some(Tag { typ, size, payload })
    }
}

impl core::iter::FusedIterator for TagIter<'_> {}

pub(super) fn read_u8(bytes: &[u8], offset: usize) -> Option<u8> {
    bytes.get(offset).copied()
}

pub(super) fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes(raw.try_into().ok()?))
}

pub(super) fn read_u64(bytes: &[u8], offset: usize) -> Option<u64> {
    let raw = bytes.get(offset..offset.checked_add(8)?)?;
    Some(u64::from_le_bytes(raw.try_into().ok()?))
}
