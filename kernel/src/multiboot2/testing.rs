//! Builds boot information blobs in host memory for unit tests.

use super::{BootInformation, TagType};
use crate::constants::multiboot2::TAG_ALIGN;

pub(crate) struct BlobBuilder {
    bytes: Vec<u8>,
}

impl BlobBuilder {
    pub(crate) fn new() -> Self {
        BlobBuilder {
            bytes: vec![0; 8],
        }
    }

    pub(crate) fn tag(mut self, typ: u32, payload: &[u8]) -> Self {
        let size = 8 + payload.len() as u32;
        self.bytes.extend_from_slice(&typ.to_le_bytes());
        self.bytes.extend_from_slice(&size.to_le_bytes());
        self.bytes.extend_from_slice(payload);
        let padded = self.bytes.len().next_multiple_of(TAG_ALIGN);
        self.bytes.resize(padded, 0);
        self
    }

    pub(crate) fn command_line(self, line: &str) -> Self {
        self.tag(TagType::CommandLine as u32, &nul_terminated(line))
    }

    pub(crate) fn bootloader_name(self, name: &str) -> Self {
        self.tag(TagType::BootloaderName as u32, &nul_terminated(name))
    }

    pub(crate) fn basic_memory_info(self, mem_lower: u32, mem_upper: u32) -> Self {
        let mut payload = Vec::new();
        payload.extend_from_slice(&mem_lower.to_le_bytes());
        payload.extend_from_slice(&mem_upper.to_le_bytes());
        self.tag(TagType::BasicMemoryInfo as u32, &payload)
    }

    /// Regions as `(base, length, type)` in the 24-byte version 0 layout.
    pub(crate) fn memory_map(self, areas: &[(u64, u64, u32)]) -> Self {
        let mut payload = Vec::new();
        payload.extend_from_slice(&24u32.to_le_bytes());
        payload.extend_from_slice(&0u32.to_le_bytes());
        for &(base, length, typ) in areas {
            payload.extend_from_slice(&base.to_le_bytes());
            payload.extend_from_slice(&length.to_le_bytes());
            payload.extend_from_slice(&typ.to_le_bytes());
            payload.extend_from_slice(&0u32.to_le_bytes());
        }
        self.tag(TagType::MemoryMap as u32, &payload)
    }

    pub(crate) fn framebuffer(
        self,
        address: u64,
        pitch: u32,
        width: u32,
        height: u32,
        bpp: u8,
        typ: u8,
    ) -> Self {
        let mut payload = Vec::new();
        payload.extend_from_slice(&address.to_le_bytes());
        payload.extend_from_slice(&pitch.to_le_bytes());
        payload.extend_from_slice(&width.to_le_bytes());
        payload.extend_from_slice(&height.to_le_bytes());
        payload.push(bpp);
        payload.push(typ);
        payload.extend_from_slice(&0u16.to_le_bytes());
        self.tag(TagType::Framebuffer as u32, &payload)
    }

    pub(crate) fn build(self) -> Blob {
        let mut bytes = self.tag(TagType::End as u32, &[]).bytes;
        let total = bytes.len() as u32;
        bytes[..4].copy_from_slice(&total.to_le_bytes());

        // Backed by u64 words so the blob is 8-byte aligned.
        let mut words = vec![0u64; bytes.len() / 8];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            *word = u64::from_le_bytes(chunk.try_into().unwrap());
        }
        Blob { words }
    }
}

pub(crate) struct Blob {
    words: Vec<u64>,
}

impl Blob {
    pub(crate) fn address(&self) -> usize {
        self.words.as_ptr() as usize
    }

    pub(crate) fn info(&self) -> BootInformation<'_> {
        unsafe { BootInformation::load(self.address()) }
    }
}

fn nul_terminated(text: &str) -> Vec<u8> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(0);
    bytes
}
