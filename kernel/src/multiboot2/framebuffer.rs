//! Framebuffer info tag (type 8).

use super::tags::{read_u32, read_u64, read_u8};

/// Bytes needed to read the common framebuffer fields.
const FRAMEBUFFER_FIELDS_SIZE: usize = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferType {
    Indexed,
    Rgb,
    EgaText,
}

impl FramebufferType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Indexed),
            1 => Some(Self::Rgb),
            2 => Some(Self::EgaText),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferTag {
    pub address: u64,
    /// Bytes per scanline.
    pub pitch: u32,
    pub width: u32,
    pub height: u32,
    pub bpp: u8,
    pub typ: u8,
}

impl FramebufferTag {
    pub(super) fn parse(payload: &[u8]) -> Option<Self> {
        if payload.len() < FRAMEBUFFER_FIELDS_SIZE {
            return None;
        }

        Some(FramebufferTag {
            address: read_u64(payload, 0)?,
            pitch: read_u32(payload, 8)?,
            width: read_u32(payload, 12)?,
            height: read_u32(payload, 16)?,
            bpp: read_u8(payload, 20)?,
            typ: read_u8(payload, 21)?,
        })
    }

    /// `None` for type codes Multiboot2 does not define.
    pub fn kind(&self) -> Option<FramebufferType> {
        FramebufferType::from_u8(self.typ)
    }
}
