//! Linear framebuffer handed over by the loader, with a RAM back buffer.

use crate::{
    constants::graphics::BYTES_PER_PIXEL,
    graphics::FrameBuffer,
    multiboot2::FramebufferTag,
};

/// Raw geometry and buffer addresses of a [`Display`], for code that has to
/// rebuild a framebuffer without borrowing the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenInfo {
    pub width: usize,
    pub height: usize,
    pub pitch: usize,
    pub front: usize,
    pub back: usize,
}

impl ScreenInfo {
    /// # Safety
    /// The addresses must still describe the display's video memory and back
    /// buffer, and nothing else may be drawing into them.
    pub unsafe fn frame_buffer<'a>(&self) -> Option<FrameBuffer<'a>> {
        unsafe { FrameBuffer::from_raw(self.width, self.height, self.front, self.pitch, self.back) }
    }
}

pub struct Display<'a> {
    width: u32,
    height: u32,
    pitch: u32,
    bits_per_pixel: u8,
    address: usize,
    back_buffer: usize,
    frame_buffer: FrameBuffer<'a>,
}

impl<'a> Display<'a> {
    /// Bytes of back buffer needed for a `width` x `height` 32 bpp screen.
    pub fn back_buffer_size(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    /// # Safety
    /// `tag` must describe identity-mapped video memory, and `back_buffer`
    /// must point to [`Self::back_buffer_size`] bytes of otherwise unused
    /// memory. Both must stay valid for `'a`.
    ///
    /// # Returns
    /// `None` if the framebuffer lies outside the address space or its
    /// pitch cannot hold a row of 32 bpp pixels
    pub unsafe fn new(tag: &FramebufferTag, back_buffer: usize) -> Option<Self> {
        let address = usize::try_from(tag.address).ok()?;
        let frame_buffer = unsafe {
            FrameBuffer::from_raw(
                tag.width as usize,
                tag.height as usize,
                address,
                tag.pitch as usize,
                back_buffer,
            )?
        };

        Some(Display {
            width: tag.width,
            height: tag.height,
            pitch: tag.pitch,
            bits_per_pixel: tag.bpp,
            address,
            back_buffer,
            frame_buffer,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pitch(&self) -> u32 {
        self.pitch
    }

    pub fn bits_per_pixel(&self) -> u8 {
        self.bits_per_pixel
    }

    pub fn bytes_per_pixel(&self) -> u8 {
        self.bits_per_pixel.div_ceil(8)
    }

    pub fn address(&self) -> usize {
        self.address
    }

    /// Bytes of video memory the visible screen spans.
    pub fn video_memory_size(&self) -> usize {
        self.pitch as usize * self.height as usize
    }

    pub fn frame_buffer(&mut self) -> &mut FrameBuffer<'a> {
        &mut self.frame_buffer
    }

    pub fn swap_buffers(&mut self) {
        self.frame_buffer.swap_buffers();
    }

    pub fn screen_info(&self) -> ScreenInfo {
        ScreenInfo {
            width: self.width as usize,
            height: self.height as usize,
            pitch: self.pitch as usize,
            front: self.address,
            back: self.back_buffer,
        }
    }
}
