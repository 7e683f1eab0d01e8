use core::slice;

use crate::graphics::Color;

/// Double-buffered 32 bpp framebuffer.
///
/// Drawing only ever touches the back buffer, which is packed
/// (`width * height` pixels). [`FrameBuffer::swap_buffers`] copies it row by
/// row into the front buffer, whose rows are `front_stride` pixels apart.
pub struct FrameBuffer<'a> {
    width: usize,
    height: usize,
    front: &'a mut [u32],
    front_stride: usize,
    back: &'a mut [u32],
}

impl<'a> FrameBuffer<'a> {
    /// `None` if either buffer is too small for the given geometry.
    pub fn new(
        width: usize,
        height: usize,
        front: &'a mut [u32],
        front_stride: usize,
        back: &'a mut [u32],
    ) -> Option<Self> {
        let pixels = width.checked_mul(height)?;
        let front_len = match height {
            0 => 0,
            _ => (height - 1).checked_mul(front_stride)?.checked_add(width)?,
        };
        if front_stride < width || front.len() < front_len || back.len() < pixels {
            return None;
        }

        Some(FrameBuffer {
            width,
            height,
            front,
            front_stride,
            back,
        })
    }

    /// # Safety
    /// `front` must address `height` scanlines of `pitch` bytes of video
    /// memory and `back` must address `width * height` writable `u32`s.
    /// Both must be 4-byte aligned, must not overlap, and must stay valid
    /// for `'a`.
    pub unsafe fn from_raw(
        width: usize,
        height: usize,
        front: usize,
        pitch: usize,
        back: usize,
    ) -> Option<Self> {
        let front_stride = pitch / 4;
        let front_len = height.checked_mul(front_stride)?;
        let back_len = width.checked_mul(height)?;
        // SAFETY: sizes follow from the geometry the caller vouches for.
        let (front, back) = unsafe {
            (
                slice::from_raw_parts_mut(front as *mut u32, front_len),
                slice::from_raw_parts_mut(back as *mut u32, back_len),
            )
        };
        Self::new(width, height, front, front_stride, back)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn fill(&mut self, color: Color) {
        let pixels = self.width * self.height;
        self.back[..pixels].fill(color.value());
    }

    /// Out-of-bounds pixels are ignored.
    pub fn draw_pixel(&mut self, x: usize, y: usize, color: Color) {
        if x < self.width && y < self.height {
            self.back[y * self.width + x] = color.value();
        }
    }

    /// Back buffer pixel, `None` outside the buffer.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x < self.width && y < self.height {
            Some(Color::from_argb(self.back[y * self.width + x]))
        } else {
            None
        }
    }

    /// Paints `x1..=x2` of row `y`. Callers clip first.
    pub(crate) fn fill_span(&mut self, y: usize, x1: usize, x2: usize, color: Color) {
        let row = y * self.width;
        self.back[row + x1..=row + x2].fill(color.value());
    }

    pub fn swap_buffers(&mut self) {
        for y in 0..self.height {
            let src = &self.back[y * self.width..(y + 1) * self.width];
            let dst_start = y * self.front_stride;
            self.front[dst_start..dst_start + self.width].copy_from_slice(src);
        }
    }
}
