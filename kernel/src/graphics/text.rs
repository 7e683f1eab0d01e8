//! Bitmap text on a [`FrameBuffer`], drawn with the 8x8 ASCII glyphs from
//! `font8x8`.

use core::fmt;

use font8x8::legacy::BASIC_LEGACY;

use crate::graphics::{Color, FrameBuffer};

const GLYPH_SIZE: u32 = 8;
const TAB_STOP: u32 = 4;
const LINE_SPACING: u32 = 3;
const MAX_SCALE: u32 = 16;

/// Writes text into a rectangular area of a frame buffer.
///
/// * `position`: top-left corner of the text area on screen
/// * `size`: width and height of the area; lines wrap at its width and
///   pixels outside it are dropped
/// * `cursor`: where the next glyph goes, relative to `position`
///
/// Characters outside ASCII are drawn as `?`.
pub struct TextRenderer<'f, 'a> {
    frame_buffer: &'f mut FrameBuffer<'a>,
    color: Color,
    scale: u32,
    position: (i32, i32),
    size: (u32, u32),
    cursor: (i32, i32),
}

impl<'f, 'a> TextRenderer<'f, 'a> {
    /// White text at scale 1, with the whole screen as text area.
    pub fn new(frame_buffer: &'f mut FrameBuffer<'a>) -> Self {
        let size = (
            u32::try_from(frame_buffer.width()).unwrap_or(u32::MAX),
            u32::try_from(frame_buffer.height()).unwrap_or(u32::MAX),
        );
        Self {
            frame_buffer,
            color: Color::WHITE,
            scale: 1,
            position: (0, 0),
            size,
            cursor: (0, 0),
        }
    }

    pub fn reset(&mut self) {
        self.cursor = (0, 0);
    }

    pub fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = (x, y);
    }

    pub fn cursor(&self) -> (i32, i32) {
        self.cursor
    }

    /// Moves the text area. The cursor goes back to its top-left corner.
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.position = (x, y);
        self.reset();
    }

    pub fn position(&self) -> (i32, i32) {
        self.position
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Whole-number glyph magnification, clamped to `1..=16`.
    pub fn set_scale(&mut self, scale: u32) {
        self.scale = scale.clamp(1, MAX_SCALE);
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Horizontal advance of one character.
    pub fn glyph_width(&self) -> u32 {
        GLYPH_SIZE * self.scale
    }

    pub fn line_height(&self) -> u32 {
        GLYPH_SIZE * self.scale + LINE_SPACING
    }

    /// Width of `text` on a single line, in pixels. Line breaks take no room
    /// and a tab counts as four characters.
    pub fn text_width(&self, text: &str) -> u32 {
        text.chars()
            .map(|ch| match ch {
                '\n' | '\r' => 0,
                '\t' => TAB_STOP,
                _ => 1,
            })
            .fold(0u32, u32::saturating_add)
            .saturating_mul(self.glyph_width())
    }

    pub fn new_line(&mut self) {
        self.cursor.0 = 0;
        self.cursor.1 = self.cursor.1.saturating_add(self.line_height() as i32);
    }

    pub fn put_char(&mut self, ch: char) {
        let advance = self.glyph_width() as i32;
        match ch {
            '\n' => return self.new_line(),
            '\r' => {
                self.cursor.0 = 0;
                return;
            }
            '\t' => {
                self.cursor.0 = self.cursor.0.saturating_add(advance * TAB_STOP as i32);
                return;
            }
            _ => {}
        }

        // At the start of a line the glyph is drawn even if it is clipped.
        let overflows = i64::from(self.cursor.0) + i64::from(advance) > i64::from(self.size.0);
        if self.cursor.0 > 0 && overflows {
            self.new_line();
        }

        self.draw_glyph(&glyph(ch));
        self.cursor.0 = self.cursor.0.saturating_add(advance);
    }

    pub fn put_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.put_char(ch);
        }
    }

    /// Row `r` of a glyph is byte `r`; bit `c` of it is column `c`.
    fn draw_glyph(&mut self, rows: &[u8; 8]) {
        let scale = i64::from(self.scale);
        let left = i64::from(self.position.0) + i64::from(self.cursor.0);
        let top = i64::from(self.position.1) + i64::from(self.cursor.1);

        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let x = left + i64::from(col) * scale;
                let y = top + row as i64 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        self.plot(x + dx, y + dy);
                    }
                }
            }
        }
    }

    fn plot(&mut self, x: i64, y: i64) {
        let (area_x, area_y) = (i64::from(self.position.0), i64::from(self.position.1));
        let inside = x >= area_x
            && y >= area_y
            && x < area_x + i64::from(self.size.0)
            && y < area_y + i64::from(self.size.1);
        if !inside {
            return;
        }
        if let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) {
            self.frame_buffer.draw_pixel(x, y, self.color);
        }
    }
}

impl fmt::Write for TextRenderer<'_, '_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.put_str(s);
        Ok(())
    }
}

fn glyph(ch: char) -> [u8; 8] {
    usize::try_from(u32::from(ch))
        .ok()
        .and_then(|index| BASIC_LEGACY.get(index))
        .copied()
        .unwrap_or(BASIC_LEGACY[b'?' as usize])
}
