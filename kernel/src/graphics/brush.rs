//! Shape primitives on top of [`FrameBuffer`].
//!
//! Coordinates are signed so shapes may extend past any edge; everything is
//! clipped to the buffer.

use crate::graphics::{Color, FrameBuffer};

pub struct Brush<'b, 'a> {
    frame_buffer: &'b mut FrameBuffer<'a>,
}

impl<'b, 'a> Brush<'b, 'a> {
    pub fn new(frame_buffer: &'b mut FrameBuffer<'a>) -> Self {
        Brush { frame_buffer }
    }

    pub fn fill(&mut self, color: Color) {
        self.frame_buffer.fill(color);
    }

    pub fn clear(&mut self) {
        self.fill(Color::BLACK);
    }

    pub fn draw_point(&mut self, x: i32, y: i32, color: Color) {
        self.plot(i64::from(x), i64::from(y), color);
    }

    /// Horizontal line from `x1` to `x2` inclusive, in either order.
    pub fn draw_hline(&mut self, x1: i32, x2: i32, y: i32, color: Color) {
        self.span(i64::from(x1), i64::from(x2), i64::from(y), color);
    }

    /// Vertical line from `y1` to `y2` inclusive, in either order.
    pub fn draw_vline(&mut self, x: i32, y1: i32, y2: i32, color: Color) {
        let (x, y1, y2) = (i64::from(x), i64::from(y1), i64::from(y2));
        let Some((y1, y2)) = clip_range(y1, y2, self.height()) else {
            return;
        };
        if x < 0 || x >= self.width() {
            return;
        }
        for y in y1..=y2 {
            self.frame_buffer.draw_pixel(x as usize, y as usize, color);
        }
    }

    /// Bresenham line, both endpoints included.
    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        if y1 == y2 {
            return self.draw_hline(x1, x2, y1, color);
        }
        if x1 == x2 {
            return self.draw_vline(x1, y1, y2, color);
        }

        let (mut x, mut y) = (i64::from(x1), i64::from(y1));
        let (end_x, end_y) = (i64::from(x2), i64::from(y2));
        let dx = (end_x - x).abs();
        let dy = (end_y - y).abs();
        let sx = if x < end_x { 1 } else { -1 };
        let sy = if y < end_y { 1 } else { -1 };
        let mut err = dx - dy;

        loop {
            self.plot(x, y, color);
            if x == end_x && y == end_y {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Fills `[x1, x2) x [y1, y2)`; corners may come in either order.
    pub fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        let (x1, x2) = (x1.min(x2), x1.max(x2));
        let (y1, y2) = (y1.min(y2), y1.max(y2));
        if x1 == x2 || y1 == y2 {
            return;
        }
        // Half-open to inclusive: the last row and column are x2 - 1, y2 - 1.
        let Some((x1, x2)) = clip_range(i64::from(x1), i64::from(x2) - 1, self.width()) else {
            return;
        };
        let Some((y1, y2)) = clip_range(i64::from(y1), i64::from(y2) - 1, self.height()) else {
            return;
        };
        for y in y1..=y2 {
            self.frame_buffer
                .fill_span(y as usize, x1 as usize, x2 as usize, color);
        }
    }

    /// Outline through both corners, inclusive.
    pub fn draw_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        self.draw_hline(x1, x2, y1, color);
        self.draw_hline(x1, x2, y2, color);
        self.draw_vline(x1, y1, y2, color);
        self.draw_vline(x2, y1, y2, color);
    }

    /// Midpoint circle outline.
    pub fn draw_circle(&mut self, cx: i32, cy: i32, radius: u32, color: Color) {
        let (cx, cy) = (i64::from(cx), i64::from(cy));
        for_each_octant_point(radius, |x, y| {
            for (px, py) in [(x, y), (-x, y), (x, -y), (-x, -y), (y, x), (-y, x), (y, -x), (-y, -x)] {
                self.plot(cx + px, cy + py, color);
            }
        });
    }

    /// Midpoint circle filled with horizontal spans.
    pub fn fill_circle(&mut self, cx: i32, cy: i32, radius: u32, color: Color) {
        let (cx, cy) = (i64::from(cx), i64::from(cy));
        for_each_octant_point(radius, |x, y| {
            self.span(cx - x, cx + x, cy + y, color);
            self.span(cx - x, cx + x, cy - y, color);
            self.span(cx - y, cx + y, cy + x, color);
            self.span(cx - y, cx + y, cy - x, color);
        });
    }

    fn width(&self) -> i64 {
        self.frame_buffer.width() as i64
    }

    fn height(&self) -> i64 {
        self.frame_buffer.height() as i64
    }

    fn plot(&mut self, x: i64, y: i64, color: Color) {
        if x >= 0 && y >= 0 && x < self.width() && y < self.height() {
            self.frame_buffer.draw_pixel(x as usize, y as usize, color);
        }
    }

    fn span(&mut self, x1: i64, x2: i64, y: i64, color: Color) {
        if y < 0 || y >= self.height() {
            return;
        }
        if let Some((x1, x2)) = clip_range(x1, x2, self.width()) {
            self.frame_buffer
                .fill_span(y as usize, x1 as usize, x2 as usize, color);
        }
    }
}

/// Orders `a`, `b` and clips the inclusive range to `0..limit`.
fn clip_range(a: i64, b: i64, limit: i64) -> Option<(i64, i64)> {
    let (low, high) = (a.min(b).max(0), a.max(b).min(limit - 1));
    (low <= high).then_some((low, high))
}

/// Walks one octant of a midpoint circle, radius 0 being a single point.
fn for_each_octant_point(radius: u32, mut f: impl FnMut(i64, i64)) {
    let mut x = 0;
    let mut y = i64::from(radius);
    let mut p = 1 - y;

    f(x, y);
    while x < y {
        x += 1;
        if p < 0 {
            p += 2 * x + 1;
        } else {
            y -= 1;
            p += 2 * (x - y) + 1;
        }
        f(x, y);
    }
}
