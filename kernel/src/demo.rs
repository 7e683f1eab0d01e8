//! What the kernel shows once it is up: a few shapes, display and memory
//! details, and a gauge of physical memory in use.

use core::fmt::{self, Write};

use log::info;

use crate::{
    constants::memory::FRAME_SIZE,
    devices::{display::Display, timer::TickCounter},
    graphics::{Brush, Color, FrameBuffer, TextRenderer},
    init::Kernel,
    memory::PhysicalMemory,
};

const MIB: usize = 1024 * 1024;

/// Pause between clearing the screen and drawing the scene.
const REVEAL_DELAY_MS: u32 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    pub used_frames: usize,
    pub total_frames: usize,
}

impl MemoryUsage {
    pub fn of(memory: &PhysicalMemory) -> Self {
        MemoryUsage {
            used_frames: memory.used_frames(),
            total_frames: memory.total_frames(),
        }
    }

    pub fn free_memory(&self) -> usize {
        self.total_frames.saturating_sub(self.used_frames) * FRAME_SIZE
    }

    pub fn total_memory(&self) -> usize {
        self.total_frames * FRAME_SIZE
    }

    /// The used share of `length`, rounded down.
    fn scaled(&self, length: i32) -> i32 {
        if self.total_frames == 0 || length <= 0 {
            return 0;
        }
        let used = self.used_frames.min(self.total_frames) as u64;
        (used * length as u64 / self.total_frames as u64) as i32
    }
}

/// Mode and location of the screen, as reported on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayInfo {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u8,
    pub address: usize,
}

impl DisplayInfo {
    pub fn of(display: &Display) -> Self {
        DisplayInfo {
            width: display.width(),
            height: display.height(),
            bits_per_pixel: display.bits_per_pixel(),
            address: display.address(),
        }
    }
}

pub fn draw_demo(frame_buffer: &mut FrameBuffer, display: DisplayInfo, usage: MemoryUsage) {
    let width = i32::try_from(frame_buffer.width()).unwrap_or(i32::MAX);
    let height = i32::try_from(frame_buffer.height()).unwrap_or(i32::MAX);
    let mut brush = Brush::new(frame_buffer);

    brush.fill(Color::DARKER_GRAY);
    brush.draw_rect(10, 10, width - 10, height - 10, Color::GRAY_600);

    brush.fill_rect(20, 60, 120, 120, Color::DARK_BLUE);
    brush.fill_rect(130, 60, 230, 120, Color::DARK_GREEN);
    brush.fill_rect(240, 60, 340, 120, Color::DARK_RED);

    brush.fill_circle(400, 90, 30, Color::YELLOW);
    brush.draw_circle(480, 90, 30, Color::CYAN);

    brush.draw_line(520, 60, 620, 120, Color::WHITE);
    brush.draw_line(520, 120, 620, 60, Color::WHITE);

    draw_memory_gauge(&mut brush, width, height, usage);

    let mut text = TextRenderer::new(frame_buffer);
    let text_width = u32::try_from(width - 40).unwrap_or(0);

    text.set_position(20, 20);
    text.set_scale(2);
    text.set_size(text_width, text.line_height());
    text.put_str("Hello from lumen");
    text.set_scale(1);

    text.set_position(20, 140);
    text.set_size(text_width, 44);
    label(
        &mut text,
        "Display: ",
        format_args!(
            "{}x{} @ {} bpp",
            display.width, display.height, display.bits_per_pixel
        ),
    );
    label(&mut text, "FB address: ", format_args!("{:#x}", display.address));

    text.set_position(20, 200);
    text.set_size(text_width, 66);
    text.set_color(Color::YELLOW);
    text.put_str("=== Physical memory ===\n");
    label(
        &mut text,
        "Memory: ",
        format_args!(
            "{} MiB free / {} MiB total",
            usage.free_memory() / MIB,
            usage.total_memory() / MIB
        ),
    );
    label(
        &mut text,
        "Frames: ",
        format_args!("{} used of {}", usage.used_frames, usage.total_frames),
    );
}

/// One `name: value` line, name in gray and value in white.
fn label(text: &mut TextRenderer, name: &str, value: fmt::Arguments) {
    text.set_color(Color::GRAY_400);
    text.put_str(name);
    text.set_color(Color::WHITE);
    let _ = text.write_fmt(value);
    text.new_line();
}

fn draw_memory_gauge(brush: &mut Brush, width: i32, height: i32, usage: MemoryUsage) {
    let (x1, x2) = (20, width - 20);
    let (y1, y2) = (height - 40, height - 24);
    if x2 <= x1 || y1 < 0 {
        return;
    }

    brush.fill_rect(x1, y1, x2, y2, Color::GRAY_800);
    brush.fill_rect(x1, y1, x1 + usage.scaled(x2 - x1), y2, Color::BLUE);
    brush.draw_rect(x1, y1, x2, y2, Color::GRAY_600);
}

/// Draws the demo and parks the CPU.
pub fn kernel_main(mut kernel: Kernel, timer: &mut impl TickCounter) -> ! {
    let usage = MemoryUsage::of(&kernel.memory);
    let display = DisplayInfo::of(&kernel.display);
    info!(
        "Memory in use: {} of {} frames",
        usage.used_frames, usage.total_frames
    );

    Brush::new(kernel.display.frame_buffer()).fill(Color::DARKER_GRAY);
    kernel.display.swap_buffers();
    timer.delay_ms(REVEAL_DELAY_MS);

    draw_demo(kernel.display.frame_buffer(), display, usage);
    kernel.display.swap_buffers();
    info!(
        "Demo drawn on {}x{} display, halting",
        display.width, display.height
    );

    crate::halt_forever()
}
