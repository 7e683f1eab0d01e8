//! Last-resort error reporting.
//!
//! Once bring-up has a display it registers the screen here. A panic then
//! logs the message to serial, paints an error window if a screen is
//! registered, and halts the CPU for good.

use core::fmt::{self, Write};

use spin::Mutex;

use crate::{
    constants::graphics::{PANIC_MARGIN, PANIC_TITLE_BAR_HEIGHT},
    devices::display::ScreenInfo,
    graphics::{Brush, Color, FrameBuffer, TextRenderer},
};

static PANIC_SCREEN: Mutex<Option<ScreenInfo>> = Mutex::new(None);

const WINDOW_BACKGROUND: Color = Color::rgb(30, 30, 35);

pub fn register_display(screen: ScreenInfo) {
    *PANIC_SCREEN.lock() = Some(screen);
}

/// The registered screen, unless its lock is held elsewhere.
pub fn registered_display() -> Option<ScreenInfo> {
    PANIC_SCREEN.try_lock().and_then(|screen| *screen)
}

/// Paints the panic window, with `message` in it, into the back buffer.
pub fn draw_panic_screen(frame_buffer: &mut FrameBuffer, message: &dyn fmt::Display) {
    let width = frame_buffer.width() as i64;
    let height = frame_buffer.height() as i64;
    let clamp = |v: i64| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;

    let x1 = clamp(PANIC_MARGIN);
    let y1 = clamp(PANIC_MARGIN);
    let x2 = clamp(width - PANIC_MARGIN);
    let y2 = clamp(height - PANIC_MARGIN);
    let title_bottom = clamp(PANIC_MARGIN + PANIC_TITLE_BAR_HEIGHT);

    let mut brush = Brush::new(frame_buffer);
    brush.fill(Color::DARKER_GRAY);
    if x2 <= x1 || y2 <= y1 {
        return;
    }
    brush.fill_rect(x1, y1, x2, y2, WINDOW_BACKGROUND);
    brush.fill_rect(x1, y1, x2, title_bottom, Color::DARK_RED);
    brush.draw_rect(x1, y1, x2, y2, Color::GRAY_600);

    let extent = |from: i32, to: i32| u32::try_from(to.saturating_sub(from)).unwrap_or(0);
    let mut text = TextRenderer::new(frame_buffer);

    // One line of title; anything that wraps stays hidden.
    text.set_position(x1 + 10, y1 + 6);
    text.set_scale(2);
    text.set_size(extent(x1 + 10, x2), text.line_height());
    text.set_color(Color::WHITE);
    text.put_str("KERNEL PANIC");

    text.set_position(x1 + 20, title_bottom + 20);
    text.set_size(extent(x1 + 20, x2 - 20), extent(title_bottom + 20, y2 - 40));
    text.set_scale(1);
    text.set_color(Color::RED);
    text.put_str("A fatal error has occurred and the system has been halted.\n\n");
    text.set_color(Color::GRAY_400);
    text.put_str("Error message:\n");
    text.set_color(Color::WHITE);
    let _ = write!(text, "{}", message);

    text.set_position(x1 + 20, y2 - 30);
    text.set_size(extent(x1 + 20, x2 - 20), extent(y2 - 30, y2));
    text.set_color(Color::GRAY_600);
    text.put_str("Please restart your computer.");
}

#[cfg(all(target_os = "none", not(test)))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    // SAFETY: nothing runs after a panic, interrupts stay off.
    unsafe { x86::irq::disable() };

    log::error!("=== KERNEL PANIC ===");
    log::error!("{}", info);

    if let Some(screen) = registered_display() {
        // SAFETY: the code that owned the display will never run again.
        if let Some(mut frame_buffer) = unsafe { screen.frame_buffer() } {
            draw_panic_screen(&mut frame_buffer, info);
            frame_buffer.swap_buffers();
        }
    }

    crate::halt_forever()
}
