#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod constants;
pub mod demo;
pub mod devices;
pub mod graphics;
pub mod init;
pub mod logging;
pub mod memory;
pub mod multiboot2;
pub mod panic_screen;

pub use devices::serial;

/// Disables interrupts and halts the CPU for good.
pub fn halt_forever() -> ! {
    loop {
        // SAFETY: the kernel never expects to run again once it gets here.
        unsafe {
            x86::irq::disable();
            x86::halt();
        }
    }
}
