#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod boot;

#[cfg(target_os = "none")]
mod entry {
    use log::{error, info};
    use lumen::{
        demo,
        devices::timer::Pit,
        halt_forever, init, logging,
    };

    extern "C" {
        static __kernel_start: [u8; 0];
        static __kernel_end: [u8; 0];
    }

    /// Called by `_start` with the registers the loader left behind.
    #[no_mangle]
    extern "C" fn kernel_entry(magic: u32, boot_info_addr: u32) -> ! {
        logging::init();
        info!(
            "Booting: magic {:#010x}, boot information at {:#x}",
            magic, boot_info_addr
        );
        init::log_cpu_info();

        // SAFETY: both symbols are defined by linker.ld.
        let (kernel_start, kernel_end) = unsafe {
            (
                __kernel_start.as_ptr() as usize,
                __kernel_end.as_ptr() as usize,
            )
        };
        info!(
            "Kernel image {:#x}..{:#x} ({} KiB)",
            kernel_start,
            kernel_end,
            (kernel_end - kernel_start) / 1024
        );

        let mut pit = Pit::new();
        pit.init();
        info!("PIT channel 0 running");

        // SAFETY: paging is off, so physical memory is identity mapped, and
        // nothing past the kernel image is in use yet.
        match unsafe { init::init_kernel(magic, boot_info_addr as usize, kernel_end) } {
            Ok(kernel) => demo::kernel_main(kernel, &mut pit),
            Err(err) => {
                error!("Boot failed: {}", err);
                halt_forever()
            }
        }
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!(
        "{} is a bare-metal kernel; build it for the i686-lumen.json target",
        env!("CARGO_PKG_NAME")
    );
}
