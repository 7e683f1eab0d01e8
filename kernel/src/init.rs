//! Kernel bring-up.
//!
//! [`init_kernel`] runs the fixed boot sequence: check the loader magic,
//! size physical memory, stand up the frame allocator, then claim the
//! framebuffer and a back buffer for it. Every step either succeeds or
//! returns a [`BootError`]; only the entry point decides to halt.

use log::{debug, info, warn};
use raw_cpuid::CpuId;
use thiserror::Error;

use crate::{
    constants::memory::{FRAME_SIZE, LOW_MEMORY_END},
    devices::display::Display,
    memory::{FrameError, PhysicalMemory},
    multiboot2::{self, BootInformation, FramebufferTag, FramebufferType, MemoryMapTag},
    panic_screen,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BootError {
    #[error("invalid multiboot2 magic {0:#010x}")]
    InvalidMagic(u32),
    #[error("bootloader reported no usable memory")]
    NoMemory,
    #[error("frame allocator setup failed: {0}")]
    Memory(#[from] FrameError),
    #[error("bootloader did not provide a framebuffer")]
    MissingFramebuffer,
    #[error("framebuffer type {0} is not direct RGB")]
    UnsupportedFramebuffer(u8),
    #[error("framebuffer depth of {0} bpp is not supported")]
    UnsupportedDepth(u8),
    #[error("cannot allocate {frames} contiguous frames for the back buffer")]
    BackBufferAllocation { frames: usize },
    #[error("framebuffer at {0:#x} is not addressable")]
    InvalidFramebuffer(u64),
}

/// Everything bring-up produced.
pub struct Kernel<'a> {
    pub boot_info: BootInformation<'a>,
    pub memory: PhysicalMemory<'a>,
    pub display: Display<'a>,
}

/// Logs the CPU vendor and brand string, if CPUID reports them.
pub fn log_cpu_info() {
    let cpuid = CpuId::new();
    if let Some(vendor) = cpuid.get_vendor_info() {
        info!("Running on {}", vendor.as_str());
    }
    if let Some(brand) = cpuid.get_processor_brand_string() {
        debug!("CPU: {}", brand.as_str().trim());
    }
}

/// Brings the kernel from the loader handoff to a drawable display.
///
/// # Safety
/// `boot_info_addr` must satisfy [`BootInformation::load`] if `magic` is
/// valid. Physical memory must be identity mapped, and everything from
/// `kernel_end` up must be free for the kernel to claim.
pub unsafe fn init_kernel<'a>(
    magic: u32,
    boot_info_addr: usize,
    kernel_end: usize,
) -> Result<Kernel<'a>, BootError> {
    if !multiboot2::is_valid(magic) {
        return Err(BootError::InvalidMagic(magic));
    }

    // SAFETY: the magic says a Multiboot2 loader handed over this address.
    let boot_info = unsafe { BootInformation::load(boot_info_addr) };
    debug!(
        "Boot information at {:#x}, {} bytes",
        boot_info_addr,
        boot_info.total_size()
    );
    if let Some(name) = boot_info.bootloader_name() {
        info!("Loaded by {}", name);
    }
    if let Some(command_line) = boot_info.command_line() {
        info!("Command line: {:?}", command_line);
    }

    let memory_size = memory_size(&boot_info)?;
    info!(
        "Physical memory: {} MiB usable, top at {:#x}",
        boot_info.total_available_memory() / (1024 * 1024),
        memory_size
    );

    let mut memory = PhysicalMemory::new(kernel_end);
    // SAFETY: the caller hands us everything past the kernel image.
    unsafe { memory.initialize(memory_size)? };
    if let Some(map) = boot_info.memory_map_tag() {
        reserve_unusable_regions(&mut memory, &map, memory_size);
    }
    if let Some(bitmap) = memory.bitmap() {
        info!(
            "Frame allocator ready: {} of {} frames free",
            bitmap.free_frame_count(),
            bitmap.total_frames()
        );
    }

    let tag = boot_info
        .framebuffer_tag()
        .ok_or(BootError::MissingFramebuffer)?;
    check_framebuffer(&tag)?;
    info!(
        "Framebuffer {}x{}x{} at {:#x}, pitch {}",
        tag.width, tag.height, tag.bpp, tag.address, tag.pitch
    );

    let frames = back_buffer_frames(&tag);
    let back_buffer = memory
        .allocate_frames(frames)
        .ok_or(BootError::BackBufferAllocation { frames })?;
    debug!(
        "Back buffer: {} frames at {:#x}",
        frames,
        back_buffer.start_address().as_u64()
    );

    // SAFETY: the frames were just taken from the allocator for this use,
    // and the framebuffer address came from the loader.
    let display = unsafe { Display::new(&tag, back_buffer.start_address().as_u64() as usize) }
        .ok_or(BootError::InvalidFramebuffer(tag.address))?;
    panic_screen::register_display(display.screen_info());

    Ok(Kernel {
        boot_info,
        memory,
        display,
    })
}

/// Top of usable memory, clipped to the address space.
fn memory_size(boot_info: &BootInformation) -> Result<usize, BootError> {
    match boot_info.highest_memory_address() {
        0 => Err(BootError::NoMemory),
        highest => Ok(usize::try_from(highest).unwrap_or(usize::MAX)),
    }
}

/// Only 32 bpp direct-color framebuffers can be drawn to.
fn check_framebuffer(tag: &FramebufferTag) -> Result<(), BootError> {
    if tag.kind() != Some(FramebufferType::Rgb) {
        return Err(BootError::UnsupportedFramebuffer(tag.typ));
    }
    if tag.bpp != 32 {
        return Err(BootError::UnsupportedDepth(tag.bpp));
    }
    Ok(())
}

fn back_buffer_frames(tag: &FramebufferTag) -> usize {
    Display::back_buffer_size(tag.width, tag.height).div_ceil(FRAME_SIZE)
}

/// Marks memory the loader reported as unusable, and memory it did not
/// report at all, so neither is ever handed out.
fn reserve_unusable_regions(
    memory: &mut PhysicalMemory,
    map: &MemoryMapTag,
    memory_size: usize,
) {
    for area in map.memory_areas().filter(|area| !area.is_available()) {
        reserve(memory, area.base_addr, area.end_address(), "unusable");
    }
    for (start, end) in map.unavailable_ranges(LOW_MEMORY_END as u64, memory_size as u64) {
        reserve(memory, start, end, "unreported");
    }
}

fn reserve(memory: &mut PhysicalMemory, start: u64, end: u64, what: &str) {
    let start = usize::try_from(start).unwrap_or(usize::MAX);
    let end = usize::try_from(end).unwrap_or(usize::MAX);
    match memory.reserve_range(start, end) {
        Ok(0) => {}
        Ok(frames) => debug!("Reserved {} frames of {} memory at {:#x}", frames, what, start),
        Err(err) => warn!("Could not reserve {:#x}..{:#x}: {}", start, end, err),
    }
}
