//! Multiboot2 header and the 32-bit entry stub.
//!
//! The loader enters `_start` in protected mode with paging off, EAX holding
//! the boot magic and EBX the physical address of the boot information.

use core::arch::global_asm;

use lumen::constants::{
    graphics::{REQUESTED_DEPTH, REQUESTED_HEIGHT, REQUESTED_WIDTH},
    memory::BOOT_STACK_SIZE,
    multiboot2::{HEADER_ARCHITECTURE_I386, HEADER_MAGIC, HEADER_TAG_END, HEADER_TAG_FRAMEBUFFER},
};

global_asm!(
    ".section .multiboot2, \"a\"",
    ".balign 8",
    "2:",
    ".long {magic}",
    ".long {arch}",
    ".long 3f - 2b",
    // magic + arch + length + checksum == 0 (mod 2^32)
    ".long 0x100000000 - ({magic} + {arch} + (3f - 2b))",
    ".balign 8",
    ".short {framebuffer_tag}",
    ".short 0",
    ".long 20",
    ".long {width}",
    ".long {height}",
    ".long {depth}",
    ".balign 8",
    ".short {end_tag}",
    ".short 0",
    ".long 8",
    "3:",
    "",
    ".section .bss",
    ".balign 16",
    "boot_stack_bottom:",
    ".skip {stack_size}",
    "boot_stack_top:",
    "",
    ".section .text",
    ".global _start",
    "_start:",
    "mov esp, offset boot_stack_top",
    // Keep the stack 16-byte aligned at the call.
    "sub esp, 8",
    "push ebx",
    "push eax",
    "call kernel_entry",
    "4:",
    "cli",
    "hlt",
    "jmp 4b",
    magic = const HEADER_MAGIC,
    arch = const HEADER_ARCHITECTURE_I386,
    framebuffer_tag = const HEADER_TAG_FRAMEBUFFER,
    end_tag = const HEADER_TAG_END,
    width = const REQUESTED_WIDTH,
    height = const REQUESTED_HEIGHT,
    depth = const REQUESTED_DEPTH,
    stack_size = const BOOT_STACK_SIZE,
);
