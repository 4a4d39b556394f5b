//! # Kernel Entry Point

#![no_std]
#![no_main]
#![allow(unsafe_code)]

use core::arch::asm;
use kernel_core::EarlyKernel;
use kernel_info::boot::{BootDescriptor, BootInfo};
use kernel_info::layout::KERNEL_STACK_SIZE;
use kernel_qemu::{QemuLogger, qemu_trace};
use log::{LevelFilter, debug, error, info};

/// Kernel-wide state; secondary cores reach it through [`EarlyKernel::secondary_entry`].
static KERNEL: EarlyKernel = EarlyKernel::new();

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    // Not through `log`: the panic may have happened while a line was being written.
    qemu_trace!("kernel panic: {info}\n");
    halt()
}

/// 16-byte aligned stack
#[repr(align(16))]
struct Aligned<const N: usize>([u8; N]);

#[unsafe(link_section = ".bss.boot")]
#[unsafe(no_mangle)]
static mut BOOT_STACK: Aligned<KERNEL_STACK_SIZE> = Aligned([0; KERNEL_STACK_SIZE]);

/// The kernel entry point
///
/// # UEFI Interaction
/// The loader copies the flat image to `PHYS_LOAD` and jumps here after
/// `ExitBootServices`, still on the firmware's identity map.
///
/// # ABI
/// `win64`, since the caller is a UEFI (PE/COFF) application: the descriptor
/// pointer arrives in `RCX`.
///
/// # Naked function & Stack
/// Naked so that no prologue touches the firmware stack we are about to
/// abandon. The stub switches to [`BOOT_STACK`] and tail-jumps into
/// [`kernel_entry`] with the descriptor pointer moved to `RDI`.
#[unsafe(no_mangle)]
#[unsafe(naked)]
#[unsafe(link_section = ".text.entry")]
pub extern "win64" fn _start_kernel(_descriptor: *const BootDescriptor) -> ! {
    core::arch::naked_asm!(
        "cli",

        // save RCX (descriptor per Win64)
        "mov r12, rcx",

        "lea rax, [rip + {stack_sym}]",
        "add rax, {stack_size}",
        "and rax, -16",
        "mov rsp, rax",
        // Emulate a CALL so RSP % 16 == 8 at entry
        "push 0",
        "xor rbp, rbp",

        "mov rdi, r12",
        "jmp {rust_entry}",
        stack_sym = sym BOOT_STACK,
        stack_size = const KERNEL_STACK_SIZE,
        rust_entry = sym kernel_entry,
    );
}

/// Kernel entry running on the boot stack.
#[unsafe(no_mangle)]
extern "C" fn kernel_entry(descriptor: *const BootDescriptor) -> ! {
    qemu_trace!("Kernel reporting to QEMU!\n");
    if QemuLogger::new(LevelFilter::Debug).init().is_err() {
        qemu_trace!("Logger was already installed\n");
    }

    // SAFETY: the loader keeps the descriptor and everything it points to in
    // pages marked pending, which nothing reuses before early init finishes.
    let info = match unsafe { BootDescriptor::decode(descriptor) } {
        Ok(info) => info,
        Err(e) => {
            error!("Rejecting boot descriptor at {descriptor:p}: {e}");
            halt()
        }
    };
    trace_boot_info(&info);

    match KERNEL.init(&info) {
        Ok(boot) => info!(
            "Early init done: {} MiB usable, ACPI root at {:#x}",
            boot.usable_bytes() >> 20,
            boot.acpi_root()
        ),
        Err(e) => {
            error!("Early init failed: {e}");
            halt()
        }
    }

    kernel_main()
}

fn kernel_main() -> ! {
    // No IDT and no SYSCALL entry (STAR/LSTAR) are installed yet, so
    // `KernelSyscalls::handle` has no caller here; park the core.
    info!("Entering idle loop");
    halt()
}

fn trace_boot_info(info: &BootInfo<'_>) {
    debug!(
        "Boot flags {:#05b}, ACPI table {} bytes, {} memory regions",
        info.flags.into_bits(),
        info.acpi.table.len(),
        info.memory_map.len()
    );
    for region in info.memory_map {
        debug!(
            "  {:#014x} +{:>8} pages {:?}",
            region.start,
            region.pages,
            region.kind()
        );
    }
    if let Some(fb) = info.framebuffer {
        debug!(
            "Framebuffer at {:#x}: {}x{} (stride {}) {:?}",
            fb.base, fb.width, fb.height, fb.stride, fb.format
        );
    }
    if let Some(symbols) = info.symbol_table {
        debug!("Symbol table: {} bytes", symbols.len());
    }
}

/// Stops this core for good.
fn halt() -> ! {
    loop {
        // SAFETY: interrupts are masked, so `hlt` only returns on NMI.
        unsafe { asm!("cli", "hlt", options(nomem, nostack)) };
    }
}
