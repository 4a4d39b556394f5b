//! # Trace output
//!
//! Dumps the descriptor to the QEMU debug port right before the jump. Runs
//! after `ExitBootServices`, so it goes straight to the port.

use kernel_info::boot::BootDescriptor;
use kernel_qemu::qemu_trace;

pub fn trace_descriptor(descriptor: &BootDescriptor) {
    qemu_trace!("Boot descriptor in UEFI Loader:\n");
    qemu_trace!(
        "   BD ptr = {:018x}, version = {}, length = {}, flags = {:#05b}\n",
        core::ptr::from_ref(descriptor) as usize,
        descriptor.version,
        descriptor.length,
        descriptor.flags
    );
    qemu_trace!(
        " ACPI ptr = {:018x}, len = {}, root = {:018x}\n",
        descriptor.acpi.table.ptr,
        descriptor.acpi.table.count,
        descriptor.acpi.root
    );
    qemu_trace!(
        " MMAP ptr = {:018x}, regions = {}\n",
        descriptor.memory_map.ptr,
        descriptor.memory_map.count
    );
    qemu_trace!(
        "   FB ptr = {:018x}, size = {}, {}x{} stride {} format {}\n",
        descriptor.framebuffer.buffer.ptr,
        descriptor.framebuffer.buffer.count,
        descriptor.framebuffer.width,
        descriptor.framebuffer.height,
        descriptor.framebuffer.stride,
        descriptor.framebuffer.format
    );
    qemu_trace!(
        "  SYM ptr = {:018x}, len = {}\n",
        descriptor.symbol_table.ptr,
        descriptor.symbol_table.count
    );
}
