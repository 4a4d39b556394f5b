//! Kernel implementation of the syscall table.

use crate::boot::BootSnapshot;
use crate::state::KernelState;
use kernel_sync::McsLock;
use log::info;
use stdlib::syscall_abi::{Error, MAX_ARGS, SyscallHandler, SyscallResult, dispatch};

/// Longest message a single `log` call may pass.
pub const MAX_LOG_MESSAGE: usize = 1024;

/// Where `debug_write_byte` output goes.
pub trait DebugSink {
    fn put(&self, byte: u8);
}

impl<F: Fn(u8)> DebugSink for F {
    fn put(&self, byte: u8) {
        self(byte);
    }
}

/// Syscall handlers over the published boot snapshot and the shared state.
pub struct KernelSyscalls<'a, S> {
    boot: &'a BootSnapshot,
    state: &'a McsLock<KernelState>,
    console: S,
}

impl<'a, S: DebugSink> KernelSyscalls<'a, S> {
    pub const fn new(boot: &'a BootSnapshot, state: &'a McsLock<KernelState>, console: S) -> Self {
        Self {
            boot,
            state,
            console,
        }
    }

    /// Entry point for the architecture's syscall stub: `rax` in, `rax` out.
    pub fn handle(&mut self, number: u64, args: [u64; MAX_ARGS]) -> u64 {
        self.state.with_lock(|state| state.syscalls += 1);
        dispatch(self, number, args)
    }
}

/// Longest buffer a slice may span.
const MAX_USER_RANGE: usize = isize::MAX.unsigned_abs();

/// Validates a user buffer. Zero-length buffers may be null.
fn user_range(ptr: *const u8, len: usize, max: usize) -> Result<(), Error> {
    if len > max.min(MAX_USER_RANGE) || (len != 0 && ptr.is_null()) {
        return Err(Error::InvalidArgument);
    }
    if (ptr as usize).checked_add(len).is_none() {
        return Err(Error::InvalidArgument);
    }
    Ok(())
}

impl<S: DebugSink> SyscallHandler for KernelSyscalls<'_, S> {
    fn noop(&mut self) -> SyscallResult {
        Ok(0)
    }

    fn log(&mut self, message: *const u8, len: usize) -> SyscallResult {
        user_range(message, len, MAX_LOG_MESSAGE)?;
        if len == 0 {
            return Ok(0);
        }

        // TODO: check the range against the caller's address space once user
        // address spaces exist; until then all memory is identity mapped.
        // SAFETY: non-null and bounded by `user_range`.
        let bytes = unsafe { core::slice::from_raw_parts(message, len) };
        self.state.with_lock(|state| state.log.push(bytes));
        info!(target: "user", "{}", core::str::from_utf8(bytes).unwrap_or("<binary>"));
        Ok(len as u64)
    }

    fn debug_write_byte(&mut self, byte: u8) -> SyscallResult {
        self.console.put(byte);
        Ok(0)
    }

    fn get_log(&mut self, buffer: *mut u8, len: usize) -> SyscallResult {
        user_range(buffer.cast_const(), len, MAX_USER_RANGE)?;
        if len == 0 {
            return Ok(0);
        }

        // SAFETY: as for `log`.
        let out = unsafe { core::slice::from_raw_parts_mut(buffer, len) };
        let copied = self.state.with_lock(|state| state.log.drain_into(out));
        Ok(copied as u64)
    }

    fn boot_flags(&mut self) -> SyscallResult {
        Ok(u64::from(self.boot.flags().into_bits()))
    }

    fn memory_region_count(&mut self) -> SyscallResult {
        Ok(self.boot.memory_map().len() as u64)
    }
}
