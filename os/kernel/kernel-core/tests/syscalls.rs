use kernel_core::syscall::MAX_LOG_MESSAGE;
use kernel_core::EarlyKernel;
use kernel_info::boot::{BootDescriptor, BootDescriptorBuilder};
use kernel_info::memory::{MemoryKind, MemoryRegion};
use std::cell::RefCell;
use stdlib::status::{Error, Status};
use stdlib::syscall_abi::Sysno;

fn booted(map: &[MemoryRegion]) -> EarlyKernel {
    let kernel = EarlyKernel::new();
    let descriptor = BootDescriptorBuilder::new()
        .acpi(b"RSD PTR ", 0xe_0000)
        .memory_map(map)
        .panic(true)
        .build();
    let info = unsafe { BootDescriptor::decode(&raw const descriptor) }.unwrap();
    kernel.init(&info).unwrap();
    kernel
}

fn call(kernel: &EarlyKernel, sysno: Sysno, args: &[u64]) -> Result<u64, Error> {
    let mut raw = [0u64; 6];
    raw[..args.len()].copy_from_slice(args);
    let mut syscalls = kernel.syscalls(|_: u8| {}).unwrap();
    Status::from_raw(syscalls.handle(sysno.number(), raw)).into_result()
}

#[test]
fn boot_queries() {
    let map = [
        MemoryRegion::new(0, 1, MemoryKind::Free, 0),
        MemoryRegion::new(0x1000, 1, MemoryKind::Reserved, 0),
    ];
    let kernel = booted(&map);
    assert_eq!(call(&kernel, Sysno::Noop, &[]), Ok(0));
    assert_eq!(call(&kernel, Sysno::MemoryRegionCount, &[]), Ok(2));
    // only the panic flag: no framebuffer and no symbols
    assert_eq!(call(&kernel, Sysno::BootFlags, &[]), Ok(0b010));
    assert_eq!(kernel.state().with_lock(|s| s.syscalls), 3);
}

#[test]
fn log_then_get_log() {
    let kernel = booted(&[]);
    // drop the init note
    let mut scratch = [0u8; 256];
    call(&kernel, Sysno::GetLog, &[scratch.as_mut_ptr() as u64, scratch.len() as u64]).unwrap();

    let message = b"hello from init";
    let written = call(&kernel, Sysno::Log, &[message.as_ptr() as u64, message.len() as u64]);
    assert_eq!(written, Ok(message.len() as u64));

    let mut out = [0u8; 64];
    let read = call(&kernel, Sysno::GetLog, &[out.as_mut_ptr() as u64, out.len() as u64]).unwrap();
    assert_eq!(&out[..read as usize], message);

    let read = call(&kernel, Sysno::GetLog, &[out.as_mut_ptr() as u64, out.len() as u64]).unwrap();
    assert_eq!(read, 0);
}

#[test]
fn log_rejects_bad_buffers() {
    let kernel = booted(&[]);
    assert_eq!(
        call(&kernel, Sysno::Log, &[0, 4]),
        Err(Error::InvalidArgument)
    );

    let long = vec![b'x'; MAX_LOG_MESSAGE + 1];
    assert_eq!(
        call(&kernel, Sysno::Log, &[long.as_ptr() as u64, long.len() as u64]),
        Err(Error::InvalidArgument)
    );

    // empty messages are fine, even without a buffer
    assert_eq!(call(&kernel, Sysno::Log, &[0, 0]), Ok(0));
}

#[test]
fn get_log_rejects_oversized_length() {
    let kernel = booted(&[]);
    let mut out = [0u8; 16];
    let too_long = isize::MAX as u64 + 1;
    assert_eq!(
        call(&kernel, Sysno::GetLog, &[out.as_mut_ptr() as u64, too_long]),
        Err(Error::InvalidArgument)
    );
    assert_eq!(
        call(&kernel, Sysno::GetLog, &[out.as_mut_ptr() as u64, u64::MAX]),
        Err(Error::InvalidArgument)
    );

    // the log is untouched
    let read = call(&kernel, Sysno::GetLog, &[out.as_mut_ptr() as u64, out.len() as u64]).unwrap();
    assert!(read > 0);
}

#[test]
fn debug_write_byte_reaches_console() {
    let kernel = booted(&[]);
    let seen = RefCell::new(Vec::new());
    let mut syscalls = kernel.syscalls(|b: u8| seen.borrow_mut().push(b)).unwrap();
    for &b in b"ok" {
        let status = syscalls.handle(Sysno::DebugWriteByte.number(), [u64::from(b), 0, 0, 0, 0, 0]);
        assert_eq!(status, 0);
    }
    drop(syscalls);
    assert_eq!(seen.into_inner(), b"ok");
}

#[test]
fn unknown_number_is_invalid_syscall() {
    let kernel = booted(&[]);
    let mut syscalls = kernel.syscalls(|_: u8| {}).unwrap();
    let status = Status::from_raw(syscalls.handle(Sysno::COUNT as u64, [0; 6]));
    assert_eq!(status.into_result(), Err(Error::InvalidSyscall));
}
