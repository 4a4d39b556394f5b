use kernel_core::{EarlyKernel, InitError};
use kernel_info::boot::{BootDescriptor, BootDescriptorBuilder, BootInfo};
use kernel_info::memory::{MemoryKind, MemoryRegion};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const RSDP: [u8; 20] = *b"RSD PTR \0\0\0\0\0\0\0\0\0\0\0\0";

fn with_info<R>(descriptor: &BootDescriptor, f: impl FnOnce(&BootInfo<'_>) -> R) -> R {
    let info = unsafe { BootDescriptor::decode(descriptor) }.unwrap();
    f(&info)
}

#[test]
fn init_publishes_snapshot_and_opens_gate() {
    let kernel = EarlyKernel::new();
    let map = [
        MemoryRegion::new(0, 16, MemoryKind::Free, 0),
        MemoryRegion::new(0x10_0000, 32, MemoryKind::Pending, 0),
    ];
    let descriptor = BootDescriptorBuilder::new()
        .acpi(&RSDP, 0xe_0000)
        .memory_map(&map)
        .build();

    assert!(kernel.boot().is_none());
    assert!(!kernel.gate().is_open());
    assert!(kernel.syscalls(|_: u8| {}).is_none());

    with_info(&descriptor, |info| {
        let boot = kernel.init(info).unwrap();
        assert_eq!(boot.memory_map(), &map);
        assert_eq!(boot.acpi_root(), 0xe_0000);
    });

    assert!(kernel.gate().is_open());
    assert_eq!(kernel.boot().unwrap().acpi_table(), &RSDP);
    assert!(kernel.state().with_lock(|s| !s.log.is_empty()));
}

#[test]
fn second_init_is_rejected() {
    let kernel = EarlyKernel::new();
    let descriptor = BootDescriptorBuilder::new().acpi(&RSDP, 1).build();
    with_info(&descriptor, |info| {
        kernel.init(info).unwrap();
        assert_eq!(kernel.init(info).unwrap_err(), InitError::AlreadyInitialized);
    });
}

#[test]
fn missing_acpi_is_a_warning_unless_panic_flag_set() {
    let lenient = EarlyKernel::new();
    let descriptor = BootDescriptorBuilder::new().build();
    with_info(&descriptor, |info| assert!(lenient.init(info).is_ok()));

    let strict = EarlyKernel::new();
    let descriptor = BootDescriptorBuilder::new().panic(true).build();
    with_info(&descriptor, |info| {
        assert_eq!(strict.init(info).unwrap_err(), InitError::NoAcpiRoot);
    });
    assert!(!strict.gate().is_open());
    assert!(strict.boot().is_none());
}

#[test]
fn secondary_cores_see_published_snapshot() {
    const CORES: usize = 4;

    let kernel = Arc::new(EarlyKernel::new());
    let started = Arc::new(Barrier::new(CORES + 1));
    let seen = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..CORES)
        .map(|_| {
            let kernel = Arc::clone(&kernel);
            let started = Arc::clone(&started);
            let seen = Arc::clone(&seen);
            thread::spawn(move || {
                started.wait();
                let boot = kernel.secondary_entry();
                assert_eq!(boot.memory_map().len(), 1);
                assert_eq!(boot.acpi_root(), 0x1234);
                seen.fetch_add(1, Ordering::Relaxed);
            })
        })
        .collect();

    started.wait();
    // nobody may get past the gate yet
    assert_eq!(seen.load(Ordering::Relaxed), 0);

    let map = [MemoryRegion::new(0, 4, MemoryKind::Free, 0)];
    let descriptor = BootDescriptorBuilder::new()
        .acpi(&RSDP, 0x1234)
        .memory_map(&map)
        .build();
    with_info(&descriptor, |info| kernel.init(info).map(|_| ())).unwrap();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(seen.load(Ordering::Relaxed), CORES);
}
