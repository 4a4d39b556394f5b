use kernel_info::layout::{ENTRY_OFFSET, KERNEL_STACK_SIZE, PHYS_LOAD};
use std::{env, path::PathBuf};

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("set by cargo"));
    let ld = manifest_dir.join("kernel.ld");

    // Sanity checks (fail fast during build)
    assert_eq!(
        PHYS_LOAD & 0xfff,
        0,
        "PHYS_LOAD must be 4 KiB aligned (got {PHYS_LOAD:#x})"
    );
    assert_eq!(ENTRY_OFFSET, 0, "the linker script places the entry stub first");
    assert!(KERNEL_STACK_SIZE >= 16 * 1024, "boot stack too small");

    println!("cargo:rerun-if-changed={}", ld.display());
    println!("cargo:rustc-link-arg-bins=-T{}", ld.display());

    // Symbols for the linker script
    println!("cargo:rustc-link-arg-bins=--defsym=PHYS_LOAD={PHYS_LOAD:#x}");
}
