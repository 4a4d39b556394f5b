#![no_std]
#![no_main]

use stdlib::proto::{service_locator, vfs};
use stdlib::syscall::sys;
use stdlib::{print, print_hex, println};

#[unsafe(no_mangle)]
pub extern "C" fn _start() -> ! {
    println!("Init process started successfully!");

    match sys::noop() {
        Ok(_) => println!("noop: ok"),
        Err(e) => println!("noop: {e}"),
    }

    if let Err(e) = stdlib::log("init: hello, kernel log\n") {
        println!("log failed: {e}");
    }

    let mut buf = [0u8; 128];
    match sys::get_log(buf.as_mut_ptr(), buf.len()) {
        Ok(n) => {
            let n = usize::try_from(n).unwrap_or(0).min(buf.len());
            println!(
                "kernel log: {}",
                core::str::from_utf8(&buf[..n]).unwrap_or("<binary>")
            );
        }
        Err(e) => println!("get_log failed: {e}"),
    }

    if let (Ok(flags), Ok(count)) = (sys::boot_flags(), sys::memory_region_count()) {
        print!("boot flags: 0x");
        print_hex(flags);
        println!(", {count} memory regions");
    }

    println!(
        "{} = {:#018x}, {} = {:#018x}",
        service_locator::NAME,
        service_locator::ID,
        vfs::NAME,
        vfs::ID,
    );

    loop {
        core::hint::spin_loop();
    }
}
