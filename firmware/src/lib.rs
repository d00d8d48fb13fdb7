//! uLisp shell for the BL602 IoT SDK.
//!
//! Linked into the SDK image as a static library. The SDK's command-line interface
//! calls [rust_cli] for every command listed in [cmd::COMMANDS], [cli_init] once at
//! startup, and [__assert_func] whenever a C `assert()` fails.
#![no_std]

#[macro_use]
mod console;
mod sdk;

use core::ffi::{c_char, c_int, CStr};
use core::panic::PanicInfo;

use ulisp_shell::args::{self, ArgError, Args};
use ulisp_shell::backtrace;
use ulisp_shell::cmd::{self, Command};
use ulisp_shell::config::Config;
use ulisp_shell::ensure;
use ulisp_shell::fatal::{self, AssertionFailure};
use ulisp_shell::led;
use ulisp_shell::repl::{Accepted, SharedAccumulator, COMMAND_CAPACITY};

use console::Console;
use sdk::{Gpio, GpioError, NplDelay, Ulisp};

use {defmt_rtt as _, riscv as _};

const CONFIG: Config = if cfg!(feature = "pinedio") {
    Config::pinedio()
} else {
    Config::pinecone()
};

/// the one command buffer of the console
static SHELL: SharedAccumulator = SharedAccumulator::new();

/// Init the command-line interface
#[no_mangle]
pub extern "C" fn cli_init() -> c_int {
    Ulisp::init();
    defmt::info!("uLisp shell ready, LED on GPIO {}", CONFIG.led_gpio);
    0
}

/// Handler of every Rust command: `argv[0]` selects the command.
///
/// # Safety
///
/// `argv` must point to `argc` pointers, as the SDK's command-line interface passes them.
#[no_mangle]
pub unsafe extern "C" fn rust_cli(_buf: *mut c_char, _len: c_int, argc: c_int, argv: *mut *mut c_char) {
    let args = match unsafe { decode_argv(argc, argv.cast()) } {
        Ok(args) => args,
        // the SDK never hands over a broken argv
        Err(err) => panic!("rust_cli: {}", err),
    };

    match cmd::parse(&args) {
        Ok(Command::Lisp(tokens)) => lisp(tokens),
        Ok(Command::Cancel) => cancel(),
        Ok(Command::Blinky) => blinky(),
        Ok(Command::DumpStack) => dump_stack(),
        Ok(Command::Help) => help(),
        Err(err) => println!("{}", err),
    }
}

unsafe fn decode_argv<'a>(argc: c_int, argv: *const *const c_char) -> Result<Args<'a>, ArgError> {
    if argv.is_null() {
        return Err(ArgError::Null(0));
    }
    let argc = usize::try_from(argc).unwrap_or(0);

    args::collect((0..argc).map(|i| {
        let arg = unsafe { *argv.add(i) };
        (!arg.is_null()).then(|| unsafe { CStr::from_ptr(arg) }.to_bytes())
    }))
}

fn lisp(tokens: &[&str]) {
    match SHELL.accept_line(tokens, &mut Ulisp) {
        Accepted::Pending => defmt::debug!("waiting for the rest of the command"),
        Accepted::Dispatched { truncated: false } => {}
        Accepted::Dispatched { truncated: true } => {
            println!("warning: command cut to {} bytes", COMMAND_CAPACITY - 1)
        }
    }
}

fn cancel() {
    let pending = SHELL.pending();
    SHELL.discard();
    if pending {
        println!("continued command dropped");
    }
}

/// Blink the LED
fn blinky() {
    println!("Hello from Blinky!");

    let res = Gpio::output(CONFIG.led_gpio).and_then(|mut pin| led::blinky(&mut pin, &mut NplDelay, &CONFIG.blink));
    let rc = match res {
        Ok(()) => 0,
        Err(GpioError(rc)) => rc,
    };
    // halt on error
    ensure!(&mut Console, rc == 0, &CONFIG.fatal);
}

fn help() {
    for info in cmd::COMMANDS {
        println!("{:<24} : {}", info.name, info.help);
    }
}

/// Dump the current stack
#[no_mangle]
pub extern "C" fn dump_stack() {
    let _ = backtrace::dump_stack(&mut Console, CONFIG.fatal.stack_depth, CONFIG.fatal.walk);
    println!();
}

/// Replaces the SDK's silent default so failed assertions show up on the console.
///
/// # Safety
///
/// The pointers must be null or point to NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn __assert_func(
    file: *const c_char,
    line: c_int,
    func: *const c_char,
    failedexpr: *const c_char,
) -> ! {
    let failure = unsafe {
        AssertionFailure::new(
            c_str(failedexpr),
            c_str(file),
            u32::try_from(line).unwrap_or(0),
            (!func.is_null()).then(|| c_str(func)),
        )
    };
    fatal::assert_failed(&mut Console, &failure, &CONFIG.fatal)
}

unsafe fn c_str<'a>(ptr: *const c_char) -> &'a str {
    if ptr.is_null() {
        return "?";
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or("?")
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    match info.location() {
        Some(location) => println!("panic at {}:{}: {}", location.file(), location.line(), info.message()),
        None => println!("panic: {}", info.message()),
    }

    if CONFIG.fatal.dump_stack {
        let _ = backtrace::dump_stack(&mut Console, CONFIG.fatal.stack_depth, CONFIG.fatal.walk);
    }
    fatal::halt()
}
