//! Serial console output through the SDK's `printf`.

use core::ffi::{c_char, c_int};
use core::fmt;

extern "C" {
    fn printf(format: *const c_char, ...) -> c_int;
}

/// [fmt::Write] on the serial console.
pub struct Console;

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // `%.*s` because `s` is not NUL-terminated
        let len = c_int::try_from(s.len()).map_err(|_| fmt::Error)?;
        unsafe { printf(c"%.*s".as_ptr(), len, s.as_ptr()) };
        Ok(())
    }
}

/// `println!` on the serial console, lines end with `\r\n`.
#[macro_export]
macro_rules! println {
    () => {
        $crate::console::write_fmt(format_args!("\r\n"))
    };
    ($($arg:tt)*) => {
        $crate::console::write_fmt(format_args!("{}\r\n", format_args!($($arg)*)))
    };
}

pub fn write_fmt(args: fmt::Arguments<'_>) {
    // nowhere to report a failing console
    let _ = fmt::Write::write_fmt(&mut Console, args);
}
