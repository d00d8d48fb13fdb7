//! Assert-and-halt: the one way the firmware reacts to a broken precondition.
//!
//! There is no process to return an exit code to, so a failure is printed to the
//! console, optionally followed by a stack dump, and the hart idles forever.

use core::fmt::{self, Write};

use crate::backtrace;
use crate::config::FatalConfig;

/// A failed assertion, printed as
/// `Assertion Failed "<expr>": file "<file>", line <line>[, function: <func>]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AssertionFailure<'a> {
    pub expr: &'a str,
    pub file: &'a str,
    pub line: u32,
    pub func: Option<&'a str>,
}

impl<'a> AssertionFailure<'a> {
    pub const fn new(expr: &'a str, file: &'a str, line: u32, func: Option<&'a str>) -> Self {
        AssertionFailure { expr, file, line, func }
    }
}

impl fmt::Display for AssertionFailure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Assertion Failed \"{}\": file \"{}\", line {}", self.expr, self.file, self.line)?;
        if let Some(func) = self.func {
            write!(f, ", function: {}", func)?;
        }
        Ok(())
    }
}

/// Prints `failure`, dumps the stack if configured and never returns.
pub fn assert_failed<W: Write + ?Sized>(out: &mut W, failure: &AssertionFailure<'_>, config: &FatalConfig) -> ! {
    error!("{}", failure);
    // the console is all that is left, nothing to do if it fails as well
    let _ = write!(out, "{}\r\n", failure);
    if config.dump_stack {
        let _ = backtrace::dump_stack(out, config.stack_depth, config.walk);
    }
    halt()
}

/// Idles forever.
pub fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

/// Assert-and-halt on a condition, typically the status code of an SDK call.
///
/// ```ignore
/// let rc = unsafe { bl_gpio_output_set(pin, 1) };
/// ensure!(&mut console, rc == 0, &config.fatal);
/// ```
#[macro_export]
macro_rules! ensure {
    ($out:expr, $cond:expr, $config:expr) => {
        if !$cond {
            $crate::fatal::assert_failed(
                $out,
                &$crate::fatal::AssertionFailure::new(::core::stringify!($cond), ::core::file!(), ::core::line!(), None),
                $config,
            )
        }
    };
}
