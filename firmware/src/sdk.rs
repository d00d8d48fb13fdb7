//! Bindings to the BL602 IoT SDK: GPIO HAL, NimBLE porting layer and the uLisp library.

use core::ffi::{c_char, c_int};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin};

use ulisp_shell::repl::{c_bytes, Evaluator, COMMAND_CAPACITY};

extern "C" {
    fn bl_gpio_enable_output(pin: u8, pullup: u8, pulldown: u8) -> c_int;
    fn bl_gpio_output_set(pin: u8, value: u8) -> c_int;

    // `time_delay` and `time_ms_to_ticks32` in the porting layer's rename header
    fn ble_npl_time_delay(ticks: u32);
    fn ble_npl_time_ms_to_ticks32(ms: u32) -> u32;

    fn setup_ulisp();
    fn execute_ulisp(line: *const c_char);
}

/// Non-zero status returned by the GPIO HAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct GpioError(pub c_int);

impl digital::Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// A GPIO configured as push-pull output, no pull-up or pull-down.
pub struct Gpio {
    pin: u8,
}

impl Gpio {
    pub fn output(pin: u8) -> Result<Self, GpioError> {
        let rc = unsafe { bl_gpio_enable_output(pin, 0, 0) };
        check(rc)?;
        Ok(Gpio { pin })
    }
}

impl ErrorType for Gpio {
    type Error = GpioError;
}

impl OutputPin for Gpio {
    fn set_low(&mut self) -> Result<(), GpioError> {
        check(unsafe { bl_gpio_output_set(self.pin, 0) })
    }

    fn set_high(&mut self) -> Result<(), GpioError> {
        check(unsafe { bl_gpio_output_set(self.pin, 1) })
    }
}

fn check(rc: c_int) -> Result<(), GpioError> {
    if rc == 0 {
        Ok(())
    } else {
        Err(GpioError(rc))
    }
}

/// Sleeps the calling task through the porting layer, millisecond resolution.
pub struct NplDelay;

impl DelayNs for NplDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_ms(ns.div_ceil(1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        unsafe { ble_npl_time_delay(ble_npl_time_ms_to_ticks32(ms)) }
    }
}

/// The uLisp interpreter.
pub struct Ulisp;

impl Ulisp {
    /// Must run once before the first command is evaluated.
    pub fn init() {
        unsafe { setup_ulisp() }
    }
}

impl Evaluator for Ulisp {
    fn evaluate(&mut self, command: &str) {
        let line = c_bytes::<COMMAND_CAPACITY>(command);
        unsafe { execute_ulisp(line.as_ptr().cast()) }
    }
}
