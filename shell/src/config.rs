//! Compile-time board configuration.
//!
//! The firmware picks one of the board presets via Cargo features; everything has a
//! `const` constructor so the result can live in a `static`.

/// PineCone: the blue LED is connected on GPIO 11
pub const PINECONE_LED_GPIO: u8 = 11;

/// PineDio Stack: the LCD backlight is connected on GPIO 21
pub const PINEDIO_LED_GPIO: u8 = 21;

/// Number of words read by the stack walker
pub const STACK_DEPTH: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkConfig {
    /// number of pin updates
    pub count: u32,

    /// sleep after each pin update
    pub interval_ms: u32,
}

impl BlinkConfig {
    pub const fn new() -> Self {
        BlinkConfig {
            count: 10,
            interval_ms: 1000,
        }
    }
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// How the stack walker advances from one frame to the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Walk {
    /// read `depth` consecutive words upwards from the frame pointer
    Scan,

    /// follow the saved frame pointers, stop at a null or misaligned one
    Chain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FatalConfig {
    /// dump the stack after printing the failure
    pub dump_stack: bool,

    pub stack_depth: usize,

    pub walk: Walk,
}

impl FatalConfig {
    pub const fn new() -> Self {
        FatalConfig {
            dump_stack: true,
            stack_depth: STACK_DEPTH,
            walk: Walk::Scan,
        }
    }
}

impl Default for FatalConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// GPIO pin driven by `blinky`
    pub led_gpio: u8,

    pub blink: BlinkConfig,

    pub fatal: FatalConfig,
}

impl Config {
    pub const fn pinecone() -> Self {
        Config {
            led_gpio: PINECONE_LED_GPIO,
            blink: BlinkConfig::new(),
            fatal: FatalConfig::new(),
        }
    }

    pub const fn pinedio() -> Self {
        Config {
            led_gpio: PINEDIO_LED_GPIO,
            ..Self::pinecone()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::pinecone()
    }
}
