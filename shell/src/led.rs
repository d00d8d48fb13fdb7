//! Hardware agnostic LED blinking on top of the [embedded_hal] traits.
//!
//! The pin and the delay are provided by the firmware, on the BL602 they wrap the GPIO
//! HAL and the porting layer's tick delay.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};

use crate::config::BlinkConfig;

/// Level written on the `n`th update: even updates drive the pin low, odd ones high.
///
/// The LEDs on the supported boards are active low, so the sequence starts with "on".
pub fn level(n: u32) -> PinState {
    PinState::from(n % 2 == 1)
}

/// Toggles `led` `config.count` times, sleeping `config.interval_ms` after each update.
///
/// Stops at the first pin error and returns it.
pub fn blinky<P, D>(led: &mut P, delay: &mut D, config: &BlinkConfig) -> Result<(), P::Error>
where
    P: OutputPin,
    D: DelayNs,
{
    info!("blinky: {} updates every {} ms", config.count, config.interval_ms);
    for n in 0..config.count {
        led.set_state(level(n))?;
        delay.delay_ms(config.interval_ms);
    }
    Ok(())
}
