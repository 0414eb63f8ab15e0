//! Shutdown signalling for the power management board.

use rppal::gpio::{Gpio, OutputPin};
use std::error::Error;

/// The GPIO output used to request a power cut.
pub trait PowerPin {
    /// Drives the pin low. The power management board latches this as a
    /// shutdown request.
    fn drive_low(&mut self) -> Result<(), Box<dyn Error>>;
    /// Releases the pin resources.
    fn release(&mut self);
}

/// Shutdown pin on the Pi header.
pub struct GpioPowerPin {
    pin: Option<OutputPin>,
}

impl GpioPowerPin {
    /// Claims the given BCM pin as an output.
    pub fn new(bcm_pin: u8) -> Result<Self, Box<dyn Error>> {
        let pin = Gpio::new()?.get(bcm_pin)?.into_output();
        Ok(Self { pin: Some(pin) })
    }
}

impl PowerPin for GpioPowerPin {
    fn drive_low(&mut self) -> Result<(), Box<dyn Error>> {
        match self.pin.as_mut() {
            Some(pin) => {
                pin.set_low();
                Ok(())
            }
            None => Err("shutdown pin already released".into()),
        }
    }

    fn release(&mut self) {
        // The board latches the low pulse; the pin resets on drop.
        self.pin.take();
    }
}

/// Signals the power management board to cut power.
/// A drive failure is logged; the pin is released on every path.
pub fn power_off(pin: &mut dyn PowerPin) {
    match pin.drive_low() {
        Ok(()) => log::info!("GPIO shutdown executed successfully"),
        Err(e) => log::error!("Can't execute GPIO shutdown: {}", e),
    }
    pin.release();
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockPin {
        fail: bool,
        drove_low: bool,
        released: bool,
    }

    impl PowerPin for MockPin {
        fn drive_low(&mut self) -> Result<(), Box<dyn Error>> {
            if self.fail {
                return Err("gpio busy".into());
            }
            self.drove_low = true;
            Ok(())
        }

        fn release(&mut self) {
            self.released = true;
        }
    }

    #[test]
    fn power_off_drives_and_releases() {
        let mut pin = MockPin {
            fail: false,
            drove_low: false,
            released: false,
        };
        power_off(&mut pin);
        assert!(pin.drove_low);
        assert!(pin.released);
    }

    #[test]
    fn power_off_releases_even_on_drive_failure() {
        let mut pin = MockPin {
            fail: true,
            drove_low: false,
            released: false,
        };
        power_off(&mut pin);
        assert!(!pin.drove_low);
        assert!(pin.released);
    }
}
