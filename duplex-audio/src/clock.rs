//! PIO clock-divider calculation.
//!
//! A PIO state machine advances at `sys_clk / (integer + fraction / 256)`.
//! Both clock programs toggle their output once per instruction, so a
//! waveform of frequency `f` needs the state machine to run at `2f`.

use crate::constants::{MCLK_MULTIPLIER, WIRE_BIT_DEPTH};

/// A PIO clock divider: `integer + fraction / 256`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FractionalDivider {
    /// Integer part of the divider.
    pub integer: u16,
    /// Fractional part in 1/256ths.
    pub fraction: u8,
}

impl FractionalDivider {
    /// The divider as a float (`integer + fraction / 256`).
    pub fn as_f32(&self) -> f32 {
        self.integer as f32 + self.fraction as f32 / 256.0
    }
}

/// Divider that makes a state machine run at `target_frequency_hz`.
///
/// The fractional part is rounded half-up to 1/256. No range checks are
/// done: a target faster than the system clock or slow enough to overflow
/// the 16-bit integer part saturates instead of panicking.
pub fn calculate_divider(system_clock_hz: f32, target_frequency_hz: f32) -> FractionalDivider {
    let divider = system_clock_hz / target_frequency_hz;
    let whole = libm::floorf(divider);
    let fraction = libm::floorf((divider - whole) * 256.0 + 0.5);
    if fraction >= 256.0 {
        // Rounded up to the next whole step.
        return FractionalDivider {
            integer: (whole as u16).saturating_add(1),
            fraction: 0,
        };
    }
    FractionalDivider {
        integer: whole as u16,
        fraction: fraction as u8,
    }
}

/// Divider for the master-clock generator (`MCLK = 256 × Fs`).
pub fn mclk_divider(system_clock_hz: f32, sample_rate: f32) -> FractionalDivider {
    let mclk = MCLK_MULTIPLIER * sample_rate;
    calculate_divider(system_clock_hz, 2.0 * mclk)
}

/// Divider for the bit-clock driven programs (`BCLK = Fs × 32 × 2`).
pub fn bclk_divider(system_clock_hz: f32, sample_rate: f32) -> FractionalDivider {
    let bclk = sample_rate * WIRE_BIT_DEPTH * 2.0;
    calculate_divider(system_clock_hz, 2.0 * bclk)
}
