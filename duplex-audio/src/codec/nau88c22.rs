//! NAU88C22 audio codec driver.
//!
//! Brings the codec up as a bus slave on an external MCLK: 24-bit I2S,
//! stereo line inputs into the ADC, DAC through the main mixers to the
//! headphone and AUX outputs.
//!
//! Headphone volume, input gain and the 3D effect are *queued*: setters
//! only record the value, and [`update()`](Nau88c22::update) writes
//! pending values at most once per 20 ms. Writing them on every control
//! change causes audible glitches.
//!
//! # Example
//!
//! ```ignore
//! let mut codec = Nau88c22::new(i2c, delay);
//! codec.init()?;
//! codec.set_hp_volume(0x39);
//! codec.update(now_ms)?;     // call periodically
//! ```

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::registers as reg;
use crate::control::AudioControl;

// ── Public enums ───────────────────────────────────────────────────────────

/// Equalizer band (datasheet section "Equalizer").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EqBand {
    /// Low shelf.
    Band1 = 0,
    Band2 = 1,
    Band3 = 2,
    Band4 = 3,
    /// High shelf.
    Band5 = 4,
}

/// Cutoff / centre frequency selector. Meaning depends on the band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EqCutoff {
    Cutoff1 = 0,
    Cutoff2 = 1,
    Cutoff3 = 2,
    Cutoff4 = 3,
}

/// Bandwidth of the peaking bands 2..4. Ignored by the shelves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EqWidth {
    Narrow = 0,
    Wide = 1,
}

/// Which converter the equalizer sits in front of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EqPath {
    /// ADC path.
    Input = 0,
    /// DAC path.
    Output = 1,
}

/// Codec errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError<E> {
    /// Bus error.
    I2c(E),
    /// Something answered at the codec address but its id is wrong.
    UnknownDevice(u16),
}

impl<E: fmt::Debug> fmt::Display for CodecError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::I2c(err) => write!(f, "codec bus error: {err:?}"),
            CodecError::UnknownDevice(id) => write!(f, "unexpected codec id {id:#05x}"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for CodecError<E> {}

// ── Queued registers ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Queued {
    HpVolume = 0,
    InputGain = 1,
    Effect3d = 2,
}

impl Queued {
    const ALL: [Queued; 3] = [Queued::HpVolume, Queued::InputGain, Queued::Effect3d];
}

// ── Driver struct ──────────────────────────────────────────────────────────

/// NAU88C22 driver, generic over the I2C bus and a delay provider.
pub struct Nau88c22<I2C, D> {
    i2c: I2C,
    delay: D,
    /// Last requested value per queued register.
    values: [Option<u8>; 3],
    /// Queued register differs from what the codec holds.
    dirty: [bool; 3],
    zero_cross: bool,
    /// Earliest time of the next flush; `None` means now.
    next_update_ms: Option<u32>,
}

impl<I2C, D> Nau88c22<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            values: [None; 3],
            dirty: [false; 3],
            zero_cross: false,
            next_update_ms: None,
        }
    }

    // ── Low-level I2C helpers ──────────────────────────────────────────

    /// Write a 9-bit value.
    pub fn write_register(&mut self, register: u8, value: u16) -> Result<(), I2C::Error> {
        let buf = [(register << 1) | ((value >> 8) & 1) as u8, value as u8];
        self.i2c.write(reg::I2C_ADDR, &buf)
    }

    pub fn read_register(&mut self, register: u8) -> Result<u16, I2C::Error> {
        let mut buf = [0u8; 2];
        self.i2c.write_read(reg::I2C_ADDR, &[register << 1], &mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    // ── Power-on sequence ──────────────────────────────────────────────

    /// Reset the codec, check its id and run the power-up sequence.
    pub fn init(&mut self) -> Result<(), CodecError<I2C::Error>> {
        self.values = [None; 3];
        self.dirty = [false; 3];
        self.zero_cross = false;
        self.next_update_ms = None;

        self.write(reg::RESET, 0)?;
        self.delay.delay_ms(reg::RESET_SETTLE_MS);

        let id = self.read_register(reg::DEVICE_ID).map_err(CodecError::I2c)?;
        if id != reg::DEVICE_ID_VALUE {
            return Err(CodecError::UnknownDevice(id));
        }

        self.write(reg::POWER_MANAGEMENT_1, reg::PM1_INIT)?;
        self.write(reg::POWER_MANAGEMENT_2, reg::PM2_INIT)?;
        self.write(reg::POWER_MANAGEMENT_3, reg::PM3_INIT)?;
        self.write(reg::POWER_MANAGEMENT_4, reg::PM4_INIT)?;

        self.write(reg::AUDIO_INTERFACE, reg::AUDIO_INTERFACE_INIT)?;
        self.write(reg::COMPANDING_CONTROL, 0)?;
        self.write(reg::CLOCK_CONTROL_1, reg::CLOCK_CONTROL_INIT)?;
        self.write(reg::CLOCK_CONTROL_2, reg::CLOCK_CONTROL_INIT)?;

        self.write(reg::DAC_CONTROL, reg::DAC_CONTROL_INIT)?;
        self.write(reg::LEFT_DAC_DIGITAL_VOLUME, reg::LEFT_DAC_VOLUME_INIT)?;
        self.write(reg::RIGHT_DAC_DIGITAL_VOLUME, reg::RIGHT_DAC_VOLUME_INIT)?;
        self.write(reg::DAC_LIMITER_1, 0)?;
        self.write(reg::DAC_LIMITER_2, 0)?;

        self.write(reg::INPUT_CONTROL, reg::INPUT_CONTROL_INIT)?;

        self.write(reg::ADC_CONTROL, reg::ADC_CONTROL_INIT)?;
        self.write(reg::LEFT_ADC_BOOST_CONTROL, reg::ADC_BOOST_INIT)?;
        self.write(reg::RIGHT_ADC_BOOST_CONTROL, reg::ADC_BOOST_INIT)?;
        self.write(reg::LEFT_ADC_DIGITAL_VOLUME, reg::LEFT_ADC_VOLUME_INIT)?;
        self.write(reg::RIGHT_ADC_DIGITAL_VOLUME, reg::RIGHT_ADC_VOLUME_INIT)?;

        self.write(reg::OUTPUT_CONTROL, reg::OUTPUT_CONTROL_INIT)?;
        self.write(reg::LEFT_MIXER_CONTROL, reg::MIXER_INIT)?;
        self.write(reg::RIGHT_MIXER_CONTROL, reg::MIXER_INIT)?;

        self.write(reg::AUX2_MIXER_CONTROL, reg::AUX_MIXER_INIT)?;
        self.write(reg::AUX1_MIXER_CONTROL, reg::AUX_MIXER_INIT)?;

        // Take a little off the top to lower the noise floor
        // (~11.7 kHz shelf, -2 dB).
        self.set_eq_path(EqPath::Input).map_err(CodecError::I2c)?;
        self.set_eq_band(EqBand::Band5, EqCutoff::Cutoff4, -2, EqWidth::Wide)
            .map_err(CodecError::I2c)?;

        info!("NAU88C22 ready");
        Ok(())
    }

    fn write(&mut self, register: u8, value: u16) -> Result<(), CodecError<I2C::Error>> {
        self.write_register(register, value).map_err(CodecError::I2c)
    }

    // ── Queued registers ───────────────────────────────────────────────

    /// Headphone volume, 0..=63 (0x39 is 0 dB, 0x3F is +6 dB).
    pub fn set_hp_volume(&mut self, volume: u8) {
        self.queue(Queued::HpVolume, volume & reg::MAX_HP_VOLUME);
    }

    /// Input PGA gain, 0..=63 (0x10 is 0 dB).
    pub fn set_input_gain(&mut self, gain: u8) {
        self.queue(Queued::InputGain, gain & reg::MAX_INPUT_GAIN);
    }

    /// 3D stereo widening, 0..=15.
    pub fn set_3d_effect(&mut self, effect: u8) {
        self.queue(Queued::Effect3d, effect & reg::MAX_3D_EFFECT);
    }

    /// Apply volume and gain changes at zero crossings. Avoids clicks but
    /// can stall updates when the signal is very quiet.
    pub fn set_zero_cross_update(&mut self, enabled: bool) {
        self.zero_cross = enabled;
    }

    fn queue(&mut self, which: Queued, value: u8) {
        let slot = which as usize;
        if self.values[slot] == Some(value) {
            return;
        }
        self.values[slot] = Some(value);
        self.dirty[slot] = true;
    }

    /// Whether any queued register waits for a flush.
    pub fn has_pending(&self) -> bool {
        self.dirty.iter().any(|&d| d)
    }

    /// Flush queued registers unless the last flush was less than 20 ms
    /// ago. Returns whether a flush happened.
    ///
    /// `now_ms` is a free-running millisecond counter (wrapping).
    pub fn update(&mut self, now_ms: u32) -> Result<bool, I2C::Error> {
        if let Some(due) = self.next_update_ms {
            if (now_ms.wrapping_sub(due) as i32) < 0 {
                return Ok(false);
            }
        }
        self.flush()?;
        self.next_update_ms = Some(now_ms.wrapping_add(reg::UPDATE_HOLDOFF_MS));
        Ok(true)
    }

    /// Write all queued registers now.
    pub fn flush(&mut self) -> Result<(), I2C::Error> {
        let zc = if self.zero_cross { reg::ZERO_CROSS } else { 0 };
        for which in Queued::ALL {
            let slot = which as usize;
            let Some(value) = self.values[slot].filter(|_| self.dirty[slot]) else {
                continue;
            };
            self.dirty[slot] = false;
            let value = value as u16;
            match which {
                Queued::HpVolume => {
                    self.write_register(reg::LEFT_HP_VOLUME, reg::UPDATE_BOTH | value | zc)?;
                    self.write_register(reg::RIGHT_HP_VOLUME, reg::UPDATE_BOTH | value | zc)?;
                }
                Queued::InputGain => {
                    self.write_register(reg::LEFT_INP_PGA_CONTROL, reg::UPDATE_BOTH | value | zc)?;
                    self.write_register(reg::RIGHT_INP_PGA_CONTROL, reg::UPDATE_BOTH | value | zc)?;
                }
                Queued::Effect3d => self.write_register(reg::CONTROL_3D, value)?,
            }
        }
        Ok(())
    }

    // ── Equalizer ──────────────────────────────────────────────────────

    /// Place the equalizer in the ADC or DAC path.
    pub fn set_eq_path(&mut self, path: EqPath) -> Result<(), I2C::Error> {
        let current = self.read_register(reg::EQ1)? & !reg::EQ_PATH_BIT;
        self.write_register(reg::EQ1, current | ((path as u16) << 8))
    }

    /// Configure one band. `gain_db` is clamped to ±12 dB.
    pub fn set_eq_band(
        &mut self,
        band: EqBand,
        cutoff: EqCutoff,
        gain_db: i8,
        width: EqWidth,
    ) -> Result<(), I2C::Error> {
        let gain = gain_db.clamp(-reg::EQ_MAX_GAIN_DB, reg::EQ_MAX_GAIN_DB);
        // Register gain counts down from +12 dB.
        let code = (reg::EQ_MAX_GAIN_DB - gain) as u16;

        let high = match band {
            // EQ1 bit 8 is the path selector; keep it.
            EqBand::Band1 => self.read_register(reg::EQ1)? & reg::EQ_PATH_BIT,
            EqBand::Band5 => 0,
            _ => (width as u16) << reg::EQ_WIDTH_SHIFT,
        };
        let value = high | ((cutoff as u16) << reg::EQ_CUTOFF_SHIFT) | code;
        self.write_register(reg::EQ1 + band as u8, value)
    }

    // ── Mute ───────────────────────────────────────────────────────────

    /// Soft-mute or unmute the DAC.
    pub fn set_dac_mute(&mut self, muted: bool) -> Result<(), I2C::Error> {
        let value = if muted {
            reg::DAC_CONTROL_INIT | reg::DAC_SOFT_MUTE
        } else {
            reg::DAC_CONTROL_INIT
        };
        self.write_register(reg::DAC_CONTROL, value)
    }

    /// Consume the driver and return the bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// 0.0..=1.0 to a 0..=63 headphone volume code.
    fn volume_code(level: f32) -> u8 {
        (level.clamp(0.0, 1.0) * reg::MAX_HP_VOLUME as f32 + 0.499) as u8
    }
}

// ── AudioControl trait ─────────────────────────────────────────────────────

impl<I2C, D> AudioControl for Nau88c22<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = CodecError<I2C::Error>;

    fn enable(&mut self) -> Result<(), Self::Error> {
        self.init()
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        self.set_dac_mute(true).map_err(CodecError::I2c)
    }

    /// Sets the headphone volume and writes it immediately.
    fn volume(&mut self, level: f32) -> Result<(), Self::Error> {
        let code = Self::volume_code(level);
        self.set_hp_volume(code);
        self.flush().map_err(CodecError::I2c)
    }

    fn service(&mut self, now_ms: u32) -> Result<bool, Self::Error> {
        self.update(now_ms).map_err(CodecError::I2c)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
