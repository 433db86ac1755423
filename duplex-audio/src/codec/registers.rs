//! NAU88C22 register addresses and field values.
//!
//! Registers are 7-bit addresses holding 9-bit values. On the wire the
//! value's bit 8 rides in the low bit of the address byte.

// The full map is listed; the driver only touches part of it.
#![allow(dead_code)]

// ── I2C ────────────────────────────────────────────────────────────────────

/// 7-bit I2C address (the datasheet's 0x34 includes the R/W bit).
pub const I2C_ADDR: u8 = 0x1A;

/// Expected content of [`DEVICE_ID`].
pub const DEVICE_ID_VALUE: u16 = 0x01A;

// ── Register map ───────────────────────────────────────────────────────────

pub const RESET: u8 = 0x00;
pub const POWER_MANAGEMENT_1: u8 = 0x01;
pub const POWER_MANAGEMENT_2: u8 = 0x02;
pub const POWER_MANAGEMENT_3: u8 = 0x03;
pub const AUDIO_INTERFACE: u8 = 0x04;
pub const COMPANDING_CONTROL: u8 = 0x05;
pub const CLOCK_CONTROL_1: u8 = 0x06;
pub const CLOCK_CONTROL_2: u8 = 0x07;
pub const GPIO_CONTROL: u8 = 0x08;
pub const JACK_DETECT_CONTROL_1: u8 = 0x09;
pub const DAC_CONTROL: u8 = 0x0A;
pub const LEFT_DAC_DIGITAL_VOLUME: u8 = 0x0B;
pub const RIGHT_DAC_DIGITAL_VOLUME: u8 = 0x0C;
pub const JACK_DETECT_CONTROL_2: u8 = 0x0D;
pub const ADC_CONTROL: u8 = 0x0E;
pub const LEFT_ADC_DIGITAL_VOLUME: u8 = 0x0F;
pub const RIGHT_ADC_DIGITAL_VOLUME: u8 = 0x10;
pub const EQ1: u8 = 0x12;
pub const EQ2: u8 = 0x13;
pub const EQ3: u8 = 0x14;
pub const EQ4: u8 = 0x15;
pub const EQ5: u8 = 0x16;
pub const DAC_LIMITER_1: u8 = 0x18;
pub const DAC_LIMITER_2: u8 = 0x19;
pub const NOTCH_FILTER_1: u8 = 0x1B;
pub const NOTCH_FILTER_2: u8 = 0x1C;
pub const NOTCH_FILTER_3: u8 = 0x1D;
pub const NOTCH_FILTER_4: u8 = 0x1E;
pub const ALC_CONTROL_1: u8 = 0x20;
pub const ALC_CONTROL_2: u8 = 0x21;
pub const ALC_CONTROL_3: u8 = 0x22;
pub const NOISE_GATE: u8 = 0x23;
pub const PLL_N: u8 = 0x24;
pub const PLL_K1: u8 = 0x25;
pub const PLL_K2: u8 = 0x26;
pub const PLL_K3: u8 = 0x27;
pub const CONTROL_3D: u8 = 0x29;
pub const BEEP_CONTROL: u8 = 0x2B;
pub const INPUT_CONTROL: u8 = 0x2C;
pub const LEFT_INP_PGA_CONTROL: u8 = 0x2D;
pub const RIGHT_INP_PGA_CONTROL: u8 = 0x2E;
pub const LEFT_ADC_BOOST_CONTROL: u8 = 0x2F;
pub const RIGHT_ADC_BOOST_CONTROL: u8 = 0x30;
pub const OUTPUT_CONTROL: u8 = 0x31;
pub const LEFT_MIXER_CONTROL: u8 = 0x32;
pub const RIGHT_MIXER_CONTROL: u8 = 0x33;
pub const LEFT_HP_VOLUME: u8 = 0x34;
pub const RIGHT_HP_VOLUME: u8 = 0x35;
pub const LOUT2_SPK_CONTROL: u8 = 0x36;
pub const ROUT2_SPK_CONTROL: u8 = 0x37;
pub const AUX2_MIXER_CONTROL: u8 = 0x38;
pub const AUX1_MIXER_CONTROL: u8 = 0x39;
pub const POWER_MANAGEMENT_4: u8 = 0x3A;
pub const REVISION: u8 = 0x3E;
pub const DEVICE_ID: u8 = 0x3F;
pub const DAC_DITHER: u8 = 0x41;
pub const MISC_CONTROLS: u8 = 0x49;

// ── Init values ────────────────────────────────────────────────────────────

/// AUX mixers, internal bias 80 kΩ. PLL and mic bias off.
pub const PM1_INIT: u16 = 0b0_1101_1111;
/// Headphone L/R, ADC mix/boost, ADC L/R.
pub const PM2_INIT: u16 = 0b1_1011_1111;
/// AUX outputs, main mixers, DAC L/R. Speaker off.
pub const PM3_INIT: u16 = 0b1_1000_1111;
/// No power saving.
pub const PM4_INIT: u16 = 0;

/// 24-bit I2S, stereo, ADC channels swapped (the board routes them
/// crossed).
pub const AUDIO_INTERFACE_INIT: u16 = 0b0_0101_0010;

/// External MCLK, codec is bus slave.
pub const CLOCK_CONTROL_INIT: u16 = 0;

/// DAC 128× oversampling, soft mute off.
pub const DAC_CONTROL_INIT: u16 = 0b0_0000_1000;
/// Bit 6 of DAC_CONTROL.
pub const DAC_SOFT_MUTE: u16 = 1 << 6;

/// Full-scale DAC volume, bit 8 latches both channels.
pub const LEFT_DAC_VOLUME_INIT: u16 = 0x0FF;
pub const RIGHT_DAC_VOLUME_INIT: u16 = 0x1FF;

/// Line inputs enabled.
pub const INPUT_CONTROL_INIT: u16 = 0b0_0100_0100;

/// ADC 128× oversampling, high-pass off.
pub const ADC_CONTROL_INIT: u16 = 0b0_0000_1000;
/// Direct ADC: line and aux disconnected from boost stage.
pub const ADC_BOOST_INIT: u16 = 0;
pub const LEFT_ADC_VOLUME_INIT: u16 = 0x0F0;
pub const RIGHT_ADC_VOLUME_INIT: u16 = 0x1F0;

pub const OUTPUT_CONTROL_INIT: u16 = 0b0_0000_0010;
/// DAC into the main mixer.
pub const MIXER_INIT: u16 = 0b1_0101_0101;
/// Main mixer L → AUX2, R → AUX1.
pub const AUX_MIXER_INIT: u16 = 0b0_0000_0010;

// ── Queued registers ───────────────────────────────────────────────────────

/// Bit 8 of the HP volume / PGA registers: update both channels now.
pub const UPDATE_BOTH: u16 = 1 << 8;
/// Bit 7: apply at the next zero crossing.
pub const ZERO_CROSS: u16 = 1 << 7;

pub const DEFAULT_HP_VOLUME: u8 = 0x39;
pub const MAX_HP_VOLUME: u8 = 0x3F;
pub const DEFAULT_INPUT_GAIN: u8 = 0x10;
pub const MAX_INPUT_GAIN: u8 = 0x3F;
pub const MAX_3D_EFFECT: u8 = 0x0F;

/// Minimum time between flushes of the queued registers.
pub const UPDATE_HOLDOFF_MS: u32 = 20;

/// Settle time after a software reset.
pub const RESET_SETTLE_MS: u32 = 100;

// ── Equalizer ──────────────────────────────────────────────────────────────

/// EQ1 bit 8: equalizer in the DAC (1) or ADC (0) path.
pub const EQ_PATH_BIT: u16 = 1 << 8;
/// Bands 2..4 bit 8: wide bandwidth.
pub const EQ_WIDTH_SHIFT: u16 = 8;
pub const EQ_CUTOFF_SHIFT: u16 = 5;
pub const EQ_MAX_GAIN_DB: i8 = 12;
