//! The three I2S programs on PIO0.
//!
//! | Lane | Program | Clock |
//! |------|---------|-------|
//! | SM0 | MCLK square wave | 2 × MCLK |
//! | SM1 | DIN receiver, polling BCLK | 2 × MCLK |
//! | SM2 | BCLK/LRCLK + DOUT transmitter | 2 × BCLK |
//!
//! Every slot is 32 bits, MSB first. The transmitter opens with the left
//! slot, so word 0 of a block is the left channel in both directions. The
//! receiver follows the bus through its jump pin: it samples DIN on each
//! BCLK rising edge after the one that precedes the first left MSB.

use duplex_audio::clock::FractionalDivider;
use duplex_audio::io::{LaneId, Pins, SequencerBank, SequencerProgram};
use duplex_audio::AudioError;
use rp2040_hal::pac::PIO0;
use rp2040_hal::pio::{
    PIOBuilder, PinDir, Rx, ShiftDirection, StateMachine, Stopped, Tx, UninitStateMachine, PIO,
    SM0, SM1, SM2,
};

/// Bits per I2S slot, one FIFO word each.
const SLOT_BITS: u8 = 32;

pub struct PioSequencers {
    pio: PIO<PIO0>,
    free: (
        Option<UninitStateMachine<(PIO0, SM0)>>,
        Option<UninitStateMachine<(PIO0, SM1)>>,
        Option<UninitStateMachine<(PIO0, SM2)>>,
    ),
    master_clock: Option<StateMachine<(PIO0, SM0), Stopped>>,
    receiver: Option<(StateMachine<(PIO0, SM1), Stopped>, Rx<(PIO0, SM1)>)>,
    transmitter: Option<(StateMachine<(PIO0, SM2), Stopped>, Tx<(PIO0, SM2)>)>,
}

impl PioSequencers {
    pub fn new(
        pio: PIO<PIO0>,
        sm0: UninitStateMachine<(PIO0, SM0)>,
        sm1: UninitStateMachine<(PIO0, SM1)>,
        sm2: UninitStateMachine<(PIO0, SM2)>,
    ) -> Self {
        PioSequencers {
            pio,
            free: (Some(sm0), Some(sm1), Some(sm2)),
            master_clock: None,
            receiver: None,
            transmitter: None,
        }
    }

    fn install_master_clock(&mut self, pins: &Pins) -> Result<LaneId, AudioError> {
        let sm = self.free.0.take().ok_or(AudioError::SequencerUnavailable)?;
        let program = pio_proc::pio_asm!(
            ".wrap_target",
            "    set pins, 1",
            "    set pins, 0",
            ".wrap"
        );
        let installed = self
            .pio
            .install(&program.program)
            .map_err(|_| AudioError::SequencerUnavailable)?;
        let (mut sm, _, _) = PIOBuilder::from_installed_program(installed)
            .set_pins(pins.mclk, 1)
            .build(sm);
        sm.set_pindirs([(pins.mclk, PinDir::Output)]);
        self.master_clock = Some(sm);
        Ok(LaneId(0))
    }

    fn install_receiver(&mut self, pins: &Pins) -> Result<LaneId, AudioError> {
        let sm = self.free.1.take().ok_or(AudioError::SequencerUnavailable)?;
        // Eight instructions per bit period, so every BCLK half period
        // is seen at least twice.
        let program = pio_proc::pio_asm!(
            "first_rise:",
            "    jmp pin first_high",
            "    jmp first_rise",
            "first_high:",
            ".wrap_target",
            "wait_low:",
            "    jmp pin wait_low",
            "wait_high:",
            "    jmp pin sample",
            "    jmp wait_high",
            "sample:",
            "    in pins, 1",
            ".wrap"
        );
        let installed = self
            .pio
            .install(&program.program)
            .map_err(|_| AudioError::SequencerUnavailable)?;
        let (mut sm, rx, _) = PIOBuilder::from_installed_program(installed)
            .in_pin_base(pins.din)
            .jmp_pin(pins.bclk)
            .in_shift_direction(ShiftDirection::Left)
            .autopush(true)
            .push_threshold(SLOT_BITS)
            .build(sm);
        sm.set_pindirs([(pins.din, PinDir::Input)]);
        self.receiver = Some((sm, rx));
        Ok(LaneId(1))
    }

    fn install_transmitter(&mut self, pins: &Pins) -> Result<LaneId, AudioError> {
        let sm = self.free.2.take().ok_or(AudioError::SequencerUnavailable)?;
        // Side-set bit 0 is BCLK, bit 1 LRCLK. LRCLK flips one bit before
        // each slot's MSB, as I2S requires; the entry instruction is that
        // bit for the first left slot.
        let program = pio_proc::pio_asm!(
            ".side_set 2",
            "    set x, 30          side 0b01",
            ".wrap_target",
            "left:",
            "    out pins, 1        side 0b00",
            "    jmp x-- left       side 0b01",
            "    out pins, 1        side 0b10",
            "    set x, 30          side 0b11",
            "right:",
            "    out pins, 1        side 0b10",
            "    jmp x-- right      side 0b11",
            "    out pins, 1        side 0b00",
            "    set x, 30          side 0b01",
            ".wrap"
        );
        let installed = self
            .pio
            .install(&program.program)
            .map_err(|_| AudioError::SequencerUnavailable)?;
        let (mut sm, _, tx) = PIOBuilder::from_installed_program(installed)
            .out_pins(pins.dout, 1)
            .side_set_pin_base(pins.bclk)
            .out_shift_direction(ShiftDirection::Left)
            .autopull(true)
            .pull_threshold(SLOT_BITS)
            .build(sm);
        sm.set_pindirs([
            (pins.dout, PinDir::Output),
            (pins.bclk, PinDir::Output),
            (pins.lrclk(), PinDir::Output),
        ]);
        self.transmitter = Some((sm, tx));
        Ok(LaneId(2))
    }
}

impl SequencerBank for PioSequencers {
    fn install(&mut self, program: SequencerProgram, pins: &Pins) -> Result<LaneId, AudioError> {
        match program {
            SequencerProgram::MasterClock => self.install_master_clock(pins),
            SequencerProgram::Receiver => self.install_receiver(pins),
            SequencerProgram::Transmitter => self.install_transmitter(pins),
        }
    }

    fn set_clock_divider(&mut self, lane: LaneId, divider: FractionalDivider) {
        let (int, frac) = (divider.integer, divider.fraction);
        match lane.0 {
            0 => {
                if let Some(sm) = self.master_clock.as_mut() {
                    sm.clock_divisor_fixed_point(int, frac);
                }
            }
            1 => {
                if let Some((sm, _)) = self.receiver.as_mut() {
                    sm.clock_divisor_fixed_point(int, frac);
                }
            }
            2 => {
                if let Some((sm, _)) = self.transmitter.as_mut() {
                    sm.clock_divisor_fixed_point(int, frac);
                }
            }
            other => defmt::warn!("no lane {=u8}", other),
        }
    }

    fn enable_in_sync(&mut self, lanes: &[LaneId]) {
        defmt::debug!("starting lanes {}", lanes);
        let (Some(mclk), Some((rx, _)), Some((tx, _))) = (
            self.master_clock.take(),
            self.receiver.take(),
            self.transmitter.take(),
        ) else {
            defmt::error!("enable_in_sync before all programs were installed");
            return;
        };
        // The state machines keep running after their handles are dropped.
        let _running = mclk.with(rx).with(tx).sync().start();
    }
}
