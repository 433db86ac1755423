//! Integration tests running the transport against simulated hardware.
//!
//! `SimDma` models the parts of the DMA block the transport depends on:
//! chained control channels reading a wrapping pointer ring and
//! retriggering their data channels, and a completion flag on unquiet
//! channels. A "bus tick" completes both data transfers at once, the way
//! the shared bit clock does on hardware:
//!
//! ```text
//! complete_block() → data done → chain → control copies next ring entry
//!     → data retriggered on the other block → on_block_complete()
//! ```

#[cfg(test)]
mod tests {
    use std::boxed::Box;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    use crate::clock::FractionalDivider;
    use crate::constants::{AUDIO_BUFFER_FRAMES, AUDIO_BUFFER_SIZE, SAMPLE_RATE};
    use crate::error::AudioError;
    use crate::io::buffers::{AudioBuffers, BufferAddresses, BufferIndex, Direction};
    use crate::io::hw::{
        ChannelId, DmaController, Endpoint, LaneId, Pacing, Pins, SequencerBank,
        SequencerProgram, Transfer,
    };
    use crate::io::transport::{AudioTransport, NoCallback, StreamState, TransportConfig};
    use crate::io::wire::upscale_to_32bits;

    const PINS: Pins = Pins { mclk: 6, dout: 2, din: 3, bclk: 4 };
    const FIFO_BASE: u32 = 0x5020_0000;

    // ---------------------------------------------------------------
    // Simulated sequencers
    // ---------------------------------------------------------------

    struct SimSequencers {
        capacity: usize,
        installed: Vec<SequencerProgram>,
        dividers: Vec<(LaneId, FractionalDivider)>,
        enabled: Vec<Vec<LaneId>>,
    }

    impl SimSequencers {
        fn new() -> Self {
            Self::with_capacity(4)
        }

        fn with_capacity(capacity: usize) -> Self {
            SimSequencers {
                capacity,
                installed: Vec::new(),
                dividers: Vec::new(),
                enabled: Vec::new(),
            }
        }

        fn divider_of(&self, program: SequencerProgram) -> Option<FractionalDivider> {
            let lane = self.installed.iter().position(|&p| p == program)?;
            self.dividers
                .iter()
                .find(|(l, _)| l.0 as usize == lane)
                .map(|(_, d)| *d)
        }
    }

    impl SequencerBank for SimSequencers {
        fn install(&mut self, program: SequencerProgram, pins: &Pins) -> Result<LaneId, AudioError> {
            assert_eq!(*pins, PINS);
            if self.installed.len() >= self.capacity {
                return Err(AudioError::SequencerUnavailable);
            }
            self.installed.push(program);
            Ok(LaneId(self.installed.len() as u8 - 1))
        }

        fn set_clock_divider(&mut self, lane: LaneId, divider: FractionalDivider) {
            self.dividers.push((lane, divider));
        }

        fn enable_in_sync(&mut self, lanes: &[LaneId]) {
            self.enabled.push(lanes.to_vec());
        }
    }

    // ---------------------------------------------------------------
    // Simulated DMA
    // ---------------------------------------------------------------

    #[derive(Debug, Clone, Copy, Default)]
    struct SimChannel {
        transfer: Option<Transfer>,
        read_addr: u32,
        write_addr: u32,
        busy: bool,
        irq_enabled: bool,
        pending: bool,
        acks: u32,
    }

    struct SimDma {
        available: usize,
        claimed: usize,
        channels: [SimChannel; 12],
        addresses: Option<BufferAddresses>,
        started: Vec<Vec<ChannelId>>,
    }

    impl SimDma {
        fn new() -> Self {
            Self::with_channels(12)
        }

        fn with_channels(available: usize) -> Self {
            SimDma {
                available,
                claimed: 0,
                channels: [SimChannel::default(); 12],
                addresses: None,
                started: Vec::new(),
            }
        }

        fn channel(&self, id: ChannelId) -> &SimChannel {
            &self.channels[id.0 as usize]
        }

        fn addresses(&self) -> BufferAddresses {
            self.addresses.expect("DMA not configured")
        }

        fn resolve(addresses: &BufferAddresses, endpoint: Endpoint) -> u32 {
            match endpoint {
                Endpoint::Ring(dir) => addresses.ring(dir),
                Endpoint::Block(dir, idx) => addresses.block(dir, idx),
                Endpoint::ReceiveFifo(lane) | Endpoint::TransmitFifo(lane) => {
                    FIFO_BASE + 4 * lane.0 as u32
                }
                _ => 0,
            }
        }

        /// One control-channel transfer: copy the ring entry at the read
        /// address into the target register, advance with wrap, retrigger.
        fn run_control(&mut self, id: ChannelId) {
            let addresses = self.addresses();
            let ch = self.channels[id.0 as usize];
            let transfer = ch.transfer.expect("control channel not configured");
            let Endpoint::Ring(dir) = transfer.read else {
                panic!("control channel must read a ring");
            };
            let ring = addresses.ring(dir);
            let offset = ch.read_addr - ring;
            let entry = if offset == 0 { BufferIndex::First } else { BufferIndex::Second };
            let value = addresses.block(dir, entry);
            let wrap = 1u32 << transfer.ring.expect("control channel must wrap").0;
            self.channels[id.0 as usize].read_addr = ring + (offset + 4) % wrap;

            match transfer.write {
                Endpoint::WriteAddressTrigger(data) => {
                    let data = &mut self.channels[data.0 as usize];
                    data.write_addr = value;
                    data.busy = true;
                }
                Endpoint::ReadAddressTrigger(data) => {
                    let data = &mut self.channels[data.0 as usize];
                    data.read_addr = value;
                    data.busy = true;
                }
                other => panic!("unexpected control target {other:?}"),
            }
        }

        /// Finish every running data transfer (one block period).
        fn complete_block(&mut self) {
            let mut chained = Vec::new();
            for ch in self.channels.iter_mut() {
                if !ch.busy {
                    continue;
                }
                let transfer = ch.transfer.expect("busy channel not configured");
                ch.busy = false;
                if ch.irq_enabled && !transfer.quiet {
                    ch.pending = true;
                }
                if let Some(next) = transfer.chain_to {
                    chained.push(next);
                }
            }
            for next in chained {
                self.run_control(next);
            }
        }

        /// Block a data channel is currently working on.
        fn active_block(&self, id: ChannelId, dir: Direction) -> BufferIndex {
            let addresses = self.addresses();
            let ch = self.channel(id);
            let addr = match dir {
                Direction::Input => ch.write_addr,
                Direction::Output => ch.read_addr,
            };
            if addr == addresses.block(dir, BufferIndex::First) {
                BufferIndex::First
            } else {
                assert_eq!(addr, addresses.block(dir, BufferIndex::Second));
                BufferIndex::Second
            }
        }

        fn find(&self, f: impl Fn(&Transfer) -> bool) -> ChannelId {
            let pos = self
                .channels
                .iter()
                .position(|c| c.transfer.as_ref().is_some_and(&f))
                .expect("no matching channel");
            ChannelId(pos as u8)
        }

        fn input_data(&self) -> ChannelId {
            self.find(|t| matches!(t.read, Endpoint::ReceiveFifo(_)))
        }

        fn output_data(&self) -> ChannelId {
            self.find(|t| matches!(t.write, Endpoint::TransmitFifo(_)))
        }

        fn control_of(&self, dir: Direction) -> ChannelId {
            self.find(|t| t.read == Endpoint::Ring(dir))
        }
    }

    impl DmaController for SimDma {
        fn claim(&mut self) -> Result<ChannelId, AudioError> {
            if self.claimed >= self.available {
                return Err(AudioError::ChannelUnavailable);
            }
            self.claimed += 1;
            Ok(ChannelId(self.claimed as u8 - 1))
        }

        fn configure(&mut self, channel: ChannelId, transfer: &Transfer, addresses: &BufferAddresses) {
            self.addresses = Some(*addresses);
            let ch = &mut self.channels[channel.0 as usize];
            ch.transfer = Some(*transfer);
            ch.read_addr = Self::resolve(addresses, transfer.read);
            ch.write_addr = Self::resolve(addresses, transfer.write);
        }

        fn enable_completion_interrupt(&mut self, channel: ChannelId) {
            self.channels[channel.0 as usize].irq_enabled = true;
        }

        fn start(&mut self, channels: &[ChannelId]) {
            self.started.push(channels.to_vec());
            for &id in channels {
                self.run_control(id);
            }
        }

        fn read_address(&self, channel: ChannelId) -> u32 {
            self.channel(channel).read_addr
        }

        fn acknowledge(&mut self, channel: ChannelId) {
            let ch = &mut self.channels[channel.0 as usize];
            ch.pending = false;
            ch.acks += 1;
        }
    }

    // ---------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------

    fn config() -> TransportConfig {
        TransportConfig::new(SAMPLE_RATE, PINS)
    }

    /// A buffer arena at a fixed address, as the firmware's `StaticCell`
    /// provides.
    fn arena() -> &'static mut AudioBuffers {
        Box::leak(Box::new(AudioBuffers::new()))
    }

    fn started_without_callback() -> AudioTransport<SimSequencers, SimDma, NoCallback> {
        let mut transport = AudioTransport::new(config(), SimSequencers::new(), SimDma::new(), arena());
        transport.start_audio(None).unwrap();
        transport
    }

    /// One block period followed by the interrupt handler.
    fn tick<C: crate::io::transport::BlockCallback>(
        transport: &mut AudioTransport<SimSequencers, SimDma, C>,
    ) -> BufferIndex {
        let dma = transport.dma_mut();
        dma.complete_block();
        let input = dma.input_data();
        assert!(dma.channel(input).pending, "input completion must raise the IRQ");
        transport.on_block_complete();
        transport.last_block().unwrap()
    }

    // ---------------------------------------------------------------
    // Start-up
    // ---------------------------------------------------------------

    #[test]
    fn start_installs_three_programs_with_dividers() {
        let transport = started_without_callback();
        let seq = transport.sequencers();

        assert_eq!(
            seq.installed,
            [
                SequencerProgram::MasterClock,
                SequencerProgram::Receiver,
                SequencerProgram::Transmitter
            ]
        );
        let mclk = FractionalDivider { integer: 7, fraction: 208 };
        let bclk = FractionalDivider { integer: 31, fraction: 64 };
        assert_eq!(seq.divider_of(SequencerProgram::MasterClock), Some(mclk));
        assert_eq!(seq.divider_of(SequencerProgram::Receiver), Some(mclk));
        assert_eq!(seq.divider_of(SequencerProgram::Transmitter), Some(bclk));

        // One simultaneous enable of all three lanes.
        assert_eq!(seq.enabled, [[LaneId(0), LaneId(1), LaneId(2)]]);
    }

    #[test]
    fn dma_chain_is_wired_as_ping_pong() {
        let mut transport = started_without_callback();
        let dma = transport.dma_mut();

        let in_data = dma.input_data();
        let out_data = dma.output_data();
        let in_ctrl = dma.control_of(Direction::Input);
        let out_ctrl = dma.control_of(Direction::Output);

        let rx = dma.channel(in_data).transfer.unwrap();
        let tx = dma.channel(out_data).transfer.unwrap();
        assert_eq!(rx.chain_to, Some(in_ctrl));
        assert_eq!(tx.chain_to, Some(out_ctrl));
        assert_eq!(rx.count as usize, AUDIO_BUFFER_FRAMES);
        assert_eq!(tx.count, rx.count);
        assert!(matches!(rx.pacing, Pacing::ReceiveFifo(_)));
        assert!(matches!(tx.pacing, Pacing::TransmitFifo(_)));
        assert!(rx.write_increment && !rx.read_increment);
        assert!(tx.read_increment && !tx.write_increment);

        assert_eq!(
            dma.channel(in_ctrl).transfer.unwrap().write,
            Endpoint::WriteAddressTrigger(in_data)
        );
        assert_eq!(
            dma.channel(out_ctrl).transfer.unwrap().write,
            Endpoint::ReadAddressTrigger(out_data)
        );

        // Only the input data channel can interrupt.
        let irq: Vec<_> = (0..4).filter(|&i| dma.channels[i].irq_enabled).collect();
        assert_eq!(irq, [in_data.0 as usize]);

        // Only the control channels are started; they kick off the data
        // channels on block 0.
        assert_eq!(dma.started, [[in_ctrl, out_ctrl]]);
        assert_eq!(dma.active_block(in_data, Direction::Input), BufferIndex::First);
        assert_eq!(dma.active_block(out_data, Direction::Output), BufferIndex::First);

        assert_eq!(transport.state(Direction::Input), StreamState::Armed);
        assert_eq!(transport.state(Direction::Output), StreamState::Armed);
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut transport = started_without_callback();
        assert_eq!(transport.start_audio(None), Err(AudioError::AlreadyStarted));
        assert_eq!(transport.sequencers().installed.len(), 3);
        assert_eq!(transport.sequencers().enabled.len(), 1);
    }

    #[test]
    fn invalid_config_starts_nothing() {
        let bad = TransportConfig::new(0.0, PINS);
        let mut transport: AudioTransport<_, _, NoCallback> =
            AudioTransport::new(bad, SimSequencers::new(), SimDma::new(), arena());
        assert_eq!(transport.start_audio(None), Err(AudioError::InvalidSampleRate));
        assert!(transport.sequencers().installed.is_empty());
        assert_eq!(transport.state(Direction::Input), StreamState::Idle);
    }

    #[test]
    fn missing_resources_are_reported() {
        let mut transport: AudioTransport<_, _, NoCallback> =
            AudioTransport::new(config(), SimSequencers::with_capacity(2), SimDma::new(), arena());
        assert_eq!(transport.start_audio(None), Err(AudioError::SequencerUnavailable));

        let mut transport: AudioTransport<_, _, NoCallback> =
            AudioTransport::new(
                config(),
                SimSequencers::new(),
                SimDma::with_channels(3),
                arena(),
            );
        assert_eq!(transport.start_audio(None), Err(AudioError::ChannelUnavailable));
        assert!(transport.sequencers().enabled.is_empty());
    }

    // ---------------------------------------------------------------
    // Streaming
    // ---------------------------------------------------------------

    #[test]
    fn first_three_interrupts_select_0_1_0() {
        let mut transport = started_without_callback();
        let seen = [tick(&mut transport), tick(&mut transport), tick(&mut transport)];
        assert_eq!(seen, [BufferIndex::First, BufferIndex::Second, BufferIndex::First]);
        assert_eq!(transport.blocks_completed(), 3);
    }

    #[test]
    fn indices_alternate_over_a_long_run() {
        let mut transport = started_without_callback();
        let mut previous = tick(&mut transport);
        for _ in 0..1000 {
            let next = tick(&mut transport);
            assert_eq!(next, previous.other());
            previous = next;
        }
        assert_eq!(transport.state(Direction::Input), StreamState::Streaming);
        assert_eq!(transport.state(Direction::Output), StreamState::Streaming);
    }

    #[test]
    fn processed_block_is_never_the_active_one() {
        let mut transport = started_without_callback();
        for _ in 0..8 {
            let done = tick(&mut transport);
            let dma = transport.dma_mut();
            let (in_data, out_data) = (dma.input_data(), dma.output_data());
            assert_eq!(dma.active_block(in_data, Direction::Input), done.other());
            assert_eq!(dma.active_block(out_data, Direction::Output), done.other());
        }
    }

    #[test]
    fn no_callback_leaves_buffers_and_acknowledges() {
        let mut transport = started_without_callback();
        transport.block_mut(Direction::Input, BufferIndex::First)[0] = 0x1234_5678;
        transport.block_mut(Direction::Output, BufferIndex::First)[0] = 0x0badf00d;

        tick(&mut transport);

        assert_eq!(transport.block_mut(Direction::Input, BufferIndex::First)[0], 0x1234_5678);
        assert_eq!(transport.block_mut(Direction::Output, BufferIndex::First)[0], 0x0badf00d);
        let dma = transport.dma_mut();
        let in_data = dma.input_data();
        assert!(!dma.channel(in_data).pending);
        assert_eq!(dma.channel(in_data).acks, 1);
    }

    #[test]
    fn callback_sees_downscaled_input_and_output_is_upscaled() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let log = calls.clone();
        let callback = move |input: &mut [i32], output: &mut [i32], frames: usize| {
            log.borrow_mut().push((input[0], input[1], frames));
            for (o, i) in output.iter_mut().zip(input) {
                *o = -*i;
            }
        };

        let mut transport = AudioTransport::new(config(), SimSequencers::new(), SimDma::new(), arena());
        transport.start_audio(Some(callback)).unwrap();

        // Receiver delivers 16-bit samples in the top half of each word,
        // with junk in the low bits.
        {
            let input = transport.block_mut(Direction::Input, BufferIndex::First);
            for (i, word) in input.iter_mut().enumerate() {
                *word = upscale_to_32bits(i as i32 - 48) | 0x00ff;
            }
        }

        assert_eq!(tick(&mut transport), BufferIndex::First);

        assert_eq!(*calls.borrow(), [(-48, -47, AUDIO_BUFFER_SIZE)]);
        let output = *transport.block_mut(Direction::Output, BufferIndex::First);
        for (i, word) in output.iter().enumerate() {
            assert_eq!(*word, upscale_to_32bits(48 - i as i32), "word {i}");
        }
        // The block being transmitted is untouched.
        let other = transport.block_mut(Direction::Output, BufferIndex::Second);
        assert!(other.iter().all(|&w| w == 0));
    }

    #[test]
    fn callback_runs_once_per_interrupt_on_alternating_pairs() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let log = calls.clone();
        let callback = move |input: &mut [i32], _output: &mut [i32], _frames: usize| {
            log.borrow_mut().push(input[0]);
        };

        let mut transport = AudioTransport::new(config(), SimSequencers::new(), SimDma::new(), arena());
        transport.start_audio(Some(callback)).unwrap();
        transport.block_mut(Direction::Input, BufferIndex::First)[0] = upscale_to_32bits(1);
        transport.block_mut(Direction::Input, BufferIndex::Second)[0] = upscale_to_32bits(2);

        tick(&mut transport);
        tick(&mut transport);

        assert_eq!(*calls.borrow(), [1, 2]);
        assert_eq!(transport.blocks_completed(), 2);
    }

    #[test]
    fn moving_a_started_transport_keeps_the_rotation() {
        let mut transport = started_without_callback();
        assert_eq!(tick(&mut transport), BufferIndex::First);

        let mut moved = Box::new(transport);
        let seen = [tick(&mut *moved), tick(&mut *moved), tick(&mut *moved)];
        assert_eq!(seen, [BufferIndex::Second, BufferIndex::First, BufferIndex::Second]);
        assert_eq!(moved.misrouted_blocks(), 0);
    }

    #[test]
    fn foreign_ring_address_skips_the_callback() {
        let calls = Rc::new(RefCell::new(0));
        let count = calls.clone();
        let callback = move |_: &mut [i32], _: &mut [i32], _: usize| {
            *count.borrow_mut() += 1;
        };

        let mut transport = AudioTransport::new(config(), SimSequencers::new(), SimDma::new(), arena());
        transport.start_audio(Some(callback)).unwrap();
        {
            let dma = transport.dma_mut();
            dma.complete_block();
            let ctrl = dma.control_of(Direction::Input);
            dma.channels[ctrl.0 as usize].read_addr ^= 0x40;
        }
        transport.on_block_complete();

        assert_eq!(*calls.borrow(), 0);
        assert_eq!(transport.misrouted_blocks(), 1);
        assert_eq!(transport.blocks_completed(), 0);
        assert_eq!(transport.last_block(), None);
        let dma = transport.dma_mut();
        let in_data = dma.input_data();
        assert!(!dma.channel(in_data).pending);
        assert_eq!(dma.channel(in_data).acks, 1);
    }

    #[test]
    fn interrupt_before_start_is_ignored() {
        let mut transport: AudioTransport<_, _, NoCallback> =
            AudioTransport::new(config(), SimSequencers::new(), SimDma::new(), arena());
        transport.on_block_complete();
        assert_eq!(transport.blocks_completed(), 0);
        assert_eq!(transport.last_block(), None);
    }
}
