//! Duplex line-in to headphone processor on two cores.
//!
//! Hardware: RP2040 board with a NAU88C22 codec on I2C0.
//!
//! ```text
//!   GPIO 8  MCLK  ──► codec
//!   GPIO 9  DIN   ◄── codec ADC
//!   GPIO 10 BCLK  ──► codec
//!   GPIO 11 LRCLK ──► codec
//!   GPIO 12 DOUT  ──► codec DAC
//!   GPIO 20 SDA, GPIO 21 SCL
//!   GPIO 1  high while core 1 handles a request
//! ```
//!
//! The DMA completion interrupt hands each finished block to [`App`]. Core 0
//! passes the left channel through while core 1 smooths the right channel,
//! frame by frame, coordinated over the SIO FIFO. Idle applies queued codec
//! register changes.
//!
//! Word 0 of each block is the left channel in both directions. The board
//! crosses the codec's line inputs, and the codec's ADC phase swap undoes
//! that.

#![no_std]
#![no_main]
#![allow(static_mut_refs)]

mod dma;
mod fifo;
mod pio;

use defmt_rtt as _;
use panic_probe as _;

use duplex_audio::io::BlockCallback;
use duplex_audio::multicore::{AudioLoop, BlockView};

use fifo::SioCoreFifo;

#[link_section = ".boot2"]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

/// Block shared by the two cores while a callback runs.
static VIEW: BlockView = BlockView::new();

/// Per-block work split across the cores.
pub struct App {
    audio: AudioLoop<'static, SioCoreFifo>,
}

impl BlockCallback for App {
    fn process(&mut self, input: &mut [i32], output: &mut [i32], frames: usize) {
        self.audio.process(input, output, frames, |_, frame| {
            frame.set_left(frame.left_in());
        });
    }
}

#[rtic::app(device = rp2040_hal::pac, peripherals = true)]
mod app {
    use super::{App, SioCoreFifo, VIEW};
    use crate::dma::RpDma;
    use crate::pio::PioSequencers;

    use embedded_hal::delay::DelayNs;
    use rp2040_hal as hal;
    use rp2040_hal::fugit::RateExtU32;
    use rp2040_hal::gpio::{FunctionI2C, FunctionPio0, PullUp};
    use rp2040_hal::multicore::{Multicore, Stack};
    use rp2040_hal::pio::PIOExt;
    use rp2040_hal::dma::DMAExt;
    use rp2040_hal::Clock;
    use static_cell::StaticCell;

    use duplex_audio::codec::Nau88c22;
    use duplex_audio::constants::{AUDIO_BUFFER_SIZE, SAMPLE_RATE, SYSTEM_CLOCK_HZ};
    use duplex_audio::control::AudioControl;
    use duplex_audio::io::{AudioBuffers, AudioTransport, Pins, TransportConfig};
    use duplex_audio::multicore::{AudioLoop, SecondaryWorker, SharedFrames};

    const XTAL_FREQ_HZ: u32 = 12_000_000;

    /// 12 MHz × 88 = 1056 MHz VCO, ÷ 6 = 176 MHz.
    const PLL_SYS_176MHZ: hal::pll::PLLConfig = hal::pll::PLLConfig {
        vco_freq: hal::fugit::HertzU32::MHz(1056),
        refdiv: 1,
        post_div1: 6,
        post_div2: 1,
    };

    const I2S_PINS: Pins = Pins { mclk: 8, dout: 12, din: 9, bclk: 10 };

    type Transport = AudioTransport<PioSequencers, RpDma, App>;
    type Codec = Nau88c22<hal::I2C<hal::pac::I2C0, I2cPins>, hal::Timer>;
    type I2cPins = (
        hal::gpio::Pin<hal::gpio::bank0::Gpio20, FunctionI2C, PullUp>,
        hal::gpio::Pin<hal::gpio::bank0::Gpio21, FunctionI2C, PullUp>,
    );

    static BUFFERS: StaticCell<AudioBuffers> = StaticCell::new();
    static mut CORE1_STACK: Stack<4096> = Stack::new();

    // ── RTIC resources ───────────────────────────────────────────────

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        transport: Transport,
        codec: Codec,
        timer: hal::Timer,
    }

    // ── Init ─────────────────────────────────────────────────────────

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        let mut pac = cx.device;

        // ── Clocks: 176 MHz system clock ────────────────────────────
        let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);
        let xosc = hal::xosc::setup_xosc_blocking(pac.XOSC, XTAL_FREQ_HZ.Hz())
            .ok()
            .expect("XOSC start");
        watchdog.enable_tick_generation((XTAL_FREQ_HZ / 1_000_000) as u8);
        let mut clocks = hal::clocks::ClocksManager::new(pac.CLOCKS);
        let pll_sys = hal::pll::setup_pll_blocking(
            pac.PLL_SYS,
            xosc.operating_frequency(),
            PLL_SYS_176MHZ,
            &mut clocks,
            &mut pac.RESETS,
        )
        .ok()
        .expect("PLL_SYS lock");
        let pll_usb = hal::pll::setup_pll_blocking(
            pac.PLL_USB,
            xosc.operating_frequency(),
            hal::pll::common_configs::PLL_USB_48MHZ,
            &mut clocks,
            &mut pac.RESETS,
        )
        .ok()
        .expect("PLL_USB lock");
        clocks
            .init_default(&xosc, &pll_sys, &pll_usb)
            .ok()
            .expect("clock tree");
        defmt::info!("system clock {=u32} Hz", clocks.system_clock.freq().to_Hz());

        let mut sio = hal::Sio::new(pac.SIO);
        let pins = hal::gpio::Pins::new(
            pac.IO_BANK0,
            pac.PADS_BANK0,
            sio.gpio_bank0,
            &mut pac.RESETS,
        );
        let timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

        // ── Core 1: secondary worker ────────────────────────────────
        let activity = pins.gpio1.into_push_pull_output();
        {
            let mut mc = Multicore::new(&mut pac.PSM, &mut pac.PPB, &mut sio.fifo);
            let cores = mc.cores();
            cores[1]
                .spawn(unsafe { &mut CORE1_STACK.mem }, move || {
                    // SAFETY: core 1 only uses its own half of the SIO block.
                    let pac = unsafe { hal::pac::Peripherals::steal() };
                    let sio = hal::Sio::new(pac.SIO);
                    let mut smoothed = 0i32;
                    let smoothing = move |_: usize, frame: &mut duplex_audio::multicore::Frame<'_>| {
                        smoothed += (frame.right_in() - smoothed) >> 3;
                        frame.set_right(smoothed);
                    };
                    SecondaryWorker::new(
                        SioCoreFifo::new(sio.fifo),
                        AUDIO_BUFFER_SIZE,
                        SharedFrames::new(&VIEW, smoothing),
                    )
                    .with_activity_pin(activity)
                    .run()
                })
                .ok()
                .expect("core 1 launch");
        }

        // ── I2C + NAU88C22 codec ────────────────────────────────────
        let sda = pins.gpio20.reconfigure::<FunctionI2C, PullUp>();
        let scl = pins.gpio21.reconfigure::<FunctionI2C, PullUp>();
        let i2c = hal::I2C::i2c0(
            pac.I2C0,
            sda,
            scl,
            400.kHz(),
            &mut pac.RESETS,
            clocks.system_clock.freq(),
        );
        let mut codec = Nau88c22::new(i2c, timer);
        codec.enable().expect("NAU88C22 enable");
        codec.volume(0.6).expect("NAU88C22 volume");

        // ── I2S pins, PIO and DMA ───────────────────────────────────
        let _mclk = pins.gpio8.into_function::<FunctionPio0>();
        let _din = pins.gpio9.into_function::<FunctionPio0>();
        let _bclk = pins.gpio10.into_function::<FunctionPio0>();
        let _lrclk = pins.gpio11.into_function::<FunctionPio0>();
        let _dout = pins.gpio12.into_function::<FunctionPio0>();

        let (pio0, sm0, sm1, sm2, _) = pac.PIO0.split(&mut pac.RESETS);
        let sequencers = PioSequencers::new(pio0, sm0, sm1, sm2);
        let dma = RpDma::new(pac.DMA.split(&mut pac.RESETS));

        let config = TransportConfig::new(SAMPLE_RATE, I2S_PINS).with_system_clock(SYSTEM_CLOCK_HZ);
        let buffers = BUFFERS.init(AudioBuffers::new());
        let mut transport = AudioTransport::new(config, sequencers, dma, buffers);
        let app = App {
            audio: AudioLoop::new(SioCoreFifo::new(sio.fifo), &VIEW),
        };
        transport.start_audio(Some(app)).expect("audio start");

        (Shared {}, Local { transport, codec, timer })
    }

    // ── Idle: deferred codec register writes ─────────────────────────

    #[idle(local = [codec, timer])]
    fn idle(cx: idle::Context) -> ! {
        let codec = cx.local.codec;
        let timer = cx.local.timer;
        loop {
            let now_ms = (timer.get_counter().ticks() / 1_000) as u32;
            if codec.service(now_ms).is_err() {
                defmt::warn!("codec update failed");
            }
            timer.delay_ms(1);
        }
    }

    // ── DMA ISR: one block per interrupt ─────────────────────────────

    #[task(binds = DMA_IRQ_0, local = [transport], priority = 1)]
    fn dma_isr(cx: dma_isr::Context) {
        cx.local.transport.on_block_complete();
    }
}
