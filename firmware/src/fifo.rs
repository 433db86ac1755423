//! The SIO inter-core FIFO as a [`CoreFifo`].

use duplex_audio::multicore::CoreFifo;
use rp2040_hal::sio::SioFifo;

pub struct SioCoreFifo(SioFifo);

impl SioCoreFifo {
    pub fn new(fifo: SioFifo) -> Self {
        SioCoreFifo(fifo)
    }
}

impl CoreFifo for SioCoreFifo {
    fn is_write_ready(&mut self) -> bool {
        self.0.is_write_ready()
    }

    fn write(&mut self, word: u32) {
        self.0.write(word);
    }

    fn is_read_ready(&mut self) -> bool {
        self.0.is_read_ready()
    }

    fn read(&mut self) -> Option<u32> {
        self.0.read()
    }
}
