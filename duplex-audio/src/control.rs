//! Runtime control of the codec sitting on the serial bus.

/// A peripheral the idle loop can reconfigure while audio streams.
///
/// Register writes on the control bus are slow compared to a block period,
/// so implementations may queue changes and apply them from
/// [`service`](Self::service) instead of from the setter.
pub trait AudioControl {
    type Error;

    /// Power up and program the peripheral for the transport's format.
    fn enable(&mut self) -> Result<(), Self::Error>;

    /// Mute the playback path. The bus clocks keep running.
    fn disable(&mut self) -> Result<(), Self::Error>;

    /// Playback level, `0.0` silent to `1.0` full scale.
    fn volume(&mut self, level: f32) -> Result<(), Self::Error>;

    /// Apply queued changes that are due at `now_ms`. Returns whether
    /// anything was written.
    fn service(&mut self, now_ms: u32) -> Result<bool, Self::Error> {
        let _ = now_ms;
        Ok(false)
    }
}
