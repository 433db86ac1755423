//! Registration slot the audio interrupt dispatches through.

use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

/// Holds the one object an interrupt vector forwards to.
///
/// Registration happens once from thread mode; afterwards only the
/// interrupt handler touches the object.
pub struct TransportSlot<T> {
    target: AtomicPtr<T>,
}

// The slot hands out `&mut T` only through `dispatch`, whose caller
// guarantees exclusivity.
unsafe impl<T: Send> Sync for TransportSlot<T> {}

impl<T> TransportSlot<T> {
    pub const fn new() -> Self {
        TransportSlot {
            target: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Install `target`. Fails, returning it back, if the slot is taken.
    pub fn register(&self, target: &'static mut T) -> Result<(), &'static mut T> {
        let raw: *mut T = target;
        match self
            .target
            .compare_exchange(ptr::null_mut(), raw, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(()),
            // SAFETY: `raw` came from the `&'static mut` we were given and
            // was not stored.
            Err(_) => Err(unsafe { &mut *raw }),
        }
    }

    pub fn is_registered(&self) -> bool {
        !self.target.load(Ordering::Acquire).is_null()
    }

    /// Run `f` on the registered object. Returns `None` if nothing is
    /// registered.
    ///
    /// # Safety
    ///
    /// Only one context may ever call this (the interrupt handler), and
    /// nothing else may hold a reference to the registered object.
    pub unsafe fn dispatch<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let raw = self.target.load(Ordering::Acquire);
        if raw.is_null() {
            return None;
        }
        // SAFETY: non-null pointers in the slot come from a `&'static mut`,
        // exclusivity is the caller's contract.
        Some(f(unsafe { &mut *raw }))
    }
}

impl<T> Default for TransportSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::boxed::Box;

    #[test]
    fn empty_slot_dispatch_is_noop() {
        let slot: TransportSlot<u32> = TransportSlot::new();
        assert!(!slot.is_registered());
        assert_eq!(unsafe { slot.dispatch(|v| *v) }, None);
    }

    #[test]
    fn dispatch_reaches_registered_object() {
        let slot = TransportSlot::new();
        let value: &'static mut u32 = Box::leak(Box::new(41));
        assert!(slot.register(value).is_ok());
        assert!(slot.is_registered());

        unsafe { slot.dispatch(|v| *v += 1) };
        assert_eq!(unsafe { slot.dispatch(|v| *v) }, Some(42));
    }

    #[test]
    fn second_registration_is_returned() {
        let slot = TransportSlot::new();
        assert!(slot.register(Box::leak(Box::new(1u32))).is_ok());

        let rejected = slot.register(Box::leak(Box::new(2u32)));
        assert_eq!(rejected.map_err(|v| *v), Err(2));
        assert_eq!(unsafe { slot.dispatch(|v| *v) }, Some(1));
    }
}
