//! Interrupt-safe home for the service and its hardware.
//!
//! Every execution context (button edge, timer interrupt, sample clock,
//! background loop) reaches the controller through [`SharedInterlock::with`],
//! which runs the closure inside one short critical section. Multi-field
//! updates such as "clear the latch and re-arm the timers" are therefore
//! never observed half-done.

use core::cell::RefCell;

use critical_section::Mutex;

use super::service::InterlockService;

pub struct SharedInterlock<H> {
    inner: Mutex<RefCell<Option<(InterlockService, H)>>>,
}

impl<H> Default for SharedInterlock<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> SharedInterlock<H> {
    /// Empty slot, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Move the controller and its hardware into the slot, replacing any
    /// previous occupant.
    pub fn install(&self, service: InterlockService, hw: H) {
        critical_section::with(|cs| {
            self.inner.borrow_ref_mut(cs).replace((service, hw));
        });
    }

    /// Run `f` on the controller inside a critical section.
    /// Returns `None` if nothing is installed yet.
    pub fn with<R>(&self, f: impl FnOnce(&mut InterlockService, &mut H) -> R) -> Option<R> {
        critical_section::with(|cs| {
            let mut slot = self.inner.borrow_ref_mut(cs);
            let (service, hw) = slot.as_mut()?;
            Some(f(service, hw))
        })
    }

    /// Remove and return the controller and its hardware.
    pub fn take(&self) -> Option<(InterlockService, H)> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).take())
    }

    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InterlockConfig;
    use crate::fsm::StateId;

    #[test]
    fn with_before_install_is_none() {
        let shared: SharedInterlock<()> = SharedInterlock::new();
        assert!(!shared.is_installed());
        assert_eq!(shared.with(|svc, _| svc.state()), None);
    }

    #[test]
    fn install_then_access() {
        let shared: SharedInterlock<u32> = SharedInterlock::new();
        shared.install(InterlockService::new(InterlockConfig::default()), 7);
        assert_eq!(
            shared.with(|svc, hw| {
                *hw += 1;
                svc.state()
            }),
            Some(StateId::Idle)
        );
        let (_, hw) = shared.take().unwrap();
        assert_eq!(hw, 8);
        assert!(!shared.is_installed());
    }

    #[test]
    fn static_slot_is_shareable_across_threads() {
        static SLOT: SharedInterlock<u32> = SharedInterlock::new();
        SLOT.install(InterlockService::new(InterlockConfig::default()), 0);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    for _ in 0..100 {
                        SLOT.with(|_, hw| *hw += 1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(SLOT.with(|_, hw| *hw), Some(400));
    }
}
