use std::sync::atomic::{AtomicBool, Ordering};

use crate::device::TunDevice;
use crate::error::Result;
use crate::platform::control::{self, Control};

/// Process-wide registration state for a control plane.
///
/// The context owns its idempotency flag: `init` and `shutdown` each take
/// effect once per transition no matter how many callers race on them.
pub struct Context<C> {
    control: C,
    initialized: AtomicBool,
}

impl<C> Context<C> {
    pub const fn new(control: C) -> Self {
        Context {
            control,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }
}

impl<C: Control> Context<C> {
    /// Returns `true` only for the call that performed the initialization.
    pub fn init(&self) -> bool {
        if self.initialized.swap(true, Ordering::AcqRel) {
            return false;
        }
        log::debug!("tun context up ({})", self.control.control_name());
        true
    }

    /// Returns `true` only if the context was initialized.
    pub fn shutdown(&self) -> bool {
        if !self.initialized.swap(false, Ordering::AcqRel) {
            return false;
        }
        log::debug!("tun context down ({})", self.control.control_name());
        true
    }

    /// Side-effect free call whose only purpose is forcing initialization.
    pub fn noop(&self) {
        self.init();
    }

    /// Open a device through this context's control plane.
    ///
    /// `index` 0 lets the kernel pick the next free unit; `mtu` 0 keeps the
    /// interface default.
    pub fn open(&self, index: i32, mtu: i32) -> Result<TunDevice> {
        self.init();
        control::open(&self.control, index, mtu)
    }
}

#[cfg(target_os = "macos")]
static GLOBAL: Context<crate::platform::Utun> = Context::new(crate::platform::Utun);

/// The context backed by the system utun control.
#[cfg(target_os = "macos")]
pub fn global() -> &'static Context<crate::platform::Utun> {
    &GLOBAL
}
