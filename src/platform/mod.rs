pub mod control;
pub(crate) mod posix;

#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "macos")]
pub use self::macos::*;

pub use self::control::{Control, CtlInfo, MAX_KCTL_NAME};
