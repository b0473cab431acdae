/*!
Non-blocking lifecycle and packet I/O for macOS `utun` interfaces.

# Example:
```no_run
# #[cfg(target_os = "macos")]
# fn main() -> Result<(), utun_rs::BoxError> {
use utun_rs::{BufferRegion, Error};

let mut dev = utun_rs::open(0, 1500)?;
println!("opened {} with mtu {}", dev.address(), dev.mtu());
let mut buf = vec![0u8; dev.packet_buffer_len()];
loop {
    let mut region = BufferRegion::new(&mut buf);
    match dev.read(&mut region) {
        Ok(len) => println!("buf= {:?}", &buf[..len]),
        // wait for readiness (kqueue, tokio, ...) and retry
        Err(Error::WouldBlock) => break,
        Err(e) => return Err(e.into()),
    }
}
dev.close()?;
# Ok(())
# }
# #[cfg(not(target_os = "macos"))]
# fn main() {}
```
*/

#![cfg_attr(docsrs, feature(doc_cfg))]
#[cfg(not(unix))]
compile_error! {"utun-rs only supports unix targets"}

#[cfg(all(unix, any(feature = "async_std", feature = "async_tokio")))]
pub use crate::async_device::*;

pub use crate::address::TunAddress;
pub use crate::buffer::BufferRegion;
pub use crate::builder::DeviceBuilder;
pub use crate::context::Context;
#[cfg(target_os = "macos")]
pub use crate::context::global;
pub use crate::device::{DeviceState, TunDevice};
pub use crate::error::{BoxError, Error, Result};
pub use crate::platform::{Control, CtlInfo, MAX_KCTL_NAME};
#[cfg(target_os = "macos")]
pub use crate::platform::Utun;

mod address;
mod buffer;
mod builder;
mod context;
mod device;
mod error;

#[cfg(all(unix, any(feature = "async_std", feature = "async_tokio")))]
mod async_device;
pub mod platform;

/// Size of the address-family header utun puts in front of each packet.
pub const PACKET_INFORMATION_LENGTH: usize = 4;

/// Open a utun device through the global context.
///
/// `index` 0 lets the kernel pick the next free `utunN`, any other value `u`
/// asks for `utun(u-1)`. `mtu` 0 keeps the interface default.
#[cfg(target_os = "macos")]
pub fn open(index: i32, mtu: i32) -> Result<TunDevice> {
    global().open(index, mtu)
}
