use crate::address::parse_unit;
use crate::context::Context;
use crate::device::TunDevice;
use crate::error::{Error, Result};
use crate::platform::Control;

/// Builder for a utun interface.
#[derive(Clone, Debug, Default)]
pub struct DeviceBuilder {
    dev_name: Option<String>,
    unit: Option<u32>,
    mtu: Option<u16>,
    /// switch of Enable/Disable packet information for network driver
    packet_information: Option<bool>,
}

impl DeviceBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    /// Ask for a specific `utunN` interface.
    pub fn name<S: Into<String>>(mut self, dev_name: S) -> Self {
        self.dev_name = Some(dev_name.into());
        self
    }
    /// Ask for a raw control unit; 0 lets the kernel pick. Ignored when a
    /// name is set.
    pub fn unit(mut self, unit: u32) -> Self {
        self.unit = Some(unit);
        self
    }
    pub fn mtu(mut self, mtu: u16) -> Self {
        self.mtu = Some(mtu);
        self
    }
    /// Enable or disable packet information. When enabled, the first 4 bytes
    /// of each packet passed to/from `recv`/`send` are the address-family
    /// header utun uses on the wire.
    pub fn packet_information(mut self, packet_information: bool) -> Self {
        self.packet_information = Some(packet_information);
        self
    }

    pub(crate) fn resolve_unit(&self) -> Result<i32> {
        let unit = match &self.dev_name {
            Some(name) => parse_unit(name)?,
            None => self.unit.unwrap_or(0),
        };
        i32::try_from(unit).map_err(|_| Error::InvalidConfig)
    }

    /// Open the device through `context`.
    pub fn build_with<C: Control>(self, context: &Context<C>) -> Result<TunDevice> {
        let unit = self.resolve_unit()?;
        let device = context.open(unit, self.mtu.map_or(0, i32::from))?;
        device.set_ignore_packet_info(!self.packet_information.unwrap_or(false));
        Ok(device)
    }

    #[cfg(target_os = "macos")]
    pub fn build_sync(self) -> Result<TunDevice> {
        self.build_with(crate::context::global())
    }

    #[cfg(all(target_os = "macos", any(feature = "async_std", feature = "async_tokio")))]
    pub fn build_async(self) -> Result<crate::AsyncDevice> {
        crate::AsyncDevice::new(self.build_sync()?)
    }
}
