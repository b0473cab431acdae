use crate::address::TunAddress;
use crate::buffer::BufferRegion;
use crate::error::{Error, Result};
use crate::platform::posix::Tun;
use crate::PACKET_INFORMATION_LENGTH;
use bytes::{Bytes, BytesMut};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};

/// Lifecycle of a [`TunDevice`]. `Closed` is terminal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeviceState {
    Open,
    Closed,
}

/// An open utun interface.
///
/// `read`/`write` borrow the device shared, so one reader and one writer can
/// run at the same time from different threads. `close` borrows it
/// exclusively, which means no transfer can be in flight when it runs.
///
/// # Panics
/// The [`AsFd`] impl panics once the device is closed, since there is no
/// descriptor left to borrow. Readiness code that may outlive `close`
/// should take the descriptor from [`handle`](Self::handle), which returns
/// [`Error::Closed`] instead.
pub struct TunDevice {
    tun: Tun,
    mtu: i32,
    address: TunAddress,
    state: DeviceState,
}

impl TunDevice {
    pub(crate) fn new(tun: Tun, mtu: i32, address: TunAddress) -> Self {
        TunDevice {
            tun,
            mtu,
            address,
            state: DeviceState::Open,
        }
    }

    pub fn address(&self) -> &TunAddress {
        &self.address
    }

    /// Interface name, e.g. `utun7`.
    pub fn name(&self) -> &str {
        self.address.if_name().unwrap_or_default()
    }

    pub fn mtu(&self) -> i32 {
        self.mtu
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == DeviceState::Open
    }

    /// The native descriptor, while the device is open.
    pub fn handle(&self) -> Result<RawFd> {
        self.ensure_open()?;
        Ok(self.tun.as_raw_fd())
    }

    /// Read at most `region.remaining()` bytes into the region with a single
    /// `read(2)`.
    ///
    /// Returns [`Error::WouldBlock`] when nothing is queued, [`Error::Eof`] when
    /// the other end is gone, and [`Error::Closed`] without touching the OS
    /// once the device has been closed. An empty region reads nothing.
    pub fn read(&self, region: &mut BufferRegion<'_>) -> Result<usize> {
        self.ensure_open()?;
        if region.is_empty() {
            return Ok(0);
        }
        let amount = unsafe { self.tun.fd.read_raw(region.as_mut_ptr(), region.remaining()) }?;
        if amount == 0 {
            return Err(Error::Eof);
        }
        Ok(amount)
    }

    /// Write the region with a single `write(2)`.
    ///
    /// A short count is not an error: advance the region by the returned
    /// amount and call again. Interrupted writes are not retried.
    pub fn write(&self, region: &BufferRegion<'_>) -> Result<usize> {
        self.ensure_open()?;
        if region.is_empty() {
            return Ok(0);
        }
        let amount = unsafe { self.tun.fd.write_raw(region.as_ptr(), region.remaining()) }?;
        Ok(amount)
    }

    /// Receive one IP packet, without the address-family header unless
    /// packet information is passed through.
    ///
    /// [`Error::Eof`] only when the read returns nothing. A datagram shorter
    /// than the header, or one that is neither IPv4 nor IPv6, is an
    /// [`Error::Io`] of kind `InvalidData`.
    pub fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;
        let amount = self.tun.recv(buf)?;
        if amount == 0 && !buf.is_empty() {
            return Err(Error::Eof);
        }
        Ok(amount)
    }

    /// Send one IP packet. The address-family header is derived from the IP
    /// version unless packet information is passed through.
    ///
    /// With the header derived here, a packet is sent whole or fails with
    /// [`Error::Io`]; unlike [`write`](Self::write) the count is never short.
    pub fn send(&self, buf: &[u8]) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.tun.send(buf)?)
    }

    /// Receive one packet into a freshly allocated buffer.
    pub fn read_packet(&self) -> Result<Bytes> {
        let len = if self.ignore_packet_info() {
            self.mtu as usize
        } else {
            self.packet_buffer_len()
        };
        let mut buf = BytesMut::zeroed(len);
        let amount = self.recv(&mut buf)?;
        buf.truncate(amount);
        Ok(buf.freeze())
    }

    /// Bytes needed to read one full packet including its header.
    pub fn packet_buffer_len(&self) -> usize {
        self.mtu as usize + PACKET_INFORMATION_LENGTH
    }

    pub fn ignore_packet_info(&self) -> bool {
        self.tun.ignore_packet_info()
    }

    /// With `false`, `recv`/`send` hand the 4-byte address-family header
    /// through to the caller.
    pub fn set_ignore_packet_info(&self, ign: bool) {
        self.tun.set_ignore_packet_info(ign)
    }

    pub fn is_nonblocking(&self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.tun.fd.is_nonblocking()?)
    }

    /// Devices are opened non-blocking; this switches that off for callers
    /// that want to park a thread in `recv`.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.ensure_open()?;
        self.tun.fd.set_nonblocking(nonblocking).map_err(Error::Io)
    }

    /// Release the native resource. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.state == DeviceState::Closed {
            return Ok(());
        }
        self.state = DeviceState::Closed;
        log::debug!("closing {}", self.address);
        self.tun.fd.close().map_err(Error::Io)
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            DeviceState::Open => Ok(()),
            DeviceState::Closed => Err(Error::Closed),
        }
    }
}

impl Drop for TunDevice {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("close {}: {e}", self.address);
        }
    }
}

impl AsRawFd for TunDevice {
    /// `-1` once closed.
    fn as_raw_fd(&self) -> RawFd {
        self.tun.as_raw_fd()
    }
}

impl AsFd for TunDevice {
    /// # Panics
    /// If the device is closed.
    fn as_fd(&self) -> BorrowedFd<'_> {
        assert!(self.is_open(), "{} is closed", self.address);
        unsafe { BorrowedFd::borrow_raw(self.as_raw_fd()) }
    }
}

impl std::fmt::Debug for TunDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunDevice")
            .field("address", &self.address)
            .field("mtu", &self.mtu)
            .field("fd", &self.tun.as_raw_fd())
            .field("state", &self.state)
            .finish()
    }
}
