use crate::device::TunDevice;
use crate::error::{Error, Result};
use std::io;
use std::ops::Deref;
use std::os::fd::{AsRawFd, RawFd};
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};

#[cfg(all(feature = "async_tokio", not(feature = "async_std")))]
mod tokio;
#[cfg(all(feature = "async_tokio", not(feature = "async_std")))]
use self::tokio::AsyncFd;

#[cfg(all(feature = "async_std", not(feature = "async_tokio")))]
mod async_std;
#[cfg(all(feature = "async_std", not(feature = "async_tokio")))]
use self::async_std::AsyncFd;

#[cfg(all(feature = "async_tokio", feature = "async_std", not(doc)))]
compile_error! {"More than one asynchronous runtime is simultaneously specified in features"}

/// A TUN device registered with a reactor.
///
/// The reactor supplies readiness; the transfers underneath are the same
/// single-call primitives as on [`TunDevice`].
pub struct AsyncDevice {
    inner: AsyncFd,
}

impl AsRawFd for AsyncDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.get_ref().as_raw_fd()
    }
}

impl Deref for AsyncDevice {
    type Target = TunDevice;

    fn deref(&self) -> &Self::Target {
        self.inner.get_ref()
    }
}

impl AsyncDevice {
    /// Register an open device with the current reactor.
    pub fn new(device: TunDevice) -> Result<AsyncDevice> {
        if !device.is_open() {
            return Err(Error::Closed);
        }
        Ok(AsyncDevice {
            inner: AsyncFd::new(device).map_err(Error::Io)?,
        })
    }
    /// Deregister from the reactor and hand the device back.
    pub fn into_device(self) -> io::Result<TunDevice> {
        self.inner.into_device()
    }
    /// Deregister from the reactor, then close the device.
    pub fn close(self) -> Result<()> {
        let mut device = self.inner.into_device().map_err(Error::Io)?;
        device.close()
    }
    pub fn poll_recv(&self, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<io::Result<usize>> {
        self.inner.poll_recv(cx, buf)
    }
    pub fn poll_send(&self, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        self.inner.poll_send(cx, buf)
    }
    pub async fn readable(&self) -> io::Result<()> {
        self.inner.readable().await
    }
    pub fn poll_readable(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.inner.poll_readable(cx)
    }
    pub async fn writable(&self) -> io::Result<()> {
        self.inner.writable().await
    }
    pub fn poll_writable(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.inner.poll_writable(cx)
    }
    /// Recv a packet from tun device
    pub async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.recv(buf).await
    }
    pub fn try_recv(&self, buf: &mut [u8]) -> Result<usize> {
        self.inner.get_ref().recv(buf)
    }
    /// Recv a packet into a freshly allocated buffer.
    pub async fn recv_packet(&self) -> io::Result<Bytes> {
        let mut buf = BytesMut::zeroed(self.packet_buffer_len());
        let amount = self.recv(&mut buf).await?;
        buf.truncate(amount);
        Ok(buf.freeze())
    }

    /// Send a packet to tun device
    pub async fn send(&self, buf: &[u8]) -> io::Result<usize> {
        self.inner.send(buf).await
    }
    pub fn try_send(&self, buf: &[u8]) -> Result<usize> {
        self.inner.get_ref().send(buf)
    }
}
