use crate::device::TunDevice;
use ::tokio::io::unix::AsyncFd as TokioAsyncFd;
use ::tokio::io::Interest;
use std::io;
use std::task::{ready, Context, Poll};

pub struct AsyncFd(TokioAsyncFd<TunDevice>);
impl AsyncFd {
    pub fn new(device: TunDevice) -> io::Result<Self> {
        device.set_nonblocking(true)?;
        // SAFETY: the descriptor belongs to `device` and is only closed through
        // `&mut TunDevice`, which the registration never hands out.
        let inner = unsafe { TokioAsyncFd::register(device) }?;
        Ok(Self(inner))
    }
    pub fn into_device(self) -> io::Result<TunDevice> {
        Ok(self.0.into_inner())
    }
    pub async fn readable(&self) -> io::Result<()> {
        let _ = self.0.readable().await?;
        Ok(())
    }
    pub fn poll_readable(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.0.poll_read_ready(cx).map_ok(|_| ())
    }
    pub async fn writable(&self) -> io::Result<()> {
        let _ = self.0.writable().await?;
        Ok(())
    }
    pub fn poll_writable(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.0.poll_write_ready(cx).map_ok(|_| ())
    }
    pub fn poll_recv(&self, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<io::Result<usize>> {
        loop {
            let mut guard = ready!(self.0.poll_read_ready(cx))?;
            match guard.try_io(|inner| Ok(inner.get_ref().recv(buf)?)) {
                Ok(result) => return Poll::Ready(result),
                Err(_would_block) => continue,
            }
        }
    }
    pub fn poll_send(&self, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        loop {
            let mut guard = ready!(self.0.poll_write_ready(cx))?;
            match guard.try_io(|inner| Ok(inner.get_ref().send(buf)?)) {
                Ok(result) => return Poll::Ready(result),
                Err(_would_block) => continue,
            }
        }
    }
    pub async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.0
            .async_io(Interest::READABLE.add(Interest::ERROR), |device| {
                Ok(device.recv(buf)?)
            })
            .await
    }
    pub async fn send(&self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .async_io(Interest::WRITABLE, |device| Ok(device.send(buf)?))
            .await
    }

    pub fn get_ref(&self) -> &TunDevice {
        self.0.get_ref()
    }
}
