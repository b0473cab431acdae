use crate::device::TunDevice;
use ::async_io::Async;
use std::io;
use std::task::{Context, Poll};
pub struct AsyncFd(Async<TunDevice>);
impl AsyncFd {
    pub fn new(device: TunDevice) -> io::Result<Self> {
        Ok(Self(Async::new(device)?))
    }
    pub fn into_device(self) -> io::Result<TunDevice> {
        self.0.into_inner()
    }
    pub async fn readable(&self) -> io::Result<()> {
        self.0.readable().await
    }
    pub fn poll_readable(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.0.poll_readable(cx)
    }
    pub async fn writable(&self) -> io::Result<()> {
        self.0.writable().await
    }
    pub fn poll_writable(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.0.poll_writable(cx)
    }
    pub fn poll_recv(&self, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<io::Result<usize>> {
        loop {
            return match self.poll_readable(cx) {
                Poll::Ready(Ok(())) => match self.get_ref().recv(buf) {
                    Ok(n) => Poll::Ready(Ok(n)),
                    Err(e) if e.is_would_block() => continue,
                    Err(e) => Poll::Ready(Err(e.into())),
                },
                Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
                Poll::Pending => Poll::Pending,
            };
        }
    }
    pub fn poll_send(&self, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        loop {
            return match self.poll_writable(cx) {
                Poll::Ready(Ok(())) => match self.get_ref().send(buf) {
                    Ok(n) => Poll::Ready(Ok(n)),
                    Err(e) if e.is_would_block() => continue,
                    Err(e) => Poll::Ready(Err(e.into())),
                },
                Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
                Poll::Pending => Poll::Pending,
            };
        }
    }
    pub async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read_with(|device| Ok(device.recv(buf)?)).await
    }
    pub async fn send(&self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_with(|device| Ok(device.send(buf)?)).await
    }

    pub fn get_ref(&self) -> &TunDevice {
        self.0.get_ref()
    }
}
