use std::io;
use std::io::{IoSlice, IoSliceMut};
use std::os::unix::io::{AsRawFd, IntoRawFd, OwnedFd, RawFd};

use libc::{self, fcntl, F_GETFL, F_SETFL, O_NONBLOCK};

/// POSIX file descriptor owning one native resource.
///
/// Every transfer method performs exactly one syscall. Nothing here loops
/// on `EINTR` or `EAGAIN`.
pub(crate) struct Fd {
    pub(crate) inner: RawFd,
}

impl Fd {
    #[cfg(test)]
    pub fn new(value: RawFd) -> io::Result<Self> {
        if value < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Fd { inner: value })
    }

    pub fn is_open(&self) -> bool {
        self.inner >= 0
    }

    pub fn is_nonblocking(&self) -> io::Result<bool> {
        let flags = unsafe { fcntl(self.inner, F_GETFL) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(flags & O_NONBLOCK != 0)
    }

    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        let flags = unsafe { fcntl(self.inner, F_GETFL) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        let flags = if nonblocking {
            flags | O_NONBLOCK
        } else {
            flags & !O_NONBLOCK
        };
        match unsafe { fcntl(self.inner, F_SETFL, flags) } {
            -1 => Err(io::Error::last_os_error()),
            _ => Ok(()),
        }
    }

    /// # Safety
    /// `buf` must be valid for `len` bytes of writes.
    #[inline]
    pub unsafe fn read_raw(&self, buf: *mut u8, len: usize) -> io::Result<usize> {
        let amount = libc::read(self.inner, buf as *mut _, len);
        if amount < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(amount as usize)
    }

    /// # Safety
    /// `buf` must be valid for `len` bytes of reads.
    #[inline]
    pub unsafe fn write_raw(&self, buf: *const u8, len: usize) -> io::Result<usize> {
        let amount = libc::write(self.inner, buf as *const _, len);
        if amount < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(amount as usize)
    }

    #[inline]
    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        unsafe { self.read_raw(buf.as_mut_ptr(), buf.len()) }
    }

    #[inline]
    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        unsafe { self.write_raw(buf.as_ptr(), buf.len()) }
    }

    #[inline]
    pub fn readv(&self, bufs: &mut [IoSliceMut<'_>]) -> io::Result<usize> {
        if bufs.len() > max_iov() {
            return Err(io::Error::from(io::ErrorKind::InvalidInput));
        }
        let amount = unsafe {
            libc::readv(
                self.inner,
                bufs.as_mut_ptr() as *mut libc::iovec as *const libc::iovec,
                bufs.len() as libc::c_int,
            )
        };
        if amount < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(amount as usize)
    }

    #[inline]
    pub fn writev(&self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        if bufs.len() > max_iov() {
            return Err(io::Error::from(io::ErrorKind::InvalidInput));
        }
        let amount = unsafe {
            libc::writev(
                self.inner,
                bufs.as_ptr() as *const libc::iovec,
                bufs.len() as libc::c_int,
            )
        };
        if amount < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(amount as usize)
    }

    /// Release the descriptor. The descriptor is forgotten before `close(2)`
    /// runs, so a second call is a no-op even when the first one failed.
    pub fn close(&mut self) -> io::Result<()> {
        let fd = std::mem::replace(&mut self.inner, -1);
        if fd < 0 {
            return Ok(());
        }
        match unsafe { libc::close(fd) } {
            0 => Ok(()),
            _ => Err(io::Error::last_os_error()),
        }
    }
}

#[cfg(any(
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_vendor = "apple",
))]
pub(crate) const fn max_iov() -> usize {
    libc::IOV_MAX as usize
}

#[cfg(any(target_os = "android", target_os = "linux"))]
pub(crate) const fn max_iov() -> usize {
    libc::UIO_MAXIOV as usize
}

impl From<OwnedFd> for Fd {
    fn from(fd: OwnedFd) -> Self {
        Fd {
            inner: fd.into_raw_fd(),
        }
    }
}

impl AsRawFd for Fd {
    fn as_raw_fd(&self) -> RawFd {
        self.inner
    }
}

impl Drop for Fd {
    fn drop(&mut self) {
        if self.is_open() {
            unsafe { libc::close(self.inner) };
        }
    }
}
