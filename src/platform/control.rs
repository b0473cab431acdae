use std::io;
use std::os::fd::{BorrowedFd, OwnedFd};

use libc::c_char;

use crate::address::TunAddress;
use crate::device::TunDevice;
use crate::error::{Error, Result};
use crate::platform::posix::{Fd, Tun};

/// Size of `ctl_info.ctl_name`, terminating NUL included.
pub const MAX_KCTL_NAME: usize = 96;

/// Mirror of the kernel's `struct ctl_info`.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct CtlInfo {
    pub ctl_id: u32,
    pub ctl_name: [c_char; MAX_KCTL_NAME],
}

impl CtlInfo {
    /// Fails with `NameTooLong` when `name` and its NUL do not fit.
    pub fn new(name: &str) -> Result<Self> {
        if name.len() >= MAX_KCTL_NAME {
            return Err(Error::NameTooLong);
        }
        let mut ctl_name = [0; MAX_KCTL_NAME];
        for (i, o) in name.as_bytes().iter().zip(ctl_name.iter_mut()) {
            *o = *i as c_char;
        }
        Ok(CtlInfo { ctl_id: 0, ctl_name })
    }

    pub fn name_bytes(&self) -> Vec<u8> {
        self.ctl_name
            .iter()
            .take_while(|c| **c != 0)
            .map(|c| *c as u8)
            .collect()
    }
}

/// The control-plane primitives used to bring up a TUN device.
///
/// Each method maps to one syscall of the open sequence. Implementations
/// must not retain the descriptors they are handed.
pub trait Control {
    /// Name of the kernel control that hands out TUN units.
    fn control_name(&self) -> &str;

    /// Create the control-plane socket.
    fn socket(&self) -> io::Result<OwnedFd>;

    /// Resolve `info.ctl_name` to a control id, stored in `info.ctl_id`.
    fn ctl_info(&self, fd: BorrowedFd<'_>, info: &mut CtlInfo) -> io::Result<()>;

    /// Connect to unit `unit` of control `ctl_id`. Unit 0 lets the kernel pick.
    fn connect(&self, fd: BorrowedFd<'_>, ctl_id: u32, unit: u32) -> io::Result<()>;

    /// The interface name the kernel assigned to the connected socket.
    fn if_name(&self, fd: BorrowedFd<'_>) -> io::Result<TunAddress>;

    fn mtu(&self, fd: BorrowedFd<'_>, address: &TunAddress) -> io::Result<i32>;

    fn set_mtu(&self, fd: BorrowedFd<'_>, address: &TunAddress, mtu: i32) -> io::Result<()>;
}

impl<C: Control + ?Sized> Control for &C {
    fn control_name(&self) -> &str {
        (**self).control_name()
    }
    fn socket(&self) -> io::Result<OwnedFd> {
        (**self).socket()
    }
    fn ctl_info(&self, fd: BorrowedFd<'_>, info: &mut CtlInfo) -> io::Result<()> {
        (**self).ctl_info(fd, info)
    }
    fn connect(&self, fd: BorrowedFd<'_>, ctl_id: u32, unit: u32) -> io::Result<()> {
        (**self).connect(fd, ctl_id, unit)
    }
    fn if_name(&self, fd: BorrowedFd<'_>) -> io::Result<TunAddress> {
        (**self).if_name(fd)
    }
    fn mtu(&self, fd: BorrowedFd<'_>, address: &TunAddress) -> io::Result<i32> {
        (**self).mtu(fd, address)
    }
    fn set_mtu(&self, fd: BorrowedFd<'_>, address: &TunAddress, mtu: i32) -> io::Result<()> {
        (**self).set_mtu(fd, address, mtu)
    }
}

/// Allocate and configure a TUN device.
///
/// `index` is the control unit (0 = next free `utunN`), `mtu` 0 keeps the
/// kernel default. The socket is owned from the first step on, so every
/// early return closes it.
pub(crate) fn open<C: Control + ?Sized>(control: &C, index: i32, mtu: i32) -> Result<TunDevice> {
    if index < 0 || mtu < 0 {
        return Err(Error::InvalidConfig);
    }
    let unit = index as u32;

    let socket = control.socket().map_err(Error::ResourceExhausted)?;
    let fd = Fd::from(socket);

    let mut info = CtlInfo::new(control.control_name())?;
    control
        .ctl_info(borrow(&fd), &mut info)
        .map_err(Error::Io)?;
    control
        .connect(borrow(&fd), info.ctl_id, unit)
        .map_err(Error::Io)?;
    let address = control.if_name(borrow(&fd)).map_err(Error::Io)?;

    let mtu = if mtu != 0 {
        control
            .set_mtu(borrow(&fd), &address, mtu)
            .map_err(Error::DeviceConfig)?;
        mtu
    } else {
        control
            .mtu(borrow(&fd), &address)
            .map_err(Error::DeviceConfig)?
    };
    if mtu <= 0 {
        return Err(Error::DeviceConfig(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("kernel reported mtu {mtu}"),
        )));
    }

    fd.set_nonblocking(true).map_err(Error::Io)?;
    log::debug!("opened {address} (unit {unit}, mtu {mtu})");
    Ok(TunDevice::new(Tun::new(fd), mtu, address))
}

fn borrow(fd: &Fd) -> BorrowedFd<'_> {
    // The Fd is open for the whole open sequence.
    unsafe { BorrowedFd::borrow_raw(fd.inner) }
}
