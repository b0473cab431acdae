use std::io;
use std::mem;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::ptr;

use libc::{
    c_char, c_uint, c_void, sockaddr, socklen_t, AF_SYSTEM, AF_SYS_CONTROL, IFNAMSIZ, PF_SYSTEM,
    SOCK_DGRAM, SYSPROTO_CONTROL, UTUN_OPT_IFNAME,
};

use crate::address::TunAddress;
use crate::platform::control::{Control, CtlInfo};
use crate::platform::macos::sys::*;

/// The `com.apple.net.utun_control` kernel control.
#[derive(Clone, Copy, Debug, Default)]
pub struct Utun;

impl Utun {
    /// Prepare an interface request for `address`.
    fn request(address: &TunAddress) -> io::Result<libc::ifreq> {
        let name = address
            .if_name()
            .ok_or_else(|| io::Error::from(io::ErrorKind::InvalidInput))?;
        if name.len() >= IFNAMSIZ {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "interface name too long",
            ));
        }
        unsafe {
            let mut req: libc::ifreq = mem::zeroed();
            ptr::copy_nonoverlapping(
                name.as_ptr() as *const c_char,
                req.ifr_name.as_mut_ptr(),
                name.len(),
            );
            Ok(req)
        }
    }
}

impl Control for Utun {
    fn control_name(&self) -> &str {
        UTUN_CONTROL_NAME
    }

    fn socket(&self) -> io::Result<OwnedFd> {
        let fd = unsafe { libc::socket(PF_SYSTEM, SOCK_DGRAM, SYSPROTO_CONTROL) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(unsafe { OwnedFd::from_raw_fd(fd) })
    }

    fn ctl_info(&self, fd: BorrowedFd<'_>, info: &mut CtlInfo) -> io::Result<()> {
        unsafe { ctliocginfo(fd.as_raw_fd(), info) }
            .map(|_| ())
            .map_err(io::Error::from)
    }

    fn connect(&self, fd: BorrowedFd<'_>, ctl_id: u32, unit: u32) -> io::Result<()> {
        let addr = libc::sockaddr_ctl {
            sc_id: ctl_id,
            sc_len: mem::size_of::<libc::sockaddr_ctl>() as _,
            sc_family: AF_SYSTEM as _,
            ss_sysaddr: AF_SYS_CONTROL as _,
            sc_unit: unit as c_uint,
            sc_reserved: [0; 5],
        };
        let address = &addr as *const libc::sockaddr_ctl as *const sockaddr;
        let ret = unsafe {
            libc::connect(
                fd.as_raw_fd(),
                address,
                mem::size_of_val(&addr) as socklen_t,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn if_name(&self, fd: BorrowedFd<'_>) -> io::Result<TunAddress> {
        let mut tun_name = [0u8; IFNAMSIZ];
        let mut name_len = IFNAMSIZ as socklen_t;
        let ret = unsafe {
            libc::getsockopt(
                fd.as_raw_fd(),
                SYSPROTO_CONTROL,
                UTUN_OPT_IFNAME,
                tun_name.as_mut_ptr() as *mut c_void,
                &mut name_len,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        let len = (name_len as usize).min(IFNAMSIZ);
        Ok(TunAddress::from_c_buf(&tun_name[..len]))
    }

    fn mtu(&self, fd: BorrowedFd<'_>, address: &TunAddress) -> io::Result<i32> {
        let mut req = Utun::request(address)?;
        unsafe { siocgifmtu(fd.as_raw_fd(), &mut req) }.map_err(io::Error::from)?;
        Ok(unsafe { req.ifr_ifru.ifru_mtu })
    }

    fn set_mtu(&self, fd: BorrowedFd<'_>, address: &TunAddress, mtu: i32) -> io::Result<()> {
        let mut req = Utun::request(address)?;
        req.ifr_ifru.ifru_mtu = mtu;
        unsafe { siocsifmtu(fd.as_raw_fd(), &req) }.map_err(io::Error::from)?;
        Ok(())
    }
}
