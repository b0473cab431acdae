#![allow(dead_code)]
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use utun_rs::{Control, CtlInfo, TunAddress};

/// Preserves packet boundaries where the platform allows it.
#[cfg(target_os = "linux")]
pub const PACKET_SOCK: libc::c_int = libc::SOCK_SEQPACKET;
#[cfg(not(target_os = "linux"))]
pub const PACKET_SOCK: libc::c_int = libc::SOCK_STREAM;

pub const CTL_ID: u32 = 42;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    Socket,
    CtlInfo,
    Connect,
    IfName,
    Mtu,
    SetMtu,
}

/// A control plane whose "device" is one end of a socketpair. The other end
/// is kept as the peer view of the interface.
pub struct SocketPairControl {
    pub kind: libc::c_int,
    pub control_name: String,
    pub if_name: String,
    pub default_mtu: i32,
    pub fail_at: Option<Step>,
    pub allocated: AtomicUsize,
    pub connected_unit: Mutex<Option<u32>>,
    pub mtu_set: Mutex<Option<i32>>,
    peers: Mutex<Vec<OwnedFd>>,
}

impl Default for SocketPairControl {
    fn default() -> Self {
        SocketPairControl {
            kind: PACKET_SOCK,
            control_name: "com.apple.net.utun_control".to_string(),
            if_name: "utun7".to_string(),
            default_mtu: 1500,
            fail_at: None,
            allocated: AtomicUsize::new(0),
            connected_unit: Mutex::new(None),
            mtu_set: Mutex::new(None),
            peers: Mutex::new(Vec::new()),
        }
    }
}

impl SocketPairControl {
    pub fn failing_at(step: Step) -> Self {
        SocketPairControl {
            fail_at: Some(step),
            ..Default::default()
        }
    }

    /// The MTU the "kernel" reports when none is requested.
    pub fn with_default_mtu(default_mtu: i32) -> Self {
        SocketPairControl {
            default_mtu,
            ..Default::default()
        }
    }

    pub fn with_control_name<S: Into<String>>(control_name: S) -> Self {
        SocketPairControl {
            control_name: control_name.into(),
            ..Default::default()
        }
    }

    pub fn stream() -> Self {
        SocketPairControl {
            kind: libc::SOCK_STREAM,
            ..Default::default()
        }
    }

    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    /// The peer end of the most recently created device socket.
    pub fn take_peer(&self) -> OwnedFd {
        self.peers
            .lock()
            .unwrap()
            .pop()
            .expect("no device socket was created")
    }

    /// Number of device sockets that are no longer open, judged from their
    /// peers seeing end-of-file.
    pub fn released(&self) -> usize {
        self.peers
            .lock()
            .unwrap()
            .iter()
            .filter(|peer| is_peer_closed(peer))
            .count()
    }

    fn check(&self, step: Step) -> io::Result<()> {
        if self.fail_at == Some(step) {
            let code = match step {
                Step::Socket => libc::EMFILE,
                Step::Mtu | Step::SetMtu => libc::EINVAL,
                _ => libc::EIO,
            };
            return Err(io::Error::from_raw_os_error(code));
        }
        Ok(())
    }
}

impl Control for SocketPairControl {
    fn control_name(&self) -> &str {
        &self.control_name
    }

    fn socket(&self) -> io::Result<OwnedFd> {
        self.check(Step::Socket)?;
        let mut fds = [0; 2];
        let ret = unsafe { libc::socketpair(libc::AF_UNIX, self.kind, 0, fds.as_mut_ptr()) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        let (device, peer) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
        self.peers.lock().unwrap().push(peer);
        self.allocated.fetch_add(1, Ordering::SeqCst);
        Ok(device)
    }

    fn ctl_info(&self, _fd: BorrowedFd<'_>, info: &mut CtlInfo) -> io::Result<()> {
        self.check(Step::CtlInfo)?;
        assert_eq!(info.name_bytes(), self.control_name.as_bytes());
        info.ctl_id = CTL_ID;
        Ok(())
    }

    fn connect(&self, _fd: BorrowedFd<'_>, ctl_id: u32, unit: u32) -> io::Result<()> {
        self.check(Step::Connect)?;
        assert_eq!(ctl_id, CTL_ID);
        *self.connected_unit.lock().unwrap() = Some(unit);
        Ok(())
    }

    fn if_name(&self, _fd: BorrowedFd<'_>) -> io::Result<TunAddress> {
        self.check(Step::IfName)?;
        let mut buf = [0u8; libc::IFNAMSIZ];
        buf[..self.if_name.len()].copy_from_slice(self.if_name.as_bytes());
        Ok(TunAddress::from_c_buf(&buf))
    }

    fn mtu(&self, _fd: BorrowedFd<'_>, _address: &TunAddress) -> io::Result<i32> {
        self.check(Step::Mtu)?;
        Ok(self.default_mtu)
    }

    fn set_mtu(&self, _fd: BorrowedFd<'_>, _address: &TunAddress, mtu: i32) -> io::Result<()> {
        self.check(Step::SetMtu)?;
        *self.mtu_set.lock().unwrap() = Some(mtu);
        Ok(())
    }
}

pub fn is_peer_closed(peer: &OwnedFd) -> bool {
    let mut buf = [0u8; 1];
    let n = unsafe {
        libc::recv(
            peer.as_raw_fd(),
            buf.as_mut_ptr() as *mut _,
            buf.len(),
            libc::MSG_DONTWAIT | libc::MSG_PEEK,
        )
    };
    n == 0
}

pub fn peer_send(peer: &OwnedFd, buf: &[u8]) -> io::Result<usize> {
    let n = unsafe { libc::send(peer.as_raw_fd(), buf.as_ptr() as *const _, buf.len(), 0) };
    if n < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(n as usize)
}

/// Non-blocking receive on the peer end.
pub fn peer_recv(peer: &OwnedFd, buf: &mut [u8]) -> io::Result<usize> {
    let n = unsafe {
        libc::recv(
            peer.as_raw_fd(),
            buf.as_mut_ptr() as *mut _,
            buf.len(),
            libc::MSG_DONTWAIT,
        )
    };
    if n < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(n as usize)
}

/// An IPv4 packet of exactly `len` bytes (at least the 20-byte header).
pub fn ipv4_packet(len: usize) -> Vec<u8> {
    use pnet_packet::ip::IpNextHeaderProtocols;
    use pnet_packet::ipv4::MutableIpv4Packet;

    let mut buf = vec![0u8; len];
    {
        let mut packet = MutableIpv4Packet::new(&mut buf).expect("buffer too small for ipv4");
        packet.set_version(4);
        packet.set_header_length(5);
        packet.set_total_length(len as u16);
        packet.set_ttl(64);
        packet.set_next_level_protocol(IpNextHeaderProtocols::Udp);
        packet.set_source("10.26.1.100".parse().unwrap());
        packet.set_destination("10.26.1.101".parse().unwrap());
    }
    for (i, b) in buf.iter_mut().enumerate().skip(20) {
        *b = i as u8;
    }
    buf
}

pub fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}
