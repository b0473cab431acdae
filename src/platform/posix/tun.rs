use crate::platform::posix::Fd;
use crate::PACKET_INFORMATION_LENGTH as PIL;
use byteorder::{BigEndian, ByteOrder};
use std::io::{self, IoSlice, IoSliceMut};
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};

/// Infer the protocol based on the first nibble in the packet buffer.
pub(crate) fn is_ipv6(buf: &[u8]) -> io::Result<bool> {
    use std::io::{Error, ErrorKind::InvalidData};
    if buf.is_empty() {
        return Err(Error::new(InvalidData, "Zero-length data"));
    }
    match buf[0] >> 4 {
        4 => Ok(false),
        6 => Ok(true),
        p => Err(Error::new(InvalidData, format!("IP version {}", p))),
    }
}

/// The address-family header utun expects in front of a packet.
pub(crate) fn generate_packet_information(ipv6: bool) -> [u8; PIL] {
    let family = if ipv6 { libc::AF_INET6 } else { libc::AF_INET };
    let mut head = [0u8; PIL];
    BigEndian::write_u32(&mut head, family as u32);
    head
}

/// Packet framing over a device descriptor.
///
/// When `ignore_packet_information` is set, `recv`/`send` hide the 4-byte
/// address-family header from the caller.
pub(crate) struct Tun {
    pub(crate) fd: Fd,
    ignore_packet_information: AtomicBool,
}

impl Tun {
    pub(crate) fn new(fd: Fd) -> Self {
        Self {
            fd,
            ignore_packet_information: AtomicBool::new(true),
        }
    }

    /// A framed packet goes out whole or not at all: a short `writev` is an
    /// error rather than a resumable count, since resuming would put a second
    /// header in front of the tail.
    pub(crate) fn send(&self, buf: &[u8]) -> io::Result<usize> {
        if self.ignore_packet_info() {
            let ipv6 = is_ipv6(buf)?;
            let header = generate_packet_information(ipv6);
            let len = self
                .fd
                .writev(&[IoSlice::new(&header), IoSlice::new(buf)])?;
            if len != PIL + buf.len() {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("partial packet write: {len} of {} bytes", PIL + buf.len()),
                ));
            }
            return Ok(buf.len());
        }
        self.fd.write(buf)
    }

    /// Returns the number of packet bytes read, header excluded. `Ok(0)` means
    /// the read itself returned nothing, i.e. the peer is gone. Anything
    /// shorter than the header, or not an IPv4/IPv6 packet, is `InvalidData`.
    pub(crate) fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        if self.ignore_packet_info() {
            let mut head = [0u8; PIL];
            let len = self
                .fd
                .readv(&mut [IoSliceMut::new(&mut head), IoSliceMut::new(buf)])?;
            if len == 0 {
                return Ok(0);
            }
            let amount = len.checked_sub(PIL).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, format!("short packet: {len} bytes"))
            })?;
            is_ipv6(&buf[..amount])?;
            Ok(amount)
        } else {
            self.fd.read(buf)
        }
    }

    #[inline]
    pub(crate) fn ignore_packet_info(&self) -> bool {
        self.ignore_packet_information.load(Ordering::Relaxed)
    }

    pub(crate) fn set_ignore_packet_info(&self, ign: bool) {
        self.ignore_packet_information.store(ign, Ordering::Relaxed);
    }
}

impl AsRawFd for Tun {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}
