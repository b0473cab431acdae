use libc::ifreq;
use nix::{ioctl_readwrite, ioctl_write_ptr};

use crate::platform::control::CtlInfo;

pub const UTUN_CONTROL_NAME: &str = "com.apple.net.utun_control";

ioctl_readwrite!(ctliocginfo, b'N', 3, CtlInfo);

ioctl_write_ptr!(siocsifmtu, b'i', 52, ifreq);
ioctl_readwrite!(siocgifmtu, b'i', 51, ifreq);
