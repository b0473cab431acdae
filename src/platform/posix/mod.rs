mod fd;
pub(crate) use self::fd::Fd;

mod tun;
pub(crate) use self::tun::Tun;
