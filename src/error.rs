use std::io;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The control socket could not be allocated.
    #[error("failed to allocate control socket: {0}")]
    ResourceExhausted(#[source] io::Error),

    #[error("utun control name too long")]
    NameTooLong,

    #[error("invalid device tun name")]
    InvalidName,

    #[error("invalid configuration")]
    InvalidConfig,

    #[error("buffer region out of bounds")]
    InvalidRegion,

    /// Reading or writing the interface MTU failed.
    #[error("failed to configure device: {0}")]
    DeviceConfig(#[source] io::Error),

    #[error(transparent)]
    Io(io::Error),

    #[error("device is closed")]
    Closed,

    /// No data (or no room) right now. Wait for readiness and retry.
    #[error("operation would block")]
    WouldBlock,

    #[error("device closed by peer")]
    Eof,
}

impl Error {
    /// Classify a raw OS error returned by a transfer call.
    pub fn from_io(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::WouldBlock {
            Error::WouldBlock
        } else {
            Error::Io(err)
        }
    }

    pub fn is_would_block(&self) -> bool {
        matches!(self, Error::WouldBlock)
    }

    /// `true` for a transfer that was interrupted by a signal. Nothing in this
    /// crate retries those; the caller decides.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Io(err) if err.kind() == io::ErrorKind::Interrupted)
    }

    /// The underlying OS error code, if any.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::Io(err) | Error::ResourceExhausted(err) | Error::DeviceConfig(err) => {
                err.raw_os_error()
            }
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::from_io(err)
    }
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::Io(err) => err,
            Error::WouldBlock => io::Error::from(io::ErrorKind::WouldBlock),
            Error::Eof => io::Error::new(io::ErrorKind::UnexpectedEof, value),
            Error::Closed => io::Error::new(io::ErrorKind::NotConnected, value),
            Error::InvalidRegion => io::Error::new(io::ErrorKind::InvalidInput, value),
            _ => io::Error::new(io::ErrorKind::Other, value),
        }
    }
}

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = Error> = ::std::result::Result<T, E>;
