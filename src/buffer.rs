use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::error::{Error, Result};

/// A caller-owned span `[pos, limit)` of bytes used for one transfer.
///
/// The device only touches the memory for the duration of a single
/// `read`/`write` call and never keeps a reference to it.
pub struct BufferRegion<'a> {
    base: NonNull<u8>,
    pos: usize,
    limit: usize,
    _marker: PhantomData<&'a mut [u8]>,
}

impl<'a> BufferRegion<'a> {
    /// The whole of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        let limit = buf.len();
        BufferRegion {
            base: NonNull::from(buf).cast::<u8>(),
            pos: 0,
            limit,
            _marker: PhantomData,
        }
    }

    /// The sub-span `buf[pos..limit]`.
    pub fn with_bounds(buf: &'a mut [u8], pos: usize, limit: usize) -> Result<Self> {
        if pos > limit || limit > buf.len() {
            return Err(Error::InvalidRegion);
        }
        let mut region = BufferRegion::new(buf);
        region.pos = pos;
        region.limit = limit;
        Ok(region)
    }

    /// Zero-copy access to memory the caller manages itself.
    ///
    /// # Safety
    /// `address + pos .. address + limit` must be valid for reads and writes,
    /// and must not be accessed through any other path, for `'a`.
    pub unsafe fn from_raw_parts(address: *mut u8, pos: usize, limit: usize) -> Result<Self> {
        let base = NonNull::new(address).ok_or(Error::InvalidRegion)?;
        if pos > limit {
            return Err(Error::InvalidRegion);
        }
        Ok(BufferRegion {
            base,
            pos,
            limit,
            _marker: PhantomData,
        })
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.limit
    }

    /// Move `pos` forward by `n` bytes, saturating at `limit`. Used to resume
    /// after a short write.
    pub fn advance(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.limit);
    }

    pub fn set_pos(&mut self, pos: usize) -> Result<()> {
        if pos > self.limit {
            return Err(Error::InvalidRegion);
        }
        self.pos = pos;
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.remaining()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), self.remaining()) }
    }

    pub(crate) fn as_ptr(&self) -> *const u8 {
        unsafe { self.base.as_ptr().add(self.pos) }
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        unsafe { self.base.as_ptr().add(self.pos) }
    }
}

impl<'a> From<&'a mut [u8]> for BufferRegion<'a> {
    fn from(buf: &'a mut [u8]) -> Self {
        BufferRegion::new(buf)
    }
}

impl std::fmt::Debug for BufferRegion<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferRegion")
            .field("base", &self.base)
            .field("pos", &self.pos)
            .field("limit", &self.limit)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bounds() {
        let mut buf = [0u8; 16];
        assert!(BufferRegion::with_bounds(&mut buf, 4, 16).is_ok());
        assert!(matches!(
            BufferRegion::with_bounds(&mut buf, 5, 4),
            Err(Error::InvalidRegion)
        ));
        assert!(matches!(
            BufferRegion::with_bounds(&mut buf, 0, 17),
            Err(Error::InvalidRegion)
        ));
    }

    #[test]
    fn advance_saturates() {
        let mut buf = *b"abcdefgh";
        let mut region = BufferRegion::with_bounds(&mut buf, 2, 6).unwrap();
        assert_eq!(region.as_slice(), b"cdef");
        region.advance(3);
        assert_eq!(region.pos(), 5);
        assert_eq!(region.as_slice(), b"f");
        region.advance(100);
        assert!(region.is_empty());
        assert_eq!(region.remaining(), 0);
        assert!(region.set_pos(7).is_err());
        region.set_pos(2).unwrap();
        region.as_mut_slice()[0] = b'X';
        assert_eq!(&buf, b"abXdefgh");
    }

    #[test]
    fn raw_parts() {
        let mut buf = vec![7u8; 32];
        let region = unsafe { BufferRegion::from_raw_parts(buf.as_mut_ptr(), 8, 24) }.unwrap();
        assert_eq!(region.remaining(), 16);
        assert!(region.as_slice().iter().all(|b| *b == 7));
        assert!(unsafe { BufferRegion::from_raw_parts(std::ptr::null_mut(), 0, 0) }.is_err());
    }
}
