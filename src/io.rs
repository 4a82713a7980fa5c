//! The minimal writer abstraction the encoder writes events through.
//!
//! Events are never written straight into a `std::io::Write` writer: tracks are first encoded
//! into memory so that chunk lengths can be written ahead of the chunk contents. This trait lets
//! the same encoding routines target either an in-memory buffer or a byte counter.

use crate::prelude::*;

pub type WriteResult<W> = StdResult<(), <W as Write>::Error>;

/// A destination for encoded MIDI bytes.
pub trait Write {
    type Error;

    fn write(&mut self, buf: &[u8]) -> WriteResult<Self>;

    /// Build an error that reports a value which cannot be encoded.
    fn invalid_input(msg: &'static str) -> Self::Error;
}

impl Write for Vec<u8> {
    type Error = &'static str;
    #[inline]
    fn write(&mut self, buf: &[u8]) -> WriteResult<Self> {
        self.extend_from_slice(buf);
        Ok(())
    }
    #[inline]
    fn invalid_input(msg: &'static str) -> &'static str {
        msg
    }
}

/// Counts the bytes written into it without storing them.
///
/// Used to find out the size of an encoded track without allocating.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct WriteCounter(pub u64);
impl Write for WriteCounter {
    type Error = &'static str;
    #[inline]
    fn write(&mut self, buf: &[u8]) -> WriteResult<Self> {
        self.0 += buf.len() as u64;
        Ok(())
    }
    #[inline]
    fn invalid_input(msg: &'static str) -> &'static str {
        msg
    }
}
