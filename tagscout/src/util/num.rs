//! Fixed-width integer readers
//!
//! These operate on in-memory buffers. The caller is responsible for making sure enough bytes
//! remain, which every container walker checks before handing a slice over.

use crate::error::Result;
use crate::macros::err;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

macro_rules! endian_readers {
	($($ty:ident),+) => {
		paste::paste! {
			$(
				#[doc = "Read a little-endian `" $ty "` from the start of `bytes`"]
				#[inline]
				pub fn [<read_ $ty _le>](bytes: &[u8]) -> $ty {
					LittleEndian::[<read_ $ty>](bytes)
				}

				#[doc = "Read a big-endian `" $ty "` from the start of `bytes`"]
				#[inline]
				pub fn [<read_ $ty _be>](bytes: &[u8]) -> $ty {
					BigEndian::[<read_ $ty>](bytes)
				}
			)+
		}
	};
}

endian_readers!(u16, u32, u64);

/// Read a big-endian 24-bit integer from the start of `bytes`
#[inline]
pub fn read_u24_be(bytes: &[u8]) -> u32 {
	BigEndian::read_u24(bytes)
}

/// Borrow `len` bytes of `buf` starting at `offset`, or fail with `OutOfBounds`
pub(crate) fn slice_at(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
	match offset.checked_add(len) {
		Some(end) if end <= buf.len() => Ok(&buf[offset..end]),
		_ => err!(OutOfBounds),
	}
}

/// Parse a fixed-width field of ASCII digits, as used by Lyrics3
pub(crate) fn parse_ascii_decimal(digits: &[u8]) -> Option<u64> {
	if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
		return None;
	}

	digits
		.iter()
		.try_fold(0u64, |acc, d| acc.checked_mul(10)?.checked_add(u64::from(d - b'0')))
}

/// Read an unsigned big-endian integer of 1 to 8 bytes
pub(crate) fn read_uint_be(bytes: &[u8]) -> Option<u64> {
	if bytes.is_empty() || bytes.len() > 8 {
		return None;
	}

	Some(BigEndian::read_uint(bytes, bytes.len()))
}

/// Read an unsigned little-endian integer of 1 to 8 bytes
pub(crate) fn read_uint_le(bytes: &[u8]) -> Option<u64> {
	if bytes.is_empty() || bytes.len() > 8 {
		return None;
	}

	Some(LittleEndian::read_uint(bytes, bytes.len()))
}
