//! Utilities for working with synchsafe integers and unsynchronized ID3v2 content
//!
//! ID3v2 avoids false MPEG frame syncs (`0xFF 0xE0..`) in two ways. Sizes are stored as synchsafe
//! integers, where only the low 7 bits of each byte are used. Frame contents can be
//! *unsynchronized*, where a `0x00` is inserted after every `0xFF`.

use crate::error::Result;
use crate::util::alloc::VecFallibleCapacity;

/// Remove the unsynchronization scheme from `content`
///
/// Every `0x00` that follows a `0xFF` is dropped. A `0xFF` followed by anything else is kept
/// as is.
///
/// # Errors
///
/// `content` exceeds [`GlobalOptions::allocation_limit`](crate::config::GlobalOptions::allocation_limit)
///
/// # Examples
///
/// ```rust
/// use tagscout::id3::v2::util::synchsafe::resynchronize;
///
/// # fn main() -> tagscout::error::Result<()> {
/// // The content has two `0xFF 0x00` pairs, which will be removed
/// let content = [0xFF, 0x00, 0x1A, 0xFF, 0x00, 0x15];
///
/// assert_eq!(resynchronize(&content)?, [0xFF, 0x1A, 0xFF, 0x15]);
/// # Ok(()) }
/// ```
pub fn resynchronize(content: &[u8]) -> Result<Vec<u8>> {
	let mut ret = Vec::try_with_capacity_stable(content.len())?;

	let mut encountered_ff = false;
	for &byte in content {
		if encountered_ff {
			encountered_ff = false;

			// Only skip the byte if this is valid unsynchronization
			if byte == 0 {
				continue;
			}
		}

		ret.push(byte);
		encountered_ff = byte == 0xFF;
	}

	Ok(ret)
}

/// Read a synchsafe `u32`, rejecting any byte with its high bit set
///
/// # Examples
///
/// ```rust
/// use tagscout::id3::v2::util::synchsafe::read_synchsafe_u32;
///
/// assert_eq!(read_synchsafe_u32([0x00, 0x00, 0x02, 0x01]), Some(257));
///
/// // 0x80 can never appear in a synchsafe integer
/// assert_eq!(read_synchsafe_u32([0x00, 0x00, 0x80, 0x01]), None);
/// ```
pub fn read_synchsafe_u32(bytes: [u8; 4]) -> Option<u32> {
	if bytes.iter().any(|b| b & 0x80 != 0) {
		return None;
	}

	Some(u32::from_be_bytes(bytes).unsynch())
}

/// An integer that can be converted to and from its synchsafe form
pub trait SynchsafeInteger: Sized {
	/// Create a synchsafe integer
	///
	/// # Errors
	///
	/// `self` doesn't fit in 28 bits
	///
	/// # Examples
	///
	/// ```rust
	/// use tagscout::id3::v2::util::synchsafe::SynchsafeInteger;
	///
	/// # fn main() -> tagscout::error::Result<()> {
	/// // Maximum value we can represent in a synchsafe u32
	/// let unsynch_number = 0xFFF_FFFF_u32;
	/// let synch_number = unsynch_number.synch()?;
	///
	/// // Each byte should have 7 set bits and an MSB of 0
	/// assert_eq!(synch_number, 0b01111111_01111111_01111111_01111111_u32);
	///
	/// // One bit too many
	/// assert!(0x1000_0000_u32.synch().is_err());
	/// # Ok(()) }
	/// ```
	fn synch(self) -> Result<Self>;

	/// Convert a synchsafe integer back to its plain value
	///
	/// The high bit of each byte is ignored. Use [`read_synchsafe_u32`] to validate it.
	fn unsynch(self) -> Self;
}

impl SynchsafeInteger for u32 {
	fn synch(self) -> Result<Self> {
		const MAXIMUM_INTEGER: u32 = u32::MAX >> 4;

		if self > MAXIMUM_INTEGER {
			crate::macros::err!(TooMuchData);
		}

		Ok((self & 0x7F)
			| ((self & (0x7F << 7)) << 1)
			| ((self & (0x7F << 14)) << 2)
			| ((self & (0x7F << 21)) << 3))
	}

	fn unsynch(self) -> Self {
		((self & 0x7F00_0000) >> 3)
			| ((self & 0x7F_0000) >> 2)
			| ((self & 0x7F00) >> 1)
			| (self & 0x7F)
	}
}
