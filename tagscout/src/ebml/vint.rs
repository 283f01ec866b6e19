use crate::error::Result;
use crate::macros::err;

use std::fmt::{Debug, Display};

/// An EBML variable-size integer
///
/// A `VInt` is an unsigned integer composed of up to 8 octets, with 7 usable bits per octet.
/// The number of leading zero bits in the first octet gives the number of octets that follow.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub(crate) struct VInt(pub(crate) u64);

impl VInt {
	// Each octet will shave a single bit off each byte
	const USABLE_BITS_PER_BYTE: u32 = 7;
	pub(crate) const MAX_OCTET_LENGTH: u8 = 8;

	/// An unknown-sized `VInt`
	///
	/// See [`Self::is_unknown()`]
	pub(crate) const UNKNOWN: Self = Self(u64::MAX);

	/// Whether this `VInt` represents an unknown size
	///
	/// Since EBML is built for streaming, elements can specify that their data length
	/// is unknown.
	pub(crate) fn is_unknown(self) -> bool {
		self == Self::UNKNOWN
	}

	/// The value, or `None` if it is unknown
	pub(crate) fn known(self) -> Option<u64> {
		(!self.is_unknown()).then_some(self.0)
	}

	/// Parse a `VInt` from the start of `data`
	///
	/// `max_length` can be used to specify the maximum number of octets the number should
	/// occupy, otherwise it should be `8`.
	///
	/// # Errors
	///
	/// * The first octet has no length marker
	/// * The octet count exceeds `max_length`
	/// * `data` ends before the last octet
	pub(crate) fn parse(data: &[u8], max_length: u8) -> Result<(Self, u8)> {
		let (val, bytes_read) = parse_vint(data, max_length, false)?;
		Ok((Self(val), bytes_read))
	}
}

impl Debug for VInt {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut debug = f.debug_tuple("VInt");
		if self.is_unknown() {
			debug.field(&"<unknown>");
		} else {
			debug.field(&self.0);
		}
		debug.finish()
	}
}

impl Display for VInt {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.is_unknown() {
			return f.write_str("<unknown>");
		}

		write!(f, "{}", self.0)
	}
}

fn parse_vint(data: &[u8], max_length: u8, retain_marker: bool) -> Result<(u64, u8)> {
	let Some(&start) = data.first() else {
		err!(MalformedVarInt);
	};

	let octet_length = verify_length(start, max_length)?;
	let Some(octets) = data.get(..usize::from(octet_length)) else {
		log::warn!("EBML variable-size integer is cut short, expected {octet_length} octets");
		err!(MalformedVarInt);
	};

	let mut val = u64::from(start);
	if !retain_marker {
		val ^= 1 << start.ilog2();
	}

	for octet in &octets[1..] {
		val = (val << 8) | u64::from(*octet);
	}

	// Special case for unknown VInts (all data bits set to one)
	if !retain_marker && val + 1 == 1 << (VInt::USABLE_BITS_PER_BYTE * u32::from(octet_length)) {
		return Ok((VInt::UNKNOWN.0, octet_length));
	}

	Ok((val, octet_length))
}

// Verify that the octet length is nonzero and <= `max_length`
fn verify_length(first_byte: u8, max_length: u8) -> Result<u8> {
	// A value of 0b0000_0000 indicates either an invalid VInt, or one with an octet length > 8
	if first_byte == 0b0000_0000 {
		err!(MalformedVarInt);
	}

	let octet_length = VInt::MAX_OCTET_LENGTH - first_byte.ilog2() as u8;
	if octet_length > max_length {
		err!(MalformedVarInt);
	}

	Ok(octet_length)
}

/// An EBML element ID
///
/// An `ElementId` is a [`VInt`], but the `VINT_MARKER` is retained after parsing.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub(crate) struct ElementId(pub(crate) u64);

impl ElementId {
	/// The longest ID allowed by default, see `EBMLMaxIDLength`
	pub(crate) const MAX_LENGTH: u8 = 4;

	/// Parse an `ElementId` from the start of `data`
	///
	/// # Errors
	///
	/// See [`VInt::parse`]
	pub(crate) fn parse(data: &[u8], max_id_length: u8) -> Result<(Self, u8)> {
		let (val, bytes_read) = parse_vint(data, max_id_length, true)?;
		Ok((Self(val), bytes_read))
	}

	pub(crate) fn value(self) -> u64 {
		self.0
	}
}

impl Debug for ElementId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "ElementId({:#X})", self.0)
	}
}
