use super::constants::APE_PREAMBLE;
use crate::error::Result;
use crate::macros::{decode_err, err};
use crate::tag::TagFormat;
use crate::util::num::read_u32_le;

const FLAG_HAS_HEADER: u32 = 1 << 31;
const FLAG_SIZE_EXCLUDES_FOOTER: u32 = 1 << 30;
const FLAG_IS_HEADER: u32 = 1 << 29;

/// An APE header or footer
///
/// Both records share a layout:
///
/// ```text
/// APETAGEX | version (u32) | size (u32) | item count (u32) | flags (u32) | reserved (8)
/// ```
///
/// All integers are little endian.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ApeHeader {
	pub(crate) version: u32,
	pub(crate) size: u32,
	pub(crate) item_count: u32,
	pub(crate) flags: u32,
}

impl ApeHeader {
	pub(crate) fn parse(record: &[u8; 32]) -> Result<Self> {
		if &record[..8] != APE_PREAMBLE {
			err!(FakeTag);
		}

		let version = read_u32_le(&record[8..]);
		if version != 1000 && version != 2000 {
			decode_err!(@BAIL Ape, "APE tag has an invalid version");
		}

		let header = Self {
			version,
			size: read_u32_le(&record[12..]),
			item_count: read_u32_le(&record[16..]),
			// Version 1 doesn't store flags
			flags: if version == 1000 {
				0
			} else {
				read_u32_le(&record[20..])
			},
		};

		log::trace!(
			"APE header: version {}, size {}, {} items, flags {:#010X}",
			header.version,
			header.size,
			header.item_count,
			header.flags
		);

		Ok(header)
	}

	pub(crate) fn format(&self) -> TagFormat {
		if self.version == 1000 {
			TagFormat::ApeV1
		} else {
			TagFormat::ApeV2
		}
	}

	/// Whether the tag claims to start with a header record
	pub(crate) fn has_header(&self) -> bool {
		self.flags & FLAG_HAS_HEADER == FLAG_HAS_HEADER
	}

	/// Whether this record is the header (rather than the footer)
	pub(crate) fn is_header(&self) -> bool {
		self.flags & FLAG_IS_HEADER == FLAG_IS_HEADER
	}

	/// The size of the item region
	///
	/// The tag size normally counts the items and the footer. When bit 30 of the flags is set,
	/// it counts the items alone.
	pub(crate) fn items_size(&self) -> Result<u32> {
		if self.flags & FLAG_SIZE_EXCLUDES_FOOTER == FLAG_SIZE_EXCLUDES_FOOTER {
			return Ok(self.size);
		}

		match self.size.checked_sub(32) {
			Some(items_size) => Ok(items_size),
			// If the size is < 32, something went wrong during encoding
			None => decode_err!(@BAIL Ape, "APE tag has an invalid size (< 32)"),
		}
	}
}
