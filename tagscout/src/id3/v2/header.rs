use super::util::synchsafe::read_synchsafe_u32;
use crate::error::{Id3v2Error, Id3v2ErrorKind, Result};
use crate::macros::err;
use crate::tag::TagFormat;

/// The size of an ID3v2 header (and footer)
pub(crate) const ID3V2_HEADER_SIZE: u64 = 10;

/// The ID3v2 version
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Id3v2Version {
	/// ID3v2.2
	V2,
	/// ID3v2.3
	V3,
	/// ID3v2.4
	V4,
}

impl Id3v2Version {
	pub(crate) fn tag_format(self) -> TagFormat {
		match self {
			Self::V2 => TagFormat::Id3v2_2,
			Self::V3 => TagFormat::Id3v2_3,
			Self::V4 => TagFormat::Id3v2_4,
		}
	}
}

/// Flags that apply to the entire tag
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Id3v2TagFlags {
	pub(crate) unsynchronisation: bool,
	pub(crate) extended_header: bool,
	pub(crate) experimental: bool,
	pub(crate) footer: bool,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct Id3v2Header {
	pub(crate) version: Id3v2Version,
	pub(crate) flags: Id3v2TagFlags,
	/// The size of the tag contents (**DOES NOT INCLUDE THE HEADER/FOOTER**)
	pub(crate) size: u32,
}

impl Id3v2Header {
	/// Parse a 10 byte header
	///
	/// A footer (`3DI`) is accepted in place of a header when `footer` is set.
	pub(crate) fn parse(header: &[u8; 10], footer: bool) -> Result<Self> {
		let signature: &[u8] = if footer { b"3DI" } else { b"ID3" };
		if &header[..3] != signature {
			err!(FakeTag);
		}

		// Version is stored as [major, minor], the minor revision must always be 0
		let version = match (header[3], header[4]) {
			(2, 0) => Id3v2Version::V2,
			(3, 0) => Id3v2Version::V3,
			(4, 0) => Id3v2Version::V4,
			(major, minor) => {
				return Err(Id3v2Error::new(Id3v2ErrorKind::BadId3v2Version(major, minor)).into());
			},
		};

		let flags = header[5];

		let is_v3_or_v4 = version != Id3v2Version::V2;
		let flags = Id3v2TagFlags {
			unsynchronisation: flags & 0x80 == 0x80,
			extended_header: is_v3_or_v4 && flags & 0x40 == 0x40,
			experimental: is_v3_or_v4 && flags & 0x20 == 0x20,
			footer: version == Id3v2Version::V4 && flags & 0x10 == 0x10,
		};

		let size = match version {
			// ID3v2.2 stores a plain 24-bit size after the first size byte
			Id3v2Version::V2 => u32::from_be_bytes([0, header[7], header[8], header[9]]),
			Id3v2Version::V3 | Id3v2Version::V4 => {
				match read_synchsafe_u32([header[6], header[7], header[8], header[9]]) {
					Some(size) => size,
					None => err!(SizeMismatch),
				}
			},
		};

		Ok(Id3v2Header {
			version,
			flags,
			size,
		})
	}

	/// Compression was a flag only used in ID3v2.2 (bit 6).
	///
	/// At the time the ID3v2.2 specification was written, a compression scheme wasn't decided.
	/// It is recommended to ignore the tag in this case.
	pub(crate) fn is_v2_compressed(raw_flags: u8, version: Id3v2Version) -> bool {
		version == Id3v2Version::V2 && raw_flags & 0x40 == 0x40
	}

	/// The total size of the tag, including the header and footer
	pub(crate) fn full_tag_size(&self) -> u64 {
		let footer = if self.flags.footer {
			ID3V2_HEADER_SIZE
		} else {
			0
		};

		u64::from(self.size) + ID3V2_HEADER_SIZE + footer
	}
}

#[cfg(test)]
mod tests {
	use super::{Id3v2Header, Id3v2Version};
	use crate::error::ErrorKind;

	#[test_log::test]
	fn v3_header() {
		let header = Id3v2Header::parse(b"ID3\x03\x00\x00\x00\x00\x00\x17", false).unwrap();
		assert_eq!(header.version, Id3v2Version::V3);
		assert_eq!(header.size, 23);
		assert_eq!(header.full_tag_size(), 33);
	}

	#[test_log::test]
	fn v4_footer_flag() {
		let header = Id3v2Header::parse(b"ID3\x04\x00\x10\x00\x00\x01\x00", false).unwrap();
		assert!(header.flags.footer);
		assert_eq!(header.size, 128);
		assert_eq!(header.full_tag_size(), 148);
	}

	#[test_log::test]
	fn v2_plain_size() {
		let header = Id3v2Header::parse(b"ID3\x02\x00\x00\x00\x00\x01\x00", false).unwrap();
		assert_eq!(header.version, Id3v2Version::V2);
		assert_eq!(header.size, 256);
	}

	#[test_log::test]
	fn bad_headers() {
		// Non-zero revision
		assert!(Id3v2Header::parse(b"ID3\x03\x01\x00\x00\x00\x00\x17", false).is_err());
		// Unknown major version
		assert!(Id3v2Header::parse(b"ID3\x05\x00\x00\x00\x00\x00\x17", false).is_err());

		// Not synchsafe
		let err = Id3v2Header::parse(b"ID3\x03\x00\x00\x00\x00\x00\x80", false).unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::SizeMismatch));
	}
}
