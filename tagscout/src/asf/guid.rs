use std::fmt::{Debug, Display, Formatter};

/// A GUID as stored in ASF files
///
/// The first three fields are little endian, the remaining 8 bytes are stored as-is.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Guid(pub(crate) [u8; 16]);

impl Guid {
	pub(crate) const HEADER: Self = Self::new(
		0x75B2_2630,
		0x668E,
		0x11CF,
		[0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C],
	);
	pub(crate) const CONTENT_DESCRIPTION: Self = Self::new(
		0x75B2_2633,
		0x668E,
		0x11CF,
		[0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C],
	);
	pub(crate) const EXTENDED_CONTENT_DESCRIPTION: Self = Self::new(
		0xD2D0_A440,
		0xE307,
		0x11D2,
		[0x97, 0xF0, 0x00, 0xA0, 0xC9, 0x5E, 0xA8, 0x50],
	);
	pub(crate) const HEADER_EXTENSION: Self = Self::new(
		0x5FBF_03B5,
		0xA92E,
		0x11CF,
		[0x8E, 0xE3, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65],
	);
	pub(crate) const METADATA: Self = Self::new(
		0xC5F8_CBEA,
		0x5BAF,
		0x4877,
		[0x84, 0x67, 0xAA, 0x8C, 0x44, 0xFA, 0x4C, 0xCA],
	);
	pub(crate) const METADATA_LIBRARY: Self = Self::new(
		0x4423_1C94,
		0x9498,
		0x49D1,
		[0xA1, 0x41, 0x1D, 0x13, 0x4E, 0x45, 0x70, 0x54],
	);

	pub(super) const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
		let data1 = data1.to_le_bytes();
		let data2 = data2.to_le_bytes();
		let data3 = data3.to_le_bytes();

		Self([
			data1[0], data1[1], data1[2], data1[3], data2[0], data2[1], data3[0], data3[1], data4[0],
			data4[1], data4[2], data4[3], data4[4], data4[5], data4[6], data4[7],
		])
	}

	pub(crate) fn from_slice(bytes: &[u8]) -> Option<Self> {
		bytes.get(..16)?.try_into().ok().map(Self)
	}
}

impl Display for Guid {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let b = &self.0;
		write!(
			f,
			"{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
			u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
			u16::from_le_bytes([b[4], b[5]]),
			u16::from_le_bytes([b[6], b[7]]),
			b[8],
			b[9],
			b[10],
			b[11],
			b[12],
			b[13],
			b[14],
			b[15]
		)
	}
}

impl Debug for Guid {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "Guid({self})")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test_log::test]
	fn mixed_endian_layout() {
		assert_eq!(
			Guid::HEADER.0[..8],
			[0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11]
		);
		assert_eq!(
			Guid::HEADER.to_string(),
			"75B22630-668E-11CF-A6D9-00AA0062CE6C"
		);
		assert_eq!(Guid::from_slice(&Guid::METADATA.0), Some(Guid::METADATA));
		assert_eq!(Guid::from_slice(&[0; 15]), None);
	}
}
