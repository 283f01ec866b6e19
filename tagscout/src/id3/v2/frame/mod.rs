pub(super) mod content;

use super::header::Id3v2Version;
use super::util::synchsafe::read_synchsafe_u32;
use crate::error::Result;
use crate::macros::id3v2_err;

/// Various flags to describe the content of an item
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct FrameFlags {
	/// Indicates if the frame is read only, irrelevant when reading
	pub(crate) read_only: bool,
	/// A group identifier byte precedes the content
	pub(crate) grouping_identity: bool,
	/// The content is zlib compressed
	pub(crate) compression: bool,
	/// An encryption method symbol precedes the content
	pub(crate) encryption: bool,
	/// The content is unsynchronized (ID3v2.4 only)
	pub(crate) unsynchronisation: bool,
	/// A 4 byte data length indicator precedes the content (ID3v2.4 only)
	pub(crate) data_length_indicator: bool,
}

impl FrameFlags {
	pub(crate) fn parse_id3v24(flags: u16) -> Self {
		FrameFlags {
			read_only: flags & 0x1000 == 0x1000,
			grouping_identity: flags & 0x0040 == 0x0040,
			compression: flags & 0x0008 == 0x0008,
			encryption: flags & 0x0004 == 0x0004,
			unsynchronisation: flags & 0x0002 == 0x0002,
			data_length_indicator: flags & 0x0001 == 0x0001,
		}
	}

	pub(crate) fn parse_id3v23(flags: u16) -> Self {
		FrameFlags {
			read_only: flags & 0x2000 == 0x2000,
			grouping_identity: flags & 0x0020 == 0x0020,
			compression: flags & 0x0080 == 0x0080,
			encryption: flags & 0x0040 == 0x0040,
			unsynchronisation: false,
			data_length_indicator: false,
		}
	}
}

/// A parsed frame header, the ID is not yet validated
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameHeader {
	raw_id: [u8; 4],
	id_len: usize,
	/// The size of the content, excluding the header
	pub(crate) content_size: u32,
	pub(crate) flags: FrameFlags,
}

impl FrameHeader {
	/// The size of a frame header for `version`
	pub(crate) fn len(version: Id3v2Version) -> usize {
		match version {
			Id3v2Version::V2 => 6,
			Id3v2Version::V3 | Id3v2Version::V4 => 10,
		}
	}

	/// Parse the frame header at the start of `bytes`
	///
	/// Returns `None` when padding is reached, or too few bytes remain to hold a header.
	pub(crate) fn parse(bytes: &[u8], version: Id3v2Version) -> Option<Self> {
		let header_len = Self::len(version);
		if bytes.len() < header_len {
			return None;
		}

		// Assume we just started reading padding
		if bytes[0] == 0 {
			return None;
		}

		let mut raw_id = [0; 4];
		let header = match version {
			Id3v2Version::V2 => {
				raw_id[..3].copy_from_slice(&bytes[..3]);
				Self {
					raw_id,
					id_len: 3,
					content_size: u32::from_be_bytes([0, bytes[3], bytes[4], bytes[5]]),
					// V2 doesn't store flags
					flags: FrameFlags::default(),
				}
			},
			Id3v2Version::V3 | Id3v2Version::V4 => {
				raw_id.copy_from_slice(&bytes[..4]);

				let size_bytes = [bytes[4], bytes[5], bytes[6], bytes[7]];
				let flags = u16::from_be_bytes([bytes[8], bytes[9]]);

				let (content_size, flags) = if version == Id3v2Version::V4 {
					let size = read_synchsafe_u32(size_bytes).unwrap_or_else(|| {
						log::warn!("ID3v2.4 frame size is not synchsafe, reading it as a plain integer");
						u32::from_be_bytes(size_bytes)
					});
					(size, FrameFlags::parse_id3v24(flags))
				} else {
					(u32::from_be_bytes(size_bytes), FrameFlags::parse_id3v23(flags))
				};

				// For some reason, some apps make v3 tags with v2 frame IDs.
				// The actual frame header is v3 though
				let id_len = if raw_id[3] == 0 && version == Id3v2Version::V3 {
					log::warn!("Found a v2 frame ID in a v3 tag");
					3
				} else {
					4
				};

				Self {
					raw_id,
					id_len,
					content_size,
					flags,
				}
			},
		};

		Some(header)
	}

	/// The frame ID, which must only consist of `'A'..='Z'` and `'0'..='9'`
	pub(crate) fn id(&self) -> Result<&str> {
		let id_bytes = &self.raw_id[..self.id_len];
		if !id_bytes
			.iter()
			.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
		{
			return Err(id3v2_err!(BadFrameId(id_bytes.to_vec())));
		}

		std::str::from_utf8(id_bytes).map_err(Into::into)
	}
}
