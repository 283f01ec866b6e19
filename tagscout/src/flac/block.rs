use crate::error::Result;
use crate::macros::decode_err;
use crate::util::io::FileSource;
use crate::util::num::read_u24_be;

use std::io::{Read, Seek};

pub(in crate::flac) const BLOCK_ID_STREAMINFO: u8 = 0;
pub(in crate::flac) const BLOCK_ID_VORBIS_COMMENTS: u8 = 4;
pub(in crate::flac) const BLOCK_ID_PICTURE: u8 = 6;

/// The size of a metadata block header
pub(in crate::flac) const BLOCK_HEADER_SIZE: u64 = 4;

/// A metadata block header, the content is left in the file
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Block {
	pub(super) ty: u8,
	pub(super) last: bool,
	pub(super) start: u64,
	pub(super) size: u32,
}

impl Block {
	pub(crate) fn read<R>(source: &mut FileSource<R>, start: u64) -> Result<Self>
	where
		R: Read + Seek,
	{
		if !source.contains(start, BLOCK_HEADER_SIZE) {
			decode_err!(@BAIL Flac, "Metadata block chain ends without a last block");
		}

		let header = source.read_array_at::<4>(start)?;
		let byte = header[0];

		let block = Self {
			ty: byte & 0x7F,
			last: (byte & 0x80) != 0,
			start,
			size: read_u24_be(&header[1..]),
		};

		log::trace!("Reading FLAC block, type: {}, size: {}", block.ty, block.size);

		if !source.contains(block.content_start(), u64::from(block.size)) {
			decode_err!(@BAIL Flac, "Metadata block extends past the end of the file");
		}

		Ok(block)
	}

	pub(super) fn content_start(&self) -> u64 {
		self.start + BLOCK_HEADER_SIZE
	}

	/// The offset of the next block
	pub(super) fn end(&self) -> u64 {
		self.content_start() + u64::from(self.size)
	}

	/// The size of the block, including its header
	pub(super) fn len(&self) -> u64 {
		BLOCK_HEADER_SIZE + u64::from(self.size)
	}
}
