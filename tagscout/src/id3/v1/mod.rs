//! ID3v1 items
//!
//! # ID3v1 notes
//!
//! The tag is a fixed 128 bytes at the very end of the file, starting with `TAG`. ID3v1.1 is only
//! distinguished by a zero byte at offset 125 followed by a non-zero track number.

pub mod constants;
pub(crate) mod read;

use crate::config::ParseOptions;
use crate::error::Result;
use crate::probe::ScanBuffers;
use crate::tag::{Metadata, TagFormat, TagLocation};
use crate::util::io::FileSource;
use constants::ID3V1_TAG_MARKER;

use std::io::{Read, Seek};

/// The size of an ID3v1 tag
pub const ID3V1_TAG_SIZE: u64 = 128;

/// Returns the ID3v1 tag at the end of `end_buffer`, if there is one
fn trailing_tag(end_buffer: &[u8]) -> Option<&[u8]> {
	let start = end_buffer.len().checked_sub(ID3V1_TAG_SIZE as usize)?;
	let tag = &end_buffer[start..];
	(tag[..3] == ID3V1_TAG_MARKER).then_some(tag)
}

/// The number of bytes an ID3v1 tag occupies at the end of the file (0 or 128)
pub(crate) fn trailing_tag_size(end_buffer: &[u8]) -> u64 {
	if trailing_tag(end_buffer).is_some() {
		ID3V1_TAG_SIZE
	} else {
		0
	}
}

pub(crate) fn can_detect(buffers: &ScanBuffers) -> bool {
	trailing_tag(buffers.end()).is_some()
}

pub(crate) fn detect<R>(source: &mut FileSource<R>, buffers: &ScanBuffers) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	log::debug!("Searching for an ID3v1 tag");

	let Some(tag) = trailing_tag(buffers.end()) else {
		return Ok(Vec::new());
	};

	let format = if tag[125] == 0 && tag[126] != 0 {
		TagFormat::Id3v1_1
	} else {
		TagFormat::Id3v1
	};

	let offset = source.len() - ID3V1_TAG_SIZE;
	log::debug!("Found an {} tag at {offset}", format.name());

	Ok(vec![TagLocation::new(
		format,
		offset,
		ID3V1_TAG_SIZE,
		source.len(),
	)?])
}

pub(crate) fn parse<R>(
	source: &mut FileSource<R>,
	location: &TagLocation,
	options: ParseOptions,
) -> Result<Metadata>
where
	R: Read + Seek,
{
	let tag = source.read_array_at::<128>(location.offset())?;
	read::parse_id3v1(&tag, location.format(), options.parsing_mode)
}
