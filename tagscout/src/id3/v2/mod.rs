//! ID3v2 items and utilities
//!
//! ## Locations
//!
//! An ID3v2 tag is normally found at the very start of a file. ID3v2.4 also allows a tag to be
//! appended to the end of a file, in which case it carries a footer (`3DI`) that points back to
//! the header. Tags embedded in container chunks (WAV, AIFF, DSF, DFF) are located through the
//! container strategies.

mod frame;
pub(crate) mod header;
pub(crate) mod read;
pub mod util;

pub use header::Id3v2Version;

use crate::config::ParseOptions;
use crate::error::{ErrorKind, Result};
use crate::id3::v1::trailing_tag_size;
use crate::probe::ScanBuffers;
use crate::tag::{Metadata, TagLocation};
use crate::util::io::FileSource;
use header::{ID3V2_HEADER_SIZE, Id3v2Header};

use std::io::{Read, Seek};

pub(crate) fn can_detect(buffers: &ScanBuffers) -> bool {
	buffers.start().starts_with(b"ID3") || footer_offset(buffers).is_some()
}

pub(crate) fn detect<R>(source: &mut FileSource<R>, buffers: &ScanBuffers) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	let mut locations = Vec::new();

	if buffers.start().starts_with(b"ID3") {
		if let Some(location) = locate_at(source, 0)? {
			locations.push(location);
		}
	}

	if let Some(distance_from_end) = footer_offset(buffers) {
		if let Some(location) = locate_appended(source, distance_from_end)? {
			// A tag with a footer at the start of a tiny file can be found twice
			if !locations.contains(&location) {
				locations.push(location);
			}
		}
	}

	Ok(locations)
}

/// Locate an ID3v2 tag whose header starts at `offset`
///
/// Returns `None` if there is no `ID3` signature at `offset`.
pub(crate) fn locate_at<R>(source: &mut FileSource<R>, offset: u64) -> Result<Option<TagLocation>>
where
	R: Read + Seek,
{
	log::debug!("Searching for an ID3v2 tag at offset: {offset}");

	if !source.contains(offset, ID3V2_HEADER_SIZE) {
		return Ok(None);
	}

	let header_bytes = source.read_array_at::<10>(offset)?;
	let header = match Id3v2Header::parse(&header_bytes, false) {
		Ok(header) => header,
		Err(err) if matches!(err.kind(), ErrorKind::FakeTag) => return Ok(None),
		Err(err) => return Err(err),
	};

	log::debug!(
		"Found an ID3v2 tag, version: {:?}, size: {}",
		header.version,
		header.full_tag_size()
	);

	TagLocation::new(
		header.version.tag_format(),
		offset,
		header.full_tag_size(),
		source.len(),
	)
	.map(Some)
}

/// The distance of an ID3v2.4 footer from the end of the file (before any ID3v1 tag)
fn footer_offset(buffers: &ScanBuffers) -> Option<u64> {
	let end = buffers.end();
	let tags_end = end.len().checked_sub(trailing_tag_size(end) as usize)?;
	let footer_start = tags_end.checked_sub(ID3V2_HEADER_SIZE as usize)?;

	end[footer_start..]
		.starts_with(b"3DI")
		.then(|| (end.len() - footer_start) as u64)
}

fn locate_appended<R>(source: &mut FileSource<R>, distance_from_end: u64) -> Result<Option<TagLocation>>
where
	R: Read + Seek,
{
	let Some(footer_offset) = source.len().checked_sub(distance_from_end) else {
		return Ok(None);
	};

	let footer_bytes = source.read_array_at::<10>(footer_offset)?;
	let footer = Id3v2Header::parse(&footer_bytes, true)?;

	let tag_end = footer_offset + ID3V2_HEADER_SIZE;
	let Some(header_offset) = tag_end.checked_sub(footer.full_tag_size()) else {
		log::warn!("ID3v2 footer points before the start of the file");
		return Ok(None);
	};

	log::debug!("Found an ID3v2 footer, the tag should start at {header_offset}");

	let location = locate_at(source, header_offset)?;
	match location {
		Some(location) if location.end() == tag_end => Ok(Some(location)),
		_ => {
			log::warn!("ID3v2 footer does not match a header, ignoring it");
			Ok(None)
		},
	}
}

pub(crate) fn parse<R>(
	source: &mut FileSource<R>,
	location: &TagLocation,
	options: ParseOptions,
) -> Result<Metadata>
where
	R: Read + Seek,
{
	let tag = source.read_vec_at(location.offset(), location.size())?;
	read::parse_id3v2(&tag, location.format(), options)
}
