//! Lyrics3 items
//!
//! Lyrics3 tags are appended to MP3 files, immediately before an ID3v1 tag (if one exists).
//!
//! * Lyrics3v1 is a single block of lyrics between `LYRICSBEGIN` and `LYRICSEND`, at most 5100
//!   bytes long. There is no size field, so the start must be searched for.
//! * Lyrics3v2 is a list of fields (`{3 byte ID}{5 digit size}{data}`) between `LYRICSBEGIN` and a
//!   6 digit size, followed by `LYRICS200`.

pub(crate) mod read;

use crate::config::ParseOptions;
use crate::error::Result;
use crate::id3::v1::trailing_tag_size;
use crate::macros::decode_err;
use crate::probe::ScanBuffers;
use crate::tag::{Metadata, TagFormat, TagLocation};
use crate::util::io::FileSource;
use crate::util::num::parse_ascii_decimal;

use std::io::{Read, Seek};

pub(crate) const LYRICS3_BEGIN: &[u8; 11] = b"LYRICSBEGIN";
pub(crate) const LYRICS3V1_END: &[u8; 9] = b"LYRICSEND";
pub(crate) const LYRICS3V2_END: &[u8; 9] = b"LYRICS200";

/// The maximum size of the lyrics in a Lyrics3v1 tag
const LYRICS3V1_MAX_SIZE: u64 = 5100;

/// The size of the Lyrics3v2 trailer (`{6 digit size}LYRICS200`)
const LYRICS3V2_TRAILER_SIZE: u64 = 15;

pub(crate) fn can_detect(buffers: &ScanBuffers) -> bool {
	let end = buffers.end();
	let Some(tags_end) = end.len().checked_sub(trailing_tag_size(end) as usize) else {
		return false;
	};

	let end = &end[..tags_end];
	end.ends_with(LYRICS3V2_END) || end.ends_with(LYRICS3V1_END)
}

pub(crate) fn detect<R>(source: &mut FileSource<R>, buffers: &ScanBuffers) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	log::debug!("Searching for a Lyrics3 tag");

	let tags_end = source.len() - trailing_tag_size(buffers.end());
	Ok(locate_before(source, tags_end)?.into_iter().collect())
}

/// Locate a Lyrics3 tag that ends at `end`
///
/// Other strategies use this to step over a Lyrics3 tag sitting between their own tag and ID3v1.
pub(crate) fn locate_before<R>(source: &mut FileSource<R>, end: u64) -> Result<Option<TagLocation>>
where
	R: Read + Seek,
{
	let Some(marker_offset) = end.checked_sub(LYRICS3V1_END.len() as u64) else {
		return Ok(None);
	};

	let marker = source.read_array_at::<9>(marker_offset)?;
	if &marker == LYRICS3V2_END {
		return locate_v2(source, end).map(Some);
	}

	if &marker == LYRICS3V1_END {
		return locate_v1(source, end);
	}

	Ok(None)
}

fn locate_v2<R>(source: &mut FileSource<R>, end: u64) -> Result<TagLocation>
where
	R: Read + Seek,
{
	let Some(trailer_offset) = end.checked_sub(LYRICS3V2_TRAILER_SIZE) else {
		decode_err!(@BAIL Lyrics3, "File is too small to hold a Lyrics3v2 tag");
	};

	let size_digits = source.read_array_at::<6>(trailer_offset)?;
	let Some(declared_size) = parse_ascii_decimal(&size_digits) else {
		decode_err!(@BAIL Lyrics3, "Lyrics3v2 tag has an invalid size string");
	};

	let Some(start) = trailer_offset.checked_sub(declared_size) else {
		decode_err!(@BAIL Lyrics3, "Lyrics3v2 tag size exceeds the file size");
	};

	if !source.contains(start, LYRICS3_BEGIN.len() as u64)
		|| &source.read_array_at::<11>(start)? != LYRICS3_BEGIN
	{
		decode_err!(@BAIL Lyrics3, "Lyrics3v2 tag is missing its start marker");
	}

	log::debug!("Found a Lyrics3v2 tag at {start}");
	TagLocation::new(
		TagFormat::Lyrics3v2,
		start,
		declared_size + LYRICS3V2_TRAILER_SIZE,
		source.len(),
	)
}

fn locate_v1<R>(source: &mut FileSource<R>, end: u64) -> Result<Option<TagLocation>>
where
	R: Read + Seek,
{
	let lyrics_end = end - LYRICS3V1_END.len() as u64;
	let search_len = LYRICS3V1_MAX_SIZE + LYRICS3_BEGIN.len() as u64;
	let search_start = lyrics_end.saturating_sub(search_len);

	let window = source.read_vec_at(search_start, lyrics_end - search_start)?;
	let Some(begin) = window
		.windows(LYRICS3_BEGIN.len())
		.rposition(|w| w == LYRICS3_BEGIN)
	else {
		log::warn!("Found a Lyrics3v1 end marker without a start marker");
		return Ok(None);
	};

	let start = search_start + begin as u64;
	log::debug!("Found a Lyrics3v1 tag at {start}");

	TagLocation::new(TagFormat::Lyrics3v1, start, end - start, source.len()).map(Some)
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
	match location.format() {
		TagFormat::Lyrics3v1 => read::parse_lyrics3v1(&tag),
		_ => read::parse_lyrics3v2(&tag, options.parsing_mode),
	}
}
