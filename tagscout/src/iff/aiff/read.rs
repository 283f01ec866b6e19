use super::tag::is_text_chunk;
use crate::config::ParseOptions;
use crate::error::Result;
use crate::iff::chunk::Chunks;
use crate::iff::wav::read::embedded_id3v2;
use crate::macros::decode_err;
use crate::tag::{TagFormat, TagLocation};
use crate::util::io::FileSource;
use crate::util::num::read_u32_be;

use std::io::{Read, Seek};

use byteorder::BigEndian;

// FORM (4) + size (4) + AIFF/AIFC (4)
const FORM_HEADER_SIZE: u64 = 12;

/// Whether we are dealing with an AIFC file
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum CompressionPresent {
	Yes,
	No,
}

pub(crate) fn verify_aiff(header: &[u8]) -> Result<CompressionPresent> {
	if !header.starts_with(b"FORM") {
		decode_err!(@BAIL Aiff, "AIFF file doesn't start with a FORM chunk");
	}

	match header.get(8..12) {
		Some(b"AIFF") => Ok(CompressionPresent::No),
		Some(b"AIFC") => Ok(CompressionPresent::Yes),
		_ => decode_err!(@BAIL Aiff, "Found FORM file, format is not AIFF or AIFC"),
	}
}

pub(super) fn find_tag_chunks<R>(
	source: &mut FileSource<R>,
	_parse_options: ParseOptions,
) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	let file_len = source.len();

	let header = source.read_vec_clamped(0, FORM_HEADER_SIZE)?;
	let compression_present = verify_aiff(&header)?;
	log::debug!("File verified to be AIFF, compression present: {compression_present:?}");

	let mut form_end = 8 + u64::from(read_u32_be(&header[4..8]));
	if form_end > file_len || form_end < FORM_HEADER_SIZE {
		log::warn!("FORM chunk size doesn't match the file, walking to the end of the file");
		form_end = file_len;
	}

	let mut locations = Vec::new();

	// The text chunks are reported as one tag, from the first to the last
	let mut text_span: Option<(u64, u64)> = None;

	let mut chunks = Chunks::<BigEndian>::new(FORM_HEADER_SIZE, form_end);
	while let Some(chunk) = chunks.next(source)? {
		if !chunk.has_valid_fourcc() || !chunks.fits(&chunk) {
			log::warn!(
				"Invalid chunk \"{}\" at {}, stopping",
				chunk.fourcc_str(),
				chunk.start
			);
			break;
		}

		match &chunk.fourcc {
			b"ID3 " | b"id3 " => {
				if let Some(location) = embedded_id3v2(source, &chunk) {
					locations.push(location);
				}
			},
			fourcc if is_text_chunk(fourcc) => {
				let start = text_span.map_or(chunk.start, |(start, _)| start);
				text_span = Some((start, chunk.content_end()));
			},
			_ => {},
		}
	}

	if let Some((start, end)) = text_span {
		log::debug!("Found AIFF text chunks at {start}, size: {}", end - start);
		locations.push(TagLocation::new(TagFormat::AiffText, start, end - start, file_len)?);
	}

	Ok(locations)
}
