use crate::error::Result;
use crate::iff::chunk::Chunks;
use crate::iff::wav::read::embedded_id3v2;
use crate::macros::decode_err;
use crate::tag::{TagFormat, TagLocation};
use crate::util::io::FileSource;
use crate::util::num::read_u64_be;

use std::io::{Read, Seek};

use byteorder::BigEndian;

// FRM8 (4) + size (8) + DSD (4)
pub(super) const FORM_HEADER_SIZE: u64 = 16;

pub(crate) fn verify_dff(header: &[u8]) -> Result<()> {
	if !header.starts_with(b"FRM8") {
		decode_err!(@BAIL Dff, "DFF file doesn't start with a FRM8 chunk");
	}

	if header.get(12..16) != Some(b"DSD ") {
		decode_err!(@BAIL Dff, "Found FRM8 chunk, form type is not DSD");
	}

	Ok(())
}

pub(super) fn find_tag_chunks<R>(source: &mut FileSource<R>) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	let file_len = source.len();

	let header = source.read_vec_clamped(0, FORM_HEADER_SIZE)?;
	verify_dff(&header)?;
	log::debug!("File verified to be DFF");

	// The size excludes the FRM8 identifier and the size itself
	let mut form_end = 12_u64.saturating_add(read_u64_be(&header[4..12]));
	if form_end > file_len || form_end < FORM_HEADER_SIZE {
		log::warn!("FRM8 chunk size doesn't match the file, walking to the end of the file");
		form_end = file_len;
	}

	let mut locations = Vec::new();
	let mut text_span: Option<(u64, u64)> = None;

	let mut chunks = Chunks::<BigEndian>::wide(FORM_HEADER_SIZE, form_end);
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
			b"DIIN" | b"COMT" => {
				let start = text_span.map_or(chunk.start, |(start, _)| start);
				text_span = Some((start, chunk.content_end()));
			},
			b"ID3 " => {
				if let Some(location) = embedded_id3v2(source, &chunk) {
					locations.push(location);
				}
			},
			_ => {},
		}
	}

	if let Some((start, end)) = text_span {
		log::debug!("Found DFF text chunks at {start}, size: {}", end - start);
		locations.push(TagLocation::new(TagFormat::DffText, start, end - start, file_len)?);
	}

	Ok(locations)
}
