use super::element_reader::{
	DOC_TYPE_ID, EBML_HEADER_ID, ElementChildren, ElementHeader, ElementReader, MAX_HEADER_LEN,
	TAGS_ID,
};
use crate::error::Result;
use crate::macros::decode_err;
use crate::probe::ScanBuffers;
use crate::tag::{TagFormat, TagLocation};
use crate::util::io::FileSource;

use std::io::{Read, Seek};

const SEGMENT_SIGNATURE: [u8; 4] = [0x18, 0x53, 0x80, 0x67];

/// Read the `DocType` from the EBML header at the start of the file
///
/// Returns the format and the end of the header.
fn read_ebml_header(start: &[u8]) -> Result<(TagFormat, usize)> {
	let header = ElementHeader::parse(start)?;
	if header.id.value() != EBML_HEADER_ID {
		decode_err!(@BAIL Matroska, "File doesn't start with an EBML header");
	}

	let content_start = header.header_len as usize;
	let Some(content) = header
		.size
		.known()
		.and_then(|size| usize::try_from(size).ok())
		.and_then(|size| start.get(content_start..content_start.checked_add(size)?))
	else {
		decode_err!(@BAIL Matroska, "EBML header has an invalid size");
	};

	let header_end = content_start + content.len();

	let mut children = ElementChildren::new(content);
	while let Some((child, child_content)) = children.next()? {
		if child.id.value() != DOC_TYPE_ID {
			continue;
		}

		let doc_type = String::from_utf8_lossy(child_content);
		log::debug!("EBML DocType: {doc_type}");

		return match doc_type.trim_end_matches('\0') {
			"matroska" => Ok((TagFormat::Matroska, header_end)),
			"webm" => Ok((TagFormat::WebM, header_end)),
			_ => decode_err!(@BAIL Matroska, "Unsupported EBML DocType"),
		};
	}

	log::warn!("EBML header has no DocType, assuming Matroska");
	Ok((TagFormat::Matroska, header_end))
}

pub(super) fn find_tags<R>(source: &mut FileSource<R>, buffers: &ScanBuffers) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	let file_len = source.len();
	let start = buffers.start();

	let (format, header_end) = read_ebml_header(start)?;

	// The segment normally follows the header directly, but it's searched for in the
	// start window, in case any junk sits between them
	let Some(segment_offset) = start[header_end..]
		.windows(SEGMENT_SIGNATURE.len())
		.position(|window| window == SEGMENT_SIGNATURE)
		.map(|pos| (header_end + pos) as u64)
	else {
		log::warn!("No Segment element found in the first {} bytes", start.len());
		return Ok(Vec::new());
	};

	if segment_offset != header_end as u64 {
		log::warn!(
			"Skipped {} bytes between the EBML header and the Segment",
			segment_offset - header_end as u64
		);
	}

	let header_bytes = source.read_vec_clamped(segment_offset, MAX_HEADER_LEN)?;
	let segment = ElementHeader::parse(&header_bytes)?;
	let segment_content_start = segment_offset + segment.header_len;

	let segment_end = match segment.size.known() {
		Some(size) if segment_content_start.saturating_add(size) > file_len => {
			log::warn!("Segment extends past the end of the file, it may be truncated");
			file_len
		},
		Some(size) => segment_content_start + size,
		None => file_len,
	};

	log::debug!("Found a Segment at {segment_offset}, walking its children");

	let mut locations = Vec::new();
	let mut children = ElementReader::new(segment_content_start, segment_end);
	loop {
		let child = match children.next(source) {
			Ok(Some(child)) => child,
			Ok(None) => break,
			Err(e) => {
				log::warn!("Segment walk failed, stopping: {e}");
				break;
			},
		};

		if child.header.id.value() != TAGS_ID {
			continue;
		}

		if child.header.size.is_unknown() {
			log::warn!("Skipping a Tags element with an unknown size");
			continue;
		}

		log::debug!("Found a Tags element at {}, size: {}", child.start, child.len());
		locations.push(TagLocation::new(format, child.start, child.len(), file_len)?);
	}

	Ok(locations)
}
