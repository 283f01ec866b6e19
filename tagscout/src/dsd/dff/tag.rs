//! Decoding of the `DIIN` and `COMT` chunks
//!
//! <https://dsd-guide.com/sites/default/files/white-papers/DSDIFF_1.5_Spec.pdf>, sections 3.8 and 3.9

use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::macros::err;
use crate::tag::{Metadata, TagFormat};
use crate::util::num::{read_u16_be, read_u32_be, read_u64_be};
use crate::util::text::extract_fixed_string;

// Hours (2), minutes (1), seconds (1), samples (4), offset (4), type (2), channel (2), flags (2)
const MARKER_HEADER_SIZE: usize = 18;

// Year (2), month (1), day (1), hour (1), minutes (1), type (2), reference (2)
const COMMENT_HEADER_SIZE: usize = 10;

/// A chunk read from memory
struct RawChunk<'a> {
	fourcc: [u8; 4],
	content: &'a [u8],
}

/// Split the next chunk off of `data`
///
/// Returns `Ok(None)` at the end of the data, or on a truncated chunk outside of strict mode.
fn next_chunk<'a>(data: &mut &'a [u8], parse_mode: ParsingMode) -> Result<Option<RawChunk<'a>>> {
	if data.len() < 12 {
		return Ok(None);
	}

	let mut fourcc = [0; 4];
	fourcc.copy_from_slice(&data[..4]);

	let size = read_u64_be(&data[4..12]);
	let content = usize::try_from(size)
		.ok()
		.and_then(|size| data.get(12..12usize.checked_add(size)?));

	let Some(content) = content else {
		if parse_mode == ParsingMode::Strict {
			err!(SizeMismatch);
		}

		log::warn!("DFF chunk \"{}\" overruns its parent, stopping", fourcc.escape_ascii());
		return Ok(None);
	};

	let padded_end = 12 + content.len() + content.len() % 2;
	*data = data.get(padded_end..).unwrap_or_default();

	Ok(Some(RawChunk { fourcc, content }))
}

/// Read a `{count: u32}{text}` string
fn counted_text(data: &[u8], parse_mode: ParsingMode) -> Result<Option<String>> {
	if data.len() < 4 {
		return Ok(None);
	}

	let count = read_u32_be(data) as usize;
	if count > data.len() - 4 {
		if parse_mode == ParsingMode::Strict {
			err!(SizeMismatch);
		}

		log::warn!("DFF text claims {count} bytes, only {} available", data.len() - 4);
	}

	Ok(Some(extract_fixed_string(data, 4, count, None)))
}

pub(crate) fn parse_text_chunks(mut data: &[u8], parse_options: ParseOptions) -> Result<Metadata> {
	let parse_mode = parse_options.parsing_mode;
	let mut metadata = Metadata::new(TagFormat::DffText);

	while let Some(chunk) = next_chunk(&mut data, parse_mode)? {
		match &chunk.fourcc {
			b"DIIN" => read_diin(chunk.content, parse_mode, &mut metadata)?,
			b"COMT" => read_comt(chunk.content, parse_mode, &mut metadata)?,
			_ => log::trace!("Skipping chunk \"{}\"", chunk.fourcc.escape_ascii()),
		}
	}

	Ok(metadata)
}

fn read_diin(mut data: &[u8], parse_mode: ParsingMode, metadata: &mut Metadata) -> Result<()> {
	while let Some(chunk) = next_chunk(&mut data, parse_mode)? {
		let key = String::from_utf8_lossy(&chunk.fourcc).into_owned();
		let text = match &chunk.fourcc {
			b"DITI" | b"DIAR" => counted_text(chunk.content, parse_mode)?,
			b"EMID" => Some(extract_fixed_string(chunk.content, 0, chunk.content.len(), None)),
			b"MARK" => match chunk.content.get(MARKER_HEADER_SIZE..) {
				Some(text) => counted_text(text, parse_mode)?,
				None => None,
			},
			_ => {
				log::debug!("Skipping unknown DIIN sub-chunk \"{key}\"");
				continue;
			},
		};

		match text {
			Some(text) => metadata.add_text(key, text),
			None => log::warn!("DIIN sub-chunk \"{key}\" is too small"),
		}
	}

	Ok(())
}

fn read_comt(data: &[u8], parse_mode: ParsingMode, metadata: &mut Metadata) -> Result<()> {
	if data.len() < 2 {
		log::warn!("Skipping \"COMT\" chunk without a comment count");
		return Ok(());
	}

	let num_comments = read_u16_be(data);
	let mut comments = &data[2..];

	for _ in 0..num_comments {
		let Some(header) = comments.get(..COMMENT_HEADER_SIZE + 4) else {
			if parse_mode == ParsingMode::Strict {
				err!(SizeMismatch);
			}

			log::warn!("\"COMT\" chunk holds fewer comments than it claims");
			break;
		};

		let count = read_u32_be(&header[COMMENT_HEADER_SIZE..]) as usize;
		let text_start = COMMENT_HEADER_SIZE + 4;
		let Some(text) = text_start.checked_add(count).and_then(|end| comments.get(text_start..end)) else {
			if parse_mode == ParsingMode::Strict {
				err!(SizeMismatch);
			}

			log::warn!("Comment text overruns the \"COMT\" chunk");
			break;
		};

		metadata.add_text("COMT", extract_fixed_string(text, 0, count, None));

		// Comment text is padded to an even length
		comments = comments
			.get(text_start + count + count % 2..)
			.unwrap_or_default();
	}

	Ok(())
}
