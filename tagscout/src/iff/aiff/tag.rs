use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::macros::err;
use crate::tag::{Metadata, TagFormat};
use crate::util::num::{read_u16_be, read_u32_be};
use crate::util::text::extract_fixed_string;

const TEXT_CHUNKS: [&[u8; 4]; 5] = [b"NAME", b"AUTH", b"(c) ", b"ANNO", b"COMT"];

pub(crate) fn is_text_chunk(fourcc: &[u8; 4]) -> bool {
	TEXT_CHUNKS.contains(&fourcc)
}

/// Decode the text chunks in `data`, skipping any other chunks between them
pub(crate) fn parse_text_chunks(mut data: &[u8], parse_options: ParseOptions) -> Result<Metadata> {
	let mut metadata = Metadata::new(TagFormat::AiffText);

	while data.len() >= 8 {
		let mut fourcc = [0; 4];
		fourcc.copy_from_slice(&data[..4]);
		let size = read_u32_be(&data[4..8]) as usize;

		let Some(content) = data.get(8..8 + size) else {
			if parse_options.parsing_mode == ParsingMode::Strict {
				err!(SizeMismatch);
			}

			log::warn!("AIFF chunk overruns the text chunk span, stopping");
			break;
		};

		data = data.get(8 + size + size % 2..).unwrap_or_default();

		if !is_text_chunk(&fourcc) {
			continue;
		}

		// The key keeps the trailing space of "(c) "
		let key = String::from_utf8_lossy(&fourcc).into_owned();
		if &fourcc == b"COMT" {
			read_comments(content, &mut metadata, parse_options)?;
			continue;
		}

		metadata.add_text(key, extract_fixed_string(content, 0, content.len(), None));
	}

	Ok(metadata)
}

// https://www-mmsp.ece.mcgill.ca/Documents/AudioFormats/AIFF/Docs/AIFF-1.3.pdf, section 10
fn read_comments(content: &[u8], metadata: &mut Metadata, parse_options: ParseOptions) -> Result<()> {
	if content.len() < 2 {
		log::warn!("Skipping \"COMT\" chunk without a comment count");
		return Ok(());
	}

	let num_comments = read_u16_be(content);
	let mut comments = &content[2..];

	for _ in 0..num_comments {
		// Timestamp (4), marker ID (2), text length (2)
		let Some(header) = comments.get(..8) else {
			if parse_options.parsing_mode == ParsingMode::Strict {
				err!(SizeMismatch);
			}

			log::warn!("\"COMT\" chunk holds fewer comments than it claims");
			break;
		};

		let len = usize::from(read_u16_be(&header[6..8]));
		let Some(text) = comments.get(8..8 + len) else {
			if parse_options.parsing_mode == ParsingMode::Strict {
				err!(SizeMismatch);
			}

			log::warn!("Comment text overruns the \"COMT\" chunk");
			break;
		};

		metadata.add_text("COMT", extract_fixed_string(text, 0, len, None));
		comments = comments.get(8 + len + len % 2..).unwrap_or_default();
	}

	Ok(())
}
