use super::{LYRICS3_BEGIN, LYRICS3V1_END, LYRICS3V2_END};
use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::decode_err;
use crate::tag::{Metadata, TagFormat};
use crate::util::num::parse_ascii_decimal;
use crate::util::text::decode_with_fallback;

/// The size of a Lyrics3v2 field header (`{3 byte ID}{5 digit size}`)
const FIELD_HEADER_SIZE: usize = 8;

pub(crate) fn parse_lyrics3v1(tag: &[u8]) -> Result<Metadata> {
	let Some(lyrics) = tag
		.strip_prefix(LYRICS3_BEGIN)
		.and_then(|tag| tag.strip_suffix(LYRICS3V1_END))
	else {
		decode_err!(@BAIL Lyrics3, "Lyrics3v1 tag is missing its markers");
	};

	let mut metadata = Metadata::new(TagFormat::Lyrics3v1);
	metadata.add_text("LYR", decode_with_fallback(lyrics, None));

	Ok(metadata)
}

pub(crate) fn parse_lyrics3v2(tag: &[u8], parse_mode: ParsingMode) -> Result<Metadata> {
	if !tag.starts_with(LYRICS3_BEGIN) || !tag.ends_with(LYRICS3V2_END) || tag.len() < 26 {
		decode_err!(@BAIL Lyrics3, "Lyrics3v2 tag is missing its markers");
	}

	let mut metadata = Metadata::new(TagFormat::Lyrics3v2);

	let mut fields = &tag[LYRICS3_BEGIN.len()..tag.len() - 15];
	while !fields.is_empty() {
		if fields.len() < FIELD_HEADER_SIZE {
			if parse_mode == ParsingMode::Strict {
				decode_err!(@BAIL Lyrics3, "Lyrics3v2 field header is cut short");
			}

			log::warn!("Lyrics3v2: {} trailing bytes, ignoring them", fields.len());
			break;
		}

		let (id, size) = fields.split_at(3);
		let Some(size) = parse_ascii_decimal(&size[..5]).map(|size| size as usize) else {
			decode_err!(@BAIL Lyrics3, "Lyrics3v2 field has an invalid size string");
		};

		let Some(content) = fields.get(FIELD_HEADER_SIZE..FIELD_HEADER_SIZE + size) else {
			decode_err!(@BAIL Lyrics3, "Lyrics3v2 field size exceeds the tag size");
		};

		fields = &fields[FIELD_HEADER_SIZE + size..];

		if !id.iter().all(u8::is_ascii_uppercase) {
			if parse_mode == ParsingMode::Strict {
				decode_err!(@BAIL Lyrics3, "Lyrics3v2 field has an invalid ID");
			}

			log::warn!("Lyrics3v2: Skipping field with an invalid ID: {id:?}");
			continue;
		}

		// Checked above
		let id = String::from_utf8_lossy(id).into_owned();
		log::trace!("Lyrics3v2: Reading field `{id}`, size: {size}");

		metadata.add_text(id, decode_with_fallback(content, None));
	}

	Ok(metadata)
}
