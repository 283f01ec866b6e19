//! The FLAC picture structure
//!
//! FLAC stores pictures in a `PICTURE` metadata block, and Vorbis Comments borrow the same layout
//! (base64 encoded) for `METADATA_BLOCK_PICTURE`. All integers are big endian.
//!
//! ```text
//! picture type (u32) | MIME length (u32) | MIME | description length (u32) | description |
//! width (u32) | height (u32) | color depth (u32) | colors (u32) | data length (u32) | data
//! ```

use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::macros::{decode_err, err};
use crate::tag::PictureData;
use crate::util::num::{read_u32_be, slice_at};
use crate::util::text::decode_with_fallback;

use data_encoding::BASE64;

/// Decode a base64 encoded FLAC picture, as stored in `METADATA_BLOCK_PICTURE`
pub(crate) fn parse_encoded_flac_picture(
	encoded: &[u8],
	parse_options: ParseOptions,
) -> Result<PictureData> {
	let Ok(content) = BASE64.decode(encoded) else {
		decode_err!(@BAIL "Picture is not valid base64");
	};

	parse_flac_picture(&content, parse_options)
}

/// Decode a raw FLAC picture structure
pub(crate) fn parse_flac_picture(content: &[u8], parse_options: ParseOptions) -> Result<PictureData> {
	if content.len() < 32 {
		err!(SizeMismatch);
	}

	let picture_type = read_u32_be(content);

	// ID3v2 APIC uses a single byte for picture type.
	// Anything greater than that is probably invalid
	if picture_type > 255 && parse_options.parsing_mode == ParsingMode::Strict {
		decode_err!(@BAIL "Picture has an invalid picture type");
	}

	let mut pos = 4;

	let mime_len = read_u32_be(slice_at(content, pos, 4)?) as usize;
	pos += 4;
	let mime_type = decode_with_fallback(slice_at(content, pos, mime_len)?, None);
	pos += mime_len;

	let description_len = read_u32_be(slice_at(content, pos, 4)?) as usize;
	pos += 4;
	let description = match std::str::from_utf8(slice_at(content, pos, description_len)?) {
		Ok(description) => description.to_owned(),
		Err(err) => {
			if parse_options.parsing_mode == ParsingMode::Strict {
				return Err(err.into());
			}

			log::warn!("Picture description is not valid UTF-8, discarding it");
			String::new()
		},
	};
	pos += description_len;

	// Width, height, color depth, and the number of indexed colors are unused
	let dimensions = slice_at(content, pos, 16)?;
	log::trace!(
		"FLAC picture: {}x{}, depth {}",
		read_u32_be(dimensions),
		read_u32_be(&dimensions[4..]),
		read_u32_be(&dimensions[8..])
	);
	pos += 16;

	let data_len = read_u32_be(slice_at(content, pos, 4)?) as usize;
	pos += 4;

	let Ok(data) = slice_at(content, pos, data_len) else {
		err!(SizeMismatch);
	};

	Ok(PictureData::new(
		Some(mime_type),
		picture_type.min(255) as u8,
		description,
		data,
		parse_options.max_preview_len,
	))
}
