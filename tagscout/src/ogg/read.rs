use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::macros::{decode_err, err, parse_mode_choice};
use crate::picture::parse_encoded_flac_picture;
use crate::tag::{FieldValue, Metadata, PictureData, TagFormat};
use crate::util::text::decode_with_fallback;

use byteorder::{LittleEndian, ReadBytesExt};
use data_encoding::BASE64;

/// Whether a framing bit is expected after the comments
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Framing {
	/// Vorbis streams end the comment header with a framing bit
	Expected,
	/// FLAC and Opus have no framing bit
	Absent,
}

/// Decode a Vorbis Comments block
///
/// `content` starts at the vendor string, any packet signature must already be removed.
pub(crate) fn read_comments(
	content: &[u8],
	framing: Framing,
	parse_options: ParseOptions,
) -> Result<Metadata> {
	let parse_mode = parse_options.parsing_mode;
	let mut data = content;

	let vendor_len = data.read_u32::<LittleEndian>()? as usize;
	if vendor_len > data.len() {
		err!(SizeMismatch);
	}

	let (vendor, rest) = data.split_at(vendor_len);
	data = rest;

	match std::str::from_utf8(vendor) {
		Ok(vendor) => log::debug!("Vorbis Comments vendor: \"{vendor}\""),
		Err(e) => {
			if parse_mode == ParsingMode::Strict {
				return Err(e.into());
			}

			log::warn!("Possibly corrupt vendor string, ignoring it");
		},
	}

	let number_of_items = data.read_u32::<LittleEndian>()?;

	// Every comment needs at least a 4 byte length
	if u64::from(number_of_items) > (data.len() >> 2) as u64 {
		err!(SizeMismatch);
	}

	let mut metadata = Metadata::new(TagFormat::VorbisComments);

	for _ in 0..number_of_items {
		let comment_len = data.read_u32::<LittleEndian>()? as usize;
		if comment_len > data.len() {
			err!(SizeMismatch);
		}

		let (comment, rest) = data.split_at(comment_len);
		data = rest;

		read_comment(comment, parse_options, &mut metadata)?;
	}

	if framing == Framing::Expected {
		match data.first() {
			Some(framing_bit) if framing_bit & 1 == 1 => {},
			_ => parse_mode_choice!(
				parse_mode,
				STRICT: decode_err!(@BAIL Ogg, "Vorbis comment header is missing its framing bit"),
				BESTATTEMPT: log::warn!("Vorbis comment header is missing its framing bit"),
				DEFAULT: {}
			),
		}
	}

	Ok(metadata)
}

fn read_comment(comment: &[u8], parse_options: ParseOptions, metadata: &mut Metadata) -> Result<()> {
	let parse_mode = parse_options.parsing_mode;

	// KEY=VALUE
	let Some(separator) = comment.iter().position(|b| *b == b'=') else {
		parse_mode_choice!(
			parse_mode,
			STRICT: decode_err!(@BAIL Ogg, "Vorbis comment has no separator"),
			DEFAULT: {
				log::warn!("No separator found in field, discarding");
				return Ok(());
			}
		);
	};

	let (key, value) = (&comment[..separator], &comment[separator + 1..]);

	if !valid_vorbis_comments_key(key) {
		parse_mode_choice!(
			parse_mode,
			STRICT: decode_err!(@BAIL Ogg, "Vorbis comments contain an invalid key"),
			DEFAULT: {
				log::warn!(
					"Discarding field with an invalid key: {:?}",
					String::from_utf8_lossy(key)
				);
				return Ok(());
			}
		);
	}

	// Checked above, the key is ASCII
	let key = String::from_utf8_lossy(key).to_ascii_uppercase();
	log::trace!("Vorbis Comments: Reading field `{key}`");

	match key.as_str() {
		"METADATA_BLOCK_PICTURE" | "COVERART" if !parse_options.read_cover_art => {},
		"METADATA_BLOCK_PICTURE" => match parse_encoded_flac_picture(value, parse_options) {
			Ok(picture) => metadata.add_field(key, FieldValue::Picture(picture)),
			Err(e) => {
				if parse_mode == ParsingMode::Strict {
					return Err(e);
				}

				log::warn!("Failed to decode FLAC picture, discarding field");
			},
		},
		"COVERART" => {
			// `COVERART` is an old deprecated image storage format, holding nothing but the image
			//
			// <https://wiki.xiph.org/VorbisComment#Conversion_to_METADATA_BLOCK_PICTURE>
			log::warn!("Found deprecated `COVERART` field");

			match BASE64.decode(value) {
				Ok(data) => metadata.add_field(
					key,
					FieldValue::Picture(PictureData::new(
						None,
						0,
						String::new(),
						&data,
						parse_options.max_preview_len,
					)),
				),
				Err(_) => {
					if parse_mode == ParsingMode::Strict {
						decode_err!(@BAIL Ogg, "`COVERART` field is not valid base64");
					}

					log::warn!("Failed to decode `COVERART`, discarding field");
				},
			}
		},
		_ => match std::str::from_utf8(value) {
			Ok(value) => metadata.add_text(key, value.to_owned()),
			Err(e) => parse_mode_choice!(
				parse_mode,
				STRICT: return Err(e.into()),
				BESTATTEMPT: {
					log::warn!("Non UTF-8 value found in field `{key}`, attempting to recover");
					metadata.add_text(key, decode_with_fallback(value, None));
				},
				DEFAULT: log::warn!("Non UTF-8 value found, discarding field `{key}`")
			),
		},
	}

	Ok(())
}

pub(crate) fn valid_vorbis_comments_key(key: &[u8]) -> bool {
	// The valid range is 0x20..=0x7D not including 0x3D
	!key.is_empty() && key.iter().all(|c| (b' '..=b'}').contains(c) && *c != b'=')
}
