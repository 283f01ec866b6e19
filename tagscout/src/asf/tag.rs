//! Decoding of the metadata objects
//!
//! Every string is UTF-16LE. The Extended Content Description, Metadata, and Metadata Library
//! objects hold typed values:
//!
//! | Type | Value                               |
//! |------|-------------------------------------|
//! | 0    | Unicode string                      |
//! | 1    | Byte array                          |
//! | 2    | Boolean (32 bits, 16 in `Metadata`) |
//! | 3    | 32-bit integer                      |
//! | 4    | 64-bit integer                      |
//! | 5    | 16-bit integer                      |
//! | 6    | GUID (Metadata Library only)        |

use super::guid::Guid;
use super::object::OBJECT_HEADER_SIZE;
use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::macros::{decode_err, err};
use crate::tag::{BinaryData, FieldValue, Metadata, PictureData, TagFormat};
use crate::util::num::{read_u16_le, read_u32_le, read_u64_le, read_uint_le};
use crate::util::text::{TextEncoding, split_terminated, utf16le_decode};

const CONTENT_DESCRIPTION_KEYS: [&str; 5] = ["Title", "Author", "Copyright", "Description", "Rating"];

const PICTURE_KEY: &str = "WM/Picture";

/// Validate the object header, returning the content
fn object_content(data: &[u8], expected: Guid) -> Result<&[u8]> {
	if Guid::from_slice(data) != Some(expected) || data.len() < OBJECT_HEADER_SIZE as usize {
		decode_err!(@BAIL Asf, "Object has an unexpected GUID");
	}

	let size = read_u64_le(&data[16..24]);
	if size != data.len() as u64 {
		err!(SizeMismatch);
	}

	Ok(&data[OBJECT_HEADER_SIZE as usize..])
}

/// Take `len` bytes off the front of `data`
///
/// Outside of strict mode, a short read takes what's left.
fn take<'a>(data: &mut &'a [u8], len: usize, parse_mode: ParsingMode) -> Result<Option<&'a [u8]>> {
	if data.len() < len {
		if parse_mode == ParsingMode::Strict {
			err!(SizeMismatch);
		}

		log::warn!("ASF object field overruns the object, stopping");
		return Ok(None);
	}

	let (taken, rest) = data.split_at(len);
	*data = rest;
	Ok(Some(taken))
}

fn decode_string(bytes: &[u8], parse_mode: ParsingMode) -> Result<Option<String>> {
	match utf16le_decode(bytes) {
		Ok(text) => Ok(Some(text)),
		Err(e) if parse_mode == ParsingMode::Strict => Err(e),
		Err(e) => {
			log::warn!("Skipping an invalid ASF string: {e}");
			Ok(None)
		},
	}
}

pub(crate) fn parse_content_description(data: &[u8], parse_options: ParseOptions) -> Result<Metadata> {
	let parse_mode = parse_options.parsing_mode;
	let content = object_content(data, Guid::CONTENT_DESCRIPTION)?;

	if content.len() < 10 {
		decode_err!(@BAIL Asf, "Content description object is too small");
	}

	let (lengths, mut content) = content.split_at(10);

	let mut metadata = Metadata::new(TagFormat::AsfContentDescription);
	for (i, key) in CONTENT_DESCRIPTION_KEYS.into_iter().enumerate() {
		let len = usize::from(read_u16_le(&lengths[i * 2..]));
		let Some(bytes) = take(&mut content, len, parse_mode)? else {
			break;
		};

		if let Some(text) = decode_string(bytes, parse_mode)? {
			metadata.add_text(key, text);
		}
	}

	Ok(metadata)
}

pub(crate) fn parse_extended_content_description(
	data: &[u8],
	parse_options: ParseOptions,
) -> Result<Metadata> {
	let parse_mode = parse_options.parsing_mode;
	let mut content = object_content(data, Guid::EXTENDED_CONTENT_DESCRIPTION)?;

	let Some(count) = take(&mut content, 2, parse_mode)? else {
		decode_err!(@BAIL Asf, "Extended content description object has no descriptor count");
	};

	let mut metadata = Metadata::new(TagFormat::AsfExtendedContentDescription);
	for _ in 0..read_u16_le(count) {
		let Some(name_len) = take(&mut content, 2, parse_mode)? else {
			break;
		};

		let Some(name) = take(&mut content, usize::from(read_u16_le(name_len)), parse_mode)? else {
			break;
		};

		let Some(value_header) = take(&mut content, 4, parse_mode)? else {
			break;
		};

		let data_type = read_u16_le(value_header);
		let value_len = usize::from(read_u16_le(&value_header[2..]));
		let Some(value) = take(&mut content, value_len, parse_mode)? else {
			break;
		};

		let Some(name) = decode_string(name, parse_mode)? else {
			continue;
		};

		if let Some(value) = decode_value(&name, data_type, value, parse_options)? {
			metadata.add_field(name, value);
		}
	}

	Ok(metadata)
}

/// Decode a Metadata or Metadata Library object, which share a layout
pub(crate) fn parse_metadata(
	data: &[u8],
	format: TagFormat,
	parse_options: ParseOptions,
) -> Result<Metadata> {
	let parse_mode = parse_options.parsing_mode;
	let expected = match format {
		TagFormat::AsfMetadata => Guid::METADATA,
		TagFormat::AsfMetadataLibrary => Guid::METADATA_LIBRARY,
		_ => err!(UnsupportedFormat(format)),
	};

	let mut content = object_content(data, expected)?;
	let Some(count) = take(&mut content, 2, parse_mode)? else {
		decode_err!(@BAIL Asf, "Metadata object has no record count");
	};

	let mut metadata = Metadata::new(format);
	for _ in 0..read_u16_le(count) {
		// Language list index or reserved (2), stream number (2), name length (2),
		// data type (2), data length (4)
		let Some(record_header) = take(&mut content, 12, parse_mode)? else {
			break;
		};

		let stream_number = read_u16_le(&record_header[2..]);
		let name_len = usize::from(read_u16_le(&record_header[4..]));
		let data_type = read_u16_le(&record_header[6..]);
		let data_len = read_u32_le(&record_header[8..]) as usize;

		let Some(name) = take(&mut content, name_len, parse_mode)? else {
			break;
		};

		let Some(value) = take(&mut content, data_len, parse_mode)? else {
			break;
		};

		let Some(name) = decode_string(name, parse_mode)? else {
			continue;
		};

		log::trace!("Reading ASF metadata record `{name}`, stream: {stream_number}");

		if let Some(value) = decode_value(&name, data_type, value, parse_options)? {
			metadata.add_field(name, value);
		}
	}

	Ok(metadata)
}

fn decode_value(
	name: &str,
	data_type: u16,
	value: &[u8],
	parse_options: ParseOptions,
) -> Result<Option<FieldValue>> {
	let parse_mode = parse_options.parsing_mode;
	let has_len = |expected: &[usize]| -> Result<bool> {
		if expected.contains(&value.len()) {
			return Ok(true);
		}

		if parse_mode == ParsingMode::Strict {
			err!(SizeMismatch);
		}

		log::warn!("ASF value `{name}` has an invalid length for its type, skipping it");
		Ok(false)
	};

	let value = match data_type {
		0 => decode_string(value, parse_mode)?.map(FieldValue::Text),
		1 if name == PICTURE_KEY => {
			if !parse_options.read_cover_art {
				return Ok(None);
			}

			parse_picture(value, parse_options)?.map(FieldValue::Picture)
		},
		1 => Some(FieldValue::Binary(BinaryData::new(
			value,
			parse_options.max_preview_len,
			None,
		))),
		// 32 bits in the Extended Content Description object, 16 in the others
		2 => has_len(&[2, 4])?.then(|| FieldValue::Boolean(value.iter().any(|b| *b != 0))),
		3 | 4 | 5 => {
			let expected = match data_type {
				3 => 4,
				4 => 8,
				_ => 2,
			};

			if !has_len(&[expected])? {
				return Ok(None);
			}

			read_uint_le(value)
				.and_then(|value| i64::try_from(value).ok())
				.map(FieldValue::Integer)
		},
		6 => {
			if !has_len(&[16])? {
				return Ok(None);
			}

			Guid::from_slice(value).map(|guid| FieldValue::Text(guid.to_string()))
		},
		_ => {
			log::warn!("ASF value `{name}` has an unknown data type ({data_type})");
			Some(FieldValue::Binary(BinaryData::new(
				value,
				parse_options.max_preview_len,
				Some(format!("data type {data_type}")),
			)))
		},
	};

	Ok(value)
}

// Picture type (1), data length (4), MIME type, description, data
fn parse_picture(value: &[u8], parse_options: ParseOptions) -> Result<Option<PictureData>> {
	let parse_mode = parse_options.parsing_mode;
	if value.len() < 5 {
		if parse_mode == ParsingMode::Strict {
			err!(SizeMismatch);
		}

		log::warn!("Skipping a `{PICTURE_KEY}` value that is too small");
		return Ok(None);
	}

	let picture_type = value[0];
	let data_len = read_u32_le(&value[1..5]) as usize;

	let (mime_type, rest) = split_terminated(&value[5..], TextEncoding::UTF16);
	let (description, data) = split_terminated(rest, TextEncoding::UTF16);

	if data.len() != data_len {
		if parse_mode == ParsingMode::Strict {
			err!(SizeMismatch);
		}

		log::warn!(
			"`{PICTURE_KEY}` declares {data_len} bytes of picture data, found {}",
			data.len()
		);
	}

	let mime_type = decode_string(mime_type, parse_mode)?;
	let description = decode_string(description, parse_mode)?.unwrap_or_default();

	Ok(Some(PictureData::new(
		mime_type,
		picture_type,
		description,
		data,
		parse_options.max_preview_len,
	)))
}
