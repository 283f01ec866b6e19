use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::id3::v2::header::Id3v2Version;
use crate::macros::{id3v2_err, parse_mode_choice};
use crate::tag::{BinaryData, FieldValue, Metadata, PictureData};
use crate::util::text::{TextEncoding, decode_text, latin1_decode, split_terminated};

/// Decode the (already unsynchronized/decompressed) content of a frame into `metadata`
///
/// The key of the resulting field is the frame ID, followed by the description for frames that
/// have one (ex. `TXXX:MusicBrainz Album Id`).
#[rustfmt::skip]
pub(in crate::id3::v2) fn decode_content(
	metadata: &mut Metadata,
	id: &str,
	content: &[u8],
	version: Id3v2Version,
	options: ParseOptions,
) -> Result<()> {
	log::trace!("Parsing frame content for ID: {}", id);

	match id {
		"APIC" | "PIC" => decode_picture(metadata, id, content, version, options),
		"TXXX" | "TXX" => decode_user_text(metadata, id, content, version, options.parsing_mode),
		"WXXX" | "WXX" => decode_user_url(metadata, id, content, version, options.parsing_mode),
		"COMM" | "COM" | "USLT" | "ULT" => decode_language_frame(metadata, id, content, version, options.parsing_mode),
		"TIPL" | "TMCL" | "IPLS" | "IPL" => decode_key_value(metadata, id, content, version, options.parsing_mode),
		"UFID" | "UFI" => decode_unique_file_identifier(metadata, id, content, options),
		"POPM" | "POP" => decode_popularimeter(metadata, id, content, options.parsing_mode),
		"PCNT" | "CNT" => decode_play_counter(metadata, id, content, options.parsing_mode),
		"PRIV" => decode_owned_binary(metadata, id, content, options),
		"GEOB" | "GEO" => decode_encapsulated_object(metadata, id, content, version, options),
		i if i.starts_with('T') => decode_text_information(metadata, id, content, version, options.parsing_mode),
		i if i.starts_with('W') => {
			metadata.add_text(id, latin1_decode(content).trim_end().to_owned());
			Ok(())
		},
		// SYLT, ETCO, OWNE, USER, and any unknown frames
		_ => {
			metadata.add_field(id, FieldValue::Binary(BinaryData::new(content, options.max_preview_len, None)));
			Ok(())
		},
	}
}

pub(in crate::id3::v2) fn verify_encoding(
	encoding: u8,
	version: Id3v2Version,
	parse_mode: ParsingMode,
) -> Result<TextEncoding> {
	let Some(text_encoding) = TextEncoding::from_u8(encoding) else {
		parse_mode_choice!(
			parse_mode,
			STRICT: return Err(id3v2_err!(BadTextEncoding(encoding))),
			DEFAULT: {
				log::warn!("Found an invalid text encoding ({encoding}), assuming ISO-8859-1");
				return Ok(TextEncoding::Latin1);
			}
		);
	};

	match (version, text_encoding) {
		(Id3v2Version::V2, TextEncoding::UTF8 | TextEncoding::UTF16BE) => {
			if parse_mode == ParsingMode::Strict {
				return Err(id3v2_err!(V2InvalidTextEncoding));
			}

			log::warn!("ID3v2.2 only supports ISO-8859-1 and UTF-16, found {text_encoding:?}");
			Ok(downgrade_encoding(text_encoding))
		},
		(Id3v2Version::V3, TextEncoding::UTF8) => {
			log::warn!("UTF-8 is only valid in ID3v2.4, decoding as ISO-8859-1");
			Ok(TextEncoding::Latin1)
		},
		_ => Ok(text_encoding),
	}
}

fn downgrade_encoding(encoding: TextEncoding) -> TextEncoding {
	match encoding {
		TextEncoding::UTF8 => TextEncoding::Latin1,
		other => other,
	}
}

/// Split off the encoding byte at the start of `content`
fn encoding_and_rest<'a>(
	id: &str,
	content: &'a [u8],
	version: Id3v2Version,
	parse_mode: ParsingMode,
) -> Result<(TextEncoding, &'a [u8])> {
	let Some((&encoding, rest)) = content.split_first() else {
		return Err(id3v2_err!(EmptyFrame(id.to_owned())));
	};

	Ok((verify_encoding(encoding, version, parse_mode)?, rest))
}

/// Decode every terminated string in `content`
fn decode_values(content: &[u8], encoding: TextEncoding) -> Result<Vec<String>> {
	let mut values = Vec::new();

	let mut remaining = content;
	while !remaining.is_empty() {
		let (value, rest) = split_terminated(remaining, encoding);
		values.push(decode_text(value, encoding)?);
		remaining = rest;
	}

	Ok(values)
}

fn decode_text_information(
	metadata: &mut Metadata,
	id: &str,
	content: &[u8],
	version: Id3v2Version,
	parse_mode: ParsingMode,
) -> Result<()> {
	let (encoding, content) = encoding_and_rest(id, content, version, parse_mode)?;

	let values = decode_values(content, encoding)?;
	for value in values.into_iter().filter(|value| !value.is_empty()) {
		metadata.add_text(id, value);
	}

	Ok(())
}

fn decode_user_text(
	metadata: &mut Metadata,
	id: &str,
	content: &[u8],
	version: Id3v2Version,
	parse_mode: ParsingMode,
) -> Result<()> {
	let (encoding, content) = encoding_and_rest(id, content, version, parse_mode)?;

	let (description, value) = split_terminated(content, encoding);
	let description = decode_text(description, encoding)?;

	for value in decode_values(value, encoding)? {
		metadata.add_text(format!("{id}:{description}"), value);
	}

	Ok(())
}

fn decode_user_url(
	metadata: &mut Metadata,
	id: &str,
	content: &[u8],
	version: Id3v2Version,
	parse_mode: ParsingMode,
) -> Result<()> {
	let (encoding, content) = encoding_and_rest(id, content, version, parse_mode)?;

	let (description, url) = split_terminated(content, encoding);
	let description = decode_text(description, encoding)?;

	// The URL itself is always ISO-8859-1
	metadata.add_text(format!("{id}:{description}"), latin1_decode(url));
	Ok(())
}

/// `COMM` and `USLT`, which share a layout
fn decode_language_frame(
	metadata: &mut Metadata,
	id: &str,
	content: &[u8],
	version: Id3v2Version,
	parse_mode: ParsingMode,
) -> Result<()> {
	let (encoding, content) = encoding_and_rest(id, content, version, parse_mode)?;
	if content.len() < 3 {
		return Err(id3v2_err!(BadFrameLength));
	}

	let language = &content[..3];
	if !language.iter().all(u8::is_ascii_alphabetic) {
		log::debug!("{id}: Language code is not alphabetic: {language:?}");
	}

	let (description, text) = split_terminated(&content[3..], encoding);
	let description = decode_text(description, encoding)?;
	let text = decode_text(text, encoding)?;

	let key = if description.is_empty() {
		id.to_owned()
	} else {
		format!("{id}:{description}")
	};

	metadata.add_text(key, text);
	Ok(())
}

/// `TIPL`, `TMCL`, and `IPLS`, a list of role/person pairs
fn decode_key_value(
	metadata: &mut Metadata,
	id: &str,
	content: &[u8],
	version: Id3v2Version,
	parse_mode: ParsingMode,
) -> Result<()> {
	let (encoding, content) = encoding_and_rest(id, content, version, parse_mode)?;

	let values = decode_values(content, encoding)?;
	if values.len() % 2 != 0 {
		log::warn!("{id}: Found an odd number of strings, ignoring the last one");
	}

	for pair in values.chunks_exact(2) {
		let (role, person) = (&pair[0], &pair[1]);
		if role.is_empty() && person.is_empty() {
			continue;
		}

		metadata.add_text(id, format!("{role}: {person}"));
	}

	Ok(())
}

fn decode_unique_file_identifier(
	metadata: &mut Metadata,
	id: &str,
	content: &[u8],
	options: ParseOptions,
) -> Result<()> {
	let (owner, identifier) = split_terminated(content, TextEncoding::Latin1);
	let owner = latin1_decode(owner);

	if owner.is_empty() && options.parsing_mode == ParsingMode::Strict {
		return Err(id3v2_err!(EmptyFrame(id.to_owned())));
	}

	let key = format!("{id}:{owner}");
	match std::str::from_utf8(identifier) {
		Ok(text) if !text.contains('\0') => metadata.add_text(key, text.to_owned()),
		_ => metadata.add_field(
			key,
			FieldValue::Binary(BinaryData::new(identifier, options.max_preview_len, Some(owner))),
		),
	}

	Ok(())
}

fn decode_popularimeter(
	metadata: &mut Metadata,
	id: &str,
	content: &[u8],
	parse_mode: ParsingMode,
) -> Result<()> {
	let (email, rest) = split_terminated(content, TextEncoding::Latin1);
	let Some((&rating, counter)) = rest.split_first() else {
		if parse_mode == ParsingMode::Strict {
			return Err(id3v2_err!(BadFrameLength));
		}

		log::warn!("{id}: Frame has no rating, skipping");
		return Ok(());
	};

	if counter.len() > 8 {
		log::warn!("{id}: Play counter is wider than 64 bits, ignoring it");
	}

	let email = latin1_decode(email);
	let key = if email.is_empty() {
		id.to_owned()
	} else {
		format!("{id}:{email}")
	};

	metadata.add_text(key, rating.to_string());
	Ok(())
}

fn decode_play_counter(
	metadata: &mut Metadata,
	id: &str,
	content: &[u8],
	parse_mode: ParsingMode,
) -> Result<()> {
	// The counter is at least 32 bits, and can grow as needed
	if content.len() < 4 && parse_mode == ParsingMode::Strict {
		return Err(id3v2_err!(BadFrameLength));
	}

	match crate::util::num::read_uint_be(content).map(i64::try_from) {
		Some(Ok(counter)) => metadata.add_field(id, FieldValue::Integer(counter)),
		_ => log::warn!("{id}: Play counter is empty or too large, skipping"),
	}

	Ok(())
}

/// `PRIV`, an owner identifier followed by opaque data
fn decode_owned_binary(
	metadata: &mut Metadata,
	id: &str,
	content: &[u8],
	options: ParseOptions,
) -> Result<()> {
	let (owner, data) = split_terminated(content, TextEncoding::Latin1);
	let owner = latin1_decode(owner);

	metadata.add_field(
		id,
		FieldValue::Binary(BinaryData::new(data, options.max_preview_len, Some(owner))),
	);
	Ok(())
}

fn decode_encapsulated_object(
	metadata: &mut Metadata,
	id: &str,
	content: &[u8],
	version: Id3v2Version,
	options: ParseOptions,
) -> Result<()> {
	let (encoding, content) = encoding_and_rest(id, content, version, options.parsing_mode)?;

	let (mime_type, rest) = split_terminated(content, TextEncoding::Latin1);
	let (file_name, rest) = split_terminated(rest, encoding);
	let (description, data) = split_terminated(rest, encoding);

	let mime_type = latin1_decode(mime_type);
	let file_name = decode_text(file_name, encoding)?;
	let description = decode_text(description, encoding)?;

	let label = if file_name.is_empty() {
		mime_type
	} else {
		format!("{mime_type}, {file_name}")
	};

	let key = if description.is_empty() {
		id.to_owned()
	} else {
		format!("{id}:{description}")
	};

	metadata.add_field(
		key,
		FieldValue::Binary(BinaryData::new(data, options.max_preview_len, Some(label))),
	);
	Ok(())
}

fn decode_picture(
	metadata: &mut Metadata,
	id: &str,
	content: &[u8],
	version: Id3v2Version,
	options: ParseOptions,
) -> Result<()> {
	let parse_mode = options.parsing_mode;
	let (encoding, content) = encoding_and_rest(id, content, version, parse_mode)?;

	let (mime_type, rest) = if version == Id3v2Version::V2 {
		if content.len() < 3 {
			return Err(id3v2_err!(BadFrameLength));
		}

		let format = latin1_decode(&content[..3]);
		let mime_type = match format.to_ascii_uppercase().as_str() {
			"PNG" => Some("image/png"),
			"JPG" => Some("image/jpeg"),
			"GIF" => Some("image/gif"),
			"BMP" => Some("image/bmp"),
			"TIF" => Some("image/tiff"),
			_ => {
				if parse_mode == ParsingMode::Strict {
					return Err(id3v2_err!(BadPictureFormat(format)));
				}

				log::warn!("PIC: Unknown image format \"{format}\"");
				None
			},
		};

		(mime_type.map(str::to_owned), &content[3..])
	} else {
		let (mime_type, rest) = split_terminated(content, TextEncoding::Latin1);
		(Some(latin1_decode(mime_type)), rest)
	};

	let Some((&picture_type, rest)) = rest.split_first() else {
		return Err(id3v2_err!(BadFrameLength));
	};

	let (description, data) = split_terminated(rest, encoding);
	let description = decode_text(description, encoding)?;

	metadata.add_field(
		id,
		FieldValue::Picture(PictureData::new(
			mime_type,
			picture_type,
			description,
			data,
			options.max_preview_len,
		)),
	);
	Ok(())
}
