use super::data_type::DataType;
use super::{FLAG_ATOMS, WELL_KNOWN_TYPE_SET};
use crate::config::{ParseOptions, ParsingMode};
use crate::error::{ErrorKind, Result, TagError};
use crate::id3::v1::constants::GENRES;
use crate::macros::err;
use crate::mp4::atom_info::AtomInfo;
use crate::tag::{BinaryData, FieldValue, Metadata, PictureData, TagFormat};
use crate::util::num::{read_u16_be, read_u24_be, read_uint_be};
use crate::util::text::{decode_with_fallback, latin1_decode, utf16_decode_bytes};

const GENRE_KEY: &str = "\u{a9}gen";

/// The children of an `ilst` item
#[derive(Default)]
struct ItemContents<'a> {
	mean: Option<&'a [u8]>,
	name: Option<&'a [u8]>,
	data: Vec<(DataType, &'a [u8])>,
}

/// Decode a complete `ilst` atom, header included
pub(crate) fn parse_ilst(ilst: &[u8], parse_options: ParseOptions) -> Result<Metadata> {
	let parse_mode = parse_options.parsing_mode;

	let Some((header, items)) = next_atom(ilst, 0, parse_mode)? else {
		err!(BadAtom("Missing \"ilst\" atom"));
	};

	if header.ident != *b"ilst" {
		err!(BadAtom("Expected an \"ilst\" atom"));
	}

	let mut metadata = Metadata::new(TagFormat::Mp4Ilst);
	let mut upgraded_gnres = Vec::new();

	let mut offset = 0;
	while offset < items.len() {
		let (atom, content) = match next_atom(items, offset, parse_mode) {
			Ok(Some(atom)) => atom,
			Ok(None) => break,
			Err(e) => {
				if parse_mode == ParsingMode::Strict {
					return Err(e);
				}

				log::warn!("Failed to read an `ilst` item, stopping: {e}");
				break;
			},
		};

		offset = atom.end() as usize;

		if let Err(e) = read_item(&atom, content, parse_options, &mut metadata, &mut upgraded_gnres) {
			if parse_mode == ParsingMode::Strict {
				return Err(e);
			}

			log::warn!(
				"Skipping atom \"{}\" with invalid content: {e}",
				atom.ident.escape_ascii()
			);
		}
	}

	if !upgraded_gnres.is_empty() {
		if metadata.get(GENRE_KEY).is_some() {
			log::warn!("Encountered '©gen' atom, discarding upgraded 'gnre' atom(s)");
		} else {
			for genre in upgraded_gnres {
				metadata.add_text(GENRE_KEY, String::from(genre));
			}
		}
	}

	Ok(metadata)
}

/// Read the atom at `offset` within `data`, returning its header and content
fn next_atom(data: &[u8], offset: usize, parse_mode: ParsingMode) -> Result<Option<(AtomInfo, &[u8])>> {
	let Some(remaining) = data.get(offset..) else {
		return Ok(None);
	};

	let Some(atom) = AtomInfo::parse(remaining, offset as u64, remaining.len() as u64, parse_mode)? else {
		return Ok(None);
	};

	let content = &data[atom.content_start() as usize..atom.end() as usize];
	Ok(Some((atom, content)))
}

fn read_item(
	atom: &AtomInfo,
	content: &[u8],
	parse_options: ParseOptions,
	metadata: &mut Metadata,
	upgraded_gnres: &mut Vec<&'static str>,
) -> Result<()> {
	let parse_mode = parse_options.parsing_mode;

	if matches!(&atom.ident, b"free" | b"skip") {
		return Ok(());
	}

	let contents = read_item_contents(content, parse_mode)?;

	if &atom.ident == b"----" {
		return read_freeform(contents, parse_options, metadata);
	}

	let key = latin1_decode(&atom.ident);
	log::trace!("Reading `ilst` item \"{key}\"");

	match &atom.ident {
		b"covr" if !parse_options.read_cover_art => {},
		b"covr" => {
			for (data_type, value) in contents.data {
				// Type 0 is implicit
				let mime_type = match data_type {
					DataType::Reserved => None,
					_ => match data_type.image_mime_type() {
						Some(mime_type) => Some(mime_type.to_owned()),
						None => {
							if parse_mode == ParsingMode::Strict {
								err!(BadAtom("\"covr\" atom has an unknown type"));
							}

							log::warn!(
								"Encountered \"covr\" atom with an unknown type of `{data_type:?}`, discarding"
							);
							continue;
						},
					},
				};

				metadata.add_field(
					key.as_str(),
					FieldValue::Picture(PictureData::new(
						mime_type,
						0,
						String::new(),
						value,
						parse_options.max_preview_len,
					)),
				);
			}
		},
		// Stores an ID3v1 genre index plus one
		b"gnre" => {
			log::warn!("Encountered outdated 'gnre' atom, attempting to upgrade to '©gen'");

			for (_, value) in contents.data {
				if value.len() < 2 {
					continue;
				}

				let index = usize::from(read_u16_be(value));
				if index > 0 && index <= GENRES.len() {
					upgraded_gnres.push(GENRES[index - 1]);
				} else {
					log::warn!("Discarding 'gnre' atom with an unknown index: {index}");
				}
			}
		},
		ident if FLAG_ATOMS.contains(&ident) => {
			if let Some((_, value)) = contents.data.first() {
				// Any size integer is technically valid
				let is_true = value.iter().any(|&b| b != 0);
				metadata.add_field(key, FieldValue::Boolean(is_true));
			}
		},
		b"trkn" | b"disk" => {
			for (data_type, value) in contents.data {
				let value = match data_type {
					DataType::Reserved => number_pair(value)?,
					_ => interpret_atom_content(data_type, value, parse_options)?,
				};

				metadata.add_field(key.as_str(), value);
			}
		},
		_ => {
			for (data_type, value) in contents.data {
				let value = interpret_atom_content(data_type, value, parse_options)?;
				metadata.add_field(key.as_str(), value);
			}
		},
	}

	Ok(())
}

fn read_freeform(
	contents: ItemContents<'_>,
	parse_options: ParseOptions,
	metadata: &mut Metadata,
) -> Result<()> {
	let (Some(mean), Some(name)) = (contents.mean, contents.name) else {
		err!(BadAtom(
			"Found freeform identifier \"----\" with no trailing \"mean\" or \"name\" atoms"
		));
	};

	fn freeform_string(bytes: &[u8]) -> Result<&str> {
		std::str::from_utf8(bytes).map_err(|_| {
			TagError::new(ErrorKind::BadAtom(
				"Found a non UTF-8 string while reading freeform identifier",
			))
		})
	}

	let key = format!("----:{}:{}", freeform_string(mean)?, freeform_string(name)?);
	log::trace!("Reading freeform `ilst` item \"{key}\"");

	for (data_type, value) in contents.data {
		let value = interpret_atom_content(data_type, value, parse_options)?;
		metadata.add_field(key.as_str(), value);
	}

	Ok(())
}

fn read_item_contents(content: &[u8], parse_mode: ParsingMode) -> Result<ItemContents<'_>> {
	// An atom can contain multiple data atoms
	let mut contents = ItemContents::default();

	let mut offset = 0;
	while offset < content.len() {
		let Some((atom, atom_content)) = next_atom(content, offset, parse_mode)? else {
			break;
		};

		offset = atom.end() as usize;

		match &atom.ident {
			b"data" => {
				// Type indicator (4) + locale (4)
				if atom_content.len() < 8 {
					if parse_mode == ParsingMode::Strict {
						err!(BadAtom("Data atom is too small"));
					}

					log::warn!(
						"Expected data atom to be at least 16 bytes, got {}. Stopping",
						atom.len
					);
					break;
				}

				// The type indicator is formed of four bytes split between two fields. The first byte
				// indicates the set of types from which the type is drawn. The second through fourth
				// byte forms the second field and its interpretation depends upon the value in the
				// first field.
				if atom_content[0] != WELL_KNOWN_TYPE_SET {
					if parse_mode == ParsingMode::Strict {
						err!(BadAtom("Unknown type set in data atom"));
					}

					log::warn!("Skipping atom with unknown type set");
					continue;
				}

				let data_type = DataType::from(read_u24_be(&atom_content[1..4]));

				// We don't care about the locale
				let value = &atom_content[8..];
				if value.is_empty() {
					log::warn!("Skipping empty \"data\" atom");
					continue;
				}

				contents.data.push((data_type, value));
			},
			b"mean" | b"name" => {
				// Version (1) + flags (3)
				let Some(value) = atom_content.get(4..) else {
					err!(BadAtom("Found an incomplete freeform identifier chunk"));
				};

				if &atom.ident == b"mean" {
					contents.mean = Some(value);
				} else {
					contents.name = Some(value);
				}
			},
			ident => {
				if parse_mode == ParsingMode::Strict {
					err!(BadAtom("Expected atom \"data\" to follow name"));
				}

				log::warn!(
					"Skipping unexpected atom \"{}\", expected \"data\"",
					ident.escape_ascii()
				);
			},
		}
	}

	Ok(contents)
}

// https://developer.apple.com/library/archive/documentation/QuickTime/QTFF/Metadata/Metadata.html#//apple_ref/doc/uid/TP40000939-CH1-SW35
fn interpret_atom_content(
	data_type: DataType,
	content: &[u8],
	parse_options: ParseOptions,
) -> Result<FieldValue> {
	Ok(match data_type {
		DataType::Utf8 | DataType::Utf8Sort => match std::str::from_utf8(content) {
			Ok(text) => FieldValue::Text(text.trim_end_matches('\0').to_owned()),
			Err(e) => {
				if parse_options.parsing_mode == ParsingMode::Strict {
					return Err(e.into());
				}

				log::warn!("Found a non UTF-8 string in a UTF-8 data atom, attempting to recover");
				FieldValue::Text(decode_with_fallback(content, None))
			},
		},
		DataType::Utf16 | DataType::Utf16Sort => {
			FieldValue::Text(utf16_decode_bytes(content, u16::from_be_bytes)?)
		},
		DataType::BeSignedInteger | DataType::Be64BitSignedInteger => {
			FieldValue::Integer(parse_int(content)?)
		},
		DataType::BeUnsignedInteger => FieldValue::Integer(parse_uint(content)?),
		DataType::Gif | DataType::Jpeg | DataType::Png | DataType::Bmp => {
			FieldValue::Picture(PictureData::new(
				data_type.image_mime_type().map(str::to_owned),
				0,
				String::new(),
				content,
				parse_options.max_preview_len,
			))
		},
		DataType::Reserved => FieldValue::Binary(BinaryData::new(
			content,
			parse_options.max_preview_len,
			None,
		)),
		DataType::Other(code) => FieldValue::Binary(BinaryData::new(
			content,
			parse_options.max_preview_len,
			Some(format!("data type {code}")),
		)),
	})
}

/// `trkn` and `disk` store a reserved field, the current number, and the total as 16-bit integers
fn number_pair(content: &[u8]) -> Result<FieldValue> {
	if content.len() < 6 {
		err!(BadAtom("Number pair atom is too small"));
	}

	let current = read_u16_be(&content[2..4]);
	let total = read_u16_be(&content[4..6]);

	Ok(FieldValue::NumberPair {
		current: u32::from(current),
		total: (total > 0).then_some(u32::from(total)),
	})
}

fn parse_uint(bytes: &[u8]) -> Result<i64> {
	match read_uint_be(bytes).map(i64::try_from) {
		Some(Ok(value)) => Ok(value),
		_ => err!(BadAtom(
			"Unexpected atom size for type \"BE unsigned integer\""
		)),
	}
}

fn parse_int(bytes: &[u8]) -> Result<i64> {
	Ok(match bytes.len() {
		1 => i64::from(bytes[0] as i8),
		2 => i64::from(i16::from_be_bytes([bytes[0], bytes[1]])),
		3 => i64::from(i32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])),
		4 => i64::from(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
		8 => i64::from_be_bytes([
			bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
		]),
		_ => err!(BadAtom(
			"Unexpected atom size for type \"BE signed integer\""
		)),
	})
}
