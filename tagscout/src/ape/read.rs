use super::constants::{APE_HEADER_SIZE, APE_PICTURE_TYPES, APE_PREAMBLE, INVALID_KEYS};
use super::header::ApeHeader;
use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::macros::{decode_err, err};
use crate::tag::{BinaryData, FieldValue, Metadata, PictureData};
use crate::util::num::read_u32_le;
use crate::util::text::{decode_with_fallback, join_multi_value};

/// Decode a complete APE tag (header and/or footer included)
pub(crate) fn parse_ape_tag(tag: &[u8], parse_options: ParseOptions) -> Result<Metadata> {
	let record_size = APE_HEADER_SIZE as usize;
	if tag.len() < record_size {
		err!(SizeMismatch);
	}

	let footer_record = &tag[tag.len() - record_size..];
	let header_record = &tag[..record_size];

	// Prefer the footer, it is the only record APEv1 has
	let (header, items) = if footer_record.starts_with(APE_PREAMBLE) {
		let footer = parse_record(footer_record)?;
		if footer.is_header() {
			decode_err!(@BAIL Ape, "APE tag ends with a header record");
		}

		let items_end = tag.len() - record_size;
		let Some(items_start) = items_end.checked_sub(footer.items_size()? as usize) else {
			err!(SizeMismatch);
		};

		(footer, &tag[items_start..items_end])
	} else if header_record.starts_with(APE_PREAMBLE) {
		let header = parse_record(header_record)?;

		let items_end = record_size + header.items_size()? as usize;
		if items_end > tag.len() {
			err!(SizeMismatch);
		}

		(header, &tag[record_size..items_end])
	} else {
		err!(FakeTag);
	};

	log::debug!(
		"Parsing APE tag, version: {}, items: {}",
		header.version,
		header.item_count
	);

	let mut metadata = Metadata::new(header.format());
	read_items(items, &header, parse_options, &mut metadata)?;

	Ok(metadata)
}

fn parse_record(record: &[u8]) -> Result<ApeHeader> {
	match record.try_into() {
		Ok(record) => ApeHeader::parse(record),
		Err(_) => err!(SizeMismatch),
	}
}

fn read_items(
	mut items: &[u8],
	header: &ApeHeader,
	parse_options: ParseOptions,
	metadata: &mut Metadata,
) -> Result<()> {
	let parse_mode = parse_options.parsing_mode;

	for _ in 0..header.item_count {
		// Value size (4) + flags (4) + a key of at least 2 bytes + NUL
		if items.len() < 11 {
			log::warn!("APE: Item count exceeds the items present");
			break;
		}

		let value_size = read_u32_le(items) as usize;
		let flags = read_u32_le(&items[4..]);
		items = &items[8..];

		let Some(key_len) = items.iter().position(|b| *b == 0) else {
			decode_err!(@BAIL Ape, "APE tag item key is not terminated");
		};

		let key = &items[..key_len];
		items = &items[key_len + 1..];

		if value_size > items.len() {
			err!(SizeMismatch);
		}

		let value = &items[..value_size];
		items = &items[value_size..];

		let Some(key) = verify_key(key, parse_mode)? else {
			continue;
		};

		// APEv1 items are always text
		let item_type = if header.version == 1000 {
			0
		} else {
			(flags >> 1) & 3
		};

		read_item(key, item_type, value, parse_options, metadata)?;
	}

	Ok(())
}

fn verify_key(key: &[u8], parse_mode: ParsingMode) -> Result<Option<&str>> {
	let valid = (2..=255).contains(&key.len())
		&& key.iter().all(|c| (0x20..=0x7E).contains(c))
		&& !INVALID_KEYS.iter().any(|invalid| key.eq_ignore_ascii_case(invalid.as_bytes()));

	if !valid {
		if parse_mode == ParsingMode::Strict {
			decode_err!(@BAIL Ape, "APE tag item contains an illegal key");
		}

		log::warn!(
			"APE: Encountered invalid item key '{}'",
			String::from_utf8_lossy(key)
		);
		return Ok(None);
	}

	// Checked above, keys are ASCII
	Ok(std::str::from_utf8(key).ok())
}

fn read_item(
	key: &str,
	item_type: u32,
	value: &[u8],
	parse_options: ParseOptions,
	metadata: &mut Metadata,
) -> Result<()> {
	log::trace!("APE: Reading item `{key}`, type: {item_type}, size: {}", value.len());

	match item_type {
		0 => {
			let text = match std::str::from_utf8(value) {
				Ok(text) => text.to_owned(),
				Err(_) => {
					if parse_options.parsing_mode == ParsingMode::Strict {
						decode_err!(@BAIL Ape, "Failed to convert text item into a UTF-8 string");
					}

					log::warn!("APE: Item `{key}` is not valid UTF-8");
					decode_with_fallback(value, None)
				},
			};

			metadata.add_text(key, join_multi_value(&text));
		},
		1 => {
			let picture_type = APE_PICTURE_TYPES
				.iter()
				.position(|picture_key| picture_key.eq_ignore_ascii_case(key));

			match picture_type {
				Some(_) if !parse_options.read_cover_art => {
					log::trace!("APE: Skipping cover art `{key}`");
				},
				Some(picture_type) => {
					// The image data is preceded by a NUL-terminated description
					let (description, data) = match value.iter().position(|b| *b == 0) {
						Some(nul) => (&value[..nul], &value[nul + 1..]),
						None => (&[][..], value),
					};

					metadata.add_field(
						key,
						FieldValue::Picture(PictureData::new(
							None,
							picture_type as u8,
							decode_with_fallback(description, None),
							data,
							parse_options.max_preview_len,
						)),
					);
				},
				None => metadata.add_field(
					key,
					FieldValue::Binary(BinaryData::new(value, parse_options.max_preview_len, None)),
				),
			}
		},
		2 => {
			let Ok(locator) = std::str::from_utf8(value) else {
				decode_err!(@BAIL Ape, "Failed to convert locator item into a UTF-8 string");
			};

			metadata.add_field(key, FieldValue::Locator(locator.to_owned()));
		},
		_ => {
			if parse_options.parsing_mode == ParsingMode::Strict {
				decode_err!(@BAIL Ape, "APE tag item contains an invalid item type");
			}

			log::warn!("APE: Item `{key}` has a reserved item type, skipping");
		},
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::parse_ape_tag;
	use crate::config::{ParseOptions, ParsingMode};
	use crate::tag::{FieldValue, TagFormat};

	fn item(key: &str, flags: u32, value: &[u8]) -> Vec<u8> {
		let mut item = u32::try_from(value.len()).unwrap().to_le_bytes().to_vec();
		item.extend(flags.to_le_bytes());
		item.extend(key.as_bytes());
		item.push(0);
		item.extend_from_slice(value);
		item
	}

	fn record(size: usize, item_count: u32, flags: u32) -> Vec<u8> {
		let mut record = b"APETAGEX".to_vec();
		record.extend(2000_u32.to_le_bytes());
		record.extend(u32::try_from(size).unwrap().to_le_bytes());
		record.extend(item_count.to_le_bytes());
		record.extend(flags.to_le_bytes());
		record.extend([0; 8]);
		record
	}

	fn footer_only(items: &[Vec<u8>]) -> Vec<u8> {
		let items = items.concat();
		let mut tag = items.clone();
		tag.extend(record(items.len() + 32, 2, 0));
		tag
	}

	#[test_log::test]
	fn header_and_footer() {
		let items = [item("Title", 0, b"Foo"), item("Artist", 0, b"Bar\0Baz")].concat();

		let mut tag = record(items.len() + 32, 2, (1 << 31) | (1 << 29));
		tag.extend(&items);
		tag.extend(record(items.len() + 32, 2, 1 << 31));

		let metadata = parse_ape_tag(&tag, ParseOptions::new()).unwrap();
		assert_eq!(metadata.format(), TagFormat::ApeV2);
		assert_eq!(metadata.get_text("Title"), Some("Foo"));
		assert_eq!(metadata.get_text("Artist"), Some("Bar; Baz"));
	}

	#[test_log::test]
	fn header_without_footer() {
		let items = item("Title", 0, b"Foo");

		let mut tag = record(items.len(), 1, (1 << 31) | (1 << 30) | (1 << 29));
		tag.extend(&items);

		let metadata = parse_ape_tag(&tag, ParseOptions::new()).unwrap();
		assert_eq!(metadata.get_text("Title"), Some("Foo"));
	}

	#[test_log::test]
	fn illegal_keys() {
		let tag = footer_only(&[item("TAG", 0, b"Foo"), item("Title", 0, b"Bar")]);

		let metadata = parse_ape_tag(&tag, ParseOptions::new()).unwrap();
		assert_eq!(metadata.len(), 1);
		assert_eq!(metadata.get_text("Title"), Some("Bar"));

		let strict = ParseOptions::new().parsing_mode(ParsingMode::Strict);
		assert!(parse_ape_tag(&tag, strict).is_err());
	}

	#[test_log::test]
	fn cover_art_and_locator() {
		let mut picture = b"cover.jpg\0".to_vec();
		picture.extend([0xFF, 0xD8, 0xFF, 0xE0]);

		let tag = footer_only(&[
			item("Cover Art (Front)", 1 << 1, &picture),
			item("Related", 2 << 1, b"https://example.com"),
		]);

		let metadata = parse_ape_tag(&tag, ParseOptions::new()).unwrap();

		let FieldValue::Picture(picture) = metadata.get("Cover Art (Front)").unwrap().value() else {
			panic!("Expected a picture");
		};
		assert_eq!(picture.picture_type, 3);
		assert_eq!(picture.description, "cover.jpg");
		assert_eq!(picture.mime_type.as_deref(), Some("image/jpeg"));
		assert_eq!(picture.size, 4);

		assert_eq!(
			metadata.get("Related").unwrap().value(),
			&FieldValue::Locator(String::from("https://example.com"))
		);
	}

	#[test_log::test]
	fn item_overrun() {
		let mut tag = footer_only(&[item("Title", 0, b"Foo"), item("Album", 0, b"Bar")]);
		// Inflate the value size of the first item
		tag[0] = 0xFF;
		assert!(parse_ape_tag(&tag, ParseOptions::new()).is_err());
	}
}
