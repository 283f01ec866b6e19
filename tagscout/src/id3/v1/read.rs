use super::constants::{ID3V1_TAG_MARKER, genre_name};
use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::err;
use crate::tag::{FieldValue, Metadata, TagFormat};
use crate::util::text::decode_with_fallback;

pub(crate) fn parse_id3v1(
	reader: &[u8; 128],
	format: TagFormat,
	parse_mode: ParsingMode,
) -> Result<Metadata> {
	if reader[..3] != ID3V1_TAG_MARKER {
		err!(FakeTag);
	}

	let mut metadata = Metadata::new(format);
	let reader = &reader[3..];

	if let Some(title) = decode_text(&reader[..30]) {
		metadata.add_text("Title", title);
	}
	if let Some(artist) = decode_text(&reader[30..60]) {
		metadata.add_text("Artist", artist);
	}
	if let Some(album) = decode_text(&reader[60..90]) {
		metadata.add_text("Album", album);
	}

	if let Some(year) = try_parse_year(&reader[90..94], parse_mode)? {
		metadata.add_text("Year", year.to_string());
	}

	// Determine the range of the comment (30 bytes for ID3v1 and 28 for ID3v1.1)
	// We check for the null terminator 28 bytes in, and for a non-zero track number after it.
	// A track number of 0 is invalid.
	let is_v1_1 = reader[122] == 0 && reader[123] != 0;
	if is_v1_1 != (format == TagFormat::Id3v1_1) {
		log::warn!("ID3v1 revision doesn't match the located format, using the tag contents");
	}

	let comment_range = if is_v1_1 { 94_usize..122 } else { 94..124 };
	if let Some(comment) = decode_text(&reader[comment_range]) {
		metadata.add_text("Comment", comment);
	}

	if is_v1_1 {
		metadata.add_field("Track", FieldValue::Integer(i64::from(reader[123])));
	}

	match genre_name(usize::from(reader[124])) {
		Some(genre) => metadata.add_text("Genre", genre.to_string()),
		None if reader[124] != 255 => log::warn!("ID3v1 genre index {} is unknown", reader[124]),
		None => {},
	}

	Ok(metadata)
}

fn decode_text(data: &[u8]) -> Option<String> {
	let mut first_null_pos = data.len();
	if let Some(null_pos) = data.iter().position(|&b| b == 0) {
		if null_pos == 0 {
			return None;
		}

		if data[null_pos..].iter().any(|b| *b != b'\0') {
			log::warn!("ID3v1 text field contains trailing junk, skipping");
		}

		first_null_pos = null_pos;
	}

	let text = decode_with_fallback(&data[..first_null_pos], None);
	let text = text.trim_end_matches(' ');
	(!text.is_empty()).then(|| text.to_string())
}

fn try_parse_year(input: &[u8], parse_mode: ParsingMode) -> Result<Option<u16>> {
	let (num_digits, year) = input
		.iter()
		.take_while(|c| (**c).is_ascii_digit())
		.fold((0usize, 0u16), |(num_digits, year), c| {
			(num_digits + 1, year * 10 + u16::from(*c - b'0'))
		});
	if num_digits != 4 {
		// Most taggers write "\0\0\0\0" for empty years, rather than "0000"
		if parse_mode == ParsingMode::Strict && input.iter().any(|b| *b != 0) {
			err!(TextDecode(
				"ID3v1 year field contains non-ASCII digit characters"
			));
		}

		return Ok(None);
	}

	Ok(Some(year))
}

#[cfg(test)]
mod tests {
	use super::parse_id3v1;
	use crate::config::ParsingMode;
	use crate::tag::{FieldValue, TagFormat};

	fn build_tag(track: u8) -> [u8; 128] {
		let mut tag = [0; 128];
		tag[..3].copy_from_slice(b"TAG");
		tag[3..8].copy_from_slice(b"Title");
		tag[33..39].copy_from_slice(b"Artist");
		tag[93..97].copy_from_slice(b"1999");
		tag[97..104].copy_from_slice(b"Comment");
		tag[126] = track;
		tag[127] = 17;
		tag
	}

	#[test_log::test]
	fn id3v1_1_track_number() {
		let metadata = parse_id3v1(&build_tag(5), TagFormat::Id3v1_1, ParsingMode::Strict).unwrap();

		assert_eq!(metadata.get_text("Title"), Some("Title"));
		assert_eq!(metadata.get_text("Artist"), Some("Artist"));
		assert_eq!(metadata.get_text("Year"), Some("1999"));
		assert_eq!(metadata.get_text("Comment"), Some("Comment"));
		assert_eq!(metadata.get_text("Genre"), Some("Rock"));
		assert_eq!(
			metadata.get("Track").unwrap().value(),
			&FieldValue::NumberPair {
				current: 5,
				total: None
			}
		);
	}

	#[test_log::test]
	fn id3v1_without_track() {
		let metadata = parse_id3v1(&build_tag(0), TagFormat::Id3v1, ParsingMode::Strict).unwrap();
		assert!(metadata.get("Track").is_none());
		assert!(metadata.get("Album").is_none());
	}

	#[test_log::test]
	fn bad_year() {
		let mut tag = build_tag(0);
		tag[93..97].copy_from_slice(b"19x9");

		assert!(parse_id3v1(&tag, TagFormat::Id3v1, ParsingMode::Strict).is_err());

		let metadata = parse_id3v1(&tag, TagFormat::Id3v1, ParsingMode::BestAttempt).unwrap();
		assert!(metadata.get("Year").is_none());
	}
}
