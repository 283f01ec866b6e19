#![allow(missing_docs)]

mod util;

use util::{
	ape, ape_item, bext, detect, detect_and_parse, detect_with, flac, fmt_chunk, id3v1, id3v2,
	id3v2_3_frame, latin1_text, lyrics3v2, matroska, mp4, mp4_text_item, ogg_vorbis, riff_chunk,
	riff_info, wav,
};

use std::io::Cursor;

use tagscout::config::{ParseOptions, ParsingMode};
use tagscout::error::ErrorKind;
use tagscout::probe::Probe;
use tagscout::registry::Registry;
use tagscout::tag::{FieldValue, TagFormat};

#[test_log::test]
fn id3v2_text_frame() {
	let tag = id3v2(3, &[id3v2_3_frame(b"TIT2", &latin1_text("Hello"))], 7);

	let (mut probe, locations) =
		detect_with(tag, ParseOptions::new().parsing_mode(ParsingMode::Strict));
	let metadata = probe.parse(&Registry::new(), &locations[0]).unwrap();

	assert_eq!(metadata.format(), TagFormat::Id3v2_3);
	assert_eq!(metadata.len(), 1);
	assert_eq!(metadata.get_text("TIT2"), Some("Hello"));
}

#[test_log::test]
fn ape_title() {
	let mut file = vec![0; 256];
	file.extend(ape(2000, &[ape_item("Title", "Test")], false));

	let (mut probe, locations) = detect(file.clone());
	assert_eq!(locations.len(), 1);
	assert_eq!(locations[0].format(), TagFormat::ApeV2);

	let registry = Registry::new();
	let metadata = probe.parse(&registry, &locations[0]).unwrap();
	assert_eq!(metadata.get_text("Title"), Some("Test"));

	// Same bytes, unknown version
	let footer_version = file.len() - 32 + 8;
	file[footer_version..footer_version + 4].copy_from_slice(&3000_u32.to_le_bytes());

	let mut probe = Probe::new(Cursor::new(file)).unwrap();
	assert!(probe.parse(&registry, &locations[0]).is_err());
}

#[test_log::test]
fn id3v1_fields() {
	let mut file = vec![0; 64];
	file.extend(id3v1("Title", "Artist", Some(3)));

	let parsed = detect_and_parse(file);
	assert_eq!(parsed.len(), 1);

	let (location, metadata) = &parsed[0];
	assert_eq!(location.format(), TagFormat::Id3v1_1);
	assert_eq!(metadata.get_text("Title"), Some("Title"));
	assert_eq!(metadata.get_text("Artist"), Some("Artist"));
	assert_eq!(metadata.get("Track").unwrap().value().to_string(), "3");

	// Empty fields are dropped
	assert!(metadata.get("Album").is_none());
}

#[test_log::test]
fn lyrics3v2_fields() {
	let mut file = vec![0; 64];
	file.extend(lyrics3v2(&[("IND", "00"), ("ETT", "Title"), ("LYR", "La la la")]));
	file.extend(id3v1("", "", None));

	let parsed = detect_and_parse(file);
	let (_, metadata) = parsed
		.iter()
		.find(|(location, _)| location.format() == TagFormat::Lyrics3v2)
		.unwrap();

	assert_eq!(metadata.get_text("ETT"), Some("Title"));
	assert_eq!(metadata.get_text("LYR"), Some("La la la"));
}

#[test_log::test]
fn repeated_vorbis_comments_are_joined() {
	for file in [ogg_vorbis(&["ARTIST=A", "artist=B"]), flac(&["ARTIST=A", "artist=B"])] {
		let parsed = detect_and_parse(file);
		assert_eq!(parsed.len(), 1);

		let (location, metadata) = &parsed[0];
		assert_eq!(location.format(), TagFormat::VorbisComments);
		assert_eq!(metadata.get_text("ARTIST"), Some("A; B"));
	}
}

#[test_log::test]
fn vorbis_number_pairs() {
	let parsed = detect_and_parse(flac(&["TRACKNUMBER=5/10"]));
	let (_, metadata) = &parsed[0];

	assert_eq!(
		metadata.get("TRACKNUMBER").unwrap().value(),
		&FieldValue::NumberPair {
			current: 5,
			total: Some(10)
		}
	);
}

#[test_log::test]
fn riff_info_list() {
	let file = wav(&[
		fmt_chunk(),
		riff_info(&[(b"IART", "Artist"), (b"ICMT", "Comment")]),
		riff_chunk(b"data", &[0; 16]),
	]);

	let parsed = detect_and_parse(file);
	assert_eq!(parsed.len(), 1);

	let (_, metadata) = &parsed[0];
	assert_eq!(metadata.format(), TagFormat::RiffInfo);
	assert_eq!(metadata.get_text("IART"), Some("Artist"));
	assert_eq!(metadata.get_text("ICMT"), Some("Comment"));
}

#[test_log::test]
fn bwf_minimum_size() {
	// One byte short of a version 0 chunk
	let file = wav(&[fmt_chunk(), bext(601, 0), riff_chunk(b"data", &[0; 16])]);
	let (_, locations) = detect(file);
	assert!(locations.is_empty());

	let file = wav(&[fmt_chunk(), bext(602, 0), riff_chunk(b"data", &[0; 16])]);
	let parsed = detect_and_parse(file);
	assert_eq!(parsed.len(), 1);

	let (location, metadata) = &parsed[0];
	assert_eq!(location.format(), TagFormat::BwfV0);
	assert_eq!(metadata.get_text("Description"), Some("Description"));
	assert_eq!(metadata.get_text("Originator"), Some("Originator"));
}

#[test_log::test]
fn bwf_version() {
	let file = wav(&[fmt_chunk(), bext(602, 2), riff_chunk(b"data", &[0; 16])]);

	let parsed = detect_and_parse(file);
	let (location, metadata) = &parsed[0];
	assert_eq!(location.format(), TagFormat::BwfV2);
	assert_eq!(
		metadata.get("Version").unwrap().value(),
		&FieldValue::Integer(2)
	);
}

#[test_log::test]
fn mp4_items() {
	let file = mp4(&[
		mp4_text_item(b"\xA9nam", "Title"),
		mp4_text_item(b"\xA9ART", "Artist"),
	]);

	let parsed = detect_and_parse(file);
	let (_, metadata) = &parsed[0];
	assert_eq!(metadata.get_text("\u{a9}nam"), Some("Title"));
	assert_eq!(metadata.get_text("\u{a9}ART"), Some("Artist"));
}

#[test_log::test]
fn matroska_simple_tags() {
	let parsed = detect_and_parse(matroska("matroska", &[("TITLE", "Title"), ("ARTIST", "Artist")]));
	assert_eq!(parsed.len(), 1);

	let (_, metadata) = &parsed[0];
	assert_eq!(metadata.format(), TagFormat::Matroska);
	assert_eq!(metadata.get_text("TITLE"), Some("Title"));
	assert_eq!(metadata.get_text("ARTIST"), Some("Artist"));
}

fn utf16(text: &str) -> Vec<u8> {
	text.encode_utf16()
		.chain(std::iter::once(0))
		.flat_map(u16::to_le_bytes)
		.collect()
}

fn asf_object(guid: [u8; 16], content: &[u8]) -> Vec<u8> {
	let mut object = guid.to_vec();
	object.extend((content.len() as u64 + 24).to_le_bytes());
	object.extend(content);
	object
}

#[test_log::test]
fn asf_content_description() {
	const HEADER: [u8; 16] = [
		0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE,
		0x6C,
	];
	const CONTENT_DESCRIPTION: [u8; 16] = [
		0x33, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE,
		0x6C,
	];

	let title = utf16("Title");
	let author = utf16("Author");

	let mut content = Vec::new();
	for len in [title.len(), author.len(), 0, 0, 0] {
		content.extend((len as u16).to_le_bytes());
	}
	content.extend(&title);
	content.extend(&author);
	let content_description = asf_object(CONTENT_DESCRIPTION, &content);

	let mut header_content = 1_u32.to_le_bytes().to_vec();
	header_content.extend([1, 2]);
	header_content.extend(&content_description);

	let mut file = asf_object(HEADER, &header_content);
	file.extend([0; 64]);

	let parsed = detect_and_parse(file);
	assert_eq!(parsed.len(), 1);

	let (location, metadata) = &parsed[0];
	assert_eq!(location.format(), TagFormat::AsfContentDescription);
	assert_eq!(location.offset(), 30);
	assert_eq!(location.size(), content_description.len() as u64);
	assert_eq!(metadata.get_text("Title"), Some("Title"));
	assert_eq!(metadata.get_text("Author"), Some("Author"));
}

#[test_log::test]
fn unregistered_format() {
	let mut file = vec![0; 64];
	file.extend(id3v1("Title", "", None));

	let (mut probe, locations) = detect(file);

	let registry = Registry::with_strategies(&[tagscout::registry::Strategy::Ape]);
	let err = probe.parse(&registry, &locations[0]).unwrap_err();
	assert!(matches!(err.kind(), ErrorKind::UnsupportedFormat(TagFormat::Id3v1)));
}
