#![allow(missing_docs)]

mod util;

use util::{
	ape, ape_item, detect, detect_with, flac, fmt_chunk, id3v1, id3v2, id3v2_3_frame, latin1_text,
	riff_chunk, riff_info, synchsafe, wav,
};

use std::io::Cursor;

use tagscout::config::{ParseOptions, ParsingMode};
use tagscout::probe::Probe;
use tagscout::registry::Registry;
use tagscout::tag::TagFormat;

fn wav_with_garbage(garbage_len: usize) -> (Vec<u8>, u64) {
	let mut garbage = vec![0xFF; 8];
	garbage.extend(vec![0xEE; garbage_len]);

	let list_offset = (12 + fmt_chunk().len() + garbage.len()) as u64;
	let file = wav(&[
		fmt_chunk(),
		garbage,
		riff_info(&[(b"INAM", "Title")]),
		riff_chunk(b"data", &[0; 16]),
	]);

	(file, list_offset)
}

#[test_log::test]
fn wav_resync_after_garbage() {
	let (file, list_offset) = wav_with_garbage(200);

	let (mut probe, locations) = detect(file);
	assert_eq!(locations.len(), 1);
	assert_eq!(locations[0].format(), TagFormat::RiffInfo);
	assert_eq!(locations[0].offset(), list_offset);

	let metadata = probe.parse(&Registry::new(), &locations[0]).unwrap();
	assert_eq!(metadata.get_text("INAM"), Some("Title"));
}

#[test_log::test]
fn wav_resync_window() {
	let (file, _) = wav_with_garbage(200);

	let (_, locations) = detect_with(file, ParseOptions::new().resync_window(64));
	assert!(locations.is_empty());
}

#[test_log::test]
fn truncated_id3v2_keeps_id3v1() {
	// Claims far more than the file holds
	let mut file = b"ID3\x03\x00\x00".to_vec();
	file.extend(synchsafe(100_000));
	file.extend(id3v2_3_frame(b"TIT2", &latin1_text("Hello")));
	file.extend([0; 64]);
	file.extend(id3v1("Title", "", None));

	let (_, locations) = detect(file);
	assert_eq!(locations.len(), 1);
	assert_eq!(locations[0].format(), TagFormat::Id3v1);
}

#[test_log::test]
fn oversized_ape_footer_keeps_id3v1() {
	let mut tag = ape(2000, &[ape_item("Title", "Test")], false);

	// Footer size field
	let size_offset = tag.len() - 32 + 12;
	tag[size_offset..size_offset + 4].copy_from_slice(&100_000_u32.to_le_bytes());

	let mut file = vec![0; 16];
	file.extend(tag);
	file.extend(id3v1("Title", "", None));

	let (_, locations) = detect(file);
	assert_eq!(locations.len(), 1);
	assert_eq!(locations[0].format(), TagFormat::Id3v1);
}

#[test_log::test]
fn damaged_chunk_keeps_other_tags() {
	// An `id3 ` chunk that holds no ID3v2 tag
	let file = wav(&[
		fmt_chunk(),
		riff_chunk(b"id3 ", b"not a tag!"),
		riff_info(&[(b"IART", "Artist")]),
		riff_chunk(b"data", &[0; 16]),
	]);

	let (_, locations) = detect(file);
	assert_eq!(locations.len(), 1);
	assert_eq!(locations[0].format(), TagFormat::RiffInfo);
}

#[test_log::test]
fn id3v2_overrunning_its_chunk() {
	let tag = id3v2(3, &[id3v2_3_frame(b"TIT2", &latin1_text("Hello"))], 7);

	// Chunk is smaller than the tag it holds
	let mut chunk = riff_chunk(b"id3 ", &tag);
	chunk[4..8].copy_from_slice(&16_u32.to_le_bytes());
	chunk.truncate(8 + 16);

	let file = wav(&[
		fmt_chunk(),
		chunk,
		riff_info(&[(b"IART", "Artist")]),
		riff_chunk(b"data", &[0; 16]),
	]);

	let (_, locations) = detect(file);
	assert_eq!(locations.len(), 1);
	assert_eq!(locations[0].format(), TagFormat::RiffInfo);
}

#[test_log::test]
fn strict_and_best_attempt() {
	let file = flac(&["TITLE=Title", "NOSEPARATOR", "ARTIST=Artist"]);
	let registry = Registry::new();

	let (mut probe, locations) = detect(file.clone());
	let metadata = probe.parse(&registry, &locations[0]).unwrap();
	assert_eq!(metadata.len(), 2);
	assert_eq!(metadata.get_text("ARTIST"), Some("Artist"));

	let (mut probe, locations) =
		detect_with(file, ParseOptions::new().parsing_mode(ParsingMode::Strict));
	assert_eq!(locations.len(), 1);
	assert!(probe.parse(&registry, &locations[0]).is_err());
}

#[test_log::test]
fn stale_location() {
	let mut file = vec![0; 64];
	file.extend(id3v1("Title", "", None));

	let (_, locations) = detect(file.clone());
	assert_eq!(locations.len(), 1);

	// The file shrank after detection
	file.truncate(100);

	let mut probe = Probe::new(Cursor::new(file)).unwrap();
	assert!(probe.parse(&Registry::new(), &locations[0]).is_err());
}

#[test_log::test]
fn noise() {
	// A deterministic byte soup that happens to carry a few signatures
	let mut file = Vec::with_capacity(8192);
	let mut state = 0x2545_F491_u32;
	for _ in 0..8192 {
		state ^= state << 13;
		state ^= state >> 17;
		state ^= state << 5;
		file.push(state as u8);
	}

	file[..4].copy_from_slice(b"RIFF");
	file[8..12].copy_from_slice(b"WAVE");
	file[4000..4008].copy_from_slice(b"APETAGEX");
	let tag_offset = file.len() - 128;
	file[tag_offset..tag_offset + 3].copy_from_slice(b"TAG");

	let (mut probe, locations) = detect(file);

	let registry = Registry::new();
	for location in locations {
		let _ = probe.parse(&registry, &location);
	}
}
