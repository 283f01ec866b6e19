#![allow(dead_code)]

//! Builders for synthetic files
//!
//! Every builder produces the smallest structure the strategies accept. Sizes are always
//! computed, so a test only has to corrupt the bytes it cares about.

use std::io::{Cursor, Write as _};

use tagscout::config::ParseOptions;
use tagscout::probe::Probe;
use tagscout::registry::Registry;
use tagscout::tag::{Metadata, TagLocation};

pub type MemoryProbe = Probe<Cursor<Vec<u8>>>;

/// Run every strategy over `file`
pub fn detect(file: Vec<u8>) -> (MemoryProbe, Vec<TagLocation>) {
	detect_with(file, ParseOptions::new())
}

pub fn detect_with(file: Vec<u8>, options: ParseOptions) -> (MemoryProbe, Vec<TagLocation>) {
	let mut probe = Probe::new(Cursor::new(file)).unwrap().options(options);
	let locations = probe.detect(&Registry::new());
	(probe, locations)
}

/// Detect, then parse every location
pub fn detect_and_parse(file: Vec<u8>) -> Vec<(TagLocation, Metadata)> {
	let (mut probe, locations) = detect(file);
	let registry = Registry::new();

	locations
		.into_iter()
		.map(|location| {
			let metadata = probe.parse(&registry, &location).unwrap();
			(location, metadata)
		})
		.collect()
}

/// Write `content` to a temporary file on disk
pub fn temp_file(content: &[u8]) -> tempfile::NamedTempFile {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	file.write_all(content).unwrap();
	file.flush().unwrap();
	file
}

pub fn synchsafe(size: u32) -> [u8; 4] {
	[
		((size >> 21) & 0x7F) as u8,
		((size >> 14) & 0x7F) as u8,
		((size >> 7) & 0x7F) as u8,
		(size & 0x7F) as u8,
	]
}

/// An ID3v2.3 frame, with a plain 32-bit size
pub fn id3v2_3_frame(id: &[u8; 4], content: &[u8]) -> Vec<u8> {
	let mut frame = id.to_vec();
	frame.extend((content.len() as u32).to_be_bytes());
	frame.extend([0, 0]);
	frame.extend(content);
	frame
}

/// An ID3v2.4 frame, with a synchsafe size
pub fn id3v2_4_frame(id: &[u8; 4], content: &[u8]) -> Vec<u8> {
	let mut frame = id.to_vec();
	frame.extend(synchsafe(content.len() as u32));
	frame.extend([0, 0]);
	frame.extend(content);
	frame
}

/// A text frame body, in Latin-1
pub fn latin1_text(text: &str) -> Vec<u8> {
	let mut content = vec![0];
	content.extend(text.as_bytes());
	content
}

pub fn id3v2(version: u8, frames: &[Vec<u8>], padding: usize) -> Vec<u8> {
	let body_len = frames.iter().map(Vec::len).sum::<usize>() + padding;

	let mut tag = b"ID3".to_vec();
	tag.extend([version, 0, 0]);
	tag.extend(synchsafe(body_len as u32));
	tag.extend(frames.concat());
	tag.extend(vec![0; padding]);
	tag
}

pub fn id3v1(title: &str, artist: &str, track: Option<u8>) -> Vec<u8> {
	let mut tag = b"TAG".to_vec();
	for (value, len) in [(title, 30), (artist, 30), ("", 30), ("", 4)] {
		let mut field = value.as_bytes().to_vec();
		field.resize(len, 0);
		tag.extend(field);
	}

	let mut comment = vec![0; 30];
	if let Some(track) = track {
		comment[29] = track;
	}

	tag.extend(comment);
	tag.push(255);
	tag
}

pub fn ape_item(key: &str, value: &str) -> Vec<u8> {
	let mut item = (value.len() as u32).to_le_bytes().to_vec();
	item.extend(0_u32.to_le_bytes());
	item.extend(key.as_bytes());
	item.push(0);
	item.extend(value.as_bytes());
	item
}

fn ape_record(version: u32, items: &[Vec<u8>], flags: u32) -> Vec<u8> {
	let size = items.iter().map(Vec::len).sum::<usize>() as u32 + 32;

	let mut record = b"APETAGEX".to_vec();
	record.extend(version.to_le_bytes());
	record.extend(size.to_le_bytes());
	record.extend((items.len() as u32).to_le_bytes());
	record.extend(flags.to_le_bytes());
	record.extend([0; 8]);
	record
}

/// An APE tag with a footer, and optionally a header
pub fn ape(version: u32, items: &[Vec<u8>], with_header: bool) -> Vec<u8> {
	const HAS_HEADER: u32 = 1 << 31;
	const IS_HEADER: u32 = 1 << 29;

	let mut tag = Vec::new();
	let mut footer_flags = 0;
	if with_header {
		tag.extend(ape_record(version, items, HAS_HEADER | IS_HEADER));
		footer_flags = HAS_HEADER;
	}

	tag.extend(items.concat());
	tag.extend(ape_record(version, items, footer_flags));
	tag
}

pub fn lyrics3v2(fields: &[(&str, &str)]) -> Vec<u8> {
	let mut tag = b"LYRICSBEGIN".to_vec();
	for (id, value) in fields {
		tag.extend(id.as_bytes());
		tag.extend(format!("{:05}", value.len()).as_bytes());
		tag.extend(value.as_bytes());
	}

	let size = tag.len();
	tag.extend(format!("{size:06}").as_bytes());
	tag.extend(b"LYRICS200");
	tag
}

pub fn riff_chunk(fourcc: &[u8; 4], content: &[u8]) -> Vec<u8> {
	let mut chunk = fourcc.to_vec();
	chunk.extend((content.len() as u32).to_le_bytes());
	chunk.extend(content);
	if content.len() % 2 != 0 {
		chunk.push(0);
	}

	chunk
}

pub fn riff_info(items: &[(&[u8; 4], &str)]) -> Vec<u8> {
	let mut content = b"INFO".to_vec();
	for (key, value) in items {
		let mut value = value.as_bytes().to_vec();
		value.push(0);
		content.extend(riff_chunk(key, &value));
	}

	riff_chunk(b"LIST", &content)
}

pub fn fmt_chunk() -> Vec<u8> {
	let mut content = 1_u16.to_le_bytes().to_vec();
	content.extend(2_u16.to_le_bytes());
	content.extend(44100_u32.to_le_bytes());
	content.extend(176_400_u32.to_le_bytes());
	content.extend(4_u16.to_le_bytes());
	content.extend(16_u16.to_le_bytes());
	riff_chunk(b"fmt ", &content)
}

pub fn wav(chunks: &[Vec<u8>]) -> Vec<u8> {
	let body = chunks.concat();

	let mut file = b"RIFF".to_vec();
	file.extend((body.len() as u32 + 4).to_le_bytes());
	file.extend(b"WAVE");
	file.extend(body);
	file
}

/// A `bext` chunk of `size` bytes, with a description and no coding history
pub fn bext(size: usize, version: u16) -> Vec<u8> {
	let mut content = vec![0; size];
	content[..11].copy_from_slice(b"Description");
	content[256..266].copy_from_slice(b"Originator");
	if size >= 348 {
		content[346..348].copy_from_slice(&version.to_le_bytes());
	}

	riff_chunk(b"bext", &content)
}

pub fn ogg_page(sequence_number: u32, flags: u8, content: &[u8]) -> Vec<u8> {
	let mut segment_table = vec![255; content.len() / 255];
	segment_table.push((content.len() % 255) as u8);

	let mut page = b"OggS".to_vec();
	page.push(0);
	page.push(flags);
	page.extend(0_u64.to_le_bytes());
	page.extend(1_u32.to_le_bytes());
	page.extend(sequence_number.to_le_bytes());
	page.extend([0; 4]);
	page.push(segment_table.len() as u8);
	page.extend(segment_table);
	page.extend(content);
	page
}

pub fn vorbis_comments(comments: &[&str]) -> Vec<u8> {
	let vendor = b"tagscout";

	let mut content = (vendor.len() as u32).to_le_bytes().to_vec();
	content.extend(vendor);
	content.extend((comments.len() as u32).to_le_bytes());
	for comment in comments {
		content.extend((comment.len() as u32).to_le_bytes());
		content.extend(comment.as_bytes());
	}

	content
}

pub fn ogg_vorbis(comments: &[&str]) -> Vec<u8> {
	let mut identification = b"\x01vorbis".to_vec();
	identification.extend([0; 23]);

	let mut comment_packet = b"\x03vorbis".to_vec();
	comment_packet.extend(vorbis_comments(comments));
	comment_packet.push(1);

	let mut file = ogg_page(0, 0x02, &identification);
	file.extend(ogg_page(1, 0, &comment_packet));
	file.extend(ogg_page(2, 0, &[0; 64]));
	file
}

pub fn flac_block(ty: u8, last: bool, content: &[u8]) -> Vec<u8> {
	let mut block = vec![ty | if last { 0x80 } else { 0 }];
	block.extend(&(content.len() as u32).to_be_bytes()[1..]);
	block.extend(content);
	block
}

pub fn flac(comments: &[&str]) -> Vec<u8> {
	let mut file = b"fLaC".to_vec();
	file.extend(flac_block(0, false, &[0; 34]));
	file.extend(flac_block(4, true, &vorbis_comments(comments)));
	file.extend([0xFF, 0xF8, 0, 0]);
	file
}

pub fn atom(ident: &[u8; 4], content: &[u8]) -> Vec<u8> {
	let mut atom = ((content.len() + 8) as u32).to_be_bytes().to_vec();
	atom.extend(ident);
	atom.extend(content);
	atom
}

pub fn mp4_text_item(ident: &[u8; 4], text: &str) -> Vec<u8> {
	let mut data = 1_u32.to_be_bytes().to_vec();
	data.extend([0; 4]);
	data.extend(text.as_bytes());
	atom(ident, &atom(b"data", &data))
}

pub fn mp4(items: &[Vec<u8>]) -> Vec<u8> {
	let ilst = atom(b"ilst", &items.concat());

	let mut meta = vec![0; 4];
	meta.extend(atom(b"hdlr", &[0; 25]));
	meta.extend(ilst);

	let moov = atom(b"moov", &atom(b"udta", &atom(b"meta", &meta)));

	let mut file = atom(b"ftyp", b"M4A \0\0\0\0M4A mp42isom");
	file.extend(atom(b"mdat", &[0; 32]));
	file.extend(moov);
	file
}

pub fn aiff_chunk(fourcc: &[u8; 4], content: &[u8]) -> Vec<u8> {
	let mut chunk = fourcc.to_vec();
	chunk.extend((content.len() as u32).to_be_bytes());
	chunk.extend(content);
	if content.len() % 2 != 0 {
		chunk.push(0);
	}

	chunk
}

pub fn aiff(chunks: &[Vec<u8>]) -> Vec<u8> {
	let body = chunks.concat();

	let mut file = b"FORM".to_vec();
	file.extend((body.len() as u32 + 4).to_be_bytes());
	file.extend(b"AIFF");
	file.extend(body);
	file
}

/// An EBML element with an 8 octet size
pub fn ebml_element(id: &[u8], content: &[u8]) -> Vec<u8> {
	let mut element = id.to_vec();
	element.push(0x01);
	element.extend(&(content.len() as u64).to_be_bytes()[1..]);
	element.extend(content);
	element
}

pub fn matroska(doc_type: &str, tags: &[(&str, &str)]) -> Vec<u8> {
	let header = ebml_element(
		&[0x1A, 0x45, 0xDF, 0xA3],
		&ebml_element(&[0x42, 0x82], doc_type.as_bytes()),
	);

	let mut simple_tags = Vec::new();
	for (name, value) in tags {
		let mut simple_tag = ebml_element(&[0x45, 0xA3], name.as_bytes());
		simple_tag.extend(ebml_element(&[0x44, 0x87], value.as_bytes()));
		simple_tags.extend(ebml_element(&[0x67, 0xC8], &simple_tag));
	}

	let mut tag = ebml_element(&[0x63, 0xC0], &ebml_element(&[0x68, 0xCA], &[50]));
	tag.extend(simple_tags);

	let tags = ebml_element(&[0x12, 0x54, 0xC3, 0x67], &ebml_element(&[0x73, 0x73], &tag));

	let mut segment_content = ebml_element(&[0x15, 0x49, 0xA9, 0x66], &[0; 16]);
	segment_content.extend(tags);

	let mut file = header;
	file.extend(ebml_element(&[0x18, 0x53, 0x80, 0x67], &segment_content));
	file
}
