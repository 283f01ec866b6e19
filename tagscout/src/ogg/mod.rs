//! Items for OGG container formats
//!
//! ## File notes
//!
//! The only tag format is Vorbis Comments, stored in the second header packet of a Vorbis or Opus
//! stream. That packet always starts on the second page, but may span any number of pages.
pub(crate) mod page;
pub(crate) mod read;

use crate::config::ParseOptions;
use crate::error::Result;
use crate::macros::decode_err;
use crate::probe::ScanBuffers;
use crate::tag::{Metadata, TagFormat, TagLocation};
use crate::util::io::FileSource;
use page::{OGG_PAGE_MARKER, PAGE_HEADER_SIZE, PacketSpan, PageHeader};
use read::Framing;

use std::io::{Read, Seek};

// https://xiph.org/vorbis/doc/Vorbis_I_spec.html#x1-620004.2.1
pub(crate) const VORBIS_IDENT_HEAD: &[u8] = &[1, 118, 111, 114, 98, 105, 115];
pub(crate) const VORBIS_COMMENT_HEAD: &[u8] = &[3, 118, 111, 114, 98, 105, 115];

// https://datatracker.ietf.org/doc/pdf/rfc7845.pdf#section-5.1
pub(crate) const OPUSHEAD: &[u8] = &[79, 112, 117, 115, 72, 101, 97, 100];
pub(crate) const OPUSTAGS: &[u8] = &[79, 112, 117, 115, 84, 97, 103, 115];

/// A codec that stores Vorbis Comments in its header packets
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Codec {
	Vorbis,
	Opus,
}

impl Codec {
	fn from_identification(packet: &[u8]) -> Option<Self> {
		if packet.starts_with(VORBIS_IDENT_HEAD) {
			Some(Self::Vorbis)
		} else if packet.starts_with(OPUSHEAD) {
			Some(Self::Opus)
		} else {
			None
		}
	}

	fn from_comment(packet: &[u8]) -> Option<Self> {
		if packet.starts_with(VORBIS_COMMENT_HEAD) {
			Some(Self::Vorbis)
		} else if packet.starts_with(OPUSTAGS) {
			Some(Self::Opus)
		} else {
			None
		}
	}

	fn comment_signature(self) -> &'static [u8] {
		match self {
			Self::Vorbis => VORBIS_COMMENT_HEAD,
			Self::Opus => OPUSTAGS,
		}
	}

	fn framing(self) -> Framing {
		match self {
			Self::Vorbis => Framing::Expected,
			Self::Opus => Framing::Absent,
		}
	}
}

pub(crate) fn can_detect(buffers: &ScanBuffers) -> bool {
	let start = buffers.start();
	if !start.starts_with(OGG_PAGE_MARKER) || start.len() <= PAGE_HEADER_SIZE as usize {
		return false;
	}

	// The identification packet follows the segment table of the first page
	let content_start = PAGE_HEADER_SIZE as usize + usize::from(start[26]);
	start
		.get(content_start..)
		.and_then(Codec::from_identification)
		.is_some()
}

pub(crate) fn detect<R>(
	source: &mut FileSource<R>,
	_buffers: &ScanBuffers,
	parse_options: ParseOptions,
) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	log::debug!("Searching for an Ogg comment header");

	let first_page = PageHeader::read(source, 0)?;
	let (identification_len, _) = first_page.first_packet_len();
	let signature_len = (identification_len.min(8)) as usize;

	let mut signature = [0; 8];
	source.read_at(first_page.content_start(), &mut signature[..signature_len])?;

	let Some(codec) = Codec::from_identification(&signature[..signature_len]) else {
		decode_err!(@BAIL Ogg, "Stream doesn't start with a Vorbis or Opus identification header");
	};

	log::debug!("Found an Ogg {codec:?} stream");

	let comment_page = match comment_page_direct(source, &first_page, codec) {
		Some(offset) => offset,
		None => {
			log::warn!("Ogg comment header is not on the second page, searching sequentially");
			match comment_page_search(source, codec, parse_options.max_ogg_pages) {
				Some(offset) => offset,
				None => {
					log::warn!(
						"No comment header found in the first {} pages",
						parse_options.max_ogg_pages
					);
					return Ok(Vec::new());
				},
			}
		},
	};

	let span = PacketSpan::locate(source, comment_page)?;
	log::debug!(
		"Found an Ogg comment header at {comment_page}, packet size: {}",
		span.len()
	);

	Ok(vec![TagLocation::new(
		TagFormat::VorbisComments,
		comment_page,
		span.end - comment_page,
		source.len(),
	)?])
}

/// Jump straight to the page after the identification header
fn comment_page_direct<R>(source: &mut FileSource<R>, first_page: &PageHeader, codec: Codec) -> Option<u64>
where
	R: Read + Seek,
{
	// The identification header must be alone on the first page
	let (identification_len, complete) = first_page.first_packet_len();
	if !complete || identification_len != first_page.content_len() {
		return None;
	}

	let offset = first_page.end();
	starts_comment_packet(source, offset, codec).then_some(offset)
}

/// Walk the pages in order until one starts with the comment header
fn comment_page_search<R>(source: &mut FileSource<R>, codec: Codec, max_pages: usize) -> Option<u64>
where
	R: Read + Seek,
{
	let mut offset = 0;
	for _ in 0..max_pages {
		let page = PageHeader::read(source, offset).ok()?;
		if !page.is_continuation() && starts_comment_packet(source, offset, codec) {
			return Some(offset);
		}

		offset = page.end();
	}

	None
}

fn starts_comment_packet<R>(source: &mut FileSource<R>, page_offset: u64, codec: Codec) -> bool
where
	R: Read + Seek,
{
	let Ok(page) = PageHeader::read(source, page_offset) else {
		return false;
	};

	if page.is_continuation() {
		return false;
	}

	let signature = codec.comment_signature();
	let mut content = [0; 8];
	let content = &mut content[..signature.len()];

	page.content_len() >= signature.len() as u64
		&& source.read_at(page.content_start(), content).is_ok()
		&& content == signature
}

pub(crate) fn parse<R>(
	source: &mut FileSource<R>,
	location: &TagLocation,
	parse_options: ParseOptions,
) -> Result<Metadata>
where
	R: Read + Seek,
{
	let span = PacketSpan::locate(source, location.offset())?;
	if span.end != location.end() {
		decode_err!(@BAIL Ogg, "Comment packet doesn't match the located span");
	}

	let packet = span.read(source)?;
	let Some(codec) = Codec::from_comment(&packet) else {
		decode_err!(@BAIL Ogg, "File missing magic signature");
	};

	read::read_comments(
		&packet[codec.comment_signature().len()..],
		codec.framing(),
		parse_options,
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ogg::page::tests::page;
	use crate::ogg::read::tests::comments;

	use std::io::Cursor;

	fn vorbis_file(comment_packet: &[u8]) -> Vec<u8> {
		let mut identification = VORBIS_IDENT_HEAD.to_vec();
		identification.extend([0; 23]);

		let mut file = page(0, 0x02, &identification, true);
		file.extend(page(1, 0, comment_packet, true));
		file.extend(page(2, 0, &[0; 40], true));
		file
	}

	fn scan(file: Vec<u8>) -> (FileSource<Cursor<Vec<u8>>>, Vec<TagLocation>) {
		let mut source = FileSource::new(Cursor::new(file)).unwrap();
		let buffers = ScanBuffers::read(&mut source).unwrap();
		assert!(can_detect(&buffers));

		let locations = detect(&mut source, &buffers, ParseOptions::new()).unwrap();
		(source, locations)
	}

	#[test_log::test]
	fn vorbis_comment_header() {
		let mut packet = VORBIS_COMMENT_HEAD.to_vec();
		packet.extend(comments("tagscout", &[b"ARTIST=A", b"ARTIST=B"], true));

		let (mut source, locations) = scan(vorbis_file(&packet));
		assert_eq!(locations.len(), 1);
		assert_eq!(locations[0].offset(), 27 + 1 + 30);
		assert_eq!(locations[0].size(), 27 + 1 + packet.len() as u64);

		let metadata = parse(&mut source, &locations[0], ParseOptions::new()).unwrap();
		assert_eq!(metadata.get_text("ARTIST"), Some("A; B"));
	}

	#[test_log::test]
	fn opus_tags() {
		let mut identification = OPUSHEAD.to_vec();
		identification.extend([1, 2, 0, 0, 0x80, 0xBB, 0, 0, 0, 0, 0]);

		let mut packet = OPUSTAGS.to_vec();
		packet.extend(comments("libopus", &[b"TITLE=Song"], false));

		let mut file = page(0, 0x02, &identification, true);
		file.extend(page(1, 0, &packet, true));

		let (mut source, locations) = scan(file);
		assert_eq!(locations.len(), 1);

		let metadata = parse(&mut source, &locations[0], ParseOptions::new()).unwrap();
		assert_eq!(metadata.get_text("TITLE"), Some("Song"));
	}

	#[test_log::test]
	fn sequential_fallback() {
		let mut identification = VORBIS_IDENT_HEAD.to_vec();
		identification.extend([0; 23]);

		let mut packet = VORBIS_COMMENT_HEAD.to_vec();
		packet.extend(comments("", &[b"TITLE=Song"], true));

		// A stray page sits between the identification and comment headers
		let mut file = page(0, 0x02, &identification, true);
		let stray_page = page(1, 0, &[0; 10], true);
		let comment_offset = (file.len() + stray_page.len()) as u64;
		file.extend(stray_page);
		file.extend(page(2, 0, &packet, true));

		let (_, locations) = scan(file.clone());
		assert_eq!(locations.len(), 1);
		assert_eq!(locations[0].offset(), comment_offset);

		// Not reachable within the page limit
		let mut source = FileSource::new(Cursor::new(file)).unwrap();
		let buffers = ScanBuffers::read(&mut source).unwrap();
		let options = ParseOptions::new().max_ogg_pages(2);
		assert!(detect(&mut source, &buffers, options).unwrap().is_empty());
	}

	#[test_log::test]
	fn comment_header_across_pages() {
		let mut packet = VORBIS_COMMENT_HEAD.to_vec();
		let long_value = format!("DESCRIPTION={}", "a".repeat(600));
		packet.extend(comments("", &[long_value.as_bytes()], true));

		// Split the packet at a lacing boundary
		let (first, second) = packet.split_at(510);

		let mut identification = VORBIS_IDENT_HEAD.to_vec();
		identification.extend([0; 23]);

		let mut file = page(0, 0x02, &identification, true);
		file.extend(page(1, 0, first, false));
		file.extend(page(2, 0x01, second, true));
		let file_len = file.len() as u64;

		let (mut source, locations) = scan(file);
		assert_eq!(locations[0].end(), file_len);

		let metadata = parse(&mut source, &locations[0], ParseOptions::new()).unwrap();
		assert_eq!(metadata.get_text("DESCRIPTION").map(str::len), Some(600));
	}
}
