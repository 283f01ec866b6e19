//! WAV specific items
//!
//! ## Locations
//!
//! Tags are stored in top-level RIFF chunks:
//!
//! * `LIST` chunks of type `INFO` ([`TagFormat::RiffInfo`])
//! * `bext` chunks ([`TagFormat::BwfV0`] and later), along with the `cue `, `levl`, `iXML`,
//!   `axml`, and `link` chunks that immediately follow them
//! * `ID3 ` or `id3 ` chunks, which hold a complete ID3v2 tag
//!
//! A corrupt chunk header is recovered from by searching ahead for the next known chunk identifier.
pub(crate) mod bwf;
pub(crate) mod read;
pub(crate) mod tag;

use crate::config::ParseOptions;
use crate::error::Result;
use crate::macros::err;
use crate::probe::ScanBuffers;
use crate::tag::{Metadata, TagFormat, TagLocation};
use crate::util::io::FileSource;

use std::io::{Read, Seek};

pub(crate) fn can_detect(buffers: &ScanBuffers) -> bool {
	read::verify_wav(buffers.start()).is_ok()
}

pub(crate) fn detect<R>(
	source: &mut FileSource<R>,
	_buffers: &ScanBuffers,
	parse_options: ParseOptions,
) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	log::debug!("Searching for WAV tag chunks");
	read::find_tag_chunks(source, parse_options)
}

pub(crate) fn parse<R>(
	source: &mut FileSource<R>,
	location: &TagLocation,
	parse_options: ParseOptions,
) -> Result<Metadata>
where
	R: Read + Seek,
{
	let chunk = source.read_vec_at(location.offset(), location.size())?;
	match location.format() {
		TagFormat::RiffInfo => tag::parse_riff_info(&chunk, parse_options),
		format if format.is_bwf() => bwf::parse_bext(&chunk, parse_options),
		format => err!(UnsupportedFormat(format)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::iff::chunk::tests::riff_chunk;
	use crate::iff::wav::bwf::tests::bext;
	use crate::iff::wav::tag::tests::info_list;

	use std::io::Cursor;

	fn wav_file(chunks: &[Vec<u8>]) -> Vec<u8> {
		let body = chunks.concat();

		let mut file = b"RIFF".to_vec();
		file.extend((body.len() as u32 + 4).to_le_bytes());
		file.extend(b"WAVE");
		file.extend(body);
		file
	}

	fn fmt() -> Vec<u8> {
		riff_chunk(b"fmt ", &[0; 16])
	}

	fn id3v2_tag() -> Vec<u8> {
		let mut tag = b"ID3\x03\x00\x00\x00\x00\x00\x10".to_vec();
		tag.extend(b"TIT2\x00\x00\x00\x06\x00\x00\x00Hello");
		tag
	}

	fn scan(file: Vec<u8>) -> (FileSource<Cursor<Vec<u8>>>, Vec<TagLocation>) {
		let mut source = FileSource::new(Cursor::new(file)).unwrap();
		let buffers = ScanBuffers::read(&mut source).unwrap();
		assert!(can_detect(&buffers));

		let locations = detect(&mut source, &buffers, ParseOptions::new()).unwrap();
		(source, locations)
	}

	#[test_log::test]
	fn riff_info_and_id3v2() {
		let list = info_list(&[(b"INAM", b"Title\0"), (b"IART", b"Art")]);
		let file = wav_file(&[
			fmt(),
			list.clone(),
			riff_chunk(b"data", &[0; 100]),
			riff_chunk(b"id3 ", &id3v2_tag()),
		]);

		let (mut source, locations) = scan(file);
		assert_eq!(locations.len(), 2);

		assert_eq!(locations[0].format(), TagFormat::RiffInfo);
		assert_eq!(locations[0].offset(), 12 + 24);
		assert_eq!(locations[0].size(), list.len() as u64);

		assert_eq!(locations[1].format(), TagFormat::Id3v2_3);
		assert_eq!(locations[1].size(), id3v2_tag().len() as u64);

		let metadata = parse(&mut source, &locations[0], ParseOptions::new()).unwrap();
		assert_eq!(metadata.get_text("INAM"), Some("Title"));
		assert_eq!(metadata.get_text("IART"), Some("Art"));

		assert!(parse(&mut source, &locations[1], ParseOptions::new()).is_err());
	}

	#[test_log::test]
	fn bext_minimum_size() {
		let file = wav_file(&[fmt(), bext(0, 601, "")]);
		let (_, locations) = scan(file);
		assert!(locations.is_empty());

		let file = wav_file(&[fmt(), bext(0, 602, "")]);
		let (mut source, locations) = scan(file);
		assert_eq!(locations.len(), 1);
		assert_eq!(locations[0].format(), TagFormat::BwfV0);
		assert_eq!(locations[0].size(), 8 + 602);
		assert!(parse(&mut source, &locations[0], ParseOptions::new()).is_ok());
	}

	#[test_log::test]
	fn bext_extension_chunks() {
		let bext = bext(2, 602, "A=PCM");
		let ixml = riff_chunk(b"iXML", b"<BWFXML/>");

		let file = wav_file(&[
			fmt(),
			bext.clone(),
			ixml.clone(),
			riff_chunk(b"data", &[0; 10]),
		]);

		let (mut source, locations) = scan(file);
		assert_eq!(locations.len(), 1);
		assert_eq!(locations[0].format(), TagFormat::BwfV2);
		// The pad byte of the last extension chunk isn't included
		assert_eq!(
			locations[0].size(),
			(bext.len() + ixml.len()) as u64 - 1
		);

		let metadata = parse(&mut source, &locations[0], ParseOptions::new()).unwrap();
		assert_eq!(metadata.get_text("iXML"), Some("<BWFXML/>"));
		assert_eq!(metadata.get_text("CodingHistory"), Some("A=PCM"));
	}

	#[test_log::test]
	fn resync_after_garbage() {
		let list = info_list(&[(b"INAM", b"Title\0")]);

		let mut garbage = vec![0xFE, 0xFF, 0x80, 0x81];
		garbage.extend(0x7FFF_FFF0_u32.to_le_bytes());
		garbage.extend([0xEE; 192]);

		let file = wav_file(&[fmt(), garbage.clone(), list.clone()]);
		let list_offset = (12 + 24 + garbage.len()) as u64;

		let (_, locations) = scan(file);
		assert_eq!(locations.len(), 1);
		assert_eq!(locations[0].offset(), list_offset);
		assert_eq!(locations[0].size(), list.len() as u64);

		// Unreachable within the window
		let file = wav_file(&[fmt(), garbage, list]);
		let mut source = FileSource::new(Cursor::new(file)).unwrap();
		let buffers = ScanBuffers::read(&mut source).unwrap();
		let options = ParseOptions::new().resync_window(64);
		assert!(detect(&mut source, &buffers, options).unwrap().is_empty());
	}

	#[test_log::test]
	fn not_wave() {
		let mut file = wav_file(&[fmt()]);
		file[8..12].copy_from_slice(b"AVI ");

		let mut source = FileSource::new(Cursor::new(file)).unwrap();
		let buffers = ScanBuffers::read(&mut source).unwrap();
		assert!(!can_detect(&buffers));
		assert!(detect(&mut source, &buffers, ParseOptions::new()).is_err());
	}
}
