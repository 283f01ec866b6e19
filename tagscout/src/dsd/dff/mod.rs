mod read;
pub(crate) mod tag;

use crate::config::ParseOptions;
use crate::error::Result;
use crate::macros::err;
use crate::probe::ScanBuffers;
use crate::tag::{Metadata, TagFormat, TagLocation};
use crate::util::io::FileSource;

use std::io::{Read, Seek};

pub(crate) fn can_detect(buffers: &ScanBuffers) -> bool {
	read::verify_dff(buffers.start()).is_ok()
}

pub(crate) fn detect<R>(source: &mut FileSource<R>, _buffers: &ScanBuffers) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	log::debug!("Searching for DFF tag chunks");
	read::find_tag_chunks(source)
}

pub(crate) fn parse<R>(
	source: &mut FileSource<R>,
	location: &TagLocation,
	parse_options: ParseOptions,
) -> Result<Metadata>
where
	R: Read + Seek,
{
	if location.format() != TagFormat::DffText {
		err!(UnsupportedFormat(location.format()));
	}

	let data = source.read_vec_at(location.offset(), location.size())?;
	tag::parse_text_chunks(&data, parse_options)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dsd::dff::tag::tests::{comt, dff_chunk, diin};

	use std::io::Cursor;

	fn dff_file(chunks: &[Vec<u8>]) -> Vec<u8> {
		let body = chunks.concat();

		let mut file = b"FRM8".to_vec();
		file.extend((body.len() as u64 + 4).to_be_bytes());
		file.extend(b"DSD ");
		file.extend(body);
		file
	}

	fn scan(file: Vec<u8>) -> (FileSource<Cursor<Vec<u8>>>, Vec<TagLocation>) {
		let mut source = FileSource::new(Cursor::new(file)).unwrap();
		let buffers = ScanBuffers::read(&mut source).unwrap();
		assert!(can_detect(&buffers));

		let locations = detect(&mut source, &buffers).unwrap();
		(source, locations)
	}

	#[test_log::test]
	fn text_chunks_and_id3v2() {
		let mut id3v2 = b"ID3\x04\x00\x00\x00\x00\x00\x10".to_vec();
		id3v2.extend(b"TIT2\x00\x00\x00\x06\x00\x00\x03Hello");

		let fver = dff_chunk(b"FVER", &[1, 5, 0, 0]);
		let diin = diin("Title", "Artist");
		let dsd = dff_chunk(b"DSD ", &[0x69; 64]);
		let comt = comt(&["Recorded live"]);

		let file = dff_file(&[
			fver.clone(),
			diin.clone(),
			dsd.clone(),
			comt.clone(),
			dff_chunk(b"ID3 ", &id3v2),
		]);

		let (mut source, locations) = scan(file);
		assert_eq!(locations.len(), 2);

		assert_eq!(locations[0].format(), TagFormat::Id3v2_4);

		assert_eq!(locations[1].format(), TagFormat::DffText);
		assert_eq!(locations[1].offset(), 16 + fver.len() as u64);
		assert_eq!(
			locations[1].size(),
			(diin.len() + dsd.len() + comt.len()) as u64
		);

		let metadata = parse(&mut source, &locations[1], ParseOptions::new()).unwrap();
		assert_eq!(metadata.get_text("DITI"), Some("Title"));
		assert_eq!(metadata.get_text("DIAR"), Some("Artist"));
		assert_eq!(metadata.get_text("COMT"), Some("Recorded live"));
	}

	#[test_log::test]
	fn no_tags() {
		let file = dff_file(&[dff_chunk(b"FVER", &[1, 5, 0, 0])]);
		let (_, locations) = scan(file);
		assert!(locations.is_empty());
	}
}
