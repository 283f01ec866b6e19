//! Items for FLAC
//!
//! ## File notes
//!
//! The stream marker (`fLaC`) is followed by a chain of metadata blocks, the first of which must
//! be `STREAMINFO`. Vorbis Comments are stored in block type 4. A FLAC file may also start with an
//! ID3v2 tag, which is reported by the ID3v2 strategy.
pub(crate) mod block;

use crate::config::ParseOptions;
use crate::error::Result;
use crate::id3::v2;
use crate::macros::decode_err;
use crate::ogg::read::{Framing, read_comments};
use crate::probe::ScanBuffers;
use crate::tag::{Metadata, TagFormat, TagLocation};
use crate::util::io::FileSource;
use block::{BLOCK_HEADER_SIZE, BLOCK_ID_PICTURE, BLOCK_ID_STREAMINFO, BLOCK_ID_VORBIS_COMMENTS, Block};

use std::io::{Read, Seek};

const FLAC_MARKER: &[u8; 4] = b"fLaC";

pub(crate) fn can_detect(buffers: &ScanBuffers) -> bool {
	let start = buffers.start();
	if start.starts_with(FLAC_MARKER) {
		return true;
	}

	// The marker may be pushed out of the start window by a large ID3v2 tag, leave that to `detect`
	start.starts_with(b"ID3")
}

/// Find the `fLaC` marker, stepping over an ID3v2 tag
fn find_stream_marker<R>(source: &mut FileSource<R>) -> Result<Option<u64>>
where
	R: Read + Seek,
{
	let marker_offset = match v2::locate_at(source, 0)? {
		Some(id3v2) => {
			log::warn!("Encountered an ID3v2 tag before the FLAC stream marker");
			id3v2.end()
		},
		None => 0,
	};

	if !source.contains(marker_offset, FLAC_MARKER.len() as u64)
		|| &source.read_array_at::<4>(marker_offset)? != FLAC_MARKER
	{
		return Ok(None);
	}

	Ok(Some(marker_offset))
}

pub(crate) fn detect<R>(source: &mut FileSource<R>, _buffers: &ScanBuffers) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	log::debug!("Searching for a FLAC Vorbis Comments block");

	let Some(marker_offset) = find_stream_marker(source)? else {
		return Ok(Vec::new());
	};

	let stream_info = Block::read(source, marker_offset + FLAC_MARKER.len() as u64)?;
	if stream_info.ty != BLOCK_ID_STREAMINFO {
		decode_err!(@BAIL Flac, "File missing mandatory STREAMINFO block");
	}

	if stream_info.size < 18 {
		decode_err!(@BAIL Flac, "File has an invalid STREAMINFO block size (< 18)");
	}

	let mut locations = Vec::new();

	let mut block = stream_info;
	while !block.last {
		block = match Block::read(source, block.end()) {
			Ok(block) => block,
			Err(e) => {
				log::warn!("Stopping at a damaged metadata block: {e}");
				break;
			},
		};

		match block.ty {
			BLOCK_ID_VORBIS_COMMENTS => {
				log::debug!("Found a Vorbis Comments block at {}", block.start);

				if !locations.is_empty() {
					log::warn!("Found multiple Vorbis Comments blocks");
				}

				locations.push(TagLocation::new(
					TagFormat::VorbisComments,
					block.start,
					block.len(),
					source.len(),
				)?);
			},
			BLOCK_ID_PICTURE => log::trace!("Skipping a PICTURE block at {}", block.start),
			127 => decode_err!(@BAIL Flac, "Encountered an invalid metadata block type"),
			_ => {},
		}
	}

	Ok(locations)
}

pub(crate) fn parse<R>(
	source: &mut FileSource<R>,
	location: &TagLocation,
	parse_options: ParseOptions,
) -> Result<Metadata>
where
	R: Read + Seek,
{
	let block = Block::read(source, location.offset())?;
	if block.ty != BLOCK_ID_VORBIS_COMMENTS || block.len() != location.size() {
		decode_err!(@BAIL Flac, "Location is not a Vorbis Comments block");
	}

	let content = source.read_vec_at(block.content_start(), location.size() - BLOCK_HEADER_SIZE)?;
	read_comments(&content, Framing::Absent, parse_options)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ogg::read::tests::comments;

	use std::io::Cursor;

	fn block(ty: u8, last: bool, content: &[u8]) -> Vec<u8> {
		let mut block = vec![ty | if last { 0x80 } else { 0 }];
		block.extend(&(content.len() as u32).to_be_bytes()[1..]);
		block.extend(content);
		block
	}

	fn flac_file(prefix: &[u8]) -> (Vec<u8>, u64) {
		let mut file = prefix.to_vec();
		file.extend(b"fLaC");
		file.extend(block(BLOCK_ID_STREAMINFO, false, &[0; 34]));
		file.extend(block(BLOCK_ID_PICTURE, false, &[0; 50]));

		let comments_offset = file.len() as u64;
		file.extend(block(
			BLOCK_ID_VORBIS_COMMENTS,
			false,
			&comments("reference libFLAC 1.4.3", &[b"ARTIST=A", b"ARTIST=B"], false),
		));
		file.extend(block(1, true, &[0; 16]));
		file.extend([0xFF, 0xF8, 0, 0]);

		(file, comments_offset)
	}

	fn scan(file: Vec<u8>) -> (FileSource<Cursor<Vec<u8>>>, Vec<TagLocation>) {
		let mut source = FileSource::new(Cursor::new(file)).unwrap();
		let buffers = ScanBuffers::read(&mut source).unwrap();
		assert!(can_detect(&buffers));

		let locations = detect(&mut source, &buffers).unwrap();
		(source, locations)
	}

	#[test_log::test]
	fn vorbis_comments_block() {
		let (file, comments_offset) = flac_file(&[]);

		let (mut source, locations) = scan(file);
		assert_eq!(locations.len(), 1);
		assert_eq!(locations[0].offset(), comments_offset);

		let metadata = parse(&mut source, &locations[0], ParseOptions::new()).unwrap();
		assert_eq!(metadata.get_text("ARTIST"), Some("A; B"));
	}

	#[test_log::test]
	fn after_id3v2() {
		let mut id3v2 = b"ID3\x03\x00\x00\x00\x00\x00\x0A".to_vec();
		id3v2.extend([0; 10]);

		let (file, comments_offset) = flac_file(&id3v2);
		let (_, locations) = scan(file);
		assert_eq!(locations.len(), 1);
		assert_eq!(locations[0].offset(), comments_offset);
	}

	#[test_log::test]
	fn missing_stream_info() {
		let mut file = b"fLaC".to_vec();
		file.extend(block(BLOCK_ID_VORBIS_COMMENTS, true, &[0; 8]));

		let mut source = FileSource::new(Cursor::new(file)).unwrap();
		let buffers = ScanBuffers::read(&mut source).unwrap();
		assert!(detect(&mut source, &buffers).is_err());
	}

	#[test_log::test]
	fn truncated_block_chain() {
		let (mut file, _) = flac_file(&[]);
		// Cut the file inside the padding block
		file.truncate(file.len() - 10);

		// The blocks before the damage are still reported
		let (_, locations) = scan(file);
		assert_eq!(locations.len(), 1);
	}
}
