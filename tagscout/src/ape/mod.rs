//! APE items
//!
//! ## Locations
//!
//! An APE tag is bounded by a 32 byte header and/or footer, both starting with `APETAGEX`.
//!
//! * APEv1 tags only have a footer, and are found at the end of the file.
//! * APEv2 tags normally have both, and are found at the end of the file. A header-only APEv2 tag
//!   at the start of the file is also accepted.
//!
//! A tag at the end of the file may be followed by an ID3v1 tag, and a Lyrics3 tag may sit
//! between the two.
pub mod constants;
pub(crate) mod header;
pub(crate) mod read;

use crate::config::ParseOptions;
use crate::error::{ErrorKind, Result};
use crate::id3::v1::trailing_tag_size;
use crate::lyrics3;
use crate::macros::decode_err;
use crate::probe::ScanBuffers;
use crate::tag::{Metadata, TagLocation};
use crate::util::io::FileSource;
use constants::{APE_HEADER_SIZE, APE_PREAMBLE};
use header::ApeHeader;

use std::io::{Read, Seek};

pub(crate) fn can_detect(buffers: &ScanBuffers) -> bool {
	buffers.start().starts_with(APE_PREAMBLE)
		|| buffers
			.end()
			.windows(APE_PREAMBLE.len())
			.any(|window| window == APE_PREAMBLE)
}

pub(crate) fn detect<R>(source: &mut FileSource<R>, buffers: &ScanBuffers) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	log::debug!("Searching for an APE tag");

	let mut locations = Vec::new();

	if buffers.start().starts_with(APE_PREAMBLE) {
		if let Some(location) = locate_header(source, 0)? {
			locations.push(location);
		}
	}

	let tags_end = source.len() - trailing_tag_size(buffers.end());
	let mut footer_location = locate_footer(source, tags_end)?;

	// Lyrics3 is stored between APE and ID3v1
	if footer_location.is_none() {
		if let Some(lyrics) = lyrics3::locate_before(source, tags_end)? {
			log::debug!("Skipping a Lyrics3 tag while searching for an APE footer");
			footer_location = locate_footer(source, lyrics.offset())?;
		}
	}

	if let Some(location) = footer_location {
		if !locations.contains(&location) {
			locations.push(location);
		}
	}

	Ok(locations)
}

/// Locate an APE tag that starts with a header at `offset`
pub(crate) fn locate_header<R>(source: &mut FileSource<R>, offset: u64) -> Result<Option<TagLocation>>
where
	R: Read + Seek,
{
	let Some(header) = read_record(source, offset)? else {
		return Ok(None);
	};

	if !header.is_header() {
		log::warn!("Expected an APE header at {offset}, found a footer");
		return Ok(None);
	}

	let size = APE_HEADER_SIZE + u64::from(header.size);
	log::debug!("Found an APE header at {offset}, tag size: {size}");

	TagLocation::new(header.format(), offset, size, source.len()).map(Some)
}

/// Locate an APE tag whose footer ends at `end`
pub(crate) fn locate_footer<R>(source: &mut FileSource<R>, end: u64) -> Result<Option<TagLocation>>
where
	R: Read + Seek,
{
	let Some(footer_offset) = end.checked_sub(APE_HEADER_SIZE) else {
		return Ok(None);
	};

	let Some(footer) = read_record(source, footer_offset)? else {
		return Ok(None);
	};

	if footer.is_header() {
		log::warn!("Expected an APE footer at {footer_offset}, found a header");
		return Ok(None);
	}

	let Some(items_start) = footer_offset.checked_sub(u64::from(footer.items_size()?)) else {
		decode_err!(@BAIL Ape, "APE tag size exceeds the file size");
	};

	// The header is optional, and only APEv2 can have one
	let mut start = items_start;
	if footer.has_header() {
		if let Some(header_offset) = items_start.checked_sub(APE_HEADER_SIZE) {
			if &source.read_array_at::<8>(header_offset)? == APE_PREAMBLE {
				start = header_offset;
			} else {
				log::warn!("APE footer claims a header, but none was found");
			}
		}
	}

	log::debug!(
		"Found an APE footer at {footer_offset}, tag starts at {start}, version: {}",
		footer.version
	);

	TagLocation::new(footer.format(), start, end - start, source.len()).map(Some)
}

fn read_record<R>(source: &mut FileSource<R>, offset: u64) -> Result<Option<ApeHeader>>
where
	R: Read + Seek,
{
	if !source.contains(offset, APE_HEADER_SIZE) {
		return Ok(None);
	}

	let record = source.read_array_at::<32>(offset)?;
	match ApeHeader::parse(&record) {
		Ok(header) => Ok(Some(header)),
		Err(err) if matches!(err.kind(), ErrorKind::FakeTag) => Ok(None),
		Err(err) => Err(err),
	}
}

pub(crate) fn parse<R>(
	source: &mut FileSource<R>,
	location: &TagLocation,
	options: ParseOptions,
) -> Result<Metadata>
where
	R: Read + Seek,
{
	let tag = source.read_vec_at(location.offset(), location.size())?;
	read::parse_ape_tag(&tag, options)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tag::TagFormat;

	use std::io::Cursor;

	fn record(version: u32, size: u32, flags: u32) -> Vec<u8> {
		let mut record = b"APETAGEX".to_vec();
		record.extend(version.to_le_bytes());
		record.extend(size.to_le_bytes());
		record.extend(1_u32.to_le_bytes());
		record.extend(flags.to_le_bytes());
		record.extend([0; 8]);
		record
	}

	fn title_item() -> Vec<u8> {
		let mut item = 4_u32.to_le_bytes().to_vec();
		item.extend(0_u32.to_le_bytes());
		item.extend(b"Title\0Test");
		item
	}

	fn scan(file: Vec<u8>) -> (FileSource<Cursor<Vec<u8>>>, Vec<TagLocation>) {
		let mut source = FileSource::new(Cursor::new(file)).unwrap();
		let buffers = ScanBuffers::read(&mut source).unwrap();
		assert!(can_detect(&buffers));

		let locations = detect(&mut source, &buffers).unwrap();
		(source, locations)
	}

	#[test_log::test]
	fn footer_with_items_only_size() {
		let item = title_item();

		let mut file = vec![0; 100];
		file.extend(&item);
		file.extend(record(2000, item.len() as u32, 1 << 30));

		let (mut source, locations) = scan(file);
		assert_eq!(locations.len(), 1);
		assert_eq!(locations[0].format(), TagFormat::ApeV2);
		assert_eq!(locations[0].offset(), 100);
		assert_eq!(locations[0].size(), item.len() as u64 + 32);

		let metadata = parse(&mut source, &locations[0], ParseOptions::new()).unwrap();
		assert_eq!(metadata.len(), 1);
		assert_eq!(metadata.get_text("Title"), Some("Test"));
	}

	#[test_log::test]
	fn header_footer_and_id3v1() {
		let item = title_item();
		let size = item.len() as u32 + 32;

		let mut file = vec![0; 50];
		file.extend(record(2000, size, (1 << 31) | (1 << 29)));
		file.extend(&item);
		file.extend(record(2000, size, 1 << 31));
		file.extend(b"TAG");
		file.extend([0; 125]);

		let (_, locations) = scan(file);
		assert_eq!(locations.len(), 1);
		assert_eq!(locations[0].offset(), 50);
		assert_eq!(locations[0].size(), u64::from(size) + 32);
	}

	#[test_log::test]
	fn header_at_start() {
		let item = title_item();

		let mut file = record(2000, item.len() as u32, (1 << 31) | (1 << 30) | (1 << 29));
		file.extend(&item);
		file.extend([0; 64]);

		let (mut source, locations) = scan(file);
		assert_eq!(locations.len(), 1);
		assert_eq!(locations[0].offset(), 0);
		assert_eq!(locations[0].size(), item.len() as u64 + 32);

		let metadata = parse(&mut source, &locations[0], ParseOptions::new()).unwrap();
		assert_eq!(metadata.get_text("Title"), Some("Test"));
	}

	#[test_log::test]
	fn footer_before_lyrics3() {
		let item = title_item();

		let mut file = vec![0; 20];
		file.extend(&item);
		file.extend(record(1000, item.len() as u32 + 32, 0));
		file.extend(b"LYRICSBEGINHello");
		file.extend(b"LYRICSEND");

		let (_, locations) = scan(file);
		assert_eq!(locations.len(), 1);
		assert_eq!(locations[0].format(), TagFormat::ApeV1);
		assert_eq!(locations[0].offset(), 20);
	}

	#[test_log::test]
	fn unknown_version_is_rejected() {
		let item = title_item();

		let mut file = item.clone();
		file.extend(record(3000, item.len() as u32, 1 << 30));

		let mut source = FileSource::new(Cursor::new(file)).unwrap();
		let buffers = ScanBuffers::read(&mut source).unwrap();
		assert!(detect(&mut source, &buffers).is_err());
	}
}
