use crate::error::Result;
use crate::id3;
use crate::macros::decode_err;
use crate::probe::ScanBuffers;
use crate::tag::TagLocation;
use crate::util::io::FileSource;
use crate::util::num::read_u64_le;

use std::io::{Read, Seek};

const DSF_MAGIC: &[u8; 4] = b"DSD ";

/// The size of the `DSD ` chunk, which is always 28 bytes
const HEADER_SIZE: u64 = 28;

// "DSD " (4) + chunk size (8) + file size (8)
const METADATA_POINTER_OFFSET: usize = 20;

pub(crate) fn can_detect(buffers: &ScanBuffers) -> bool {
	let start = buffers.start();
	start.len() >= HEADER_SIZE as usize
		&& start.starts_with(DSF_MAGIC)
		&& read_u64_le(&start[4..12]) == HEADER_SIZE
}

pub(crate) fn detect<R>(source: &mut FileSource<R>, buffers: &ScanBuffers) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	if !can_detect(buffers) {
		decode_err!(@BAIL Dsf, "File doesn't start with a DSF header");
	}

	let start = buffers.start();
	let metadata_pointer = read_u64_le(&start[METADATA_POINTER_OFFSET..METADATA_POINTER_OFFSET + 8]);

	// A pointer of 0 means there's no metadata chunk
	if metadata_pointer == 0 {
		log::debug!("DSF file has no metadata pointer");
		return Ok(Vec::new());
	}

	if metadata_pointer < HEADER_SIZE || metadata_pointer >= source.len() {
		log::warn!("DSF metadata pointer ({metadata_pointer}) is outside of the file, ignoring it");
		return Ok(Vec::new());
	}

	log::debug!("DSF metadata pointer: {metadata_pointer}");

	match id3::v2::locate_at(source, metadata_pointer)? {
		Some(location) => Ok(vec![location]),
		None => {
			log::warn!("DSF metadata pointer doesn't point to an ID3v2 tag");
			Ok(Vec::new())
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tag::TagFormat;

	use std::io::Cursor;

	fn id3v2_tag() -> Vec<u8> {
		let mut tag = b"ID3\x03\x00\x00\x00\x00\x00\x10".to_vec();
		tag.extend(b"TIT2\x00\x00\x00\x06\x00\x00\x00Hello");
		tag
	}

	/// A DSF file with empty `fmt ` and `data` chunks, followed by `tag`
	fn dsf_file(tag: Option<&[u8]>) -> Vec<u8> {
		let mut file = DSF_MAGIC.to_vec();
		file.extend(HEADER_SIZE.to_le_bytes());
		// File size and metadata pointer, filled in below
		file.extend([0; 16]);

		file.extend(b"fmt ");
		file.extend(52_u64.to_le_bytes());
		file.extend([0; 40]);
		file.extend(b"data");
		file.extend(16_u64.to_le_bytes());
		file.extend([0; 4]);

		if let Some(tag) = tag {
			let pointer = file.len() as u64;
			set_pointer(&mut file, pointer);
			file.extend(tag);
		}

		let file_len = file.len() as u64;
		file[12..20].copy_from_slice(&file_len.to_le_bytes());
		file
	}

	fn set_pointer(file: &mut [u8], pointer: u64) {
		file[METADATA_POINTER_OFFSET..METADATA_POINTER_OFFSET + 8].copy_from_slice(&pointer.to_le_bytes());
	}

	fn scan(file: Vec<u8>) -> Vec<TagLocation> {
		let mut source = FileSource::new(Cursor::new(file)).unwrap();
		let buffers = ScanBuffers::read(&mut source).unwrap();
		assert!(can_detect(&buffers));

		detect(&mut source, &buffers).unwrap()
	}

	#[test_log::test]
	fn metadata_pointer() {
		let locations = scan(dsf_file(Some(&id3v2_tag())));
		assert_eq!(locations.len(), 1);
		assert_eq!(locations[0].format(), TagFormat::Id3v2_3);
		assert_eq!(locations[0].offset(), 28 + 52 + 16);
		assert_eq!(locations[0].size(), 26);
	}

	#[test_log::test]
	fn no_metadata() {
		assert!(scan(dsf_file(None)).is_empty());

		// The pointer leads to something other than an ID3v2 tag
		assert!(scan(dsf_file(Some(b"not a tag at all"))).is_empty());
	}

	#[test_log::test]
	fn pointer_past_eof() {
		let mut file = dsf_file(None);
		set_pointer(&mut file, u64::MAX);
		assert!(scan(file).is_empty());
	}
}
