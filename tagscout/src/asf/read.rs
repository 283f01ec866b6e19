use super::guid::Guid;
use super::object::{ObjectHeader, Objects};
use crate::error::Result;
use crate::macros::decode_err;
use crate::tag::{TagFormat, TagLocation};
use crate::util::io::FileSource;
use crate::util::num::read_u64_le;

use std::io::{Read, Seek};

/// GUID (16) + size (8) + object count (4) + reserved (2)
const HEADER_OBJECT_SIZE: u64 = 30;

/// Object header (24) + reserved GUID (16) + reserved (2) + data size (4)
const HEADER_EXTENSION_SIZE: u64 = 46;

pub(super) fn find_objects<R>(source: &mut FileSource<R>) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	let file_len = source.len();
	if file_len < HEADER_OBJECT_SIZE {
		decode_err!(@BAIL Asf, "File is too small to hold a header object");
	}

	let header = source.read_array_at::<30>(0)?;
	if Guid::from_slice(&header) != Some(Guid::HEADER) {
		decode_err!(@BAIL Asf, "File doesn't start with a header object");
	}

	let mut header_end = read_u64_le(&header[16..24]);
	if header_end < HEADER_OBJECT_SIZE {
		decode_err!(@BAIL Asf, "Header object has an invalid size");
	}

	if header_end > file_len {
		log::warn!("Header object extends past the end of the file, it may be truncated");
		header_end = file_len;
	}

	let mut locations = Vec::new();

	let mut objects = Objects::new(HEADER_OBJECT_SIZE, header_end);
	loop {
		let object = match objects.next(source) {
			Ok(Some(object)) => object,
			Ok(None) => break,
			Err(e) => {
				log::warn!("Header object walk failed, stopping: {e}");
				break;
			},
		};

		match object.guid {
			Guid::CONTENT_DESCRIPTION => {
				locations.push(location(TagFormat::AsfContentDescription, &object, file_len)?);
			},
			Guid::EXTENDED_CONTENT_DESCRIPTION => {
				locations.push(location(
					TagFormat::AsfExtendedContentDescription,
					&object,
					file_len,
				)?);
			},
			Guid::HEADER_EXTENSION => {
				find_extension_objects(source, &object, &mut locations)?;
			},
			_ => {},
		}
	}

	Ok(locations)
}

/// The Metadata and Metadata Library objects live in the Header Extension object
fn find_extension_objects<R>(
	source: &mut FileSource<R>,
	extension: &ObjectHeader,
	locations: &mut Vec<TagLocation>,
) -> Result<()>
where
	R: Read + Seek,
{
	if extension.size < HEADER_EXTENSION_SIZE {
		log::warn!("Header extension object is too small, skipping it");
		return Ok(());
	}

	let file_len = source.len();

	let mut objects = Objects::new(extension.start + HEADER_EXTENSION_SIZE, extension.end());
	loop {
		let object = match objects.next(source) {
			Ok(Some(object)) => object,
			Ok(None) => break,
			Err(e) => {
				log::warn!("Header extension walk failed, stopping: {e}");
				break;
			},
		};

		let format = match object.guid {
			Guid::METADATA => TagFormat::AsfMetadata,
			Guid::METADATA_LIBRARY => TagFormat::AsfMetadataLibrary,
			_ => continue,
		};

		locations.push(location(format, &object, file_len)?);
	}

	Ok(())
}

fn location(format: TagFormat, object: &ObjectHeader, file_len: u64) -> Result<TagLocation> {
	log::debug!(
		"Found an ASF {} object at {}, size: {}",
		format.name(),
		object.start,
		object.size
	);

	TagLocation::new(format, object.start, object.size, file_len)
}
