//! ASF (WMA/WMV) specific items
//!
//! ## File notes
//!
//! Every tag lives in the Header Object at the start of the file, spread over four objects:
//!
//! * Content Description: five fixed fields (title, author, copyright, description, rating)
//! * Extended Content Description: any number of typed descriptors
//! * Metadata and Metadata Library: typed records, found inside the Header Extension Object
//!
//! Each object is reported as its own location.
mod guid;
mod object;
mod read;
pub(crate) mod tag;

use crate::config::ParseOptions;
use crate::error::Result;
use crate::macros::err;
use crate::probe::ScanBuffers;
use crate::tag::{Metadata, TagFormat, TagLocation};
use crate::util::io::FileSource;
use guid::Guid;

use std::io::{Read, Seek};

pub(crate) fn can_detect(buffers: &ScanBuffers) -> bool {
	Guid::from_slice(buffers.start()) == Some(Guid::HEADER)
}

pub(crate) fn detect<R>(source: &mut FileSource<R>, _buffers: &ScanBuffers) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	log::debug!("Searching for ASF metadata objects");
	read::find_objects(source)
}

pub(crate) fn parse<R>(
	source: &mut FileSource<R>,
	location: &TagLocation,
	parse_options: ParseOptions,
) -> Result<Metadata>
where
	R: Read + Seek,
{
	let format = location.format();
	let data = source.read_vec_at(location.offset(), location.size())?;

	match format {
		TagFormat::AsfContentDescription => tag::parse_content_description(&data, parse_options),
		TagFormat::AsfExtendedContentDescription => {
			tag::parse_extended_content_description(&data, parse_options)
		},
		TagFormat::AsfMetadata | TagFormat::AsfMetadataLibrary => {
			tag::parse_metadata(&data, format, parse_options)
		},
		_ => err!(UnsupportedFormat(format)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::asf::object::tests::object;
	use crate::asf::tag::tests::{
		content_description, descriptor, extended_content_description, metadata_object,
		utf16_terminated,
	};
	use crate::tag::FieldValue;

	use std::io::Cursor;

	fn header_extension(children: &[Vec<u8>]) -> Vec<u8> {
		// Reserved GUID (16), reserved (2), data size (4)
		let children = children.concat();
		let mut content = vec![0; 18];
		content.extend((children.len() as u32).to_le_bytes());
		content.extend(children);
		object(Guid::HEADER_EXTENSION, &content)
	}

	fn asf_file(children: &[Vec<u8>]) -> Vec<u8> {
		let children = children.concat();

		let mut file = Guid::HEADER.0.to_vec();
		file.extend((children.len() as u64 + 30).to_le_bytes());
		file.extend(0_u32.to_le_bytes());
		file.extend([1, 2]);
		file.extend(children);

		// Data object
		file.extend(object(
			Guid::new(0x75B2_2636, 0x668E, 0x11CF, [0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C]),
			&[0; 50],
		));
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
	fn all_metadata_objects() {
		let content_description = content_description("Title", "Artist");
		let file_properties = object(
			Guid::new(0x8CAB_DCA1, 0xA947, 0x11CF, [0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65]),
			&[0; 80],
		);
		let extended = extended_content_description(&[descriptor(
			"WM/AlbumTitle",
			0,
			&utf16_terminated("Album"),
		)]);
		let metadata = metadata_object(Guid::METADATA, &[("WM/IsCompilation", 2, &[1, 0][..])]);
		let library = metadata_object(
			Guid::METADATA_LIBRARY,
			&[("WM/Genre", 0, &utf16_terminated("Rock")[..])],
		);

		let file = asf_file(&[
			file_properties.clone(),
			content_description.clone(),
			extended.clone(),
			header_extension(&[metadata.clone(), library.clone()]),
		]);

		let (mut source, locations) = scan(file);
		let formats = locations.iter().map(TagLocation::format).collect::<Vec<_>>();
		assert_eq!(
			formats,
			[
				TagFormat::AsfContentDescription,
				TagFormat::AsfExtendedContentDescription,
				TagFormat::AsfMetadata,
				TagFormat::AsfMetadataLibrary,
			]
		);

		assert_eq!(locations[0].offset(), 30 + file_properties.len() as u64);
		assert_eq!(locations[0].size(), content_description.len() as u64);
		assert_eq!(locations[1].size(), extended.len() as u64);
		assert_eq!(locations[2].size(), metadata.len() as u64);
		assert_eq!(locations[3].size(), library.len() as u64);

		let parsed = parse(&mut source, &locations[0], ParseOptions::new()).unwrap();
		assert_eq!(parsed.get_text("Author"), Some("Artist"));

		let parsed = parse(&mut source, &locations[1], ParseOptions::new()).unwrap();
		assert_eq!(parsed.get_text("WM/AlbumTitle"), Some("Album"));

		let parsed = parse(&mut source, &locations[2], ParseOptions::new()).unwrap();
		assert_eq!(
			parsed.get("WM/IsCompilation").map(|field| field.value()),
			Some(&FieldValue::Boolean(true))
		);

		let parsed = parse(&mut source, &locations[3], ParseOptions::new()).unwrap();
		assert_eq!(parsed.get_text("WM/Genre"), Some("Rock"));
	}

	#[test_log::test]
	fn broken_object_keeps_earlier_locations() {
		let mut broken = object(Guid::METADATA, &[0; 4]);
		broken[16..24].copy_from_slice(&10_u64.to_le_bytes());

		let file = asf_file(&[content_description("Title", ""), broken]);

		let (_, locations) = scan(file);
		assert_eq!(locations.len(), 1);
		assert_eq!(locations[0].format(), TagFormat::AsfContentDescription);
	}

	#[test_log::test]
	fn not_asf() {
		let mut source = FileSource::new(Cursor::new(vec![0; 64])).unwrap();
		let buffers = ScanBuffers::read(&mut source).unwrap();
		assert!(!can_detect(&buffers));
		assert!(detect(&mut source, &buffers).is_err());
	}
}
