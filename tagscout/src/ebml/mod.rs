//! Matroska and WebM (EBML) specific items
//!
//! ## Locations
//!
//! Tags are stored in `Tags` elements, direct children of the `Segment`. Each `Tags` element is
//! reported as its own location, with the format taken from the `DocType` in the EBML header.
//!
//! ## Keys
//!
//! * Nested `SimpleTag`s are keyed by their path, `PARENT.CHILD`
//! * Tags with a `TargetTypeValue` other than 50 (the default) are prefixed with it, `30:TITLE`
pub(crate) mod element_reader;
mod read;
pub(crate) mod tag;
pub(crate) mod vint;

use crate::config::ParseOptions;
use crate::error::Result;
use crate::macros::err;
use crate::probe::ScanBuffers;
use crate::tag::{Metadata, TagFormat, TagLocation};
use crate::util::io::FileSource;
use element_reader::EBML_HEADER_ID;

use std::io::{Read, Seek};

pub(crate) fn can_detect(buffers: &ScanBuffers) -> bool {
	buffers.start().starts_with(&(EBML_HEADER_ID as u32).to_be_bytes())
}

pub(crate) fn detect<R>(source: &mut FileSource<R>, buffers: &ScanBuffers) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	log::debug!("Searching for Matroska Tags elements");
	read::find_tags(source, buffers)
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
	if !matches!(format, TagFormat::Matroska | TagFormat::WebM) {
		err!(UnsupportedFormat(format));
	}

	let data = source.read_vec_at(location.offset(), location.size())?;
	tag::parse_tags(&data, format, parse_options)
}
