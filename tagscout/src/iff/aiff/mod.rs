//! AIFF specific items
//!
//! ## Locations
//!
//! * The `NAME`, `AUTH`, `(c) `, `ANNO`, and `COMT` chunks are reported together as
//!   [`TagFormat::AiffText`], spanning the first through the last of them
//! * `ID3 ` or `id3 ` chunks hold a complete ID3v2 tag
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
	read::verify_aiff(buffers.start()).is_ok()
}

pub(crate) fn detect<R>(
	source: &mut FileSource<R>,
	_buffers: &ScanBuffers,
	parse_options: ParseOptions,
) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	log::debug!("Searching for AIFF tag chunks");
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
	if location.format() != TagFormat::AiffText {
		err!(UnsupportedFormat(location.format()));
	}

	let data = source.read_vec_at(location.offset(), location.size())?;
	tag::parse_text_chunks(&data, parse_options)
}
