//! TrueAudio (TTA) specific items
//!
//! ## File notes
//!
//! TTA has no tag format of its own. A file may start with an ID3v2 tag, and end with an APE tag
//! and/or an ID3v1 tag. This strategy only reports the tags it finds around a valid `TTA1` stream,
//! parsing is left to the ID3v2, APE, and ID3v1 strategies.

use crate::ape;
use crate::error::Result;
use crate::id3::v1::{self, trailing_tag_size};
use crate::id3::v2;
use crate::id3::v2::header::{ID3V2_HEADER_SIZE, Id3v2Header};
use crate::macros::decode_err;
use crate::probe::ScanBuffers;
use crate::tag::TagLocation;
use crate::util::io::FileSource;
use crate::util::num::read_u16_le;

use std::io::{Read, Seek};

const TTA_MARKER: &[u8; 4] = b"TTA1";

/// Signature (4), format (2), channels (2), bits per sample (2), sample rate (4),
/// data length (4), CRC32 (4)
const TTA_HEADER_SIZE: u64 = 22;

// 1 is simple, 2 is encrypted
const VALID_AUDIO_FORMATS: [u16; 2] = [1, 2];

pub(crate) fn can_detect(buffers: &ScanBuffers) -> bool {
	let start = buffers.start();
	if start.starts_with(TTA_MARKER) {
		return true;
	}

	// Only look past an ID3v2 tag that fits in the start window
	let Some(header) = start.get(..ID3V2_HEADER_SIZE as usize) else {
		return false;
	};

	let mut header_bytes = [0; 10];
	header_bytes.copy_from_slice(header);

	let Ok(header) = Id3v2Header::parse(&header_bytes, false) else {
		return false;
	};

	start
		.get(header.full_tag_size() as usize..)
		.is_some_and(|rest| rest.starts_with(TTA_MARKER))
}

pub(crate) fn detect<R>(source: &mut FileSource<R>, buffers: &ScanBuffers) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	log::debug!("Searching for tags around a TTA stream");

	let mut locations = Vec::new();

	let id3v2 = v2::locate_at(source, 0)?;
	let stream_start = id3v2.map_or(0, |location| location.end());
	locations.extend(id3v2);

	verify_stream_header(source, stream_start)?;

	let tags_end = source.len() - trailing_tag_size(buffers.end());
	if let Some(ape) = ape::locate_footer(source, tags_end)? {
		if ape.offset() < stream_start + TTA_HEADER_SIZE {
			log::warn!("APE tag overlaps the TTA header, ignoring it");
		} else {
			locations.push(ape);
		}
	}

	locations.extend(v1::detect(source, buffers)?);

	Ok(locations)
}

fn verify_stream_header<R>(source: &mut FileSource<R>, offset: u64) -> Result<()>
where
	R: Read + Seek,
{
	if !source.contains(offset, TTA_HEADER_SIZE) {
		decode_err!(@BAIL TrueAudio, "File is too small to hold a TTA header");
	}

	let header = source.read_array_at::<22>(offset)?;
	if &header[..4] != TTA_MARKER {
		decode_err!(@BAIL TrueAudio, "File missing the \"TTA1\" signature");
	}

	let audio_format = read_u16_le(&header[4..6]);
	if !VALID_AUDIO_FORMATS.contains(&audio_format) {
		decode_err!(@BAIL TrueAudio, "TTA header has an unknown audio format");
	}

	if read_u16_le(&header[6..8]) == 0 {
		decode_err!(@BAIL TrueAudio, "TTA header has a channel count of 0");
	}

	log::debug!("Found a TTA stream header at {offset}");
	Ok(())
}
