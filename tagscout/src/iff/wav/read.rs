use super::bwf::{BEXT_EXTENSION_CHUNKS, BEXT_MIN_SIZE, BEXT_VERSION_OFFSET, bwf_format};
use crate::config::ParseOptions;
use crate::error::Result;
use crate::id3;
use crate::iff::chunk::{Chunk, Chunks};
use crate::macros::decode_err;
use crate::tag::{TagFormat, TagLocation};
use crate::util::io::FileSource;

use std::io::{Read, Seek};

use byteorder::LittleEndian;

// RIFF (4) + size (4) + WAVE (4)
const RIFF_HEADER_SIZE: u64 = 12;

/// Chunk identifiers a resynchronization can land on
const KNOWN_CHUNKS: [&[u8; 4]; 19] = [
	b"LIST", b"bext", b"fmt ", b"data", b"fact", b"id3 ", b"ID3 ", b"JUNK", b"junk", b"PAD ",
	b"cue ", b"levl", b"iXML", b"axml", b"link", b"smpl", b"inst", b"ds64", b"PEAK",
];

pub(crate) fn verify_wav(header: &[u8]) -> Result<()> {
	if !header.starts_with(b"RIFF") {
		decode_err!(@BAIL Wav, "WAV file doesn't contain a RIFF chunk");
	}

	if header.get(8..12) != Some(b"WAVE") {
		decode_err!(@BAIL Wav, "Found RIFF file, format is not WAVE");
	}

	Ok(())
}

/// Walk the top-level chunks, reporting every tag chunk
pub(super) fn find_tag_chunks<R>(
	source: &mut FileSource<R>,
	parse_options: ParseOptions,
) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	let file_len = source.len();

	let header = source.read_vec_clamped(0, RIFF_HEADER_SIZE)?;
	verify_wav(&header)?;

	let mut riff_end = 8 + u64::from(crate::util::num::read_u32_le(&header[4..8]));
	if riff_end > file_len || riff_end < RIFF_HEADER_SIZE {
		log::warn!("RIFF chunk size doesn't match the file, walking to the end of the file");
		riff_end = file_len;
	}

	let mut locations = Vec::new();
	let mut chunks = Chunks::<LittleEndian>::new(RIFF_HEADER_SIZE, riff_end);

	while let Some(chunk) = chunks.next(source)? {
		if !chunk.has_valid_fourcc() || !chunks.fits(&chunk) {
			log::warn!(
				"Invalid chunk \"{}\" at {}, attempting to resynchronize",
				chunk.fourcc_str(),
				chunk.start
			);

			let window = parse_options.resync_window as u64;
			if chunks
				.resync(source, chunk.start + 1, &KNOWN_CHUNKS, window)?
				.is_none()
			{
				log::warn!("Failed to resynchronize within {window} bytes, stopping");
				break;
			}

			continue;
		}

		match &chunk.fourcc {
			b"LIST" => {
				if chunk.size < 4 {
					log::warn!("Skipping LIST chunk with an invalid size");
					continue;
				}

				let list_type = source.read_array_at::<4>(chunk.content_start())?;
				if &list_type == b"INFO" {
					log::debug!("Found a RIFF INFO list at {}, size: {}", chunk.start, chunk.len());
					locations.push(TagLocation::new(
						TagFormat::RiffInfo,
						chunk.start,
						chunk.len(),
						file_len,
					)?);
				}
			},
			b"bext" => {
				if chunk.size < BEXT_MIN_SIZE {
					log::warn!(
						"Skipping \"bext\" chunk of {} bytes, expected at least {BEXT_MIN_SIZE}",
						chunk.size
					);
					continue;
				}

				let version = source.read_u16_le_at(chunk.content_start() + BEXT_VERSION_OFFSET)?;
				let tag_end = fold_extension_chunks(source, &mut chunks, &chunk)?;

				log::debug!(
					"Found a BWF v{version} chunk at {}, size: {}",
					chunk.start,
					tag_end - chunk.start
				);
				locations.push(TagLocation::new(
					bwf_format(version),
					chunk.start,
					tag_end - chunk.start,
					file_len,
				)?);
			},
			b"ID3 " | b"id3 " => {
				if let Some(location) = embedded_id3v2(source, &chunk) {
					locations.push(location);
				}
			},
			_ => {},
		}
	}

	Ok(locations)
}

/// Consume the extension chunks directly after `bext`, returning the end of the last one
fn fold_extension_chunks<R>(
	source: &mut FileSource<R>,
	chunks: &mut Chunks<LittleEndian>,
	bext: &Chunk,
) -> Result<u64>
where
	R: Read + Seek,
{
	let mut tag_end = bext.content_end();

	while let Some(next) = chunks.peek(source, chunks.position())? {
		if !BEXT_EXTENSION_CHUNKS.contains(&&next.fourcc) || !chunks.fits(&next) {
			break;
		}

		log::trace!("Folding \"{}\" into the BWF tag", next.fourcc_str());
		tag_end = next.content_end();
		chunks.seek(next.end());
	}

	Ok(tag_end)
}

/// Locate the ID3v2 tag stored in an `ID3 ` chunk
pub(crate) fn embedded_id3v2<R>(source: &mut FileSource<R>, chunk: &Chunk) -> Option<TagLocation>
where
	R: Read + Seek,
{
	match id3::v2::locate_at(source, chunk.content_start()) {
		Ok(Some(location)) if location.end() <= chunk.content_end() => Some(location),
		Ok(Some(_)) => {
			log::warn!("ID3v2 tag overruns its \"{}\" chunk, ignoring it", chunk.fourcc_str());
			None
		},
		Ok(None) => {
			log::warn!("\"{}\" chunk doesn't hold an ID3v2 tag", chunk.fourcc_str());
			None
		},
		Err(e) => {
			log::warn!("Failed to read the ID3v2 tag in a \"{}\" chunk: {e}", chunk.fourcc_str());
			None
		},
	}
}
