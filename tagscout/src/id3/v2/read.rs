use super::frame::content::decode_content;
use super::frame::{FrameFlags, FrameHeader};
use super::header::{ID3V2_HEADER_SIZE, Id3v2Header, Id3v2Version};
use super::util::synchsafe::{read_synchsafe_u32, resynchronize};
use crate::config::{ParseOptions, ParsingMode};
use crate::error::{Id3v2Error, Id3v2ErrorKind, Result, TagError};
use crate::macros::err;
use crate::tag::{BinaryData, FieldValue, Metadata, TagFormat};

use std::borrow::Cow;

/// Decode a complete ID3v2 tag (header included)
pub(crate) fn parse_id3v2(
	tag: &[u8],
	expected_format: TagFormat,
	parse_options: ParseOptions,
) -> Result<Metadata> {
	let Some(header_bytes) = tag.first_chunk::<10>() else {
		err!(SizeMismatch);
	};

	let header = Id3v2Header::parse(header_bytes, false)?;
	if header.version.tag_format() != expected_format {
		return Err(Id3v2Error::new(Id3v2ErrorKind::VersionMismatch).into());
	}

	if Id3v2Header::is_v2_compressed(header_bytes[5], header.version) {
		return Err(Id3v2Error::new(Id3v2ErrorKind::V2Compression).into());
	}

	log::debug!(
		"Parsing ID3v2 tag, size: {}, version: {:?}",
		header.size,
		header.version
	);

	let body_end = ID3V2_HEADER_SIZE as usize + header.size as usize;
	if body_end > tag.len() {
		err!(SizeMismatch);
	}

	let mut body = Cow::Borrowed(&tag[ID3V2_HEADER_SIZE as usize..body_end]);

	// ID3v2.4 unsynchronizes each frame individually
	if header.flags.unsynchronisation && header.version != Id3v2Version::V4 {
		body = Cow::Owned(resynchronize(&body)?);
	}

	let frames_start = if header.flags.extended_header {
		skip_extended_header(&body, header.version)?
	} else {
		0
	};

	let mut metadata = Metadata::new(expected_format);
	read_all_frames(
		&body[frames_start..],
		&header,
		parse_options,
		&mut metadata,
	)?;

	Ok(metadata)
}

/// Returns the number of bytes the extended header occupies
fn skip_extended_header(body: &[u8], version: Id3v2Version) -> Result<usize> {
	let Some(&size_bytes) = body.first_chunk::<4>() else {
		return Err(Id3v2Error::new(Id3v2ErrorKind::BadExtendedHeaderSize).into());
	};

	let extended_size = match version {
		// The ID3v2.3 size doesn't include the size field itself
		Id3v2Version::V3 => u32::from_be_bytes(size_bytes).checked_add(4),
		_ => read_synchsafe_u32(size_bytes),
	};

	match extended_size {
		Some(size) if size >= 6 && (size as usize) < body.len() => {
			log::trace!("Skipping extended header, size: {size}");
			Ok(size as usize)
		},
		_ => Err(Id3v2Error::new(Id3v2ErrorKind::BadExtendedHeaderSize).into()),
	}
}

fn read_all_frames(
	mut frames: &[u8],
	tag_header: &Id3v2Header,
	parse_options: ParseOptions,
	metadata: &mut Metadata,
) -> Result<()> {
	let version = tag_header.version;
	let parse_mode = parse_options.parsing_mode;
	let header_len = FrameHeader::len(version);

	while let Some(frame_header) = FrameHeader::parse(frames, version) {
		let content_size = frame_header.content_size as usize;
		let Some(frame_end) = header_len
			.checked_add(content_size)
			.filter(|end| *end <= frames.len())
		else {
			if parse_mode == ParsingMode::Strict {
				return Err(Id3v2Error::new(Id3v2ErrorKind::BadFrameLength).into());
			}

			log::warn!("Frame size exceeds the remaining tag size, stopping");
			break;
		};

		let raw_content = &frames[header_len..frame_end];
		frames = &frames[frame_end..];

		let result = read_frame(
			&frame_header,
			raw_content,
			tag_header,
			parse_options,
			metadata,
		);

		if let Err(err) = result {
			if parse_mode == ParsingMode::Strict {
				return Err(err);
			}

			log::warn!("Failed to read frame, skipping: {err}");
		}
	}

	Ok(())
}

fn read_frame(
	frame_header: &FrameHeader,
	raw_content: &[u8],
	tag_header: &Id3v2Header,
	parse_options: ParseOptions,
	metadata: &mut Metadata,
) -> Result<()> {
	let id = frame_header.id()?;
	log::trace!("Reading frame `{id}`, size: {}", raw_content.len());

	if raw_content.is_empty() {
		if parse_options.parsing_mode == ParsingMode::Strict {
			return Err(Id3v2Error::new(Id3v2ErrorKind::EmptyFrame(id.to_owned())).into());
		}

		log::debug!("Encountered a zero length frame, skipping");
		return Ok(());
	}

	if !parse_options.read_cover_art && matches!(id, "APIC" | "PIC") {
		log::trace!("Skipping picture frame");
		return Ok(());
	}

	let version = tag_header.version;
	let flags = frame_header.flags;

	let content = strip_flag_data(raw_content, flags, version)?;

	// It seems like the flags are applied in the order:
	//
	// unsynchronization -> compression -> encryption
	let unsynchronized = version == Id3v2Version::V4
		&& (flags.unsynchronisation || tag_header.flags.unsynchronisation);
	let content = if unsynchronized {
		Cow::Owned(resynchronize(content)?)
	} else {
		Cow::Borrowed(content)
	};

	if flags.encryption {
		if version == Id3v2Version::V4 && !flags.data_length_indicator {
			return Err(Id3v2Error::new(Id3v2ErrorKind::MissingDataLengthIndicator).into());
		}

		// Nothing further we can do with encrypted frames
		metadata.add_field(
			id,
			FieldValue::Binary(BinaryData::new(
				&content,
				parse_options.max_preview_len,
				Some(String::from("encrypted")),
			)),
		);
		return Ok(());
	}

	let content = if flags.compression {
		Cow::Owned(decompress(&content)?)
	} else {
		content
	};

	decode_content(metadata, id, &content, version, parse_options)
}

/// Remove the extra bytes the frame flags prepend to the content
fn strip_flag_data(content: &[u8], flags: FrameFlags, version: Id3v2Version) -> Result<&[u8]> {
	let mut prefix_len = 0;
	match version {
		Id3v2Version::V2 => {},
		// Decompressed size, encryption method, group identifier
		Id3v2Version::V3 => {
			if flags.compression {
				prefix_len += 4;
			}
			if flags.encryption {
				prefix_len += 1;
			}
			if flags.grouping_identity {
				prefix_len += 1;
			}
		},
		// Group identifier, encryption method, data length indicator
		Id3v2Version::V4 => {
			if flags.grouping_identity {
				prefix_len += 1;
			}
			if flags.encryption {
				prefix_len += 1;
			}
			if flags.data_length_indicator {
				prefix_len += 4;
			}
		},
	}

	// Frames must have at least 1 byte, *after* all of the additional data flags can provide
	if prefix_len >= content.len() {
		return Err(Id3v2Error::new(Id3v2ErrorKind::BadFrameLength).into());
	}

	Ok(&content[prefix_len..])
}

#[cfg(feature = "id3v2_compression_support")]
fn decompress(content: &[u8]) -> Result<Vec<u8>> {
	use std::io::Read;

	let limit = crate::config::global_options().allocation_limit as u64;

	let mut decompressed = Vec::new();
	flate2::read::ZlibDecoder::new(content)
		.take(limit)
		.read_to_end(&mut decompressed)
		.map_err(|e| TagError::from(Id3v2Error::new(Id3v2ErrorKind::Decompression(e))))?;

	Ok(decompressed)
}

#[cfg(not(feature = "id3v2_compression_support"))]
fn decompress(_: &[u8]) -> Result<Vec<u8>> {
	Err(TagError::from(Id3v2Error::new(
		Id3v2ErrorKind::CompressedFrameEncountered,
	)))
}

#[cfg(test)]
mod tests {
	use super::parse_id3v2;
	use crate::config::{ParseOptions, ParsingMode};
	use crate::id3::v2::util::synchsafe::SynchsafeInteger;
	use crate::tag::TagFormat;

	fn build_tag(version: u8, flags: u8, frames: &[u8]) -> Vec<u8> {
		let mut tag = vec![b'I', b'D', b'3', version, 0, flags];
		let size = u32::try_from(frames.len()).unwrap().synch().unwrap();
		tag.extend(size.to_be_bytes());
		tag.extend_from_slice(frames);
		tag
	}

	fn v3_frame(id: &[u8; 4], flags: u16, content: &[u8]) -> Vec<u8> {
		let mut frame = id.to_vec();
		frame.extend(u32::try_from(content.len()).unwrap().to_be_bytes());
		frame.extend(flags.to_be_bytes());
		frame.extend_from_slice(content);
		frame
	}

	#[test_log::test]
	fn frames_and_padding() {
		let mut frames = v3_frame(b"TIT2", 0, b"\x00Title");
		frames.extend(v3_frame(b"TPE1", 0, b"\x00Artist"));
		frames.extend([0; 32]);

		let tag = build_tag(3, 0, &frames);
		let metadata = parse_id3v2(&tag, TagFormat::Id3v2_3, ParseOptions::new()).unwrap();

		assert_eq!(metadata.len(), 2);
		assert_eq!(metadata.get_text("TIT2"), Some("Title"));
		assert_eq!(metadata.get_text("TPE1"), Some("Artist"));
	}

	#[test_log::test]
	fn version_mismatch() {
		let tag = build_tag(3, 0, &v3_frame(b"TIT2", 0, b"\x00Title"));
		assert!(parse_id3v2(&tag, TagFormat::Id3v2_4, ParseOptions::new()).is_err());
	}

	#[test_log::test]
	fn bad_frame_id() {
		let mut frames = v3_frame(b"TI+2", 0, b"\x00Bad");
		frames.extend(v3_frame(b"TALB", 0, b"\x00Album"));
		let tag = build_tag(3, 0, &frames);

		let metadata = parse_id3v2(&tag, TagFormat::Id3v2_3, ParseOptions::new()).unwrap();
		assert_eq!(metadata.len(), 1);
		assert_eq!(metadata.get_text("TALB"), Some("Album"));

		let strict = ParseOptions::new().parsing_mode(ParsingMode::Strict);
		assert!(parse_id3v2(&tag, TagFormat::Id3v2_3, strict).is_err());
	}

	#[test_log::test]
	fn extended_header_is_skipped() {
		let mut frames = vec![0, 0, 0, 6, 0, 0, 0, 0, 0, 0];
		frames.extend(v3_frame(b"TIT2", 0, b"\x00Title"));
		let tag = build_tag(3, 0x40, &frames);

		let metadata = parse_id3v2(&tag, TagFormat::Id3v2_3, ParseOptions::new()).unwrap();
		assert_eq!(metadata.get_text("TIT2"), Some("Title"));
	}

	#[test_log::test]
	fn tag_unsynchronisation() {
		// The size field contains a 0xFF, which is followed by an inserted 0x00
		let mut frames = v3_frame(b"TXXX", 0, &[]);
		frames.truncate(4);
		frames.extend([0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00]);
		frames.extend(b"\x00\0");
		frames.extend([b'a'; 253]);

		let tag = build_tag(3, 0x80, &frames);
		let metadata = parse_id3v2(&tag, TagFormat::Id3v2_3, ParseOptions::new()).unwrap();
		assert_eq!(metadata.get_text("TXXX:").map(str::len), Some(253));
	}

	#[test_log::test]
	fn pictures_can_be_skipped() {
		let frames = v3_frame(b"APIC", 0, b"\x00image/png\0\x03\0\x89PNG");
		let tag = build_tag(3, 0, &frames);

		let options = ParseOptions::new().read_cover_art(false);
		let metadata = parse_id3v2(&tag, TagFormat::Id3v2_3, options).unwrap();
		assert!(metadata.is_empty());

		let metadata = parse_id3v2(&tag, TagFormat::Id3v2_3, ParseOptions::new()).unwrap();
		assert_eq!(metadata.len(), 1);
	}

	#[cfg(feature = "id3v2_compression_support")]
	#[test_log::test]
	fn compressed_frame() {
		use flate2::Compression;
		use flate2::write::ZlibEncoder;
		use std::io::Write;

		let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
		encoder.write_all(b"\x00Compressed title").unwrap();
		let compressed = encoder.finish().unwrap();

		let mut content = 17_u32.to_be_bytes().to_vec();
		content.extend(compressed);

		let tag = build_tag(3, 0, &v3_frame(b"TIT2", 0x0080, &content));
		let metadata = parse_id3v2(&tag, TagFormat::Id3v2_3, ParseOptions::new()).unwrap();
		assert_eq!(metadata.get_text("TIT2"), Some("Compressed title"));
	}
}
