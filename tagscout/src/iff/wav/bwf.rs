//! Broadcast Wave Format `bext` chunks
//!
//! <https://tech.ebu.ch/docs/tech/tech3285.pdf>

use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::macros::{decode_err, err};
use crate::tag::{BinaryData, FieldValue, Metadata, TagFormat};
use crate::util::num::{read_u16_le, read_u32_le, read_u64_le};
use crate::util::text::extract_fixed_string;

use data_encoding::HEXUPPER;

/// The fixed part of a `bext` chunk, everything after it is the coding history
pub(crate) const BEXT_MIN_SIZE: u64 = 602;

/// The offset of the version field within the chunk content
pub(crate) const BEXT_VERSION_OFFSET: u64 = 346;

/// Chunks that extend the `bext` chunk when they immediately follow it
pub(crate) const BEXT_EXTENSION_CHUNKS: [&[u8; 4]; 5] = [b"cue ", b"levl", b"iXML", b"axml", b"link"];

const TEXT_FIELDS: [(&str, usize, usize); 5] = [
	("Description", 0, 256),
	("Originator", 256, 32),
	("OriginatorReference", 288, 32),
	("OriginationDate", 320, 10),
	("OriginationTime", 330, 8),
];

const LOUDNESS_FIELDS: [&str; 5] = [
	"LoudnessValue",
	"LoudnessRange",
	"MaxTruePeakLevel",
	"MaxMomentaryLoudness",
	"MaxShortTermLoudness",
];

// Loudness fields that were never measured hold this value
const LOUDNESS_UNSET: i16 = 0x7FFF;

pub(crate) fn bwf_format(version: u16) -> TagFormat {
	match version {
		0 => TagFormat::BwfV0,
		1 => TagFormat::BwfV1,
		2 => TagFormat::BwfV2,
		_ => {
			log::warn!("Unknown BWF version {version}, treating it as version 2");
			TagFormat::BwfV2
		},
	}
}

/// Decode a `bext` chunk, along with any extension chunks that follow it
pub(crate) fn parse_bext(data: &[u8], parse_options: ParseOptions) -> Result<Metadata> {
	if data.len() < 8 || &data[..4] != b"bext" {
		decode_err!(@BAIL Wav, "Expected a \"bext\" chunk");
	}

	let size = u64::from(read_u32_le(&data[4..8]));
	if size < BEXT_MIN_SIZE {
		decode_err!(@BAIL Wav, "\"bext\" chunk is too small");
	}

	let Some(bext) = data.get(8..8 + size as usize) else {
		err!(SizeMismatch);
	};

	let version_offset = BEXT_VERSION_OFFSET as usize;
	let version = read_u16_le(&bext[version_offset..version_offset + 2]);

	let mut metadata = Metadata::new(bwf_format(version));
	log::debug!("Reading a BWF v{version} chunk");

	for (key, offset, len) in TEXT_FIELDS {
		metadata.add_text(key, extract_fixed_string(bext, offset, len, None));
	}

	let time_reference = read_u64_le(&bext[338..346]);
	match i64::try_from(time_reference) {
		Ok(time_reference) => metadata.add_field("TimeReference", FieldValue::Integer(time_reference)),
		Err(_) => metadata.add_text("TimeReference", time_reference.to_string()),
	}

	metadata.add_field("Version", FieldValue::Integer(i64::from(version)));

	// Version 0 has no UMID, the space is reserved
	let umid = &bext[348..412];
	if version >= 1 && umid.iter().any(|b| *b != 0) {
		metadata.add_text("UMID", HEXUPPER.encode(umid));
	}

	if version >= 2 {
		for (i, key) in LOUDNESS_FIELDS.into_iter().enumerate() {
			let offset = 412 + i * 2;
			let value = read_u16_le(&bext[offset..offset + 2]) as i16;
			if value == LOUDNESS_UNSET {
				continue;
			}

			// Stored in hundredths
			metadata.add_text(key, format!("{:.2}", f64::from(value) / 100.0));
		}
	}

	let coding_history = extract_fixed_string(bext, BEXT_MIN_SIZE as usize, bext.len(), None);
	metadata.add_text("CodingHistory", coding_history.trim_end().to_owned());

	let extensions_start = (8 + size + size % 2).min(data.len() as u64) as usize;
	read_extension_chunks(&data[extensions_start..], parse_options, &mut metadata)?;

	Ok(metadata)
}

fn read_extension_chunks(
	mut data: &[u8],
	parse_options: ParseOptions,
	metadata: &mut Metadata,
) -> Result<()> {
	while data.len() >= 8 {
		let fourcc = &data[..4];
		let size = read_u32_le(&data[4..8]) as usize;

		let Some(content) = data.get(8..8 + size) else {
			if parse_options.parsing_mode == ParsingMode::Strict {
				err!(SizeMismatch);
			}

			log::warn!("BWF extension chunk overruns the tag, stopping");
			break;
		};

		data = data.get(8 + size + size % 2..).unwrap_or_default();

		let key = String::from_utf8_lossy(fourcc).trim_end().to_owned();
		log::trace!("Reading BWF extension chunk `{key}`");

		match fourcc {
			b"iXML" | b"axml" | b"link" => {
				metadata.add_text(key, extract_fixed_string(content, 0, content.len(), None));
			},
			b"cue " => {
				if content.len() < 4 {
					log::warn!("Skipping \"cue \" chunk without a cue point count");
					continue;
				}

				let cue_points = read_u32_le(content);
				metadata.add_field(key, FieldValue::Integer(i64::from(cue_points)));
			},
			b"levl" => metadata.add_field(
				key,
				FieldValue::Binary(BinaryData::new(
					content,
					parse_options.max_preview_len,
					None,
				)),
			),
			_ => log::warn!("Skipping unexpected chunk `{key}` after \"bext\""),
		}
	}

	Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use crate::iff::chunk::tests::riff_chunk;

	pub(crate) fn bext(version: u16, size: usize, coding_history: &str) -> Vec<u8> {
		let mut content = vec![0; size.max(BEXT_MIN_SIZE as usize)];
		content[..11].copy_from_slice(b"Description");
		content[256..262].copy_from_slice(b"Studio");
		content[320..330].copy_from_slice(b"2024-01-31");
		content[338..346].copy_from_slice(&48_000_u64.to_le_bytes());
		content[346..348].copy_from_slice(&version.to_le_bytes());

		if version >= 2 {
			content[412..414].copy_from_slice(&(-2300_i16).to_le_bytes());
			for field in 1..5 {
				let offset = 412 + field * 2;
				content[offset..offset + 2].copy_from_slice(&LOUDNESS_UNSET.to_le_bytes());
			}
		}

		content.truncate(size);
		content.extend(coding_history.as_bytes());
		riff_chunk(b"bext", &content)
	}

	#[test_log::test]
	fn minimum_size() {
		let chunk = bext(0, 601, "");
		assert!(parse_bext(&chunk, ParseOptions::new()).is_err());

		let chunk = bext(0, 602, "");
		let metadata = parse_bext(&chunk, ParseOptions::new()).unwrap();
		assert_eq!(metadata.format(), TagFormat::BwfV0);
		assert_eq!(metadata.get_text("Description"), Some("Description"));
		assert_eq!(metadata.get_text("Originator"), Some("Studio"));
		assert_eq!(metadata.get_text("OriginationDate"), Some("2024-01-31"));
		assert_eq!(
			metadata.get("TimeReference").unwrap().value(),
			&FieldValue::Integer(48_000)
		);
		assert!(metadata.get("LoudnessValue").is_none());
		assert!(metadata.get("CodingHistory").is_none());
	}

	#[test_log::test]
	fn loudness_and_extensions() {
		let mut chunk = bext(2, 602, "A=PCM,F=48000\r\n");
		chunk.extend(riff_chunk(b"iXML", b"<BWFXML/>"));

		let mut cue = 2_u32.to_le_bytes().to_vec();
		cue.extend([0; 48]);
		chunk.extend(riff_chunk(b"cue ", &cue));
		chunk.extend(riff_chunk(b"levl", &[1; 100]));

		let metadata = parse_bext(&chunk, ParseOptions::new()).unwrap();
		assert_eq!(metadata.format(), TagFormat::BwfV2);
		assert_eq!(metadata.get_text("LoudnessValue"), Some("-23.00"));
		assert!(metadata.get("LoudnessRange").is_none());
		assert_eq!(metadata.get_text("CodingHistory"), Some("A=PCM,F=48000"));
		assert_eq!(metadata.get_text("iXML"), Some("<BWFXML/>"));
		assert_eq!(
			metadata.get("cue").unwrap().value(),
			&FieldValue::Integer(2)
		);

		let FieldValue::Binary(levl) = metadata.get("levl").unwrap().value() else {
			panic!("Expected binary data");
		};
		assert_eq!(levl.size, 100);
		assert_eq!(levl.preview.len(), 64);
	}
}
