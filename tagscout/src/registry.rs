//! Format strategies and the registry that dispatches to them
//!
//! Every format family is a [`Strategy`]. A strategy pairs a cheap signature check
//! ([`Strategy::can_detect`]) with a full search ([`Strategy::detect`]), and a format check
//! ([`Strategy::can_handle`]) with a decoder ([`Strategy::parse`]).
//!
//! A [`Registry`] holds an ordered set of strategies, built once and never modified.
//!
//! # Examples
//!
//! ```rust
//! use tagscout::registry::{Registry, Strategy};
//! use tagscout::tag::TagFormat;
//!
//! let registry = Registry::with_strategies(&[Strategy::Wav, Strategy::Id3v1]);
//! assert_eq!(registry.strategies(), &[Strategy::Wav, Strategy::Id3v1]);
//!
//! // The ID3v2 tags found inside WAV files are still parsed
//! assert_eq!(registry.parser_for(TagFormat::Id3v2_3), Some(Strategy::Id3v2));
//! assert_eq!(registry.parser_for(TagFormat::Mp4Ilst), None);
//! ```

use crate::config::ParseOptions;
use crate::error::Result;
use crate::macros::err;
use crate::ogg::page::OGG_PAGE_MARKER;
use crate::probe::ScanBuffers;
use crate::tag::{Metadata, TagFormat, TagLocation};
use crate::util::io::FileSource;
use crate::{ape, asf, dsd, ebml, flac, id3, iff, lyrics3, mp4, ogg, tta};

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::io::{Read, Seek};

const ID3V1_FORMATS: &[TagFormat] = &[TagFormat::Id3v1, TagFormat::Id3v1_1];
const ID3V2_FORMATS: &[TagFormat] = &[TagFormat::Id3v2_2, TagFormat::Id3v2_3, TagFormat::Id3v2_4];
const APE_FORMATS: &[TagFormat] = &[TagFormat::ApeV1, TagFormat::ApeV2];
const LYRICS3_FORMATS: &[TagFormat] = &[TagFormat::Lyrics3v1, TagFormat::Lyrics3v2];
const BWF_FORMATS: &[TagFormat] = &[TagFormat::BwfV0, TagFormat::BwfV1, TagFormat::BwfV2];
const ASF_FORMATS: &[TagFormat] = &[
	TagFormat::AsfContentDescription,
	TagFormat::AsfExtendedContentDescription,
	TagFormat::AsfMetadata,
	TagFormat::AsfMetadataLibrary,
];
const MATROSKA_FORMATS: &[TagFormat] = &[TagFormat::Matroska, TagFormat::WebM];

/// A format family, and the detection and parsing routines for it
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Strategy {
	/// ID3v1 and ID3v1.1, at the end of the file
	Id3v1,
	/// ID3v2, at the start of the file, or appended with a footer
	Id3v2,
	/// APEv1 and APEv2
	Ape,
	/// Lyrics3 v1 and v2, before any ID3v1 tag
	Lyrics3,
	/// Vorbis Comments in an Ogg Vorbis or Opus stream
	Ogg,
	/// Vorbis Comments in a FLAC metadata block
	Flac,
	/// iTunes-style `ilst` atoms
	Mp4,
	/// RIFF INFO, BWF, and ID3v2 chunks in RIFF WAVE files
	Wav,
	/// Text and ID3v2 chunks in AIFF and AIFC files
	Aiff,
	/// The ID3v2 tag pointed to by a DSF header
	Dsf,
	/// Text and ID3v2 chunks in DSDIFF files
	Dff,
	/// ASF (WMA/WMV) metadata objects
	Asf,
	/// `Tags` elements in Matroska and WebM files
	Matroska,
	/// The ID3v2, APE, and ID3v1 tags around a TrueAudio stream
	TrueAudio,
}

impl Strategy {
	/// Every strategy, in the order [`Registry::new`] runs them
	pub const ALL: [Self; 14] = [
		Self::Id3v2,
		Self::Id3v1,
		Self::Ape,
		Self::Lyrics3,
		Self::Ogg,
		Self::Flac,
		Self::Mp4,
		Self::Wav,
		Self::Aiff,
		Self::Dsf,
		Self::Dff,
		Self::Asf,
		Self::Matroska,
		Self::TrueAudio,
	];

	/// A human-readable name for the strategy
	pub fn name(self) -> &'static str {
		match self {
			Self::Id3v1 => "ID3v1",
			Self::Id3v2 => "ID3v2",
			Self::Ape => "APE",
			Self::Lyrics3 => "Lyrics3",
			Self::Ogg => "Ogg",
			Self::Flac => "FLAC",
			Self::Mp4 => "MP4",
			Self::Wav => "WAV",
			Self::Aiff => "AIFF",
			Self::Dsf => "DSF",
			Self::Dff => "DFF",
			Self::Asf => "ASF",
			Self::Matroska => "Matroska",
			Self::TrueAudio => "TrueAudio",
		}
	}

	/// The formats [`Strategy::detect`] can report
	///
	/// This includes formats that are parsed by another strategy, such as the ID3v2 tags embedded
	/// in WAV files.
	pub fn detected_formats(self) -> Vec<TagFormat> {
		let groups: &[&[TagFormat]] = match self {
			Self::Id3v1 => &[ID3V1_FORMATS],
			Self::Id3v2 | Self::Dsf => &[ID3V2_FORMATS],
			Self::Ape => &[APE_FORMATS],
			Self::Lyrics3 => &[LYRICS3_FORMATS],
			Self::Ogg | Self::Flac => &[&[TagFormat::VorbisComments]],
			Self::Mp4 => &[&[TagFormat::Mp4Ilst]],
			Self::Wav => &[&[TagFormat::RiffInfo], BWF_FORMATS, ID3V2_FORMATS],
			Self::Aiff => &[&[TagFormat::AiffText], ID3V2_FORMATS],
			Self::Dff => &[&[TagFormat::DffText], ID3V2_FORMATS],
			Self::Asf => &[ASF_FORMATS],
			Self::Matroska => &[MATROSKA_FORMATS],
			Self::TrueAudio => &[ID3V2_FORMATS, APE_FORMATS, ID3V1_FORMATS],
		};

		groups.concat()
	}

	/// Quickly check the scan windows for this strategy's signatures
	///
	/// This never touches the file. A `true` result only means [`Strategy::detect`] is worth running.
	pub fn can_detect(self, buffers: &ScanBuffers) -> bool {
		match self {
			Self::Id3v1 => id3::v1::can_detect(buffers),
			Self::Id3v2 => id3::v2::can_detect(buffers),
			Self::Ape => ape::can_detect(buffers),
			Self::Lyrics3 => lyrics3::can_detect(buffers),
			Self::Ogg => ogg::can_detect(buffers),
			Self::Flac => flac::can_detect(buffers),
			Self::Mp4 => mp4::can_detect(buffers),
			Self::Wav => iff::wav::can_detect(buffers),
			Self::Aiff => iff::aiff::can_detect(buffers),
			Self::Dsf => dsd::dsf::can_detect(buffers),
			Self::Dff => dsd::dff::can_detect(buffers),
			Self::Asf => asf::can_detect(buffers),
			Self::Matroska => ebml::can_detect(buffers),
			Self::TrueAudio => tta::can_detect(buffers),
		}
	}

	/// Search the file for tags
	///
	/// # Errors
	///
	/// The file is structurally invalid for this format, or could not be read.
	/// Damage past the point where tags were already found is logged, and whatever was found is returned.
	pub fn detect<R>(
		self,
		source: &mut FileSource<R>,
		buffers: &ScanBuffers,
		parse_options: ParseOptions,
	) -> Result<Vec<TagLocation>>
	where
		R: Read + Seek,
	{
		match self {
			Self::Id3v1 => id3::v1::detect(source, buffers),
			Self::Id3v2 => id3::v2::detect(source, buffers),
			Self::Ape => ape::detect(source, buffers),
			Self::Lyrics3 => lyrics3::detect(source, buffers),
			Self::Ogg => ogg::detect(source, buffers, parse_options),
			Self::Flac => flac::detect(source, buffers),
			Self::Mp4 => mp4::detect(source, buffers, parse_options),
			Self::Wav => iff::wav::detect(source, buffers, parse_options),
			Self::Aiff => iff::aiff::detect(source, buffers, parse_options),
			Self::Dsf => dsd::dsf::detect(source, buffers),
			Self::Dff => dsd::dff::detect(source, buffers),
			Self::Asf => asf::detect(source, buffers),
			Self::Matroska => ebml::detect(source, buffers),
			Self::TrueAudio => tta::detect(source, buffers),
		}
	}

	/// Whether [`Strategy::parse`] can decode `format`
	///
	/// The DSF and TrueAudio strategies only locate tags owned by other strategies, and handle
	/// nothing.
	pub fn can_handle(self, format: TagFormat) -> bool {
		match self {
			Self::Id3v1 => ID3V1_FORMATS.contains(&format),
			Self::Id3v2 => ID3V2_FORMATS.contains(&format),
			Self::Ape => APE_FORMATS.contains(&format),
			Self::Lyrics3 => LYRICS3_FORMATS.contains(&format),
			Self::Ogg | Self::Flac => format == TagFormat::VorbisComments,
			Self::Mp4 => format == TagFormat::Mp4Ilst,
			Self::Wav => format == TagFormat::RiffInfo || BWF_FORMATS.contains(&format),
			Self::Aiff => format == TagFormat::AiffText,
			Self::Dff => format == TagFormat::DffText,
			Self::Asf => ASF_FORMATS.contains(&format),
			Self::Matroska => MATROSKA_FORMATS.contains(&format),
			Self::Dsf | Self::TrueAudio => false,
		}
	}

	/// Decode the tag at `location`
	///
	/// # Errors
	///
	/// * The strategy can't handle the location's format ([`Strategy::can_handle`])
	/// * The bytes at `location` are not a well-formed tag of its format
	/// * In [`ParsingMode::Strict`](crate::config::ParsingMode::Strict), any malformed field
	pub fn parse<R>(
		self,
		source: &mut FileSource<R>,
		location: &TagLocation,
		parse_options: ParseOptions,
	) -> Result<Metadata>
	where
		R: Read + Seek,
	{
		let format = location.format();
		if !self.can_handle(format) {
			err!(UnsupportedFormat(format));
		}

		log::debug!(
			"{self}: Parsing {} tag at {}, size: {}",
			format.name(),
			location.offset(),
			location.size()
		);

		match self {
			Self::Id3v1 => id3::v1::parse(source, location, parse_options),
			Self::Id3v2 => id3::v2::parse(source, location, parse_options),
			Self::Ape => ape::parse(source, location, parse_options),
			Self::Lyrics3 => lyrics3::parse(source, location, parse_options),
			Self::Ogg | Self::Flac => parse_vorbis_comments(source, location, parse_options),
			Self::Mp4 => mp4::parse(source, location, parse_options),
			Self::Wav => iff::wav::parse(source, location, parse_options),
			Self::Aiff => iff::aiff::parse(source, location, parse_options),
			Self::Dff => dsd::dff::parse(source, location, parse_options),
			Self::Asf => asf::parse(source, location, parse_options),
			Self::Matroska => ebml::parse(source, location, parse_options),
			Self::Dsf | Self::TrueAudio => err!(UnsupportedFormat(format)),
		}
	}
}

/// Vorbis Comments are found in both Ogg pages and FLAC blocks, the location starts with one or the other
fn parse_vorbis_comments<R>(
	source: &mut FileSource<R>,
	location: &TagLocation,
	parse_options: ParseOptions,
) -> Result<Metadata>
where
	R: Read + Seek,
{
	let in_ogg_page = location.size() >= OGG_PAGE_MARKER.len() as u64
		&& &source.read_array_at::<4>(location.offset())? == OGG_PAGE_MARKER;

	if in_ogg_page {
		ogg::parse(source, location, parse_options)
	} else {
		flac::parse(source, location, parse_options)
	}
}

impl Display for Strategy {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}

/// An ordered set of strategies
///
/// A registry is immutable once built, and can be shared between threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registry {
	strategies: Vec<Strategy>,
	parsers: HashMap<TagFormat, Strategy>,
}

impl Registry {
	/// A registry with every strategy, in the order of [`Strategy::ALL`]
	pub fn new() -> Self {
		Self::with_strategies(&Strategy::ALL)
	}

	/// A registry with a caller-selected subset of strategies
	///
	/// Duplicates are ignored. Every format the selected strategies can detect is given a parser,
	/// even if the strategy that handles it wasn't selected.
	pub fn with_strategies(strategies: &[Strategy]) -> Self {
		let mut selected = Vec::with_capacity(strategies.len());
		for strategy in strategies {
			if !selected.contains(strategy) {
				selected.push(*strategy);
			}
		}

		let mut parsers = HashMap::new();
		for format in selected.iter().flat_map(|strategy| strategy.detected_formats()) {
			if parsers.contains_key(&format) {
				continue;
			}

			// Prefer a selected strategy, falling back to the first one that can handle it
			let parser = selected
				.iter()
				.chain(Strategy::ALL.iter())
				.find(|strategy| strategy.can_handle(format));

			if let Some(parser) = parser {
				parsers.insert(format, *parser);
			}
		}

		Self {
			strategies: selected,
			parsers,
		}
	}

	/// The strategies, in the order they are run
	pub fn strategies(&self) -> &[Strategy] {
		&self.strategies
	}

	/// The strategy that parses `format`, if any strategy in this registry can detect it
	pub fn parser_for(&self, format: TagFormat) -> Option<Strategy> {
		self.parsers.get(&format).copied()
	}

	/// Run every strategy whose signature check passes
	///
	/// The results are concatenated in registry order, with exact duplicates removed (ex. an ID3v1
	/// tag reported by both the ID3v1 and TrueAudio strategies). A strategy that fails is logged and
	/// skipped, it never hides the locations found by the others.
	pub fn detect_all<R>(
		&self,
		source: &mut FileSource<R>,
		buffers: &ScanBuffers,
		parse_options: ParseOptions,
	) -> Vec<TagLocation>
	where
		R: Read + Seek,
	{
		let mut locations = Vec::new();

		for strategy in &self.strategies {
			if !strategy.can_detect(buffers) {
				log::trace!("{strategy}: No signature found, skipping");
				continue;
			}

			log::debug!("{strategy}: Signature found, searching the file");

			let found = match strategy.detect(source, buffers, parse_options) {
				Ok(found) => found,
				Err(e) => {
					log::warn!("{strategy}: Detection failed: {e}");
					continue;
				},
			};

			for location in found {
				if locations.contains(&location) {
					log::trace!(
						"{strategy}: Skipping duplicate {} location at {}",
						location.format().name(),
						location.offset()
					);
					continue;
				}

				locations.push(location);
			}
		}

		locations
	}

	/// Decode a location with the strategy registered for its format
	///
	/// # Errors
	///
	/// * No strategy in this registry handles the location's format
	/// * See [`Strategy::parse`]
	pub fn parse<R>(
		&self,
		source: &mut FileSource<R>,
		location: &TagLocation,
		parse_options: ParseOptions,
	) -> Result<Metadata>
	where
		R: Read + Seek,
	{
		match self.parser_for(location.format()) {
			Some(strategy) => strategy.parse(source, location, parse_options),
			None => err!(UnsupportedFormat(location.format())),
		}
	}
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}
