//! Locate and decode audio metadata, even in damaged files.
//!
//! tagscout answers two questions about a file: *where* does each tag live (a format, offset,
//! and size), and *what* does that byte range hold. The two steps are separate, so a caller can
//! detect every tag in a file and only decode the ones it cares about.
//!
//! # Supported Formats
//!
//! | Strategy    | Tags                                                              |
//! |-------------|-------------------------------------------------------------------|
//! | `Id3v1`     | ID3v1, ID3v1.1                                                    |
//! | `Id3v2`     | ID3v2.2, ID3v2.3, ID3v2.4 (at the start, or appended with a footer) |
//! | `Ape`       | APEv1, APEv2                                                      |
//! | `Lyrics3`   | Lyrics3 v1, Lyrics3 v2                                            |
//! | `Ogg`       | Vorbis Comments (Vorbis, Opus)                                    |
//! | `Flac`      | Vorbis Comments                                                   |
//! | `Mp4`       | iTunes-style `ilst`                                               |
//! | `Wav`       | RIFF INFO, BWF `bext` (v0-v2), embedded ID3v2                     |
//! | `Aiff`      | AIFF text chunks, embedded ID3v2                                  |
//! | `Dsf`       | ID3v2                                                             |
//! | `Dff`       | DSDIFF text chunks, embedded ID3v2                                |
//! | `Asf`       | Content Description, Extended Content Description, Metadata, Metadata Library |
//! | `Matroska`  | Matroska and WebM `Tags`                                          |
//! | `TrueAudio` | ID3v2, APE, ID3v1                                                 |
//!
//! # Examples
//!
//! ## Scanning a file
//!
//! ```rust,no_run
//! # fn main() -> tagscout::error::Result<()> {
//! use tagscout::probe::Probe;
//! use tagscout::registry::Registry;
//!
//! let registry = Registry::new();
//! let mut probe = Probe::open("test.mp3")?;
//!
//! for location in probe.detect(&registry) {
//! 	println!(
//! 		"{} at {} ({} bytes)",
//! 		location.format().name(),
//! 		location.offset(),
//! 		location.size()
//! 	);
//!
//! 	// A damaged tag doesn't stop the others from being read
//! 	let Ok(metadata) = probe.parse(&registry, &location) else {
//! 		continue;
//! 	};
//!
//! 	for field in metadata.fields() {
//! 		println!("\t{} = {}", field.key(), field.value());
//! 	}
//! }
//! # Ok(()) }
//! ```
//!
//! ## Restricting the strategies
//!
//! ```rust
//! # fn main() -> tagscout::error::Result<()> {
//! use std::io::Cursor;
//! use tagscout::config::{ParseOptions, ParsingMode};
//! use tagscout::probe::Probe;
//! use tagscout::registry::{Registry, Strategy};
//! use tagscout::tag::TagFormat;
//!
//! // "ID3" + version 2.3 + flags + synchsafe size, then a single TIT2 frame
//! let mut file = b"ID3\x03\x00\x00\x00\x00\x00\x17".to_vec();
//! file.extend(b"TIT2\x00\x00\x00\x06\x00\x00\x00Hello");
//! file.extend([0; 7]);
//!
//! let registry = Registry::with_strategies(&[Strategy::Id3v2]);
//! let mut probe = Probe::new(Cursor::new(file))?
//! 	.options(ParseOptions::new().parsing_mode(ParsingMode::Strict));
//!
//! let locations = probe.detect(&registry);
//! assert_eq!(locations.len(), 1);
//! assert_eq!(locations[0].format(), TagFormat::Id3v2_3);
//! assert_eq!(locations[0].size(), 33);
//!
//! let metadata = probe.parse(&registry, &locations[0])?;
//! assert_eq!(metadata.get_text("TIT2"), Some("Hello"));
//! # Ok(()) }
//! ```
//!
//! # Important format-specific notes
//!
//! All formats have their own quirks, such as where they can be found in a file and how their
//! containers can be damaged. Be sure to read the module documentation of each format.
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod config;
pub mod error;
pub(crate) mod macros;
pub(crate) mod picture;
pub mod probe;
pub mod registry;
pub mod tag;
pub mod util;

pub mod ape;
pub mod asf;
pub mod dsd;
pub mod ebml;
pub mod flac;
pub mod id3;
pub mod iff;
pub mod lyrics3;
pub mod mp4;
pub mod ogg;
pub mod tta;

pub use util::text::TextEncoding;

pub use util::io;
