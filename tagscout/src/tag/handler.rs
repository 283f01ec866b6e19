use crate::id3::v1::constants::resolve_genre;
use crate::tag::{FieldValue, TagFormat};
use crate::util::flag_item;

use std::collections::HashMap;
use std::sync::OnceLock;

/// How the value of a field is interpreted
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FieldKind {
	/// Free text
	Text,
	/// A decimal integer
	Integer,
	/// A "current/total" pair
	NumberPair,
	/// A genre, which may reference the ID3v1 genre table (ex. "(17)")
	Genre,
	/// A date or year, kept verbatim
	Date,
	/// A URL
	Url,
	/// A rating
	Rating,
	/// A play counter
	Counter,
	/// A flag
	Boolean,
	/// Opaque binary data
	Binary,
	/// An embedded picture
	Picture,
	/// No known behavior, the value is captured as is
	Generic,
}

/// A capability bound to a metadata key
///
/// Handlers are resolved by a pure two-level lookup: a static table of known keys for the tag's
/// format family, then [`FieldHandler::GENERIC`] for everything else. A field is therefore never
/// dropped because its key is unknown.
///
/// # Examples
///
/// ```rust
/// use tagscout::tag::{FieldHandler, FieldKind, FieldValue, TagFormat};
///
/// let handler = FieldHandler::lookup(TagFormat::VorbisComments, "TRACKNUMBER");
/// assert_eq!(handler.kind(), FieldKind::NumberPair);
///
/// let value = handler.interpret(FieldValue::Text(String::from("3/12")));
/// assert_eq!(
/// 	value,
/// 	FieldValue::NumberPair {
/// 		current: 3,
/// 		total: Some(12)
/// 	}
/// );
///
/// // Unknown keys get the generic handler
/// let handler = FieldHandler::lookup(TagFormat::VorbisComments, "MY_CUSTOM_KEY");
/// assert_eq!(handler, FieldHandler::GENERIC);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldHandler {
	kind: FieldKind,
	label: Option<&'static str>,
}

impl FieldHandler {
	/// The fallback handler for unregistered keys
	pub const GENERIC: Self = Self {
		kind: FieldKind::Generic,
		label: None,
	};

	const fn new(kind: FieldKind, label: &'static str) -> Self {
		Self {
			kind,
			label: Some(label),
		}
	}

	/// Find the handler for `key` in a tag of `format`
	pub fn lookup(format: TagFormat, key: &str) -> Self {
		let handler = match format {
			TagFormat::Id3v1 | TagFormat::Id3v1_1 => Id3v1Handlers::get(key),
			TagFormat::Id3v2_2 | TagFormat::Id3v2_3 | TagFormat::Id3v2_4 => {
				// User defined frames carry their description after the ID
				let frame_id = key.split(':').next().unwrap_or(key);
				Id3v2Handlers::get(frame_id)
			},
			TagFormat::ApeV1 | TagFormat::ApeV2 => ApeHandlers::get(&key.to_ascii_uppercase()),
			TagFormat::VorbisComments => VorbisHandlers::get(key),
			TagFormat::Mp4Ilst => Mp4Handlers::get(key),
			TagFormat::RiffInfo => RiffInfoHandlers::get(key),
			TagFormat::BwfV0 | TagFormat::BwfV1 | TagFormat::BwfV2 => BwfHandlers::get(key),
			TagFormat::AiffText => AiffHandlers::get(key),
			TagFormat::Lyrics3v1 | TagFormat::Lyrics3v2 => Lyrics3Handlers::get(key),
			TagFormat::AsfContentDescription
			| TagFormat::AsfExtendedContentDescription
			| TagFormat::AsfMetadata
			| TagFormat::AsfMetadataLibrary => AsfHandlers::get(key),
			TagFormat::DffText => DffHandlers::get(key),
			TagFormat::Matroska | TagFormat::WebM => {
				// Strip the target type prefix (ex. "30:TITLE")
				let name = key.rsplit(':').next().unwrap_or(key);
				MatroskaHandlers::get(name)
			},
		};

		handler.unwrap_or(Self::GENERIC)
	}

	/// How the value is interpreted
	pub fn kind(&self) -> FieldKind {
		self.kind
	}

	/// A human-readable name for the key, if it is a known key
	pub fn label(&self) -> Option<&'static str> {
		self.label
	}

	/// Convert a raw value into the representation this handler expects
	///
	/// A value that can't be interpreted is returned unchanged.
	pub fn interpret(&self, value: FieldValue) -> FieldValue {
		match (self.kind, value) {
			(FieldKind::Integer | FieldKind::Rating | FieldKind::Counter, FieldValue::Text(text)) => {
				match text.trim().parse::<i64>() {
					Ok(number) => FieldValue::Integer(number),
					Err(_) => {
						log::warn!("Expected an integer, keeping \"{text}\" as text");
						FieldValue::Text(text)
					},
				}
			},
			(FieldKind::NumberPair, FieldValue::Text(text)) => match parse_number_pair(&text) {
				Some(pair) => pair,
				None => {
					log::warn!("Expected a number pair, keeping \"{text}\" as text");
					FieldValue::Text(text)
				},
			},
			(FieldKind::NumberPair, FieldValue::Integer(number)) => match u32::try_from(number) {
				Ok(current) => FieldValue::NumberPair {
					current,
					total: None,
				},
				Err(_) => FieldValue::Integer(number),
			},
			(FieldKind::Boolean, FieldValue::Text(text)) => match flag_item(text.trim()) {
				Some(flag) => FieldValue::Boolean(flag),
				None => FieldValue::Text(text),
			},
			(FieldKind::Boolean, FieldValue::Integer(number)) => FieldValue::Boolean(number != 0),
			(FieldKind::Genre, FieldValue::Text(text)) => FieldValue::Text(resolve_genre(&text)),
			(_, value) => value,
		}
	}
}

fn parse_number_pair(text: &str) -> Option<FieldValue> {
	let text = text.trim();
	match text.split_once('/') {
		Some((current, total)) => {
			let current = current.trim().parse().ok()?;
			let total = total.trim();
			let total = if total.is_empty() {
				None
			} else {
				Some(total.parse().ok()?)
			};

			Some(FieldValue::NumberPair { current, total })
		},
		None => Some(FieldValue::NumberPair {
			current: text.parse().ok()?,
			total: None,
		}),
	}
}

macro_rules! gen_handlers {
	(
		$NAME:ident;

		$(
			$($key:literal)|+ => $kind:ident, $label:literal
		),+ $(,)?
	) => {
		struct $NAME;

		impl $NAME {
			fn get(key: &str) -> Option<FieldHandler> {
				static INSTANCE: OnceLock<HashMap<&'static str, FieldHandler>> = OnceLock::new();
				INSTANCE
					.get_or_init(|| {
						let mut map = HashMap::new();
						$(
							$(
								map.insert($key, FieldHandler::new(FieldKind::$kind, $label));
							)+
						)+
						map
					})
					.get(key)
					.copied()
			}
		}
	};
}

gen_handlers!(
	Id3v1Handlers;

	"Title"   => Text, "Title",
	"Artist"  => Text, "Artist",
	"Album"   => Text, "Album",
	"Year"    => Date, "Year",
	"Comment" => Text, "Comment",
	"Track"   => NumberPair, "Track Number",
	"Genre"   => Genre, "Genre"
);

gen_handlers!(
	Id3v2Handlers;

	"TIT1" | "TT1"                                   => Text, "Grouping",
	"TIT2" | "TT2"                                   => Text, "Title",
	"TIT3" | "TT3"                                   => Text, "Subtitle",
	"TALB" | "TAL"                                   => Text, "Album",
	"TPE1" | "TP1"                                   => Text, "Artist",
	"TPE2" | "TP2"                                   => Text, "Album Artist",
	"TPE3" | "TP3"                                   => Text, "Conductor",
	"TPE4" | "TP4"                                   => Text, "Remixer",
	"TCOM" | "TCM"                                   => Text, "Composer",
	"TEXT" | "TXT"                                   => Text, "Lyricist",
	"TPUB" | "TPB"                                   => Text, "Publisher",
	"TCOP" | "TCR"                                   => Text, "Copyright",
	"TENC" | "TEN"                                   => Text, "Encoded By",
	"TSSE" | "TSS"                                   => Text, "Encoder Settings",
	"TSRC" | "TRC"                                   => Text, "ISRC",
	"TKEY" | "TKE"                                   => Text, "Initial Key",
	"TLAN" | "TLA"                                   => Text, "Language",
	"TMOO"                                           => Text, "Mood",
	"TSOA"                                           => Text, "Album Sort Order",
	"TSOP"                                           => Text, "Artist Sort Order",
	"TSOT"                                           => Text, "Title Sort Order",
	"TIPL" | "IPLS" | "IPL"                          => Text, "Involved People",
	"TMCL"                                           => Text, "Musician Credits",
	"TCON" | "TCO"                                   => Genre, "Genre",
	"TRCK" | "TRK"                                   => NumberPair, "Track Number",
	"TPOS" | "TPA"                                   => NumberPair, "Disc Number",
	"TYER" | "TYE"                                   => Date, "Year",
	"TDAT" | "TDA"                                   => Date, "Date",
	"TDRC"                                           => Date, "Recording Date",
	"TDOR" | "TORY" | "TOR"                          => Date, "Original Release Date",
	"TDRL"                                           => Date, "Release Date",
	"TBPM" | "TBP"                                   => Integer, "BPM",
	"TLEN" | "TLE"                                   => Integer, "Length",
	"TCMP" | "TCP"                                   => Boolean, "Compilation",
	"TXXX" | "TXX"                                   => Text, "User Defined Text",
	"COMM" | "COM"                                   => Text, "Comment",
	"USLT" | "ULT"                                   => Text, "Lyrics",
	"UFID" | "UFI"                                   => Text, "Unique File Identifier",
	"WXXX" | "WXX"                                   => Url, "User Defined URL",
	"WCOM" | "WCM"                                   => Url, "Commercial Information",
	"WCOP" | "WCP"                                   => Url, "Copyright Information",
	"WOAF" | "WAF"                                   => Url, "Audio File Webpage",
	"WOAR" | "WAR"                                   => Url, "Artist Webpage",
	"WOAS" | "WAS"                                   => Url, "Audio Source Webpage",
	"WORS"                                           => Url, "Radio Station Webpage",
	"WPAY"                                           => Url, "Payment",
	"WPUB" | "WPB"                                   => Url, "Publisher Webpage",
	"APIC" | "PIC"                                   => Picture, "Attached Picture",
	"POPM" | "POP"                                   => Rating, "Popularimeter",
	"PCNT" | "CNT"                                   => Counter, "Play Counter",
	"PRIV"                                           => Binary, "Private",
	"GEOB" | "GEO"                                   => Binary, "General Encapsulated Object"
);

gen_handlers!(
	ApeHandlers;

	"TITLE"                         => Text, "Title",
	"SUBTITLE"                      => Text, "Subtitle",
	"ARTIST"                        => Text, "Artist",
	"ALBUM"                         => Text, "Album",
	"ALBUM ARTIST" | "ALBUMARTIST"  => Text, "Album Artist",
	"COMPOSER"                      => Text, "Composer",
	"CONDUCTOR"                     => Text, "Conductor",
	"PUBLISHER" | "LABEL"           => Text, "Publisher",
	"COMMENT"                       => Text, "Comment",
	"COPYRIGHT"                     => Text, "Copyright",
	"LYRICS"                        => Text, "Lyrics",
	"ISRC"                          => Text, "ISRC",
	"YEAR"                          => Date, "Year",
	"RECORD DATE"                   => Date, "Recording Date",
	"GENRE"                         => Genre, "Genre",
	"TRACK"                         => NumberPair, "Track Number",
	"DISC"                          => NumberPair, "Disc Number",
	"COMPILATION"                   => Boolean, "Compilation",
	"BPM"                           => Integer, "BPM",
	"RELATED"                       => Url, "Related",
	"COVER ART (FRONT)"             => Picture, "Front Cover",
	"COVER ART (BACK)"              => Picture, "Back Cover",
	"COVER ART (OTHER)"             => Picture, "Cover Art"
);

gen_handlers!(
	VorbisHandlers;

	"TITLE"                  => Text, "Title",
	"VERSION"                => Text, "Version",
	"ALBUM"                  => Text, "Album",
	"ARTIST"                 => Text, "Artist",
	"ALBUMARTIST"            => Text, "Album Artist",
	"PERFORMER"              => Text, "Performer",
	"COMPOSER"               => Text, "Composer",
	"COPYRIGHT"              => Text, "Copyright",
	"LICENSE"                => Text, "License",
	"ORGANIZATION" | "LABEL" => Text, "Organization",
	"DESCRIPTION"            => Text, "Description",
	"COMMENT"                => Text, "Comment",
	"LYRICS"                 => Text, "Lyrics",
	"ISRC"                   => Text, "ISRC",
	"ENCODER"                => Text, "Encoder",
	"GENRE"                  => Genre, "Genre",
	"DATE"                   => Date, "Date",
	"YEAR"                   => Date, "Year",
	"TRACKNUMBER"            => NumberPair, "Track Number",
	"DISCNUMBER"             => NumberPair, "Disc Number",
	"TRACKTOTAL"             => Integer, "Track Total",
	"TOTALTRACKS"            => Integer, "Track Total",
	"DISCTOTAL"              => Integer, "Disc Total",
	"TOTALDISCS"             => Integer, "Disc Total",
	"BPM"                    => Integer, "BPM",
	"RATING"                 => Rating, "Rating",
	"COMPILATION"            => Boolean, "Compilation",
	"CONTACT"                => Url, "Contact",
	"METADATA_BLOCK_PICTURE" => Picture, "Picture",
	"COVERART"               => Picture, "Cover Art"
);

gen_handlers!(
	Mp4Handlers;

	"\u{a9}nam" => Text, "Title",
	"\u{a9}ART" => Text, "Artist",
	"\u{a9}alb" => Text, "Album",
	"aART"      => Text, "Album Artist",
	"\u{a9}wrt" => Text, "Composer",
	"\u{a9}cmt" => Text, "Comment",
	"\u{a9}lyr" => Text, "Lyrics",
	"\u{a9}too" => Text, "Encoder",
	"\u{a9}grp" => Text, "Grouping",
	"cprt"      => Text, "Copyright",
	"desc"      => Text, "Description",
	"\u{a9}day" => Date, "Date",
	"\u{a9}gen" => Genre, "Genre",
	"gnre"      => Genre, "Genre",
	"trkn"      => NumberPair, "Track Number",
	"disk"      => NumberPair, "Disc Number",
	"tmpo"      => Integer, "BPM",
	"rtng"      => Rating, "Advisory Rating",
	"cpil"      => Boolean, "Compilation",
	"pgap"      => Boolean, "Gapless Playback",
	"pcst"      => Boolean, "Podcast",
	"hdvd"      => Boolean, "HD Video",
	"shwm"      => Boolean, "Show Movement",
	"covr"      => Picture, "Cover Art"
);

gen_handlers!(
	RiffInfoHandlers;

	"INAM"          => Text, "Title",
	"IART"          => Text, "Artist",
	"IPRD"          => Text, "Album",
	"ICMT"          => Text, "Comment",
	"ICOP"          => Text, "Copyright",
	"ISFT"          => Text, "Software",
	"IENG"          => Text, "Engineer",
	"ITCH"          => Text, "Technician",
	"ISBJ"          => Text, "Subject",
	"IKEY"          => Text, "Keywords",
	"ILNG"          => Text, "Language",
	"IMUS"          => Text, "Composer",
	"IGNR"          => Genre, "Genre",
	"ICRD"          => Date, "Creation Date",
	"ITRK" | "IPRT" => NumberPair, "Track Number",
	"IFRM"          => Integer, "Track Total",
	"IRTD"          => Rating, "Rating"
);

gen_handlers!(
	BwfHandlers;

	"Description"          => Text, "Description",
	"Originator"           => Text, "Originator",
	"OriginatorReference"  => Text, "Originator Reference",
	"OriginationDate"      => Date, "Origination Date",
	"OriginationTime"      => Text, "Origination Time",
	"TimeReference"        => Integer, "Time Reference",
	"Version"              => Integer, "Version",
	"UMID"                 => Text, "UMID",
	"LoudnessValue"        => Text, "Integrated Loudness",
	"LoudnessRange"        => Text, "Loudness Range",
	"MaxTruePeakLevel"     => Text, "Maximum True Peak Level",
	"MaxMomentaryLoudness" => Text, "Maximum Momentary Loudness",
	"MaxShortTermLoudness" => Text, "Maximum Short Term Loudness",
	"CodingHistory"        => Text, "Coding History",
	"iXML"                 => Text, "iXML",
	"axml"                 => Text, "aXML",
	"link"                 => Text, "Link",
	"cue"                  => Counter, "Cue Points",
	"levl"                 => Binary, "Peak Envelope"
);

gen_handlers!(
	AiffHandlers;

	"NAME" => Text, "Title",
	"AUTH" => Text, "Author",
	"(c) " => Text, "Copyright",
	"ANNO" => Text, "Annotation",
	"COMT" => Text, "Comment"
);

gen_handlers!(
	Lyrics3Handlers;

	"IND" => Generic, "Indications",
	"LYR" => Text, "Lyrics",
	"INF" => Text, "Information",
	"AUT" => Text, "Author",
	"EAL" => Text, "Album",
	"EAR" => Text, "Artist",
	"ETT" => Text, "Title",
	"IMG" => Text, "Image Links"
);

gen_handlers!(
	AsfHandlers;

	"Title"                            => Text, "Title",
	"Author"                           => Text, "Artist",
	"Copyright"                        => Text, "Copyright",
	"Description"                      => Text, "Description",
	"Rating"                           => Text, "Rating",
	"WM/AlbumTitle"                    => Text, "Album",
	"WM/AlbumArtist"                   => Text, "Album Artist",
	"WM/Composer"                      => Text, "Composer",
	"WM/Publisher"                     => Text, "Publisher",
	"WM/Lyrics"                        => Text, "Lyrics",
	"WM/EncodedBy"                     => Text, "Encoded By",
	"WM/Genre"                         => Genre, "Genre",
	"WM/Year"                          => Date, "Year",
	"WM/TrackNumber"                   => NumberPair, "Track Number",
	"WM/PartOfSet"                     => NumberPair, "Disc Number",
	"WM/BeatsPerMinute"                => Integer, "BPM",
	"WM/SharedUserRating"              => Rating, "Rating",
	"WM/IsCompilation"                 => Boolean, "Compilation",
	"WM/Picture"                       => Picture, "Picture"
);

gen_handlers!(
	DffHandlers;

	"DITI" => Text, "Title",
	"DIAR" => Text, "Artist",
	"EMID" => Text, "Edited Master ID",
	"MARK" => Text, "Marker",
	"COMT" => Text, "Comment"
);

gen_handlers!(
	MatroskaHandlers;

	"TITLE"          => Text, "Title",
	"SUBTITLE"       => Text, "Subtitle",
	"ARTIST"         => Text, "Artist",
	"LEAD_PERFORMER" => Text, "Lead Performer",
	"COMPOSER"       => Text, "Composer",
	"CONDUCTOR"      => Text, "Conductor",
	"PUBLISHER"      => Text, "Publisher",
	"COMMENT"        => Text, "Comment",
	"DESCRIPTION"    => Text, "Description",
	"LYRICS"         => Text, "Lyrics",
	"ENCODER"        => Text, "Encoder",
	"COPYRIGHT"      => Text, "Copyright",
	"ISRC"           => Text, "ISRC",
	"GENRE"          => Genre, "Genre",
	"DATE_RELEASED"  => Date, "Release Date",
	"DATE_RECORDED"  => Date, "Recording Date",
	"PART_NUMBER"    => Integer, "Part Number",
	"TOTAL_PARTS"    => Integer, "Total Parts",
	"BPM"            => Integer, "BPM",
	"RATING"         => Rating, "Rating",
	"URL"            => Url, "URL"
);

#[cfg(test)]
mod tests {
	use super::*;

	#[test_log::test]
	fn lookup_falls_back_to_generic() {
		let handler = FieldHandler::lookup(TagFormat::Id3v2_3, "XYZW");
		assert_eq!(handler, FieldHandler::GENERIC);
		assert_eq!(handler.label(), None);

		let handler = FieldHandler::lookup(TagFormat::Id3v2_3, "TXXX:REPLAYGAIN_TRACK_GAIN");
		assert_eq!(handler.kind(), FieldKind::Text);
	}

	#[test_log::test]
	fn ape_keys_are_case_insensitive() {
		let handler = FieldHandler::lookup(TagFormat::ApeV2, "Title");
		assert_eq!(handler.label(), Some("Title"));
	}

	#[test_log::test]
	fn matroska_target_prefix_is_ignored() {
		let handler = FieldHandler::lookup(TagFormat::Matroska, "30:PART_NUMBER");
		assert_eq!(handler.kind(), FieldKind::Integer);
	}

	#[test_log::test]
	fn interpretation() {
		let handler = FieldHandler::lookup(TagFormat::Id3v2_4, "TCON");
		assert_eq!(
			handler.interpret(FieldValue::Text(String::from("(17)"))),
			FieldValue::Text(String::from("Rock"))
		);

		let handler = FieldHandler::lookup(TagFormat::Id3v2_4, "TBPM");
		assert_eq!(
			handler.interpret(FieldValue::Text(String::from("128"))),
			FieldValue::Integer(128)
		);

		// Uninterpretable values are kept as is
		assert_eq!(
			handler.interpret(FieldValue::Text(String::from("fast"))),
			FieldValue::Text(String::from("fast"))
		);

		let handler = FieldHandler::lookup(TagFormat::Mp4Ilst, "cpil");
		assert_eq!(
			handler.interpret(FieldValue::Integer(1)),
			FieldValue::Boolean(true)
		);
	}

	#[test_log::test]
	fn number_pairs() {
		assert_eq!(
			parse_number_pair("3/"),
			Some(FieldValue::NumberPair {
				current: 3,
				total: None
			})
		);
		assert_eq!(parse_number_pair("a/3"), None);
		assert_eq!(parse_number_pair(""), None);
	}
}
