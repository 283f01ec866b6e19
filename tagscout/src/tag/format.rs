/// A specific tag variant
///
/// This is the key both detection and parsing dispatch on. Unlike a container format, a
/// `TagFormat` identifies the exact revision of a tag, so two tags of the same family found in
/// one file (ex. an ID3v2.3 tag at the start, and an ID3v1.1 tag at the end) are told apart.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
#[allow(non_camel_case_types)]
pub enum TagFormat {
	/// ID3v1, 128 bytes at the end of the file
	Id3v1,
	/// ID3v1.1, ID3v1 with a track number in the last two bytes of the comment
	Id3v1_1,
	/// ID3v2.2
	Id3v2_2,
	/// ID3v2.3
	Id3v2_3,
	/// ID3v2.4
	Id3v2_4,
	/// APEv1, footer only
	ApeV1,
	/// APEv2
	ApeV2,
	/// Vorbis Comments, either in an Ogg stream or a FLAC metadata block
	VorbisComments,
	/// An MP4 `ilst` atom, located through its enclosing `moov`
	Mp4Ilst,
	/// A RIFF `LIST` chunk of type `INFO`
	RiffInfo,
	/// A Broadcast Wave Format `bext` chunk, version 0
	BwfV0,
	/// A Broadcast Wave Format `bext` chunk, version 1
	BwfV1,
	/// A Broadcast Wave Format `bext` chunk, version 2
	BwfV2,
	/// AIFF text chunks (`NAME`, `AUTH`, `(c) `, `ANNO`, `COMT`)
	AiffText,
	/// Lyrics3 v1
	Lyrics3v1,
	/// Lyrics3 v2
	Lyrics3v2,
	/// The ASF Content Description object
	AsfContentDescription,
	/// The ASF Extended Content Description object
	AsfExtendedContentDescription,
	/// The ASF Metadata object
	AsfMetadata,
	/// The ASF Metadata Library object
	AsfMetadataLibrary,
	/// DSDIFF `DIIN` and `COMT` chunks
	DffText,
	/// A Matroska `Tags` element
	Matroska,
	/// A `Tags` element in a WebM file
	WebM,
}

impl TagFormat {
	/// A human-readable name for the format
	///
	/// # Examples
	///
	/// ```rust
	/// use tagscout::tag::TagFormat;
	///
	/// assert_eq!(TagFormat::Id3v2_3.name(), "ID3v2.3");
	/// ```
	pub fn name(self) -> &'static str {
		match self {
			Self::Id3v1 => "ID3v1",
			Self::Id3v1_1 => "ID3v1.1",
			Self::Id3v2_2 => "ID3v2.2",
			Self::Id3v2_3 => "ID3v2.3",
			Self::Id3v2_4 => "ID3v2.4",
			Self::ApeV1 => "APEv1",
			Self::ApeV2 => "APEv2",
			Self::VorbisComments => "Vorbis Comments",
			Self::Mp4Ilst => "MP4 ilst",
			Self::RiffInfo => "RIFF INFO",
			Self::BwfV0 => "BWF v0",
			Self::BwfV1 => "BWF v1",
			Self::BwfV2 => "BWF v2",
			Self::AiffText => "AIFF text chunks",
			Self::Lyrics3v1 => "Lyrics3 v1",
			Self::Lyrics3v2 => "Lyrics3 v2",
			Self::AsfContentDescription => "ASF Content Description",
			Self::AsfExtendedContentDescription => "ASF Extended Content Description",
			Self::AsfMetadata => "ASF Metadata",
			Self::AsfMetadataLibrary => "ASF Metadata Library",
			Self::DffText => "DSDIFF text chunks",
			Self::Matroska => "Matroska Tags",
			Self::WebM => "WebM Tags",
		}
	}

	/// Whether this is any ID3v2 revision
	pub fn is_id3v2(self) -> bool {
		matches!(self, Self::Id3v2_2 | Self::Id3v2_3 | Self::Id3v2_4)
	}

	/// Whether this is any BWF revision
	pub fn is_bwf(self) -> bool {
		matches!(self, Self::BwfV0 | Self::BwfV1 | Self::BwfV2)
	}

	/// Whether this is any ASF object
	pub fn is_asf(self) -> bool {
		matches!(
			self,
			Self::AsfContentDescription
				| Self::AsfExtendedContentDescription
				| Self::AsfMetadata
				| Self::AsfMetadataLibrary
		)
	}
}

impl std::fmt::Display for TagFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}
