use std::fmt::{Display, Formatter};

/// The value of a [`MetadataField`](crate::tag::MetadataField)
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldValue {
	/// Any UTF-8 string
	Text(String),
	/// A signed integer
	Integer(i64),
	/// A "current/total" pair, such as a track or disc number
	NumberPair {
		/// The current number
		current: u32,
		/// The total, if one was stored
		total: Option<u32>,
	},
	/// A flag
	Boolean(bool),
	/// A reference to an external resource (APE external items)
	Locator(String),
	/// Opaque binary data
	Binary(BinaryData),
	/// An embedded picture
	Picture(PictureData),
}

impl FieldValue {
	/// Returns the text if the value is [`FieldValue::Text`] or [`FieldValue::Locator`]
	pub fn text(&self) -> Option<&str> {
		match self {
			FieldValue::Text(text) | FieldValue::Locator(text) => Some(text),
			_ => None,
		}
	}

	/// Whether the value is empty text or an empty payload
	pub fn is_empty(&self) -> bool {
		match self {
			FieldValue::Text(text) | FieldValue::Locator(text) => text.is_empty(),
			FieldValue::Binary(binary) => binary.size == 0,
			FieldValue::Picture(picture) => picture.size == 0,
			_ => false,
		}
	}
}

impl Display for FieldValue {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			FieldValue::Text(text) | FieldValue::Locator(text) => f.write_str(text),
			FieldValue::Integer(value) => write!(f, "{value}"),
			FieldValue::NumberPair {
				current,
				total: Some(total),
			} => write!(f, "{current}/{total}"),
			FieldValue::NumberPair {
				current,
				total: None,
			} => write!(f, "{current}"),
			FieldValue::Boolean(value) => write!(f, "{value}"),
			FieldValue::Binary(binary) => write!(f, "{binary}"),
			FieldValue::Picture(picture) => write!(f, "{picture}"),
		}
	}
}

/// A bounded summary of a binary payload
///
/// The full payload is never kept. Only its size, and the first few bytes as set by
/// [`ParseOptions::max_preview_len`](crate::config::ParseOptions::max_preview_len).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryData {
	/// The size of the full payload
	pub size: u64,
	/// The first bytes of the payload
	pub preview: Vec<u8>,
	/// An owner identifier, MIME type, or other descriptor stored alongside the payload
	pub label: Option<String>,
}

impl BinaryData {
	pub(crate) fn new(payload: &[u8], max_preview_len: usize, label: Option<String>) -> Self {
		Self {
			size: payload.len() as u64,
			preview: payload[..payload.len().min(max_preview_len)].to_vec(),
			label,
		}
	}
}

impl Display for BinaryData {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match &self.label {
			Some(label) => write!(f, "<{} bytes, {label}>", self.size),
			None => write!(f, "<{} bytes>", self.size),
		}
	}
}

/// A bounded summary of an embedded picture
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PictureData {
	/// The MIME type, if stored or derivable
	pub mime_type: Option<String>,
	/// The ID3v2 APIC picture type (3 is the front cover)
	pub picture_type: u8,
	/// The picture description
	pub description: String,
	/// The size of the image data
	pub size: u64,
	/// The first bytes of the image data
	pub preview: Vec<u8>,
}

impl PictureData {
	pub(crate) fn new(
		mime_type: Option<String>,
		picture_type: u8,
		description: String,
		data: &[u8],
		max_preview_len: usize,
	) -> Self {
		let mime_type = mime_type
			.filter(|mime| !mime.is_empty())
			.or_else(|| sniff_mime_type(data).map(str::to_owned));

		Self {
			mime_type,
			picture_type,
			description,
			size: data.len() as u64,
			preview: data[..data.len().min(max_preview_len)].to_vec(),
		}
	}
}

impl Display for PictureData {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"<picture type {}, {}, {} bytes>",
			self.picture_type,
			self.mime_type.as_deref().unwrap_or("unknown"),
			self.size
		)
	}
}

/// Guess a MIME type from the magic bytes of an image
pub(crate) fn sniff_mime_type(data: &[u8]) -> Option<&'static str> {
	match data {
		[0x89, b'P', b'N', b'G', ..] => Some("image/png"),
		[0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
		[b'G', b'I', b'F', ..] => Some("image/gif"),
		[b'B', b'M', ..] => Some("image/bmp"),
		[b'I', b'I', b'*', 0, ..] | [b'M', b'M', 0, b'*', ..] => Some("image/tiff"),
		_ => None,
	}
}
