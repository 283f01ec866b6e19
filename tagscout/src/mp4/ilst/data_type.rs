/// The [well known] basic data types used by `data` atoms
///
/// [well known]: https://developer.apple.com/documentation/quicktime-file-format/well-known_types
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum DataType {
	/// Reserved for use where no type needs to be indicated
	Reserved,
	/// UTF-8 string without any count or NULL terminator
	Utf8,
	/// A big-endian UTF-16 string
	Utf16,
	/// The UTF-8 variant storage of a string for sorting only
	Utf8Sort,
	/// The UTF-16 variant storage of a string for sorting only
	Utf16Sort,
	/// **DEPRECATED** A GIF image
	Gif,
	/// A JPEG in a JFIF wrapper
	Jpeg,
	/// A PNG in a PNG wrapper
	Png,
	/// A big-endian signed integer in 1,2,3 or 4 bytes
	BeSignedInteger,
	/// A big-endian unsigned integer in 1,2,3 or 4 bytes; size of value determines integer size
	BeUnsignedInteger,
	/// Windows bitmap format graphics
	Bmp,
	/// A big-endian 64-bit signed integer
	Be64BitSignedInteger,
	/// Some other data type
	Other(u32),
}

impl From<u32> for DataType {
	fn from(value: u32) -> Self {
		match value {
			0 => DataType::Reserved,
			1 => DataType::Utf8,
			2 => DataType::Utf16,
			4 => DataType::Utf8Sort,
			5 => DataType::Utf16Sort,
			12 => DataType::Gif,
			13 => DataType::Jpeg,
			14 => DataType::Png,
			21 => DataType::BeSignedInteger,
			22 => DataType::BeUnsignedInteger,
			27 => DataType::Bmp,
			74 => DataType::Be64BitSignedInteger,
			other => DataType::Other(other),
		}
	}
}

impl DataType {
	/// The MIME type of an image data type
	pub(crate) fn image_mime_type(self) -> Option<&'static str> {
		match self {
			DataType::Gif => Some("image/gif"),
			DataType::Jpeg => Some("image/jpeg"),
			DataType::Png => Some("image/png"),
			DataType::Bmp => Some("image/bmp"),
			_ => None,
		}
	}
}
