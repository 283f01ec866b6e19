//! Text decoding shared by every format
//!
//! Tags declare their text encoding in very different ways. ID3v2 carries an explicit encoding
//! byte, Vorbis Comments and APE are always UTF-8, and fixed-layout formats (ID3v1, RIFF INFO, BWF)
//! declare nothing at all. The latter go through [`decode_with_fallback`], which tries an ordered
//! chain of candidate charsets and keeps the first one whose output looks like text.

use crate::error::{ErrorKind, Result, TagError};
use crate::macros::err;

/// The text encoding for use in ID3v2 frames
#[derive(Debug, Clone, Eq, PartialEq, Copy, Hash)]
#[repr(u8)]
pub enum TextEncoding {
	/// ISO-8859-1
	Latin1 = 0,
	/// UTF-16 with a byte order mark
	UTF16 = 1,
	/// UTF-16 big endian
	UTF16BE = 2,
	/// UTF-8
	UTF8 = 3,
}

impl TextEncoding {
	/// Get a `TextEncoding` from a u8, must be 0-3 inclusive
	pub fn from_u8(byte: u8) -> Option<Self> {
		match byte {
			0 => Some(Self::Latin1),
			1 => Some(Self::UTF16),
			2 => Some(Self::UTF16BE),
			3 => Some(Self::UTF8),
			_ => None,
		}
	}

	/// The width of a NUL terminator in this encoding
	pub(crate) fn terminator_len(self) -> usize {
		match self {
			Self::Latin1 | Self::UTF8 => 1,
			Self::UTF16 | Self::UTF16BE => 2,
		}
	}
}

/// A candidate charset in the fallback chain used for undeclared text
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Charset {
	/// UTF-8
	Utf8,
	/// Windows-1252, a superset of the printable ISO-8859-1 range
	Windows1252,
	/// ISO-8859-1, byte-for-byte
	Latin1,
	/// 7-bit US-ASCII
	Ascii,
}

impl Charset {
	fn decode(self, bytes: &[u8]) -> Option<String> {
		match self {
			Charset::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
			Charset::Windows1252 => Some(windows_1252_decode(bytes)),
			Charset::Latin1 => Some(latin1_decode(bytes)),
			Charset::Ascii => bytes
				.is_ascii()
				.then(|| bytes.iter().map(|b| char::from(*b)).collect()),
		}
	}
}

type Validator = fn(&str) -> bool;

/// The chain tried after the declared charset, in order
const FALLBACK_CHAIN: [(Charset, Validator); 3] = [
	(Charset::Utf8, is_mostly_printable),
	(Charset::Windows1252, is_mostly_printable),
	(Charset::Ascii, is_mostly_printable),
];

/// Decode bytes of an undeclared or untrusted encoding
///
/// The declared charset (if any) is tried first, followed by UTF-8, Windows-1252, and US-ASCII.
/// Each candidate must pass a printable-character check before it is accepted. If none is
/// accepted, the bytes are mapped one-to-one as ISO-8859-1, which cannot fail.
///
/// Trailing NUL characters are removed from the result.
///
/// # Examples
///
/// ```rust
/// use tagscout::util::text::{Charset, decode_with_fallback};
///
/// // Valid UTF-8 is kept as is
/// assert_eq!(decode_with_fallback("Café".as_bytes(), None), "Café");
///
/// // Not valid UTF-8, so it falls through to Windows-1252
/// assert_eq!(decode_with_fallback(b"Caf\xE9 \x93live\x94", None), "Café \u{201C}live\u{201D}");
/// ```
pub fn decode_with_fallback(bytes: &[u8], declared: Option<Charset>) -> String {
	let declared_candidate =
		declared.map(|charset| -> (Charset, Validator) { (charset, is_mostly_printable) });

	for (charset, validator) in declared_candidate.into_iter().chain(FALLBACK_CHAIN) {
		let Some(mut decoded) = charset.decode(bytes) else {
			continue;
		};

		trim_end_nulls(&mut decoded);
		if validator(&decoded) {
			if declared.is_some_and(|declared| declared != charset) {
				log::warn!(
					"Text is not valid {:?}, decoded as {:?} instead",
					declared,
					charset
				);
			}

			return decoded;
		}
	}

	log::warn!("No charset produced readable text, falling back to ISO-8859-1");
	latin1_decode(bytes)
}

/// Whether at least 90% of the characters are printable
///
/// Printable means ASCII graphic characters and spaces, TAB/LF/CR, or non-control characters above
/// the ASCII range.
pub(crate) fn is_mostly_printable(text: &str) -> bool {
	let mut total = 0usize;
	let mut printable = 0usize;

	for c in text.chars() {
		total += 1;

		let is_printable = matches!(c, ' '..='~' | '\t' | '\n' | '\r')
			|| (u32::from(c) >= 0xA0 && !c.is_control());
		if is_printable {
			printable += 1;
		}
	}

	total == 0 || printable * 10 >= total * 9
}

/// Extract a fixed-width string field
///
/// The field ends at the first NUL or after `length` bytes, whichever is first. Fields that
/// extend past the end of `buf` are cut short.
pub fn extract_fixed_string(
	buf: &[u8],
	offset: usize,
	length: usize,
	declared: Option<Charset>,
) -> String {
	let start = offset.min(buf.len());
	let end = offset.saturating_add(length).min(buf.len());
	let field = &buf[start..end];

	let text_end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
	decode_with_fallback(&field[..text_end], declared)
}

/// Extract a NUL-terminated string of at most `max_length` bytes
///
/// Returns the decoded string, along with the number of bytes consumed (including the terminator,
/// if one was found).
pub fn extract_null_terminated(
	buf: &[u8],
	offset: usize,
	max_length: usize,
	declared: Option<Charset>,
) -> (String, usize) {
	let start = offset.min(buf.len());
	let end = offset.saturating_add(max_length).min(buf.len());
	let field = &buf[start..end];

	match field.iter().position(|b| *b == 0) {
		Some(nul) => (decode_with_fallback(&field[..nul], declared), nul + 1),
		None => (decode_with_fallback(field, declared), field.len()),
	}
}

/// Decode text with an explicitly declared encoding
///
/// Unlike [`decode_with_fallback`], this fails if the bytes are invalid in the declared encoding.
/// Trailing NUL characters are removed.
pub(crate) fn decode_text(bytes: &[u8], encoding: TextEncoding) -> Result<String> {
	if bytes.is_empty() {
		return Ok(String::new());
	}

	match encoding {
		TextEncoding::Latin1 => Ok(latin1_decode(bytes)),
		TextEncoding::UTF8 => utf8_decode(bytes.to_vec()),
		TextEncoding::UTF16BE => utf16_decode_bytes(bytes, u16::from_be_bytes),
		TextEncoding::UTF16 => {
			if bytes.len() < 2 {
				err!(TextDecode("UTF-16 string has an invalid length (< 2)"));
			}

			match [bytes[0], bytes[1]] {
				[0xFE, 0xFF] => utf16_decode_bytes(&bytes[2..], u16::from_be_bytes),
				[0xFF, 0xFE] => utf16_decode_bytes(&bytes[2..], u16::from_le_bytes),
				_ => {
					log::warn!("UTF-16 string has no byte order mark, assuming little endian");
					utf16_decode_bytes(bytes, u16::from_le_bytes)
				},
			}
		},
	}
}

/// Split `bytes` at the first terminator for `encoding`
///
/// Returns the text before the terminator, and everything after it. If no terminator is
/// found, all of `bytes` is the text.
pub(crate) fn split_terminated(bytes: &[u8], encoding: TextEncoding) -> (&[u8], &[u8]) {
	match encoding.terminator_len() {
		1 => match bytes.iter().position(|b| *b == 0) {
			Some(pos) => (&bytes[..pos], &bytes[pos + 1..]),
			None => (bytes, &[]),
		},
		_ => {
			let mut pos = 0;
			while pos + 1 < bytes.len() {
				if bytes[pos] == 0 && bytes[pos + 1] == 0 {
					return (&bytes[..pos], &bytes[pos + 2..]);
				}

				pos += 2;
			}

			(bytes, &[])
		},
	}
}

pub(crate) fn latin1_decode(bytes: &[u8]) -> String {
	let mut text = bytes.iter().map(|c| char::from(*c)).collect::<String>();
	trim_end_nulls(&mut text);
	text
}

pub(crate) fn windows_1252_decode(bytes: &[u8]) -> String {
	const HIGH_CONTROL_RANGE: [char; 32] = [
		'\u{20AC}', '\u{81}', '\u{201A}', '\u{192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
		'\u{2C6}', '\u{2030}', '\u{160}', '\u{2039}', '\u{152}', '\u{8D}', '\u{17D}', '\u{8F}',
		'\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
		'\u{2DC}', '\u{2122}', '\u{161}', '\u{203A}', '\u{153}', '\u{9D}', '\u{17E}', '\u{178}',
	];

	bytes
		.iter()
		.map(|b| match b {
			0x80..=0x9F => HIGH_CONTROL_RANGE[usize::from(b - 0x80)],
			_ => char::from(*b),
		})
		.collect()
}

pub(crate) fn utf8_decode(bytes: Vec<u8>) -> Result<String> {
	String::from_utf8(bytes)
		.map(|mut text| {
			trim_end_nulls(&mut text);
			text
		})
		.map_err(Into::into)
}

pub(crate) fn utf16_decode_bytes(bytes: &[u8], endianness: fn([u8; 2]) -> u16) -> Result<String> {
	if bytes.is_empty() {
		return Ok(String::new());
	}

	if bytes.len() % 2 != 0 {
		err!(TextDecode("UTF-16 string has an odd length"));
	}

	let unverified: Vec<u16> = bytes
		.chunks_exact(2)
		.map(|c| endianness([c[0], c[1]]))
		.collect();

	String::from_utf16(&unverified)
		.map(|mut text| {
			trim_end_nulls(&mut text);
			text
		})
		.map_err(|_| TagError::new(ErrorKind::TextDecode("Given an invalid UTF-16 string")))
}

/// Decode UTF-16LE, as used throughout ASF
pub(crate) fn utf16le_decode(bytes: &[u8]) -> Result<String> {
	utf16_decode_bytes(bytes, u16::from_le_bytes)
}

pub(crate) fn trim_end_nulls(text: &mut String) {
	if text.ends_with('\0') {
		let new_len = text.trim_end_matches('\0').len();
		text.truncate(new_len);
	}
}

/// Join the NUL-separated values of a multi-value field with `"; "`
pub(crate) fn join_multi_value(text: &str) -> String {
	text.split('\0')
		.filter(|value| !value.is_empty())
		.collect::<Vec<_>>()
		.join("; ")
}

#[cfg(test)]
mod tests {
	use super::*;

	const TEST_STRING: &str = "l\u{00f8}ft\u{00a5}";

	#[test_log::test]
	fn text_decode() {
		// No BOM
		let utf16_decode = decode_text(
			&[
				0x00, 0x6C, 0x00, 0xF8, 0x00, 0x66, 0x00, 0x74, 0x00, 0xA5, 0x00, 0x00,
			],
			TextEncoding::UTF16BE,
		)
		.unwrap();

		assert_eq!(utf16_decode, TEST_STRING.to_string());

		// BOM test
		let be_utf16_decode = decode_text(
			&[
				0xFE, 0xFF, 0x00, 0x6C, 0x00, 0xF8, 0x00, 0x66, 0x00, 0x74, 0x00, 0xA5, 0x00, 0x00,
			],
			TextEncoding::UTF16,
		)
		.unwrap();
		let le_utf16_decode = decode_text(
			&[
				0xFF, 0xFE, 0x6C, 0x00, 0xF8, 0x00, 0x66, 0x00, 0x74, 0x00, 0xA5, 0x00, 0x00, 0x00,
			],
			TextEncoding::UTF16,
		)
		.unwrap();

		assert_eq!(be_utf16_decode, le_utf16_decode);
		assert_eq!(be_utf16_decode, TEST_STRING.to_string());

		let utf8_decode = decode_text(TEST_STRING.as_bytes(), TextEncoding::UTF8).unwrap();
		assert_eq!(utf8_decode, TEST_STRING.to_string());
	}

	#[test_log::test]
	fn odd_utf16_is_rejected() {
		assert!(decode_text(&[0xFF, 0xFE, 0x6C], TextEncoding::UTF16).is_err());
	}

	#[test_log::test]
	fn terminated_split() {
		let (text, rest) = split_terminated(b"abc\0def", TextEncoding::Latin1);
		assert_eq!(text, b"abc");
		assert_eq!(rest, b"def");

		// The terminator must be aligned to a code unit
		let bytes = [0x61, 0x00, 0x00, 0x62, 0x00, 0x00, 0x63, 0x00];
		let (text, rest) = split_terminated(&bytes, TextEncoding::UTF16BE);
		assert_eq!(text, &[0x61, 0x00, 0x00, 0x62]);
		assert_eq!(rest, &[0x63, 0x00]);
	}

	#[test_log::test]
	fn fallback_chain() {
		// Declared charset that doesn't fit
		assert_eq!(
			decode_with_fallback("naïve".as_bytes(), Some(Charset::Ascii)),
			"naïve"
		);

		// Binary junk still produces something
		let junk = [0x01, 0x02, 0x03, 0x04, 0x05];
		assert_eq!(decode_with_fallback(&junk, None).chars().count(), 5);
	}

	#[test_log::test]
	fn printable_ratio() {
		assert!(is_mostly_printable(""));
		assert!(is_mostly_printable("Hello\tworld\r\n"));
		assert!(is_mostly_printable("abcdefghi\u{1}"));
		assert!(!is_mostly_printable("abcdefgh\u{1}\u{2}"));
	}

	#[test_log::test]
	fn fixed_strings() {
		let buf = b"TAGTitle\0\0\0\0Artist";
		assert_eq!(extract_fixed_string(buf, 3, 9, None), "Title");
		assert_eq!(extract_fixed_string(buf, 12, 30, None), "Artist");
		assert_eq!(extract_fixed_string(buf, 100, 30, None), "");

		let (text, consumed) = extract_null_terminated(buf, 3, 64, None);
		assert_eq!(text, "Title");
		assert_eq!(consumed, 6);
	}

	#[test_log::test]
	fn multi_value_join() {
		assert_eq!(join_multi_value("A\0B\0"), "A; B");
		assert_eq!(join_multi_value("A"), "A");
	}
}
