use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::err;
use crate::util::io::FileSource;
use crate::util::num::{read_u32_be, read_u64_be};

use std::io::{Read, Seek};

pub(super) const FOURCC_LEN: u64 = 4;
pub(super) const IDENTIFIER_LEN: u64 = 4;
pub(super) const ATOM_HEADER_LEN: u64 = FOURCC_LEN + IDENTIFIER_LEN;
pub(super) const EXTENDED_ATOM_HEADER_LEN: u64 = ATOM_HEADER_LEN + 8;

/// An atom header, the content is left where it was found
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct AtomInfo {
	pub(crate) start: u64,
	pub(crate) len: u64,
	pub(crate) extended: bool,
	pub(crate) ident: [u8; 4],
}

// The format permits any characters to be used in atom identifiers. This doesn't
// leave us any room for error detection.
//
// TagLib has decided on a character set to consider valid, so we will do the same:
// <https://github.com/taglib/taglib/issues/1077#issuecomment-1440385838>
fn is_valid_identifier_byte(b: u8) -> bool {
	(b' '..=b'~').contains(&b) || b == b'\xA9'
}

impl AtomInfo {
	/// Read the header of the atom at `start`, bounded by its parent ending at `parent_end`
	pub(crate) fn read<R>(
		source: &mut FileSource<R>,
		start: u64,
		parent_end: u64,
		parse_mode: ParsingMode,
	) -> Result<Option<Self>>
	where
		R: Read + Seek,
	{
		let available = parent_end.saturating_sub(start);
		let header = source.read_vec_clamped(start, available.min(EXTENDED_ATOM_HEADER_LEN))?;
		Self::parse(&header, start, available, parse_mode)
	}

	/// Parse an atom header from the first bytes of `data`
	///
	/// `available` is the number of bytes between `start` and the end of the parent atom (or file).
	/// `Ok(None)` means the walk should stop here.
	pub(crate) fn parse(
		data: &[u8],
		start: u64,
		available: u64,
		parse_mode: ParsingMode,
	) -> Result<Option<Self>> {
		if data.len() < ATOM_HEADER_LEN as usize || available < ATOM_HEADER_LEN {
			if available > 0 {
				log::warn!("Found {available} trailing bytes that can't hold an atom, stopping");
			}

			return Ok(None);
		}

		let len_raw = read_u32_be(data);

		let mut ident = [0; IDENTIFIER_LEN as usize];
		ident.copy_from_slice(&data[4..8]);

		if !ident.iter().copied().all(is_valid_identifier_byte) {
			match parse_mode {
				ParsingMode::Strict => {
					err!(BadAtom("Encountered an atom with invalid characters"));
				},
				ParsingMode::BestAttempt | ParsingMode::Relaxed => {
					log::warn!("Encountered an atom with invalid characters at {start}, stopping");
					return Ok(None);
				},
			}
		}

		let (len, extended) = match len_raw {
			// The atom extends to the end of its parent
			0 => (available, false),
			// There's an extended length
			1 => {
				let Some(extended_len) = data.get(8..16) else {
					err!(BadAtom("Found an incomplete extended length"));
				};

				(read_u64_be(extended_len), true)
			},
			_ => (u64::from(len_raw), false),
		};

		let header_size = if extended {
			EXTENDED_ATOM_HEADER_LEN
		} else {
			ATOM_HEADER_LEN
		};

		if len < header_size {
			err!(BadAtom("Found an invalid length (< 8)"));
		}

		if len > available {
			log::warn!(
				"Atom \"{}\" at {start} claims {len} bytes, only {available} remain",
				ident.escape_ascii()
			);

			// As with all formats, there's a good chance certain software won't know how to actually use padding.
			// If the file ends with an incorrectly sized padding atom, we can just ignore it.
			let skippable = (parse_mode != ParsingMode::Strict && ident == *b"free")
				|| parse_mode == ParsingMode::Relaxed;
			if skippable {
				return Ok(None);
			}

			err!(SizeMismatch);
		}

		log::trace!(
			"Found atom \"{}\" at {start}, size: {len}",
			ident.escape_ascii()
		);

		Ok(Some(Self {
			start,
			len,
			extended,
			ident,
		}))
	}

	pub(crate) fn header_size(&self) -> u64 {
		if !self.extended {
			return ATOM_HEADER_LEN;
		}

		EXTENDED_ATOM_HEADER_LEN
	}

	pub(crate) fn content_start(&self) -> u64 {
		self.start + self.header_size()
	}

	pub(crate) fn end(&self) -> u64 {
		self.start + self.len
	}

	/// Whether `offset` falls within this atom
	pub(crate) fn contains(&self, offset: u64) -> bool {
		(self.start..self.end()).contains(&offset)
	}
}
