use crate::ebml::vint::{ElementId, VInt};
use crate::error::Result;
use crate::macros::err;
use crate::util::io::FileSource;

use std::io::{Read, Seek};

// The elements we care about, everything else is skipped by size
pub(crate) const EBML_HEADER_ID: u64 = 0x1A45_DFA3;
pub(crate) const DOC_TYPE_ID: u64 = 0x4282;
#[cfg(test)]
pub(crate) const SEGMENT_ID: u64 = 0x1853_8067;
pub(crate) const TAGS_ID: u64 = 0x1254_C367;
pub(crate) const TAG_ID: u64 = 0x7373;
pub(crate) const TARGETS_ID: u64 = 0x63C0;
pub(crate) const TARGET_TYPE_VALUE_ID: u64 = 0x68CA;
pub(crate) const SIMPLE_TAG_ID: u64 = 0x67C8;
pub(crate) const TAG_NAME_ID: u64 = 0x45A3;
pub(crate) const TAG_STRING_ID: u64 = 0x4487;
pub(crate) const TAG_BINARY_ID: u64 = 0x4485;

/// The largest possible element header, a 4 octet ID and an 8 octet size
pub(crate) const MAX_HEADER_LEN: u64 = 12;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) struct ElementHeader {
	pub(crate) id: ElementId,
	pub(crate) size: VInt,
	pub(crate) header_len: u64,
}

impl ElementHeader {
	/// Parse the element header at the start of `data`
	pub(crate) fn parse(data: &[u8]) -> Result<Self> {
		let (id, id_len) = ElementId::parse(data, ElementId::MAX_LENGTH)?;
		let (size, size_len) = VInt::parse(&data[usize::from(id_len)..], VInt::MAX_OCTET_LENGTH)?;

		Ok(Self {
			id,
			size,
			header_len: u64::from(id_len + size_len),
		})
	}
}

/// An element found in the file, its content is left where it was found
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) struct Element {
	pub(crate) header: ElementHeader,
	pub(crate) start: u64,
	/// The end of the content, the end of the parent for unknown-sized elements
	pub(crate) end: u64,
}

impl Element {
	pub(crate) fn len(&self) -> u64 {
		self.end - self.start
	}
}

/// A walker over the children of a master element in the file
pub(crate) struct ElementReader {
	offset: u64,
	end: u64,
}

impl ElementReader {
	pub(crate) fn new(start: u64, end: u64) -> Self {
		Self { offset: start, end }
	}

	/// Read the next element header
	///
	/// # Errors
	///
	/// * The header is malformed (see [`VInt::parse`])
	/// * The element extends past the end of its parent
	pub(crate) fn next<R>(&mut self, source: &mut FileSource<R>) -> Result<Option<Element>>
	where
		R: Read + Seek,
	{
		if self.offset >= self.end {
			return Ok(None);
		}

		let available = self.end - self.offset;
		let header_bytes = source.read_vec_clamped(self.offset, available.min(MAX_HEADER_LEN))?;
		let header = ElementHeader::parse(&header_bytes)?;

		let content_start = self.offset + header.header_len;
		let end = match header.size.known() {
			Some(size) => content_start.saturating_add(size),
			None => self.end,
		};

		if content_start > self.end || end > self.end {
			log::warn!(
				"Element {:?} at {} extends past the end of its parent",
				header.id,
				self.offset
			);
			err!(SizeMismatch);
		}

		log::trace!(
			"Found element {:?} at {}, size: {}",
			header.id,
			self.offset,
			header.size
		);

		let element = Element {
			header,
			start: self.offset,
			end,
		};

		self.offset = end;
		Ok(Some(element))
	}
}

/// A walker over the children of a master element held in memory
pub(crate) struct ElementChildren<'a> {
	data: &'a [u8],
}

impl<'a> ElementChildren<'a> {
	pub(crate) fn new(data: &'a [u8]) -> Self {
		Self { data }
	}

	/// Split off the next child, returning its header and content
	///
	/// An unknown-sized child extends to the end of the parent.
	pub(crate) fn next(&mut self) -> Result<Option<(ElementHeader, &'a [u8])>> {
		if self.data.is_empty() {
			return Ok(None);
		}

		let header = ElementHeader::parse(self.data)?;
		let content_start = header.header_len as usize;

		let content_end = match header.size.known() {
			Some(size) => usize::try_from(size)
				.ok()
				.and_then(|size| content_start.checked_add(size)),
			None => Some(self.data.len()),
		};

		let Some(content) = content_end.and_then(|end| self.data.get(content_start..end)) else {
			log::warn!("Element {:?} extends past the end of its parent", header.id);
			err!(SizeMismatch);
		};

		self.data = &self.data[content_start + content.len()..];
		Ok(Some((header, content)))
	}
}
