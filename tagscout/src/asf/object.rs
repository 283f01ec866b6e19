use super::guid::Guid;
use crate::error::Result;
use crate::macros::decode_err;
use crate::util::io::FileSource;
use crate::util::num::read_u64_le;

use std::io::{Read, Seek};

/// GUID (16) + size (8)
pub(crate) const OBJECT_HEADER_SIZE: u64 = 24;

/// An object header, the content is left in the file
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ObjectHeader {
	pub(crate) guid: Guid,
	pub(crate) start: u64,
	/// The size of the entire object, including its header
	pub(crate) size: u64,
}

impl ObjectHeader {
	pub(crate) fn end(&self) -> u64 {
		self.start + self.size
	}
}

/// A walker over a sequence of objects between `start` and `end`
pub(crate) struct Objects {
	offset: u64,
	end: u64,
}

impl Objects {
	pub(crate) fn new(start: u64, end: u64) -> Self {
		Self { offset: start, end }
	}

	/// Read the next object header
	///
	/// # Errors
	///
	/// * The object is smaller than its own header
	/// * The object extends past `end`
	pub(crate) fn next<R>(&mut self, source: &mut FileSource<R>) -> Result<Option<ObjectHeader>>
	where
		R: Read + Seek,
	{
		if self.end.saturating_sub(self.offset) < OBJECT_HEADER_SIZE {
			return Ok(None);
		}

		let header = source.read_array_at::<24>(self.offset)?;
		let Some(guid) = Guid::from_slice(&header) else {
			return Ok(None);
		};

		let size = read_u64_le(&header[16..]);
		if size < OBJECT_HEADER_SIZE {
			decode_err!(@BAIL Asf, "Found an object with an invalid size (< 24)");
		}

		if self.offset.saturating_add(size) > self.end {
			decode_err!(@BAIL Asf, "Found an object that extends past its parent");
		}

		log::trace!("Found object {guid} at {}, size: {size}", self.offset);

		let object = ObjectHeader {
			guid,
			start: self.offset,
			size,
		};

		self.offset = object.end();
		Ok(Some(object))
	}
}
