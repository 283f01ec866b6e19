use crate::error::Result;
use crate::macros::err;
use crate::tag::TagFormat;

/// Where a tag lives in a file
///
/// `offset` is absolute from the start of the file, and `size` is the full span of the tag,
/// including any header or footer the format defines. A `TagLocation` can only be created by a
/// detection strategy, which guarantees that `offset + size` never exceeds the length of the
/// file it was found in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TagLocation {
	format: TagFormat,
	offset: u64,
	size: u64,
}

impl TagLocation {
	/// Create a location, checking that it fits within a file of `file_len` bytes
	pub(crate) fn new(format: TagFormat, offset: u64, size: u64, file_len: u64) -> Result<Self> {
		match offset.checked_add(size) {
			Some(end) if end <= file_len => Ok(Self {
				format,
				offset,
				size,
			}),
			_ => {
				log::warn!(
					"{} at {offset} with size {size} extends past the end of the file ({file_len})",
					format.name()
				);
				err!(OutOfBounds)
			},
		}
	}

	/// Same as [`TagLocation::new`], but discards locations that don't fit
	pub(crate) fn checked(format: TagFormat, offset: u64, size: u64, file_len: u64) -> Option<Self> {
		Self::new(format, offset, size, file_len).ok()
	}

	/// The format of the tag
	pub fn format(&self) -> TagFormat {
		self.format
	}

	/// The absolute offset of the first byte of the tag
	pub fn offset(&self) -> u64 {
		self.offset
	}

	/// The size of the tag, including any header and footer
	pub fn size(&self) -> u64 {
		self.size
	}

	/// The offset of the first byte after the tag
	pub fn end(&self) -> u64 {
		self.offset + self.size
	}
}

#[cfg(test)]
mod tests {
	use super::TagLocation;
	use crate::tag::TagFormat;

	#[test_log::test]
	fn location_must_fit_in_file() {
		assert!(TagLocation::new(TagFormat::Id3v1, 0, 128, 128).is_ok());
		assert!(TagLocation::new(TagFormat::Id3v1, 1, 128, 128).is_err());
		assert!(TagLocation::new(TagFormat::Id3v1, u64::MAX, 2, u64::MAX).is_err());

		let location = TagLocation::new(TagFormat::ApeV2, 10, 32, 100).unwrap();
		assert_eq!(location.end(), 42);
	}
}
