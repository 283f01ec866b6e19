//! Random access over the file being scanned

use crate::error::Result;
use crate::macros::{err, try_vec};

use std::io::{Read, Seek, SeekFrom};

macro_rules! source_int_readers {
	($($ty:ident),+) => {
		paste::paste! {
			$(
				#[doc = "Read a little-endian `" $ty "` at `offset`"]
				///
				/// # Errors
				///
				/// See [`FileSource::read_at`]
				pub fn [<read_ $ty _le_at>](&mut self, offset: u64) -> Result<$ty> {
					Ok($ty::from_le_bytes(self.read_array_at(offset)?))
				}

				#[doc = "Read a big-endian `" $ty "` at `offset`"]
				///
				/// # Errors
				///
				/// See [`FileSource::read_at`]
				pub fn [<read_ $ty _be_at>](&mut self, offset: u64) -> Result<$ty> {
					Ok($ty::from_be_bytes(self.read_array_at(offset)?))
				}
			)+
		}
	};
}

// TODO: https://github.com/rust-lang/rust/issues/59359
pub(crate) trait SeekStreamLen: Seek {
	fn stream_len_hack(&mut self) -> Result<u64> {
		let current_pos = self.stream_position()?;
		let len = self.seek(SeekFrom::End(0))?;

		self.seek(SeekFrom::Start(current_pos))?;

		Ok(len)
	}
}

impl<T> SeekStreamLen for T where T: Seek {}

/// A bounds-checked, random-access view of a file
///
/// Every read is checked against the total length captured at construction, so a size field
/// read from a damaged file can never send a read past the end of the data. The source never
/// writes, and the handle is returned to the caller with [`FileSource::into_inner`].
///
/// # Examples
///
/// ```rust
/// use std::io::Cursor;
/// use tagscout::io::FileSource;
///
/// # fn main() -> tagscout::error::Result<()> {
/// let mut source = FileSource::new(Cursor::new(b"RIFF\x04\x00\x00\x00WAVE".to_vec()))?;
/// assert_eq!(source.len(), 12);
///
/// let mut form = [0; 4];
/// source.read_at(8, &mut form)?;
/// assert_eq!(&form, b"WAVE");
///
/// // Reads past the end are refused
/// assert!(source.read_vec_at(8, 5).is_err());
/// # Ok(()) }
/// ```
pub struct FileSource<R> {
	reader: R,
	len: u64,
}

impl<R> FileSource<R>
where
	R: Read + Seek,
{
	/// Wrap a reader, capturing its total length
	///
	/// # Errors
	///
	/// The reader's length could not be determined
	pub fn new(mut reader: R) -> Result<Self> {
		let len = reader.stream_len_hack()?;
		Ok(Self { reader, len })
	}

	/// The total length of the file
	pub fn len(&self) -> u64 {
		self.len
	}

	/// Whether the file is empty
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Whether `size` bytes at `offset` lie entirely within the file
	pub fn contains(&self, offset: u64, size: u64) -> bool {
		offset.checked_add(size).is_some_and(|end| end <= self.len)
	}

	/// Fill `buf` with the bytes at `offset`
	///
	/// # Errors
	///
	/// * The requested range extends past the end of the file
	/// * The underlying reader fails
	pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
		if !self.contains(offset, buf.len() as u64) {
			err!(OutOfBounds);
		}

		self.reader.seek(SeekFrom::Start(offset))?;
		self.reader.read_exact(buf)?;
		Ok(())
	}

	/// Read `size` bytes at `offset` into a new `Vec`
	///
	/// The allocation is subject to [`GlobalOptions::allocation_limit`](crate::config::GlobalOptions::allocation_limit).
	///
	/// # Errors
	///
	/// * The requested range extends past the end of the file
	/// * `size` exceeds the allocation limit
	/// * The underlying reader fails
	pub fn read_vec_at(&mut self, offset: u64, size: u64) -> Result<Vec<u8>> {
		if !self.contains(offset, size) {
			err!(OutOfBounds);
		}

		let Ok(size) = usize::try_from(size) else {
			err!(TooMuchData);
		};

		let mut content = try_vec![0; size];
		self.read_at(offset, &mut content)?;
		Ok(content)
	}

	/// Read up to `size` bytes at `offset`, stopping early at the end of the file
	///
	/// # Errors
	///
	/// See [`FileSource::read_vec_at`]
	pub fn read_vec_clamped(&mut self, offset: u64, size: u64) -> Result<Vec<u8>> {
		let available = self.len.saturating_sub(offset).min(size);
		self.read_vec_at(offset.min(self.len), available)
	}

	/// Read a fixed-size array at `offset`
	///
	/// # Errors
	///
	/// See [`FileSource::read_at`]
	pub fn read_array_at<const N: usize>(&mut self, offset: u64) -> Result<[u8; N]> {
		let mut buf = [0; N];
		self.read_at(offset, &mut buf)?;
		Ok(buf)
	}

	source_int_readers!(u16, u32, u64);

	/// Consume the source, returning the reader
	pub fn into_inner(self) -> R {
		self.reader
	}
}
