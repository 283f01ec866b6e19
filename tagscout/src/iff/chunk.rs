use crate::error::Result;
use crate::util::io::FileSource;

use std::io::{Read, Seek};
use std::marker::PhantomData;

use byteorder::ByteOrder;

pub(crate) const FOURCC_LEN: u64 = 4;

/// A chunk header, the content is left in the file
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Chunk {
	pub(crate) fourcc: [u8; 4],
	pub(crate) start: u64,
	pub(crate) header_size: u64,
	pub(crate) size: u64,
}

impl Chunk {
	pub(crate) fn content_start(&self) -> u64 {
		self.start + self.header_size
	}

	/// The end of the content, excluding any pad byte
	pub(crate) fn content_end(&self) -> u64 {
		self.content_start().saturating_add(self.size)
	}

	/// The offset of the next chunk
	///
	/// Chunks are expected to start on even boundaries, and are padded with a 0 if necessary.
	/// This is NOT the null terminator of the value, and it is NOT included in the chunk's size.
	pub(crate) fn end(&self) -> u64 {
		self.content_end().saturating_add(self.size % 2)
	}

	/// The size of the chunk, including its header but not its padding
	pub(crate) fn len(&self) -> u64 {
		self.header_size.saturating_add(self.size)
	}

	pub(crate) fn fourcc_str(&self) -> String {
		self.fourcc.escape_ascii().to_string()
	}

	/// Whether the identifier looks like a chunk identifier, four printable ASCII characters
	pub(crate) fn has_valid_fourcc(&self) -> bool {
		valid_fourcc(&self.fourcc)
	}
}

pub(crate) fn valid_fourcc(fourcc: &[u8]) -> bool {
	fourcc.iter().all(|b| (b' '..=b'~').contains(b))
}

/// A walker over a sequence of `{id}{size}{content}` chunks
///
/// RIFF and AIFF use 32-bit sizes, DSDIFF uses 64-bit sizes. The byte order of the size is `B`.
pub(crate) struct Chunks<B>
where
	B: ByteOrder,
{
	offset: u64,
	end: u64,
	wide: bool,
	_phantom: PhantomData<B>,
}

impl<B: ByteOrder> Chunks<B> {
	/// Walk chunks with 32-bit sizes between `start` and `end`
	#[must_use]
	pub(crate) const fn new(start: u64, end: u64) -> Self {
		Self {
			offset: start,
			end,
			wide: false,
			_phantom: PhantomData,
		}
	}

	/// Walk chunks with 64-bit sizes between `start` and `end`
	#[must_use]
	pub(crate) const fn wide(start: u64, end: u64) -> Self {
		Self {
			offset: start,
			end,
			wide: true,
			_phantom: PhantomData,
		}
	}

	fn header_size(&self) -> u64 {
		if self.wide { FOURCC_LEN + 8 } else { FOURCC_LEN + 4 }
	}

	/// The offset of the next chunk header
	pub(crate) fn position(&self) -> u64 {
		self.offset
	}

	/// Continue the walk at `offset`
	pub(crate) fn seek(&mut self, offset: u64) {
		self.offset = offset;
	}

	/// Read the next chunk header
	///
	/// The content is not checked against the walk bounds, see [`Self::fits`].
	pub(crate) fn next<R>(&mut self, source: &mut FileSource<R>) -> Result<Option<Chunk>>
	where
		R: Read + Seek,
	{
		let Some(chunk) = self.peek(source, self.offset)? else {
			return Ok(None);
		};

		log::trace!(
			"Found chunk \"{}\" at {}, size: {}",
			chunk.fourcc_str(),
			chunk.start,
			chunk.size
		);

		self.offset = chunk.end();
		Ok(Some(chunk))
	}

	/// Read the chunk header at `offset` without moving the walk
	pub(crate) fn peek<R>(&self, source: &mut FileSource<R>, offset: u64) -> Result<Option<Chunk>>
	where
		R: Read + Seek,
	{
		let header_size = self.header_size();
		if self.end.saturating_sub(offset) < header_size || !source.contains(offset, header_size) {
			return Ok(None);
		}

		let header = source.read_vec_at(offset, header_size)?;

		let mut fourcc = [0; 4];
		fourcc.copy_from_slice(&header[..4]);

		let size = if self.wide {
			B::read_u64(&header[4..])
		} else {
			u64::from(B::read_u32(&header[4..8]))
		};

		Ok(Some(Chunk {
			fourcc,
			start: offset,
			header_size,
			size,
		}))
	}

	/// Whether the chunk's content lies within the walk bounds
	pub(crate) fn fits(&self, chunk: &Chunk) -> bool {
		chunk.content_end() <= self.end
	}

	/// Search forward from `from` for a chunk header whose identifier is one of `known`
	///
	/// Only the first `window` bytes are searched. The walk continues at the recovered chunk.
	pub(crate) fn resync<R>(
		&mut self,
		source: &mut FileSource<R>,
		from: u64,
		known: &[&[u8; 4]],
		window: u64,
	) -> Result<Option<Chunk>>
	where
		R: Read + Seek,
	{
		let searched = source.read_vec_clamped(from, window.min(self.end.saturating_sub(from)))?;

		for (pos, fourcc) in searched.windows(FOURCC_LEN as usize).enumerate() {
			if !known.iter().any(|known| known.as_slice() == fourcc) {
				continue;
			}

			let offset = from + pos as u64;
			if let Some(chunk) = self.peek(source, offset)? {
				if self.fits(&chunk) {
					log::warn!(
						"Resynchronized at chunk \"{}\", offset {offset}",
						chunk.fourcc_str()
					);

					self.offset = offset;
					return Ok(Some(chunk));
				}
			}
		}

		Ok(None)
	}
}
