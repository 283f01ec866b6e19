//! A minimal Ogg page reader
//!
//! Only page headers and segment tables are decoded, which is all that's needed to find and
//! reassemble the header packets. Page checksums are not verified.

use crate::error::Result;
use crate::macros::{decode_err, err, try_vec};
use crate::util::io::FileSource;
use crate::util::num::{read_u32_le, read_u64_le};

use std::io::{Read, Seek};

pub(crate) const OGG_PAGE_MARKER: &[u8; 4] = b"OggS";

/// The size of a page header, excluding the segment table
pub(crate) const PAGE_HEADER_SIZE: u64 = 27;

const CONTINUED_PACKET: u8 = 0x01;

/// An Ogg page header
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) struct PageHeader {
	/// The position in the stream the page started at
	pub(crate) start: u64,
	pub(crate) header_type_flag: u8,
	/// The page's absolute granule position
	pub(crate) abgp: u64,
	/// The page's stream serial number
	pub(crate) stream_serial: u32,
	/// The page's sequence number
	pub(crate) sequence_number: u32,
	pub(crate) segment_table: Vec<u8>,
}

impl PageHeader {
	/// Read the page header at `offset`
	///
	/// The page content itself is not read, but it must fit within the file.
	pub(crate) fn read<R>(source: &mut FileSource<R>, offset: u64) -> Result<Self>
	where
		R: Read + Seek,
	{
		if !source.contains(offset, PAGE_HEADER_SIZE) {
			decode_err!(@BAIL Ogg, "File is too small to hold an Ogg page");
		}

		let header = source.read_array_at::<27>(offset)?;
		if &header[..4] != OGG_PAGE_MARKER {
			decode_err!(@BAIL Ogg, "Page is missing its magic signature");
		}

		// Version, always 0
		if header[4] != 0 {
			decode_err!(@BAIL Ogg, "Page has an invalid stream structure version");
		}

		let segments = header[26];
		if segments < 1 {
			decode_err!(@BAIL Ogg, "Page has a bad segment count");
		}

		let mut segment_table = try_vec![0; usize::from(segments)];
		source.read_at(offset + PAGE_HEADER_SIZE, &mut segment_table)?;

		let page = Self {
			start: offset,
			header_type_flag: header[5],
			abgp: read_u64_le(&header[6..]),
			stream_serial: read_u32_le(&header[14..]),
			sequence_number: read_u32_le(&header[18..]),
			segment_table,
		};

		if !source.contains(page.content_start(), page.content_len()) {
			decode_err!(@BAIL Ogg, "Page content extends past the end of the file");
		}

		log::trace!(
			"Ogg page at {offset}: sequence {}, {} segments, {} bytes of content",
			page.sequence_number,
			segments,
			page.content_len()
		);

		Ok(page)
	}

	/// Whether the page starts in the middle of a packet
	pub(crate) fn is_continuation(&self) -> bool {
		self.header_type_flag & CONTINUED_PACKET == CONTINUED_PACKET
	}

	/// The offset of the page content
	pub(crate) fn content_start(&self) -> u64 {
		self.start + PAGE_HEADER_SIZE + self.segment_table.len() as u64
	}

	/// The size of the page content
	pub(crate) fn content_len(&self) -> u64 {
		self.segment_table.iter().map(|s| u64::from(*s)).sum()
	}

	/// The offset of the first byte after the page
	pub(crate) fn end(&self) -> u64 {
		self.content_start() + self.content_len()
	}

	/// The size of the first packet on the page, and whether it ends on this page
	pub(crate) fn first_packet_len(&self) -> (u64, bool) {
		let mut len = 0;
		for segment in &self.segment_table {
			len += u64::from(*segment);
			if *segment < 255 {
				return (len, true);
			}
		}

		(len, false)
	}
}

/// The location of a packet that starts at the beginning of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PacketSpan {
	/// The (offset, length) of each piece of the packet, one per page
	pieces: Vec<(u64, u64)>,
	/// The end of the last page the packet touches
	pub(crate) end: u64,
}

impl PacketSpan {
	/// Follow the first packet on the page at `offset` across as many pages as it spans
	pub(crate) fn locate<R>(source: &mut FileSource<R>, offset: u64) -> Result<Self>
	where
		R: Read + Seek,
	{
		let mut pieces = Vec::new();
		let mut page = PageHeader::read(source, offset)?;
		let serial = page.stream_serial;

		loop {
			// On a continuation page, only the leading segments belong to the packet
			let (len, complete) = page.first_packet_len();

			pieces.push((page.content_start(), len));

			if complete {
				return Ok(Self {
					pieces,
					end: page.end(),
				});
			}

			let next = PageHeader::read(source, page.end())?;
			if !next.is_continuation() || next.stream_serial != serial {
				decode_err!(@BAIL Ogg, "Packet is not continued on the next page");
			}

			page = next;
		}
	}

	/// The total size of the packet
	pub(crate) fn len(&self) -> u64 {
		self.pieces.iter().map(|(_, len)| len).sum()
	}

	/// Read the packet content
	pub(crate) fn read<R>(&self, source: &mut FileSource<R>) -> Result<Vec<u8>>
	where
		R: Read + Seek,
	{
		let Ok(len) = usize::try_from(self.len()) else {
			err!(TooMuchData);
		};

		let mut packet = try_vec![0; len];

		let mut pos = 0;
		for (offset, piece_len) in &self.pieces {
			let piece_len = *piece_len as usize;
			source.read_at(*offset, &mut packet[pos..pos + piece_len])?;
			pos += piece_len;
		}

		Ok(packet)
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::{PacketSpan, PageHeader};
	use crate::util::io::FileSource;

	use std::io::Cursor;

	/// Build a page holding `content`, with a segment table laced for a single packet
	pub(crate) fn page(sequence_number: u32, flags: u8, content: &[u8], complete: bool) -> Vec<u8> {
		let mut segment_table = vec![255; content.len() / 255];
		if complete {
			segment_table.push((content.len() % 255) as u8);
		} else {
			assert_eq!(content.len() % 255, 0);
		}

		let mut page = b"OggS".to_vec();
		page.push(0);
		page.push(flags);
		page.extend(0_u64.to_le_bytes());
		page.extend(1234_u32.to_le_bytes());
		page.extend(sequence_number.to_le_bytes());
		page.extend([0; 4]);
		page.push(segment_table.len() as u8);
		page.extend(segment_table);
		page.extend(content);
		page
	}

	#[test_log::test]
	fn page_header() {
		let file = page(1, 0, &[7; 300], true);
		let mut source = FileSource::new(Cursor::new(file)).unwrap();

		let header = PageHeader::read(&mut source, 0).unwrap();
		assert_eq!(header.sequence_number, 1);
		assert_eq!(header.stream_serial, 1234);
		assert_eq!(header.segment_table, [255, 45]);
		assert_eq!(header.content_len(), 300);
		assert_eq!(header.end(), 27 + 2 + 300);
		assert_eq!(header.first_packet_len(), (300, true));
	}

	#[test_log::test]
	fn truncated_page() {
		let mut file = page(0, 0, &[7; 100], true);
		file.truncate(80);

		let mut source = FileSource::new(Cursor::new(file)).unwrap();
		assert!(PageHeader::read(&mut source, 0).is_err());
	}

	#[test_log::test]
	fn packet_across_pages() {
		let mut file = page(1, 0, &[1; 510], false);
		file.extend(page(2, 0x01, &[2; 10], true));
		let file_len = file.len() as u64;

		let mut source = FileSource::new(Cursor::new(file)).unwrap();
		let span = PacketSpan::locate(&mut source, 0).unwrap();
		assert_eq!(span.len(), 520);
		assert_eq!(span.end, file_len);

		let packet = span.read(&mut source).unwrap();
		assert_eq!(&packet[..510], &[1; 510][..]);
		assert_eq!(&packet[510..], &[2; 10][..]);
	}

	#[test_log::test]
	fn missing_continuation() {
		let mut file = page(1, 0, &[1; 255], false);
		file.extend(page(2, 0, &[2; 10], true));

		let mut source = FileSource::new(Cursor::new(file)).unwrap();
		assert!(PacketSpan::locate(&mut source, 0).is_err());
	}
}
