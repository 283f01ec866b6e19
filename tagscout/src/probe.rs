//! Format-agnostic scanning tools

use crate::config::ParseOptions;
use crate::error::Result;
use crate::registry::Registry;
use crate::tag::{Metadata, TagLocation};
use crate::util::io::FileSource;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// The prefix and suffix windows handed to every detection strategy
///
/// Quick signature checks ([`Strategy::can_detect`](crate::registry::Strategy::can_detect)) only
/// ever look at these. The end window always holds the true last bytes of the file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanBuffers {
	start: Vec<u8>,
	end: Vec<u8>,
}

impl ScanBuffers {
	/// Default size of the start window
	pub const DEFAULT_START_LEN: u64 = 64 * 1024;

	/// Default size of the end window
	pub const DEFAULT_END_LEN: u64 = 16 * 1024;

	/// Read the default windows from `source`
	///
	/// # Errors
	///
	/// See [`FileSource::read_vec_at`]
	pub fn read<R>(source: &mut FileSource<R>) -> Result<Self>
	where
		R: Read + Seek,
	{
		Self::read_with_lens(source, Self::DEFAULT_START_LEN, Self::DEFAULT_END_LEN)
	}

	/// Read windows of custom sizes from `source`, both clamped to the file length
	///
	/// # Errors
	///
	/// See [`FileSource::read_vec_at`]
	pub fn read_with_lens<R>(source: &mut FileSource<R>, start_len: u64, end_len: u64) -> Result<Self>
	where
		R: Read + Seek,
	{
		let len = source.len();

		let start = source.read_vec_at(0, start_len.min(len))?;

		let end_len = end_len.min(len);
		let end = source.read_vec_at(len - end_len, end_len)?;

		Ok(Self { start, end })
	}

	/// Create windows from buffers the caller already has
	///
	/// `end` must be the final bytes of the file.
	pub fn from_parts(start: Vec<u8>, end: Vec<u8>) -> Self {
		Self { start, end }
	}

	/// The first bytes of the file
	pub fn start(&self) -> &[u8] {
		&self.start
	}

	/// The last bytes of the file
	pub fn end(&self) -> &[u8] {
		&self.end
	}
}

/// A file being scanned for tags
///
/// This ties a [`FileSource`], its [`ScanBuffers`], and a set of [`ParseOptions`] together.
///
/// # Examples
///
/// ```rust
/// use std::io::Cursor;
/// use tagscout::probe::Probe;
/// use tagscout::registry::Registry;
/// use tagscout::tag::TagFormat;
///
/// # fn main() -> tagscout::error::Result<()> {
/// let mut file = vec![0; 64];
/// file.extend(b"TAG");
/// file.extend([0; 125]);
///
/// let registry = Registry::new();
/// let mut probe = Probe::new(Cursor::new(file))?;
///
/// let locations = probe.detect(&registry);
/// assert_eq!(locations.len(), 1);
/// assert_eq!(locations[0].format(), TagFormat::Id3v1);
/// assert_eq!(locations[0].offset(), 64);
/// # Ok(()) }
/// ```
pub struct Probe<R> {
	source: FileSource<R>,
	buffers: ScanBuffers,
	options: ParseOptions,
}

impl<R> Probe<R>
where
	R: Read + Seek,
{
	/// Wrap a reader, reading the default scan windows
	///
	/// # Errors
	///
	/// The reader could not be read
	pub fn new(reader: R) -> Result<Self> {
		let mut source = FileSource::new(reader)?;
		let buffers = ScanBuffers::read(&mut source)?;

		Ok(Self {
			source,
			buffers,
			options: ParseOptions::default(),
		})
	}

	/// Set the [`ParseOptions`] used for both detection and parsing
	#[must_use]
	pub fn options(mut self, options: ParseOptions) -> Self {
		self.options = options;
		self
	}

	/// Run every applicable strategy in `registry`
	///
	/// See [`Registry::detect_all`].
	pub fn detect(&mut self, registry: &Registry) -> Vec<TagLocation> {
		registry.detect_all(&mut self.source, &self.buffers, self.options)
	}

	/// Decode a location previously returned by [`Probe::detect`]
	///
	/// # Errors
	///
	/// See [`Registry::parse`]
	pub fn parse(&mut self, registry: &Registry, location: &TagLocation) -> Result<Metadata> {
		registry.parse(&mut self.source, location, self.options)
	}

	/// The underlying source
	pub fn source(&mut self) -> &mut FileSource<R> {
		&mut self.source
	}

	/// The scan windows
	pub fn buffers(&self) -> &ScanBuffers {
		&self.buffers
	}

	/// Consume the probe, returning the reader
	pub fn into_inner(self) -> R {
		self.source.into_inner()
	}
}

impl Probe<BufReader<File>> {
	/// Open a file for scanning
	///
	/// # Errors
	///
	/// `path` does not exist or could not be read
	pub fn open<P>(path: P) -> Result<Self>
	where
		P: AsRef<Path>,
	{
		let path = path.as_ref();
		log::debug!("Probe: Opening `{}` for scanning", path.display());

		Self::new(BufReader::new(File::open(path)?))
	}
}
