/// Options to control how tagscout locates and decodes tags
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct ParseOptions {
	pub(crate) parsing_mode: ParsingMode,
	pub(crate) read_cover_art: bool,
	pub(crate) max_preview_len: usize,
	pub(crate) max_ogg_pages: usize,
	pub(crate) resync_window: usize,
}

impl Default for ParseOptions {
	/// The default implementation for `ParseOptions`
	///
	/// The defaults are as follows:
	///
	/// ```rust,ignore
	/// ParseOptions {
	/// 	parsing_mode: ParsingMode::BestAttempt,
	/// 	read_cover_art: true,
	/// 	max_preview_len: 64,
	/// 	max_ogg_pages: 10,
	/// 	resync_window: 1024,
	/// }
	/// ```
	fn default() -> Self {
		Self::new()
	}
}

impl ParseOptions {
	/// Default parsing mode
	pub const DEFAULT_PARSING_MODE: ParsingMode = ParsingMode::BestAttempt;

	/// Default number of payload bytes kept for binary and picture previews
	pub const DEFAULT_MAX_PREVIEW_LEN: usize = 64;

	/// Default number of pages searched for an Ogg comment header
	pub const DEFAULT_MAX_OGG_PAGES: usize = 10;

	/// Default number of bytes searched when resynchronizing a chunk walk
	pub const DEFAULT_RESYNC_WINDOW: usize = 1024;

	/// Creates a new `ParseOptions`, alias for `Default` implementation
	///
	/// See also: [`ParseOptions::default`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagscout::config::ParseOptions;
	///
	/// let parsing_options = ParseOptions::new();
	/// ```
	#[must_use]
	pub const fn new() -> Self {
		Self {
			parsing_mode: Self::DEFAULT_PARSING_MODE,
			read_cover_art: true,
			max_preview_len: Self::DEFAULT_MAX_PREVIEW_LEN,
			max_ogg_pages: Self::DEFAULT_MAX_OGG_PAGES,
			resync_window: Self::DEFAULT_RESYNC_WINDOW,
		}
	}

	/// The parsing mode to use, see [`ParsingMode`] for details
	///
	/// # Examples
	///
	/// ```rust
	/// use tagscout::config::{ParseOptions, ParsingMode};
	///
	/// // By default, `parsing_mode` is ParsingMode::BestAttempt. Here, we need absolute correctness.
	/// let parsing_options = ParseOptions::new().parsing_mode(ParsingMode::Strict);
	/// ```
	pub fn parsing_mode(&mut self, parsing_mode: ParsingMode) -> Self {
		self.parsing_mode = parsing_mode;
		*self
	}

	/// Whether or not to decode cover art
	///
	/// When disabled, picture fields are skipped entirely.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagscout::config::ParseOptions;
	///
	/// // Reading cover art is expensive, and I do not need it!
	/// let parsing_options = ParseOptions::new().read_cover_art(false);
	/// ```
	pub fn read_cover_art(&mut self, read_cover_art: bool) -> Self {
		self.read_cover_art = read_cover_art;
		*self
	}

	/// The maximum number of payload bytes kept in a binary or picture preview
	///
	/// # Examples
	///
	/// ```rust
	/// use tagscout::config::ParseOptions;
	///
	/// // Only keep enough to sniff the magic bytes
	/// let parsing_options = ParseOptions::new().max_preview_len(8);
	/// ```
	pub fn max_preview_len(&mut self, max_preview_len: usize) -> Self {
		self.max_preview_len = max_preview_len;
		*self
	}

	/// The maximum number of Ogg pages searched for the comment header
	///
	/// This only bounds the sequential fallback search. Once the comment packet is found, it is
	/// followed across as many pages as it spans.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagscout::config::ParseOptions;
	///
	/// let parsing_options = ParseOptions::new().max_ogg_pages(32);
	/// ```
	pub fn max_ogg_pages(&mut self, max_ogg_pages: usize) -> Self {
		self.max_ogg_pages = max_ogg_pages;
		*self
	}

	/// The maximum number of bytes to search when a chunk walk hits garbage
	///
	/// # Examples
	///
	/// ```rust
	/// use tagscout::config::ParseOptions;
	///
	/// // I have files full of junk, I'll double the search window!
	/// let parsing_options = ParseOptions::new().resync_window(2048);
	/// ```
	pub fn resync_window(&mut self, resync_window: usize) -> Self {
		self.resync_window = resync_window;
		*self
	}
}

/// The parsing strictness mode
///
/// # Examples
///
/// ```rust
/// use tagscout::config::{ParseOptions, ParsingMode};
///
/// // We only want to read spec-compliant inputs
/// let parsing_options = ParseOptions::new().parsing_mode(ParsingMode::Strict);
/// ```
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Default)]
#[non_exhaustive]
pub enum ParsingMode {
	/// Will eagerly error on invalid input
	///
	/// Every field-level anomaly becomes an error.
	///
	/// ## Examples of behavior
	///
	/// * Unable to decode text - The parser will error and the entire tag is discarded
	/// * Unknown chunk inside a RIFF INFO list - The parser will error
	Strict,
	/// Default mode, less eager to error on recoverably malformed input
	///
	/// ## Examples of behavior
	///
	/// * Unable to decode text - The text is decoded through the fallback chain instead
	/// * Invalid APE item key - The item is skipped
	#[default]
	BestAttempt,
	/// Least eager to error, may produce partial output
	///
	/// ## Examples of behavior
	///
	/// * Unable to decode text - The entire field is discarded and the parser moves on
	/// * Missing Vorbis framing bit - Ignored without a warning
	Relaxed,
}
