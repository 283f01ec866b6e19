//! ID3 specific items
//!
//! ID3v1 lives in the last 128 bytes of a file, while ID3v2 is normally at the start. Both are
//! also embedded by other formats (ID3v2 in WAV, AIFF, DSF, and DFF chunks, both in TrueAudio
//! files), which reuse the locators and parsers here.

pub mod v1;
pub mod v2;
