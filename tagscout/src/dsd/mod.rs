//! DSD (Direct Stream Digital) containers
//!
//! * DSF (DSD Stream File), Sony's format. The only tag is an ID3v2 tag, found through a pointer
//!   in the file header.
//! * DFF (DSDIFF), Philips' IFF-based format with 64-bit chunk sizes. Tags are stored in the
//!   `DIIN` and `COMT` chunks, or an `ID3 ` chunk holding an ID3v2 tag.
pub(crate) mod dff;
pub(crate) mod dsf;
