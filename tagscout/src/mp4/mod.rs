//! MP4 specific items
//!
//! ## File notes
//!
//! The only tag format is the iTunes-style `ilst` atom, found at `moov.udta.meta.ilst`.
//!
//! The `moov` atom is found by walking the top-level atoms. If the walk is derailed by a bad atom,
//! the bytes around the break are searched for a `moov` signature instead, ignoring any that sit
//! inside the preceding atom.
mod atom_info;
pub(crate) mod ilst;

use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::probe::ScanBuffers;
use crate::tag::{Metadata, TagFormat, TagLocation};
use crate::util::io::FileSource;
use atom_info::{ATOM_HEADER_LEN, AtomInfo, FOURCC_LEN};

use std::io::{Read, Seek};

// Atoms that can reasonably start an MP4 file
const TOP_LEVEL_ATOMS: [&[u8; 4]; 7] = [
	b"ftyp", b"moov", b"mdat", b"free", b"skip", b"wide", b"pdin",
];

// Children of a non-full `meta` atom
const META_CHILDREN: [&[u8; 4]; 5] = [b"hdlr", b"ilst", b"mdta", b"keys", b"ctry"];

pub(crate) fn can_detect(buffers: &ScanBuffers) -> bool {
	buffers
		.start()
		.get(4..8)
		.is_some_and(|ident| TOP_LEVEL_ATOMS.iter().any(|atom| atom.as_slice() == ident))
}

pub(crate) fn detect<R>(
	source: &mut FileSource<R>,
	_buffers: &ScanBuffers,
	parse_options: ParseOptions,
) -> Result<Vec<TagLocation>>
where
	R: Read + Seek,
{
	log::debug!("Searching for an MP4 \"moov\" atom");

	let Some(moov) = find_moov(source, parse_options)? else {
		log::debug!("No \"moov\" atom found");
		return Ok(Vec::new());
	};

	let Some(ilst) = find_ilst(source, &moov)? else {
		log::debug!("\"moov\" atom has no \"ilst\" atom");
		return Ok(Vec::new());
	};

	log::debug!("Found an \"ilst\" atom at {}, size: {}", ilst.start, ilst.len);

	Ok(vec![TagLocation::new(
		TagFormat::Mp4Ilst,
		ilst.start,
		ilst.len,
		source.len(),
	)?])
}

fn find_moov<R>(source: &mut FileSource<R>, parse_options: ParseOptions) -> Result<Option<AtomInfo>>
where
	R: Read + Seek,
{
	let file_len = source.len();

	let mut offset = 0;
	let mut previous = None;
	while offset < file_len {
		let atom = match AtomInfo::read(source, offset, file_len, ParsingMode::BestAttempt) {
			Ok(Some(atom)) => atom,
			Ok(None) => break,
			Err(e) => {
				log::warn!("Top-level atom walk failed at {offset}: {e}");
				break;
			},
		};

		if atom.ident == *b"moov" {
			return Ok(Some(atom));
		}

		offset = atom.end();
		previous = Some(atom);
	}

	if offset >= file_len {
		return Ok(None);
	}

	log::warn!("Searching for a \"moov\" signature around offset {offset}");
	scan_for_moov(source, offset, previous, parse_options.resync_window as u64)
}

/// Search `window` bytes on either side of `offset` for a `moov` atom header
///
/// A match inside the span of `previous` is a child atom with the same name, not a top-level
/// `moov`.
fn scan_for_moov<R>(
	source: &mut FileSource<R>,
	offset: u64,
	previous: Option<AtomInfo>,
	window: u64,
) -> Result<Option<AtomInfo>>
where
	R: Read + Seek,
{
	let file_len = source.len();
	let scan_start = offset.saturating_sub(window);
	let scanned = source.read_vec_clamped(scan_start, window.saturating_mul(2))?;

	let candidates = scanned
		.windows(FOURCC_LEN as usize)
		.enumerate()
		.filter(|(_, ident)| *ident == b"moov")
		.filter_map(|(pos, _)| (scan_start + pos as u64).checked_sub(FOURCC_LEN));

	for candidate in candidates {
		if let Some(previous) = previous {
			if previous.contains(candidate) {
				log::debug!(
					"Ignoring \"moov\" signature at {candidate}, nested in \"{}\"",
					previous.ident.escape_ascii()
				);
				continue;
			}
		}

		if let Ok(Some(atom)) = AtomInfo::read(source, candidate, file_len, ParsingMode::Strict) {
			log::warn!("Recovered a \"moov\" atom at {candidate}");
			return Ok(Some(atom));
		}
	}

	Ok(None)
}

/// Descend `moov.udta.meta.ilst`
fn find_ilst<R>(source: &mut FileSource<R>, moov: &AtomInfo) -> Result<Option<AtomInfo>>
where
	R: Read + Seek,
{
	let Some(udta) = find_child(source, moov, moov.content_start(), *b"udta")? else {
		return Ok(None);
	};

	let Some(meta) = find_child(source, &udta, udta.content_start(), *b"meta")? else {
		return Ok(None);
	};

	// It's possible for the `meta` atom to be non-full,
	// so we have to check for that case
	let mut children_start = meta.content_start();
	if meta_is_full(source, &meta)? {
		children_start += 4;
	} else {
		log::warn!("File contains a non-full 'meta' atom");
	}

	find_child(source, &meta, children_start, *b"ilst")
}

fn find_child<R>(
	source: &mut FileSource<R>,
	parent: &AtomInfo,
	children_start: u64,
	ident: [u8; 4],
) -> Result<Option<AtomInfo>>
where
	R: Read + Seek,
{
	let mut offset = children_start;
	while offset < parent.end() {
		let Some(atom) = AtomInfo::read(source, offset, parent.end(), ParsingMode::BestAttempt)? else {
			break;
		};

		if atom.ident == ident {
			return Ok(Some(atom));
		}

		offset = atom.end();
	}

	Ok(None)
}

fn meta_is_full<R>(source: &mut FileSource<R>, meta: &AtomInfo) -> Result<bool>
where
	R: Read + Seek,
{
	// A full `meta` atom should have the following:
	//
	// Version (1)
	// Flags (3)
	//
	// A non-full atom starts directly with a child, whose identifier follows its size
	let ident_offset = meta.content_start() + FOURCC_LEN;
	if meta.len < meta.header_size() + ATOM_HEADER_LEN || !source.contains(ident_offset, FOURCC_LEN) {
		return Ok(true);
	}

	let ident = source.read_array_at::<4>(ident_offset)?;
	Ok(!META_CHILDREN.contains(&&ident))
}

pub(crate) fn parse<R>(
	source: &mut FileSource<R>,
	location: &TagLocation,
	parse_options: ParseOptions,
) -> Result<Metadata>
where
	R: Read + Seek,
{
	let ilst = source.read_vec_at(location.offset(), location.size())?;
	ilst::read::parse_ilst(&ilst, parse_options)
}
