//! Binary primitives shared by every format
//!
//! Endian readers ([`num`]), text decoding ([`text`]), and bounds-checked random access over the
//! file being scanned ([`io`]).

pub(crate) mod alloc;
pub mod io;
pub mod num;
pub mod text;

pub(crate) fn flag_item(item: &str) -> Option<bool> {
	match item {
		"1" | "true" | "TRUE" | "True" | "yes" => Some(true),
		"0" | "false" | "FALSE" | "False" | "no" => Some(false),
		_ => None,
	}
}
