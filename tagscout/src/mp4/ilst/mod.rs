//! `ilst` atom decoding
//!
//! Every child of `ilst` is a metadata item named by its four byte code (or `----:mean:name` for
//! freeform items), holding one or more `data` atoms.
pub(crate) mod data_type;
pub(crate) mod read;

pub(crate) const WELL_KNOWN_TYPE_SET: u8 = 0;

/// Items holding a single integer that is only ever 0 or 1
pub(crate) const FLAG_ATOMS: [&[u8; 4]; 5] = [b"cpil", b"hdvd", b"pcst", b"pgap", b"shwm"];
