//! Interchange File Format containers, RIFF (WAV) and FORM (AIFF)
pub(crate) mod aiff;
pub(crate) mod chunk;
pub(crate) mod wav;
