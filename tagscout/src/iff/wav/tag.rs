use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::macros::{decode_err, err, parse_mode_choice};
use crate::tag::{Metadata, TagFormat};
use crate::util::num::read_u32_le;
use crate::util::text::extract_fixed_string;

// LIST (4) + size (4) + INFO (4)
const INFO_HEADER_SIZE: usize = 12;

/// Decode a complete `LIST` chunk of type `INFO`
pub(crate) fn parse_riff_info(list: &[u8], parse_options: ParseOptions) -> Result<Metadata> {
	let parse_mode = parse_options.parsing_mode;

	if list.len() < INFO_HEADER_SIZE || &list[..4] != b"LIST" || &list[8..12] != b"INFO" {
		decode_err!(@BAIL Wav, "Expected a RIFF INFO list");
	}

	let list_end = 8 + read_u32_le(&list[4..8]) as usize;
	if list_end > list.len() {
		err!(SizeMismatch);
	}

	let mut metadata = Metadata::new(TagFormat::RiffInfo);

	let mut offset = INFO_HEADER_SIZE;
	while list_end - offset >= 8 {
		let key = &list[offset..offset + 4];
		let size = read_u32_le(&list[offset + 4..offset + 8]) as usize;

		let value_start = offset + 8;
		if size > list_end - value_start {
			parse_mode_choice!(
				parse_mode,
				STRICT: err!(SizeMismatch),
				DEFAULT: {
					log::warn!("RIFF INFO item overruns its list, stopping");
					break;
				}
			);
		}

		let value = &list[value_start..value_start + size];

		// Items are padded to even boundaries
		offset = (value_start + size + size % 2).min(list_end);

		if !verify_key(key) {
			if parse_mode == ParsingMode::Strict {
				decode_err!(@BAIL Wav, "RIFF INFO item key contains invalid characters");
			}

			log::warn!(
				"Skipping RIFF INFO item with an invalid key: {:?}",
				key.escape_ascii().to_string()
			);
			continue;
		}

		// Checked above, the key is ASCII
		let key = String::from_utf8_lossy(key).into_owned();
		log::trace!("RIFF INFO: Reading item `{key}`");

		// RIFF INFO items have no standard text encoding, they will occasionally be in the
		// system encoding of whatever wrote them
		metadata.add_text(key, extract_fixed_string(value, 0, value.len(), None));
	}

	Ok(metadata)
}

pub(super) fn verify_key(key: &[u8]) -> bool {
	key.len() == 4 && key.iter().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
