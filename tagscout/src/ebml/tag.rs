//! Decoding of the `Tags` element
//!
//! <https://www.matroska.org/technical/tagging.html>

use super::element_reader::{
	ElementChildren, SIMPLE_TAG_ID, TAG_BINARY_ID, TAG_ID, TAG_NAME_ID, TAG_STRING_ID, TAGS_ID,
	TARGET_TYPE_VALUE_ID, TARGETS_ID,
};
use crate::config::{ParseOptions, ParsingMode};
use crate::error::{Result, TagError};
use crate::macros::decode_err;
use crate::tag::{BinaryData, FieldValue, Metadata, TagFormat};
use crate::util::num::read_uint_be;
use crate::util::text::decode_with_fallback;

// Tags without a target apply to the whole album, movie, or episode
const DEFAULT_TARGET_TYPE_VALUE: u64 = 50;

// Bounds the recursion through nested `SimpleTag`s
const MAX_SIMPLE_TAG_DEPTH: usize = 16;

/// The path to a `SimpleTag`, used to build its key
#[derive(Clone, Debug)]
struct SimpleTagPath {
	/// `NN:` for targets other than the default
	prefix: String,
	/// The names of the enclosing `SimpleTag`s
	parents: Vec<String>,
}

impl SimpleTagPath {
	fn new(target_type_value: u64) -> Self {
		let prefix = if target_type_value == 0 || target_type_value == DEFAULT_TARGET_TYPE_VALUE {
			String::new()
		} else {
			format!("{target_type_value}:")
		};

		Self {
			prefix,
			parents: Vec::new(),
		}
	}

	fn key(&self, name: &str) -> String {
		let mut key = self.prefix.clone();
		for parent in &self.parents {
			key.push_str(parent);
			key.push('.');
		}

		key.push_str(name);
		key
	}
}

/// Skip a damaged element, unless we're in strict mode
fn recover(parse_mode: ParsingMode, err: TagError, context: &str) -> Result<()> {
	if parse_mode == ParsingMode::Strict {
		return Err(err);
	}

	log::warn!("Failed to read {context}, skipping the rest of it: {err}");
	Ok(())
}

/// Decode a `Tags` element, `data` holding the complete element
pub(crate) fn parse_tags(data: &[u8], format: TagFormat, parse_options: ParseOptions) -> Result<Metadata> {
	let Some((header, content)) = ElementChildren::new(data).next()? else {
		decode_err!(@BAIL Matroska, "Expected a Tags element");
	};

	if header.id.value() != TAGS_ID {
		decode_err!(@BAIL Matroska, "Expected a Tags element");
	}

	let mut metadata = Metadata::new(format);

	let mut children = ElementChildren::new(content);
	loop {
		match children.next() {
			Ok(Some((child, child_content))) if child.id.value() == TAG_ID => {
				read_tag(child_content, parse_options, &mut metadata)?;
			},
			Ok(Some((child, _))) => log::debug!("Skipping element {:?} in Tags", child.id),
			Ok(None) => break,
			Err(e) => {
				recover(parse_options.parsing_mode, e, "Tags")?;
				break;
			},
		}
	}

	Ok(metadata)
}

fn read_tag(data: &[u8], parse_options: ParseOptions, metadata: &mut Metadata) -> Result<()> {
	let mut target_type_value = DEFAULT_TARGET_TYPE_VALUE;
	let mut simple_tags = Vec::new();

	let mut children = ElementChildren::new(data);
	loop {
		match children.next() {
			Ok(Some((child, content))) => match child.id.value() {
				TARGETS_ID => target_type_value = read_targets(content, parse_options)?,
				SIMPLE_TAG_ID => simple_tags.push(content),
				_ => log::debug!("Skipping element {:?} in Tag", child.id),
			},
			Ok(None) => break,
			Err(e) => {
				recover(parse_options.parsing_mode, e, "Tag")?;
				break;
			},
		}
	}

	let mut path = SimpleTagPath::new(target_type_value);
	for simple_tag in simple_tags {
		read_simple_tag(simple_tag, &mut path, parse_options, metadata)?;
	}

	Ok(())
}

fn read_targets(data: &[u8], parse_options: ParseOptions) -> Result<u64> {
	let mut children = ElementChildren::new(data);
	loop {
		match children.next() {
			Ok(Some((child, content))) if child.id.value() == TARGET_TYPE_VALUE_ID => {
				match read_uint_be(content) {
					Some(value) => return Ok(value),
					None => {
						if parse_options.parsing_mode == ParsingMode::Strict {
							decode_err!(@BAIL Matroska, "Invalid TargetTypeValue");
						}

						log::warn!("Invalid TargetTypeValue, using the default");
					},
				}
			},
			Ok(Some(_)) => {},
			Ok(None) => break,
			Err(e) => {
				recover(parse_options.parsing_mode, e, "Targets")?;
				break;
			},
		}
	}

	Ok(DEFAULT_TARGET_TYPE_VALUE)
}

fn read_simple_tag(
	data: &[u8],
	path: &mut SimpleTagPath,
	parse_options: ParseOptions,
	metadata: &mut Metadata,
) -> Result<()> {
	let mut name = None;
	let mut value = None;
	let mut nested = Vec::new();

	let mut children = ElementChildren::new(data);
	loop {
		match children.next() {
			Ok(Some((child, content))) => match child.id.value() {
				TAG_NAME_ID => name = Some(decode_with_fallback(content, None)),
				TAG_STRING_ID => value = Some(FieldValue::Text(decode_with_fallback(content, None))),
				TAG_BINARY_ID => {
					value = Some(FieldValue::Binary(BinaryData::new(
						content,
						parse_options.max_preview_len,
						None,
					)));
				},
				SIMPLE_TAG_ID => nested.push(content),
				// TagLanguage, TagDefault, etc.
				_ => {},
			},
			Ok(None) => break,
			Err(e) => {
				recover(parse_options.parsing_mode, e, "SimpleTag")?;
				break;
			},
		}
	}

	let Some(name) = name.filter(|name| !name.is_empty()) else {
		if parse_options.parsing_mode == ParsingMode::Strict {
			decode_err!(@BAIL Matroska, "SimpleTag has no TagName");
		}

		log::warn!("Skipping a SimpleTag without a TagName");
		return Ok(());
	};

	let key = path.key(&name);
	log::trace!("Reading SimpleTag `{key}`");

	if let Some(value) = value {
		metadata.add_field(key, value);
	}

	if nested.is_empty() {
		return Ok(());
	}

	if path.parents.len() >= MAX_SIMPLE_TAG_DEPTH {
		log::warn!("SimpleTags are nested too deeply, skipping the children of `{name}`");
		return Ok(());
	}

	path.parents.push(name);
	for child in nested {
		read_simple_tag(child, path, parse_options, metadata)?;
	}
	path.parents.pop();

	Ok(())
}
