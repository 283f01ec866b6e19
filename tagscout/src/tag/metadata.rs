use crate::tag::{FieldHandler, FieldValue, TagFormat};

/// A single decoded key/value pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataField {
	key: String,
	value: FieldValue,
	handler: FieldHandler,
	// The text the value was interpreted from, used when merging repeated keys
	raw: Option<String>,
}

impl MetadataField {
	/// The format-native key (frame ID, atom code, chunk ID, comment key)
	pub fn key(&self) -> &str {
		&self.key
	}

	/// The decoded value
	pub fn value(&self) -> &FieldValue {
		&self.value
	}

	/// The handler the key resolved to
	pub fn handler(&self) -> FieldHandler {
		self.handler
	}

	/// Consume the field, returning the key and value
	pub fn into_parts(self) -> (String, FieldValue) {
		(self.key, self.value)
	}
}

/// The decoded contents of one [`TagLocation`](crate::tag::TagLocation)
///
/// Fields keep the order they were found in. Repeated text fields with the same key (common in
/// Vorbis Comments and APE) are merged into one field with their values joined by `"; "`. This
/// includes keys with a typed handler, whose joined text is interpreted again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
	format: TagFormat,
	fields: Vec<MetadataField>,
}

impl Metadata {
	pub(crate) fn new(format: TagFormat) -> Self {
		Self {
			format,
			fields: Vec::new(),
		}
	}

	/// The format of the tag this was decoded from
	pub fn format(&self) -> TagFormat {
		self.format
	}

	/// A human-readable name for the format
	pub fn format_name(&self) -> &'static str {
		self.format.name()
	}

	/// All fields, in the order they were found
	pub fn fields(&self) -> &[MetadataField] {
		&self.fields
	}

	/// Iterate over the fields
	pub fn iter(&self) -> impl Iterator<Item = &MetadataField> {
		self.fields.iter()
	}

	/// The first field with the given key
	pub fn get(&self, key: &str) -> Option<&MetadataField> {
		self.fields.iter().find(|field| field.key == key)
	}

	/// The text of the first field with the given key, if it holds text
	pub fn get_text(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(|field| field.value.text())
	}

	/// The number of fields
	pub fn len(&self) -> usize {
		self.fields.len()
	}

	/// Whether no fields were decoded
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	/// Consume the metadata, returning the fields
	pub fn into_fields(self) -> Vec<MetadataField> {
		self.fields
	}

	/// Append a decoded value, routing it through the handler for its key
	///
	/// Empty values are dropped. Text is merged into an existing field with the same key that was
	/// also decoded from text.
	pub(crate) fn add_field(&mut self, key: impl Into<String>, value: FieldValue) {
		let key = key.into();
		if value.is_empty() {
			log::debug!("Skipping empty field `{key}`");
			return;
		}

		let handler = FieldHandler::lookup(self.format, &key);
		let raw = match &value {
			FieldValue::Text(text) => Some(text.clone()),
			_ => None,
		};

		if let Some(existing) = self.fields.iter_mut().find(|field| field.key == key) {
			if let (FieldValue::Locator(existing), FieldValue::Locator(new)) =
				(&mut existing.value, &value)
			{
				existing.push_str("; ");
				existing.push_str(new);
				return;
			}

			if let (Some(existing_raw), Some(new_raw)) = (existing.raw.as_mut(), raw.as_deref()) {
				existing_raw.push_str("; ");
				existing_raw.push_str(new_raw);

				let new = handler.interpret(value);
				match (&mut existing.value, new) {
					(FieldValue::Text(existing), FieldValue::Text(new)) => {
						existing.push_str("; ");
						existing.push_str(&new);
					},
					(existing_value, _) => {
						*existing_value = handler.interpret(FieldValue::Text(existing_raw.clone()));
					},
				}

				return;
			}
		}

		let value = handler.interpret(value);
		self.fields.push(MetadataField {
			key,
			value,
			handler,
			raw,
		});
	}

	pub(crate) fn add_text(&mut self, key: impl Into<String>, text: String) {
		self.add_field(key, FieldValue::Text(text));
	}
}

impl IntoIterator for Metadata {
	type Item = MetadataField;
	type IntoIter = std::vec::IntoIter<MetadataField>;

	fn into_iter(self) -> Self::IntoIter {
		self.fields.into_iter()
	}
}

#[cfg(test)]
mod tests {
	use crate::tag::{BinaryData, FieldKind, FieldValue, Metadata, MetadataField, TagFormat};

	#[test_log::test]
	fn duplicate_text_is_merged() {
		let mut metadata = Metadata::new(TagFormat::VorbisComments);
		metadata.add_text("ARTIST", String::from("A"));
		metadata.add_text("TITLE", String::from("Song"));
		metadata.add_text("ARTIST", String::from("B"));

		assert_eq!(metadata.len(), 2);
		assert_eq!(metadata.get_text("ARTIST"), Some("A; B"));
		assert_eq!(metadata.fields()[0].key(), "ARTIST");
	}

	#[test_log::test]
	fn duplicate_typed_values_are_merged() {
		let mut metadata = Metadata::new(TagFormat::VorbisComments);
		metadata.add_text("TRACKNUMBER", String::from("1"));
		metadata.add_text("BPM", String::from("120"));
		metadata.add_text("TRACKNUMBER", String::from("2"));
		metadata.add_text("BPM", String::from("fast"));

		assert_eq!(metadata.len(), 2);
		assert_eq!(metadata.get_text("TRACKNUMBER"), Some("1; 2"));
		assert_eq!(metadata.get_text("BPM"), Some("120; fast"));

		// A single typed value is still interpreted
		metadata.add_text("DISCNUMBER", String::from("1/2"));
		assert_eq!(
			metadata.get("DISCNUMBER").map(MetadataField::value),
			Some(&FieldValue::NumberPair {
				current: 1,
				total: Some(2)
			})
		);
	}

	#[test_log::test]
	fn duplicate_binary_is_kept() {
		let mut metadata = Metadata::new(TagFormat::Id3v2_4);
		for _ in 0..2 {
			metadata.add_field(
				"PRIV",
				FieldValue::Binary(BinaryData::new(&[1, 2, 3], 64, None)),
			);
		}

		assert_eq!(metadata.len(), 2);
		assert_eq!(metadata.fields()[0].handler().kind(), FieldKind::Binary);
	}

	#[test_log::test]
	fn empty_values_are_dropped() {
		let mut metadata = Metadata::new(TagFormat::ApeV2);
		metadata.add_text("Title", String::new());
		assert!(metadata.is_empty());
		assert_eq!(metadata.format_name(), "APEv2");
	}
}
