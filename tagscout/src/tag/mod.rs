//! The data model shared by every format
//!
//! Detection produces [`TagLocation`]s, and parsing turns a location into [`Metadata`]: an ordered
//! list of [`MetadataField`]s, each carrying a typed [`FieldValue`] and the [`FieldHandler`] its
//! key resolved to.

mod format;
mod handler;
mod location;
mod metadata;
mod value;

pub use format::TagFormat;
pub use handler::{FieldHandler, FieldKind};
pub use location::TagLocation;
pub use metadata::{Metadata, MetadataField};
pub use value::{BinaryData, FieldValue, PictureData};

