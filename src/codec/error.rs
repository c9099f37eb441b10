use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::codec::{PropPath, json};

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors produced while encoding, decoding, and (de)serializing values.
#[derive(Debug, Error)]
pub enum CodecError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// JSON text could not be parsed or written.
	#[error("json: {0}")]
	Json(#[from] serde_json::Error),
	/// XML text could not be parsed.
	#[error("xml: {0}")]
	Xml(#[from] roxmltree::Error),
	/// Input document was empty.
	#[error("empty document")]
	EmptyDocument,
	/// Tree root is not an array or object and cannot be written as a document.
	#[error("cannot serialize top-level {kind} value, expected object or array")]
	UnserializableRoot {
		/// Tree kind found at the root.
		kind: &'static str,
	},
	/// Tree value shape did not match the descriptor.
	#[error("property {property}: expected {expected}, got {got}")]
	ShapeMismatch {
		/// Property path where the mismatch was detected.
		property: String,
		/// Tree kind required by the descriptor.
		expected: &'static str,
		/// Tree kind actually found.
		got: &'static str,
	},
	/// Slot storage did not match the descriptor it was paired with.
	#[error("property {property}: slot storage is not {expected}")]
	StorageMismatch {
		/// Property path where the mismatch was detected.
		property: String,
		/// Storage kind required by the descriptor.
		expected: &'static str,
	},
	/// Numeric value does not fit the target scalar kind.
	#[error("property {property}: {value} does not fit {kind}")]
	NumberOutOfRange {
		/// Property path of the numeric slot.
		property: String,
		/// Rendered source value.
		value: String,
		/// Target scalar kind label.
		kind: &'static str,
	},
	/// Text could not be imported into a slot.
	#[error("invalid {kind} text {text:?}")]
	InvalidText {
		/// Descriptor kind label being imported.
		kind: String,
		/// Offending text.
		text: String,
	},
	/// Enum value does not name a known variant.
	#[error("unknown variant {variant:?} for enum {enum_name}")]
	UnknownEnumVariant {
		/// Enum type name.
		enum_name: String,
		/// Requested variant text.
		variant: String,
	},
	/// Object reference text could not be resolved to an instance.
	#[error("property {property}: unresolved object reference {reference:?}")]
	UnresolvedObject {
		/// Property path of the reference.
		property: String,
		/// Reference text.
		reference: String,
	},
	/// Object instance was already borrowed further up the decode stack.
	#[error("property {property}: object {object} is already being decoded")]
	ObjectBusy {
		/// Property path of the reference.
		property: String,
		/// Object instance name.
		object: String,
	},
	/// Class fields were defined twice.
	#[error("class {name} is already defined")]
	ClassRedefined {
		/// Class name.
		name: String,
	},
	/// Class fields were defined before its super class.
	#[error("class {name} defined before its super class {super_name}")]
	SuperClassUndefined {
		/// Class name.
		name: String,
		/// Super class name.
		super_name: String,
	},
	/// Descriptor cannot be stored in a config file.
	#[error("config key {section}.{key}: unsupported type {type_name}")]
	UnsupportedConfigType {
		/// Config section.
		section: String,
		/// Config key.
		key: String,
		/// Descriptor type name.
		type_name: String,
	},
	/// Data table import reported row or column problems.
	#[error("table import failed: {}", problems.join("; "))]
	TableImport {
		/// One message per rejected row or cell.
		problems: Vec<String>,
	},
	/// Schema document referenced an unknown type.
	#[error("schema: unknown type {name:?} referenced by {owner}")]
	SchemaUnknownType {
		/// Referenced type name.
		name: String,
		/// Declaration that referenced it.
		owner: String,
	},
	/// Schema document declared a type name twice.
	#[error("schema: duplicate type name {name:?}")]
	SchemaDuplicateType {
		/// Duplicated name.
		name: String,
	},
	/// Schema document contains a struct embedding itself by value.
	#[error("schema: struct {name} contains itself by value")]
	SchemaRecursiveStruct {
		/// Struct name.
		name: String,
	},
	/// Schema document contains a cyclic super class chain.
	#[error("schema: class {name} has a cyclic super class chain")]
	SchemaCyclicClass {
		/// Class name.
		name: String,
	},
	/// Schema field default did not decode into the field type.
	#[error("schema: bad default for {owner}.{field}: {source}")]
	SchemaBadDefault {
		/// Owning struct or class.
		owner: String,
		/// Field name.
		field: String,
		/// Decode failure.
		#[source]
		source: Box<CodecError>,
	},
	/// Requested type name was not found in the registry.
	#[error("unknown type: {name}")]
	UnknownType {
		/// Requested type name.
		name: String,
	},
}

impl CodecError {
	/// Build a [`CodecError::ShapeMismatch`] and report it on the diagnostic sink.
	pub(crate) fn shape_mismatch(property: &PropPath, expected: &'static str, got: &Value) -> Self {
		let got = json::kind_label(got);
		warn!(%property, expected, got, "value shape does not match property type");
		Self::ShapeMismatch {
			property: property.to_string(),
			expected,
			got,
		}
	}

	/// Build a [`CodecError::StorageMismatch`] and report it on the diagnostic sink.
	pub(crate) fn storage_mismatch(property: &PropPath, expected: &'static str) -> Self {
		warn!(%property, expected, "slot storage does not match property type");
		Self::StorageMismatch {
			property: property.to_string(),
			expected,
		}
	}
}
