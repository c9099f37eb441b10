//! JSON text codec over the abstract value tree.

use serde_json::Value;
use tracing::warn;

use crate::codec::desc::TypeDesc;
use crate::codec::slot::Slot;
use crate::codec::{Applied, Codec, CodecError, PropertyFallback, Result};

/// JSON text layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonStyle {
	/// Indented, one entry per line.
	#[default]
	Pretty,
	/// Single line without insignificant whitespace.
	Condensed,
}

/// Tree kind label used in diagnostics.
pub fn kind_label(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "bool",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

/// Whether `value` is an array or object with at least one entry.
pub fn has_content(value: &Value) -> bool {
	match value {
		Value::Array(items) => !items.is_empty(),
		Value::Object(entries) => !entries.is_empty(),
		_ => false,
	}
}

/// Write a tree as JSON text; the root must be an array or object.
pub fn to_string(value: &Value, style: JsonStyle) -> Result<String> {
	if !matches!(value, Value::Array(_) | Value::Object(_)) {
		return Err(CodecError::UnserializableRoot { kind: kind_label(value) });
	}
	let text = match style {
		JsonStyle::Pretty => serde_json::to_string_pretty(value)?,
		JsonStyle::Condensed => serde_json::to_string(value)?,
	};
	Ok(text)
}

/// Parse JSON text of any top-level shape.
pub fn from_str(text: &str) -> Result<Value> {
	if text.trim().is_empty() {
		return Err(CodecError::EmptyDocument);
	}
	Ok(serde_json::from_str(text)?)
}

impl<F: PropertyFallback> Codec<F> {
	/// Encode a slot as pretty JSON text.
	pub fn struct_to_json_string(&self, desc: &TypeDesc, slot: &Slot) -> Result<String> {
		self.struct_to_json_string_with(desc, slot, JsonStyle::Pretty)
	}

	/// Encode a slot as JSON text in the given style.
	pub fn struct_to_json_string_with(&self, desc: &TypeDesc, slot: &Slot, style: JsonStyle) -> Result<String> {
		to_string(&self.encode(desc, slot), style)
	}

	/// Decode JSON text into a slot.
	///
	/// Parse failures are reported before the slot is touched. A document
	/// whose resolved top level is an empty array or object applies nothing.
	pub fn json_string_to_struct(&self, desc: &TypeDesc, slot: &mut Slot, text: &str) -> Result<Applied> {
		let parsed = from_str(text).inspect_err(|err| warn!(%err, "failed to parse json document"))?;
		let value = self.resolve_names(desc, &parsed);
		if !has_content(&value) {
			return Ok(Applied::Nothing);
		}
		self.decode(&value, desc, slot)?;
		Ok(Applied::Written)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::{JsonStyle, from_str, to_string};
	use crate::codec::CodecError;

	#[test]
	fn scalar_roots_are_rejected() {
		assert!(matches!(to_string(&json!(3), JsonStyle::Pretty), Err(CodecError::UnserializableRoot { kind: "number" })));
		assert_eq!(to_string(&json!({"A": [1, 2]}), JsonStyle::Condensed).expect("object writes"), r#"{"A":[1,2]}"#);
	}

	#[test]
	fn parse_keeps_key_order() {
		let value = from_str(r#"{"b":1,"a":2}"#).expect("json parses");
		let keys: Vec<_> = value.as_object().expect("object root").keys().cloned().collect();
		assert_eq!(keys, ["b", "a"]);
		assert!(matches!(from_str("  "), Err(CodecError::EmptyDocument)));
		assert!(matches!(from_str("{"), Err(CodecError::Json(_))));
	}
}
