//! Helpers for building and querying JSON trees by hand.
//!
//! Coercions (`as_*`) never fail: values of another kind convert where a
//! sensible reading exists and fall back to the zero value otherwise.

use serde_json::{Map, Number, Value};

use crate::codec::{CodecError, PropPath, Result};

/// JSON object with insertion-ordered keys.
pub type JsonObject = Map<String, Value>;

/// Kind of a JSON value; `None` marks an absent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
	/// No value present.
	None,
	/// `null`.
	Null,
	/// String.
	String,
	/// Number.
	Number,
	/// `true` or `false`.
	Boolean,
	/// Array.
	Array,
	/// Object.
	Object,
}

/// Empty object.
pub fn make_object() -> JsonObject {
	Map::new()
}

/// Builder form of [`set_field`].
pub fn make_field(mut object: JsonObject, name: &str, value: Value) -> JsonObject {
	set_field(&mut object, name, value);
	object
}

/// Insert or replace a field, keeping the position of an existing key.
pub fn set_field(object: &mut JsonObject, name: &str, value: Value) {
	object.insert(name.to_owned(), value);
}

/// Whether `name` is present.
pub fn has_field(object: &JsonObject, name: &str) -> bool {
	object.contains_key(name)
}

/// Whether `name` is present with kind `ty`.
pub fn has_typed_field(object: &JsonObject, name: &str, ty: JsonType) -> bool {
	object.get(name).is_some_and(|value| json_type(value) == ty)
}

/// Remove a field, returning its value.
pub fn remove_field(object: &mut JsonObject, name: &str) -> Option<Value> {
	object.shift_remove(name)
}

/// Borrow a field.
pub fn field<'a>(object: &'a JsonObject, name: &str) -> Option<&'a Value> {
	object.get(name)
}

/// Kind of a field, [`JsonType::None`] when absent.
pub fn field_type(object: &JsonObject, name: &str) -> JsonType {
	object.get(name).map_or(JsonType::None, json_type)
}

/// Kind of a value.
pub fn json_type(value: &Value) -> JsonType {
	match value {
		Value::Null => JsonType::Null,
		Value::Bool(_) => JsonType::Boolean,
		Value::Number(_) => JsonType::Number,
		Value::String(_) => JsonType::String,
		Value::Array(_) => JsonType::Array,
		Value::Object(_) => JsonType::Object,
	}
}

/// Whether a value is `null`.
pub fn is_null(value: &Value) -> bool {
	value.is_null()
}

/// Structural equality; numbers compare by value and object key order is ignored.
pub fn values_equal(a: &Value, b: &Value) -> bool {
	match (a, b) {
		(Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
		(Value::Array(x), Value::Array(y)) => x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r)),
		(Value::Object(x), Value::Object(y)) => {
			x.len() == y.len() && x.iter().all(|(key, l)| y.get(key).is_some_and(|r| values_equal(l, r)))
		}
		_ => a == b,
	}
}

/// Single-line JSON text.
pub fn to_condensed_string(object: &JsonObject) -> Result<String> {
	Ok(serde_json::to_string(object)?)
}

/// Indented JSON text.
pub fn to_pretty_string(object: &JsonObject) -> Result<String> {
	Ok(serde_json::to_string_pretty(object)?)
}

/// Parse text whose top level must be an object.
pub fn parse_object(text: &str) -> Result<JsonObject> {
	match crate::codec::json::from_str(text)? {
		Value::Object(object) => Ok(object),
		other => Err(CodecError::shape_mismatch(&PropPath::root(), "object", &other)),
	}
}

/// String value.
pub fn make_string(value: &str) -> Value {
	Value::String(value.to_owned())
}

/// Integer value.
pub fn make_int(value: i32) -> Value {
	Value::from(value)
}

/// Float value; non-finite input becomes `null`.
pub fn make_float(value: f32) -> Value {
	Number::from_f64(crate::codec::text::float_to_f64(value)).map_or(Value::Null, Value::Number)
}

/// Boolean value.
pub fn make_bool(value: bool) -> Value {
	Value::Bool(value)
}

/// Array value.
pub fn make_array(items: Vec<Value>) -> Value {
	Value::Array(items)
}

/// Object value.
pub fn make_object_value(object: JsonObject) -> Value {
	Value::Object(object)
}

/// `null`.
pub fn make_null() -> Value {
	Value::Null
}

/// String reading: numbers and booleans are rendered, containers read as empty.
pub fn as_string(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		Value::Number(number) => number.to_string(),
		Value::Bool(flag) => flag.to_string(),
		_ => String::new(),
	}
}

/// Integer reading, truncating and saturating.
pub fn as_int(value: &Value) -> i32 {
	let raw = match value {
		Value::Number(number) => number.as_f64().unwrap_or(0.0),
		Value::String(text) => text.trim().parse::<f64>().unwrap_or(0.0),
		Value::Bool(flag) => f64::from(u8::from(*flag)),
		_ => 0.0,
	};
	raw as i32
}

/// Float reading.
pub fn as_float(value: &Value) -> f32 {
	match value {
		Value::Number(number) => number.as_f64().unwrap_or(0.0) as f32,
		Value::String(text) => text.trim().parse::<f32>().unwrap_or(0.0),
		Value::Bool(flag) => f32::from(u8::from(*flag)),
		_ => 0.0,
	}
}

/// Boolean reading: non-zero numbers and the text `true` are true.
pub fn as_bool(value: &Value) -> bool {
	match value {
		Value::Bool(flag) => *flag,
		Value::Number(number) => number.as_f64().is_some_and(|item| item != 0.0),
		Value::String(text) => text.eq_ignore_ascii_case("true"),
		_ => false,
	}
}

/// Array elements, empty for any other kind.
pub fn as_array(value: &Value) -> Vec<Value> {
	value.as_array().cloned().unwrap_or_default()
}

/// Object fields, empty for any other kind.
pub fn as_object(value: &Value) -> JsonObject {
	value.as_object().cloned().unwrap_or_default()
}
