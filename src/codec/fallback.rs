use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Number, Value};

use crate::codec::desc::{ClassDesc, ScalarKind, TypeDesc};
use crate::codec::slot::{ObjectRef, Slot};
use crate::codec::text::{enum_value, export_text, float_to_f64, import_text_with};
use crate::codec::{CodecError, PropPath, Result, TypeEntry, TypeRegistry};

/// Single-value conversion used for scalar leaves, native object references
/// and struct text.
pub trait PropertyFallback {
	/// Convert one slot into a tree value.
	fn property_to_value(&self, path: &PropPath, desc: &TypeDesc, slot: &Slot) -> Value;

	/// Convert one tree value into a slot.
	fn value_to_property(&self, path: &PropPath, value: &Value, desc: &TypeDesc, slot: &mut Slot) -> Result<()>;

	/// Class named by a `_ClassName` key, used when allocating a missing instance.
	fn resolve_class(&self, _name: &str) -> Option<Arc<ClassDesc>> {
		None
	}
}

/// Default conversions with tables of named object instances and classes.
#[derive(Debug, Default)]
pub struct DefaultFallback {
	objects: HashMap<String, ObjectRef>,
	classes: HashMap<String, Arc<ClassDesc>>,
}

impl DefaultFallback {
	/// Make `class` resolvable from a `_ClassName` key.
	pub fn register_class(&mut self, class: Arc<ClassDesc>) {
		self.classes.insert(class.name.clone(), class);
	}

	/// Register every class of `registry`.
	pub fn register_classes(&mut self, registry: &TypeRegistry) {
		for (_, entry) in registry.iter() {
			if let TypeEntry::Class(class) = entry {
				self.register_class(class.clone());
			}
		}
	}

	/// Make `object` resolvable by its name and its `Class'name'` reference text.
	pub fn register_object(&mut self, object: ObjectRef) {
		self.objects.insert(object.name(), object);
	}

	/// Resolve `name` or `Class'name'` to a registered instance.
	pub fn lookup(&self, reference: &str) -> Option<ObjectRef> {
		let (class, name) = split_reference(reference);
		let object = self.objects.get(name)?;
		match class {
			Some(class) if object.class().name != class => None,
			_ => Some(object.clone()),
		}
	}

	fn decode_object(&self, path: &PropPath, value: &Value, class: &ClassDesc) -> Result<Option<ObjectRef>> {
		let reference = match value {
			Value::Null => return Ok(None),
			Value::String(text) => text.trim(),
			other => return Err(CodecError::shape_mismatch(path, "object", other)),
		};
		if reference.is_empty() || reference == "None" {
			return Ok(None);
		}
		match self.lookup(reference) {
			Some(object) if object.class().is_child_of(class) => Ok(Some(object)),
			_ => Err(CodecError::UnresolvedObject {
				property: path.to_string(),
				reference: reference.to_owned(),
			}),
		}
	}
}

fn split_reference(reference: &str) -> (Option<&str>, &str) {
	match reference.split_once('\'') {
		Some((class, rest)) => (Some(class), rest.strip_suffix('\'').unwrap_or(rest)),
		None => (None, reference),
	}
}

impl PropertyFallback for DefaultFallback {
	fn property_to_value(&self, _path: &PropPath, desc: &TypeDesc, slot: &Slot) -> Value {
		match (desc, slot) {
			(TypeDesc::Scalar(ScalarKind::Enum(item)), Slot::Enum(value)) => match item.name_of(*value) {
				Some(name) => Value::String(name.to_owned()),
				None => Value::from(*value),
			},
			(TypeDesc::Scalar(_), Slot::Bool(value)) => Value::Bool(*value),
			(TypeDesc::Scalar(_), Slot::Int(value)) => Value::from(*value),
			(TypeDesc::Scalar(_), Slot::UInt(value)) => Value::from(*value),
			(TypeDesc::Scalar(_), Slot::Float(value)) => float_value(float_to_f64(*value)),
			(TypeDesc::Scalar(_), Slot::Double(value)) => float_value(*value),
			(TypeDesc::Scalar(_), Slot::Str(value)) => Value::String(value.clone()),
			(TypeDesc::Object(_), Slot::Object(None)) => Value::Null,
			(TypeDesc::Object(_), Slot::Object(Some(object))) => Value::String(object.path_name()),
			_ => Value::String(export_text(desc, slot)),
		}
	}

	fn value_to_property(&self, path: &PropPath, value: &Value, desc: &TypeDesc, slot: &mut Slot) -> Result<()> {
		let decoded = match desc {
			TypeDesc::Scalar(kind) => decode_scalar(path, value, kind)?,
			TypeDesc::Object(class) => Slot::Object(self.decode_object(path, value, class)?),
			_ => match value {
				Value::String(text) => {
					return import_text_with(desc, slot, text, &|reference| self.lookup(reference));
				}
				other => return Err(CodecError::shape_mismatch(path, desc.kind_label(), other)),
			},
		};
		*slot = decoded;
		Ok(())
	}

	fn resolve_class(&self, name: &str) -> Option<Arc<ClassDesc>> {
		self.classes.get(name).cloned()
	}
}

fn float_value(value: f64) -> Value {
	Number::from_f64(value).map_or(Value::Null, Value::Number)
}

#[derive(Clone, Copy)]
enum Num {
	Signed(i64),
	Unsigned(u64),
	Float(f64),
}

impl Num {
	fn render(&self) -> String {
		match self {
			Self::Signed(value) => value.to_string(),
			Self::Unsigned(value) => value.to_string(),
			Self::Float(value) => value.to_string(),
		}
	}

	fn as_f64(&self) -> f64 {
		match self {
			Self::Signed(value) => *value as f64,
			Self::Unsigned(value) => *value as f64,
			Self::Float(value) => *value,
		}
	}
}

fn parse_num(text: &str) -> Option<Num> {
	let text = text.trim();
	if let Ok(value) = text.parse::<i64>() {
		return Some(Num::Signed(value));
	}
	if let Ok(value) = text.parse::<u64>() {
		return Some(Num::Unsigned(value));
	}
	text.parse::<f64>().ok().map(Num::Float)
}

fn number_of(number: &Number) -> Option<Num> {
	number
		.as_i64()
		.map(Num::Signed)
		.or_else(|| number.as_u64().map(Num::Unsigned))
		.or_else(|| number.as_f64().map(Num::Float))
}

fn decode_scalar(path: &PropPath, value: &Value, kind: &ScalarKind) -> Result<Slot> {
	let mismatch = || CodecError::shape_mismatch(path, kind.label(), value);
	match kind {
		ScalarKind::Bool => match value {
			Value::Bool(flag) => Ok(Slot::Bool(*flag)),
			Value::String(text) if text.eq_ignore_ascii_case("true") => Ok(Slot::Bool(true)),
			Value::String(text) if text.eq_ignore_ascii_case("false") => Ok(Slot::Bool(false)),
			Value::Number(number) => Ok(Slot::Bool(number.as_f64().is_some_and(|item| item != 0.0))),
			_ => Err(mismatch()),
		},
		ScalarKind::Str | ScalarKind::Name => match value {
			Value::String(text) => Ok(Slot::Str(text.clone())),
			Value::Number(number) => Ok(Slot::Str(number.to_string())),
			Value::Bool(flag) => Ok(Slot::Str(flag.to_string())),
			_ => Err(mismatch()),
		},
		ScalarKind::Enum(item) => match value {
			Value::String(text) => Ok(Slot::Enum(enum_value(item, text.trim())?)),
			Value::Number(number) => match number.as_i64() {
				Some(raw) if item.name_of(raw).is_some() => Ok(Slot::Enum(raw)),
				_ => Err(CodecError::UnknownEnumVariant {
					enum_name: item.name.clone(),
					variant: number.to_string(),
				}),
			},
			_ => Err(mismatch()),
		},
		kind => {
			let num = match value {
				Value::Number(number) => number_of(number),
				Value::Bool(flag) => Some(Num::Signed(i64::from(*flag))),
				Value::String(text) => Some(parse_num(text).ok_or_else(|| CodecError::InvalidText {
					kind: kind.label().to_owned(),
					text: text.clone(),
				})?),
				_ => None,
			};
			let Some(num) = num else {
				return Err(mismatch());
			};
			numeric_slot(path, kind, num)
		}
	}
}

fn numeric_slot(path: &PropPath, kind: &ScalarKind, num: Num) -> Result<Slot> {
	let out_of_range = || CodecError::NumberOutOfRange {
		property: path.to_string(),
		value: num.render(),
		kind: kind.label(),
	};
	match kind {
		ScalarKind::Float => Ok(Slot::Float(num.as_f64() as f32)),
		ScalarKind::Double => Ok(Slot::Double(num.as_f64())),
		kind if kind.is_unsigned_integer() => {
			let value = match num {
				Num::Signed(value) => u64::try_from(value).map_err(|_| out_of_range())?,
				Num::Unsigned(value) => value,
				Num::Float(value) => truncate(value, 0.0, kind.unsigned_max() as f64).ok_or_else(out_of_range)? as u64,
			};
			if value > kind.unsigned_max() {
				return Err(out_of_range());
			}
			Ok(Slot::UInt(value))
		}
		kind => {
			let (lo, hi) = kind.signed_range();
			let value = match num {
				Num::Signed(value) => value,
				Num::Unsigned(value) => i64::try_from(value).map_err(|_| out_of_range())?,
				Num::Float(value) => truncate(value, lo as f64, hi as f64).ok_or_else(out_of_range)? as i64,
			};
			if value < lo || value > hi {
				return Err(out_of_range());
			}
			Ok(Slot::Int(value))
		}
	}
}

fn truncate(value: f64, lo: f64, hi: f64) -> Option<f64> {
	let value = value.trunc();
	(value.is_finite() && value >= lo && value <= hi).then_some(value)
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use serde_json::{Value, json};

	use super::{DefaultFallback, PropertyFallback};
	use crate::codec::{ClassDesc, CodecError, EnumDesc, PropPath, ScalarKind, Slot, TypeDesc};

	fn decode(value: Value, desc: &TypeDesc) -> crate::codec::Result<Slot> {
		let mut slot = Slot::default_for(desc);
		DefaultFallback::default().value_to_property(&PropPath::root(), &value, desc, &mut slot)?;
		Ok(slot)
	}

	#[test]
	fn numbers_accept_strings_and_bools() {
		let desc = TypeDesc::scalar(ScalarKind::Int32);
		assert_eq!(decode(json!("42"), &desc).expect("string decodes"), Slot::Int(42));
		assert_eq!(decode(json!(true), &desc).expect("bool decodes"), Slot::Int(1));
		assert_eq!(decode(json!(2.9), &desc).expect("float truncates"), Slot::Int(2));
		assert!(matches!(decode(json!(null), &desc), Err(CodecError::ShapeMismatch { .. })));
	}

	#[test]
	fn integers_are_range_checked() {
		let desc = TypeDesc::scalar(ScalarKind::UInt8);
		assert!(matches!(decode(json!(256), &desc), Err(CodecError::NumberOutOfRange { .. })));
		assert!(matches!(decode(json!(-1), &desc), Err(CodecError::NumberOutOfRange { .. })));
		assert_eq!(decode(json!(255), &desc).expect("max fits"), Slot::UInt(255));
	}

	#[test]
	fn enums_use_variant_names() {
		let desc = TypeDesc::scalar(ScalarKind::Enum(Arc::new(EnumDesc::new("Mode", [("Off", 0), ("On", 3)]))));
		let slot = decode(json!("On"), &desc).expect("name decodes");
		assert_eq!(slot, Slot::Enum(3));
		assert_eq!(DefaultFallback::default().property_to_value(&PropPath::root(), &desc, &slot), json!("On"));
		assert!(matches!(decode(json!("Dim"), &desc), Err(CodecError::UnknownEnumVariant { .. })));
	}

	#[test]
	fn floats_encode_without_binary_noise() {
		let desc = TypeDesc::scalar(ScalarKind::Float);
		let value = DefaultFallback::default().property_to_value(&PropPath::root(), &desc, &Slot::Float(0.1));
		assert_eq!(value, json!(0.1));
	}

	#[test]
	fn native_objects_resolve_through_the_table() {
		let class = ClassDesc::declare_native("Texture");
		let desc = TypeDesc::object(class.clone());
		let texture = class.construct("Grass");
		let mut fallback = DefaultFallback::default();
		fallback.register_object(texture.clone());

		let mut slot = Slot::default_for(&desc);
		fallback
			.value_to_property(&PropPath::root(), &json!("Texture'Grass'"), &desc, &mut slot)
			.expect("reference resolves");
		assert_eq!(slot, Slot::Object(Some(texture)));
		assert_eq!(fallback.property_to_value(&PropPath::root(), &desc, &slot), json!("Texture'Grass'"));

		fallback
			.value_to_property(&PropPath::root(), &json!("None"), &desc, &mut slot)
			.expect("None clears");
		assert_eq!(slot, Slot::Object(None));
		assert!(matches!(
			fallback.value_to_property(&PropPath::root(), &json!("Texture'Sand'"), &desc, &mut slot),
			Err(CodecError::UnresolvedObject { .. })
		));
	}
}
