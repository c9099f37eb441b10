use serde_json::{Map, Value};
use tracing::warn;

use crate::codec::desc::{FieldDesc, StructDesc, TypeDesc};
use crate::codec::slot::{ObjectRef, Slot, StructData};
use crate::codec::text::export_text;
use crate::codec::{Codec, PropPath, PropertyFallback};

impl<F: PropertyFallback> Codec<F> {
	/// Encode a slot into a tree value.
	///
	/// Never fails: storage that does not match `desc` encodes as `Null`, and
	/// an object reached again through its own fields encodes as `Null`.
	pub fn encode(&self, desc: &TypeDesc, slot: &Slot) -> Value {
		Encoder::new(&self.fallback).value(&PropPath::root(), desc, slot)
	}

	/// Encode with optional inputs; a missing descriptor or slot yields `Null`.
	pub fn encode_any(&self, desc: Option<&TypeDesc>, slot: Option<&Slot>) -> Value {
		match (desc, slot) {
			(Some(desc), Some(slot)) => self.encode(desc, slot),
			_ => Value::Null,
		}
	}

	/// Encode struct storage into a tree object keyed by authored field names.
	pub fn encode_struct(&self, desc: &StructDesc, data: &StructData) -> Map<String, Value> {
		Encoder::new(&self.fallback).fields(&PropPath::root(), desc.fields(), data)
	}
}

struct Encoder<'a, F> {
	fallback: &'a F,
	visiting: Vec<ObjectRef>,
}

impl<'a, F: PropertyFallback> Encoder<'a, F> {
	fn new(fallback: &'a F) -> Self {
		Self {
			fallback,
			visiting: Vec::new(),
		}
	}

	fn fields<'f>(&mut self, path: &PropPath, fields: impl IntoIterator<Item = &'f FieldDesc>, data: &StructData) -> Map<String, Value> {
		let mut out = Map::new();
		for field in fields {
			let name = field.authored_name();
			let value = match data.field(field) {
				Some(slot) => self.value(&path.field(name), &field.ty, slot),
				None => Value::Null,
			};
			out.insert(name.to_owned(), value);
		}
		out
	}

	fn value(&mut self, path: &PropPath, desc: &TypeDesc, slot: &Slot) -> Value {
		match (desc, slot) {
			(TypeDesc::Array(inner), Slot::Array(items)) => Value::Array(
				items
					.iter()
					.enumerate()
					.map(|(index, item)| self.value(&path.index(index), inner, item))
					.collect(),
			),
			(TypeDesc::Set(inner), Slot::Set(items)) => Value::Array(
				items
					.iter()
					.enumerate()
					.map(|(index, item)| self.value(&path.index(index), inner, item))
					.collect(),
			),
			(TypeDesc::Map { key, value }, Slot::Map(pairs)) => {
				let mut out = Map::new();
				for (index, (k, v)) in pairs.iter().enumerate() {
					let key_text = match self.value(&path.index(index), key, k) {
						Value::String(text) => text,
						_ => {
							let text = export_text(key, k);
							if text.is_empty() {
								warn!(property = %path, index, "map key exported as an empty string");
							}
							text
						}
					};
					let item = self.value(&path.key(&key_text), value, v);
					out.insert(key_text, item);
				}
				Value::Object(out)
			}
			(TypeDesc::Struct(item), Slot::Struct(data)) => Value::Object(self.fields(path, item.fields(), data)),
			(TypeDesc::Object(_), Slot::Object(None)) => Value::Null,
			(TypeDesc::Object(class), Slot::Object(Some(object))) => {
				if class.native || object.class().native {
					return self.fallback.property_to_value(path, desc, slot);
				}
				if self.visiting.contains(object) {
					warn!(property = %path, object = %object.name(), "object cycle, encoding null");
					return Value::Null;
				}
				self.visiting.push(object.clone());
				let data = object.borrow();
				let class = data.class().clone();
				let out = self.fields(path, class.fields(), &data.fields);
				drop(data);
				self.visiting.pop();
				Value::Object(out)
			}
			(TypeDesc::Scalar(_), slot) if slot.matches(desc) => self.fallback.property_to_value(path, desc, slot),
			_ => {
				warn!(
					property = %path,
					expected = desc.kind_label(),
					found = slot.kind_label(),
					"slot storage does not match property type, encoding null"
				);
				Value::Null
			}
		}
	}
}
