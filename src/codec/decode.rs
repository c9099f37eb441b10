use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use crate::codec::desc::{ClassDesc, FieldDesc, StructDesc, TypeDesc};
use crate::codec::slot::{Slot, StructData};
use crate::codec::{CLASS_NAME_FIELD, Codec, CodecError, PropPath, PropertyFallback, Result};

impl<F: PropertyFallback> Codec<F> {
	/// Decode a tree value into a slot.
	///
	/// Fails on the first shape mismatch. Mutations applied before the
	/// failing property are kept.
	pub fn decode(&self, value: &Value, desc: &TypeDesc, slot: &mut Slot) -> Result<()> {
		self.decode_at(&PropPath::root(), value, desc, slot)
	}

	/// Decode a tree object into struct storage, matching fields by internal name.
	pub fn decode_struct(&self, value: &Value, desc: &StructDesc, data: &mut StructData) -> Result<()> {
		let root = PropPath::root();
		match value {
			Value::Object(map) => self.decode_fields(&root, map, desc.fields(), data, false),
			Value::Null => Ok(()),
			other => Err(CodecError::shape_mismatch(&root, "struct", other)),
		}
	}

	fn decode_at(&self, path: &PropPath, value: &Value, desc: &TypeDesc, slot: &mut Slot) -> Result<()> {
		match desc {
			TypeDesc::Array(inner) => {
				let items = match value {
					Value::Array(items) => items,
					Value::Null => return Ok(()),
					other => return Err(CodecError::shape_mismatch(path, "array", other)),
				};
				let Slot::Array(array) = slot else {
					return Err(CodecError::storage_mismatch(path, "array"));
				};
				let items: Vec<_> = items.iter().enumerate().filter(|(_, item)| !null_scalar(inner, item)).collect();
				array.resize(items.len(), inner);
				for ((index, item), target) in items.into_iter().zip(array.iter_mut()) {
					self.decode_at(&path.index(index), item, inner, target)?;
				}
				Ok(())
			}
			TypeDesc::Set(inner) => {
				let items = match value {
					Value::Array(items) => items,
					Value::Null => return Ok(()),
					other => return Err(CodecError::shape_mismatch(path, "set", other)),
				};
				let Slot::Set(set) = slot else {
					return Err(CodecError::storage_mismatch(path, "set"));
				};
				for (index, item) in items.iter().enumerate().filter(|(_, item)| !null_scalar(inner, item)) {
					let idx = set.add_default_needs_rehash(inner);
					if let Some(target) = set.element_mut(idx) {
						self.decode_at(&path.index(index), item, inner, target)?;
					}
				}
				set.rehash();
				Ok(())
			}
			TypeDesc::Map { key, value: inner } => {
				let entries = match value {
					Value::Object(entries) => entries,
					Value::Null => return Ok(()),
					other => return Err(CodecError::shape_mismatch(path, "map", other)),
				};
				let Slot::Map(map) = slot else {
					return Err(CodecError::storage_mismatch(path, "map"));
				};
				map.empty_values(entries.len());
				for (name, item) in entries {
					let idx = map.add_default_needs_rehash(key, inner);
					let Some((key_slot, value_slot)) = map.pair_mut(idx) else {
						continue;
					};
					let entry_path = path.key(name);
					self.decode_at(&entry_path, &Value::String(name.clone()), key, key_slot)?;
					self.decode_at(&entry_path, item, inner, value_slot)?;
				}
				map.rehash();
				Ok(())
			}
			TypeDesc::Struct(item) => match value {
				Value::String(_) => self.fallback.value_to_property(path, value, desc, slot),
				Value::Object(map) => {
					let Slot::Struct(data) = slot else {
						return Err(CodecError::storage_mismatch(path, "struct"));
					};
					self.decode_fields(path, map, item.fields(), data, false)
				}
				Value::Null => Ok(()),
				other => Err(CodecError::shape_mismatch(path, "struct", other)),
			},
			TypeDesc::Object(class) if class.native => self.fallback.value_to_property(path, value, desc, slot),
			TypeDesc::Object(class) => match value {
				Value::Object(map) => self.decode_object(path, map, class, slot),
				Value::Null => Ok(()),
				other => Err(CodecError::shape_mismatch(path, "object", other)),
			},
			TypeDesc::Scalar(_) => self.fallback.value_to_property(path, value, desc, slot),
		}
	}

	fn decode_object(&self, path: &PropPath, map: &Map<String, Value>, class: &Arc<ClassDesc>, slot: &mut Slot) -> Result<()> {
		let Slot::Object(reference) = slot else {
			return Err(CodecError::storage_mismatch(path, "object"));
		};
		let allocated = reference.is_none();
		let object = reference
			.get_or_insert_with(|| self.requested_class(path, map, class).allocate_zeroed())
			.clone();
		let mut instance = object.try_borrow_mut().map_err(|_| CodecError::ObjectBusy {
			property: path.to_string(),
			object: class.name.clone(),
		})?;

		let instance_class = instance.class().clone();
		match map.get(CLASS_NAME_FIELD) {
			Some(Value::String(requested)) if !allocated && *requested != instance_class.name => {
				warn!(
					property = %path,
					requested = %requested,
					instance = %instance_class.name,
					"class name differs from the existing instance, keeping the instance"
				);
			}
			_ => {}
		}

		self.decode_fields(path, map, instance_class.fields(), &mut instance.fields, true)
	}

	/// Class to allocate for a null reference: the `_ClassName` class when it
	/// derives from `declared`, else `declared`.
	fn requested_class(&self, path: &PropPath, map: &Map<String, Value>, declared: &Arc<ClassDesc>) -> Arc<ClassDesc> {
		let requested = match map.get(CLASS_NAME_FIELD) {
			Some(Value::String(requested)) if *requested != declared.name => requested,
			_ => return declared.clone(),
		};
		match self.fallback.resolve_class(requested) {
			Some(found) if found.is_child_of(declared) => found,
			Some(_) => {
				warn!(property = %path, requested = %requested, declared = %declared.name, "class does not derive from the declared class");
				declared.clone()
			}
			None => {
				warn!(property = %path, requested = %requested, declared = %declared.name, "unknown class name");
				declared.clone()
			}
		}
	}

	fn decode_fields<'f>(
		&self,
		path: &PropPath,
		map: &Map<String, Value>,
		fields: impl IntoIterator<Item = &'f FieldDesc>,
		data: &mut StructData,
		accept_authored: bool,
	) -> Result<()> {
		for field in fields {
			let found = match map.get(&field.name) {
				None if accept_authored => map.get(field.authored_name()),
				found => found,
			};
			let Some(item) = found else {
				continue;
			};
			let field_path = path.field(&field.name);
			let Some(target) = data.field_mut(field) else {
				return Err(CodecError::storage_mismatch(&field_path, field.ty.kind_label()));
			};
			self.decode_at(&field_path, item, &field.ty, target)?;
		}
		Ok(())
	}
}

/// Null items of scalar arrays and sets are skipped rather than decoded.
fn null_scalar(inner: &TypeDesc, item: &Value) -> bool {
	item.is_null() && matches!(inner, TypeDesc::Scalar(_))
}

impl<F> Codec<F> {
	/// Rebuild every struct and object level of `value` keyed by internal field names.
	///
	/// Each field is looked up by its authored name first and then by its
	/// internal name. Struct levels drop keys naming no field; object levels
	/// keep them so fields of a more derived instance class still decode.
	/// Values whose shape does not fit the descriptor are left as they are.
	pub fn resolve_names(&self, desc: &TypeDesc, value: &Value) -> Value {
		resolve(desc, value)
	}
}

fn resolve(desc: &TypeDesc, value: &Value) -> Value {
	match (desc, value) {
		(TypeDesc::Array(inner) | TypeDesc::Set(inner), Value::Array(items)) => Value::Array(items.iter().map(|item| resolve(inner, item)).collect()),
		(TypeDesc::Map { value: inner, .. }, Value::Object(entries)) => {
			Value::Object(entries.iter().map(|(key, item)| (key.clone(), resolve(inner, item))).collect())
		}
		(TypeDesc::Struct(item), Value::Object(map)) => Value::Object(resolve_fields(item.fields(), map, false)),
		(TypeDesc::Object(class), Value::Object(map)) if !class.native => Value::Object(resolve_fields(class.fields(), map, true)),
		_ => value.clone(),
	}
}

fn resolve_fields<'f>(fields: impl IntoIterator<Item = &'f FieldDesc>, map: &Map<String, Value>, keep_unknown: bool) -> Map<String, Value> {
	let mut out = Map::new();
	let mut used = HashSet::new();
	for field in fields {
		let found = [field.authored_name(), field.name.as_str()]
			.into_iter()
			.find_map(|name| map.get(name).map(|item| (name, item)));
		if let Some((name, item)) = found {
			used.insert(name.to_owned());
			out.insert(field.name.clone(), resolve(&field.ty, item));
		}
	}
	if keep_unknown {
		for (key, item) in map {
			if !used.contains(key) && !out.contains_key(key) {
				out.insert(key.clone(), item.clone());
			}
		}
	}
	out
}
