use std::cell::{BorrowMutError, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;

use crate::codec::desc::{ClassDesc, FieldDesc, ScalarKind, TypeDesc};

/// Owned storage for one value described by a [`TypeDesc`].
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
	/// Boolean storage.
	Bool(bool),
	/// Signed integer storage (all signed widths).
	Int(i64),
	/// Unsigned integer storage (all unsigned widths).
	UInt(u64),
	/// 32-bit float storage.
	Float(f32),
	/// 64-bit float storage.
	Double(f64),
	/// String and name storage.
	Str(String),
	/// Enum storage as numeric value.
	Enum(i64),
	/// Array backing store.
	Array(ScriptArray),
	/// Set backing store.
	Set(ScriptSet),
	/// Map backing store.
	Map(ScriptMap),
	/// Inline struct fields.
	Struct(StructData),
	/// Object reference, `None` when null.
	Object(Option<ObjectRef>),
}

impl Slot {
	/// Default storage: declared field defaults applied, references null, containers empty.
	pub fn default_for(desc: &TypeDesc) -> Self {
		match desc {
			TypeDesc::Struct(item) => Self::Struct(item.default_data()),
			other => Self::zeroed_for(other),
		}
	}

	/// Zeroed storage: like [`Slot::default_for`] but ignoring declared defaults.
	pub fn zeroed_for(desc: &TypeDesc) -> Self {
		match desc {
			TypeDesc::Scalar(kind) => match kind {
				ScalarKind::Bool => Self::Bool(false),
				ScalarKind::Float => Self::Float(0.0),
				ScalarKind::Double => Self::Double(0.0),
				ScalarKind::Str | ScalarKind::Name => Self::Str(String::new()),
				ScalarKind::Enum(item) => Self::Enum(item.first_value()),
				kind if kind.is_unsigned_integer() => Self::UInt(0),
				_ => Self::Int(0),
			},
			TypeDesc::Array(_) => Self::Array(ScriptArray::default()),
			TypeDesc::Set(_) => Self::Set(ScriptSet::default()),
			TypeDesc::Map { .. } => Self::Map(ScriptMap::default()),
			TypeDesc::Struct(item) => Self::Struct(StructData::zeroed(item.fields())),
			TypeDesc::Object(_) => Self::Object(None),
		}
	}

	/// Whether this storage variant is the one `desc` describes.
	pub fn matches(&self, desc: &TypeDesc) -> bool {
		match desc {
			TypeDesc::Scalar(kind) => match kind {
				ScalarKind::Bool => matches!(self, Self::Bool(_)),
				ScalarKind::Float => matches!(self, Self::Float(_)),
				ScalarKind::Double => matches!(self, Self::Double(_)),
				ScalarKind::Str | ScalarKind::Name => matches!(self, Self::Str(_)),
				ScalarKind::Enum(_) => matches!(self, Self::Enum(_)),
				kind if kind.is_unsigned_integer() => matches!(self, Self::UInt(_)),
				_ => matches!(self, Self::Int(_)),
			},
			TypeDesc::Array(_) => matches!(self, Self::Array(_)),
			TypeDesc::Set(_) => matches!(self, Self::Set(_)),
			TypeDesc::Map { .. } => matches!(self, Self::Map(_)),
			TypeDesc::Struct(_) => matches!(self, Self::Struct(_)),
			TypeDesc::Object(_) => matches!(self, Self::Object(_)),
		}
	}

	/// Storage kind label.
	pub fn kind_label(&self) -> &'static str {
		match self {
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::UInt(_) => "uint",
			Self::Float(_) => "float",
			Self::Double(_) => "double",
			Self::Str(_) => "string",
			Self::Enum(_) => "enum",
			Self::Array(_) => "array",
			Self::Set(_) => "set",
			Self::Map(_) => "map",
			Self::Struct(_) => "struct",
			Self::Object(_) => "object",
		}
	}

	/// Borrow string storage.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(value) => Some(value),
			_ => None,
		}
	}

	/// Borrow struct storage.
	pub fn as_struct(&self) -> Option<&StructData> {
		match self {
			Self::Struct(value) => Some(value),
			_ => None,
		}
	}

	/// Borrow array storage.
	pub fn as_array(&self) -> Option<&ScriptArray> {
		match self {
			Self::Array(value) => Some(value),
			_ => None,
		}
	}

	/// Borrow object reference storage.
	pub fn as_object(&self) -> Option<&ObjectRef> {
		match self {
			Self::Object(value) => value.as_ref(),
			_ => None,
		}
	}

	fn content_hash(&self) -> u64 {
		let mut hasher = DefaultHasher::new();
		self.hash(&mut hasher);
		hasher.finish()
	}
}

impl Hash for Slot {
	fn hash<H: Hasher>(&self, state: &mut H) {
		std::mem::discriminant(self).hash(state);
		match self {
			Self::Bool(value) => value.hash(state),
			Self::Int(value) | Self::Enum(value) => value.hash(state),
			Self::UInt(value) => value.hash(state),
			// `0.0 == -0.0`, so both hash like positive zero.
			Self::Float(value) => (if *value == 0.0 { 0 } else { value.to_bits() }).hash(state),
			Self::Double(value) => (if *value == 0.0 { 0 } else { value.to_bits() }).hash(state),
			Self::Str(value) => value.hash(state),
			Self::Array(value) => value.elems.hash(state),
			Self::Set(value) => {
				let mut combined = 0_u64;
				for item in value.iter() {
					combined = combined.wrapping_add(item.content_hash());
				}
				combined.hash(state);
			}
			Self::Map(value) => {
				let mut combined = 0_u64;
				for (key, item) in value.iter() {
					combined = combined.wrapping_add(key.content_hash() ^ item.content_hash().rotate_left(17));
				}
				combined.hash(state);
			}
			Self::Struct(value) => value.slots.hash(state),
			Self::Object(value) => value.as_ref().map(ObjectRef::addr).hash(state),
		}
	}
}

/// Inline field storage of a struct or object, indexed by field offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructData {
	slots: Vec<Slot>,
}

impl StructData {
	/// Storage with declared field defaults applied.
	pub fn with_defaults<'a>(fields: impl IntoIterator<Item = &'a FieldDesc>) -> Self {
		Self::build(fields, true)
	}

	/// Storage with every field zeroed.
	pub fn zeroed<'a>(fields: impl IntoIterator<Item = &'a FieldDesc>) -> Self {
		Self::build(fields, false)
	}

	fn build<'a>(fields: impl IntoIterator<Item = &'a FieldDesc>, apply_defaults: bool) -> Self {
		let mut slots = Vec::new();
		for field in fields {
			if slots.len() <= field.offset {
				slots.resize_with(field.offset + 1, || Slot::Bool(false));
			}
			slots[field.offset] = match (&field.default, apply_defaults) {
				(Some(value), true) => value.clone(),
				(_, true) => Slot::default_for(&field.ty),
				(_, false) => Slot::zeroed_for(&field.ty),
			};
		}
		Self { slots }
	}

	/// Slot at a raw offset.
	pub fn get(&self, offset: usize) -> Option<&Slot> {
		self.slots.get(offset)
	}

	/// Mutable slot at a raw offset.
	pub fn get_mut(&mut self, offset: usize) -> Option<&mut Slot> {
		self.slots.get_mut(offset)
	}

	/// Slot holding `field`.
	pub fn field(&self, field: &FieldDesc) -> Option<&Slot> {
		self.slots.get(field.offset)
	}

	/// Mutable slot holding `field`.
	pub fn field_mut(&mut self, field: &FieldDesc) -> Option<&mut Slot> {
		self.slots.get_mut(field.offset)
	}

	/// Replace the slot holding `field`; returns `false` when the offset is out of range.
	pub fn set(&mut self, field: &FieldDesc, value: Slot) -> bool {
		match self.slots.get_mut(field.offset) {
			Some(slot) => {
				*slot = value;
				true
			}
			None => false,
		}
	}

	/// Number of slots.
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	/// Whether there are no slots.
	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}
}

/// Resizable array backing store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptArray {
	elems: Vec<Slot>,
}

impl ScriptArray {
	/// Array holding `elems`.
	pub fn from_vec(elems: Vec<Slot>) -> Self {
		Self { elems }
	}

	/// Number of elements.
	pub fn len(&self) -> usize {
		self.elems.len()
	}

	/// Whether the array is empty.
	pub fn is_empty(&self) -> bool {
		self.elems.is_empty()
	}

	/// Element at `index`.
	pub fn get(&self, index: usize) -> Option<&Slot> {
		self.elems.get(index)
	}

	/// Elements in index order.
	pub fn iter(&self) -> std::slice::Iter<'_, Slot> {
		self.elems.iter()
	}

	/// Mutable elements in index order.
	pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Slot> {
		self.elems.iter_mut()
	}

	/// Append an element.
	pub fn push(&mut self, value: Slot) {
		self.elems.push(value);
	}

	/// Resize to `len`, filling new elements with the default for `elem`.
	pub fn resize(&mut self, len: usize, elem: &TypeDesc) {
		self.elems.truncate(len);
		while self.elems.len() < len {
			self.elems.push(Slot::default_for(elem));
		}
	}
}

type HashIndex = HashMap<u64, Vec<usize>>;

/// Sparse hash-set backing store.
///
/// Elements appended with [`ScriptSet::add_default_needs_rehash`] are not
/// indexed until [`ScriptSet::rehash`] runs; rehash also frees duplicates,
/// which leaves unoccupied slots behind.
#[derive(Debug, Clone, Default)]
pub struct ScriptSet {
	slots: Vec<Option<Slot>>,
	index: HashIndex,
	needs_rehash: bool,
}

impl ScriptSet {
	/// Build a set from elements, dropping duplicates.
	pub fn from_elements(elems: impl IntoIterator<Item = Slot>) -> Self {
		let mut set = Self {
			slots: elems.into_iter().map(Some).collect(),
			..Self::default()
		};
		set.rehash();
		set
	}

	/// Number of occupied slots.
	pub fn len(&self) -> usize {
		self.slots.iter().filter(|slot| slot.is_some()).count()
	}

	/// Whether no slot is occupied.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Total slot capacity, occupied or not.
	pub fn slot_count(&self) -> usize {
		self.slots.len()
	}

	/// Whether elements were added since the last rehash.
	pub fn needs_rehash(&self) -> bool {
		self.needs_rehash
	}

	/// Occupied elements in slot order.
	pub fn iter(&self) -> impl Iterator<Item = &Slot> {
		self.slots.iter().flatten()
	}

	/// Drop every element.
	pub fn clear(&mut self) {
		self.slots.clear();
		self.index.clear();
		self.needs_rehash = false;
	}

	/// Append a default element without indexing it; returns its slot index.
	pub fn add_default_needs_rehash(&mut self, elem: &TypeDesc) -> usize {
		self.slots.push(Some(Slot::default_for(elem)));
		self.needs_rehash = true;
		self.slots.len() - 1
	}

	/// Mutable element at a slot index.
	pub fn element_mut(&mut self, index: usize) -> Option<&mut Slot> {
		self.slots.get_mut(index).and_then(Option::as_mut)
	}

	/// Insert an element, keeping the set indexed.
	pub fn insert(&mut self, value: Slot) -> bool {
		if self.contains(&value) {
			return false;
		}
		self.slots.push(Some(value));
		self.rehash();
		true
	}

	/// Whether an equal element is present.
	pub fn contains(&self, value: &Slot) -> bool {
		if self.needs_rehash {
			return self.iter().any(|item| item == value);
		}
		self.index
			.get(&value.content_hash())
			.is_some_and(|bucket| bucket.iter().any(|idx| self.slots[*idx].as_ref() == Some(value)))
	}

	/// Rebuild the hash index, freeing later duplicates.
	pub fn rehash(&mut self) {
		self.index.clear();
		for idx in 0..self.slots.len() {
			let Some(value) = &self.slots[idx] else {
				continue;
			};
			let bucket = self.index.entry(value.content_hash()).or_default();
			let duplicate = bucket.iter().any(|other| self.slots[*other].as_ref() == Some(value));
			if duplicate {
				self.slots[idx] = None;
			} else {
				bucket.push(idx);
			}
		}
		self.needs_rehash = false;
	}
}

impl PartialEq for ScriptSet {
	fn eq(&self, other: &Self) -> bool {
		self.len() == other.len() && self.iter().all(|item| other.contains(item))
	}
}

/// Sparse hash-map backing store of `(key, value)` pairs.
#[derive(Debug, Clone, Default)]
pub struct ScriptMap {
	pairs: Vec<Option<(Slot, Slot)>>,
	index: HashIndex,
	needs_rehash: bool,
}

impl ScriptMap {
	/// Build a map from pairs; later duplicate keys win.
	pub fn from_pairs(pairs: impl IntoIterator<Item = (Slot, Slot)>) -> Self {
		let mut map = Self {
			pairs: pairs.into_iter().map(Some).collect(),
			..Self::default()
		};
		map.rehash();
		map
	}

	/// Number of occupied pairs.
	pub fn len(&self) -> usize {
		self.pairs.iter().filter(|pair| pair.is_some()).count()
	}

	/// Whether no pair is occupied.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Whether pairs were added since the last rehash.
	pub fn needs_rehash(&self) -> bool {
		self.needs_rehash
	}

	/// Occupied pairs in slot order.
	pub fn iter(&self) -> impl Iterator<Item = (&Slot, &Slot)> {
		self.pairs.iter().flatten().map(|(key, value)| (key, value))
	}

	/// Drop every pair and reserve room for `capacity` new ones.
	pub fn empty_values(&mut self, capacity: usize) {
		self.pairs.clear();
		self.pairs.reserve(capacity);
		self.index.clear();
		self.needs_rehash = false;
	}

	/// Append a default pair without indexing it; returns its slot index.
	pub fn add_default_needs_rehash(&mut self, key: &TypeDesc, value: &TypeDesc) -> usize {
		self.pairs.push(Some((Slot::default_for(key), Slot::default_for(value))));
		self.needs_rehash = true;
		self.pairs.len() - 1
	}

	/// Mutable key and value at a slot index.
	pub fn pair_mut(&mut self, index: usize) -> Option<(&mut Slot, &mut Slot)> {
		self.pairs.get_mut(index).and_then(Option::as_mut).map(|(key, value)| (key, value))
	}

	/// Insert or replace a pair, keeping the map indexed.
	pub fn insert(&mut self, key: Slot, value: Slot) {
		self.pairs.push(Some((key, value)));
		self.rehash();
	}

	/// Value stored for `key`.
	pub fn find(&self, key: &Slot) -> Option<&Slot> {
		if self.needs_rehash {
			return self.iter().filter(|(item, _)| *item == key).map(|(_, value)| value).last();
		}
		let bucket = self.index.get(&key.content_hash())?;
		bucket.iter().find_map(|idx| match &self.pairs[*idx] {
			Some((item, value)) if item == key => Some(value),
			_ => None,
		})
	}

	/// Rebuild the hash index; a later pair replaces an earlier pair with an equal key.
	pub fn rehash(&mut self) {
		self.index.clear();
		for idx in 0..self.pairs.len() {
			let Some((key, _)) = &self.pairs[idx] else {
				continue;
			};
			let bucket = self.index.entry(key.content_hash()).or_default();
			let earlier = bucket
				.iter()
				.position(|other| matches!(&self.pairs[*other], Some((item, _)) if item == key));
			match earlier {
				Some(pos) => {
					let stale = std::mem::replace(&mut bucket[pos], idx);
					self.pairs[stale] = None;
				}
				None => bucket.push(idx),
			}
		}
		self.needs_rehash = false;
	}
}

impl PartialEq for ScriptMap {
	fn eq(&self, other: &Self) -> bool {
		self.len() == other.len() && self.iter().all(|(key, value)| other.find(key) == Some(value))
	}
}

/// One object instance.
#[derive(Debug)]
pub struct ObjectData {
	class: Arc<ClassDesc>,
	/// Instance name, used by native reference text.
	pub name: String,
	/// Field storage following the class field layout.
	pub fields: StructData,
}

impl ObjectData {
	/// Assemble an instance from parts.
	pub fn new(class: Arc<ClassDesc>, name: String, fields: StructData) -> Self {
		Self { class, name, fields }
	}

	/// Concrete class of this instance.
	pub fn class(&self) -> &Arc<ClassDesc> {
		&self.class
	}
}

/// Shared handle to an object instance; equality and hashing use identity.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<ObjectData>>);

impl ObjectRef {
	/// Wrap instance data.
	pub fn new(data: ObjectData) -> Self {
		Self(Rc::new(RefCell::new(data)))
	}

	/// Shared borrow of the instance.
	pub fn borrow(&self) -> Ref<'_, ObjectData> {
		self.0.borrow()
	}

	/// Exclusive borrow of the instance, failing when it is already borrowed.
	pub fn try_borrow_mut(&self) -> std::result::Result<RefMut<'_, ObjectData>, BorrowMutError> {
		self.0.try_borrow_mut()
	}

	/// Class of the instance.
	pub fn class(&self) -> Arc<ClassDesc> {
		self.0.borrow().class.clone()
	}

	/// Instance name.
	pub fn name(&self) -> String {
		self.0.borrow().name.clone()
	}

	/// Reference text `Class'name'`.
	pub fn path_name(&self) -> String {
		let data = self.0.borrow();
		format!("{}'{}'", data.class.name, data.name)
	}

	fn addr(&self) -> usize {
		Rc::as_ptr(&self.0) as usize
	}
}

impl PartialEq for ObjectRef {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0.try_borrow() {
			Ok(data) => write!(f, "ObjectRef({}'{}')", data.class.name, data.name),
			Err(_) => f.write_str("ObjectRef(<borrowed>)"),
		}
	}
}

#[cfg(test)]
mod tests;
