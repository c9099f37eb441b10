use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::codec::slot::{ObjectData, ObjectRef, Slot, StructData};
use crate::codec::{CodecError, Result};

/// Scalar leaf kinds.
#[derive(Debug, Clone)]
pub enum ScalarKind {
	/// `bool`.
	Bool,
	/// Signed 8-bit integer.
	Int8,
	/// Signed 16-bit integer.
	Int16,
	/// Signed 32-bit integer.
	Int32,
	/// Signed 64-bit integer.
	Int64,
	/// Unsigned 8-bit integer.
	UInt8,
	/// Unsigned 16-bit integer.
	UInt16,
	/// Unsigned 32-bit integer.
	UInt32,
	/// Unsigned 64-bit integer.
	UInt64,
	/// 32-bit float.
	Float,
	/// 64-bit float.
	Double,
	/// Owned string.
	Str,
	/// Interned-style name, stored as a string.
	Name,
	/// Enumeration stored as its numeric value.
	Enum(Arc<EnumDesc>),
}

impl ScalarKind {
	/// Stable lower-case label used in schemas and diagnostics.
	pub fn label(&self) -> &'static str {
		match self {
			Self::Bool => "bool",
			Self::Int8 => "int8",
			Self::Int16 => "int16",
			Self::Int32 => "int32",
			Self::Int64 => "int64",
			Self::UInt8 => "uint8",
			Self::UInt16 => "uint16",
			Self::UInt32 => "uint32",
			Self::UInt64 => "uint64",
			Self::Float => "float",
			Self::Double => "double",
			Self::Str => "string",
			Self::Name => "name",
			Self::Enum(_) => "enum",
		}
	}

	/// Parse a primitive label (enums are not primitives).
	pub fn from_label(label: &str) -> Option<Self> {
		Some(match label {
			"bool" => Self::Bool,
			"int8" => Self::Int8,
			"int16" => Self::Int16,
			"int32" | "int" => Self::Int32,
			"int64" => Self::Int64,
			"uint8" | "byte" => Self::UInt8,
			"uint16" => Self::UInt16,
			"uint32" => Self::UInt32,
			"uint64" => Self::UInt64,
			"float" => Self::Float,
			"double" => Self::Double,
			"string" | "str" => Self::Str,
			"name" => Self::Name,
			_ => return None,
		})
	}

	/// Whether this kind is stored as a signed integer.
	pub fn is_signed_integer(&self) -> bool {
		matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
	}

	/// Whether this kind is stored as an unsigned integer.
	pub fn is_unsigned_integer(&self) -> bool {
		matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
	}

	/// Whether this kind is numeric (integer or floating point, not enum).
	pub fn is_numeric(&self) -> bool {
		self.is_signed_integer() || self.is_unsigned_integer() || matches!(self, Self::Float | Self::Double)
	}

	/// Inclusive range for signed kinds.
	pub(crate) fn signed_range(&self) -> (i64, i64) {
		match self {
			Self::Int8 => (i64::from(i8::MIN), i64::from(i8::MAX)),
			Self::Int16 => (i64::from(i16::MIN), i64::from(i16::MAX)),
			Self::Int32 => (i64::from(i32::MIN), i64::from(i32::MAX)),
			_ => (i64::MIN, i64::MAX),
		}
	}

	/// Inclusive upper bound for unsigned kinds.
	pub(crate) fn unsigned_max(&self) -> u64 {
		match self {
			Self::UInt8 => u64::from(u8::MAX),
			Self::UInt16 => u64::from(u16::MAX),
			Self::UInt32 => u64::from(u32::MAX),
			_ => u64::MAX,
		}
	}
}

/// Named enumeration with explicit variant values.
#[derive(Debug, Clone)]
pub struct EnumDesc {
	/// Enum type name.
	pub name: String,
	/// Variants in declaration order.
	pub variants: Vec<(String, i64)>,
}

impl EnumDesc {
	/// Create an enum descriptor from `(name, value)` pairs.
	pub fn new(name: impl Into<String>, variants: impl IntoIterator<Item = (impl Into<String>, i64)>) -> Self {
		Self {
			name: name.into(),
			variants: variants.into_iter().map(|(name, value)| (name.into(), value)).collect(),
		}
	}

	/// Variant name for a stored value.
	pub fn name_of(&self, value: i64) -> Option<&str> {
		self.variants.iter().find(|(_, item)| *item == value).map(|(name, _)| name.as_str())
	}

	/// Value for a variant name, accepting `Enum::Variant` qualified names.
	pub fn value_of(&self, name: &str) -> Option<i64> {
		let short = name.rsplit("::").next().unwrap_or(name);
		self.variants.iter().find(|(item, _)| item == short).map(|(_, value)| *value)
	}

	/// Value of the first declared variant, or zero.
	pub fn first_value(&self) -> i64 {
		self.variants.first().map(|(_, value)| *value).unwrap_or(0)
	}
}

/// Runtime type descriptor.
#[derive(Debug, Clone)]
pub enum TypeDesc {
	/// Scalar leaf.
	Scalar(ScalarKind),
	/// Indexable, resizable sequence.
	Array(Arc<TypeDesc>),
	/// Hash set with sparse storage.
	Set(Arc<TypeDesc>),
	/// Hash map with sparse pair storage.
	Map {
		/// Key descriptor.
		key: Arc<TypeDesc>,
		/// Value descriptor.
		value: Arc<TypeDesc>,
	},
	/// Inline struct value.
	Struct(Arc<StructDesc>),
	/// Reference to an object instance.
	Object(Arc<ClassDesc>),
}

impl TypeDesc {
	/// Scalar descriptor shorthand.
	pub fn scalar(kind: ScalarKind) -> Self {
		Self::Scalar(kind)
	}

	/// Array descriptor shorthand.
	pub fn array(inner: TypeDesc) -> Self {
		Self::Array(Arc::new(inner))
	}

	/// Set descriptor shorthand.
	pub fn set(inner: TypeDesc) -> Self {
		Self::Set(Arc::new(inner))
	}

	/// Map descriptor shorthand.
	pub fn map(key: TypeDesc, value: TypeDesc) -> Self {
		Self::Map {
			key: Arc::new(key),
			value: Arc::new(value),
		}
	}

	/// Struct descriptor shorthand.
	pub fn structure(desc: Arc<StructDesc>) -> Self {
		Self::Struct(desc)
	}

	/// Object reference descriptor shorthand.
	pub fn object(class: Arc<ClassDesc>) -> Self {
		Self::Object(class)
	}

	/// Coarse descriptor kind label.
	pub fn kind_label(&self) -> &'static str {
		match self {
			Self::Scalar(kind) => kind.label(),
			Self::Array(_) => "array",
			Self::Set(_) => "set",
			Self::Map { .. } => "map",
			Self::Struct(_) => "struct",
			Self::Object(_) => "object",
		}
	}

	/// Human readable type name, e.g. `map<name, array<int32>>`.
	pub fn type_name(&self) -> String {
		match self {
			Self::Scalar(ScalarKind::Enum(desc)) => desc.name.clone(),
			Self::Scalar(kind) => kind.label().to_owned(),
			Self::Array(inner) => format!("array<{}>", inner.type_name()),
			Self::Set(inner) => format!("set<{}>", inner.type_name()),
			Self::Map { key, value } => format!("map<{}, {}>", key.type_name(), value.type_name()),
			Self::Struct(desc) => desc.name.clone(),
			Self::Object(class) => format!("{}*", class.name),
		}
	}
}

/// One named field of a struct or class.
#[derive(Debug, Clone)]
pub struct FieldDesc {
	/// Internal field name.
	pub name: String,
	/// Authored (display) name, when it differs from the internal name.
	pub authored_name: Option<String>,
	/// Field type.
	pub ty: TypeDesc,
	/// Slot index inside the owning struct or object storage.
	pub offset: usize,
	/// Declared default applied by normal construction.
	pub default: Option<Slot>,
}

impl FieldDesc {
	/// Create a field; the offset is assigned by the owning struct or class.
	pub fn new(name: impl Into<String>, ty: TypeDesc) -> Self {
		Self {
			name: name.into(),
			authored_name: None,
			ty,
			offset: 0,
			default: None,
		}
	}

	/// Set the authored name.
	pub fn authored(mut self, name: impl Into<String>) -> Self {
		self.authored_name = Some(name.into());
		self
	}

	/// Set the declared default.
	pub fn with_default(mut self, value: Slot) -> Self {
		self.default = Some(value);
		self
	}

	/// Authored name, falling back to the internal name.
	pub fn authored_name(&self) -> &str {
		self.authored_name.as_deref().unwrap_or(&self.name)
	}

	/// Whether `name` matches the authored or internal name.
	pub fn answers_to(&self, name: &str) -> bool {
		self.authored_name() == name || self.name == name
	}
}

fn assign_offsets(fields: &mut [FieldDesc], base: usize) {
	for (index, field) in fields.iter_mut().enumerate() {
		field.offset = base + index;
	}
}

fn find_field<'a>(fields: impl IntoIterator<Item = &'a FieldDesc> + Clone, name: &str) -> Option<&'a FieldDesc> {
	fields
		.clone()
		.into_iter()
		.find(|field| field.authored_name() == name)
		.or_else(|| fields.into_iter().find(|field| field.name == name))
}

/// Struct layout: ordered fields stored inline.
#[derive(Debug, Clone)]
pub struct StructDesc {
	/// Struct type name.
	pub name: String,
	/// Engine-native struct (vector-like types the config codec understands).
	pub native: bool,
	fields: Vec<FieldDesc>,
}

impl StructDesc {
	/// Create a struct descriptor; field offsets follow declaration order.
	pub fn new(name: impl Into<String>, mut fields: Vec<FieldDesc>) -> Self {
		assign_offsets(&mut fields, 0);
		Self {
			name: name.into(),
			native: false,
			fields,
		}
	}

	/// Create a native struct descriptor.
	pub fn native(name: impl Into<String>, fields: Vec<FieldDesc>) -> Self {
		Self {
			native: true,
			..Self::new(name, fields)
		}
	}

	/// Fields in declaration order.
	pub fn fields(&self) -> &[FieldDesc] {
		&self.fields
	}

	/// Look up a field by authored name, then by internal name.
	pub fn field(&self, name: &str) -> Option<&FieldDesc> {
		find_field(&self.fields, name)
	}

	/// Default storage for one instance.
	pub fn default_data(&self) -> StructData {
		StructData::with_defaults(&self.fields)
	}
}

/// Class layout: optional super class plus own fields, referenced through objects.
pub struct ClassDesc {
	/// Class name.
	pub name: String,
	/// Native classes are opaque and serialized as a reference string.
	pub native: bool,
	super_class: Option<Arc<ClassDesc>>,
	own_fields: OnceLock<Vec<FieldDesc>>,
	instances: AtomicU64,
}

impl fmt::Debug for ClassDesc {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClassDesc")
			.field("name", &self.name)
			.field("native", &self.native)
			.field("super_class", &self.super_class.as_ref().map(|item| item.name.as_str()))
			.field("fields", &self.fields().iter().map(|field| field.name.as_str()).collect::<Vec<_>>())
			.finish()
	}
}

impl ClassDesc {
	/// Declare a non-native class whose fields are defined later.
	pub fn declare(name: impl Into<String>, super_class: Option<Arc<ClassDesc>>) -> Arc<Self> {
		Arc::new(Self {
			name: name.into(),
			native: false,
			super_class,
			own_fields: OnceLock::new(),
			instances: AtomicU64::new(0),
		})
	}

	/// Declare a native class; native classes carry no walked fields.
	pub fn declare_native(name: impl Into<String>) -> Arc<Self> {
		let class = Self {
			name: name.into(),
			native: true,
			super_class: None,
			own_fields: OnceLock::new(),
			instances: AtomicU64::new(0),
		};
		let _ = class.own_fields.set(Vec::new());
		Arc::new(class)
	}

	/// Declare and define a non-native class in one step.
	pub fn new(name: impl Into<String>, super_class: Option<Arc<ClassDesc>>, fields: Vec<FieldDesc>) -> Result<Arc<Self>> {
		let class = Self::declare(name, super_class);
		class.define(fields)?;
		Ok(class)
	}

	/// Define own fields; offsets continue after the super class fields.
	pub fn define(&self, mut fields: Vec<FieldDesc>) -> Result<()> {
		let base = match &self.super_class {
			Some(parent) if !parent.is_defined() => {
				return Err(CodecError::SuperClassUndefined {
					name: self.name.clone(),
					super_name: parent.name.clone(),
				});
			}
			Some(parent) => parent.field_count(),
			None => 0,
		};
		assign_offsets(&mut fields, base);
		self.own_fields.set(fields).map_err(|_| CodecError::ClassRedefined { name: self.name.clone() })
	}

	/// Whether fields have been defined.
	pub fn is_defined(&self) -> bool {
		self.own_fields.get().is_some()
	}

	/// Super class, if any.
	pub fn super_class(&self) -> Option<&Arc<ClassDesc>> {
		self.super_class.as_ref()
	}

	/// All fields, inherited fields first.
	pub fn fields(&self) -> Vec<&FieldDesc> {
		let mut out = match &self.super_class {
			Some(parent) => parent.fields(),
			None => Vec::new(),
		};
		out.extend(self.own_fields.get().into_iter().flatten());
		out
	}

	/// Number of storage slots of one instance.
	pub fn field_count(&self) -> usize {
		let own = self.own_fields.get().map_or(0, Vec::len);
		own + self.super_class.as_ref().map_or(0, |parent| parent.field_count())
	}

	/// Look up a field by authored name, then by internal name.
	pub fn field(&self, name: &str) -> Option<&FieldDesc> {
		find_field(self.fields(), name)
	}

	/// Whether this class is `other` or derives from it.
	pub fn is_child_of(&self, other: &ClassDesc) -> bool {
		if self.name == other.name {
			return true;
		}
		self.super_class.as_ref().is_some_and(|parent| parent.is_child_of(other))
	}

	/// Allocate an instance with every field zeroed.
	///
	/// Declared field defaults and any construction logic are bypassed; callers
	/// that decode into the instance are expected to overwrite what they need.
	pub fn allocate_zeroed(self: &Arc<Self>) -> ObjectRef {
		let fields = self.fields();
		let data = StructData::zeroed(fields.iter().copied());
		ObjectRef::new(ObjectData::new(self.clone(), self.next_instance_name(), data))
	}

	/// Construct an instance with declared field defaults applied.
	pub fn construct(self: &Arc<Self>, name: impl Into<String>) -> ObjectRef {
		let fields = self.fields();
		let data = StructData::with_defaults(fields.iter().copied());
		ObjectRef::new(ObjectData::new(self.clone(), name.into(), data))
	}

	fn next_instance_name(&self) -> String {
		let index = self.instances.fetch_add(1, Ordering::Relaxed);
		format!("{}_{index}", self.name)
	}
}
