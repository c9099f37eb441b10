use std::collections::BTreeMap;
use std::sync::Arc;

use crate::codec::desc::{ClassDesc, EnumDesc, FieldDesc, ScalarKind, StructDesc, TypeDesc};
use crate::codec::{CodecError, Result};

/// Named descriptor held by a [`TypeRegistry`].
#[derive(Debug, Clone)]
pub enum TypeEntry {
	/// Struct layout.
	Struct(Arc<StructDesc>),
	/// Object class.
	Class(Arc<ClassDesc>),
	/// Enum.
	Enum(Arc<EnumDesc>),
}

impl TypeEntry {
	/// Descriptor of a value of this type; classes describe an object reference.
	pub fn type_desc(&self) -> TypeDesc {
		match self {
			Self::Struct(desc) => TypeDesc::Struct(desc.clone()),
			Self::Class(class) => TypeDesc::Object(class.clone()),
			Self::Enum(desc) => TypeDesc::Scalar(ScalarKind::Enum(desc.clone())),
		}
	}

	/// `struct`, `class` or `enum`.
	pub fn kind_label(&self) -> &'static str {
		match self {
			Self::Struct(_) => "struct",
			Self::Class(_) => "class",
			Self::Enum(_) => "enum",
		}
	}
}

/// Descriptors by type name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
	entries: BTreeMap<String, TypeEntry>,
}

impl TypeRegistry {
	/// Empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registry preloaded with the native vector-like structs.
	pub fn with_builtins() -> Self {
		let mut registry = Self::new();
		let float = || TypeDesc::scalar(ScalarKind::Float);
		let double = || TypeDesc::scalar(ScalarKind::Double);
		let builtins = [
			("Vector", vec!["X", "Y", "Z"], double()),
			("Vector2D", vec!["X", "Y"], double()),
			("Vector4", vec!["X", "Y", "Z", "W"], double()),
			("Rotator", vec!["Pitch", "Yaw", "Roll"], double()),
			("LinearColor", vec!["R", "G", "B", "A"], float()),
		];
		for (name, fields, ty) in builtins {
			let fields = fields.into_iter().map(|field| FieldDesc::new(field, ty.clone())).collect();
			registry
				.entries
				.insert(name.to_owned(), TypeEntry::Struct(Arc::new(StructDesc::native(name, fields))));
		}
		registry
	}

	/// Add an entry; names are unique across structs, classes and enums.
	pub fn insert(&mut self, name: impl Into<String>, entry: TypeEntry) -> Result<()> {
		let name = name.into();
		if self.entries.contains_key(&name) {
			return Err(CodecError::SchemaDuplicateType { name });
		}
		self.entries.insert(name, entry);
		Ok(())
	}

	/// Entry by name.
	pub fn get(&self, name: &str) -> Option<&TypeEntry> {
		self.entries.get(name)
	}

	/// Whether `name` is registered.
	pub fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	/// Descriptor for a registered type or a scalar label such as `int32`.
	pub fn get_type(&self, name: &str) -> Result<TypeDesc> {
		if let Some(entry) = self.entries.get(name) {
			return Ok(entry.type_desc());
		}
		ScalarKind::from_label(name)
			.map(TypeDesc::Scalar)
			.ok_or_else(|| CodecError::UnknownType { name: name.to_owned() })
	}

	/// Struct descriptor by name.
	pub fn get_struct(&self, name: &str) -> Result<Arc<StructDesc>> {
		match self.entries.get(name) {
			Some(TypeEntry::Struct(desc)) => Ok(desc.clone()),
			_ => Err(CodecError::UnknownType { name: name.to_owned() }),
		}
	}

	/// Entries sorted by name.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeEntry)> {
		self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the registry is empty.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
