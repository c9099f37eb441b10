//! JSON schema documents describing structs, classes and enums.
//!
//! ```json
//! {
//!   "enums": [{"name": "Quality", "variants": ["Common", {"name": "Epic", "value": 5}]}],
//!   "structs": [{"name": "Slot", "fields": [{"name": "count", "authored": "Count", "type": "int32", "default": 1}]}],
//!   "classes": [{"name": "Node", "fields": [{"name": "Next", "type": {"object": "Node"}}]}]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::desc::{ClassDesc, EnumDesc, FieldDesc, ScalarKind, StructDesc, TypeDesc};
use crate::codec::registry::{TypeEntry, TypeRegistry};
use crate::codec::slot::Slot;
use crate::codec::{Codec, CodecError, Result};

/// Parsed schema document.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaDoc {
	/// Enum declarations.
	pub enums: Vec<EnumDecl>,
	/// Struct declarations.
	pub structs: Vec<StructDecl>,
	/// Class declarations.
	pub classes: Vec<ClassDecl>,
}

/// Enum declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnumDecl {
	/// Enum name.
	pub name: String,
	/// Variants in declaration order.
	pub variants: Vec<VariantDecl>,
}

/// Enum variant: a bare name numbered after the previous variant, or an explicit value.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum VariantDecl {
	/// Implicitly numbered variant.
	Name(String),
	/// Variant with an explicit value.
	Valued {
		/// Variant name.
		name: String,
		/// Variant value.
		value: i64,
	},
}

/// Struct declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StructDecl {
	/// Struct name.
	pub name: String,
	/// Native struct flag.
	#[serde(default)]
	pub native: bool,
	/// Fields in declaration order.
	#[serde(default)]
	pub fields: Vec<FieldDecl>,
}

/// Class declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDecl {
	/// Class name.
	pub name: String,
	/// Super class name.
	#[serde(default, rename = "super", skip_serializing_if = "Option::is_none")]
	pub super_class: Option<String>,
	/// Native classes are opaque and carry no fields.
	#[serde(default)]
	pub native: bool,
	/// Own fields in declaration order.
	#[serde(default)]
	pub fields: Vec<FieldDecl>,
}

/// Field declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
	/// Internal field name.
	pub name: String,
	/// Authored name, when it differs.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authored: Option<String>,
	/// Field type.
	#[serde(rename = "type")]
	pub ty: TypeExpr,
	/// Default value as a tree, keyed by authored names.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default: Option<Value>,
}

/// Type expression inside a schema document.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TypeExpr {
	/// Scalar label or any declared type name.
	Named(String),
	/// `{"array": T}`
	Array {
		/// Element type.
		array: Box<TypeExpr>,
	},
	/// `{"set": T}`
	Set {
		/// Element type.
		set: Box<TypeExpr>,
	},
	/// `{"map": [K, V]}`
	Map {
		/// Key and value types.
		map: Box<(TypeExpr, TypeExpr)>,
	},
	/// `{"struct": "Name"}`
	Struct {
		/// Struct name.
		#[serde(rename = "struct")]
		name: String,
	},
	/// `{"object": "Name"}`
	Object {
		/// Class name.
		#[serde(rename = "object")]
		name: String,
	},
	/// `{"enum": "Name"}`
	Enum {
		/// Enum name.
		#[serde(rename = "enum")]
		name: String,
	},
}

impl SchemaDoc {
	/// Parse schema text.
	pub fn parse(text: &str) -> Result<Self> {
		Ok(serde_json::from_str(text)?)
	}

	/// Read and parse a schema file.
	pub fn load(path: &Path) -> Result<Self> {
		Self::parse(&fs::read_to_string(path)?)
	}

	/// Resolve every declaration into a registry that also holds the native builtins.
	///
	/// Classes may reference themselves and classes declared later. Structs
	/// are embedded by value and must not contain themselves.
	pub fn build(&self) -> Result<TypeRegistry> {
		let mut builder = Builder {
			doc: self,
			registry: TypeRegistry::with_builtins(),
			structs: self.structs.iter().map(|decl| (decl.name.as_str(), decl)).collect(),
			building: Vec::new(),
		};
		builder.check_names()?;
		builder.enums()?;
		let classes = builder.declare_classes()?;
		for decl in &self.structs {
			builder.build_struct(&decl.name)?;
		}
		builder.define_classes(&classes)?;
		debug!(types = builder.registry.len(), "schema built");
		Ok(builder.registry)
	}
}

struct Builder<'a> {
	doc: &'a SchemaDoc,
	registry: TypeRegistry,
	structs: HashMap<&'a str, &'a StructDecl>,
	building: Vec<String>,
}

impl<'a> Builder<'a> {
	fn check_names(&self) -> Result<()> {
		let doc = self.doc;
		let mut seen = HashSet::new();
		let names = doc
			.enums
			.iter()
			.map(|decl| &decl.name)
			.chain(doc.structs.iter().map(|decl| &decl.name))
			.chain(doc.classes.iter().map(|decl| &decl.name));
		for name in names {
			if !seen.insert(name.as_str()) || self.registry.contains(name) {
				return Err(CodecError::SchemaDuplicateType { name: name.clone() });
			}
		}
		Ok(())
	}

	fn enums(&mut self) -> Result<()> {
		let doc = self.doc;
		for decl in &doc.enums {
			let mut next = 0;
			let variants: Vec<(String, i64)> = decl
				.variants
				.iter()
				.map(|variant| {
					let (name, value) = match variant {
						VariantDecl::Name(name) => (name.clone(), next),
						VariantDecl::Valued { name, value } => (name.clone(), *value),
					};
					next = value + 1;
					(name, value)
				})
				.collect();
			self.registry.insert(&decl.name, TypeEntry::Enum(Arc::new(EnumDesc::new(&decl.name, variants))))?;
		}
		Ok(())
	}

	/// Declare every class, super classes first; returns classes in that order.
	fn declare_classes(&mut self) -> Result<Vec<(&'a ClassDecl, Arc<ClassDesc>)>> {
		let doc: &'a SchemaDoc = self.doc;
		let decls: HashMap<&str, &ClassDecl> = doc.classes.iter().map(|decl| (decl.name.as_str(), decl)).collect();
		let mut ordered = Vec::new();
		let mut declared: HashMap<&str, Arc<ClassDesc>> = HashMap::new();

		for decl in &doc.classes {
			let mut chain = vec![decl];
			let mut current = decl;
			while let Some(parent) = current.super_class.as_deref() {
				if declared.contains_key(parent) {
					break;
				}
				let Some(next) = decls.get(parent).copied() else {
					return Err(CodecError::SchemaUnknownType {
						name: parent.to_owned(),
						owner: current.name.clone(),
					});
				};
				if chain.iter().any(|item| item.name == next.name) {
					return Err(CodecError::SchemaCyclicClass { name: next.name.clone() });
				}
				chain.push(next);
				current = next;
			}

			for item in chain.into_iter().rev() {
				if declared.contains_key(item.name.as_str()) {
					continue;
				}
				let class = if item.native {
					if item.super_class.is_some() || !item.fields.is_empty() {
						warn!(class = %item.name, "native class super class and fields ignored");
					}
					ClassDesc::declare_native(&item.name)
				} else {
					let parent = item.super_class.as_deref().and_then(|name| declared.get(name)).cloned();
					ClassDesc::declare(&item.name, parent)
				};
				self.registry.insert(&item.name, TypeEntry::Class(class.clone()))?;
				declared.insert(item.name.as_str(), class.clone());
				ordered.push((item, class));
			}
		}
		Ok(ordered)
	}

	fn define_classes(&mut self, classes: &[(&'a ClassDecl, Arc<ClassDesc>)]) -> Result<()> {
		for (decl, class) in classes {
			if class.native {
				continue;
			}
			let fields = self.fields(&decl.name, &decl.fields)?;
			class.define(fields)?;
		}
		Ok(())
	}

	fn build_struct(&mut self, name: &str) -> Result<Arc<StructDesc>> {
		if let Some(TypeEntry::Struct(desc)) = self.registry.get(name) {
			return Ok(desc.clone());
		}
		if self.building.iter().any(|item| item == name) {
			return Err(CodecError::SchemaRecursiveStruct { name: name.to_owned() });
		}
		let Some(decl) = self.structs.get(name).copied() else {
			return Err(CodecError::UnknownType { name: name.to_owned() });
		};

		self.building.push(name.to_owned());
		let fields = self.fields(&decl.name, &decl.fields);
		self.building.pop();
		let fields = fields?;

		let desc = Arc::new(if decl.native {
			StructDesc::native(&decl.name, fields)
		} else {
			StructDesc::new(&decl.name, fields)
		});
		self.registry.insert(&decl.name, TypeEntry::Struct(desc.clone()))?;
		Ok(desc)
	}

	fn fields(&mut self, owner: &str, decls: &[FieldDecl]) -> Result<Vec<FieldDesc>> {
		let mut out = Vec::with_capacity(decls.len());
		for decl in decls {
			let owner_field = format!("{owner}.{}", decl.name);
			let ty = self.resolve(&decl.ty, &owner_field)?;
			let mut field = FieldDesc::new(&decl.name, ty);
			if let Some(authored) = &decl.authored {
				field = field.authored(authored);
			}
			if let Some(value) = &decl.default {
				let slot = default_slot(&field.ty, value).map_err(|source| CodecError::SchemaBadDefault {
					owner: owner.to_owned(),
					field: decl.name.clone(),
					source: Box::new(source),
				})?;
				field = field.with_default(slot);
			}
			out.push(field);
		}
		Ok(out)
	}

	fn resolve(&mut self, expr: &TypeExpr, owner: &str) -> Result<TypeDesc> {
		let unknown = |name: &str| CodecError::SchemaUnknownType {
			name: name.to_owned(),
			owner: owner.to_owned(),
		};
		Ok(match expr {
			TypeExpr::Named(name) => {
				if let Some(kind) = ScalarKind::from_label(name) {
					return Ok(TypeDesc::Scalar(kind));
				}
				if self.structs.contains_key(name.as_str()) {
					return Ok(TypeDesc::Struct(self.build_struct(name)?));
				}
				self.registry.get(name).map(TypeEntry::type_desc).ok_or_else(|| unknown(name))?
			}
			TypeExpr::Array { array } => TypeDesc::array(self.resolve(array, owner)?),
			TypeExpr::Set { set } => TypeDesc::set(self.resolve(set, owner)?),
			TypeExpr::Map { map } => {
				let (key, value) = map.as_ref();
				TypeDesc::map(self.resolve(key, owner)?, self.resolve(value, owner)?)
			}
			TypeExpr::Struct { name } => {
				if self.structs.contains_key(name.as_str()) {
					TypeDesc::Struct(self.build_struct(name)?)
				} else {
					match self.registry.get(name) {
						Some(TypeEntry::Struct(desc)) => TypeDesc::Struct(desc.clone()),
						_ => return Err(unknown(name)),
					}
				}
			}
			TypeExpr::Object { name } => match self.registry.get(name) {
				Some(TypeEntry::Class(class)) => TypeDesc::Object(class.clone()),
				_ => return Err(unknown(name)),
			},
			TypeExpr::Enum { name } => match self.registry.get(name) {
				Some(TypeEntry::Enum(desc)) => TypeDesc::Scalar(ScalarKind::Enum(desc.clone())),
				_ => return Err(unknown(name)),
			},
		})
	}
}

fn default_slot(desc: &TypeDesc, value: &Value) -> Result<Slot> {
	let codec = Codec::new();
	let mut slot = Slot::default_for(desc);
	codec.decode(&codec.resolve_names(desc, value), desc, &mut slot)?;
	Ok(slot)
}
