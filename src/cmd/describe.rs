use std::path::PathBuf;

use propdoc::codec::text::export_text;
use propdoc::codec::{CodecError, FieldDesc, Result, TypeEntry, TypeRegistry};

use crate::cmd::util::{emit_json, load_registry};

#[derive(clap::Args)]
pub struct Args {
	/// Schema file to inspect.
	pub schema: PathBuf,
	/// Describe one type instead of listing all of them.
	#[arg(long = "type")]
	pub type_name: Option<String>,
	#[arg(long)]
	pub json: bool,
}

#[derive(serde::Serialize)]
struct RegistryJson {
	types: Vec<TypeSummaryJson>,
}

#[derive(serde::Serialize)]
struct TypeSummaryJson {
	name: String,
	kind: &'static str,
	native: bool,
	fields: usize,
}

#[derive(serde::Serialize)]
struct TypeJson {
	name: String,
	kind: &'static str,
	native: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	super_class: Option<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	fields: Vec<FieldJson>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	variants: Vec<VariantJson>,
}

#[derive(serde::Serialize)]
struct FieldJson {
	name: String,
	authored: String,
	offset: usize,
	#[serde(rename = "type")]
	ty: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	default: Option<String>,
}

#[derive(serde::Serialize)]
struct VariantJson {
	name: String,
	value: i64,
}

/// Print every registered type, or the layout of one type.
pub fn run(args: Args) -> Result<()> {
	let Args { schema, type_name, json } = args;
	let registry = load_registry(&schema)?;

	let Some(type_name) = type_name else {
		return list(&registry, json);
	};
	let entry = registry.get(&type_name).ok_or(CodecError::UnknownType { name: type_name.clone() })?;
	let payload = describe(&type_name, entry);
	if json {
		return emit_json(&payload);
	}

	let mut header = format!("{} {}", payload.kind, payload.name);
	if payload.native {
		header.push_str(" (native)");
	}
	if let Some(super_class) = &payload.super_class {
		header.push_str(&format!(" : {super_class}"));
	}
	println!("{header}");
	for field in &payload.fields {
		let mut line = format!("  [{}] {}", field.offset, field.authored);
		if field.authored != field.name {
			line.push_str(&format!(" ({})", field.name));
		}
		line.push_str(&format!(": {}", field.ty));
		if let Some(default) = &field.default {
			line.push_str(&format!(" = {default}"));
		}
		println!("{line}");
	}
	for variant in &payload.variants {
		println!("  {} = {}", variant.name, variant.value);
	}
	Ok(())
}

fn list(registry: &TypeRegistry, json: bool) -> Result<()> {
	let types: Vec<_> = registry
		.iter()
		.map(|(name, entry)| TypeSummaryJson {
			name: name.to_owned(),
			kind: entry.kind_label(),
			native: is_native(entry),
			fields: match entry {
				TypeEntry::Struct(desc) => desc.fields().len(),
				TypeEntry::Class(class) => class.field_count(),
				TypeEntry::Enum(desc) => desc.variants.len(),
			},
		})
		.collect();

	if json {
		return emit_json(&RegistryJson { types });
	}
	for item in &types {
		let native = if item.native { " native" } else { "" };
		println!("{:<24} {}{native} ({})", item.name, item.kind, item.fields);
	}
	Ok(())
}

fn is_native(entry: &TypeEntry) -> bool {
	match entry {
		TypeEntry::Struct(desc) => desc.native,
		TypeEntry::Class(class) => class.native,
		TypeEntry::Enum(_) => false,
	}
}

fn describe(name: &str, entry: &TypeEntry) -> TypeJson {
	let (fields, super_class, variants) = match entry {
		TypeEntry::Struct(desc) => (desc.fields().iter().map(field_json).collect(), None, Vec::new()),
		TypeEntry::Class(class) => (
			class.fields().into_iter().map(field_json).collect(),
			class.super_class().map(|parent| parent.name.clone()),
			Vec::new(),
		),
		TypeEntry::Enum(desc) => (
			Vec::new(),
			None,
			desc.variants
				.iter()
				.map(|(name, value)| VariantJson {
					name: name.clone(),
					value: *value,
				})
				.collect(),
		),
	};
	TypeJson {
		name: name.to_owned(),
		kind: entry.kind_label(),
		native: is_native(entry),
		super_class,
		fields,
		variants,
	}
}

fn field_json(field: &FieldDesc) -> FieldJson {
	FieldJson {
		name: field.name.clone(),
		authored: field.authored_name().to_owned(),
		offset: field.offset,
		ty: field.ty.type_name(),
		default: field.default.as_ref().map(|value| export_text(&field.ty, value)),
	}
}
