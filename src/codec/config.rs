use std::fmt;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::codec::desc::{ScalarKind, TypeDesc};
use crate::codec::slot::{ScriptArray, Slot};
use crate::codec::text::{export_text, float_to_f64, import_text, sanitize_float};
use crate::codec::{CodecError, Result};

/// Native struct names storable in a config file.
const CONFIG_NATIVE_STRUCTS: [&str; 5] = ["Rotator", "Vector", "LinearColor", "Vector4", "Vector2D"];

#[derive(Debug, Clone, Default, PartialEq)]
struct Section {
	name: String,
	entries: Vec<(String, String)>,
}

/// INI-style document: ordered sections of ordered `Key=Value` lines.
///
/// A key may repeat inside a section; repeated keys hold multi-line arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
	sections: Vec<Section>,
}

enum ConfigKind {
	Bool,
	Int,
	Str,
	Float,
	Double,
	StrArray,
	NativeStruct,
}

fn config_kind(desc: &TypeDesc) -> Option<ConfigKind> {
	match desc {
		TypeDesc::Scalar(ScalarKind::Bool) => Some(ConfigKind::Bool),
		TypeDesc::Scalar(ScalarKind::Int32) => Some(ConfigKind::Int),
		TypeDesc::Scalar(ScalarKind::Str) => Some(ConfigKind::Str),
		TypeDesc::Scalar(ScalarKind::Float) => Some(ConfigKind::Float),
		TypeDesc::Scalar(ScalarKind::Double) => Some(ConfigKind::Double),
		TypeDesc::Array(inner) if matches!(**inner, TypeDesc::Scalar(ScalarKind::Str)) => Some(ConfigKind::StrArray),
		TypeDesc::Struct(item) if item.native && CONFIG_NATIVE_STRUCTS.contains(&item.name.as_str()) => Some(ConfigKind::NativeStruct),
		_ => None,
	}
}

fn supported(section: &str, key: &str, desc: &TypeDesc) -> Result<ConfigKind> {
	config_kind(desc).ok_or_else(|| CodecError::UnsupportedConfigType {
		section: section.to_owned(),
		key: key.to_owned(),
		type_name: desc.type_name(),
	})
}

fn parse_bool(text: &str) -> bool {
	let text = text.trim();
	["true", "yes", "on"].iter().any(|item| text.eq_ignore_ascii_case(item)) || text.parse::<i64>().is_ok_and(|value| value != 0)
}

impl ConfigFile {
	/// Parse config text; comment lines start with `;` or `#`.
	pub fn parse(text: &str) -> Self {
		let mut file = Self::default();
		for (number, raw) in text.lines().enumerate() {
			let line = raw.trim();
			if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
				continue;
			}
			if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
				file.section_mut(name.trim());
				continue;
			}
			let Some((key, value)) = line.split_once('=') else {
				warn!(line = number + 1, text = raw, "config line without '=' ignored");
				continue;
			};
			let Some(section) = file.sections.last_mut() else {
				warn!(line = number + 1, text = raw, "config key outside a section ignored");
				continue;
			};
			let key = key.trim();
			section.entries.push((key.strip_prefix('+').unwrap_or(key).to_owned(), value.trim().to_owned()));
		}
		file
	}

	/// Read and parse a config file.
	pub fn load(path: &Path) -> Result<Self> {
		Ok(Self::parse(&fs::read_to_string(path)?))
	}

	/// Write the config file.
	pub fn save(&self, path: &Path) -> Result<()> {
		fs::write(path, self.to_string())?;
		Ok(())
	}

	fn section(&self, name: &str) -> Option<&Section> {
		self.sections.iter().find(|section| section.name == name)
	}

	fn section_mut(&mut self, name: &str) -> &mut Section {
		let pos = match self.sections.iter().position(|section| section.name == name) {
			Some(pos) => pos,
			None => {
				self.sections.push(Section {
					name: name.to_owned(),
					entries: Vec::new(),
				});
				self.sections.len() - 1
			}
		};
		&mut self.sections[pos]
	}

	/// Section names in file order.
	pub fn sections(&self) -> impl Iterator<Item = &str> {
		self.sections.iter().map(|section| section.name.as_str())
	}

	/// First value stored for `key`.
	pub fn get(&self, section: &str, key: &str) -> Option<&str> {
		self.section(section)?
			.entries
			.iter()
			.find(|(name, _)| name == key)
			.map(|(_, value)| value.as_str())
	}

	/// Every value stored for `key`, in file order.
	pub fn get_all(&self, section: &str, key: &str) -> Vec<&str> {
		self.section(section)
			.map(|section| {
				section
					.entries
					.iter()
					.filter(|(name, _)| name == key)
					.map(|(_, value)| value.as_str())
					.collect()
			})
			.unwrap_or_default()
	}

	/// Replace every value of `key` with one value.
	pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
		self.set_all(section, key, [value.into()]);
	}

	/// Replace every value of `key` with `values`, one line each.
	///
	/// New lines take the position of the first existing line for `key`.
	pub fn set_all(&mut self, section: &str, key: &str, values: impl IntoIterator<Item = String>) {
		let section = self.section_mut(section);
		let at = section.entries.iter().position(|(name, _)| name == key).unwrap_or(section.entries.len());
		section.entries.retain(|(name, _)| name != key);
		let lines: Vec<_> = values.into_iter().map(|value| (key.to_owned(), value)).collect();
		let at = at.min(section.entries.len());
		section.entries.splice(at..at, lines);
	}

	/// Remove every value of `key`; returns whether anything was removed.
	pub fn remove_key(&mut self, section: &str, key: &str) -> bool {
		let Some(section) = self.sections.iter_mut().find(|item| item.name == section) else {
			return false;
		};
		let before = section.entries.len();
		section.entries.retain(|(name, _)| name != key);
		section.entries.len() != before
	}

	/// Store a slot under `section.key`.
	///
	/// Supported: bool, int32, string, float, double, string arrays and the
	/// native vector-like structs. Arrays go on one line as `(a,b)` when
	/// `single_line_array` is set, otherwise one `Key=value` line per element.
	pub fn write_property(&mut self, section: &str, key: &str, desc: &TypeDesc, slot: &Slot, single_line_array: bool) -> Result<()> {
		let kind = supported(section, key, desc)?;
		if !slot.matches(desc) {
			return Err(CodecError::StorageMismatch {
				property: format!("{section}.{key}"),
				expected: desc.kind_label(),
			});
		}
		match (kind, slot) {
			(ConfigKind::Bool, Slot::Bool(value)) => self.set(section, key, if *value { "True" } else { "False" }),
			(ConfigKind::Float, Slot::Float(value)) => self.set(section, key, sanitize_float(float_to_f64(*value))),
			(ConfigKind::Double, Slot::Double(value)) => self.set(section, key, sanitize_float(*value)),
			(ConfigKind::StrArray, Slot::Array(items)) if !single_line_array => {
				self.set_all(section, key, items.iter().filter_map(|item| item.as_str().map(str::to_owned)));
			}
			_ => self.set(section, key, export_text(desc, slot)),
		}
		Ok(())
	}

	/// Load `section.key` into a slot; returns `false` when the key is absent.
	pub fn read_property(&self, section: &str, key: &str, desc: &TypeDesc, slot: &mut Slot, single_line_array: bool) -> Result<bool> {
		let kind = supported(section, key, desc)?;
		if matches!(kind, ConfigKind::StrArray) && !single_line_array {
			let values = self.get_all(section, key);
			if values.is_empty() {
				return Ok(false);
			}
			*slot = Slot::Array(ScriptArray::from_vec(values.into_iter().map(|value| Slot::Str(value.to_owned())).collect()));
			return Ok(true);
		}

		let Some(value) = self.get(section, key) else {
			return Ok(false);
		};
		match kind {
			ConfigKind::Bool => *slot = Slot::Bool(parse_bool(value)),
			ConfigKind::Int | ConfigKind::Str | ConfigKind::Float | ConfigKind::Double | ConfigKind::StrArray | ConfigKind::NativeStruct => {
				import_text(desc, slot, value)?;
			}
		}
		Ok(true)
	}
}

impl fmt::Display for ConfigFile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (pos, section) in self.sections.iter().enumerate() {
			if pos > 0 {
				writeln!(f)?;
			}
			writeln!(f, "[{}]", section.name)?;
			for (key, value) in &section.entries {
				writeln!(f, "{key}={value}")?;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests;
