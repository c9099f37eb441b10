//! Textual export/import of slots.
//!
//! The format is the compact property text used for map keys, legacy struct
//! strings, config values and table cells: structs as `(A=1,B="x")`,
//! arrays and sets as `(a,b)`, maps as `((k,v),(k2,v2))` and object
//! references as `None` or `Class'name'`. Strings are written verbatim at the
//! top level and quoted once nested inside a container.

use crate::codec::desc::{ClassDesc, EnumDesc, ScalarKind, TypeDesc};
use crate::codec::slot::{ObjectRef, ScriptArray, ScriptMap, ScriptSet, Slot};
use crate::codec::{CodecError, Result};

/// Render a float with the shortest round-tripping digits and at least one decimal.
pub fn sanitize_float(value: f64) -> String {
	if !value.is_finite() {
		return value.to_string();
	}
	let text = value.to_string();
	if text.contains('.') { text } else { format!("{text}.0") }
}

/// Widen an `f32` without exposing binary noise (`0.1` stays `0.1`).
pub(crate) fn float_to_f64(value: f32) -> f64 {
	value.to_string().parse::<f64>().unwrap_or(f64::from(value))
}

/// Export `slot` as property text.
///
/// Storage that does not match `desc` exports as an empty string.
pub fn export_text(desc: &TypeDesc, slot: &Slot) -> String {
	let mut out = String::new();
	export_into(desc, slot, false, &mut out);
	out
}

fn export_into(desc: &TypeDesc, slot: &Slot, nested: bool, out: &mut String) {
	match (desc, slot) {
		(TypeDesc::Scalar(ScalarKind::Enum(item)), Slot::Enum(value)) => match item.name_of(*value) {
			Some(name) => out.push_str(name),
			None => out.push_str(&value.to_string()),
		},
		(TypeDesc::Scalar(_), Slot::Bool(value)) => out.push_str(if *value { "true" } else { "false" }),
		(TypeDesc::Scalar(_), Slot::Int(value)) => out.push_str(&value.to_string()),
		(TypeDesc::Scalar(_), Slot::UInt(value)) => out.push_str(&value.to_string()),
		(TypeDesc::Scalar(_), Slot::Float(value)) => out.push_str(&sanitize_float(float_to_f64(*value))),
		(TypeDesc::Scalar(_), Slot::Double(value)) => out.push_str(&sanitize_float(*value)),
		(TypeDesc::Scalar(_), Slot::Str(value)) if nested => push_quoted(value, out),
		(TypeDesc::Scalar(_), Slot::Str(value)) => out.push_str(value),
		(TypeDesc::Array(inner), Slot::Array(items)) => export_list(items.iter(), out, |item, out| export_into(inner, item, true, out)),
		(TypeDesc::Set(inner), Slot::Set(items)) => export_list(items.iter(), out, |item, out| export_into(inner, item, true, out)),
		(TypeDesc::Map { key, value }, Slot::Map(pairs)) => export_list(pairs.iter(), out, |(k, v), out| {
			out.push('(');
			export_into(key, k, true, out);
			out.push(',');
			export_into(value, v, true, out);
			out.push(')');
		}),
		(TypeDesc::Struct(item), Slot::Struct(data)) => {
			out.push('(');
			let mut first = true;
			for field in item.fields() {
				let Some(value) = data.field(field) else {
					continue;
				};
				if !first {
					out.push(',');
				}
				first = false;
				out.push_str(field.authored_name());
				out.push('=');
				export_into(&field.ty, value, true, out);
			}
			out.push(')');
		}
		(TypeDesc::Object(_), Slot::Object(reference)) => match reference {
			Some(object) => out.push_str(&object.path_name()),
			None => out.push_str("None"),
		},
		_ => {}
	}
}

fn export_list<T>(items: impl Iterator<Item = T>, out: &mut String, mut write: impl FnMut(T, &mut String)) {
	out.push('(');
	for (pos, item) in items.enumerate() {
		if pos > 0 {
			out.push(',');
		}
		write(item, out);
	}
	out.push(')');
}

fn push_quoted(value: &str, out: &mut String) {
	out.push('"');
	for ch in value.chars() {
		if ch == '"' || ch == '\\' {
			out.push('\\');
		}
		out.push(ch);
	}
	out.push('"');
}

/// Import property text into `slot`; object references other than `None` fail.
pub fn import_text(desc: &TypeDesc, slot: &mut Slot, text: &str) -> Result<()> {
	import_text_with(desc, slot, text, &|_| None)
}

/// Import property text into `slot`, resolving object references through `resolve`.
///
/// The slot is replaced only when the whole text imports; struct fields not
/// named in the text keep their current values.
pub fn import_text_with(desc: &TypeDesc, slot: &mut Slot, text: &str, resolve: &dyn Fn(&str) -> Option<ObjectRef>) -> Result<()> {
	let value = match desc {
		TypeDesc::Scalar(kind) => parse_scalar(kind, text)?,
		TypeDesc::Object(class) => parse_object(class, text.trim(), resolve)?,
		_ => {
			let mut reader = TextReader { src: text, pos: 0, resolve };
			let value = reader.value(desc, Some(&*slot))?;
			reader.skip_ws();
			if reader.pos < text.len() {
				return Err(reader.invalid(desc));
			}
			value
		}
	};
	*slot = value;
	Ok(())
}

/// Parse one scalar from text.
pub(crate) fn parse_scalar(kind: &ScalarKind, text: &str) -> Result<Slot> {
	let invalid = || CodecError::InvalidText {
		kind: kind.label().to_owned(),
		text: text.to_owned(),
	};
	let trimmed = text.trim();
	Ok(match kind {
		ScalarKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
			"true" => Slot::Bool(true),
			"false" => Slot::Bool(false),
			_ => return Err(invalid()),
		},
		ScalarKind::Float => Slot::Float(trimmed.parse().map_err(|_| invalid())?),
		ScalarKind::Double => Slot::Double(trimmed.parse().map_err(|_| invalid())?),
		ScalarKind::Str | ScalarKind::Name => Slot::Str(text.to_owned()),
		ScalarKind::Enum(item) => Slot::Enum(enum_value(item, trimmed)?),
		kind if kind.is_unsigned_integer() => {
			let value = trimmed.parse::<u64>().map_err(|_| invalid())?;
			if value > kind.unsigned_max() {
				return Err(invalid());
			}
			Slot::UInt(value)
		}
		kind => {
			let value = trimmed.parse::<i64>().map_err(|_| invalid())?;
			let (lo, hi) = kind.signed_range();
			if value < lo || value > hi {
				return Err(invalid());
			}
			Slot::Int(value)
		}
	})
}

/// Resolve an enum variant name, or a numeric value naming a declared variant.
pub(crate) fn enum_value(desc: &EnumDesc, text: &str) -> Result<i64> {
	if let Some(value) = desc.value_of(text) {
		return Ok(value);
	}
	match text.parse::<i64>() {
		Ok(value) if desc.name_of(value).is_some() => Ok(value),
		_ => Err(CodecError::UnknownEnumVariant {
			enum_name: desc.name.clone(),
			variant: text.to_owned(),
		}),
	}
}

fn parse_object(class: &ClassDesc, text: &str, resolve: &dyn Fn(&str) -> Option<ObjectRef>) -> Result<Slot> {
	if text.is_empty() || text == "None" {
		return Ok(Slot::Object(None));
	}
	match resolve(text) {
		Some(object) if object.class().is_child_of(class) => Ok(Slot::Object(Some(object))),
		_ => Err(CodecError::InvalidText {
			kind: format!("{}*", class.name),
			text: text.to_owned(),
		}),
	}
}

struct TextReader<'a> {
	src: &'a str,
	pos: usize,
	resolve: &'a dyn Fn(&str) -> Option<ObjectRef>,
}

impl TextReader<'_> {
	fn invalid(&self, desc: &TypeDesc) -> CodecError {
		CodecError::InvalidText {
			kind: desc.type_name(),
			text: self.src.to_owned(),
		}
	}

	fn peek(&self) -> Option<char> {
		self.src[self.pos..].chars().next()
	}

	fn skip_ws(&mut self) {
		while let Some(ch) = self.peek() {
			if !ch.is_whitespace() {
				break;
			}
			self.pos += ch.len_utf8();
		}
	}

	fn eat(&mut self, want: char) -> bool {
		self.skip_ws();
		if self.peek() == Some(want) {
			self.pos += want.len_utf8();
			true
		} else {
			false
		}
	}

	fn expect(&mut self, want: char, desc: &TypeDesc) -> Result<()> {
		if self.eat(want) { Ok(()) } else { Err(self.invalid(desc)) }
	}

	fn token(&mut self, desc: &TypeDesc) -> Result<String> {
		self.skip_ws();
		if self.peek() != Some('"') {
			let rest = &self.src[self.pos..];
			let end = rest.find([',', ')', '(', '=']).unwrap_or(rest.len());
			self.pos += end;
			return Ok(rest[..end].trim_end().to_owned());
		}

		self.pos += 1;
		let mut out = String::new();
		let mut escaped = false;
		while let Some(ch) = self.peek() {
			self.pos += ch.len_utf8();
			match ch {
				_ if escaped => {
					out.push(ch);
					escaped = false;
				}
				'\\' => escaped = true,
				'"' => return Ok(out),
				_ => out.push(ch),
			}
		}
		Err(self.invalid(desc))
	}

	fn list<T>(&mut self, desc: &TypeDesc, mut item: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
		self.expect('(', desc)?;
		let mut out = Vec::new();
		if self.eat(')') {
			return Ok(out);
		}
		loop {
			out.push(item(self)?);
			if self.eat(')') {
				return Ok(out);
			}
			self.expect(',', desc)?;
		}
	}

	fn skip_value(&mut self, desc: &TypeDesc) -> Result<()> {
		self.skip_ws();
		if self.peek() != Some('(') {
			return self.token(desc).map(drop);
		}
		let mut depth = 0_usize;
		while let Some(ch) = self.peek() {
			match ch {
				'"' => {
					self.token(desc)?;
					continue;
				}
				'(' => depth += 1,
				')' => {
					depth -= 1;
					if depth == 0 {
						self.pos += 1;
						return Ok(());
					}
				}
				_ => {}
			}
			self.pos += ch.len_utf8();
		}
		Err(self.invalid(desc))
	}

	fn value(&mut self, desc: &TypeDesc, current: Option<&Slot>) -> Result<Slot> {
		match desc {
			TypeDesc::Scalar(kind) => {
				let text = self.token(desc)?;
				parse_scalar(kind, &text)
			}
			TypeDesc::Object(class) => {
				let text = self.token(desc)?;
				parse_object(class, &text, self.resolve)
			}
			TypeDesc::Array(inner) => {
				let items = self.list(desc, |reader| reader.value(inner, None))?;
				Ok(Slot::Array(ScriptArray::from_vec(items)))
			}
			TypeDesc::Set(inner) => {
				let items = self.list(desc, |reader| reader.value(inner, None))?;
				Ok(Slot::Set(ScriptSet::from_elements(items)))
			}
			TypeDesc::Map { key, value } => {
				let pairs = self.list(desc, |reader| {
					reader.expect('(', desc)?;
					let k = reader.value(key, None)?;
					reader.expect(',', desc)?;
					let v = reader.value(value, None)?;
					reader.expect(')', desc)?;
					Ok((k, v))
				})?;
				Ok(Slot::Map(ScriptMap::from_pairs(pairs)))
			}
			TypeDesc::Struct(item) => {
				let mut data = current.and_then(Slot::as_struct).cloned().unwrap_or_else(|| item.default_data());
				self.expect('(', desc)?;
				if self.eat(')') {
					return Ok(Slot::Struct(data));
				}
				loop {
					let name = self.token(desc)?;
					self.expect('=', desc)?;
					match item.field(&name) {
						Some(field) => {
							let value = self.value(&field.ty, data.field(field))?;
							data.set(field, value);
						}
						None => self.skip_value(desc)?,
					}
					if self.eat(')') {
						return Ok(Slot::Struct(data));
					}
					self.expect(',', desc)?;
				}
			}
		}
	}
}
