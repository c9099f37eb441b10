//! Tagged-node XML codec over the abstract value tree.
//!
//! Documents wrap the encoded value in a `root` element. Struct and object
//! fields become elements named after the field, array elements are wrapped
//! in `<value>`, set elements in `<item>`, and map entries in
//! `<item><key/><value/></item>`. Every nesting level indents by two spaces.

use roxmltree::{Document, Node};
use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::codec::desc::{FieldDesc, ScalarKind, TypeDesc};
use crate::codec::json::has_content;
use crate::codec::slot::Slot;
use crate::codec::text::sanitize_float;
use crate::codec::{Applied, Codec, CodecError, PropertyFallback, Result};

/// Prolog written before the root element.
pub const XML_PROLOG: &str = "<?xml version='1.0' encoding='UTF-8' ?>";

/// Escape `&`, `<` and `>`; quotes are left as they are.
pub fn escape(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for ch in text.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			_ => out.push(ch),
		}
	}
	out
}

/// Wrap `content` in `<tag>` on a new line indented by `2 * depth` spaces.
///
/// With `with_cr` the closing tag goes on its own line at the same indentation.
pub fn create_tag_node(tag: &str, content: &str, depth: usize, with_cr: bool) -> String {
	let indent = " ".repeat(depth * 2);
	let mut out = format!("\n{indent}<{tag}>{content}");
	if with_cr {
		out.push('\n');
		out.push_str(&indent);
	}
	out.push_str("</");
	out.push_str(tag);
	out.push('>');
	out
}

fn is_container(value: &Value) -> bool {
	matches!(value, Value::Array(_) | Value::Object(_))
}

fn tag_child(tag: &str, desc: &TypeDesc, value: &Value, depth: usize) -> String {
	let content = value_to_xml(desc, value, depth + 1);
	create_tag_node(tag, &content, depth, is_container(value))
}

/// Render the content of a node holding `value`, with children at `depth`.
///
/// Values whose shape does not fit `desc` render as empty content.
pub fn value_to_xml(desc: &TypeDesc, value: &Value, depth: usize) -> String {
	match (desc, value) {
		(TypeDesc::Array(inner), Value::Array(items)) => items.iter().map(|item| tag_child("value", inner, item, depth)).collect(),
		(TypeDesc::Set(inner), Value::Array(items)) => items.iter().map(|item| tag_child("item", inner, item, depth)).collect(),
		(TypeDesc::Map { value: inner, .. }, Value::Object(entries)) => entries
			.iter()
			.map(|(key, item)| {
				let mut body = create_tag_node("key", &escape(key), depth + 1, false);
				body.push_str(&tag_child("value", inner, item, depth + 1));
				create_tag_node("item", &body, depth, true)
			})
			.collect(),
		(TypeDesc::Struct(item), Value::Object(entries)) => fields_to_xml(item.fields(), entries, depth),
		(TypeDesc::Object(class), _) if class.native => match value {
			Value::String(text) => escape(text),
			Value::Null => String::new(),
			other => {
				warn!(class = %class.name, got = crate::codec::json::kind_label(other), "native object reference is not a string");
				String::new()
			}
		},
		(TypeDesc::Object(class), Value::Object(entries)) => fields_to_xml(class.fields(), entries, depth),
		(TypeDesc::Scalar(_), Value::String(text)) => escape(text),
		(TypeDesc::Scalar(_), Value::Number(number)) => number_text(number),
		(TypeDesc::Scalar(_), Value::Bool(flag)) => flag.to_string(),
		_ => String::new(),
	}
}

fn fields_to_xml<'f>(fields: impl IntoIterator<Item = &'f FieldDesc>, entries: &Map<String, Value>, depth: usize) -> String {
	let mut out = String::new();
	for field in fields {
		let found = [field.authored_name(), field.name.as_str()]
			.into_iter()
			.find_map(|name| entries.get(name).map(|item| (name, item)));
		if let Some((name, item)) = found {
			out.push_str(&tag_child(name, &field.ty, item, depth));
		}
	}
	out
}

fn number_text(number: &Number) -> String {
	if number.is_f64() {
		number.as_f64().map(sanitize_float).unwrap_or_default()
	} else {
		number.to_string()
	}
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
	node.children().find(|child| child.is_element() && child.tag_name().name() == name)
}

/// Rebuild the tree value held by `node`, keyed by internal field names.
pub fn node_to_value(desc: &TypeDesc, node: Node<'_, '_>) -> Value {
	let content = node.text().unwrap_or("");
	match desc {
		TypeDesc::Array(inner) | TypeDesc::Set(inner) => {
			Value::Array(node.children().filter(Node::is_element).map(|child| node_to_value(inner, child)).collect())
		}
		TypeDesc::Map { value: inner, .. } => {
			let mut out = Map::new();
			for child in node.children().filter(Node::is_element) {
				if let (Some(key), Some(item)) = (child_element(child, "key"), child_element(child, "value")) {
					out.insert(key.text().unwrap_or("").to_owned(), node_to_value(inner, item));
				}
			}
			Value::Object(out)
		}
		TypeDesc::Struct(item) => Value::Object(nodes_to_fields(item.fields(), node)),
		TypeDesc::Object(class) => {
			if content.trim().is_empty() && !node.children().any(|child| child.is_element()) {
				return Value::Null;
			}
			if class.native {
				return Value::String(content.to_owned());
			}
			Value::Object(nodes_to_fields(class.fields(), node))
		}
		TypeDesc::Scalar(ScalarKind::Bool) => Value::Bool(content.trim() == "true"),
		TypeDesc::Scalar(kind) if kind.is_numeric() => lenient_number(content.trim()),
		TypeDesc::Scalar(_) => Value::String(content.to_owned()),
	}
}

fn nodes_to_fields<'f>(fields: impl IntoIterator<Item = &'f FieldDesc>, node: Node<'_, '_>) -> Map<String, Value> {
	let mut out = Map::new();
	for field in fields {
		let found = child_element(node, field.authored_name()).or_else(|| child_element(node, &field.name));
		if let Some(child) = found {
			out.insert(field.name.clone(), node_to_value(&field.ty, child));
		}
	}
	out
}

/// Parse numeric text; unparsable text reads as zero.
fn lenient_number(text: &str) -> Value {
	if let Ok(value) = text.parse::<i64>() {
		return Value::from(value);
	}
	if let Ok(value) = text.parse::<u64>() {
		return Value::from(value);
	}
	let value = text.parse::<f64>().unwrap_or(0.0);
	Number::from_f64(value).map_or(Value::from(0), Value::Number)
}

impl<F: PropertyFallback> Codec<F> {
	/// Encode a slot as an XML document.
	pub fn struct_to_xml_string(&self, desc: &TypeDesc, slot: &Slot) -> String {
		let value = self.encode(desc, slot);
		let body = value_to_xml(desc, &value, 1);
		format!("{XML_PROLOG}{}", create_tag_node("root", &body, 0, true))
	}

	/// Decode an XML document into a slot.
	///
	/// The slot is only touched when the rebuilt top level is a non-empty
	/// array or object.
	pub fn xml_string_to_struct(&self, desc: &TypeDesc, slot: &mut Slot, text: &str) -> Result<Applied> {
		if text.trim().is_empty() {
			return Err(CodecError::EmptyDocument);
		}
		let doc = Document::parse(text).inspect_err(|err| warn!(%err, "failed to parse xml document"))?;
		let value = node_to_value(desc, doc.root_element());
		if !has_content(&value) {
			return Ok(Applied::Nothing);
		}
		self.decode(&value, desc, slot)?;
		Ok(Applied::Written)
	}
}

#[cfg(test)]
mod tests;
