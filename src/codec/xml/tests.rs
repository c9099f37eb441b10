use std::sync::Arc;

use serde_json::json;

use super::{create_tag_node, escape, value_to_xml};
use crate::codec::test_support::{counter, int32, inventory, node_classes, point, string};
use crate::codec::{Applied, ClassDesc, Codec, CodecError, FieldDesc, ScalarKind, Slot, StructDesc, TypeDesc};

#[test]
fn tag_nodes_indent_two_spaces_per_depth() {
	assert_eq!(create_tag_node("A", "1", 2, false), "\n    <A>1</A>");
	assert_eq!(create_tag_node("A", "\n      <B>1</B>", 2, true), "\n    <A>\n      <B>1</B>\n    </A>");
}

#[test]
fn escape_covers_only_markup_characters() {
	assert_eq!(escape("a<b>&\"c'"), "a&lt;b&gt;&amp;\"c'");
}

#[test]
fn scalar_struct_layout() {
	let desc = counter();
	let xml = Codec::new().struct_to_xml_string(&desc, &Slot::default_for(&desc));
	assert_eq!(
		xml,
		"<?xml version='1.0' encoding='UTF-8' ?>\n<root>\n  <Count>5</Count>\n  <Label>hi</Label>\n</root>"
	);
}

#[test]
fn containers_wrap_elements() {
	let desc = TypeDesc::structure(Arc::new(StructDesc::new(
		"Holder",
		vec![
			FieldDesc::new("List", TypeDesc::array(point())),
			FieldDesc::new("Names", TypeDesc::set(string())),
			FieldDesc::new("Lookup", TypeDesc::map(string(), int32())),
		],
	)));
	let tree = json!({
		"List": [{"X": 1.0}],
		"Names": ["a"],
		"Lookup": {"k": 2}
	});
	let expected = concat!(
		"\n  <List>",
		"\n    <value>",
		"\n      <X>1.0</X>",
		"\n    </value>",
		"\n  </List>",
		"\n  <Names>",
		"\n    <item>a</item>",
		"\n  </Names>",
		"\n  <Lookup>",
		"\n    <item>",
		"\n      <key>k</key>",
		"\n      <value>2</value>",
		"\n    </item>",
		"\n  </Lookup>"
	);
	assert_eq!(value_to_xml(&desc, &tree, 1), expected);
}

#[test]
fn shape_mismatch_renders_empty_content() {
	assert_eq!(value_to_xml(&TypeDesc::array(int32()), &json!({"a": 1}), 1), "");
	assert_eq!(value_to_xml(&int32(), &json!([1]), 1), "");
}

#[test]
fn inventory_round_trips_through_xml() {
	let desc = inventory();
	let codec = Codec::new();
	let mut source = Slot::default_for(&desc);
	codec
		.json_string_to_struct(
			&desc,
			&mut source,
			r#"{"Owner":"a & b","Slots":[{"X":0.5},{"X":3.0}],"Tags":["t"],"Stock":{"4":1.25},"Grade":"Rare","Sealed":true}"#,
		)
		.expect("json decodes");

	let xml = codec.struct_to_xml_string(&desc, &source);
	assert!(xml.contains("<Owner>a &amp; b</Owner>"));

	let mut target = Slot::default_for(&desc);
	let applied = codec.xml_string_to_struct(&desc, &mut target, &xml).expect("xml decodes");
	assert_eq!(applied, Applied::Written);
	assert_eq!(target, source);
}

#[test]
fn internal_names_are_accepted_on_decode() {
	let desc = inventory();
	let mut slot = Slot::default_for(&desc);
	Codec::new()
		.xml_string_to_struct(&desc, &mut slot, "<root><owner_name_0>z</owner_name_0><Sealed>yes</Sealed></root>")
		.expect("xml decodes");
	let data = slot.as_struct().expect("struct storage");
	assert_eq!(data.get(0), Some(&Slot::Str("z".into())));
	assert_eq!(data.get(5), Some(&Slot::Bool(false)), "only the exact text true is true");
}

#[test]
fn invalid_numbers_read_as_zero() {
	let desc = counter();
	let mut slot = Slot::default_for(&desc);
	Codec::new()
		.xml_string_to_struct(&desc, &mut slot, "<root><Count>many</Count></root>")
		.expect("xml decodes");
	assert_eq!(slot.as_struct().and_then(|data| data.get(0)), Some(&Slot::Int(0)));
}

#[test]
fn empty_or_malformed_documents_apply_nothing() {
	let desc = counter();
	let codec = Codec::new();
	let mut slot = Slot::default_for(&desc);
	assert_eq!(codec.xml_string_to_struct(&desc, &mut slot, "<root/>").expect("empty root"), Applied::Nothing);
	assert!(matches!(codec.xml_string_to_struct(&desc, &mut slot, ""), Err(CodecError::EmptyDocument)));
	assert!(matches!(
		codec.xml_string_to_struct(&desc, &mut slot, "<root><Count>1</root>"),
		Err(CodecError::Xml(_))
	));
	assert_eq!(slot, Slot::default_for(&desc));
}

#[test]
fn objects_without_content_decode_as_null() {
	let (node, _) = node_classes();
	let texture = ClassDesc::declare_native("Texture");
	let desc = TypeDesc::structure(Arc::new(StructDesc::new(
		"Refs",
		vec![
			FieldDesc::new("Head", TypeDesc::object(node)),
			FieldDesc::new("Skin", TypeDesc::object(texture.clone())),
			FieldDesc::new("Rank", TypeDesc::scalar(ScalarKind::UInt16)),
		],
	)));
	let mut codec = Codec::new();
	let grass = texture.construct("Grass");
	codec.fallback_mut().register_object(grass.clone());

	let mut slot = Slot::default_for(&desc);
	codec
		.xml_string_to_struct(&desc, &mut slot, "<root><Head></Head><Skin>Texture'Grass'</Skin><Rank>3</Rank></root>")
		.expect("xml decodes");
	let data = slot.as_struct().expect("struct storage");
	assert_eq!(data.get(0), Some(&Slot::Object(None)));
	assert_eq!(data.get(1), Some(&Slot::Object(Some(grass))));
	assert_eq!(data.get(2), Some(&Slot::UInt(3)));

	let xml = codec.struct_to_xml_string(&desc, &slot);
	assert!(xml.contains("\n  <Head></Head>"));
	assert!(xml.contains("\n  <Skin>Texture'Grass'</Skin>"));
}
