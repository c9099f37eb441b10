#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use propdoc::codec::{Applied, Codec, ConfigFile, DataTable, SchemaDoc, Slot, TypeRegistry};

#[test]
fn stall_round_trips_through_both_formats() {
	let registry = registry();
	let desc = registry.get_type("Stall").expect("stall type");
	let codec = Codec::new();

	let mut from_json = Slot::default_for(&desc);
	let applied = codec
		.json_string_to_struct(&desc, &mut from_json, &fixture_text("stall.json"))
		.expect("stall json decodes");
	assert_eq!(applied, Applied::Written);

	let xml = codec.struct_to_xml_string(&desc, &from_json);
	let mut from_xml = Slot::default_for(&desc);
	codec.xml_string_to_struct(&desc, &mut from_xml, &xml).expect("stall xml decodes");
	assert_eq!(from_xml, from_json);

	let json = codec.struct_to_json_string(&desc, &from_xml).expect("stall json encodes");
	let mut again = Slot::default_for(&desc);
	codec.json_string_to_struct(&desc, &mut again, &json).expect("re-encoded json decodes");
	assert_eq!(again, from_json);
}

#[test]
fn stall_origin_is_storable_in_config() {
	let registry = registry();
	let desc = registry.get_type("Stall").expect("stall type");
	let stall = registry.get_struct("Stall").expect("stall struct");
	let origin = stall.field("Origin").expect("origin field");

	let mut slot = Slot::default_for(&desc);
	Codec::new()
		.json_string_to_struct(&desc, &mut slot, &fixture_text("stall.json"))
		.expect("stall json decodes");
	let value = slot.as_struct().and_then(|data| data.field(origin)).cloned().expect("origin slot");

	let dir = tempfile::tempdir().expect("temp dir");
	let path = dir.path().join("Stall.ini");
	let mut config = ConfigFile::default();
	config.write_property("Stall", "Origin", &origin.ty, &value, false).expect("origin writes");
	config.save(&path).expect("config saves");

	let loaded = ConfigFile::load(&path).expect("config loads");
	assert_eq!(loaded.get("Stall", "Origin"), Some("(X=1.5,Y=-2.0,Z=0.0)"));
	let mut read = Slot::default_for(&origin.ty);
	assert!(loaded.read_property("Stall", "Origin", &origin.ty, &mut read, false).expect("origin reads"));
	assert_eq!(read, value);
}

#[test]
fn weapon_table_survives_csv() {
	let registry = registry();
	let weapon = registry.get_struct("Weapon").expect("weapon struct");
	let codec = Codec::new();

	let table = DataTable::from_json(weapon.clone(), None, &fixture_text("weapons.json"), &codec).expect("table imports");
	let back = DataTable::from_csv(weapon, None, &table.to_csv()).expect("csv imports");
	assert_eq!(back.rows(), table.rows());
	assert_eq!(back.to_json(&codec).expect("table writes"), table.to_json(&codec).expect("table writes"));
}

fn registry() -> TypeRegistry {
	SchemaDoc::load(&fixture_path("shop.schema.json"))
		.expect("schema loads")
		.build()
		.expect("schema builds")
}

fn fixture_text(name: &str) -> String {
	std::fs::read_to_string(fixture_path(name)).expect("fixture readable")
}

fn fixture_path(name: &str) -> PathBuf {
	Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}
