use std::sync::Arc;

use super::ConfigFile;
use crate::codec::test_support::{int32, string};
use crate::codec::{CodecError, FieldDesc, ScalarKind, ScriptArray, Slot, StructDesc, TypeDesc};

fn vector() -> TypeDesc {
	let double = || TypeDesc::scalar(ScalarKind::Double);
	TypeDesc::structure(Arc::new(StructDesc::native(
		"Vector",
		vec![FieldDesc::new("X", double()), FieldDesc::new("Y", double()), FieldDesc::new("Z", double())],
	)))
}

fn names(items: &[&str]) -> Slot {
	Slot::Array(ScriptArray::from_vec(items.iter().map(|item| Slot::Str((*item).to_owned())).collect()))
}

#[test]
fn parse_keeps_sections_and_repeated_keys() {
	let file = ConfigFile::parse("; comment\n[Game]\nLevel=3\n+Maps=a\nMaps=b\n\n[Audio]\nVolume = 0.5\nbroken line\n");
	assert_eq!(file.sections().collect::<Vec<_>>(), ["Game", "Audio"]);
	assert_eq!(file.get("Game", "Level"), Some("3"));
	assert_eq!(file.get_all("Game", "Maps"), ["a", "b"]);
	assert_eq!(file.get("Audio", "Volume"), Some("0.5"));
	assert_eq!(file.get("Audio", "broken line"), None);
}

#[test]
fn scalars_round_trip_through_disk() {
	let dir = tempfile::tempdir().expect("temp dir");
	let path = dir.path().join("Game.ini");

	let mut file = ConfigFile::default();
	file.write_property("Game", "Enabled", &TypeDesc::scalar(ScalarKind::Bool), &Slot::Bool(true), false)
		.expect("bool writes");
	file.write_property("Game", "Level", &int32(), &Slot::Int(12), false).expect("int writes");
	file.write_property("Game", "Title", &string(), &Slot::Str("Hello there".into()), false)
		.expect("string writes");
	file.write_property("Audio", "Volume", &TypeDesc::scalar(ScalarKind::Float), &Slot::Float(0.1), false)
		.expect("float writes");
	file.save(&path).expect("config saves");

	let text = std::fs::read_to_string(&path).expect("config text");
	assert_eq!(text, "[Game]\nEnabled=True\nLevel=12\nTitle=Hello there\n\n[Audio]\nVolume=0.1\n");

	let file = ConfigFile::load(&path).expect("config loads");
	let mut enabled = Slot::Bool(false);
	let mut level = Slot::Int(0);
	let mut title = Slot::Str(String::new());
	let mut volume = Slot::Float(0.0);
	assert!(file.read_property("Game", "Enabled", &TypeDesc::scalar(ScalarKind::Bool), &mut enabled, false).expect("bool reads"));
	assert!(file.read_property("Game", "Level", &int32(), &mut level, false).expect("int reads"));
	assert!(file.read_property("Game", "Title", &string(), &mut title, false).expect("string reads"));
	assert!(file.read_property("Audio", "Volume", &TypeDesc::scalar(ScalarKind::Float), &mut volume, false).expect("float reads"));
	assert_eq!(enabled, Slot::Bool(true));
	assert_eq!(level, Slot::Int(12));
	assert_eq!(title, Slot::Str("Hello there".into()));
	assert_eq!(volume, Slot::Float(0.1));
}

#[test]
fn missing_key_reads_false_and_keeps_slot() {
	let file = ConfigFile::parse("[Game]\nLevel=1\n");
	let mut slot = Slot::Int(7);
	assert!(!file.read_property("Game", "Other", &int32(), &mut slot, false).expect("lookup succeeds"));
	assert!(!file.read_property("Nope", "Level", &int32(), &mut slot, false).expect("lookup succeeds"));
	assert_eq!(slot, Slot::Int(7));
}

#[test]
fn string_arrays_use_single_or_multi_line_layout() {
	let desc = TypeDesc::array(string());
	let slot = names(&["alpha", "beta gamma"]);

	let mut file = ConfigFile::default();
	file.write_property("Maps", "Single", &desc, &slot, true).expect("single line writes");
	file.write_property("Maps", "Multi", &desc, &slot, false).expect("multi line writes");
	assert_eq!(file.to_string(), "[Maps]\nSingle=(\"alpha\",\"beta gamma\")\nMulti=alpha\nMulti=beta gamma\n");

	let reread = ConfigFile::parse(&file.to_string());
	let mut single = names(&[]);
	let mut multi = names(&[]);
	assert!(reread.read_property("Maps", "Single", &desc, &mut single, true).expect("single line reads"));
	assert!(reread.read_property("Maps", "Multi", &desc, &mut multi, false).expect("multi line reads"));
	assert_eq!(single, slot);
	assert_eq!(multi, slot);
}

#[test]
fn rewriting_an_array_replaces_every_line() {
	let desc = TypeDesc::array(string());
	let mut file = ConfigFile::parse("[Maps]\nBefore=1\nList=a\nList=b\nList=c\nAfter=2\n");
	file.write_property("Maps", "List", &desc, &names(&["z"]), false).expect("array writes");
	assert_eq!(file.to_string(), "[Maps]\nBefore=1\nList=z\nAfter=2\n");
}

#[test]
fn native_vector_uses_struct_text() {
	let desc = vector();
	let mut slot = Slot::default_for(&desc);
	crate::codec::text::import_text(&desc, &mut slot, "(X=1.0,Y=-2.5,Z=3.0)").expect("vector text imports");

	let mut file = ConfigFile::default();
	file.write_property("Spawn", "Origin", &desc, &slot, false).expect("vector writes");
	assert_eq!(file.get("Spawn", "Origin"), Some("(X=1.0,Y=-2.5,Z=3.0)"));

	let mut read = Slot::default_for(&desc);
	assert!(file.read_property("Spawn", "Origin", &desc, &mut read, false).expect("vector reads"));
	assert_eq!(read, slot);
}

#[test]
fn bool_reads_leniently() {
	let file = ConfigFile::parse("[A]\nOne=yes\nTwo=1\nThree=False\nFour=junk\n");
	let desc = TypeDesc::scalar(ScalarKind::Bool);
	let read = |key: &str| {
		let mut slot = Slot::Bool(false);
		file.read_property("A", key, &desc, &mut slot, false).expect("bool reads");
		slot
	};
	assert_eq!(read("One"), Slot::Bool(true));
	assert_eq!(read("Two"), Slot::Bool(true));
	assert_eq!(read("Three"), Slot::Bool(false));
	assert_eq!(read("Four"), Slot::Bool(false));
}

#[test]
fn unsupported_types_are_rejected() {
	let mut file = ConfigFile::default();
	let desc = TypeDesc::scalar(ScalarKind::Int64);
	let err = file
		.write_property("A", "Big", &desc, &Slot::Int(1), false)
		.expect_err("int64 is not storable");
	assert!(matches!(err, CodecError::UnsupportedConfigType { ref key, .. } if key == "Big"));

	let plain = TypeDesc::structure(Arc::new(StructDesc::new("Vector", vec![FieldDesc::new("X", int32())])));
	let mut slot = Slot::default_for(&plain);
	assert!(matches!(
		file.read_property("A", "V", &plain, &mut slot, false),
		Err(CodecError::UnsupportedConfigType { .. })
	));
}

#[test]
fn remove_key_reports_whether_lines_were_dropped() {
	let mut file = ConfigFile::parse("[A]\nK=1\nK=2\nL=3\n");
	assert!(file.remove_key("A", "K"));
	assert!(!file.remove_key("A", "K"));
	assert!(!file.remove_key("B", "L"));
	assert_eq!(file.to_string(), "[A]\nL=3\n");
}

#[test]
fn mismatched_storage_is_refused() {
	let mut file = ConfigFile::default();
	assert!(matches!(
		file.write_property("A", "K", &int32(), &Slot::Str("x".into()), false),
		Err(CodecError::StorageMismatch { .. })
	));
	assert_eq!(file.get("A", "K"), None);
}
