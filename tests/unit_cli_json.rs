#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};

#[test]
fn convert_json_to_xml_and_back_is_stable() {
	let dir = tempfile::tempdir().expect("temp dir");
	let xml_path = dir.path().join("stall.xml");
	let json_path = dir.path().join("stall.json");

	let direct = run_json(&["convert", &schema(), "--type", "Stall", "--to", "json", &fixture("stall.json")]);

	run_ok(&["convert", &schema(), "--type", "Stall", "--output", &display(&xml_path), &fixture("stall.json")]);
	let xml = std::fs::read_to_string(&xml_path).expect("xml written");
	assert!(xml.starts_with("<?xml version='1.0' encoding='UTF-8' ?>\n<root>"), "{xml}");
	assert!(xml.contains("<Owner>Mira &amp; Sons</Owner>"), "{xml}");

	run_ok(&["convert", &schema(), "--type", "Stall", "--output", &display(&json_path), &display(&xml_path)]);
	let back: Value = serde_json::from_str(&std::fs::read_to_string(&json_path).expect("json written")).expect("valid json");

	assert_eq!(back, direct);
	assert_eq!(direct["Owner"], "Mira & Sons");
	assert_eq!(direct["Open"], false);
	assert_eq!(direct["Stock"], json!({"Lamp": 3, "Rope": 12}));
	assert_eq!(direct["Items"][1], json!({"Title": "Rope", "Grade": "Common", "Price": 10, "Tags": []}));
	assert_eq!(direct["Origin"], json!({"X": 1.5, "Y": -2.0, "Z": 0.0}));
}

#[test]
fn convert_allocates_referenced_objects() {
	let json = run_json(&["convert", &schema(), "--type", "Market", "--to", "json", &fixture("market.json")]);

	assert_eq!(json["Name"], "Harbour");
	assert_eq!(json["Stalls"][0]["Items"][0]["Title"], "Net");
	assert_eq!(json["Neighbour"], json!({"Name": "Upper Town", "Stalls": [], "Neighbour": null}));
}

#[test]
fn describe_json_lists_fields_with_authored_names() {
	let json = run_json(&["describe", &schema(), "--type", "Item", "--json"]);

	assert_eq!(json["kind"], "struct");
	let fields = json["fields"].as_array().expect("fields array");
	assert_eq!(fields.len(), 4);
	assert_eq!(fields[0], json!({"name": "title_0", "authored": "Title", "offset": 0, "type": "string", "default": "unnamed"}));
	assert_eq!(fields[1]["type"], "Quality");
	assert_eq!(fields[3]["type"], "set<name>");
}

#[test]
fn describe_json_lists_every_type() {
	let json = run_json(&["describe", &schema(), "--json"]);
	let types = json["types"].as_array().expect("types array");

	let market = types.iter().find(|item| item["name"] == "Market").expect("market listed");
	assert_eq!(market["kind"], "class");
	assert_eq!(market["fields"], 3);
	assert!(types.iter().any(|item| item["name"] == "Vector" && item["native"] == true));
}

#[test]
fn table_exports_csv() {
	let output = run_ok(&["table", &schema(), "--row", "Weapon", &fixture("weapons.json")]);
	let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
	assert_eq!(
		stdout,
		"---,Damage,Label,Grade\nsword,\"12\",\"Sharp \"\"one\"\"\",\"Epic\"\nclub,\"4\",\"\",\"Common\"\n"
	);
}

#[test]
fn unknown_type_fails_with_error_prefix() {
	let output = Command::new(env!("CARGO_BIN_EXE_propdoc"))
		.args(["convert", &schema(), "--type", "Nope", &fixture("stall.json")])
		.output()
		.expect("command executes");

	assert_eq!(output.status.code(), Some(1));
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("error: unknown type: Nope"), "{stderr}");
}

fn run_ok(args: &[&str]) -> Output {
	let output = Command::new(env!("CARGO_BIN_EXE_propdoc")).args(args).output().expect("command executes");
	assert!(output.status.success(), "command should succeed: {}", String::from_utf8_lossy(&output.stderr));
	output
}

fn run_json(args: &[&str]) -> Value {
	let output = run_ok(args);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

fn schema() -> String {
	fixture("shop.schema.json")
}

fn fixture(name: &str) -> String {
	display(&fixture_path(name))
}

fn display(path: &Path) -> String {
	path.display().to_string()
}

fn fixture_path(name: &str) -> PathBuf {
	Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}
