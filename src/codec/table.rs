use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::codec::desc::{FieldDesc, StructDesc, TypeDesc};
use crate::codec::json::{self, JsonStyle};
use crate::codec::slot::{Slot, StructData};
use crate::codec::text::{export_text, import_text};
use crate::codec::{Codec, CodecError, PropertyFallback, Result};

/// Key column name used when a table names none.
pub const DEFAULT_KEY_FIELD: &str = "Name";

/// One named row of a [`DataTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
	/// Unique row name.
	pub name: String,
	/// Row struct storage.
	pub data: StructData,
}

/// Ordered, keyed rows sharing one row struct.
#[derive(Debug, Clone)]
pub struct DataTable {
	/// Layout of every row.
	pub row_struct: Arc<StructDesc>,
	/// Column holding row names; [`DEFAULT_KEY_FIELD`] when unset.
	pub import_key_field: Option<String>,
	rows: Vec<TableRow>,
}

impl DataTable {
	/// Empty table.
	pub fn new(row_struct: Arc<StructDesc>) -> Self {
		Self {
			row_struct,
			import_key_field: None,
			rows: Vec::new(),
		}
	}

	/// Builder form setting [`DataTable::import_key_field`].
	pub fn with_key_field(mut self, key_field: impl Into<String>) -> Self {
		self.import_key_field = Some(key_field.into());
		self
	}

	/// Name of the key column.
	pub fn key_field_name(&self) -> &str {
		self.import_key_field.as_deref().filter(|name| !name.is_empty()).unwrap_or(DEFAULT_KEY_FIELD)
	}

	/// Insert a row, replacing an existing row of the same name in place.
	pub fn add_row(&mut self, name: impl Into<String>, data: StructData) {
		let name = name.into();
		match self.rows.iter_mut().find(|row| row.name == name) {
			Some(row) => row.data = data,
			None => self.rows.push(TableRow { name, data }),
		}
	}

	/// Row storage by name.
	pub fn row(&self, name: &str) -> Option<&StructData> {
		self.rows.iter().find(|row| row.name == name).map(|row| &row.data)
	}

	/// Rows in insertion order.
	pub fn rows(&self) -> &[TableRow] {
		&self.rows
	}

	fn key_field(&self) -> Option<&FieldDesc> {
		let key = self.import_key_field.as_deref()?;
		self.row_struct.fields().iter().find(|field| field.authored_name() == key)
	}

	fn value_fields(&self) -> impl Iterator<Item = &FieldDesc> {
		let key = self.key_field().map(|field| field.offset);
		self.row_struct.fields().iter().filter(move |field| Some(field.offset) != key)
	}

	/// Flatten the table to CSV.
	///
	/// The header starts with the key field name, or `---` when the table has
	/// no explicit key field, followed by one column per field. A field named
	/// like the key field is written only as the row name column.
	pub fn to_csv(&self) -> String {
		let mut out = String::from(self.import_key_field.as_deref().filter(|name| !name.is_empty()).unwrap_or("---"));
		for field in self.value_fields() {
			out.push(',');
			out.push_str(field.authored_name());
		}
		out.push('\n');

		for row in &self.rows {
			out.push_str(&row.name);
			for field in self.value_fields() {
				let text = row.data.field(field).map(|slot| export_text(&field.ty, slot)).unwrap_or_default();
				out.push_str(",\"");
				out.push_str(&text.replace('"', "\"\""));
				out.push('"');
			}
			out.push('\n');
		}
		out
	}

	/// Pretty JSON array of row objects, key field first.
	pub fn to_json<F: PropertyFallback>(&self, codec: &Codec<F>) -> Result<String> {
		let key = self.key_field_name();
		let rows = self
			.rows
			.iter()
			.map(|row| {
				let mut object = Map::new();
				object.insert(key.to_owned(), Value::String(row.name.clone()));
				for (name, value) in codec.encode_struct(&self.row_struct, &row.data) {
					if name != key {
						object.insert(name, value);
					}
				}
				Value::Object(object)
			})
			.collect();
		json::to_string(&Value::Array(rows), JsonStyle::Pretty)
	}

	/// Rebuild a table from a JSON array of row objects.
	///
	/// Every row is attempted; rows without a name, duplicate names and rows
	/// that fail to decode are reported together.
	pub fn from_json<F: PropertyFallback>(row_struct: Arc<StructDesc>, key_field: Option<&str>, text: &str, codec: &Codec<F>) -> Result<Self> {
		let mut table = Self::new(row_struct);
		table.import_key_field = key_field.map(str::to_owned);
		let key = table.key_field_name().to_owned();
		let desc = TypeDesc::Struct(table.row_struct.clone());

		let items = match json::from_str(text)? {
			Value::Array(items) => items,
			other => {
				return Err(CodecError::TableImport {
					problems: vec![format!("expected an array of rows, got {}", json::kind_label(&other))],
				});
			}
		};

		let mut problems = Vec::new();
		let mut seen = HashSet::new();
		for (index, item) in items.iter().enumerate() {
			let Value::Object(object) = item else {
				problems.push(format!("row {index}: expected object, got {}", json::kind_label(item)));
				continue;
			};
			let name = match object.get(&key) {
				Some(Value::String(name)) if !name.is_empty() => name.clone(),
				Some(Value::Number(number)) => number.to_string(),
				_ => {
					problems.push(format!("row {index}: missing key field {key}"));
					continue;
				}
			};
			if !seen.insert(name.clone()) {
				problems.push(format!("row {index}: duplicate row name {name}"));
				continue;
			}

			let mut data = table.row_struct.default_data();
			let resolved = codec.resolve_names(&desc, item);
			if let Err(err) = codec.decode_struct(&resolved, &table.row_struct, &mut data) {
				problems.push(format!("row {name}: {err}"));
				continue;
			}
			table.rows.push(TableRow { name, data });
		}

		table.finish_import(problems)
	}

	/// Rebuild a table from CSV text with a header row.
	///
	/// The first column holds row names; the rest are matched to fields by
	/// authored name, then internal name. Cells are property text.
	pub fn from_csv(row_struct: Arc<StructDesc>, key_field: Option<&str>, text: &str) -> Result<Self> {
		let mut table = Self::new(row_struct);
		table.import_key_field = key_field.map(str::to_owned);

		let mut records = parse_csv(text).into_iter();
		let Some(header) = records.next() else {
			return Err(CodecError::EmptyDocument);
		};

		let mut problems = Vec::new();
		let columns: Vec<Option<FieldDesc>> = header
			.iter()
			.skip(1)
			.map(|name| {
				let field = table.row_struct.field(name.trim()).cloned();
				if field.is_none() {
					problems.push(format!("column {name}: no field of {} has this name", table.row_struct.name));
				}
				field
			})
			.collect();
		let key_field = table.key_field().cloned();

		let mut seen = HashSet::new();
		for (index, record) in records.enumerate() {
			let line = index + 2;
			let Some(name) = record.first().map(|name| name.trim().to_owned()).filter(|name| !name.is_empty()) else {
				problems.push(format!("line {line}: missing row name"));
				continue;
			};
			if !seen.insert(name.clone()) {
				problems.push(format!("line {line}: duplicate row name {name}"));
				continue;
			}
			if record.len() - 1 > columns.len() {
				warn!(line, cells = record.len(), columns = columns.len() + 1, "extra csv cells ignored");
			}

			let mut data = table.row_struct.default_data();
			let mut ok = true;
			if let Some(field) = &key_field {
				ok &= import_cell(&mut data, field, &name, line, &mut problems);
			}
			for (cell, field) in record.iter().skip(1).zip(&columns) {
				if let Some(field) = field {
					ok &= import_cell(&mut data, field, cell, line, &mut problems);
				}
			}
			if ok {
				table.rows.push(TableRow { name, data });
			}
		}

		table.finish_import(problems)
	}

	fn finish_import(self, problems: Vec<String>) -> Result<Self> {
		if problems.is_empty() {
			debug!(rows = self.rows.len(), row_struct = %self.row_struct.name, "table imported");
			Ok(self)
		} else {
			for problem in &problems {
				warn!(%problem, "table import problem");
			}
			Err(CodecError::TableImport { problems })
		}
	}
}

fn import_cell(data: &mut StructData, field: &FieldDesc, text: &str, line: usize, problems: &mut Vec<String>) -> bool {
	let mut slot = data.field(field).cloned().unwrap_or_else(|| Slot::default_for(&field.ty));
	match import_text(&field.ty, &mut slot, text) {
		Ok(()) => {
			data.set(field, slot);
			true
		}
		Err(err) => {
			problems.push(format!("line {line}, column {}: {err}", field.authored_name()));
			false
		}
	}
}

/// Split CSV text into records; quoted cells may hold commas, newlines and `""`.
fn parse_csv(text: &str) -> Vec<Vec<String>> {
	let mut records = Vec::new();
	let mut record = Vec::new();
	let mut cell = String::new();
	let mut quoted = false;
	let mut chars = text.chars().peekable();

	while let Some(ch) = chars.next() {
		match ch {
			'"' if quoted => {
				if chars.peek() == Some(&'"') {
					chars.next();
					cell.push('"');
				} else {
					quoted = false;
				}
			}
			'"' if cell.is_empty() => quoted = true,
			',' if !quoted => record.push(std::mem::take(&mut cell)),
			'\r' if !quoted => {}
			'\n' if !quoted => {
				record.push(std::mem::take(&mut cell));
				if !(record.len() == 1 && record[0].is_empty()) {
					records.push(std::mem::take(&mut record));
				}
				record.clear();
			}
			_ => cell.push(ch),
		}
	}
	if !cell.is_empty() || !record.is_empty() {
		record.push(cell);
		records.push(record);
	}
	records
}
