use std::fs;
use std::path::PathBuf;

use propdoc::codec::{Codec, DataTable, Result};

use crate::cmd::util::{load_registry, write_output};

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableFormat {
	Json,
	Csv,
}

#[derive(clap::Args)]
pub struct Args {
	/// Schema file declaring the row struct.
	pub schema: PathBuf,
	/// Row struct name.
	#[arg(long)]
	pub row: String,
	/// Column holding row names.
	#[arg(long)]
	pub key_field: Option<String>,
	#[arg(long, value_enum, default_value_t = TableFormat::Csv)]
	pub to: TableFormat,
	/// Output file; stdout when omitted.
	#[arg(long, short)]
	pub output: Option<PathBuf>,
	/// JSON array of row objects.
	pub input: PathBuf,
}

/// Import a JSON data table and export it as CSV or JSON.
pub fn run(args: Args) -> Result<()> {
	let Args {
		schema,
		row,
		key_field,
		to,
		output,
		input,
	} = args;

	let registry = load_registry(&schema)?;
	let row_struct = registry.get_struct(&row)?;
	let codec = Codec::new();
	let table = DataTable::from_json(row_struct, key_field.as_deref(), &fs::read_to_string(&input)?, &codec)?;

	let out = match to {
		TableFormat::Csv => table.to_csv(),
		TableFormat::Json => table.to_json(&codec)?,
	};
	write_output(output.as_ref(), out.trim_end())
}
