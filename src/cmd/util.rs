use std::fs;
use std::path::{Path, PathBuf};

use propdoc::codec::{Result, SchemaDoc, TypeRegistry};
use serde::Serialize;

/// Document text format.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocFormat {
	Json,
	Xml,
}

impl DocFormat {
	/// Guess from a file extension; anything but `.xml` reads as JSON.
	pub(crate) fn from_path(path: &Path) -> Self {
		match path.extension().and_then(|ext| ext.to_str()) {
			Some(ext) if ext.eq_ignore_ascii_case("xml") => Self::Xml,
			_ => Self::Json,
		}
	}

	pub(crate) fn other(self) -> Self {
		match self {
			Self::Json => Self::Xml,
			Self::Xml => Self::Json,
		}
	}
}

/// Load a schema file and build its registry.
pub(crate) fn load_registry(path: &Path) -> Result<TypeRegistry> {
	SchemaDoc::load(path)?.build()
}

/// Write command output to `output`, or stdout when unset.
pub(crate) fn write_output(output: Option<&PathBuf>, text: &str) -> Result<()> {
	match output {
		Some(path) => fs::write(path, text)?,
		None => println!("{text}"),
	}
	Ok(())
}

/// Print a serializable payload as pretty JSON.
pub(crate) fn emit_json<T: Serialize>(payload: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(payload)?);
	Ok(())
}
