use std::fs;
use std::path::PathBuf;

use propdoc::codec::{Applied, Codec, JsonStyle, Result, Slot};
use tracing::{info, warn};

use crate::cmd::util::{DocFormat, load_registry, write_output};

#[derive(clap::Args)]
pub struct Args {
	/// Schema file describing the document type.
	pub schema: PathBuf,
	/// Type of the document root.
	#[arg(long = "type")]
	pub type_name: String,
	/// Input format; guessed from the file extension when omitted.
	#[arg(long, value_enum)]
	pub from: Option<DocFormat>,
	/// Output format; the other format when omitted.
	#[arg(long, value_enum)]
	pub to: Option<DocFormat>,
	/// Single-line JSON output.
	#[arg(long)]
	pub condensed: bool,
	/// Output file; stdout when omitted.
	#[arg(long, short)]
	pub output: Option<PathBuf>,
	pub input: PathBuf,
}

/// Decode `input` into a default instance of the type and re-encode it.
pub fn run(args: Args) -> Result<()> {
	let Args {
		schema,
		type_name,
		from,
		to,
		condensed,
		output,
		input,
	} = args;

	let registry = load_registry(&schema)?;
	let desc = registry.get_type(&type_name)?;
	let from = from.unwrap_or_else(|| DocFormat::from_path(&input));
	let to = to.unwrap_or(from.other());

	let text = fs::read_to_string(&input)?;
	let mut codec = Codec::new();
	codec.fallback_mut().register_classes(&registry);
	let mut slot = Slot::default_for(&desc);
	let applied = match from {
		DocFormat::Json => codec.json_string_to_struct(&desc, &mut slot, &text)?,
		DocFormat::Xml => codec.xml_string_to_struct(&desc, &mut slot, &text)?,
	};
	if applied == Applied::Nothing {
		warn!(input = %input.display(), "document is empty, writing defaults");
	}
	info!(input = %input.display(), ty = %type_name, ?from, ?to, "converting");

	let out = match to {
		DocFormat::Json => {
			let style = if condensed { JsonStyle::Condensed } else { JsonStyle::Pretty };
			codec.struct_to_json_string_with(&desc, &slot, style)?
		}
		DocFormat::Xml => codec.struct_to_xml_string(&desc, &slot),
	};
	write_output(output.as_ref(), &out)
}
