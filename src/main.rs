#![allow(missing_docs)]

use std::io;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "propdoc", about = "Schema-driven JSON and XML property documents")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Decode a document into a schema type and write it back out.
	Convert(cmd::convert::Args),
	/// Print the types of a schema.
	Describe(cmd::describe::Args),
	/// Convert a JSON data table to CSV or normalized JSON.
	Table(cmd::table::Args),
}

fn main() {
	tracing_subscriber::fmt()
		.with_writer(io::stderr)
		.with_target(false)
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.init();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> propdoc::codec::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Convert(args) => cmd::convert::run(args),
		Commands::Describe(args) => cmd::describe::run(args),
		Commands::Table(args) => cmd::table::run(args),
	}
}
