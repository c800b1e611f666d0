use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Convert semi-structured text into records using a template-driven state machine.",
	long_about = "textfsm compiles a declarative template (value captures plus a state machine \
	              of regex rules) and drives input text through it, emitting one structured \
	              record per matched row.\n\nQuick start:\n  textfsm check --template \
	              show_version.textfsm           Validate a template\n  textfsm parse --template \
	              show_version.textfsm out.txt   Parse a captured output file"
)]
pub struct TextFsmCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Parse input text through a template and print the emitted records.
	///
	/// Reads the input file (or stdin when omitted), feeds it through the
	/// compiled template in one pass, and prints every record. Use
	/// `--format json` for programmatic consumption; the text format prints
	/// one aligned `name = value` block per record.
	Parse {
		/// Path to the template file.
		#[arg(long, short)]
		template: PathBuf,

		/// Input file to parse. Reads stdin when omitted.
		input: Option<PathBuf>,

		/// Output format for the emitted records.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Compile a template and report the first defect, if any.
	///
	/// Exits with a non-zero status code when the template does not
	/// compile, printing the offending line and cause. Ideal for CI
	/// pipelines that keep template collections healthy.
	Check {
		/// Path to the template file.
		#[arg(long, short)]
		template: PathBuf,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output, one block per record.
	Text,
	/// JSON output: an array of records with natural value shapes.
	Json,
}
