use std::error::Error;
use std::io::Read;
use std::path::Path;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use textfsm_cli::Commands;
use textfsm_cli::OutputFormat;
use textfsm_cli::TextFsmCli;
use textfsm_core::CompileError;
use textfsm_core::ParserOutput;
use textfsm_core::RunError;
use textfsm_core::TextFsm;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

type AnyResult<T> = Result<T, Box<dyn Error>>;

fn main() {
	let args = TextFsmCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match args.command {
		Some(Commands::Parse {
			template,
			input,
			format,
		}) => run_parse(&template, input.as_deref(), format),
		Some(Commands::Check { template }) => run_check(&template),
		None => {
			eprintln!("No subcommand specified. Run `textfsm --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(error) = result {
		// Render through miette for diagnostics with help text and codes.
		let error = match error.downcast::<CompileError>() {
			Ok(compile_error) => {
				let report: miette::Report = (*compile_error).into();
				eprintln!("{report:?}");
				process::exit(2);
			}
			Err(error) => error,
		};
		match error.downcast::<RunError>() {
			Ok(run_error) => {
				let report: miette::Report = (*run_error).into();
				eprintln!("{report:?}");
			}
			Err(error) => {
				eprintln!("{} {error}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn load_template(path: &Path) -> AnyResult<TextFsm> {
	let text = std::fs::read_to_string(path)?;
	let fsm = TextFsm::compile(&text)?;
	Ok(fsm)
}

fn run_parse(template: &Path, input: Option<&Path>, format: OutputFormat) -> AnyResult<()> {
	let fsm = load_template(template)?;

	let text = match input {
		Some(path) => std::fs::read_to_string(path)?,
		None => {
			let mut buffer = String::new();
			std::io::stdin().read_to_string(&mut buffer)?;
			buffer
		}
	};

	let mut output = ParserOutput::new(&fsm);
	output.parse(&text, &fsm, true)?;

	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output.records)?),
		OutputFormat::Text => print_text(&fsm, &output),
	}

	Ok(())
}

fn print_text(fsm: &TextFsm, output: &ParserOutput) {
	if output.records.is_empty() {
		println!("no records");
		return;
	}

	let width = fsm
		.values
		.iter()
		.map(|value| value.name.len())
		.max()
		.unwrap_or_default();

	for (index, record) in output.records.iter().enumerate() {
		println!("{}", colored!(format!("record {index}"), bold));
		for value in &fsm.values {
			println!("  {:<width$} = {}", value.name, record[&value.name]);
		}
	}
}

fn run_check(template: &Path) -> AnyResult<()> {
	let fsm = load_template(template)?;
	println!(
		"{} {} value(s), {} state(s)",
		colored!("template ok:", green),
		fsm.values.len(),
		fsm.states.len()
	);
	Ok(())
}
