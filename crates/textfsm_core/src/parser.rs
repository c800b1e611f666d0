use std::collections::HashMap;
use std::str::FromStr;

use crate::CellValue;
use crate::CompileError;
use crate::CompileResult;
use crate::LineOp;
use crate::Rule;
use crate::Value;
use crate::rule::OPERATOR_WORDS;

/// Maximum length of a state name.
pub const MAX_STATE_NAME_LEN: usize = 32;

/// A named, ordered sequence of rules.
#[derive(Debug, Clone)]
pub struct State {
	pub name: String,
	pub rules: Vec<Rule>,
}

/// A compiled template: the declared values and the state machine driving
/// them.
///
/// Compilation is the only way to build one, so every invariant of the
/// template grammar holds on the compiled form: value and state names are
/// unique, every destination state exists, `Start` is present, and every
/// rule regex compiled with its value references expanded. A compiled
/// template is immutable and can drive any number of
/// [`ParserOutput`](crate::ParserOutput)s.
#[derive(Debug, Clone)]
pub struct TextFsm {
	/// Declared values, in declaration order.
	pub values: Vec<Value>,
	/// States by name. A declared empty `End` state is removed during
	/// validation; a declared `EOF` state is kept and suppresses the
	/// implicit end-of-input record.
	pub states: HashMap<String, State>,
}

impl TextFsm {
	/// Compile a template text into an executable state machine.
	pub fn compile(template: &str) -> CompileResult<Self> {
		let mut scanner = LineScanner::new(template);

		let values = parse_values(&mut scanner)?;
		if values.is_empty() {
			return Err(CompileError::NoValues);
		}

		let var_map: HashMap<String, CellValue> = values
			.iter()
			.map(|value| (value.name.clone(), CellValue::Text(value.template())))
			.collect();

		let mut states = parse_states(&mut scanner, &values, &var_map)?;
		validate(&mut states)?;

		Ok(Self { values, states })
	}

	/// Look up a declared value by name.
	pub fn value(&self, name: &str) -> Option<&Value> {
		self.values.iter().find(|value| value.name == name)
	}
}

impl FromStr for TextFsm {
	type Err = CompileError;

	fn from_str(template: &str) -> Result<Self, Self::Err> {
		Self::compile(template)
	}
}

/// Cursor over the template's lines, tracking 1-indexed line numbers for
/// diagnostics.
struct LineScanner<'a> {
	lines: Vec<&'a str>,
	cursor: usize,
}

impl<'a> LineScanner<'a> {
	fn new(text: &'a str) -> Self {
		Self {
			lines: text.lines().collect(),
			cursor: 0,
		}
	}

	fn peek(&self) -> Option<&'a str> {
		self.lines.get(self.cursor).copied()
	}

	fn line_num(&self) -> usize {
		self.cursor + 1
	}

	fn advance(&mut self) {
		self.cursor += 1;
	}
}

fn is_comment(line: &str) -> bool {
	line.trim_start().starts_with('#')
}

/// Parse the leading `Value` section, up to the first blank line.
fn parse_values(scanner: &mut LineScanner<'_>) -> CompileResult<Vec<Value>> {
	let mut values: Vec<Value> = Vec::new();

	while let Some(line) = scanner.peek() {
		if is_comment(line) {
			scanner.advance();
			continue;
		}

		if line.trim().is_empty() {
			scanner.advance();
			break;
		}

		if !line.starts_with("Value ") {
			return Err(CompileError::ExpectedValue {
				line: scanner.line_num(),
			});
		}

		let value = Value::parse(line, scanner.line_num())?;
		if values.iter().any(|existing| existing.name == value.name) {
			return Err(CompileError::DuplicateValue {
				name: value.name,
				line: scanner.line_num(),
			});
		}

		values.push(value);
		scanner.advance();
	}

	Ok(values)
}

/// Parse the state blocks. Each block is an unindented header followed by
/// indented rules; blank lines separate blocks.
fn parse_states(
	scanner: &mut LineScanner<'_>,
	values: &[Value],
	var_map: &HashMap<String, CellValue>,
) -> CompileResult<HashMap<String, State>> {
	let mut states: HashMap<String, State> = HashMap::new();

	loop {
		while let Some(line) = scanner.peek() {
			if line.trim().is_empty() || is_comment(line) {
				scanner.advance();
			} else {
				break;
			}
		}

		let Some(header) = scanner.peek() else {
			break;
		};
		let header_line = scanner.line_num();

		let valid_name = !header.is_empty()
			&& header.len() <= MAX_STATE_NAME_LEN
			&& header
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '_');
		if !valid_name {
			return Err(CompileError::InvalidStateName {
				name: header.to_owned(),
				line: header_line,
			});
		}
		if OPERATOR_WORDS.contains(&header) {
			return Err(CompileError::ReservedStateName {
				name: header.to_owned(),
				line: header_line,
			});
		}
		if states.contains_key(header) {
			return Err(CompileError::DuplicateState {
				name: header.to_owned(),
				line: header_line,
			});
		}
		scanner.advance();

		let mut rules = Vec::new();
		while let Some(line) = scanner.peek() {
			if line.trim().is_empty() {
				break;
			}
			if is_comment(line) {
				scanner.advance();
				continue;
			}

			let indented = line.starts_with(' ') || line.starts_with('\t');
			if !indented || !line.trim_start().starts_with('^') {
				return Err(CompileError::RuleIndent {
					line: scanner.line_num(),
				});
			}

			rules.push(Rule::parse(line, scanner.line_num(), values, var_map)?);
			scanner.advance();
		}

		states.insert(
			header.to_owned(),
			State {
				name: header.to_owned(),
				rules,
			},
		);
	}

	Ok(states)
}

/// Whole-template checks that need every state parsed: the `Start` entry
/// point, the emptiness of `End`/`EOF`, and destination resolution.
fn validate(states: &mut HashMap<String, State>) -> CompileResult<()> {
	if !states.contains_key("Start") {
		return Err(CompileError::MissingStart);
	}

	for name in ["End", "EOF"] {
		if let Some(state) = states.get(name) {
			if !state.rules.is_empty() {
				return Err(CompileError::StateNotEmpty {
					name: name.to_owned(),
				});
			}
		}
	}
	states.remove("End");

	let mut names: Vec<&String> = states.keys().collect();
	names.sort();

	for name in names {
		let state = &states[name];
		for rule in &state.rules {
			// An `Error` action never transitions; its word payload is a
			// message, not a destination.
			if rule.line_op == Some(LineOp::Error) {
				continue;
			}
			let Some(destination) = &rule.new_state else {
				continue;
			};
			if destination != "End" && destination != "EOF" && !states.contains_key(destination) {
				return Err(CompileError::UndefinedState {
					destination: destination.clone(),
					state: state.name.clone(),
				});
			}
		}
	}

	Ok(())
}
