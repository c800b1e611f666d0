use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use derive_more::Display;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::CompileError;
use crate::CompileResult;

/// Maximum length of a value name.
pub const MAX_VALUE_NAME_LEN: usize = 48;

/// A behavior flag attached to a [`Value`] declaration.
///
/// Options combine freely (`Value Filldown,Required Wine (...)`) but may not
/// repeat. Unknown option words fail template compilation.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ValueOption {
	/// Suppress a record at emission time unless this value resolved
	/// non-empty.
	Required,
	/// Carry the last non-empty content forward across records until
	/// overwritten or wiped by `Clearall`.
	Filldown,
	/// Back-fill earlier emitted records whose cell for this value was still
	/// empty whenever new non-empty content is assigned.
	Fillup,
	/// Accumulate every match into an ordered list instead of overwriting a
	/// single cell.
	List,
	/// Marks the value as part of the record's identity. Parsed and carried
	/// on the declaration; no runtime effect.
	Key,
}

impl FromStr for ValueOption {
	type Err = ();

	fn from_str(input: &str) -> Result<Self, Self::Err> {
		match input {
			"Required" => Ok(Self::Required),
			"Filldown" => Ok(Self::Filldown),
			"Fillup" => Ok(Self::Fillup),
			"List" => Ok(Self::List),
			"Key" => Ok(Self::Key),
			_ => Err(()),
		}
	}
}

/// A named capture declared by a `Value` line of the template.
///
/// The regex source keeps its outermost parentheses; rules reference the
/// value as `$name` / `${name}` and receive the regex with the outer group
/// converted to `(?P<name>...)`. Named groups nested inside the regex turn
/// the value's cell into a mapping from group name to captured text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
	/// The identifier rules use to reference this value.
	pub name: String,
	/// The regex source, including the outer parentheses.
	pub regex: String,
	/// Option flags in declaration order.
	pub options: Vec<ValueOption>,
	/// Names of the named capture groups nested inside the regex.
	pub(crate) inner_groups: Vec<String>,
}

impl Value {
	/// Parse a `Value [options] NAME (REGEX)` declaration line.
	pub fn parse(line: &str, line_num: usize) -> CompileResult<Self> {
		let tokens: Vec<&str> = line.split_whitespace().collect();
		if tokens.len() < 3 || tokens[0] != "Value" {
			return Err(CompileError::ValueSyntax { line: line_num });
		}

		// Options are positional: a third token opening a group means the
		// second token is already the name.
		let (options, name, regex) = if tokens[2].starts_with('(') {
			(Vec::new(), tokens[1], tokens[2..].join(" "))
		} else {
			(
				parse_options(tokens[1], line_num)?,
				tokens[2],
				tokens[3..].join(" "),
			)
		};

		if name.len() > MAX_VALUE_NAME_LEN {
			return Err(CompileError::ValueNameTooLong {
				name: name.to_owned(),
				max: MAX_VALUE_NAME_LEN,
				line: line_num,
			});
		}

		if !regex.starts_with('(') || !regex.ends_with(')') {
			return Err(CompileError::ValueRegexParens { line: line_num });
		}

		// Compiling the bare source validates balance, quantifiers and
		// duplicate inner group names in one go. The named template is only
		// compiled where a rule actually references the value.
		let compiled = Regex::new(&regex).map_err(|source| {
			CompileError::InvalidRegex {
				line: line_num,
				source: Box::new(source),
			}
		})?;
		let inner_groups = compiled
			.capture_names()
			.flatten()
			.map(str::to_owned)
			.collect();

		Ok(Self {
			name: name.to_owned(),
			regex,
			options,
			inner_groups,
		})
	}

	pub fn has_option(&self, option: ValueOption) -> bool {
		self.options.contains(&option)
	}

	pub(crate) fn is_list(&self) -> bool {
		self.has_option(ValueOption::List)
	}

	pub(crate) fn is_filldown(&self) -> bool {
		self.has_option(ValueOption::Filldown)
	}

	pub(crate) fn has_inner_groups(&self) -> bool {
		!self.inner_groups.is_empty()
	}

	/// The regex with the outer group named after the value, as substituted
	/// into rule patterns.
	pub(crate) fn template(&self) -> String {
		format!("(?P<{}>{}", self.name, &self.regex[1..])
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Value ")?;
		if !self.options.is_empty() {
			let options: Vec<String> = self.options.iter().map(ToString::to_string).collect();
			write!(f, "{} ", options.join(","))?;
		}
		write!(f, "{} {}", self.name, self.regex)
	}
}

fn parse_options(token: &str, line_num: usize) -> CompileResult<Vec<ValueOption>> {
	let mut options = Vec::new();

	for part in token.split(',') {
		let Ok(option) = part.parse::<ValueOption>() else {
			return Err(CompileError::UnknownOption {
				option: part.to_owned(),
				line: line_num,
			});
		};

		if options.contains(&option) {
			return Err(CompileError::DuplicateOption {
				option: part.to_owned(),
				line: line_num,
			});
		}

		options.push(option);
	}

	Ok(options)
}

/// The content held for one value, in the shape dictated by its declaration:
/// scalars for plain regexes, mappings when the regex declares inner named
/// groups, and lists of either when the `List` option is present.
///
/// Serialization is untagged, so records serialize to the natural JSON
/// (`"eth0"`, `{"name": "Bob"}`, `["USA", "Canada"]`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum CellValue {
	/// A single captured string.
	Text(String),
	/// Captures of the value's inner named groups, keyed by group name.
	Map(HashMap<String, String>),
	/// Every captured string, in match order.
	TextList(Vec<String>),
	/// Inner-group captures of every match, in match order.
	MapList(Vec<HashMap<String, String>>),
}

impl CellValue {
	/// Whether the cell counts as empty for `Required` checks and record
	/// suppression: the empty string, mapping or list.
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Text(text) => text.is_empty(),
			Self::Map(map) => map.is_empty(),
			Self::TextList(items) => items.is_empty(),
			Self::MapList(items) => items.is_empty(),
		}
	}
}

impl fmt::Display for CellValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Text(text) => f.write_str(text),
			Self::Map(map) => {
				let mut entries: Vec<(&String, &String)> = map.iter().collect();
				entries.sort();
				let entries: Vec<String> =
					entries.iter().map(|(k, v)| format!("{k}: {v}")).collect();
				write!(f, "{{{}}}", entries.join(", "))
			}
			Self::TextList(items) => write!(f, "[{}]", items.join(", ")),
			Self::MapList(items) => {
				let items: Vec<String> = items
					.iter()
					.map(|map| Self::Map(map.clone()).to_string())
					.collect();
				write!(f, "[{}]", items.join(", "))
			}
		}
	}
}

/// One emitted result row: every declared value, keyed by name.
pub type Record = HashMap<String, CellValue>;
