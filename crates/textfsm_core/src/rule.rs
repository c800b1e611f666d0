use std::collections::HashMap;
use std::fmt;

use derive_more::Display;
use logos::Logos;
use regex::Regex;
use snailquote::unescape;

use crate::CellValue;
use crate::CompileError;
use crate::CompileResult;
use crate::Value;
use crate::subst::substitute;

/// The operator words; none of them may name a state.
pub(crate) const OPERATOR_WORDS: [&str; 7] = [
	"Next",
	"Continue",
	"Error",
	"Record",
	"NoRecord",
	"Clear",
	"Clearall",
];

/// What happens to the input cursor after a rule fires.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LineOp {
	/// Stop rule processing for this line and move to the next one.
	Next,
	/// Keep walking the remaining rules of the state against the same line.
	Continue,
	/// Abort the parse with a runtime error.
	Error,
}

impl LineOp {
	fn from_word(word: &str) -> Option<Self> {
		match word {
			"Next" => Some(Self::Next),
			"Continue" => Some(Self::Continue),
			"Error" => Some(Self::Error),
			_ => None,
		}
	}
}

/// What happens to the record under construction after a rule fires.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordOp {
	/// Emit the current record, then clear the working cells.
	Record,
	/// Leave the record untouched.
	NoRecord,
	/// Clear every cell not held by `Filldown`.
	Clear,
	/// Clear every cell, `Filldown` holds included.
	Clearall,
}

impl RecordOp {
	fn from_word(word: &str) -> Option<Self> {
		match word {
			"Record" => Some(Self::Record),
			"NoRecord" => Some(Self::NoRecord),
			"Clear" => Some(Self::Clear),
			"Clearall" => Some(Self::Clearall),
			_ => None,
		}
	}
}

/// Raw tokens of a rule action (the part after ` -> `).
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t]+")]
enum ActionToken {
	#[token(".")]
	Dot,
	#[regex(r"[A-Za-z0-9_]+")]
	Word,
	#[regex(r#""([^"\\]|\\.)*""#)]
	Quoted,
}

/// One `^`-anchored line matcher of a state, with its operators.
///
/// The stored [`pattern`](Rule::pattern) is the source form (value references
/// unexpanded); the compiled regex has every `$name` / `${name}` reference
/// replaced by the value's named regex at compile time.
#[derive(Debug, Clone)]
pub struct Rule {
	/// The match pattern as written, including the leading `^`.
	pub pattern: String,
	/// Explicit line operator, if the action named one.
	pub line_op: Option<LineOp>,
	/// Explicit record operator, if the action named one.
	pub record_op: Option<RecordOp>,
	/// Destination state (or the bare word after `Error`).
	pub new_state: Option<String>,
	/// Unquoted message payload of an `Error "..."` action.
	pub error_message: Option<String>,
	/// The expanded and compiled match regex.
	pub(crate) regex: Regex,
	/// 1-indexed template line this rule was declared on.
	pub(crate) line_num: usize,
	/// Indices of the values bound by this rule's named capture groups.
	pub(crate) bound_values: Vec<usize>,
}

impl Rule {
	/// Parse one rule line. `values` are the declared values in order and
	/// `var_map` their named regex templates for `$`-expansion.
	pub(crate) fn parse(
		line: &str,
		line_num: usize,
		values: &[Value],
		var_map: &HashMap<String, CellValue>,
	) -> CompileResult<Self> {
		let trimmed = line.trim();
		if trimmed.is_empty() {
			return Err(CompileError::RuleIndent { line: line_num });
		}

		// The action is split off at the last `->` preceded by whitespace;
		// exactly one whitespace character before the arrow is consumed, the
		// rest of the left side stays part of the pattern.
		let mut split_at = None;
		for (idx, _) in trimmed.match_indices("->") {
			if idx > 0 && trimmed.as_bytes()[idx - 1].is_ascii_whitespace() {
				split_at = Some(idx);
			}
		}

		let (pattern, action) = match split_at {
			Some(idx) => (&trimmed[..idx - 1], trimmed[idx + 2..].trim()),
			None => (trimmed, ""),
		};

		let (line_op, record_op, new_state, error_message) = parse_action(action, line_num)?;

		if line_op == Some(LineOp::Continue) && new_state.is_some() {
			return Err(CompileError::ContinueDestination { line: line_num });
		}

		let expanded = substitute(pattern, var_map);
		let regex = Regex::new(&expanded).map_err(|source| {
			CompileError::InvalidRegex {
				line: line_num,
				source: Box::new(source),
			}
		})?;

		let bound_values = regex
			.capture_names()
			.flatten()
			.filter_map(|name| values.iter().position(|value| value.name == name))
			.collect();

		Ok(Self {
			pattern: pattern.to_owned(),
			line_op,
			record_op,
			new_state,
			error_message,
			regex,
			line_num,
			bound_values,
		})
	}

	pub(crate) fn is_continue(&self) -> bool {
		self.line_op == Some(LineOp::Continue)
	}
}

type ParsedAction = (
	Option<LineOp>,
	Option<RecordOp>,
	Option<String>,
	Option<String>,
);

fn parse_action(action: &str, line_num: usize) -> CompileResult<ParsedAction> {
	let mut line_op = None;
	let mut record_op = None;
	let mut new_state: Option<String> = None;
	let mut error_message: Option<String> = None;

	if action.is_empty() {
		return Ok((line_op, record_op, new_state, error_message));
	}

	let bad_action = || {
		CompileError::RuleAction {
			action: action.to_owned(),
			line: line_num,
		}
	};

	let mut tokens = Vec::new();
	for (token, span) in ActionToken::lexer(action).spanned() {
		let Ok(token) = token else {
			return Err(bad_action());
		};
		tokens.push((token, &action[span]));
	}

	// A leading `LineOp.RecordOp` pair, or a single operator word. A word
	// that is neither operator falls through as a destination.
	let mut idx = 0;
	if tokens.len() >= 3
		&& tokens[0].0 == ActionToken::Word
		&& tokens[1].0 == ActionToken::Dot
		&& tokens[2].0 == ActionToken::Word
	{
		// Only `Next` and `Continue` pair with a record operator; `Error`
		// takes no `.RecordOp` suffix.
		let paired = match LineOp::from_word(tokens[0].1) {
			Some(op @ (LineOp::Next | LineOp::Continue)) => op,
			_ => return Err(bad_action()),
		};
		line_op = Some(paired);
		record_op = Some(RecordOp::from_word(tokens[2].1).ok_or_else(bad_action)?);
		idx = 3;
	} else if let Some((ActionToken::Word, word)) = tokens.first() {
		if let Some(op) = LineOp::from_word(word) {
			line_op = Some(op);
			idx = 1;
		} else if let Some(op) = RecordOp::from_word(word) {
			record_op = Some(op);
			idx = 1;
		}
	}

	while idx < tokens.len() {
		match tokens[idx] {
			(ActionToken::Word, word) => {
				if new_state.is_some() || error_message.is_some() {
					return Err(bad_action());
				}
				new_state = Some(word.to_owned());
			}
			(ActionToken::Quoted, quoted) => {
				if line_op != Some(LineOp::Error) || new_state.is_some() || error_message.is_some()
				{
					return Err(CompileError::UnexpectedMessage { line: line_num });
				}
				error_message = Some(unquote(quoted).ok_or_else(bad_action)?);
			}
			(ActionToken::Dot, _) => return Err(bad_action()),
		}
		idx += 1;
	}

	Ok((line_op, record_op, new_state, error_message))
}

/// Strip the surrounding quotes and interpret backslash escapes.
fn unquote(quoted: &str) -> Option<String> {
	let inner = &quoted[1..quoted.len() - 1];

	if inner.contains('\\') {
		unescape(inner).ok()
	} else {
		Some(inner.to_owned())
	}
}

impl fmt::Display for Rule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, " {}", self.pattern)?;

		if self.line_op.is_none()
			&& self.record_op.is_none()
			&& self.new_state.is_none()
			&& self.error_message.is_none()
		{
			return Ok(());
		}

		write!(f, " ->")?;
		match (self.line_op, self.record_op) {
			(Some(line_op), Some(record_op)) => write!(f, " {line_op}.{record_op}")?,
			(Some(line_op), None) => write!(f, " {line_op}")?,
			(None, Some(record_op)) => write!(f, " {record_op}")?,
			(None, None) => {}
		}
		if let Some(state) = &self.new_state {
			write!(f, " {state}")?;
		}
		if let Some(message) = &self.error_message {
			write!(f, " \"{message}\"")?;
		}

		Ok(())
	}
}
