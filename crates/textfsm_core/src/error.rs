use miette::Diagnostic;
use thiserror::Error;

/// Structural or semantic defects detected while compiling a template.
/// Each variant carries the 1-indexed template line it was detected on.
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum CompileError {
	#[error("line {line}: expected `Value [options] name (regex)`")]
	#[diagnostic(
		code(textfsm::value_syntax),
		help("value declarations look like `Value Filldown interface (\\S+)`")
	)]
	ValueSyntax { line: usize },

	#[error("line {line}: unknown value option `{option}`")]
	#[diagnostic(
		code(textfsm::unknown_option),
		help("available options: Required, Filldown, Fillup, List, Key")
	)]
	UnknownOption { option: String, line: usize },

	#[error("line {line}: value option `{option}` given more than once")]
	#[diagnostic(code(textfsm::duplicate_option))]
	DuplicateOption { option: String, line: usize },

	#[error("line {line}: value name `{name}` is longer than {max} characters")]
	#[diagnostic(code(textfsm::value_name_too_long))]
	ValueNameTooLong { name: String, max: usize, line: usize },

	#[error("line {line}: value regex must be wrapped in parentheses")]
	#[diagnostic(
		code(textfsm::value_regex_parens),
		help("the outermost parentheses are part of the stored regex: `(\\d+)`")
	)]
	ValueRegexParens { line: usize },

	#[error("line {line}: duplicate value `{name}`")]
	#[diagnostic(code(textfsm::duplicate_value))]
	DuplicateValue { name: String, line: usize },

	#[error("template declares no values")]
	#[diagnostic(
		code(textfsm::no_values),
		help("at least one `Value` line must precede the state definitions")
	)]
	NoValues,

	#[error("line {line}: expected a blank line or a `Value` declaration")]
	#[diagnostic(code(textfsm::expected_value))]
	ExpectedValue { line: usize },

	#[error("line {line}: invalid state name `{name}`")]
	#[diagnostic(
		code(textfsm::invalid_state_name),
		help("state names are `[A-Za-z0-9_]+`, at most 32 characters, and unindented")
	)]
	InvalidStateName { name: String, line: usize },

	#[error("line {line}: `{name}` is a reserved word and cannot name a state")]
	#[diagnostic(code(textfsm::reserved_state_name))]
	ReservedStateName { name: String, line: usize },

	#[error("line {line}: duplicate state `{name}`")]
	#[diagnostic(code(textfsm::duplicate_state))]
	DuplicateState { name: String, line: usize },

	#[error("template has no `Start` state")]
	#[diagnostic(code(textfsm::missing_start))]
	MissingStart,

	#[error("state `{name}` must not contain rules")]
	#[diagnostic(
		code(textfsm::state_not_empty),
		help("`End` and `EOF` carry implicit behavior and must be declared empty")
	)]
	StateNotEmpty { name: String },

	#[error("line {line}: rules must be indented and start with `^`")]
	#[diagnostic(code(textfsm::rule_indent))]
	RuleIndent { line: usize },

	#[error("line {line}: invalid rule action `{action}`")]
	#[diagnostic(
		code(textfsm::rule_action),
		help("actions look like `Next`, `Continue.Record`, `Record State1` or `Error \"msg\"`")
	)]
	RuleAction { action: String, line: usize },

	#[error("line {line}: `Continue` cannot change state")]
	#[diagnostic(code(textfsm::continue_destination))]
	ContinueDestination { line: usize },

	#[error("line {line}: only `Error` accepts a quoted string")]
	#[diagnostic(code(textfsm::unexpected_message))]
	UnexpectedMessage { line: usize },

	#[error("line {line}: invalid regex: {source}")]
	#[diagnostic(code(textfsm::invalid_regex))]
	InvalidRegex {
		line: usize,
		source: Box<regex::Error>,
	},

	#[error("state `{destination}` referenced from `{state}` is not defined")]
	#[diagnostic(code(textfsm::undefined_state))]
	UndefinedState { destination: String, state: String },
}

/// Failures raised while driving input through a compiled template.
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum RunError {
	/// A rule with the `Error` operator fired. The message is the rule's
	/// quoted string after `${...}` expansion against the current cells, or
	/// the rule source when no message was given.
	#[error("parse aborted in state `{state}`: {message}")]
	#[diagnostic(code(textfsm::aborted))]
	Aborted { state: String, message: String },

	/// The machine ended up in a state the template does not define. This
	/// indicates the output was driven with a template it was not built for.
	#[error("parser is in undefined state `{state}`")]
	#[diagnostic(
		code(textfsm::undefined_runtime_state),
		help("use the same compiled template for every `parse` call on one output")
	)]
	UndefinedState { state: String },
}

pub type CompileResult<T> = Result<T, CompileError>;
pub type RunResult<T> = Result<T, RunError>;
