//! Shell-style `$name` / `${name}` substitution.
//!
//! Used in two places: expanding value references inside rule patterns at
//! compile time, and rendering the quoted message of an `Error` action
//! against the current cells at run time. Lookup failures are never errors;
//! the reference is left in the output verbatim.

use std::collections::HashMap;

use crate::CellValue;

/// Substitute `$name` and `${name}` references in `input` from `vars`.
///
/// - `$$` emits a literal `$`.
/// - `$name` reads the longest `[A-Za-z_][A-Za-z0-9_]*` identifier.
/// - `${name}` takes everything up to the closing brace; `${a.b}` descends
///   one level into a mapping-shaped variable.
/// - Unresolved references and an unterminated `${` are emitted literally.
pub fn substitute(input: &str, vars: &HashMap<String, CellValue>) -> String {
	let mut output = String::with_capacity(input.len());
	let mut rest = input;

	while let Some(pos) = rest.find('$') {
		output.push_str(&rest[..pos]);
		rest = &rest[pos + 1..];

		if let Some(tail) = rest.strip_prefix('$') {
			output.push('$');
			rest = tail;
			continue;
		}

		if let Some(tail) = rest.strip_prefix('{') {
			let Some(end) = tail.find('}') else {
				// Unterminated `${...` stays literal to the end of input.
				output.push('$');
				output.push_str(rest);
				rest = "";
				break;
			};

			let name = &tail[..end];
			match lookup(name, vars) {
				Some(text) => output.push_str(&text),
				None => {
					output.push_str("${");
					output.push_str(name);
					output.push('}');
				}
			}
			rest = &tail[end + 1..];
			continue;
		}

		let len = identifier_len(rest);
		if len == 0 {
			output.push('$');
			continue;
		}

		let name = &rest[..len];
		match vars.get(name) {
			Some(content) => output.push_str(&content.to_string()),
			None => {
				output.push('$');
				output.push_str(name);
			}
		}
		rest = &rest[len..];
	}

	output.push_str(rest);
	output
}

/// Length of the leading `[A-Za-z_][A-Za-z0-9_]*` identifier, if any.
fn identifier_len(input: &str) -> usize {
	let mut len = 0;

	for byte in input.bytes() {
		let valid = byte == b'_'
			|| byte.is_ascii_alphabetic()
			|| (len > 0 && byte.is_ascii_digit());
		if !valid {
			break;
		}
		len += 1;
	}

	len
}

/// Resolve a possibly dotted reference. A single dot descends into a
/// mapping-shaped variable; deeper paths never resolve.
fn lookup(path: &str, vars: &HashMap<String, CellValue>) -> Option<String> {
	match path.split_once('.') {
		None => vars.get(path).map(ToString::to_string),
		Some((head, tail)) => {
			if tail.contains('.') {
				return None;
			}
			let Some(CellValue::Map(map)) = vars.get(head) else {
				return None;
			};
			map.get(tail).cloned()
		}
	}
}
