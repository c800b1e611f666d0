use std::collections::HashMap;

use regex::Captures;

use crate::CellValue;
use crate::LineOp;
use crate::Record;
use crate::RecordOp;
use crate::Rule;
use crate::RunError;
use crate::RunResult;
use crate::TextFsm;
use crate::Value;
use crate::ValueOption;
use crate::subst::substitute;

/// Working storage for one value, shaped at construction from the value's
/// declaration. `held` carries the `Filldown` copy; list shapes hold by not
/// being cleared at record emission.
#[derive(Debug, Clone)]
enum Cell {
	Text {
		cur: Option<String>,
		held: Option<String>,
	},
	Map {
		cur: Option<HashMap<String, String>>,
		held: Option<HashMap<String, String>>,
	},
	TextList(Vec<String>),
	MapList(Vec<HashMap<String, String>>),
}

impl Cell {
	fn for_value(value: &Value) -> Self {
		match (value.is_list(), value.has_inner_groups()) {
			(true, true) => Self::MapList(Vec::new()),
			(true, false) => Self::TextList(Vec::new()),
			(false, true) => {
				Self::Map {
					cur: None,
					held: None,
				}
			}
			(false, false) => {
				Self::Text {
					cur: None,
					held: None,
				}
			}
		}
	}

	/// Whether anything was assigned since the last record clear. Filldown
	/// content restored from the hold does not count.
	fn raw_is_empty(&self) -> bool {
		match self {
			Self::Text { cur, .. } => cur.as_deref().map_or(true, str::is_empty),
			Self::Map { cur, .. } => cur.as_ref().map_or(true, HashMap::is_empty),
			Self::TextList(items) => items.is_empty(),
			Self::MapList(items) => items.is_empty(),
		}
	}

	/// The cell as it appears in a record: the current assignment, falling
	/// back to the `Filldown` hold, falling back to the empty shape.
	fn resolved(&self) -> CellValue {
		match self {
			Self::Text { cur, held } => {
				let text = cur
					.as_deref()
					.filter(|text| !text.is_empty())
					.or(held.as_deref())
					.unwrap_or_default();
				CellValue::Text(text.to_owned())
			}
			Self::Map { cur, held } => {
				let map = cur
					.as_ref()
					.filter(|map| !map.is_empty())
					.or(held.as_ref())
					.cloned()
					.unwrap_or_default();
				CellValue::Map(map)
			}
			Self::TextList(items) => CellValue::TextList(items.clone()),
			Self::MapList(items) => CellValue::MapList(items.clone()),
		}
	}

	/// Record-level clear: drop the current assignment, keep `Filldown`
	/// holds and held lists.
	fn clear(&mut self, filldown: bool) {
		match self {
			Self::Text { cur, .. } => *cur = None,
			Self::Map { cur, .. } => *cur = None,
			Self::TextList(items) => {
				if !filldown {
					items.clear();
				}
			}
			Self::MapList(items) => {
				if !filldown {
					items.clear();
				}
			}
		}
	}

	/// `Clearall`: wipe assignments and holds alike.
	fn clear_all(&mut self) {
		match self {
			Self::Text { cur, held } => {
				*cur = None;
				*held = None;
			}
			Self::Map { cur, held } => {
				*cur = None;
				*held = None;
			}
			Self::TextList(items) => items.clear(),
			Self::MapList(items) => items.clear(),
		}
	}
}

/// The mutable side of a parse: emitted records plus the live machine
/// configuration (current state, per-value cells, finished flag).
///
/// One output is driven by repeated [`parse`](ParserOutput::parse) calls
/// against the same compiled template. Passing `eof = false` suspends the
/// machine at the end of the chunk so a later call can continue exactly
/// where it left off; `eof = true` runs the end-of-input step.
#[derive(Debug, Clone)]
pub struct ParserOutput {
	/// Every emitted record, in emission order. `Fillup` values may rewrite
	/// earlier entries as later input arrives.
	pub records: Vec<Record>,
	state: String,
	cells: Vec<Cell>,
	finished: bool,
}

impl ParserOutput {
	/// A fresh machine positioned at `Start` with empty cells.
	pub fn new(fsm: &TextFsm) -> Self {
		Self {
			records: Vec::new(),
			state: "Start".to_owned(),
			cells: fsm.values.iter().map(Cell::for_value).collect(),
			finished: false,
		}
	}

	/// Discard all records and machine state, returning to `Start`.
	pub fn reset(&mut self, fsm: &TextFsm) {
		*self = Self::new(fsm);
	}

	/// Name of the state the machine is currently in.
	pub fn state(&self) -> &str {
		&self.state
	}

	/// Whether a terminal transition (`End`, `EOF`) has been taken. Further
	/// input is discarded once finished.
	pub fn is_finished(&self) -> bool {
		self.finished
	}

	/// Feed a chunk of input through the machine. Lines are `\n`-separated;
	/// a trailing fragment without a newline is processed as a line. With
	/// `eof` set, the end-of-input step runs after the last line: the
	/// implicit record is emitted unless the template declares an `EOF`
	/// state.
	pub fn parse(&mut self, text: &str, fsm: &TextFsm, eof: bool) -> RunResult<()> {
		for line in text.lines() {
			if self.finished {
				return Ok(());
			}
			self.check_line(line, fsm)?;
		}

		if eof && !self.finished {
			self.handle_eof(fsm);
		}

		Ok(())
	}

	fn handle_eof(&mut self, fsm: &TextFsm) {
		if !fsm.states.contains_key("EOF") {
			self.append_record(fsm);
		}
	}

	/// Walk the current state's rules over one line. The first match wins
	/// unless it carries `Continue`, which resumes the walk at the next rule
	/// without advancing the input.
	fn check_line(&mut self, line: &str, fsm: &TextFsm) -> RunResult<()> {
		let state = fsm.states.get(&self.state).ok_or_else(|| {
			RunError::UndefinedState {
				state: self.state.clone(),
			}
		})?;

		for rule in &state.rules {
			let Some(caps) = rule.regex.captures(line) else {
				continue;
			};

			self.assign_captures(rule, &caps, fsm);

			match rule.record_op {
				Some(RecordOp::Record) => self.append_record(fsm),
				Some(RecordOp::Clear) => self.clear_record(fsm),
				Some(RecordOp::Clearall) => self.clear_all(),
				Some(RecordOp::NoRecord) | None => {}
			}

			if rule.line_op == Some(LineOp::Error) {
				return Err(self.abort_error(rule, fsm));
			}

			if let Some(destination) = &rule.new_state {
				match destination.as_str() {
					"End" => {
						self.finished = true;
						return Ok(());
					}
					"EOF" => {
						self.handle_eof(fsm);
						self.finished = true;
						return Ok(());
					}
					_ => self.state = destination.clone(),
				}
			}

			if !rule.is_continue() {
				return Ok(());
			}
		}

		// No rule matched: the line is dropped silently.
		Ok(())
	}

	/// Write the captures of a matched rule into the bound cells, updating
	/// `Filldown` holds and performing `Fillup` back-fill.
	fn assign_captures(&mut self, rule: &Rule, caps: &Captures<'_>, fsm: &TextFsm) {
		for &index in &rule.bound_values {
			let value = &fsm.values[index];
			let Some(matched) = caps.name(&value.name) else {
				continue;
			};
			let filldown = value.is_filldown();

			match &mut self.cells[index] {
				Cell::Text { cur, held } => {
					let text = matched.as_str().to_owned();
					// An empty capture does not disturb the hold; emission
					// falls back to it.
					if filldown && !text.is_empty() {
						*held = Some(text.clone());
					}
					*cur = Some(text);
				}
				Cell::Map { cur, held } => {
					let map = capture_map(&value.inner_groups, caps);
					if filldown {
						*held = Some(map.clone());
					}
					*cur = Some(map);
				}
				Cell::TextList(items) => items.push(matched.as_str().to_owned()),
				Cell::MapList(items) => items.push(capture_map(&value.inner_groups, caps)),
			}

			if value.has_option(ValueOption::Fillup) {
				let content = self.cells[index].resolved();
				if !content.is_empty() {
					self.fill_upward(&value.name, &content);
				}
			}
		}
	}

	/// Patch already-emitted records newest to oldest while their cell for
	/// `name` is still empty, stopping at the first non-empty one.
	fn fill_upward(&mut self, name: &str, content: &CellValue) {
		for record in self.records.iter_mut().rev() {
			match record.get_mut(name) {
				Some(cell) if cell.is_empty() => *cell = content.clone(),
				_ => break,
			}
		}
	}

	/// Emit the current record. A record with an empty `Required` value is
	/// suppressed, as is a record nothing was assigned to since the last
	/// clear. Either way the working cells are cleared afterwards.
	fn append_record(&mut self, fsm: &TextFsm) {
		let mut record = Record::new();
		let mut any_assigned = false;

		for (index, value) in fsm.values.iter().enumerate() {
			let resolved = self.cells[index].resolved();

			if value.has_option(ValueOption::Required) && resolved.is_empty() {
				self.clear_record(fsm);
				return;
			}

			// Fillup content exists to patch other records; on its own it
			// does not justify emitting one.
			if !value.has_option(ValueOption::Fillup) && !self.cells[index].raw_is_empty() {
				any_assigned = true;
			}
			record.insert(value.name.clone(), resolved);
		}

		if any_assigned {
			self.records.push(record);
		}
		self.clear_record(fsm);
	}

	fn clear_record(&mut self, fsm: &TextFsm) {
		for (index, value) in fsm.values.iter().enumerate() {
			self.cells[index].clear(value.is_filldown());
		}
	}

	fn clear_all(&mut self) {
		for cell in &mut self.cells {
			cell.clear_all();
		}
	}

	/// Build the error for an `Error` rule: the quoted message expanded
	/// against the current cells, the bare word payload, or the rule source.
	fn abort_error(&self, rule: &Rule, fsm: &TextFsm) -> RunError {
		let message = match &rule.error_message {
			Some(template) => {
				let vars: HashMap<String, CellValue> = fsm
					.values
					.iter()
					.enumerate()
					.map(|(index, value)| (value.name.clone(), self.cells[index].resolved()))
					.collect();
				substitute(template, &vars)
			}
			None => {
				rule.new_state.clone().unwrap_or_else(|| {
					format!(
						"rule on template line {} matched `{}`",
						rule.line_num,
						rule.to_string().trim_start()
					)
				})
			}
		};

		RunError::Aborted {
			state: self.state.clone(),
			message,
		}
	}
}

fn capture_map(groups: &[String], caps: &Captures<'_>) -> HashMap<String, String> {
	groups
		.iter()
		.map(|group| {
			let text = caps
				.name(group)
				.map(|matched| matched.as_str().to_owned())
				.unwrap_or_default();
			(group.clone(), text)
		})
		.collect()
}
