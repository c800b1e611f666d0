//! `textfsm_core` is a template-driven parser for semi-structured text,
//! typically the command-line output of network devices. A declarative
//! template names the pieces of data to capture (`Value` lines) and a small
//! state machine of regex rules describing how the text flows; the engine
//! compiles the template once and then converts any amount of matching input
//! into structured records.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Template text
//!   → Compiler (value declarations, state blocks, static validation)
//!   → Expansion ($name/${name} references become named capture groups)
//!   → ParserOutput (drives input lines through the active state's rules,
//!     assembling and emitting records)
//! ```
//!
//! ## Modules
//!
//! - [`subst`] — the shell-style `$name` / `${name}` substitutor shared by
//!   rule expansion and `Error` message rendering.
//!
//! ## Key Types
//!
//! - [`TextFsm`] — a compiled, immutable template: values plus states.
//! - [`Value`] — one declared capture with its [`ValueOption`] flags.
//! - [`Rule`] — one `^`-anchored matcher with [`LineOp`] / [`RecordOp`]
//!   operators and an optional destination state.
//! - [`ParserOutput`] — the mutable side of a parse: cells, current state
//!   and the emitted [`Record`]s. Reentrant across `parse` calls.
//! - [`CompileError`] / [`RunError`] — template defects vs. runtime aborts.
//!
//! ## Quick Start
//!
//! ```rust
//! use textfsm_core::ParserOutput;
//! use textfsm_core::TextFsm;
//!
//! let template = "\
//! Value interface (\\S+)
//! Value status (up|down)
//!
//! Start
//!   ^${interface} is ${status} -> Record
//! ";
//!
//! let fsm = TextFsm::compile(template)?;
//! let mut output = ParserOutput::new(&fsm);
//! output.parse("eth0 is up\neth1 is down\n", &fsm, true)?;
//!
//! assert_eq!(output.records.len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use engine::*;
pub use error::*;
pub use parser::*;
pub use rule::*;
pub use value::*;

mod engine;
mod error;
mod parser;
mod rule;
pub mod subst;
mod value;
