//! TextFSM-style extraction engine.
//!
//! A template declares named values with their regexes, then a set of states
//! whose rules match input lines, assign values, and emit records:
//!
//! ```text
//! Value Required IFACE (\S+)
//! Value STATE (up|down)
//!
//! Start
//!   ^Interface ${IFACE} is ${STATE} -> Record
//! ```
//!
//! [`Template::header`] returns the value names in declaration order and
//! [`Template::parse_text`] returns one row per emitted record.

mod engine;
pub mod error;
mod template;
mod value;

pub use error::{FsmError, Result};
pub use template::Template;
pub use value::{ValueDef, ValueOption, LIST_SEPARATOR};

/// Ordered field values of one extracted record.
pub type Row = Vec<String>;

/// Records produced by one template against one text.
pub type RowSet = Vec<Row>;
