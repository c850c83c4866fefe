//! Output module
//!
//! Writes records to stdout (or any writer) as JSON, one record per line.
//! [`JsonLinesTrace`] is the page observer the CLI hands to the pagination
//! walker so every item is printed as it arrives.

mod trace;

pub use trace::{print_json, JsonLinesTrace, OutputStyle};
