//! String NBT: the human-readable text form of an NBT tree.
//!
//! `from_snbt` parses a document (exactly one compound) and the two printers
//! are its structural inverses: anything either printer emits parses back to
//! a structurally-equal tag.

mod parser;
mod printer;

pub use parser::from_snbt;
pub use printer::{to_snbt, to_snbt_pretty};
