#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub use unionize_spec::*;

mod parse;
pub use parse::*;

mod emit_codec;
mod emit_meta;
mod emit_reference;
mod emit_traits;
mod emit_value;

mod process_union;
pub use process_union::union_attr;

/// Returns true if doc strings should be left off generated items.
///
/// Controlled by `--cfg unionize_no_doc`, evaluated when the proc-macro is
/// compiled.
#[cfg(unionize_no_doc)]
pub const fn is_no_doc() -> bool {
    true
}

/// Returns true if doc strings should be left off generated items.
#[cfg(not(unionize_no_doc))]
pub const fn is_no_doc() -> bool {
    false
}
