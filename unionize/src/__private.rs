//! Support items for generated code. Not public API.

pub use core::any::Any;
pub use core::convert::Infallible;
pub use core::marker::PhantomData;
pub use std::sync::Arc;

#[cfg(feature = "json")]
pub use serde;
#[cfg(feature = "json")]
pub use serde_json;

use crate::{Trivial, UnionMeta};

/// Called by `get_*` on the wrong kind.
#[cold]
#[track_caller]
pub fn wrong_variant(meta: &UnionMeta, expected: usize, actual: usize) -> ! {
    let name = |ordinal| meta.name_of(ordinal).unwrap_or("?");
    panic!(
        "{}: expected variant `{}`, found `{}`",
        meta.name(),
        name(expected),
        name(actual)
    )
}

/// Compile-time check that a payload classified as trivially copyable is one.
pub const fn assert_trivial<T: Trivial>() {}

/// Compile-time check that a payload classified as a reference can live in a
/// shared slot.
pub const fn assert_shared<T: Any + Send + Sync>() {}
