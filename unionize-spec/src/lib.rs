#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

// Tracing macros: forward to `tracing` when the feature is on, vanish otherwise.
#[cfg(feature = "tracing")]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {
        ::tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "tracing")]
#[allow(unused_macros)]
macro_rules! debug {
    ($($arg:tt)*) => {
        ::tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
#[allow(unused_macros)]
macro_rules! debug {
    ($($arg:tt)*) => {};
}


mod case;
pub use case::*;

mod diagnostic;
pub use diagnostic::*;

mod model;
pub use model::*;

mod category;
pub use category::*;

mod validate;
pub use validate::*;

mod layout;
pub use layout::*;

mod meta;
pub use meta::*;

pub mod pipeline;
