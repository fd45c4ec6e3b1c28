#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
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


pub use unionize_macros::union;

mod trivial;
pub use trivial::*;

mod region;
pub use region::*;

mod slot;
pub use slot::*;

mod meta;
pub use meta::*;

mod traits;
pub use traits::*;

#[cfg(feature = "json")]
pub mod json;

#[doc(hidden)]
pub mod __private;
