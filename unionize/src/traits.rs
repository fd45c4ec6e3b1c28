use core::fmt::Debug;
use core::hash::Hash;

use crate::{UnionMeta, VariantMeta};

/// Implemented by every generated union.
pub trait Union: Sized {
    /// The discriminant enum the union was generated from.
    type Kind: Copy + Eq + Hash + Debug + 'static;

    /// Lookup tables for this union.
    const META: &'static UnionMeta;

    /// Active kind.
    fn kind(&self) -> Self::Kind;

    /// Position of the active kind in the kind enum.
    fn ordinal(&self) -> usize;

    /// Meta row of the active variant.
    fn variant_meta(&self) -> Option<&'static VariantMeta> {
        Self::META.variant(self.ordinal())
    }
}
