use crate::{PayloadCategory, Representation, UnionSpec};

/// Where a variant's payload lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    /// Unit variant, nothing stored
    None,
    /// Its own `Option<T>` field
    Dedicated,
    /// One of several trivially-copyable payloads sharing a raw region
    OverlappedTrivial,
    /// One of several reference payloads sharing a type-erased slot
    SharedReferenceSlot,
    /// A case of the private node enum (reference representation)
    Leaf,
}

impl StorageClass {
    /// Short lowercase name, as used in the runtime meta table.
    pub const fn as_str(&self) -> &'static str {
        match self {
            StorageClass::None => "none",
            StorageClass::Dedicated => "dedicated",
            StorageClass::OverlappedTrivial => "overlapped_trivial",
            StorageClass::SharedReferenceSlot => "shared_reference_slot",
            StorageClass::Leaf => "leaf",
        }
    }
}

/// One storage decision per surviving variant, indexed like
/// [`UnionSpec::variants`]. Immutable once planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePlan {
    representation: Representation,
    slots: Vec<StorageClass>,
}

impl StoragePlan {
    /// Plan storage for a validated union.
    ///
    /// Categories are counted first: a category with a single member never
    /// overlaps, it gets a dedicated field instead.
    pub fn plan(spec: &UnionSpec) -> Self {
        if spec.representation == Representation::Reference {
            trace!("{}: reference representation, all leaves", spec.union_name);
            return StoragePlan {
                representation: Representation::Reference,
                slots: vec![StorageClass::Leaf; spec.variants.len()],
            };
        }

        let count = |category| {
            spec.variants
                .iter()
                .filter(|v| v.payload.as_ref().is_some_and(|p| p.category == category))
                .count()
        };
        let tc = count(PayloadCategory::TriviallyCopyable);
        let rc = count(PayloadCategory::Reference);
        debug!(
            "{}: {} trivially-copyable, {} reference payloads",
            spec.union_name, tc, rc
        );

        let slots = spec
            .variants
            .iter()
            .map(|v| match v.payload.as_ref().map(|p| p.category) {
                None => StorageClass::None,
                Some(PayloadCategory::TriviallyCopyable) if tc >= 2 => {
                    StorageClass::OverlappedTrivial
                }
                Some(PayloadCategory::Reference) if rc >= 2 => StorageClass::SharedReferenceSlot,
                Some(_) => StorageClass::Dedicated,
            })
            .collect();

        StoragePlan {
            representation: Representation::Value,
            slots,
        }
    }

    /// Representation this plan was made for.
    pub const fn representation(&self) -> Representation {
        self.representation
    }

    /// Storage of the variant at `index` in [`UnionSpec::variants`].
    pub fn storage_of(&self, index: usize) -> StorageClass {
        self.slots.get(index).copied().unwrap_or(StorageClass::None)
    }

    /// All decisions, indexed like [`UnionSpec::variants`].
    pub fn slots(&self) -> &[StorageClass] {
        &self.slots
    }

    /// Indices of the variants sharing the raw region.
    pub fn region_members(&self) -> impl Iterator<Item = usize> + '_ {
        self.members(StorageClass::OverlappedTrivial)
    }

    /// Indices of the variants sharing the reference slot.
    pub fn shared_members(&self) -> impl Iterator<Item = usize> + '_ {
        self.members(StorageClass::SharedReferenceSlot)
    }

    /// Indices of the variants with their own field.
    pub fn dedicated_members(&self) -> impl Iterator<Item = usize> + '_ {
        self.members(StorageClass::Dedicated)
    }

    /// Whether a raw region must be emitted.
    pub fn has_region(&self) -> bool {
        self.region_members().next().is_some()
    }

    /// Whether a shared reference slot must be emitted.
    pub fn has_shared_slot(&self) -> bool {
        self.shared_members().next().is_some()
    }

    fn members(&self, class: StorageClass) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(move |(_, s)| **s == class)
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RawFields, RawUnion, RawVariant, validate};
    use proc_macro2::{Ident, Span, TokenStream};
    use quote::quote;
    use unionize_testhelpers::test;

    fn spec(payloads: &[Option<TokenStream>], representation: Representation) -> UnionSpec {
        let mut raw = RawUnion::new(Ident::new("TestKind", Span::call_site()));
        raw.representation = representation;
        raw.variants = payloads
            .iter()
            .enumerate()
            .map(|(i, p)| RawVariant {
                fields: match p {
                    Some(ty) => RawFields::Tuple(vec![ty.clone()], Span::call_site()),
                    None => RawFields::Unit,
                },
                ..RawVariant::unit(Ident::new(&format!("V{i}"), Span::call_site()))
            })
            .collect();
        let (spec, diagnostics) = validate(raw);
        assert!(diagnostics.is_empty());
        spec
    }

    #[test]
    fn two_trivials_overlap() {
        let spec = spec(
            &[None, Some(quote!(i32)), Some(quote!(f64)), Some(quote!(Foo))],
            Representation::Value,
        );
        let plan = StoragePlan::plan(&spec);
        assert_eq!(
            plan.slots(),
            [
                StorageClass::None,
                StorageClass::OverlappedTrivial,
                StorageClass::OverlappedTrivial,
                StorageClass::Dedicated,
            ]
        );
        assert!(plan.has_region());
        assert!(!plan.has_shared_slot());
        assert_eq!(plan.region_members().collect::<Vec<_>>(), [1, 2]);
    }

    #[test]
    fn single_member_categories_stay_dedicated() {
        let spec = spec(
            &[Some(quote!(i32)), Some(quote!(String)), Some(quote!(Foo))],
            Representation::Value,
        );
        let plan = StoragePlan::plan(&spec);
        assert_eq!(
            plan.slots(),
            [
                StorageClass::Dedicated,
                StorageClass::Dedicated,
                StorageClass::Dedicated,
            ]
        );
        assert!(!plan.has_region());
        assert!(!plan.has_shared_slot());
    }

    #[test]
    fn two_references_share_a_slot() {
        let spec = spec(
            &[
                Some(quote!(String)),
                Some(quote!(Vec<u8>)),
                Some(quote!(u8)),
                None,
            ],
            Representation::Value,
        );
        let plan = StoragePlan::plan(&spec);
        assert_eq!(plan.shared_members().collect::<Vec<_>>(), [0, 1]);
        assert_eq!(plan.dedicated_members().collect::<Vec<_>>(), [2]);
        assert_eq!(plan.storage_of(3), StorageClass::None);
    }

    #[test]
    fn reference_mode_is_all_leaves() {
        let spec = spec(
            &[None, Some(quote!(i32)), Some(quote!(f64))],
            Representation::Reference,
        );
        let plan = StoragePlan::plan(&spec);
        assert_eq!(plan.representation(), Representation::Reference);
        assert!(plan.slots().iter().all(|s| *s == StorageClass::Leaf));
        assert!(!plan.has_region());
    }
}
