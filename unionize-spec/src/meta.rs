use std::collections::BTreeMap;

use crate::{Diagnostic, DiagnosticKind, PayloadCategory, StorageClass, StoragePlan, UnionSpec};

/// What the meta table knows about a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDescriptor {
    /// Type as written, compacted
    pub type_text: String,
    /// Classification
    pub category: PayloadCategory,
    /// Storage chosen by the planner
    pub storage: StorageClass,
}

/// One row of the meta table, per surviving variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaRow {
    /// Kind ordinal
    pub ordinal: usize,
    /// Effective display name
    pub name: String,
    /// Effective wire name; `None` when it collided and was not registered
    pub wire_name: Option<String>,
    /// Payload descriptor, absent for unit variants
    pub payload: Option<PayloadDescriptor>,
}

/// Lookup tables built once per union.
///
/// Display/wire names and ordinal strings are parallel key spaces: names are
/// stored here, ordinals are resolved by value at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaTable {
    /// kind → name / payload, in ordinal order
    pub rows: Vec<MetaRow>,
    /// name → kind, sorted by name
    pub by_name: BTreeMap<String, usize>,
    /// wire name → kind, sorted by wire name
    pub by_wire_name: BTreeMap<String, usize>,
}

impl MetaTable {
    /// Build all lookups in a single pass over the surviving variants.
    ///
    /// A wire name that spells the ordinal of another surviving kind is
    /// refused like a duplicate: `numeric_tag` output would otherwise decode
    /// as the wrong kind.
    pub fn build(spec: &UnionSpec, plan: &StoragePlan) -> (Self, Vec<Diagnostic>) {
        let mut table = MetaTable::default();
        let mut diagnostics = Vec::new();
        let surviving = |ordinal: usize| spec.variants.iter().any(|v| v.ordinal == ordinal);

        for (index, variant) in spec.variants.iter().enumerate() {
            let name = variant.name();
            let wire = variant.wire_name();

            table.by_name.insert(name.clone(), variant.ordinal);

            let wire_name = match table.by_wire_name.get(&wire) {
                Some(&other) if other != variant.ordinal => {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::DuplicateWireName,
                        format!(
                            "wire name `{wire}` of variant `{name}` is already used by kind #{other}"
                        ),
                        variant.span,
                    ));
                    None
                }
                _ if parse_ordinal(&wire)
                    .is_some_and(|other| other != variant.ordinal && surviving(other)) =>
                {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::DuplicateWireName,
                        format!(
                            "wire name `{wire}` of variant `{name}` is the ordinal of another kind"
                        ),
                        variant.span,
                    ));
                    None
                }
                _ => {
                    table.by_wire_name.insert(wire.clone(), variant.ordinal);
                    Some(wire)
                }
            };

            let payload = variant.payload.as_ref().map(|p| PayloadDescriptor {
                type_text: p.type_text(),
                category: p.category,
                storage: plan.storage_of(index),
            });

            trace!(
                "meta: #{} {} (wire {:?})",
                variant.ordinal, name, wire_name
            );
            table.rows.push(MetaRow {
                ordinal: variant.ordinal,
                name,
                wire_name,
                payload,
            });
        }

        (table, diagnostics)
    }

    /// name → kind
    pub fn kind_by_name(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// kind → name
    pub fn name_of(&self, ordinal: usize) -> Option<&str> {
        self.row(ordinal).map(|r| r.name.as_str())
    }

    /// kind → payload descriptor
    pub fn payload_of(&self, ordinal: usize) -> Option<&PayloadDescriptor> {
        self.row(ordinal).and_then(|r| r.payload.as_ref())
    }

    /// Resolve a wire tag: names first, then a canonical decimal ordinal.
    pub fn resolve_wire(&self, tag: &str) -> Option<usize> {
        if let Some(&ordinal) = self.by_wire_name.get(tag) {
            return Some(ordinal);
        }
        let ordinal = parse_ordinal(tag)?;
        self.row(ordinal).map(|r| r.ordinal)
    }

    fn row(&self, ordinal: usize) -> Option<&MetaRow> {
        self.rows
            .binary_search_by_key(&ordinal, |r| r.ordinal)
            .ok()
            .map(|i| &self.rows[i])
    }
}

/// Canonical decimal: digits only, no sign, no leading zero (except `0`).
pub fn parse_ordinal(tag: &str) -> Option<usize> {
    let canonical = !tag.is_empty()
        && tag.bytes().all(|b| b.is_ascii_digit())
        && (tag == "0" || !tag.starts_with('0'));
    if canonical { tag.parse().ok() } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RawFields, RawUnion, RawVariant, Spanned, validate};
    use proc_macro2::{Ident, Span};
    use quote::quote;
    use unionize_testhelpers::test;

    fn ident(s: &str) -> Ident {
        Ident::new(s, Span::call_site())
    }

    fn build(variants: Vec<RawVariant>) -> (UnionSpec, MetaTable, Vec<Diagnostic>) {
        let mut raw = RawUnion::new(ident("FooKind"));
        raw.variants = variants;
        let (spec, diagnostics) = validate(raw);
        assert!(diagnostics.is_empty());
        let plan = StoragePlan::plan(&spec);
        let (meta, diagnostics) = MetaTable::build(&spec, &plan);
        (spec, meta, diagnostics)
    }

    fn wire(name: &str, wire: &str) -> RawVariant {
        RawVariant {
            wire_name: Some(Spanned::new(wire.to_string(), Span::call_site())),
            ..RawVariant::unit(ident(name))
        }
    }

    #[test]
    fn lookups_agree() {
        let (_, meta, diagnostics) = build(vec![
            RawVariant::unit(ident("A")),
            RawVariant {
                fields: RawFields::Tuple(vec![quote!(i32)], Span::call_site()),
                display_name: Some(Spanned::new("Some".to_string(), Span::call_site())),
                ..RawVariant::unit(ident("B"))
            },
            wire("C", "c"),
        ]);
        assert!(diagnostics.is_empty());

        assert_eq!(meta.kind_by_name("A"), Some(0));
        assert_eq!(meta.kind_by_name("Some"), Some(1));
        assert_eq!(meta.kind_by_name("B"), None);
        assert_eq!(meta.name_of(1), Some("Some"));
        assert_eq!(meta.name_of(7), None);

        let b = meta.payload_of(1).unwrap();
        assert_eq!(b.type_text, "i32");
        assert_eq!(b.category, PayloadCategory::TriviallyCopyable);
        assert_eq!(b.storage, StorageClass::Dedicated);
        assert!(meta.payload_of(0).is_none());

        assert_eq!(meta.resolve_wire("c"), Some(2));
        assert_eq!(meta.resolve_wire("C"), None);
        assert_eq!(meta.resolve_wire("2"), Some(2));
        assert_eq!(meta.resolve_wire("3"), None);
        assert_eq!(meta.resolve_wire("02"), None);
    }

    #[test]
    fn wire_collision_keeps_the_first() {
        let (_, meta, diagnostics) = build(vec![wire("A", "x"), wire("B", "x")]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::DuplicateWireName);
        assert_eq!(meta.resolve_wire("x"), Some(0));
        assert_eq!(meta.rows[1].wire_name, None);
        // the later variant keeps its kind and is still reachable by ordinal
        assert_eq!(meta.resolve_wire("1"), Some(1));
    }

    #[test]
    fn wire_names_may_not_spell_another_ordinal() {
        let (_, meta, diagnostics) = build(vec![wire("A", "1"), RawVariant::unit(ident("B"))]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::DuplicateWireName);
        assert_eq!(meta.rows[0].wire_name, None);
        // "1" still means B, so numeric tags round-trip
        assert_eq!(meta.resolve_wire("1"), Some(1));
        assert_eq!(meta.resolve_wire("0"), Some(0));
    }

    #[test]
    fn numeric_wire_names_that_are_safe() {
        let (_, meta, diagnostics) = build(vec![
            wire("A", "0"),
            wire("B", "01"),
            wire("C", "7"),
            RawVariant::unit(ident("D")),
        ]);
        // its own ordinal, a non-canonical spelling, an ordinal nobody has
        assert!(diagnostics.is_empty());
        assert_eq!(meta.resolve_wire("0"), Some(0));
        assert_eq!(meta.resolve_wire("01"), Some(1));
        assert_eq!(meta.resolve_wire("1"), Some(1));
        assert_eq!(meta.resolve_wire("7"), Some(2));
        assert_eq!(meta.resolve_wire("3"), Some(3));
    }

    #[test]
    fn ordinal_syntax() {
        assert_eq!(parse_ordinal("0"), Some(0));
        assert_eq!(parse_ordinal("12"), Some(12));
        assert_eq!(parse_ordinal("012"), None);
        assert_eq!(parse_ordinal("-1"), None);
        assert_eq!(parse_ordinal("+1"), None);
        assert_eq!(parse_ordinal(""), None);
    }
}
