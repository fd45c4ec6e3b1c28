use std::collections::HashSet;

use proc_macro2::{Group, Ident, Span, TokenStream, TokenTree};

use crate::{
    Diagnostic, DiagnosticKind, PayloadOrigin, PayloadType, RawFields, RawUnion, RawVariant,
    Spanned, UnionSpec, VariantSpec, classify, is_valid_ident,
};

/// Turn a raw declaration into a [`UnionSpec`].
///
/// Bad variants are dropped with a diagnostic and land in
/// [`UnionSpec::rejected`]; the union is always produced.
pub fn validate(raw: RawUnion) -> (UnionSpec, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    let union_name = union_name(&raw, &mut diagnostics);
    let generics = dedup_generics(raw.generics, &mut diagnostics);

    let mut variants: Vec<VariantSpec> = Vec::new();
    let mut rejected = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();
    let mut seen_stems: HashSet<String> = HashSet::new();

    for (ordinal, variant) in raw.variants.into_iter().enumerate() {
        let ident = variant.ident.clone();
        match validate_variant(variant, ordinal, &generics) {
            Ok(spec) => {
                let name = spec.name();
                let stem = spec.method_stem();
                if !seen_names.insert(name.clone()) {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::DuplicateVariantName,
                        format!("variant name `{name}` is used more than once"),
                        spec.span,
                    ));
                    rejected.push((ordinal, ident));
                } else if !seen_stems.insert(stem.clone()) {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::DuplicateVariantName,
                        format!(
                            "variant name `{name}` collides with another variant: both generate `is_{stem}`"
                        ),
                        spec.span,
                    ));
                    rejected.push((ordinal, ident));
                } else {
                    trace!("variant `{}` accepted at ordinal {}", name, ordinal);
                    variants.push(spec);
                }
            }
            Err(diagnostic) => {
                debug!("variant `{}` dropped: {}", ident, diagnostic.message);
                diagnostics.push(diagnostic);
                rejected.push((ordinal, ident));
            }
        }
    }

    let spec = UnionSpec {
        union_name,
        kind_name: raw.kind_name,
        vis: raw.vis,
        representation: raw.representation,
        generics,
        json: raw.json,
        crate_path: raw
            .crate_path
            .unwrap_or_else(UnionSpec::default_crate_path),
        impls: raw.impls,
        docs: raw.docs,
        variants,
        rejected,
    };
    (spec, diagnostics)
}

/// `FooKind` becomes `Foo`, anything else `BarUnion`.
pub fn default_union_name(kind_name: &str) -> String {
    let lower = kind_name.to_ascii_lowercase();
    if lower.len() > 4 && lower.ends_with("kind") {
        kind_name[..kind_name.len() - 4].to_string()
    } else {
        format!("{kind_name}Union")
    }
}

fn union_name(raw: &RawUnion, diagnostics: &mut Vec<Diagnostic>) -> Ident {
    if let Some(Spanned { value, span }) = &raw.name {
        if is_valid_ident(value) {
            return Ident::new(value, *span);
        }
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::InvalidAttribute,
            format!("union name `{value}` is not a valid identifier"),
            *span,
        ));
    }
    let kind_name = raw.kind_name.to_string();
    let kind_name = kind_name.strip_prefix("r#").unwrap_or(&kind_name);
    Ident::new(&default_union_name(kind_name), raw.kind_name.span())
}

fn dedup_generics(generics: Vec<Ident>, diagnostics: &mut Vec<Diagnostic>) -> Vec<Ident> {
    let mut out: Vec<Ident> = Vec::with_capacity(generics.len());
    for g in generics {
        if out.contains(&g) {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::DuplicateGenericParameter,
                format!("generic parameter `{g}` is declared more than once"),
                g.span(),
            ));
        } else {
            out.push(g);
        }
    }
    out
}

fn validate_variant(
    variant: RawVariant,
    ordinal: usize,
    generics: &[Ident],
) -> Result<VariantSpec, Diagnostic> {
    let span = variant.ident.span();

    if let Some(Spanned { value, span }) = &variant.display_name
        && !is_valid_ident(value)
    {
        return Err(Diagnostic::new(
            DiagnosticKind::InvalidVariantName,
            format!("variant name `{value}` is not a valid identifier"),
            *span,
        ));
    }

    let payload = resolve_payload(&variant, generics)?;

    Ok(VariantSpec {
        raw_name: variant.ident,
        display_name: variant.display_name.map(|n| n.value),
        wire_name: variant.wire_name.map(|n| n.value),
        payload,
        ordinal,
        span,
    })
}

fn resolve_payload(
    variant: &RawVariant,
    generics: &[Ident],
) -> Result<Option<PayloadType>, Diagnostic> {
    let unresolved = |message: String, span: Span| {
        Diagnostic::new(DiagnosticKind::UnresolvedPayloadType, message, span)
    };
    let ident = &variant.ident;

    let (tokens, origin) = match (&variant.fields, variant.of.as_slice()) {
        (RawFields::Unit, []) => return Ok(None),
        (RawFields::Named(span), _) => {
            return Err(unresolved(
                format!("variant `{ident}` has named fields; a payload must be a single type"),
                *span,
            ));
        }
        (_, [_, second, ..]) => {
            return Err(unresolved(
                format!("variant `{ident}` names its payload more than once"),
                second.span,
            ));
        }
        (RawFields::Tuple(_, span), [_]) => {
            return Err(unresolved(
                format!("variant `{ident}` has both a tuple field and `of = \"...\"`"),
                *span,
            ));
        }
        (RawFields::Tuple(fields, span), []) => match fields.as_slice() {
            [ty] if !ty.is_empty() => (ty.clone(), PayloadOrigin::Concrete),
            [] | [_] => {
                return Err(unresolved(
                    format!("variant `{ident}` has an empty payload"),
                    *span,
                ));
            }
            _ => {
                return Err(unresolved(
                    format!(
                        "variant `{ident}` has {} fields; a payload must be a single type",
                        fields.len()
                    ),
                    *span,
                ));
            }
        },
        (RawFields::Unit, [of]) => resolve_named(ident, of, generics)?,
    };

    let category = classify(&tokens, generics);
    Ok(Some(PayloadType {
        tokens,
        origin,
        category,
    }))
}

/// Resolve `of = "..."`: a bare name must be a generic parameter, anything
/// longer is parsed as a type.
fn resolve_named(
    ident: &Ident,
    of: &Spanned<String>,
    generics: &[Ident],
) -> Result<(TokenStream, PayloadOrigin), Diagnostic> {
    let parsed = of
        .value
        .parse::<TokenStream>()
        .ok()
        .filter(|ts| !ts.is_empty() && !has_top_level_separator(ts));
    let Some(parsed) = parsed else {
        return Err(Diagnostic::new(
            DiagnosticKind::UnresolvedPayloadType,
            format!(
                "payload `{}` of variant `{ident}` does not resolve to a type",
                of.value
            ),
            of.span,
        ));
    };
    let tokens = respan(parsed, of.span);

    let trees: Vec<TokenTree> = tokens.clone().into_iter().collect();
    if let [TokenTree::Ident(name)] = trees.as_slice() {
        return if generics.iter().any(|g| g == name) {
            Ok((tokens, PayloadOrigin::GenericRef))
        } else {
            Err(Diagnostic::new(
                DiagnosticKind::InvalidGenericPayloadReference,
                format!(
                    "variant `{ident}` refers to `{name}`, which is not a declared generic parameter"
                ),
                of.span,
            ))
        };
    }
    Ok((tokens, PayloadOrigin::Parsed))
}

fn has_top_level_separator(tokens: &TokenStream) -> bool {
    let mut depth = 0usize;
    let mut prev_dash = false;
    for tt in tokens.clone() {
        if let TokenTree::Punct(p) = &tt {
            match p.as_char() {
                '<' => depth += 1,
                '>' if !prev_dash => depth = depth.saturating_sub(1),
                ',' | ';' if depth == 0 => return true,
                _ => {}
            }
            prev_dash = p.as_char() == '-';
        } else {
            prev_dash = false;
        }
    }
    false
}

/// Point every token at `span`, so errors in a type written inside a string
/// literal land on the literal.
fn respan(tokens: TokenStream, span: Span) -> TokenStream {
    tokens
        .into_iter()
        .map(|tt| match tt {
            TokenTree::Group(group) => {
                let mut respanned = Group::new(group.delimiter(), respan(group.stream(), span));
                respanned.set_span(span);
                TokenTree::Group(respanned)
            }
            mut other => {
                other.set_span(span);
                other
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PayloadCategory, Representation};
    use quote::quote;
    use unionize_testhelpers::test;

    fn ident(s: &str) -> Ident {
        Ident::new(s, Span::call_site())
    }

    fn spanned(s: &str) -> Spanned<String> {
        Spanned::new(s.to_string(), Span::call_site())
    }

    fn tuple(ty: TokenStream) -> RawFields {
        RawFields::Tuple(vec![ty], Span::call_site())
    }

    fn variant(name: &str, fields: RawFields) -> RawVariant {
        RawVariant {
            fields,
            ..RawVariant::unit(ident(name))
        }
    }

    #[test]
    fn union_naming() {
        assert_eq!(default_union_name("ShapeKind"), "Shape");
        assert_eq!(default_union_name("Shapekind"), "Shape");
        assert_eq!(default_union_name("SHAPEKIND"), "SHAPE");
        assert_eq!(default_union_name("Shape"), "ShapeUnion");
        assert_eq!(default_union_name("Kind"), "KindUnion");
    }

    #[test]
    fn name_override_wins() {
        let mut raw = RawUnion::new(ident("ShapeKind"));
        raw.name = Some(spanned("Figure"));
        let (spec, diagnostics) = validate(raw);
        assert!(diagnostics.is_empty());
        assert_eq!(spec.union_name, "Figure");
        assert_eq!(spec.representation, Representation::Value);
    }

    #[test]
    fn bad_union_name_falls_back() {
        let mut raw = RawUnion::new(ident("ShapeKind"));
        raw.name = Some(spanned("not a name"));
        let (spec, diagnostics) = validate(raw);
        assert_eq!(spec.union_name, "Shape");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::InvalidAttribute);
    }

    #[test]
    fn ordinals_follow_declaration_order() {
        let mut raw = RawUnion::new(ident("FooKind"));
        raw.variants = vec![
            RawVariant::unit(ident("A")),
            variant("B", tuple(quote!(i32))),
            variant("C", tuple(quote!(Foo))),
        ];
        let (spec, diagnostics) = validate(raw);
        assert!(diagnostics.is_empty());
        let ordinals: Vec<_> = spec.variants.iter().map(|v| v.ordinal).collect();
        assert_eq!(ordinals, [0, 1, 2]);
        assert!(spec.variants[0].payload.is_none());
        let b = spec.variants[1].payload.as_ref().unwrap();
        assert_eq!(b.category, PayloadCategory::TriviallyCopyable);
        assert_eq!(b.origin, PayloadOrigin::Concrete);
        let c = spec.variants[2].payload.as_ref().unwrap();
        assert_eq!(c.category, PayloadCategory::Opaque);
    }

    #[test]
    fn bad_variant_does_not_abort_the_union() {
        let mut raw = RawUnion::new(ident("FooKind"));
        raw.variants = vec![
            RawVariant::unit(ident("A")),
            variant(
                "B",
                RawFields::Tuple(vec![quote!(i32), quote!(i64)], Span::call_site()),
            ),
            variant("C", RawFields::Named(Span::call_site())),
            variant("D", tuple(quote!(String))),
        ];
        let (spec, diagnostics) = validate(raw);
        let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            [
                DiagnosticKind::UnresolvedPayloadType,
                DiagnosticKind::UnresolvedPayloadType
            ]
        );
        let names: Vec<_> = spec.variants.iter().map(|v| v.name()).collect();
        assert_eq!(names, ["A", "D"]);
        assert_eq!(spec.variants[1].ordinal, 3);
        let rejected: Vec<_> = spec.rejected.iter().map(|(o, _)| *o).collect();
        assert_eq!(rejected, [1, 2]);
        assert_eq!(spec.kind_count(), 4);
    }

    #[test]
    fn generic_references() {
        let mut raw = RawUnion::new(ident("OptKind"));
        raw.generics = vec![ident("T"), ident("T")];
        raw.variants = vec![
            RawVariant {
                of: vec![spanned("T")],
                ..RawVariant::unit(ident("Some"))
            },
            RawVariant {
                of: vec![spanned("U")],
                ..RawVariant::unit(ident("Other"))
            },
            RawVariant {
                of: vec![spanned("Vec<T>")],
                ..RawVariant::unit(ident("Many"))
            },
            RawVariant {
                of: vec![spanned("Vec<(T>")],
                ..RawVariant::unit(ident("Broken"))
            },
        ];
        let (spec, diagnostics) = validate(raw);
        let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            [
                DiagnosticKind::DuplicateGenericParameter,
                DiagnosticKind::InvalidGenericPayloadReference,
                DiagnosticKind::UnresolvedPayloadType,
            ]
        );
        assert_eq!(spec.generics.len(), 1);
        let some = spec.variants[0].payload.as_ref().unwrap();
        assert_eq!(some.origin, PayloadOrigin::GenericRef);
        assert_eq!(some.category, PayloadCategory::Opaque);
        let many = spec.variants[1].payload.as_ref().unwrap();
        assert_eq!(many.origin, PayloadOrigin::Parsed);
        assert_eq!(many.type_text(), "Vec<T>");
    }

    #[test]
    fn duplicate_and_invalid_names() {
        let mut raw = RawUnion::new(ident("FooKind"));
        raw.variants = vec![
            RawVariant::unit(ident("A")),
            RawVariant {
                display_name: Some(spanned("A")),
                ..RawVariant::unit(ident("B"))
            },
            RawVariant {
                display_name: Some(spanned("1st")),
                ..RawVariant::unit(ident("C"))
            },
            RawVariant::unit(ident("FooBar")),
            RawVariant {
                display_name: Some(spanned("foo_bar")),
                ..RawVariant::unit(ident("D"))
            },
        ];
        let (spec, diagnostics) = validate(raw);
        let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            [
                DiagnosticKind::DuplicateVariantName,
                DiagnosticKind::InvalidVariantName,
                DiagnosticKind::DuplicateVariantName,
            ]
        );
        let names: Vec<_> = spec.variants.iter().map(|v| v.name()).collect();
        assert_eq!(names, ["A", "FooBar"]);
    }

    #[test]
    fn conflicting_payload_markers() {
        let mut raw = RawUnion::new(ident("FooKind"));
        raw.generics = vec![ident("T")];
        raw.variants = vec![
            RawVariant {
                of: vec![spanned("T")],
                ..variant("A", tuple(quote!(i32)))
            },
            RawVariant {
                of: vec![spanned("T"), spanned("T")],
                ..RawVariant::unit(ident("B"))
            },
            RawVariant {
                of: vec![spanned("u8, u16")],
                ..RawVariant::unit(ident("C"))
            },
        ];
        let (spec, diagnostics) = validate(raw);
        assert_eq!(diagnostics.len(), 3);
        assert!(
            diagnostics
                .iter()
                .all(|d| d.kind == DiagnosticKind::UnresolvedPayloadType)
        );
        assert!(spec.variants.is_empty());
    }

    #[test]
    fn function_types_are_not_split() {
        let ts: TokenStream = "Box<dyn Fn(u8) -> u8>".parse().unwrap();
        assert!(!has_top_level_separator(&ts));
        let ts: TokenStream = "HashMap<u8, u8>".parse().unwrap();
        assert!(!has_top_level_separator(&ts));
        let ts: TokenStream = "u8, u8".parse().unwrap();
        assert!(has_top_level_separator(&ts));
    }
}
