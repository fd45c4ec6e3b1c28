//! Value semantics shared by both representations, written against the
//! generated accessors: equality, hashing, text forms and the `Union` impl.

use proc_macro2::TokenStream;
use quote::quote;
use unionize_spec::PayloadCategory;

use crate::process_union::UnionCtx;

/// `skip(...)` in the declaration leaves out any of the first three.
pub(crate) fn emit_traits(ctx: &UnionCtx) -> TokenStream {
    let impls = ctx.spec.impls;
    let eq = impls.partial_eq.then(|| emit_partial_eq(ctx));
    let hash = impls.hash.then(|| emit_hash(ctx));
    let fmt = impls.fmt.then(|| emit_fmt(ctx));
    let union = emit_union(ctx);
    quote! {
        #eq
        #hash
        #fmt
        #union
    }
}

/// Same kind and equal payloads. Trivially-copyable payloads compare through
/// `Trivial`, so `NaN` equals `NaN`.
fn emit_partial_eq(ctx: &UnionCtx) -> TokenStream {
    let krate = ctx.krate;
    let params = ctx.ty_params();
    let self_ty = ctx.self_ty();
    let where_clause = ctx.where_bounds(quote! { ::core::cmp::PartialEq });

    let arms = ctx.variants().map(|(_, v)| {
        let kind_path = ctx.kind_path(v);
        let Some(payload) = &v.payload else {
            return quote! { #kind_path => true, };
        };
        let get = ctx.method("get", v);
        let ty = &payload.tokens;
        if payload.category == PayloadCategory::TriviallyCopyable {
            quote! {
                #kind_path => <#ty as #krate::Trivial>::trivial_eq(&self.#get(), &other.#get()),
            }
        } else {
            quote! {
                #kind_path => ::core::cmp::PartialEq::eq(self.#get(), other.#get()),
            }
        }
    });
    let rejected = ctx.rejected_arm(quote! { false });

    quote! {
        impl #params ::core::cmp::PartialEq for #self_ty #where_clause {
            fn eq(&self, other: &Self) -> bool {
                if self.kind() != other.kind() {
                    return false;
                }
                match self.kind() {
                    #(#arms)*
                    #rejected
                }
            }
        }
    }
}

/// Ordinal, then payload. Consistent with the `PartialEq` above.
fn emit_hash(ctx: &UnionCtx) -> TokenStream {
    let krate = ctx.krate;
    let params = ctx.ty_params();
    let self_ty = ctx.self_ty();
    let where_clause = ctx.where_bounds(quote! { ::core::hash::Hash });

    let arms = ctx.payload_variants().map(|(_, v, payload)| {
        let kind_path = ctx.kind_path(v);
        let get = ctx.method("get", v);
        let ty = &payload.tokens;
        if payload.category == PayloadCategory::TriviallyCopyable {
            quote! {
                #kind_path => <#ty as #krate::Trivial>::trivial_hash(&self.#get(), state),
            }
        } else {
            quote! {
                #kind_path => ::core::hash::Hash::hash(self.#get(), state),
            }
        }
    });

    quote! {
        impl #params ::core::hash::Hash for #self_ty #where_clause {
            fn hash<__H: ::core::hash::Hasher>(&self, state: &mut __H) {
                ::core::hash::Hash::hash(&self.ordinal(), state);
                match self.kind() {
                    #(#arms)*
                    #[allow(unreachable_patterns)]
                    _ => {}
                }
            }
        }
    }
}

/// `Foo.A` for unit variants, `Foo.B { <payload:?> }` otherwise. `Debug`
/// prints the same.
fn emit_fmt(ctx: &UnionCtx) -> TokenStream {
    let params = ctx.ty_params();
    let self_ty = ctx.self_ty();
    let where_clause = ctx.where_bounds(quote! { ::core::fmt::Debug });
    let union_name = ctx.union_name().to_string();

    let arms = ctx.variants().map(|(_, v)| {
        let kind_path = ctx.kind_path(v);
        match &v.payload {
            None => {
                let text = format!("{union_name}.{}", v.name());
                quote! { #kind_path => f.write_str(#text), }
            }
            Some(_) => {
                let get = ctx.method("get", v);
                let template = format!("{union_name}.{} {{{{ {{:?}} }}}}", v.name());
                quote! { #kind_path => ::core::write!(f, #template, self.#get()), }
            }
        }
    });
    let rejected = ctx.rejected_arm(quote! {
        ::core::write!(f, "{}.{}", #union_name, self.variant_name())
    });

    quote! {
        impl #params ::core::fmt::Display for #self_ty #where_clause {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                match self.kind() {
                    #(#arms)*
                    #rejected
                }
            }
        }

        impl #params ::core::fmt::Debug for #self_ty #where_clause {
            #[inline]
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(self, f)
            }
        }
    }
}

fn emit_union(ctx: &UnionCtx) -> TokenStream {
    let krate = ctx.krate;
    let params = ctx.ty_params();
    let self_ty = ctx.self_ty();
    let kind = ctx.kind_name();
    let meta = ctx.meta_static();

    quote! {
        impl #params #krate::Union for #self_ty {
            type Kind = #kind;

            const META: &'static #krate::UnionMeta = &#meta;

            #[inline]
            fn kind(&self) -> #kind {
                Self::kind(self)
            }

            #[inline]
            fn ordinal(&self) -> usize {
                Self::ordinal(self)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::union_attr;
    use quote::quote;
    use unionize_testhelpers::test;

    #[test]
    fn trivial_payloads_compare_through_trivial() {
        let out = union_attr(
            quote! {},
            quote! { enum FooKind { A, B(f64), C(Bar) } },
        )
        .to_string();
        assert!(out.contains("< f64 as :: unionize :: Trivial > :: trivial_eq"), "{out}");
        assert!(out.contains("< f64 as :: unionize :: Trivial > :: trivial_hash"), "{out}");
        assert!(out.contains(":: core :: cmp :: PartialEq :: eq (self . get_c () , other . get_c ())"), "{out}");
        assert!(out.contains("\"Foo.A\""), "{out}");
        assert!(out.contains("\"Foo.B {{ {:?} }}\""), "{out}");
        assert!(out.contains("impl :: unionize :: Union for Foo"), "{out}");
    }

    #[test]
    fn skipped_impls_are_not_emitted() {
        let out = union_attr(
            quote! { skip(Hash, Clone) },
            quote! { enum FooKind { A, B(Vec<f64>), C(Bar) } },
        )
        .to_string();
        assert!(!out.contains("compile_error"), "{out}");
        assert!(!out.contains(":: core :: hash :: Hash for Foo"), "{out}");
        assert!(!out.contains(":: core :: clone :: Clone for Foo"), "{out}");
        assert!(out.contains(":: core :: cmp :: PartialEq for Foo"), "{out}");
        assert!(out.contains(":: core :: fmt :: Display for Foo"), "{out}");

        let out = union_attr(quote! { skip(PartialEq, Debug) }, quote! { enum FooKind { A } })
            .to_string();
        assert!(!out.contains("PartialEq for Foo"), "{out}");
        assert!(!out.contains("Display for Foo"), "{out}");
        assert!(!out.contains("Debug for Foo"), "{out}");
        assert!(out.contains(":: core :: hash :: Hash for Foo"), "{out}");
        assert!(out.contains(":: unionize :: Union for Foo"), "{out}");
    }

    #[test]
    fn display_names_follow_overrides() {
        let out = union_attr(
            quote! { name = "Answer" },
            quote! {
                enum AnswerKind {
                    #[union(name = "Yes")]
                    Y,
                    N(String),
                }
            },
        )
        .to_string();
        assert!(out.contains("\"Answer.Yes\""), "{out}");
        assert!(out.contains("pub fn is_yes"), "{out}");
        assert!(out.contains("\"Answer.N {{ {:?} }}\""), "{out}");
    }
}
