use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};
use unionize_spec::pipeline::{self, Expansion};
use unionize_spec::{
    PayloadCategory, PayloadType, StorageClass, StoragePlan, UnionSpec, VariantSpec,
};

use crate::parse::{Declaration, KindEnumDecl, parse_declaration};
use crate::{emit_codec, emit_meta, emit_reference, emit_traits, emit_value, is_no_doc};

/// Entry point of `#[unionize::union(...)]`.
///
/// The kind enum is always re-emitted (without payloads) so that code naming
/// it keeps resolving; diagnostics are emitted next to whatever could be
/// generated for the surviving variants.
pub fn union_attr(attr: TokenStream, item: TokenStream) -> TokenStream {
    let Declaration {
        kind_enum,
        raw,
        mut diagnostics,
    } = match parse_declaration(attr, item) {
        Ok(decl) => decl,
        Err(diagnostic) => return diagnostic.to_compile_error(),
    };

    let expansion = pipeline::run(raw);
    diagnostics.extend(expansion.diagnostics.iter().cloned());

    let ctx = UnionCtx::new(&expansion, is_no_doc());
    let kind_tokens = emit_kind_enum(&kind_enum);
    let kind_impl = emit_kind_impl(&ctx);
    let meta_statics = emit_meta::emit_meta(&ctx);

    let (type_defs, inherent) = match ctx.spec.representation {
        unionize_spec::Representation::Value => (
            emit_value::emit_type(&ctx),
            emit_value::emit_inherent(&ctx),
        ),
        unionize_spec::Representation::Reference => (
            emit_reference::emit_type(&ctx),
            emit_reference::emit_inherent(&ctx),
        ),
    };
    let clone_impl = match ctx.spec.representation {
        _ if !ctx.spec.impls.clone => quote! {},
        unionize_spec::Representation::Value => emit_value::emit_clone(&ctx),
        unionize_spec::Representation::Reference => emit_reference::emit_clone(&ctx),
    };
    let traits = emit_traits::emit_traits(&ctx);
    let codec = match &ctx.spec.json {
        Some(_) => emit_codec::emit_codec(&ctx),
        None => quote! {},
    };
    let errors = diagnostics.iter().map(|d| d.to_compile_error());

    quote! {
        #(#errors)*
        #kind_tokens
        #type_defs

        const _: () = {
            #meta_statics
            #kind_impl
            #inherent
            #clone_impl
            #traits
            #codec
        };
    }
}

/// Name of the meta table static inside the generated `const _` block.
pub(crate) const META_STATIC: &str = "__UNIONIZE_META";

/// Shared view of one expansion, with the helpers every emitter needs.
pub(crate) struct UnionCtx<'a> {
    pub spec: &'a UnionSpec,
    pub plan: &'a StoragePlan,
    pub expansion: &'a Expansion,
    pub krate: &'a TokenStream,
    pub no_doc: bool,
}

impl<'a> UnionCtx<'a> {
    pub fn new(expansion: &'a Expansion, no_doc: bool) -> Self {
        UnionCtx {
            spec: &expansion.spec,
            plan: &expansion.plan,
            expansion,
            krate: &expansion.spec.crate_path,
            no_doc,
        }
    }

    pub fn union_name(&self) -> &Ident {
        &self.spec.union_name
    }

    pub fn kind_name(&self) -> &Ident {
        &self.spec.kind_name
    }

    /// `<T, U>`, or nothing.
    pub fn ty_params(&self) -> TokenStream {
        if self.spec.generics.is_empty() {
            return quote! {};
        }
        let params = &self.spec.generics;
        quote! { <#(#params),*> }
    }

    /// `Foo<T, U>`
    pub fn self_ty(&self) -> TokenStream {
        let name = self.union_name();
        let params = self.ty_params();
        quote! { #name #params }
    }

    /// `where T: <bounds>, U: <bounds>`, or nothing.
    pub fn where_bounds(&self, bounds: TokenStream) -> TokenStream {
        if self.spec.generics.is_empty() {
            return quote! {};
        }
        let params = &self.spec.generics;
        quote! { where #(#params: #bounds),* }
    }

    /// `PhantomData<fn() -> (T, U,)>`, tying otherwise unused parameters to
    /// the type without affecting auto traits.
    pub fn marker_ty(&self) -> TokenStream {
        let krate = self.krate;
        let params = &self.spec.generics;
        quote! { #krate::__private::PhantomData<fn() -> (#(#params,)*)> }
    }

    pub fn meta_static(&self) -> Ident {
        Ident::new(META_STATIC, Span::call_site())
    }

    pub fn doc(&self, text: impl AsRef<str>) -> TokenStream {
        if self.no_doc {
            return quote! {};
        }
        let text = format!(" {}", text.as_ref());
        quote! { #[doc = #text] }
    }

    /// `FooKind::B`
    pub fn kind_path(&self, variant: &VariantSpec) -> TokenStream {
        let kind = self.kind_name();
        let ident = &variant.raw_name;
        quote! { #kind::#ident }
    }

    pub fn storage(&self, index: usize) -> StorageClass {
        self.plan.storage_of(index)
    }

    /// Surviving variants with their index in the plan.
    pub fn variants(&self) -> impl Iterator<Item = (usize, &'a VariantSpec)> + 'a {
        self.spec.variants.iter().enumerate()
    }

    /// Surviving payload variants.
    pub fn payload_variants(
        &self,
    ) -> impl Iterator<Item = (usize, &'a VariantSpec, &'a PayloadType)> + 'a {
        self.variants()
            .filter_map(|(i, v)| v.payload.as_ref().map(|p| (i, v, p)))
    }

    pub fn method(&self, prefix: &str, variant: &VariantSpec) -> Ident {
        format_ident!("{}_{}", prefix, variant.method_stem(), span = variant.span)
    }

    /// What `try_get_*` wraps in `Option`: the payload by value when it is
    /// trivially copyable, a reference otherwise.
    pub fn getter_ty(&self, payload: &PayloadType) -> TokenStream {
        let ty = &payload.tokens;
        if payload.category == PayloadCategory::TriviallyCopyable {
            quote! { #ty }
        } else {
            quote! { &#ty }
        }
    }

    /// Catch-all arm for kinds that validation dropped, when there are any.
    pub fn rejected_arm(&self, body: TokenStream) -> TokenStream {
        if self.spec.rejected.is_empty() {
            return quote! {};
        }
        quote! {
            #[allow(unreachable_patterns)]
            _ => #body,
        }
    }

    /// Private type name derived from the union name, e.g. `__FooRegion`.
    pub fn private_ident(&self, suffix: &str) -> Ident {
        format_ident!("__{}{}", self.union_name(), suffix)
    }
}

/// The kind enum, stripped of payloads and `#[union]` helpers, with the
/// derives every union relies on added when missing.
fn emit_kind_enum(decl: &KindEnumDecl) -> TokenStream {
    let KindEnumDecl {
        attrs,
        derives,
        vis,
        name,
        variants,
    } = decl;

    let mut missing = Vec::new();
    if !derives.clone {
        missing.push(quote! { Clone });
    }
    if !derives.copy {
        missing.push(quote! { Copy });
    }
    if !derives.partial_eq {
        missing.push(quote! { PartialEq });
    }
    if !derives.eq {
        missing.push(quote! { Eq });
    }
    if !derives.hash {
        missing.push(quote! { Hash });
    }
    if !derives.debug {
        missing.push(quote! { Debug });
    }
    let derive = if missing.is_empty() {
        quote! {}
    } else {
        quote! { #[derive(#(#missing),*)] }
    };

    let variants = variants.iter().map(|v| {
        let attrs = &v.attrs;
        let ident = &v.name;
        let discriminant = v.discriminant.as_ref().map(|d| quote! { = #d });
        quote! { #(#attrs)* #ident #discriminant }
    });

    quote! {
        #(#attrs)*
        #derive
        #vis enum #name {
            #(#variants),*
        }
    }
}

fn emit_kind_impl(ctx: &UnionCtx) -> TokenStream {
    let kind = ctx.kind_name();
    let meta = ctx.meta_static();

    // every kind, surviving or not, by ordinal
    let mut all: Vec<(usize, Ident, String)> = ctx
        .spec
        .variants
        .iter()
        .map(|v| (v.ordinal, v.raw_name.clone(), v.name()))
        .chain(
            ctx.spec
                .rejected
                .iter()
                .map(|(ordinal, ident)| (*ordinal, ident.clone(), ident.to_string())),
        )
        .collect();
    all.sort_by_key(|(ordinal, _, _)| *ordinal);

    let count = all.len();
    let idents: Vec<&Ident> = all.iter().map(|(_, ident, _)| ident).collect();
    let ordinals: Vec<usize> = all.iter().map(|(ordinal, _, _)| *ordinal).collect();
    let names: Vec<&String> = all.iter().map(|(_, _, name)| name).collect();

    let doc_all = ctx.doc("Every kind, in declaration order.");
    let doc_ordinal = ctx.doc("Zero-based declaration position.");
    let doc_name = ctx.doc("Display name of this kind.");
    let doc_from_ordinal = ctx.doc("The kind at a declaration position.");
    let doc_from_name = ctx.doc("The kind with the given display name.");

    quote! {
        impl #kind {
            #doc_all
            pub const ALL: [#kind; #count] = [#(#kind::#idents),*];

            #doc_ordinal
            pub const fn ordinal(self) -> usize {
                match self {
                    #(#kind::#idents => #ordinals,)*
                }
            }

            #doc_name
            pub const fn name(self) -> &'static str {
                match self {
                    #(#kind::#idents => #names,)*
                }
            }

            #doc_from_ordinal
            pub const fn from_ordinal(ordinal: usize) -> ::core::option::Option<Self> {
                match ordinal {
                    #(#ordinals => ::core::option::Option::Some(#kind::#idents),)*
                    _ => ::core::option::Option::None,
                }
            }

            #doc_from_name
            pub fn from_name(name: &str) -> ::core::option::Option<Self> {
                #meta.kind_by_name(name).and_then(Self::from_ordinal)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;
    use unionize_testhelpers::test;

    fn expand(attr: TokenStream, item: TokenStream) -> String {
        union_attr(attr, item).to_string()
    }

    #[test]
    fn kind_enum_gets_missing_derives() {
        let out = expand(
            quote! {},
            quote! {
                #[derive(Debug, Clone)]
                pub enum FooKind { A, B(i32), C(String) }
            },
        );
        assert!(out.contains("# [derive (Copy , PartialEq , Eq , Hash)]"), "{out}");
        assert!(out.contains("pub enum FooKind { A , B , C }"), "{out}");
        assert!(!out.contains("compile_error"), "{out}");
    }

    #[test]
    fn diagnostics_become_compile_errors() {
        let out = expand(
            quote! {},
            quote! {
                enum FooKind {
                    #[union(wire = "x")]
                    A,
                    #[union(wire = "x")]
                    B,
                }
            },
        );
        assert!(out.contains("compile_error"), "{out}");
        assert!(out.contains("union::duplicate_wire_name"), "{out}");
        // the rest is still emitted
        assert!(out.contains("struct Foo"), "{out}");
    }

    #[test]
    fn rejected_variants_stay_in_the_kind_enum() {
        let out = expand(
            quote! {},
            quote! {
                enum FooKind { A, B { x: i32 }, C(u8) }
            },
        );
        assert!(out.contains("union::unresolved_payload_type"), "{out}");
        assert!(out.contains("enum FooKind { A , B , C }"), "{out}");
        assert!(out.contains("unreachable_patterns"), "{out}");
    }

    #[test]
    fn non_enum_items_are_refused() {
        let out = expand(quote! {}, quote! { struct Foo; });
        assert!(out.contains("union::unsupported_item"), "{out}");
    }
}
