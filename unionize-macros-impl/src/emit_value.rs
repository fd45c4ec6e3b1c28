//! Value representation: the discriminant next to the storage chosen by the
//! planner.
//!
//! ```text
//! struct Foo {
//!     kind: FooKind,
//!     region: RawRegion<__FooRegion>,   // overlapped trivially-copyable payloads
//!     shared: Option<RefSlot>,          // shared reference payloads
//!     slot_c: Option<C>,                // one per dedicated payload
//! }
//! ```

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote, quote_spanned};
use unionize_spec::{PayloadCategory, StorageClass, VariantSpec};

use crate::process_union::UnionCtx;

fn slot_field(variant: &VariantSpec) -> Ident {
    format_ident!("slot_{}", variant.method_stem())
}

fn region_member(variant: &VariantSpec) -> Ident {
    format_ident!("m_{}", variant.method_stem())
}

pub(crate) fn emit_type(ctx: &UnionCtx) -> TokenStream {
    let krate = ctx.krate;
    let vis = &ctx.spec.vis;
    let name = ctx.union_name();
    let kind = ctx.kind_name();
    let params = ctx.ty_params();
    let docs = if ctx.no_doc { &[][..] } else { &ctx.spec.docs[..] };

    let mut fields = vec![quote! { kind: #kind }];
    let mut witness = quote! {};

    if ctx.plan.has_region() {
        let region_ty = ctx.private_ident("Region");
        let members = ctx.plan.region_members().filter_map(|i| {
            let v = ctx.spec.variants.get(i)?;
            let ty = &v.payload.as_ref()?.tokens;
            let member = region_member(v);
            Some(quote! { #member: #ty })
        });
        witness = quote! {
            #[doc(hidden)]
            #[allow(non_camel_case_types, dead_code)]
            #[repr(C)]
            #[derive(Clone, Copy)]
            union #region_ty {
                #(#members),*
            }
        };
        fields.push(quote! { region: #krate::RawRegion<#region_ty> });
    }

    if ctx.plan.has_shared_slot() {
        fields.push(quote! { shared: ::core::option::Option<#krate::RefSlot> });
    }

    for i in ctx.plan.dedicated_members() {
        let Some(v) = ctx.spec.variants.get(i) else {
            continue;
        };
        let Some(payload) = &v.payload else {
            continue;
        };
        let field = slot_field(v);
        let ty = &payload.tokens;
        fields.push(quote! { #field: ::core::option::Option<#ty> });
    }

    if ctx.spec.is_generic() {
        let marker = ctx.marker_ty();
        fields.push(quote! { _marker: #marker });
    }

    quote! {
        #witness

        #(#docs)*
        #vis struct #name #params {
            #(#fields),*
        }
    }
}

/// Field initializers of a union holding nothing.
fn empty_fields(ctx: &UnionCtx) -> Vec<TokenStream> {
    let krate = ctx.krate;
    let mut fields = Vec::new();
    if ctx.plan.has_region() {
        fields.push(quote! { region: #krate::RawRegion::uninit() });
    }
    if ctx.plan.has_shared_slot() {
        fields.push(quote! { shared: ::core::option::Option::None });
    }
    for i in ctx.plan.dedicated_members() {
        if let Some(v) = ctx.spec.variants.get(i) {
            let field = slot_field(v);
            fields.push(quote! { #field: ::core::option::Option::None });
        }
    }
    if ctx.spec.is_generic() {
        fields.push(quote! { _marker: #krate::__private::PhantomData });
    }
    fields
}

pub(crate) fn emit_inherent(ctx: &UnionCtx) -> TokenStream {
    let krate = ctx.krate;
    let kind = ctx.kind_name();
    let self_ty = ctx.self_ty();
    let params = ctx.ty_params();
    let meta = ctx.meta_static();
    let empty = empty_fields(ctx);

    let methods = ctx.variants().map(|(index, v)| {
        let kind_path = ctx.kind_path(v);
        let name = v.name();
        let is = ctx.method("is", v);
        let make = ctx.method("make", v);
        let ordinal = v.ordinal;

        let doc_is = ctx.doc(format!("Whether this is `{name}`."));
        let is_fn = quote! {
            #doc_is
            #[inline]
            pub fn #is(&self) -> bool {
                ::core::matches!(self.kind, #kind_path)
            }
        };

        let Some(payload) = &v.payload else {
            let doc_make = ctx.doc(format!("Create `{name}`."));
            return quote! {
                #is_fn

                #doc_make
                #[inline]
                pub const fn #make() -> Self {
                    Self::__empty(#kind_path)
                }
            };
        };

        let ty = &payload.tokens;
        let try_get = ctx.method("try_get", v);
        let get = ctx.method("get", v);
        let ret = ctx.getter_ty(payload);
        let trivial = payload.category == PayloadCategory::TriviallyCopyable;

        let (store, load) = match ctx.storage(index) {
            StorageClass::OverlappedTrivial => (
                quote! { region: #krate::RawRegion::new::<#ty>(value) },
                quote! {
                    // SAFETY: the kind says this member was the last one written.
                    ::core::option::Option::Some(unsafe { self.region.read::<#ty>() })
                },
            ),
            StorageClass::SharedReferenceSlot => (
                quote! { shared: ::core::option::Option::Some(#krate::RefSlot::new::<#ty>(value)) },
                quote! {
                    self.shared
                        .as_ref()
                        .and_then(|slot| slot.downcast_ref::<#ty>())
                },
            ),
            _ => {
                let field = slot_field(v);
                let load = if trivial {
                    quote! { self.#field }
                } else {
                    quote! { self.#field.as_ref() }
                };
                (quote! { #field: ::core::option::Option::Some(value) }, load)
            }
        };

        let doc_make = ctx.doc(format!("Create `{name}` holding `value`."));
        let doc_try_get = ctx.doc(format!("The `{name}` payload, if this is `{name}`."));
        let doc_get = ctx.doc(format!("The `{name}` payload.\n\n # Panics\n\n If this is not `{name}`."));

        quote! {
            #is_fn

            #doc_make
            #[inline]
            pub fn #make(value: #ty) -> Self {
                Self {
                    #store,
                    ..Self::__empty(#kind_path)
                }
            }

            #doc_try_get
            #[inline]
            pub fn #try_get(&self) -> ::core::option::Option<#ret> {
                if !self.#is() {
                    return ::core::option::Option::None;
                }
                #load
            }

            #doc_get
            #[inline]
            #[track_caller]
            pub fn #get(&self) -> #ret {
                match self.#try_get() {
                    ::core::option::Option::Some(value) => value,
                    ::core::option::Option::None => {
                        #krate::__private::wrong_variant(&#meta, #ordinal, self.ordinal())
                    }
                }
            }
        }
    });

    let doc_kind = ctx.doc("Active kind.");
    let doc_ordinal = ctx.doc("Declaration position of the active kind.");
    let doc_name = ctx.doc("Display name of the active kind.");
    let asserts = emit_payload_asserts(ctx);

    quote! {
        impl #params #self_ty {
            const fn __empty(kind: #kind) -> Self {
                Self {
                    kind,
                    #(#empty,)*
                }
            }

            #doc_kind
            #[inline]
            pub fn kind(&self) -> #kind {
                self.kind
            }

            #doc_ordinal
            #[inline]
            pub fn ordinal(&self) -> usize {
                self.kind.ordinal()
            }

            #doc_name
            #[inline]
            pub fn variant_name(&self) -> &'static str {
                self.kind.name()
            }

            #(#methods)*
        }

        #asserts
    }
}

/// Point at the payload type when it cannot live where it was planned.
fn emit_payload_asserts(ctx: &UnionCtx) -> TokenStream {
    let krate = ctx.krate;
    let checks = ctx.payload_variants().filter_map(|(index, _, payload)| {
        let ty = &payload.tokens;
        let span = payload.tokens.clone().into_iter().next()?.span();
        match ctx.storage(index) {
            StorageClass::OverlappedTrivial => Some(quote_spanned! { span =>
                #krate::__private::assert_trivial::<#ty>();
            }),
            StorageClass::SharedReferenceSlot => Some(quote_spanned! { span =>
                #krate::__private::assert_shared::<#ty>();
            }),
            _ => None,
        }
    });
    quote! {
        const _: () = {
            #(#checks)*
        };
    }
}

pub(crate) fn emit_clone(ctx: &UnionCtx) -> TokenStream {
    let krate = ctx.krate;
    let params = ctx.ty_params();
    let self_ty = ctx.self_ty();
    let where_clause = ctx.where_bounds(quote! { ::core::clone::Clone });

    let mut fields = vec![quote! { kind: self.kind }];
    if ctx.plan.has_region() {
        fields.push(quote! { region: self.region });
    }
    if ctx.plan.has_shared_slot() {
        let arms = ctx.plan.shared_members().filter_map(|i| {
            let v = ctx.spec.variants.get(i)?;
            let ty = &v.payload.as_ref()?.tokens;
            let kind_path = ctx.kind_path(v);
            Some(quote! {
                #kind_path => self.shared.as_ref().and_then(|slot| slot.clone_as::<#ty>()),
            })
        });
        fields.push(quote! {
            shared: match self.kind {
                #(#arms)*
                #[allow(unreachable_patterns)]
                _ => ::core::option::Option::None,
            }
        });
    }
    for i in ctx.plan.dedicated_members() {
        if let Some(v) = ctx.spec.variants.get(i) {
            let field = slot_field(v);
            fields.push(quote! { #field: ::core::clone::Clone::clone(&self.#field) });
        }
    }
    if ctx.spec.is_generic() {
        fields.push(quote! { _marker: #krate::__private::PhantomData });
    }

    quote! {
        impl #params ::core::clone::Clone for #self_ty #where_clause {
            fn clone(&self) -> Self {
                Self {
                    #(#fields),*
                }
            }
        }
    }
}
