//! The runtime meta table: one `static` per lookup, plus the `UnionMeta`
//! tying them together.

use proc_macro2::TokenStream;
use quote::quote;
use unionize_spec::{PayloadCategory, Representation, StorageClass};

use crate::process_union::UnionCtx;

pub(crate) fn emit_meta(ctx: &UnionCtx) -> TokenStream {
    let krate = ctx.krate;
    let meta = ctx.meta_static();
    let table = &ctx.expansion.meta;

    let rows = table.rows.iter().map(|row| {
        let ordinal = row.ordinal;
        let name = &row.name;
        // only reachable alongside a duplicate wire name error
        let wire = row.wire_name.as_deref().unwrap_or(name.as_str());
        match &row.payload {
            None => quote! { #krate::VariantMeta::unit(#ordinal, #name, #wire) },
            Some(payload) => {
                let type_name = &payload.type_text;
                let category = match payload.category {
                    PayloadCategory::TriviallyCopyable => quote! { TriviallyCopyable },
                    PayloadCategory::Reference => quote! { Reference },
                    PayloadCategory::Opaque => quote! { Opaque },
                };
                let storage = match payload.storage {
                    StorageClass::OverlappedTrivial => quote! { OverlappedTrivial },
                    StorageClass::SharedReferenceSlot => quote! { SharedReferenceSlot },
                    StorageClass::Leaf => quote! { Leaf },
                    StorageClass::Dedicated | StorageClass::None => quote! { Dedicated },
                };
                quote! {
                    #krate::VariantMeta::with_payload(
                        #ordinal,
                        #name,
                        #wire,
                        #krate::PayloadMeta::new(
                            #type_name,
                            #krate::PayloadCategory::#category,
                            #krate::StorageClass::#storage,
                        ),
                    )
                }
            }
        }
    });
    let row_count = table.rows.len();

    let names = table.by_name.iter().map(|(k, v)| quote! { (#k, #v) });
    let name_count = table.by_name.len();
    let wire_names = table.by_wire_name.iter().map(|(k, v)| quote! { (#k, #v) });
    let wire_count = table.by_wire_name.len();

    let union_name = ctx.union_name().to_string();
    let kind_name = ctx.kind_name().to_string();
    let representation = match ctx.spec.representation {
        Representation::Value => quote! { Value },
        Representation::Reference => quote! { Reference },
    };

    quote! {
        static __UNIONIZE_VARIANTS: [#krate::VariantMeta; #row_count] = [#(#rows),*];
        static __UNIONIZE_NAMES: [(&str, usize); #name_count] = [#(#names),*];
        static __UNIONIZE_WIRE_NAMES: [(&str, usize); #wire_count] = [#(#wire_names),*];
        static #meta: #krate::UnionMeta = #krate::UnionMeta::new(
            #union_name,
            #kind_name,
            #krate::Representation::#representation,
            &__UNIONIZE_VARIANTS,
            &__UNIONIZE_NAMES,
            &__UNIONIZE_WIRE_NAMES,
        );
    }
}
