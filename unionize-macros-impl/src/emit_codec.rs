use proc_macro2::TokenStream;
use quote::quote;
use unionize_spec::{JsonMode, PayloadCategory};

use crate::process_union::UnionCtx;

/// `WireUnion` plus serde impls delegating to the envelope codec.
pub(crate) fn emit_codec(ctx: &UnionCtx) -> TokenStream {
    let Some(options) = &ctx.spec.json else {
        return quote! {};
    };
    let krate = ctx.krate;
    let params = ctx.ty_params();
    let self_ty = ctx.self_ty();
    let kind = ctx.kind_name();
    let meta = ctx.meta_static();
    let generics = &ctx.spec.generics;
    let serde = quote! { #krate::__private::serde };
    let json = quote! { #krate::json };
    let value = quote! { #krate::__private::serde_json::Value };
    let where_clause =
        ctx.where_bounds(quote! { #serde::Serialize + #serde::de::DeserializeOwned });

    let mode = match options.mode {
        JsonMode::External => quote! { External },
        JsonMode::Tuple => quote! { Tuple },
        JsonMode::Adjacent => quote! { Adjacent },
    };
    let tag_field = &options.tag_field;
    let content_field = &options.content_field;
    let numeric_tag = options.numeric_tag;

    let encode_arms = ctx.variants().map(|(_, v)| {
        let kind_path = ctx.kind_path(v);
        let ordinal = v.ordinal;
        match &v.payload {
            None => quote! { #kind_path => ::core::result::Result::Ok(#value::Null), },
            Some(payload) => {
                let get = ctx.method("get", v);
                let arg = if payload.category == PayloadCategory::TriviallyCopyable {
                    quote! { &self.#get() }
                } else {
                    quote! { self.#get() }
                };
                quote! { #kind_path => #json::encode_payload(&#meta, #ordinal, #arg), }
            }
        }
    });
    let rejected = ctx.rejected_arm(quote! { ::core::result::Result::Ok(#value::Null) });

    let decode_arms = ctx.variants().map(|(_, v)| {
        let kind_path = ctx.kind_path(v);
        let make = ctx.method("make", v);
        match &v.payload {
            None => quote! {
                ::core::option::Option::Some(#kind_path) => {
                    #json::decode_unit(&#meta, ordinal, content)?;
                    ::core::result::Result::Ok(Self::#make())
                }
            },
            Some(payload) => {
                let ty = &payload.tokens;
                quote! {
                    ::core::option::Option::Some(#kind_path) => {
                        #json::decode_payload::<#ty>(&#meta, ordinal, content).map(Self::#make)
                    }
                }
            }
        }
    });

    quote! {
        impl #params #json::WireUnion for #self_ty #where_clause {
            const OPTIONS: #json::JsonOptions = #json::JsonOptions::new()
                .mode(#json::JsonMode::#mode)
                .tag_field(#tag_field)
                .content_field(#content_field)
                .numeric_tag(#numeric_tag);

            fn encode_content(&self) -> ::core::result::Result<#value, #json::EncodeError> {
                match self.kind() {
                    #(#encode_arms)*
                    #rejected
                }
            }

            fn decode_content(
                ordinal: usize,
                content: #value,
            ) -> ::core::result::Result<Self, #json::DecodeError> {
                match #kind::from_ordinal(ordinal) {
                    #(#decode_arms)*
                    _ => ::core::result::Result::Err(#json::unknown_ordinal(&#meta, ordinal)),
                }
            }
        }

        impl #params #serde::Serialize for #self_ty #where_clause {
            fn serialize<__S>(&self, serializer: __S) -> ::core::result::Result<__S::Ok, __S::Error>
            where
                __S: #serde::Serializer,
            {
                #json::serialize(self, serializer)
            }
        }

        impl<'de, #(#generics,)*> #serde::Deserialize<'de> for #self_ty #where_clause {
            fn deserialize<__D>(deserializer: __D) -> ::core::result::Result<Self, __D::Error>
            where
                __D: #serde::Deserializer<'de>,
            {
                #json::deserialize(deserializer)
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
    fn options_are_baked_into_the_impl() {
        let out = union_attr(
            quote! { json(mode = "adjacent", tag = "t", content = "c") },
            quote! {
                enum FooKind { A, B(i32), C(Bar) }
            },
        )
        .to_string();
        assert!(!out.contains("compile_error"), "{out}");
        assert!(out.contains("impl :: unionize :: json :: WireUnion for Foo"), "{out}");
        assert!(out.contains(". mode (:: unionize :: json :: JsonMode :: Adjacent)"), "{out}");
        assert!(out.contains(". tag_field (\"t\") . content_field (\"c\") . numeric_tag (false)"), "{out}");
        assert!(out.contains("decode_payload :: < i32 >"), "{out}");
        assert!(out.contains("decode_unit"), "{out}");
        assert!(out.contains("impl < 'de , > :: unionize :: __private :: serde :: Deserialize < 'de > for Foo"), "{out}");
    }

    #[test]
    fn no_json_no_codec() {
        let out = union_attr(quote! {}, quote! { enum FooKind { A } }).to_string();
        assert!(!out.contains("WireUnion"), "{out}");
        assert!(!out.contains("Serialize"), "{out}");
    }

    #[test]
    fn generic_codecs_bound_every_parameter() {
        let out = union_attr(
            quote! { json, generics(T) },
            quote! {
                enum WrapKind {
                    #[union(of = "T")]
                    Item,
                }
            },
        )
        .to_string();
        assert!(
            out.contains("where T : :: unionize :: __private :: serde :: Serialize + :: unionize :: __private :: serde :: de :: DeserializeOwned"),
            "{out}"
        );
        assert!(out.contains("impl < 'de , T , >"), "{out}");
    }
}
