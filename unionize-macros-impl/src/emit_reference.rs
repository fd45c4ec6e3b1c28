//! Reference representation: a shared handle to a private native enum, one
//! case per variant. Cloning shares the node.

use proc_macro2::TokenStream;
use quote::quote;
use unionize_spec::PayloadCategory;

use crate::process_union::UnionCtx;

pub(crate) fn emit_type(ctx: &UnionCtx) -> TokenStream {
    let krate = ctx.krate;
    let vis = &ctx.spec.vis;
    let name = ctx.union_name();
    let params = ctx.ty_params();
    let node = ctx.private_ident("Node");
    let docs = if ctx.no_doc { &[][..] } else { &ctx.spec.docs[..] };

    let cases = ctx.variants().map(|(_, v)| {
        let ident = &v.raw_name;
        match &v.payload {
            Some(payload) => {
                let ty = &payload.tokens;
                quote! { #ident(#ty) }
            }
            None => quote! { #ident },
        }
    });
    let marker = if ctx.spec.is_generic() {
        let marker = ctx.marker_ty();
        quote! { __Marker(#krate::__private::Infallible, #marker), }
    } else {
        quote! {}
    };

    quote! {
        #[doc(hidden)]
        #[allow(non_camel_case_types)]
        enum #node #params {
            #(#cases,)*
            #marker
        }

        #(#docs)*
        #vis struct #name #params {
            node: #krate::__private::Arc<#node #params>,
        }
    }
}

pub(crate) fn emit_inherent(ctx: &UnionCtx) -> TokenStream {
    let krate = ctx.krate;
    let kind = ctx.kind_name();
    let self_ty = ctx.self_ty();
    let params = ctx.ty_params();
    let meta = ctx.meta_static();
    let node = ctx.private_ident("Node");

    let marker_arm = if ctx.spec.is_generic() {
        quote! { #node::__Marker(never, _) => match *never {}, }
    } else {
        quote! {}
    };
    let kind_arms = ctx.variants().map(|(_, v)| {
        let ident = &v.raw_name;
        let kind_path = ctx.kind_path(v);
        if v.payload.is_some() {
            quote! { #node::#ident(_) => #kind_path, }
        } else {
            quote! { #node::#ident => #kind_path, }
        }
    });

    let methods = ctx.variants().map(|(_, v)| {
        let ident = &v.raw_name;
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
                self.kind() == #kind_path
            }
        };

        let Some(payload) = &v.payload else {
            let doc_make = ctx.doc(format!("Create `{name}`."));
            return quote! {
                #is_fn

                #doc_make
                pub fn #make() -> Self {
                    Self {
                        node: #krate::__private::Arc::new(#node::#ident),
                    }
                }
            };
        };

        let ty = &payload.tokens;
        let try_get = ctx.method("try_get", v);
        let get = ctx.method("get", v);
        let ret = ctx.getter_ty(payload);
        let load = if payload.category == PayloadCategory::TriviallyCopyable {
            quote! { *value }
        } else {
            quote! { value }
        };

        let doc_make = ctx.doc(format!("Create `{name}` holding `value`."));
        let doc_try_get = ctx.doc(format!("The `{name}` payload, if this is `{name}`."));
        let doc_get = ctx.doc(format!("The `{name}` payload.\n\n # Panics\n\n If this is not `{name}`."));

        quote! {
            #is_fn

            #doc_make
            pub fn #make(value: #ty) -> Self {
                Self {
                    node: #krate::__private::Arc::new(#node::#ident(value)),
                }
            }

            #doc_try_get
            #[inline]
            #[allow(unreachable_patterns)]
            pub fn #try_get(&self) -> ::core::option::Option<#ret> {
                match &*self.node {
                    #node::#ident(value) => ::core::option::Option::Some(#load),
                    _ => ::core::option::Option::None,
                }
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
    let doc_ptr_eq = ctx.doc("Whether both handles share the same node.");

    quote! {
        impl #params #self_ty {
            #doc_kind
            pub fn kind(&self) -> #kind {
                match &*self.node {
                    #(#kind_arms)*
                    #marker_arm
                }
            }

            #doc_ordinal
            #[inline]
            pub fn ordinal(&self) -> usize {
                self.kind().ordinal()
            }

            #doc_name
            #[inline]
            pub fn variant_name(&self) -> &'static str {
                self.kind().name()
            }

            #doc_ptr_eq
            #[inline]
            pub fn ptr_eq(&self, other: &Self) -> bool {
                #krate::__private::Arc::ptr_eq(&self.node, &other.node)
            }

            #(#methods)*
        }
    }
}

/// Clones share the node; no bound on the payloads.
pub(crate) fn emit_clone(ctx: &UnionCtx) -> TokenStream {
    let krate = ctx.krate;
    let params = ctx.ty_params();
    let self_ty = ctx.self_ty();

    quote! {
        impl #params ::core::clone::Clone for #self_ty {
            #[inline]
            fn clone(&self) -> Self {
                Self {
                    node: #krate::__private::Arc::clone(&self.node),
                }
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
    fn node_enum_and_handle() {
        let out = union_attr(
            quote! { reference },
            quote! {
                pub enum ExprKind { Nil, Num(f64), Text(String) }
            },
        )
        .to_string();
        assert!(!out.contains("compile_error"), "{out}");
        assert!(out.contains("enum __ExprNode { Nil , Num (f64) , Text (String) , }"), "{out}");
        assert!(out.contains("node : :: unionize :: __private :: Arc < __ExprNode >"), "{out}");
        assert!(out.contains(":: unionize :: StorageClass :: Leaf"), "{out}");
        assert!(!out.contains("RawRegion"), "{out}");
        assert!(!out.contains("__Marker"), "{out}");
    }

    #[test]
    fn generic_nodes_get_an_uninhabited_marker() {
        let out = union_attr(
            quote! { reference, generics(T) },
            quote! {
                enum TreeKind {
                    Leaf,
                    #[union(of = "Vec<Tree<T>>")]
                    Branch,
                    #[union(of = "T")]
                    Value,
                }
            },
        )
        .to_string();
        assert!(!out.contains("compile_error"), "{out}");
        assert!(out.contains("__Marker (:: unionize :: __private :: Infallible"), "{out}");
        assert!(out.contains("match * never { }"), "{out}");
        // recursive payloads are fine behind the shared handle
        assert!(out.contains("Branch (Vec < Tree < T"), "{out}");
    }
}
