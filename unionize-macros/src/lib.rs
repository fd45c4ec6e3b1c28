#![doc = include_str!("../README.md")]

/// Turn a discriminant enum into a tagged union.
///
/// See the `unionize` crate for the accepted arguments.
#[proc_macro_attribute]
pub fn union(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    unionize_macros_impl::union_attr(attr.into(), item.into()).into()
}
