use proc_macro2::{Delimiter, Ident, TokenStream, TokenTree};

/// How a payload type behaves, decided from its syntax.
///
/// The generated code asserts each classification against the type system
/// (`Trivial` for trivially-copyable payloads, `Any + Send + Sync` for
/// reference payloads), so a wrong guess is a compile error, never UB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadCategory {
    /// Fixed-size, bitwise copyable, no drop glue
    TriviallyCopyable,
    /// An owning heap handle that can live behind `dyn Any`
    Reference,
    /// Anything else, including generic parameters
    Opaque,
}

const SCALARS: &[&str] = &[
    "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64", "i128", "isize", "f32",
    "f64", "bool", "char",
];

const HANDLES: &[&str] = &["String", "Box", "Vec", "Arc"];

/// Names that may appear inside a reference payload. Anything outside this
/// list might be `!Send`, `!Sync` or non-`'static`, so it stays opaque.
const STD_NAMES: &[&str] = &[
    "std",
    "alloc",
    "core",
    "string",
    "boxed",
    "vec",
    "sync",
    "collections",
    "str",
    "String",
    "Box",
    "Vec",
    "Arc",
    "Option",
    "VecDeque",
    "HashMap",
    "HashSet",
    "BTreeMap",
    "BTreeSet",
];

const THREAD_UNSAFE: &[&str] = &["Rc", "Cell", "RefCell", "UnsafeCell", "Weak"];

impl PayloadCategory {
    /// Short lowercase name, as used in the runtime meta table.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PayloadCategory::TriviallyCopyable => "trivially_copyable",
            PayloadCategory::Reference => "reference",
            PayloadCategory::Opaque => "opaque",
        }
    }
}

/// Classify a payload type. Total: every input lands in exactly one class.
pub fn classify(tokens: &TokenStream, generics: &[Ident]) -> PayloadCategory {
    let trees: Vec<TokenTree> = tokens.clone().into_iter().collect();

    if mentions_generic(&trees, generics) {
        return PayloadCategory::Opaque;
    }
    if is_trivial(&trees) {
        return PayloadCategory::TriviallyCopyable;
    }
    if is_reference(&trees) {
        return PayloadCategory::Reference;
    }
    PayloadCategory::Opaque
}

fn mentions_generic(trees: &[TokenTree], generics: &[Ident]) -> bool {
    trees.iter().any(|tt| match tt {
        TokenTree::Ident(ident) => generics.iter().any(|g| g == ident),
        TokenTree::Group(group) => {
            let inner: Vec<TokenTree> = group.stream().into_iter().collect();
            mentions_generic(&inner, generics)
        }
        _ => false,
    })
}

fn is_trivial(trees: &[TokenTree]) -> bool {
    match trees {
        [TokenTree::Ident(ident)] => SCALARS.contains(&ident.to_string().as_str()),
        [TokenTree::Group(group)] if group.delimiter() == Delimiter::Bracket => {
            let inner: Vec<TokenTree> = group.stream().into_iter().collect();
            let Some(semi) = inner
                .iter()
                .position(|tt| matches!(tt, TokenTree::Punct(p) if p.as_char() == ';'))
            else {
                return false;
            };
            is_trivial(&inner[..semi])
        }
        // `(T)` is just `T`
        [TokenTree::Group(group)] if group.delimiter() == Delimiter::Parenthesis => {
            let inner: Vec<TokenTree> = group.stream().into_iter().collect();
            !inner.is_empty() && is_trivial(&inner)
        }
        _ => false,
    }
}

fn is_reference(trees: &[TokenTree]) -> bool {
    // The outermost named type: last path segment before the first `<`.
    let mut head = None;
    for tt in trees {
        match tt {
            TokenTree::Ident(ident) => head = Some(ident.to_string()),
            TokenTree::Punct(p) if p.as_char() == ':' => {}
            TokenTree::Punct(p) if p.as_char() == '<' => break,
            _ => return false,
        }
    }
    let Some(head) = head else {
        return false;
    };
    HANDLES.contains(&head.as_str()) && only_std_names(trees)
}

fn only_std_names(trees: &[TokenTree]) -> bool {
    trees.iter().all(|tt| match tt {
        TokenTree::Ident(ident) => {
            let name = ident.to_string();
            !THREAD_UNSAFE.contains(&name.as_str())
                && (STD_NAMES.contains(&name.as_str()) || SCALARS.contains(&name.as_str()))
        }
        TokenTree::Punct(p) => matches!(p.as_char(), ':' | '<' | '>' | ',' | ';'),
        TokenTree::Group(group) => match group.delimiter() {
            Delimiter::Bracket | Delimiter::Parenthesis => {
                let inner: Vec<TokenTree> = group.stream().into_iter().collect();
                only_std_names(&inner)
            }
            _ => false,
        },
        TokenTree::Literal(_) => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proc_macro2::Span;
    use quote::quote;
    use unionize_testhelpers::test;

    fn t() -> Vec<Ident> {
        vec![Ident::new("T", Span::call_site())]
    }

    #[test]
    fn scalars_and_arrays_are_trivial() {
        for ty in [quote!(i32), quote!(f64), quote!(bool), quote!([u8; 16])] {
            assert_eq!(
                classify(&ty, &[]),
                PayloadCategory::TriviallyCopyable,
                "{ty}"
            );
        }
        assert_eq!(
            classify(&quote!([[f32; 4]; 4]), &[]),
            PayloadCategory::TriviallyCopyable
        );
    }

    #[test]
    fn heap_handles_are_references() {
        for ty in [
            quote!(String),
            quote!(Vec<u8>),
            quote!(Box<str>),
            quote!(std::sync::Arc<String>),
            quote!(Vec<(u32, String)>),
        ] {
            assert_eq!(classify(&ty, &[]), PayloadCategory::Reference, "{ty}");
        }
    }

    #[test]
    fn everything_else_is_opaque() {
        for ty in [
            quote!(Foo),
            quote!(Option<i32>),
            quote!(Vec<Foo>),
            quote!(Box<dyn Fn()>),
            quote!(Vec<Rc<u8>>),
            quote!(Box<RefCell<u8>>),
            quote!(&'static str),
            quote!(Vec<*const u8>),
            quote!((i32, f64)),
        ] {
            assert_eq!(classify(&ty, &[]), PayloadCategory::Opaque, "{ty}");
        }
    }

    #[test]
    fn generics_are_opaque() {
        assert_eq!(classify(&quote!(T), &t()), PayloadCategory::Opaque);
        assert_eq!(classify(&quote!(Vec<T>), &t()), PayloadCategory::Opaque);
        assert_eq!(classify(&quote!([T; 2]), &t()), PayloadCategory::Opaque);
    }
}
