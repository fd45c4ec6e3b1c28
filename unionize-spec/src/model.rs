//! Declarations as handed over by the front end, and the validated union
//! specification the rest of the pipeline consumes.

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

use crate::{PayloadCategory, RenameRule};

/// A value together with the span it was written at.
#[derive(Debug, Clone)]
pub struct Spanned<T> {
    /// The value
    pub value: T,
    /// Where it came from
    pub span: Span,
}

impl<T> Spanned<T> {
    /// Pair a value with a span.
    pub const fn new(value: T, span: Span) -> Self {
        Spanned { value, span }
    }
}

/// How the union is laid out in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Representation {
    /// A plain struct with a discriminant and per-plan storage
    #[default]
    Value,
    /// A shared handle to a private native enum
    Reference,
}

/// Where the tag goes in the JSON envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JsonMode {
    /// `{ "<tag>": <payload> }`
    #[default]
    External,
    /// `[ "<tag>", <payload> ]`
    Tuple,
    /// `{ "<tagField>": "<tag>", "<contentField>": <payload> }`
    Adjacent,
}

impl JsonMode {
    /// Parse the name used in `json(mode = "...")`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "external" | "External" => Some(JsonMode::External),
            "tuple" | "Tuple" => Some(JsonMode::Tuple),
            "adjacent" | "Adjacent" => Some(JsonMode::Adjacent),
            _ => None,
        }
    }
}

/// Compile-time JSON codec options, from `json(...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonOptions {
    /// Envelope shape
    pub mode: JsonMode,
    /// Tag field name (adjacent mode only)
    pub tag_field: String,
    /// Content field name (adjacent mode only)
    pub content_field: String,
    /// Write ordinals instead of names
    pub numeric_tag: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        JsonOptions {
            mode: JsonMode::External,
            tag_field: "tag".to_string(),
            content_field: "content".to_string(),
            numeric_tag: false,
        }
    }
}

/// Standard trait impls generated for a union.
///
/// Each one needs the same trait on every concrete payload, so a union whose
/// payloads lack it leaves it out with `skip(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeneratedImpls {
    /// `PartialEq`
    pub partial_eq: bool,
    /// `Hash`
    pub hash: bool,
    /// `Display`, and `Debug` printing the same text
    pub fmt: bool,
    /// `Clone`
    pub clone: bool,
}

impl Default for GeneratedImpls {
    fn default() -> Self {
        GeneratedImpls {
            partial_eq: true,
            hash: true,
            fmt: true,
            clone: true,
        }
    }
}

impl GeneratedImpls {
    /// Leave out the impl of the named trait. Returns `false` if the name is
    /// not one of the generated traits.
    pub fn skip(&mut self, trait_name: &str) -> bool {
        match trait_name {
            "PartialEq" => self.partial_eq = false,
            "Hash" => self.hash = false,
            "Display" | "Debug" => self.fmt = false,
            "Clone" => self.clone = false,
            _ => return false,
        }
        true
    }
}

/// The fields a variant was written with.
#[derive(Debug, Clone)]
pub enum RawFields {
    /// `A`
    Unit,
    /// `A(T, ...)`: one token stream per top-level field
    Tuple(Vec<TokenStream>, Span),
    /// `A { .. }`
    Named(Span),
}

/// One variant as the front end saw it.
#[derive(Debug, Clone)]
pub struct RawVariant {
    /// Variant identifier in the kind enum
    pub ident: Ident,
    /// `#[union(name = "...")]`
    pub display_name: Option<Spanned<String>>,
    /// `#[union(wire = "...")]`
    pub wire_name: Option<Spanned<String>>,
    /// Fields written on the variant
    pub fields: RawFields,
    /// Every `#[union(of = "...")]` seen; more than one is a conflict
    pub of: Vec<Spanned<String>>,
}

impl RawVariant {
    /// A unit variant with no overrides.
    pub fn unit(ident: Ident) -> Self {
        RawVariant {
            ident,
            display_name: None,
            wire_name: None,
            fields: RawFields::Unit,
            of: Vec::new(),
        }
    }
}

/// A whole declaration as the front end saw it.
#[derive(Debug, Clone)]
pub struct RawUnion {
    /// The discriminant enum's identifier
    pub kind_name: Ident,
    /// Visibility tokens of the discriminant enum
    pub vis: TokenStream,
    /// `name = "..."`
    pub name: Option<Spanned<String>>,
    /// `generics(T, U)`
    pub generics: Vec<Ident>,
    /// `reference` flag
    pub representation: Representation,
    /// `json(...)`
    pub json: Option<JsonOptions>,
    /// `crate = path`
    pub crate_path: Option<TokenStream>,
    /// `skip(Hash, ...)`
    pub impls: GeneratedImpls,
    /// Doc attributes to copy onto the union type
    pub docs: Vec<TokenStream>,
    /// Variants in declaration order
    pub variants: Vec<RawVariant>,
}

impl RawUnion {
    /// A declaration with defaults everywhere.
    pub fn new(kind_name: Ident) -> Self {
        RawUnion {
            kind_name,
            vis: TokenStream::new(),
            name: None,
            generics: Vec::new(),
            representation: Representation::Value,
            json: None,
            crate_path: None,
            impls: GeneratedImpls::default(),
            docs: Vec::new(),
            variants: Vec::new(),
        }
    }
}

/// How a payload type was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadOrigin {
    /// Tuple field on the variant
    Concrete,
    /// `of = "T"` naming a generic parameter
    GenericRef,
    /// `of = "Vec<T>"` parsed as a type
    Parsed,
}

/// A resolved payload type and its memoized category.
#[derive(Debug, Clone)]
pub struct PayloadType {
    /// The type tokens
    pub tokens: TokenStream,
    /// How it was written
    pub origin: PayloadOrigin,
    /// Classification, computed once
    pub category: PayloadCategory,
}

impl PayloadType {
    /// Compact text of the type, `Vec<u8>` rather than `Vec < u8 >`.
    pub fn type_text(&self) -> String {
        compact_type_text(&self.tokens)
    }
}

/// Render tokens the way a person writes a type.
pub fn compact_type_text(tokens: &TokenStream) -> String {
    let text = tokens.to_string();
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            let prev = if i == 0 { ' ' } else { chars[i - 1] };
            let next = chars.get(i + 1).copied().unwrap_or(' ');
            let word = |c: char| c.is_alphanumeric() || c == '_' || c == '\'';
            let keep = (word(prev) && word(next)) || prev == ',' || prev == ';';
            if !keep {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// One surviving variant of a validated union.
#[derive(Debug, Clone)]
pub struct VariantSpec {
    /// Identifier in the kind enum
    pub raw_name: Ident,
    /// Display name override
    pub display_name: Option<String>,
    /// Wire name override
    pub wire_name: Option<String>,
    /// Payload, absent for unit variants
    pub payload: Option<PayloadType>,
    /// Zero-based declaration position in the kind enum
    pub ordinal: usize,
    /// Span of the variant identifier
    pub span: Span,
}

impl VariantSpec {
    /// Effective display name: the override or the identifier.
    pub fn name(&self) -> String {
        match &self.display_name {
            Some(name) => name.clone(),
            None => self.raw_name.to_string(),
        }
    }

    /// Effective wire name: the wire override, else the display name.
    pub fn wire_name(&self) -> String {
        match &self.wire_name {
            Some(name) => name.clone(),
            None => self.name(),
        }
    }

    /// snake_case stem for `is_*`, `get_*`, `try_get_*`, `make_*`.
    pub fn method_stem(&self) -> String {
        RenameRule::SnakeCase.apply(&self.name())
    }
}

/// A validated union declaration.
#[derive(Debug, Clone)]
pub struct UnionSpec {
    /// Name of the generated union type
    pub union_name: Ident,
    /// Name of the discriminant enum
    pub kind_name: Ident,
    /// Visibility of both
    pub vis: TokenStream,
    /// Value or Reference
    pub representation: Representation,
    /// Generic parameter names, in order
    pub generics: Vec<Ident>,
    /// JSON codec options, when requested
    pub json: Option<JsonOptions>,
    /// Path to the runtime crate
    pub crate_path: TokenStream,
    /// Which standard trait impls to generate
    pub impls: GeneratedImpls,
    /// Doc attributes for the union type
    pub docs: Vec<TokenStream>,
    /// Surviving variants in declaration order
    pub variants: Vec<VariantSpec>,
    /// Kind-enum variants dropped by validation, with their ordinals
    pub rejected: Vec<(usize, Ident)>,
}

impl UnionSpec {
    /// Total number of kinds, including dropped ones.
    pub fn kind_count(&self) -> usize {
        self.variants.len() + self.rejected.len()
    }

    /// Whether the union has type parameters.
    pub fn is_generic(&self) -> bool {
        !self.generics.is_empty()
    }

    /// Default path to the runtime crate.
    pub fn default_crate_path() -> TokenStream {
        quote! { ::unionize }
    }
}
