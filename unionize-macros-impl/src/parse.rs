//! Front end: the enum the attribute sits on, and the `#[union(...)]`
//! argument lists, turned into a [`RawUnion`].

use proc_macro2::{Delimiter, Group, Ident, Literal, Span, TokenStream, TokenTree};
use unionize_spec::{
    Diagnostic, DiagnosticKind, JsonMode, JsonOptions, RawFields, RawUnion, RawVariant,
    Representation, Spanned,
};
use unsynn::*;

type ParseResult<T> = core::result::Result<T, Diagnostic>;

keyword! {
    KEnum = "enum";
    KPub = "pub";
}

operator! {
    Equals = "=";
}

unsynn! {
    /// `#[...]`
    struct Attribute {
        _pound: Pound,
        body: BracketGroup,
    }

    /// `pub` or `pub(...)`
    enum Vis {
        PubIn(Cons<KPub, ParenthesisGroup>),
        Pub(KPub),
    }

    /// The discriminant enum the attribute is placed on.
    struct KindEnumGrammar {
        attrs: Vec<Attribute>,
        vis: Option<Vis>,
        _enum: KEnum,
        name: Ident,
        body: BraceGroupContaining<CommaDelimitedVec<KindVariantGrammar>>,
    }

    struct KindVariantGrammar {
        attrs: Vec<Attribute>,
        name: Ident,
        fields: Option<VariantFields>,
        discriminant: Option<Cons<Equals, DiscriminantExpr>>,
    }

    enum VariantFields {
        Tuple(ParenthesisGroup),
        Named(BraceGroup),
    }

    struct DiscriminantExpr {
        tokens: Any<Cons<Except<Comma>, TokenTree>>,
    }
}

/// Standard derives already present on the kind enum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KnownDerives {
    /// `Clone`
    pub clone: bool,
    /// `Copy`
    pub copy: bool,
    /// `PartialEq`
    pub partial_eq: bool,
    /// `Eq`
    pub eq: bool,
    /// `Hash`
    pub hash: bool,
    /// `Debug`
    pub debug: bool,
}

impl KnownDerives {
    fn record(&mut self, name: &str) {
        match name {
            "Clone" => self.clone = true,
            "Copy" => self.copy = true,
            "PartialEq" => self.partial_eq = true,
            "Eq" => self.eq = true,
            "Hash" => self.hash = true,
            "Debug" => self.debug = true,
            _ => {}
        }
    }
}

/// One variant of the kind enum, as it will be re-emitted.
#[derive(Debug, Clone)]
pub struct KindVariantDecl {
    /// Attributes other than `#[union(...)]`
    pub attrs: Vec<TokenStream>,
    /// Variant identifier
    pub name: Ident,
    /// `= expr`, without the `=`
    pub discriminant: Option<TokenStream>,
}

/// The kind enum, stripped of payloads and helper attributes.
#[derive(Debug, Clone)]
pub struct KindEnumDecl {
    /// Outer attributes, passed through
    pub attrs: Vec<TokenStream>,
    /// Derives found among `attrs`
    pub derives: KnownDerives,
    /// Visibility
    pub vis: TokenStream,
    /// Identifier
    pub name: Ident,
    /// Variants in declaration order
    pub variants: Vec<KindVariantDecl>,
}

/// Everything the front end produces for one attribute invocation.
#[derive(Debug, Clone)]
pub struct Declaration {
    /// The kind enum to re-emit
    pub kind_enum: KindEnumDecl,
    /// The declaration handed to the pipeline
    pub raw: RawUnion,
    /// Problems with the attribute arguments
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse `#[union(<attr>)] <item>`.
///
/// Fails only when `item` is not an enum; malformed arguments become
/// diagnostics on the returned declaration.
pub fn parse_declaration(attr: TokenStream, item: TokenStream) -> ParseResult<Declaration> {
    let mut iter = item.to_token_iter();
    let grammar = iter
        .parse::<Cons<KindEnumGrammar, EndOfStream>>()
        .map_err(|e| {
            Diagnostic::new(
                DiagnosticKind::UnsupportedItem,
                format!("#[union] expects a plain enum without generics: {e}"),
                Span::call_site(),
            )
        })?
        .first;

    let mut diagnostics = Vec::new();
    let mut raw = RawUnion::new(grammar.name.clone());
    raw.vis = match &grammar.vis {
        Some(vis) => vis.to_token_stream(),
        None => TokenStream::new(),
    };
    parse_container_args(attr, &mut raw, &mut diagnostics);

    let mut derives = KnownDerives::default();
    let mut attrs = Vec::new();
    for attr in &grammar.attrs {
        let group = &attr.body.0;
        let trees: Vec<TokenTree> = group.stream().into_iter().collect();
        match trees.as_slice() {
            [TokenTree::Ident(id), ..] if id == "doc" => {
                raw.docs.push(outer_attr(group));
            }
            [TokenTree::Ident(id), TokenTree::Group(list)] if id == "derive" => {
                for path in split_top_level(list.stream()) {
                    if let Some(TokenTree::Ident(last)) = path.into_iter().last() {
                        derives.record(&last.to_string());
                    }
                }
            }
            [TokenTree::Ident(id), ..] if id == "union" => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::InvalidAttribute,
                    "container options go in the attribute itself: #[unionize::union(...)]",
                    id.span(),
                ));
                continue;
            }
            _ => {}
        }
        attrs.push(outer_attr(group));
    }

    let mut variants = Vec::new();
    for delimited in grammar.body.content.iter() {
        let variant = &delimited.value;
        let (decl, raw_variant) = parse_variant(variant, &mut diagnostics);
        variants.push(decl);
        raw.variants.push(raw_variant);
    }

    Ok(Declaration {
        kind_enum: KindEnumDecl {
            attrs,
            derives,
            vis: raw.vis.clone(),
            name: grammar.name,
            variants,
        },
        raw,
        diagnostics,
    })
}

fn parse_variant(
    variant: &KindVariantGrammar,
    diagnostics: &mut Vec<Diagnostic>,
) -> (KindVariantDecl, RawVariant) {
    let mut raw = RawVariant::unit(variant.name.clone());
    raw.fields = match &variant.fields {
        None => RawFields::Unit,
        Some(VariantFields::Tuple(group)) => {
            RawFields::Tuple(split_top_level(group.0.stream()), group.0.span())
        }
        Some(VariantFields::Named(group)) => RawFields::Named(group.0.span()),
    };

    let mut attrs = Vec::new();
    for attr in &variant.attrs {
        let group = &attr.body.0;
        let trees: Vec<TokenTree> = group.stream().into_iter().collect();
        match trees.as_slice() {
            [TokenTree::Ident(id), TokenTree::Group(args)]
                if id == "union" && args.delimiter() == Delimiter::Parenthesis =>
            {
                parse_variant_args(args.stream(), &mut raw, diagnostics);
            }
            [TokenTree::Ident(id), ..] if id == "union" => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::InvalidAttribute,
                    "expected #[union(name = \"...\", wire = \"...\", of = \"...\")]",
                    id.span(),
                ));
            }
            _ => attrs.push(outer_attr(group)),
        }
    }

    let decl = KindVariantDecl {
        attrs,
        name: variant.name.clone(),
        discriminant: variant
            .discriminant
            .as_ref()
            .map(|d| d.second.tokens.to_token_stream()),
    };
    (decl, raw)
}

/// `#` followed by the bracket group.
fn outer_attr(group: &Group) -> TokenStream {
    let pound = proc_macro2::Punct::new('#', proc_macro2::Spacing::Alone);
    [TokenTree::Punct(pound), TokenTree::Group(group.clone())]
        .into_iter()
        .collect()
}

/// One `key`, `key = value` or `key(...)` entry of an argument list.
#[derive(Debug, Clone)]
pub struct MetaItem {
    /// The key
    pub key: Ident,
    /// What follows it
    pub value: MetaValue,
}

/// Right-hand side of a [`MetaItem`].
#[derive(Debug, Clone)]
pub enum MetaValue {
    /// `key`
    Flag,
    /// `key = tokens`
    Value(TokenStream),
    /// `key(tokens)`
    List(TokenStream),
}

/// Parse a comma-separated argument list. Malformed entries are reported and
/// skipped.
pub fn parse_meta_list(tokens: TokenStream, diagnostics: &mut Vec<Diagnostic>) -> Vec<MetaItem> {
    let mut items = Vec::new();
    for entry in split_top_level(tokens) {
        let trees: Vec<TokenTree> = entry.clone().into_iter().collect();
        let item = match trees.as_slice() {
            [TokenTree::Ident(key)] => Some(MetaItem {
                key: key.clone(),
                value: MetaValue::Flag,
            }),
            [TokenTree::Ident(key), TokenTree::Group(g)]
                if g.delimiter() == Delimiter::Parenthesis =>
            {
                Some(MetaItem {
                    key: key.clone(),
                    value: MetaValue::List(g.stream()),
                })
            }
            [TokenTree::Ident(key), TokenTree::Punct(eq), rest @ ..]
                if eq.as_char() == '=' && !rest.is_empty() =>
            {
                Some(MetaItem {
                    key: key.clone(),
                    value: MetaValue::Value(rest.iter().cloned().collect()),
                })
            }
            _ => None,
        };
        match item {
            Some(item) => items.push(item),
            None => {
                let span = trees.first().map_or_else(Span::call_site, TokenTree::span);
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::InvalidAttribute,
                    format!("expected `key`, `key = value` or `key(...)`, found `{entry}`"),
                    span,
                ));
            }
        }
    }
    items
}

fn parse_container_args(attr: TokenStream, raw: &mut RawUnion, diagnostics: &mut Vec<Diagnostic>) {
    for item in parse_meta_list(attr, diagnostics) {
        let key = item.key.to_string();
        match (key.as_str(), item.value) {
            ("name", MetaValue::Value(v)) => {
                if let Some(name) = expect_str(&item.key, &v, diagnostics) {
                    raw.name = Some(name);
                }
            }
            ("generics", MetaValue::List(list)) => {
                for param in split_top_level(list) {
                    let trees: Vec<TokenTree> = param.into_iter().collect();
                    match trees.as_slice() {
                        [TokenTree::Ident(id)] => raw.generics.push(id.clone()),
                        other => diagnostics.push(Diagnostic::new(
                            DiagnosticKind::InvalidAttribute,
                            "generic parameters are plain identifiers, without bounds",
                            other.first().map_or(item.key.span(), TokenTree::span),
                        )),
                    }
                }
            }
            ("reference", MetaValue::Flag) => raw.representation = Representation::Reference,
            ("json", MetaValue::Flag) => raw.json = Some(JsonOptions::default()),
            ("json", MetaValue::List(list)) => {
                raw.json = Some(parse_json_args(list, diagnostics));
            }
            ("crate", MetaValue::Value(path)) => raw.crate_path = Some(path),
            ("skip", MetaValue::List(list)) => {
                for entry in split_top_level(list) {
                    let trees: Vec<TokenTree> = entry.into_iter().collect();
                    let skipped = match trees.as_slice() {
                        [TokenTree::Ident(id)] => raw.impls.skip(&id.to_string()),
                        _ => false,
                    };
                    if !skipped {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticKind::InvalidAttribute,
                            "skip(...) takes PartialEq, Hash, Display, Debug or Clone",
                            trees.first().map_or(item.key.span(), TokenTree::span),
                        ));
                    }
                }
            }
            _ => diagnostics.push(Diagnostic::new(
                DiagnosticKind::InvalidAttribute,
                format!(
                    "unknown or malformed argument `{key}`; expected name = \"...\", generics(...), reference, json(...), skip(...) or crate = path"
                ),
                item.key.span(),
            )),
        }
    }
}

fn parse_json_args(tokens: TokenStream, diagnostics: &mut Vec<Diagnostic>) -> JsonOptions {
    let mut options = JsonOptions::default();
    for item in parse_meta_list(tokens, diagnostics) {
        let key = item.key.to_string();
        match (key.as_str(), item.value) {
            ("mode", MetaValue::Value(v)) => {
                let Some(mode) = expect_str(&item.key, &v, diagnostics) else {
                    continue;
                };
                match JsonMode::parse(&mode.value) {
                    Some(m) => options.mode = m,
                    None => diagnostics.push(Diagnostic::new(
                        DiagnosticKind::InvalidAttribute,
                        format!(
                            "unknown json mode `{}`; expected external, tuple or adjacent",
                            mode.value
                        ),
                        mode.span,
                    )),
                }
            }
            ("tag", MetaValue::Value(v)) => {
                if let Some(tag) = expect_str(&item.key, &v, diagnostics) {
                    options.tag_field = tag.value;
                }
            }
            ("content", MetaValue::Value(v)) => {
                if let Some(content) = expect_str(&item.key, &v, diagnostics) {
                    options.content_field = content.value;
                }
            }
            ("numeric_tag", MetaValue::Flag) => options.numeric_tag = true,
            ("numeric_tag", MetaValue::Value(v)) => match v.to_string().as_str() {
                "true" => options.numeric_tag = true,
                "false" => options.numeric_tag = false,
                _ => diagnostics.push(Diagnostic::new(
                    DiagnosticKind::InvalidAttribute,
                    "numeric_tag takes true or false",
                    item.key.span(),
                )),
            },
            _ => diagnostics.push(Diagnostic::new(
                DiagnosticKind::InvalidAttribute,
                format!(
                    "unknown json option `{key}`; expected mode, tag, content or numeric_tag"
                ),
                item.key.span(),
            )),
        }
    }
    if options.mode == JsonMode::Adjacent && options.tag_field == options.content_field {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::InvalidAttribute,
            format!(
                "tag and content fields must differ, both are `{}`",
                options.tag_field
            ),
            Span::call_site(),
        ));
    }
    options
}

fn parse_variant_args(tokens: TokenStream, raw: &mut RawVariant, diagnostics: &mut Vec<Diagnostic>) {
    for item in parse_meta_list(tokens, diagnostics) {
        let key = item.key.to_string();
        match (key.as_str(), item.value) {
            ("name", MetaValue::Value(v)) => {
                if let Some(name) = expect_str(&item.key, &v, diagnostics) {
                    if raw.display_name.is_some() {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticKind::InvalidAttribute,
                            "`name` given more than once",
                            name.span,
                        ));
                    }
                    raw.display_name = Some(name);
                }
            }
            ("wire", MetaValue::Value(v)) => {
                if let Some(wire) = expect_str(&item.key, &v, diagnostics) {
                    if raw.wire_name.is_some() {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticKind::InvalidAttribute,
                            "`wire` given more than once",
                            wire.span,
                        ));
                    }
                    raw.wire_name = Some(wire);
                }
            }
            ("of", MetaValue::Value(v)) => {
                // a string literal, or the type written out
                let of = str_value(&v).unwrap_or_else(|| {
                    let span = v.clone().into_iter().next().map_or(item.key.span(), |t| t.span());
                    Spanned::new(v.to_string(), span)
                });
                raw.of.push(of);
            }
            _ => diagnostics.push(Diagnostic::new(
                DiagnosticKind::InvalidAttribute,
                format!("unknown variant option `{key}`; expected name, wire or of"),
                item.key.span(),
            )),
        }
    }
}

fn expect_str(
    key: &Ident,
    value: &TokenStream,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Spanned<String>> {
    let found = str_value(value);
    if found.is_none() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::InvalidAttribute,
            format!("`{key}` expects a string, found `{value}`"),
            value.clone().into_iter().next().map_or(key.span(), |t| t.span()),
        ));
    }
    found
}

/// A string literal, or a bare identifier taken as its own text.
fn str_value(value: &TokenStream) -> Option<Spanned<String>> {
    let trees: Vec<TokenTree> = value.clone().into_iter().collect();
    match trees.as_slice() {
        [TokenTree::Literal(lit)] => {
            unescape_str_literal(lit).map(|s| Spanned::new(s, lit.span()))
        }
        [TokenTree::Ident(id)] => Some(Spanned::new(id.to_string(), id.span())),
        _ => None,
    }
}

/// Contents of a `"..."` or `r#"..."#` literal; `None` for other literals.
pub fn unescape_str_literal(lit: &Literal) -> Option<String> {
    let text = lit.to_string();

    if let Some(rest) = text.strip_prefix('r') {
        let hashes = rest.len() - rest.trim_start_matches('#').len();
        let body = rest.get(hashes..rest.len().checked_sub(hashes)?)?;
        return body
            .strip_prefix('"')
            .and_then(|b| b.strip_suffix('"'))
            .map(str::to_string);
    }

    let body = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                out.push(char::from(u8::from_str_radix(&hex, 16).ok()?));
            }
            'u' => {
                let rest: String = chars.by_ref().take_while(|&c| c != '}').collect();
                let code = u32::from_str_radix(rest.trim_start_matches('{'), 16).ok()?;
                out.push(char::from_u32(code)?);
            }
            '\n' => {
                // line continuation: skip leading whitespace on the next line
                let skipped: String = chars.clone().take_while(|c| c.is_whitespace()).collect();
                for _ in skipped.chars() {
                    chars.next();
                }
            }
            _ => return None,
        }
    }
    Some(out)
}

/// Split at top-level commas, treating `<...>` as nesting (`->` is not a
/// closing bracket). Empty entries, such as after a trailing comma, are
/// dropped.
pub fn split_top_level(tokens: TokenStream) -> Vec<TokenStream> {
    let mut entries = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0usize;
    let mut prev_dash = false;

    for tt in tokens {
        let mut dash = false;
        if let TokenTree::Punct(p) = &tt {
            match p.as_char() {
                '<' => depth += 1,
                '>' if !prev_dash => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    entries.push(core::mem::take(&mut current));
                    prev_dash = false;
                    continue;
                }
                '-' => dash = true,
                _ => {}
            }
        }
        prev_dash = dash;
        current.push(tt);
    }
    entries.push(current);

    entries
        .into_iter()
        .filter(|e| !e.is_empty())
        .map(|e| e.into_iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;
    use unionize_testhelpers::test;

    fn parse(attr: TokenStream, item: TokenStream) -> Declaration {
        parse_declaration(attr, item).unwrap()
    }

    #[test]
    fn container_arguments() {
        let d = parse(
            quote! {
                name = "Shape", generics(T, U), reference, crate = ::my::unionize,
                json(mode = "adjacent", tag = "t", content = "c", numeric_tag)
            },
            quote! { pub enum ShapeKind { A } },
        );
        assert!(d.diagnostics.is_empty(), "{:?}", d.diagnostics);
        assert_eq!(d.raw.name.unwrap().value, "Shape");
        assert_eq!(d.raw.generics.len(), 2);
        assert_eq!(d.raw.representation, Representation::Reference);
        assert_eq!(d.raw.crate_path.unwrap().to_string(), ":: my :: unionize");
        let json = d.raw.json.unwrap();
        assert_eq!(json.mode, JsonMode::Adjacent);
        assert_eq!(json.tag_field, "t");
        assert_eq!(json.content_field, "c");
        assert!(json.numeric_tag);
        assert_eq!(d.raw.vis.to_string(), "pub");
    }

    #[test]
    fn skipped_impls() {
        let d = parse(quote! { skip(Hash, Debug) }, quote! { enum FooKind { A } });
        assert!(d.diagnostics.is_empty(), "{:?}", d.diagnostics);
        assert!(!d.raw.impls.hash);
        assert!(!d.raw.impls.fmt);
        assert!(d.raw.impls.partial_eq && d.raw.impls.clone);

        let d = parse(quote! { skip(Eq, Clone) }, quote! { enum FooKind { A } });
        assert_eq!(d.diagnostics.len(), 1);
        assert_eq!(d.diagnostics[0].kind, DiagnosticKind::InvalidAttribute);
        assert!(!d.raw.impls.clone);
    }

    #[test]
    fn bare_json_flag_uses_defaults() {
        let d = parse(quote! { json }, quote! { enum FooKind { A } });
        assert_eq!(d.raw.json, Some(JsonOptions::default()));
        assert!(d.raw.vis.is_empty());
    }

    #[test]
    fn variants_and_helpers() {
        let d = parse(
            quote! { generics(T) },
            quote! {
                #[derive(Debug, Clone)]
                /// kinds
                pub(crate) enum FooKind {
                    /// nothing
                    A,
                    #[union(name = "Some")]
                    B(i32),
                    C(std::collections::HashMap<u8, u16>),
                    #[union(of = "T")]
                    D,
                    #[union(wire = "e", of = T)]
                    E = 7,
                }
            },
        );
        assert!(d.diagnostics.is_empty(), "{:?}", d.diagnostics);
        assert!(d.kind_enum.derives.debug && d.kind_enum.derives.clone);
        assert!(!d.kind_enum.derives.copy);
        assert_eq!(d.raw.docs.len(), 1);
        assert_eq!(d.kind_enum.vis.to_string(), "pub (crate)");

        let names: Vec<_> = d.kind_enum.variants.iter().map(|v| v.name.to_string()).collect();
        assert_eq!(names, ["A", "B", "C", "D", "E"]);
        // helper attributes are stripped, docs stay
        assert_eq!(d.kind_enum.variants[0].attrs.len(), 1);
        assert!(d.kind_enum.variants[1].attrs.is_empty());
        assert_eq!(
            d.kind_enum.variants[4].discriminant.as_ref().unwrap().to_string(),
            "7"
        );

        let raw = &d.raw.variants;
        assert_eq!(raw[1].display_name.as_ref().unwrap().value, "Some");
        match &raw[2].fields {
            RawFields::Tuple(fields, _) => assert_eq!(fields.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(raw[3].of[0].value, "T");
        assert_eq!(raw[4].of[0].value, "T");
        assert_eq!(raw[4].wire_name.as_ref().unwrap().value, "e");
    }

    #[test]
    fn bad_arguments_are_diagnostics() {
        let d = parse(
            quote! { nme = "x", json(mode = "sideways"), generics(T: Clone) },
            quote! { enum FooKind { #[union(bogus)] A } },
        );
        let kinds: Vec<_> = d.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, [DiagnosticKind::InvalidAttribute; 4]);
    }

    #[test]
    fn not_an_enum() {
        let err = parse_declaration(quote! {}, quote! { struct Foo; }).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::UnsupportedItem);
    }

    #[test]
    fn splitting_respects_angle_brackets() {
        let parts = split_top_level(quote! { HashMap<u8, u16>, Box<dyn Fn(u8) -> u8>, i32, });
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].to_string(), "i32");
    }

    #[test]
    fn string_literals() {
        let lit = |s: &str| s.parse::<Literal>().unwrap();
        assert_eq!(unescape_str_literal(&lit(r#""Vec<T>""#)).unwrap(), "Vec<T>");
        assert_eq!(unescape_str_literal(&lit(r#""a\"b\n""#)).unwrap(), "a\"b\n");
        assert_eq!(unescape_str_literal(&lit(r##"r#"raw"#"##)).unwrap(), "raw");
        assert_eq!(unescape_str_literal(&lit(r#""\u{263A}""#)).unwrap(), "\u{263A}");
        assert!(unescape_str_literal(&lit("42")).is_none());
    }
}
