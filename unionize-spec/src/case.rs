/// Casing applied to variant and union names when they become method or item names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    /// snake_case, used for `is_*` / `get_*` / `make_*` stems
    SnakeCase,
}

impl RenameRule {
    /// Apply this rule to an identifier.
    pub fn apply(&self, name: &str) -> String {
        let words = split_words(name);
        let cased = words.iter().map(|w| match self {
            RenameRule::SnakeCase => w.to_lowercase(),
        });
        cased.collect::<Vec<_>>().join("_")
    }
}

/// Split `HTTPServer`, `fooBar`, `foo_bar` into words. A run of capitals
/// stays one word, except for the capital that starts the next word.
fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        if ch == '_' || ch == '-' {
            if !current.is_empty() {
                words.push(core::mem::take(&mut current));
            }
            continue;
        }

        if ch.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if !prev.is_uppercase() || next_is_lower {
                words.push(core::mem::take(&mut current));
            }
        }
        current.push(ch);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Whether `s` can be used as a plain (non-raw) Rust identifier.
pub fn is_valid_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first == '_' || first.is_alphabetic()) {
        return false;
    }
    if s == "_" || is_keyword(s) {
        return false;
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

fn is_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "async"
            | "await"
            | "break"
            | "const"
            | "continue"
            | "crate"
            | "dyn"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "gen"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "Self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
    )
}
