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

/// Options for encoding and decoding a union.
///
/// Generated unions carry their declared options as
/// [`WireUnion::OPTIONS`](crate::json::WireUnion::OPTIONS); the `*_with`
/// functions take an override.
///
/// # Example
///
/// ```
/// use unionize::json::{JsonMode, JsonOptions};
///
/// let opts = JsonOptions::adjacent("t", "c").numeric_tag(true);
/// assert_eq!(opts.mode, JsonMode::Adjacent);
/// assert!(opts.numeric_tag);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JsonOptions {
    /// Envelope shape
    pub mode: JsonMode,
    /// Tag field name, adjacent mode only
    pub tag_field: &'static str,
    /// Content field name, adjacent mode only
    pub content_field: &'static str,
    /// Write the ordinal (`"1"`) instead of the wire name
    pub numeric_tag: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonOptions {
    /// External mode, name tags.
    pub const fn new() -> Self {
        JsonOptions {
            mode: JsonMode::External,
            tag_field: "tag",
            content_field: "content",
            numeric_tag: false,
        }
    }

    /// `{ "<tag>": <payload> }`
    pub const fn external() -> Self {
        Self::new()
    }

    /// `[ "<tag>", <payload> ]`
    pub const fn tuple() -> Self {
        Self::new().mode(JsonMode::Tuple)
    }

    /// `{ "<tag_field>": "<tag>", "<content_field>": <payload> }`
    pub const fn adjacent(tag_field: &'static str, content_field: &'static str) -> Self {
        Self::new()
            .mode(JsonMode::Adjacent)
            .tag_field(tag_field)
            .content_field(content_field)
    }

    /// Set the envelope shape.
    pub const fn mode(mut self, mode: JsonMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the tag field name.
    pub const fn tag_field(mut self, name: &'static str) -> Self {
        self.tag_field = name;
        self
    }

    /// Set the content field name.
    pub const fn content_field(mut self, name: &'static str) -> Self {
        self.content_field = name;
        self
    }

    /// Write ordinals instead of names.
    pub const fn numeric_tag(mut self, yes: bool) -> Self {
        self.numeric_tag = yes;
        self
    }
}
