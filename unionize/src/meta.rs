/// How a union is laid out in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    /// Discriminant plus shared region / shared slot / dedicated fields
    Value,
    /// `Arc` around a private enum
    Reference,
}

/// Payload classification, decided when the union was generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadCategory {
    /// Scalars and arrays of scalars
    TriviallyCopyable,
    /// Owning heap handles of std types
    Reference,
    /// Everything else
    Opaque,
}

/// Where a payload lives inside the union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    /// Own `Option<T>` field
    Dedicated,
    /// Shared [`RawRegion`](crate::RawRegion)
    OverlappedTrivial,
    /// Shared [`RefSlot`](crate::RefSlot)
    SharedReferenceSlot,
    /// Case of the private node enum
    Leaf,
}

/// Payload descriptor of one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadMeta {
    type_name: &'static str,
    category: PayloadCategory,
    storage: StorageClass,
}

impl PayloadMeta {
    /// Describe a payload.
    pub const fn new(
        type_name: &'static str,
        category: PayloadCategory,
        storage: StorageClass,
    ) -> Self {
        PayloadMeta {
            type_name,
            category,
            storage,
        }
    }

    /// The payload type as written in the declaration.
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Its classification.
    pub const fn category(&self) -> PayloadCategory {
        self.category
    }

    /// Where it is stored.
    pub const fn storage(&self) -> StorageClass {
        self.storage
    }
}

/// One variant of a union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantMeta {
    ordinal: usize,
    name: &'static str,
    wire_name: &'static str,
    payload: Option<PayloadMeta>,
}

impl VariantMeta {
    /// A unit variant.
    pub const fn unit(ordinal: usize, name: &'static str, wire_name: &'static str) -> Self {
        VariantMeta {
            ordinal,
            name,
            wire_name,
            payload: None,
        }
    }

    /// A payload-carrying variant.
    pub const fn with_payload(
        ordinal: usize,
        name: &'static str,
        wire_name: &'static str,
        payload: PayloadMeta,
    ) -> Self {
        VariantMeta {
            ordinal,
            name,
            wire_name,
            payload: Some(payload),
        }
    }

    /// Position in the kind enum.
    pub const fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Display name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Name written on the wire.
    pub const fn wire_name(&self) -> &'static str {
        self.wire_name
    }

    /// Payload descriptor, `None` for unit variants.
    pub const fn payload(&self) -> Option<&PayloadMeta> {
        self.payload.as_ref()
    }
}

/// Static lookup tables of a generated union.
///
/// `names` and `wire_names` are sorted by key and searched with binary
/// search. Ordinal strings (`"0"`, `"1"`, ...) are a separate key space: a
/// tag resolves as a wire name first, then as a canonical decimal ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnionMeta {
    name: &'static str,
    kind_name: &'static str,
    representation: Representation,
    variants: &'static [VariantMeta],
    names: &'static [(&'static str, usize)],
    wire_names: &'static [(&'static str, usize)],
}

impl UnionMeta {
    /// Assemble the tables. `variants` must be in ordinal order, `names` and
    /// `wire_names` sorted by key.
    pub const fn new(
        name: &'static str,
        kind_name: &'static str,
        representation: Representation,
        variants: &'static [VariantMeta],
        names: &'static [(&'static str, usize)],
        wire_names: &'static [(&'static str, usize)],
    ) -> Self {
        UnionMeta {
            name,
            kind_name,
            representation,
            variants,
            names,
            wire_names,
        }
    }

    /// Union type name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Kind enum name.
    pub const fn kind_name(&self) -> &'static str {
        self.kind_name
    }

    /// Memory representation.
    pub const fn representation(&self) -> Representation {
        self.representation
    }

    /// All variants, in ordinal order.
    pub const fn variants(&self) -> &'static [VariantMeta] {
        self.variants
    }

    /// Variant with the given ordinal.
    pub fn variant(&self, ordinal: usize) -> Option<&'static VariantMeta> {
        let variants = self.variants;
        variants
            .binary_search_by_key(&ordinal, |v| v.ordinal)
            .ok()
            .map(|i| &variants[i])
    }

    /// name → kind ordinal.
    pub fn kind_by_name(&self, name: &str) -> Option<usize> {
        lookup(self.names, name)
    }

    /// kind ordinal → name.
    pub fn name_of(&self, ordinal: usize) -> Option<&'static str> {
        self.variant(ordinal).map(|v| v.name)
    }

    /// kind ordinal → wire name.
    pub fn wire_name_of(&self, ordinal: usize) -> Option<&'static str> {
        self.variant(ordinal).map(|v| v.wire_name)
    }

    /// kind ordinal → payload descriptor.
    pub fn payload_of(&self, ordinal: usize) -> Option<&'static PayloadMeta> {
        self.variant(ordinal).and_then(|v| v.payload.as_ref())
    }

    /// Resolve a wire tag to a kind ordinal: wire names first, then a
    /// canonical decimal ordinal (`"2"`, not `"02"` or `"+2"`).
    pub fn resolve_wire(&self, tag: &str) -> Option<usize> {
        lookup(self.wire_names, tag).or_else(|| {
            let ordinal = parse_ordinal(tag)?;
            self.variant(ordinal).map(|v| v.ordinal)
        })
    }
}

fn lookup(table: &[(&'static str, usize)], key: &str) -> Option<usize> {
    table
        .binary_search_by(|(k, _)| (*k).cmp(key))
        .ok()
        .map(|i| table[i].1)
}

/// Canonical decimal ordinal: ASCII digits, no sign, no leading zero.
pub(crate) fn parse_ordinal(tag: &str) -> Option<usize> {
    let canonical = !tag.is_empty()
        && tag.bytes().all(|b| b.is_ascii_digit())
        && (tag == "0" || !tag.starts_with('0'));
    if canonical { tag.parse().ok() } else { None }
}
