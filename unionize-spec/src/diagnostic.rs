use core::fmt::{self, Display};

use proc_macro2::{Span, TokenStream};
use quote::quote_spanned;

/// A problem found while turning a declaration into a union.
///
/// Diagnostics never abort the pipeline: the offending variant (or attribute)
/// is dropped and expansion carries on with the rest.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// What went wrong
    pub kind: DiagnosticKind,
    /// Human-readable message
    pub message: String,
    /// Where it went wrong
    pub span: Span,
}

/// The classes of compile-time problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A payload could not be resolved to a single type
    UnresolvedPayloadType,
    /// Two variants share an effective display name (or method stem)
    DuplicateVariantName,
    /// Two variants share an effective wire name
    DuplicateWireName,
    /// `of = "X"` names something that is not a declared generic parameter
    InvalidGenericPayloadReference,
    /// A display name override is not a valid identifier
    InvalidVariantName,
    /// A generic parameter is declared twice
    DuplicateGenericParameter,
    /// An attribute argument is unknown or malformed
    InvalidAttribute,
    /// The attribute was placed on something other than a plain enum
    UnsupportedItem,
}

impl DiagnosticKind {
    /// Stable error code, e.g. `union::duplicate_wire_name`.
    pub const fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::UnresolvedPayloadType => "union::unresolved_payload_type",
            DiagnosticKind::DuplicateVariantName => "union::duplicate_variant_name",
            DiagnosticKind::DuplicateWireName => "union::duplicate_wire_name",
            DiagnosticKind::InvalidGenericPayloadReference => {
                "union::invalid_generic_payload_reference"
            }
            DiagnosticKind::InvalidVariantName => "union::invalid_variant_name",
            DiagnosticKind::DuplicateGenericParameter => "union::duplicate_generic_parameter",
            DiagnosticKind::InvalidAttribute => "union::invalid_attribute",
            DiagnosticKind::UnsupportedItem => "union::unsupported_item",
        }
    }
}

impl Diagnostic {
    /// Create a diagnostic.
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            span,
        }
    }

    /// Stable error code of this diagnostic's kind.
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Render as a `compile_error!` invocation pointing at the offending span.
    pub fn to_compile_error(&self) -> TokenStream {
        let msg = self.to_string();
        quote_spanned! { self.span => ::core::compile_error!(#msg); }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.kind.code())
    }
}

impl std::error::Error for Diagnostic {}
