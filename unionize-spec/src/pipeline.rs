//! Raw declaration → validated spec → storage plan → meta table.

use crate::{Diagnostic, MetaTable, RawUnion, StoragePlan, UnionSpec, validate};

/// Everything the emitters need for one union.
#[derive(Debug, Clone)]
pub struct Expansion {
    /// The validated specification
    pub spec: UnionSpec,
    /// Storage decisions
    pub plan: StoragePlan,
    /// Lookup tables
    pub meta: MetaTable,
    /// Diagnostics from every stage, in the order they were raised
    pub diagnostics: Vec<Diagnostic>,
}

impl Expansion {
    /// Whether any stage raised a diagnostic.
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Run every stage for one declaration. Never fails: problems are reported
/// as diagnostics next to whatever could still be built.
pub fn run(raw: RawUnion) -> Expansion {
    let (spec, mut diagnostics) = validate(raw);
    let plan = StoragePlan::plan(&spec);
    let (meta, meta_diagnostics) = MetaTable::build(&spec, &plan);
    diagnostics.extend(meta_diagnostics);

    debug!(
        "{}: {} variants, {} rejected, {} diagnostics",
        spec.union_name,
        spec.variants.len(),
        spec.rejected.len(),
        diagnostics.len()
    );

    Expansion {
        spec,
        plan,
        meta,
        diagnostics,
    }
}

/// Run a batch of independent declarations, results in input order.
///
/// Token handles are not `Send`, so this is sequential. A bad declaration
/// only affects its own expansion.
pub fn run_all(raws: impl IntoIterator<Item = RawUnion>) -> Vec<Expansion> {
    raws.into_iter().map(run).collect()
}
