//! Composable ownership predicates.
//!
//! # Responsibility
//! - `create`: predicates run while a document is being created. They may
//!   check the actor's rights and record ownership edges.
//! - `find`: read-only predicates resolving the set of visible document ids.
//!
//! # Invariants
//! - Predicates run sequentially in caller order; the first error aborts.
//! - Several find predicates combine by intersection. Union semantics are
//!   expressed by a single predicate (`AuthorizedWhere`), never by stacking.
//! - Predicates hold only their own arguments; no shared mutable state.

pub mod create;
pub mod find;

use crate::index::{DocumentIndex, IndexResult};
use crate::model::Id;
use log::debug;
use std::collections::BTreeSet;

pub use create::{AuthorizedWithOrg, AuthorizedWithUser, WithOrg, WithUser};
pub use find::{AuthorizedWhere, AuthorizedWhereId, AuthorizedWhereOrg, WhereId, WhereOrg};

/// Check or side effect applied while a document is being created.
pub trait CreatePredicate {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    fn apply(&self, index: &mut dyn DocumentIndex) -> IndexResult<()>;
}

/// Read-only selection of document ids.
pub trait FindPredicate {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    fn apply(&self, index: &dyn DocumentIndex) -> IndexResult<BTreeSet<Id>>;
}

/// Runs creation predicates in order, stopping at the first failure.
pub fn apply_create_predicates(
    index: &mut dyn DocumentIndex,
    predicates: &[&dyn CreatePredicate],
) -> IndexResult<()> {
    for predicate in predicates {
        predicate.apply(index).map_err(|err| {
            debug!(
                "event=predicate_apply module=predicate status=error kind=create name={} error={err}",
                predicate.name()
            );
            err
        })?;
    }
    Ok(())
}

/// Intersects the id sets of all find predicates.
///
/// Returns `None` when no predicate was supplied, so callers can tell an
/// empty selection apart from no selection. Every predicate is evaluated
/// even once the running intersection is empty, so authorization failures
/// are never masked.
pub fn resolve_find_predicates(
    index: &dyn DocumentIndex,
    predicates: &[&dyn FindPredicate],
) -> IndexResult<Option<BTreeSet<Id>>> {
    let mut selection: Option<BTreeSet<Id>> = None;
    for predicate in predicates {
        let ids = predicate.apply(index).map_err(|err| {
            debug!(
                "event=predicate_apply module=predicate status=error kind=find name={} error={err}",
                predicate.name()
            );
            err
        })?;

        selection = Some(match selection {
            None => ids,
            Some(current) => current.intersection(&ids).copied().collect(),
        });
    }
    Ok(selection)
}
