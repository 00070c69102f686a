//! Commitment at the end of initializers and constructors.

use std::collections::HashSet;

use tracing::debug;

use crate::core::diag::Span;
use crate::core::flow::FlowFacts;
use crate::core::qualifier::{InitAnnotation, Qualifier};
use crate::core::semck::{CheckContext, InitCheckError, InitCheckErrorKind};
use crate::core::store::InitStore;
use crate::core::tree::{ClassId, FieldId, MethodDecl, NodeId, ReceiverAnnotation};

/// Qualifiers a constructor may not claim for its result: commitment is
/// derived by this check, never asserted.
pub const INVALID_CONSTRUCTOR_RETURNS: [Qualifier; 2] = [Qualifier::Committed, Qualifier::FbcBottom];

/// Where a completeness check applies.
#[derive(Debug, Clone, Copy)]
pub struct CheckPoint<'r> {
    pub class: ClassId,
    pub node: NodeId,
    pub span: Span,
    pub is_static: bool,
    pub receiver: &'r [ReceiverAnnotation],
}

/// Invariant fields of the class (and, for instances, its ancestors) that are
/// neither initialized in `store`, covered by instance initializer blocks in
/// `covered`, nor promised by a receiver annotation. Sorted by name.
pub fn uninitialized_invariant_fields(
    ctx: &CheckContext<'_>,
    at: &CheckPoint<'_>,
    store: &InitStore,
    covered: &HashSet<FieldId>,
) -> Vec<String> {
    let mut names: Vec<String> = ctx
        .invariants
        .required_fields(ctx.classes, at.class, at.is_static)
        .into_iter()
        .filter(|field| !store.is_field_initialized(*field))
        .filter(|field| at.is_static || !covered.contains(field))
        .filter(|field| !satisfied_by_receiver(ctx, at.receiver, *field))
        .map(|field| ctx.classes.field(field).name.clone())
        .collect();
    names.sort();
    names
}

fn satisfied_by_receiver(
    ctx: &CheckContext<'_>,
    receiver: &[ReceiverAnnotation],
    field: FieldId,
) -> bool {
    let owner = ctx.classes.field(field).owner;
    receiver.iter().any(|anno| {
        if anno.qualifier.is_subtype(Qualifier::Committed) {
            return true;
        }
        anno.frame.is_some_and(|frame| {
            frame == owner || ctx.classes.is_strict_ancestor(owner, frame)
        })
    })
}

/// An absent store means the body cannot complete normally, which passes
/// vacuously.
pub(super) fn check_fields_initialized(
    ctx: &CheckContext<'_>,
    at: &CheckPoint<'_>,
    store: Option<&InitStore>,
    covered: &HashSet<FieldId>,
) -> Result<(), InitCheckError> {
    let Some(store) = store else {
        return Ok(());
    };
    let missing = uninitialized_invariant_fields(ctx, at, store, covered);
    if missing.is_empty() {
        return Ok(());
    }
    debug!(
        class = %ctx.classes.class(at.class).name,
        is_static = at.is_static,
        fields = ?missing,
        "invariant fields uninitialized"
    );
    Err(InitCheckErrorKind::FieldsUninitialized(missing).at(at.node, at.span))
}

pub(super) fn check_constructor_return(ctor: &MethodDecl) -> Result<(), InitCheckError> {
    let invalid = ctor
        .return_annotations
        .iter()
        .filter_map(|anno| InitAnnotation::qualifier(*anno))
        .find(|q| INVALID_CONSTRUCTOR_RETURNS.contains(q));
    match invalid {
        Some(q) => Err(InitCheckErrorKind::InvalidConstructorReturnType(q).at(ctor.node, ctor.span)),
        None => Ok(()),
    }
}

/// Invariant fields initialized at the end of any instance initializer
/// block, with instance field initializers folded in.
pub(super) fn initialized_by_instance_blocks(
    ctx: &CheckContext<'_>,
    class: ClassId,
    facts: &dyn FlowFacts,
) -> HashSet<FieldId> {
    let required = ctx.invariants.required_fields(ctx.classes, class, false);
    let mut covered = HashSet::new();
    for block in ctx.classes.class(class).init_blocks() {
        if block.is_static {
            continue;
        }
        let Some(store) = facts.regular_exit_store(block.node) else {
            continue;
        };
        let store = store.with_field_initializers_folded(ctx.classes, class, false);
        covered.extend(
            required
                .iter()
                .copied()
                .filter(|field| store.is_field_initialized(*field)),
        );
    }
    covered
}

#[cfg(test)]
#[path = "../../tests/semck/t_completeness.rs"]
mod tests;
