use crate::core::qualifier::{Qualifier, has_at_most};
use crate::core::semck::CheckContext;
use crate::core::store::InitStore;
use crate::core::tree::{ClassId, Receiver};
use crate::core::types::FieldTypeView;

/// Whether `expr` satisfies `required`, given the inferred qualifier and the
/// store at the point of the contract.
///
/// A `this.f` / `C.f` access whose field is initialized and whose invariant
/// is at least `required` holds regardless of `inferred`, provided the
/// field's declared type carries that invariant. Anything else falls back to
/// `inferred <: required`.
pub fn discharges_contract(
    ctx: &CheckContext<'_>,
    class: ClassId,
    expr: &Receiver,
    required: Qualifier,
    inferred: Option<Qualifier>,
    store: &InitStore,
) -> bool {
    if let Some(field) = expr.self_rooted_field()
        && let Some(invariant) = ctx.invariants.invariant_for(class, field)
        && invariant.qualifier.is_subtype(required)
        && store.is_field_initialized(field)
    {
        let declared = ctx.oracle.field_type(field, None, FieldTypeView::DECLARED);
        if declared.qualifier == Some(invariant.qualifier) {
            return true;
        }
    }
    has_at_most(inferred, required)
}

#[cfg(test)]
#[path = "../../tests/semck/t_contract.rs"]
mod tests;
