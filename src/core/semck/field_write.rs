//! Field writes and field declarations.

use tracing::trace;

use crate::core::qualifier::{InitAnnotation, Qualifier};
use crate::core::semck::{CheckContext, InitCheckError, InitCheckErrorKind};
use crate::core::tree::{ClassId, FieldDecl, FieldWrite, QualifiedType};
use crate::core::types::FieldTypeView;
use crate::core::types::relations::DEFAULT_QUALIFIER;

/// `r.f = v` is legal when `v` is committed, `r` is still free, or `v` is
/// bottom. A legal write must still fit the field's invariant type.
///
/// Unclassified and static fields skip the commitment rule but not the
/// ordinary assignment check: static fields are checked against their
/// declared type, unclassified fields against their base type only.
pub(super) fn check_field_write(
    ctx: &CheckContext<'_>,
    class: ClassId,
    write: &FieldWrite,
) -> Result<(), InitCheckError> {
    let field = ctx.classes.field(write.field);
    if field.is_unclassified() || field.is_static {
        trace!(field = %field.name, "field write exempt from commitment rule");
        let declared = ctx
            .oracle
            .field_type(write.field, write.receiver_qualifier, FieldTypeView::DECLARED);
        let required = if field.is_unclassified() {
            declared.with_qualifier(None)
        } else {
            declared
        };
        return check_assignable(ctx, write, required);
    }

    let receiver = write.receiver_qualifier.unwrap_or(DEFAULT_QUALIFIER);
    let value = write.value.ty.qualifier.unwrap_or(DEFAULT_QUALIFIER);
    let legal = value.is_subtype(Qualifier::Committed)
        || receiver.is_subtype(Qualifier::Free)
        || value.is_subtype(Qualifier::FbcBottom);
    if !legal {
        let kind = if receiver == Qualifier::Committed {
            InitCheckErrorKind::FieldWriteOnCommittedReceiver {
                field: field.name.clone(),
                value: write.value.ty.qualifier,
            }
        } else {
            InitCheckErrorKind::FieldWriteOnUnclassifiedReceiver {
                field: field.name.clone(),
                value: write.value.ty.qualifier,
            }
        };
        // The assignment check below would only repeat this error.
        return Err(kind.at(write.node, write.span));
    }

    // Reading `this.f` through a free receiver yields `UnknownInit`, but
    // writing it must still respect the invariant. Look the field up again
    // as declared and keep the invariant qualifier.
    let member = ctx
        .oracle
        .field_type(write.field, write.receiver_qualifier, FieldTypeView::AS_MEMBER);
    let declared = ctx
        .oracle
        .field_type(write.field, write.receiver_qualifier, FieldTypeView::DECLARED);
    let invariant = ctx
        .invariants
        .invariant_for(class, write.field)
        .map(|inv| inv.qualifier)
        .or(declared.qualifier);
    let required = match invariant {
        Some(q) => member.with_qualifier(Some(q)),
        None => member,
    };

    check_assignable(ctx, write, required)
}

fn check_assignable(
    ctx: &CheckContext<'_>,
    write: &FieldWrite,
    required: QualifiedType,
) -> Result<(), InitCheckError> {
    if ctx.oracle.is_assignable(&write.value.ty, &required) {
        Ok(())
    } else {
        Err(InitCheckErrorKind::IncompatibleAssignment {
            found: write.value.ty.clone(),
            required,
        }
        .at(write.node, write.span))
    }
}

/// Commitment qualifiers describe what a use site knows about a receiver, not
/// a field's own type; only `Unclassified` may be written on a field.
pub(super) fn check_field_decl(field: &FieldDecl) -> Result<(), InitCheckError> {
    let offending = field.annotations.iter().find_map(|anno| match anno {
        InitAnnotation::Qualifier(q) => Some(*q),
        InitAnnotation::Unclassified => None,
    });
    match offending {
        Some(annotation) => Err(InitCheckErrorKind::InvalidFieldAnnotation {
            field: field.name.clone(),
            annotation,
        }
        .at(field.node, field.span)),
        None => Ok(()),
    }
}

#[cfg(test)]
#[path = "../../tests/semck/t_field_write.rs"]
mod tests;
