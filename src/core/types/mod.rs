//! Field type lookup seam between the checker and type inference.

pub mod relations;
pub mod type_cache;

use std::cell::RefCell;

pub use relations::{TypeAssignability, type_assignable};
pub use type_cache::FieldTypeCache;

use crate::core::invariant::InvariantTable;
use crate::core::qualifier::Qualifier;
use crate::core::tree::{ClassTable, FieldId, QualifiedType};

/// How a field type lookup is performed.
///
/// The field-write rule needs the same field looked up twice: once as a
/// member of the actual receiver and once as declared, bypassing any cached
/// member view. The choice travels with the call instead of living in shared
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTypeView {
    /// View the field through its receiver: fields of a receiver that is not
    /// committed read as `UnknownInit`.
    pub adapt_to_receiver: bool,
    pub use_cache: bool,
}

impl FieldTypeView {
    pub const AS_MEMBER: FieldTypeView = FieldTypeView {
        adapt_to_receiver: true,
        use_cache: true,
    };

    pub const DECLARED: FieldTypeView = FieldTypeView {
        adapt_to_receiver: false,
        use_cache: false,
    };
}

/// Type information the checker consumes from inference.
pub trait TypeOracle {
    /// Type of `field` accessed through a receiver qualified `receiver`
    /// (`None` for static access).
    fn field_type(
        &self,
        field: FieldId,
        receiver: Option<Qualifier>,
        view: FieldTypeView,
    ) -> QualifiedType;

    /// General assignment compatibility.
    fn is_assignable(&self, value: &QualifiedType, target: &QualifiedType) -> bool {
        type_assignable(value, target).is_assignable()
    }
}

/// Field types derived from declarations: the declared base type qualified
/// by the owner's invariant for the field.
pub struct DeclaredTypes<'a> {
    classes: &'a ClassTable,
    invariants: &'a InvariantTable,
    cache: RefCell<FieldTypeCache>,
}

impl<'a> DeclaredTypes<'a> {
    pub fn new(classes: &'a ClassTable, invariants: &'a InvariantTable) -> Self {
        Self {
            classes,
            invariants,
            cache: RefCell::new(FieldTypeCache::new()),
        }
    }

    fn compute(
        &self,
        field: FieldId,
        receiver: Option<Qualifier>,
        adapt: bool,
    ) -> QualifiedType {
        let decl = self.classes.field(field);
        let declared = self
            .invariants
            .invariant_for(decl.owner, field)
            .map(|inv| inv.qualifier);
        let qualifier = match (declared, receiver) {
            (Some(_), Some(rcv)) if adapt && !rcv.is_subtype(Qualifier::Committed) => {
                Some(Qualifier::UnknownInit)
            }
            _ => declared,
        };
        QualifiedType::new(decl.ty.clone(), qualifier)
    }
}

impl TypeOracle for DeclaredTypes<'_> {
    fn field_type(
        &self,
        field: FieldId,
        receiver: Option<Qualifier>,
        view: FieldTypeView,
    ) -> QualifiedType {
        let adapt = view.adapt_to_receiver;
        if view.use_cache
            && let Some(ty) = self.cache.borrow().get(field, receiver, adapt)
        {
            return ty.clone();
        }
        let ty = self.compute(field, receiver, adapt);
        self.cache
            .borrow_mut()
            .insert(field, receiver, adapt, ty.clone());
        ty
    }
}

#[cfg(test)]
#[path = "../../tests/t_types.rs"]
mod tests;
