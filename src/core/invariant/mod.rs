//! Per-class field invariants and their inheritance.
//!
//! Each class owns the invariants of the fields it declares plus the
//! class-level declarations that strengthen an inherited final field. Lookups
//! walk the superclass links; the links are copied out of the class table once
//! so the table never dispatches through declarations at query time.

mod errors;

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::warn;

pub use errors::{InvariantError, InvariantViolation};

use crate::core::tree::{ClassId, ClassTable, FieldId, Invariant};

impl Invariant {
    /// `self` may replace `other` in a subclass.
    pub fn is_at_least_as_strong_as(&self, other: &Invariant) -> bool {
        let qualifier_ok = self.qualifier.is_subtype(other.qualifier);
        let refinement_ok = match (self.refinement, other.refinement) {
            (_, None) => true,
            (Some(mine), Some(theirs)) => mine >= theirs,
            (None, Some(_)) => false,
        };
        qualifier_ok && refinement_ok
    }
}

/// A resolved invariant: `field` must satisfy `invariant` once an instance of
/// `declared_in` (or a subclass) is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInvariant {
    pub field: FieldId,
    pub invariant: Invariant,
    pub declared_in: ClassId,
}

#[derive(Debug, Clone)]
pub struct InvariantTable {
    parents: Vec<Option<ClassId>>,
    own: Vec<IndexMap<FieldId, Invariant>>,
}

impl InvariantTable {
    /// Builds the table for every class, validating class-level declarations
    /// ancestors-first. Declarations that fail validation are left out of the
    /// table and reported once per class.
    pub fn build(classes: &ClassTable) -> (InvariantTable, Vec<InvariantError>) {
        let mut table = InvariantTable {
            parents: classes.classes().map(|class| class.superclass).collect(),
            own: classes
                .classes()
                .map(|class| {
                    classes
                        .fields_of(class.id)
                        .filter_map(|field| field.invariant.map(|inv| (field.id, inv)))
                        .collect()
                })
                .collect(),
        };

        let mut order: Vec<ClassId> = classes.classes().map(|class| class.id).collect();
        order.sort_by_key(|id| classes.ancestors(*id).count());

        let mut errors = Vec::new();
        for class_id in order {
            let (accepted, violations) = table.check_declarations(classes, class_id);
            table.own[class_id.index()].extend(accepted);
            if let Some(error) = declaration_error(classes, class_id, violations) {
                warn!(class = %error.class, count = error.violations.len(), "invalid field invariants");
                errors.push(error);
            }
        }
        (table, errors)
    }

    /// Own invariant first, then the nearest ancestor's.
    pub fn invariant_for(&self, class: ClassId, field: FieldId) -> Option<Invariant> {
        self.field_invariant(class, field).map(|resolved| resolved.invariant)
    }

    /// Like `invariant_for`, also naming the class whose declaration won.
    pub fn field_invariant(&self, class: ClassId, field: FieldId) -> Option<FieldInvariant> {
        let mut current = Some(class);
        while let Some(id) = current {
            if let Some(inv) = self.own.get(id.index()).and_then(|own| own.get(&field)) {
                return Some(FieldInvariant {
                    field,
                    invariant: *inv,
                    declared_in: id,
                });
            }
            current = self.parents.get(id.index()).copied().flatten();
        }
        None
    }

    /// Fields that must be initialized before an object (or, for `is_static`,
    /// the class itself) may be considered committed. Instance requirements
    /// include inherited fields; static ones are the class's own.
    pub fn required_fields(
        &self,
        classes: &ClassTable,
        class: ClassId,
        is_static: bool,
    ) -> Vec<FieldId> {
        let owners: Vec<ClassId> = if is_static {
            vec![class]
        } else {
            classes.self_and_ancestors(class).collect()
        };
        owners
            .into_iter()
            .flat_map(|owner| classes.fields_of(owner))
            .filter(|field| field.is_static == is_static && !field.is_unclassified())
            .filter(|field| self.invariant_for(class, field.id).is_some())
            .map(|field| field.id)
            .collect()
    }

    /// Re-checks the class-level declarations of `class` against its ancestors.
    pub fn validate_declaration(
        &self,
        classes: &ClassTable,
        class: ClassId,
    ) -> Result<(), InvariantError> {
        let (_, violations) = self.check_declarations(classes, class);
        match declaration_error(classes, class, violations) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn check_declarations(
        &self,
        classes: &ClassTable,
        class: ClassId,
    ) -> (Vec<(FieldId, Invariant)>, Vec<InvariantViolation>) {
        let decl = classes.class(class);
        let mut accepted = Vec::new();
        let mut violations = Vec::new();
        let mut seen = HashSet::new();

        for inv_decl in &decl.invariants {
            let name = &inv_decl.field;
            if !seen.insert(name.as_str()) {
                violations.push(InvariantViolation::Duplicate(name.clone()));
                continue;
            }
            let Some(field) = classes.find_field(class, name) else {
                violations.push(InvariantViolation::UnknownField(name.clone()));
                continue;
            };
            if !classes.is_strict_ancestor(field.owner, class) {
                violations.push(InvariantViolation::NotInherited(name.clone()));
                continue;
            }
            if !field.is_final {
                violations.push(InvariantViolation::NotFinal(name.clone()));
                continue;
            }
            let inherited = decl
                .superclass
                .and_then(|parent| self.invariant_for(parent, field.id));
            if let Some(inherited) = inherited
                && !inv_decl.invariant.is_at_least_as_strong_as(&inherited)
            {
                violations.push(InvariantViolation::Weakened {
                    field: name.clone(),
                    inherited,
                    declared: inv_decl.invariant,
                });
                continue;
            }
            accepted.push((field.id, inv_decl.invariant));
        }
        (accepted, violations)
    }
}

fn declaration_error(
    classes: &ClassTable,
    class: ClassId,
    violations: Vec<InvariantViolation>,
) -> Option<InvariantError> {
    if violations.is_empty() {
        return None;
    }
    let decl = classes.class(class);
    Some(InvariantError {
        class: decl.name.clone(),
        violations,
        span: decl.span,
    })
}

#[cfg(test)]
#[path = "../../tests/t_invariant.rs"]
mod tests;
