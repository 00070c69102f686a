//! Centralized type compatibility rules.
//!
//! Base types are compared nominally: a value fits a target with the same base
//! name, or any target whose base is `Object`; the `null` literal fits every
//! base. Qualifiers are compared over the commitment lattice, with an absent
//! qualifier on a value read as the language default `DEFAULT_QUALIFIER` and
//! an absent qualifier on a target accepting anything.
//!
//! How to use:
//! - Call `type_assignable(from, to)` to decide if an assignment is allowed.

use crate::core::qualifier::Qualifier;
use crate::core::tree::QualifiedType;

/// Qualifier of an unannotated value.
pub const DEFAULT_QUALIFIER: Qualifier = Qualifier::Committed;

const TOP_BASE: &str = "Object";
const NULL_BASE: &str = "null";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeAssignability {
    Exact,
    Subsumed,
    Incompatible,
}

impl TypeAssignability {
    pub fn is_assignable(self) -> bool {
        self != TypeAssignability::Incompatible
    }
}

pub fn type_assignable(from: &QualifiedType, to: &QualifiedType) -> TypeAssignability {
    if from == to {
        return TypeAssignability::Exact;
    }
    if !base_assignable(&from.base, &to.base) {
        return TypeAssignability::Incompatible;
    }
    let Some(target) = to.qualifier else {
        return TypeAssignability::Subsumed;
    };
    let source = from.qualifier.unwrap_or(DEFAULT_QUALIFIER);
    if source.is_subtype(target) {
        TypeAssignability::Subsumed
    } else {
        TypeAssignability::Incompatible
    }
}

fn base_assignable(from: &str, to: &str) -> bool {
    from == to || to == TOP_BASE || from == NULL_BASE
}
