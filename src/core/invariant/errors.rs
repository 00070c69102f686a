use thiserror::Error;

use crate::core::diag::Span;
use crate::core::tree::Invariant;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("no field `{0}` in this class or its ancestors")]
    UnknownField(String),

    #[error("field `{0}` is not declared in a superclass")]
    NotInherited(String),

    #[error("field `{0}` is not final")]
    NotFinal(String),

    #[error("field `{field}` already has invariant {inherited}, {declared} is weaker")]
    Weakened {
        field: String,
        inherited: Invariant,
        declared: Invariant,
    },

    #[error("field `{0}` has more than one invariant")]
    Duplicate(String),
}

/// A malformed class-level invariant declaration. Reported once per class,
/// independent of any use site.
#[derive(Debug, Clone, Error)]
#[error("Invalid field invariants on class {class}: {}", render_violations(.violations))]
pub struct InvariantError {
    pub class: String,
    pub violations: Vec<InvariantViolation>,
    pub span: Span,
}

fn render_violations(violations: &[InvariantViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
