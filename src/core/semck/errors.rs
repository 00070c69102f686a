use thiserror::Error;

use crate::core::diag::Span;
use crate::core::qualifier::Qualifier;
use crate::core::tree::{NodeId, QualifiedType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitCheckErrorKind {
    #[error("Invalid cast: {} cannot be cast to {}", show(.found), show(.target))]
    InvalidCast {
        found: Option<Qualifier>,
        target: Option<Qualifier>,
    },

    #[error("Invariant fields not initialized: {}", .0.join(", "))]
    FieldsUninitialized(Vec<String>),

    #[error("Field `{field}` cannot be declared {annotation}")]
    InvalidFieldAnnotation {
        field: String,
        annotation: Qualifier,
    },

    #[error("Constructor return type cannot be {0}")]
    InvalidConstructorReturnType(Qualifier),

    #[error("Cannot write {} to field `{field}` of a receiver that is not known to be free", show(.value))]
    FieldWriteOnUnclassifiedReceiver {
        field: String,
        value: Option<Qualifier>,
    },

    #[error("Cannot write {} to field `{field}` of a committed receiver", show(.value))]
    FieldWriteOnCommittedReceiver {
        field: String,
        value: Option<Qualifier>,
    },

    #[error("Incompatible assignment: found {found}, required {required}")]
    IncompatibleAssignment {
        found: QualifiedType,
        required: QualifiedType,
    },

    #[error("Postcondition not satisfied: `{expr}` must be {required}")]
    PostconditionNotSatisfied { expr: String, required: Qualifier },
}

fn show(qualifier: &Option<Qualifier>) -> String {
    match qualifier {
        Some(q) => q.to_string(),
        None => "an unqualified value".to_string(),
    }
}

impl InitCheckErrorKind {
    pub fn at(self, node: NodeId, span: Span) -> InitCheckError {
        InitCheckError {
            kind: self,
            node,
            span,
        }
    }

    /// Stable message key, usable for suppression.
    pub fn key(&self) -> &'static str {
        match self {
            InitCheckErrorKind::InvalidCast { .. } => "initialization.invalid.cast",
            InitCheckErrorKind::FieldsUninitialized(_) => "initialization.fields.uninitialized",
            InitCheckErrorKind::InvalidFieldAnnotation { .. } => {
                "initialization.invalid.field.annotation"
            }
            InitCheckErrorKind::InvalidConstructorReturnType(_) => {
                "initialization.invalid.constructor.return.type"
            }
            InitCheckErrorKind::FieldWriteOnUnclassifiedReceiver { .. } => {
                "initialization.invalid.field.write.unknown"
            }
            InitCheckErrorKind::FieldWriteOnCommittedReceiver { .. } => {
                "initialization.invalid.field.write.initialized"
            }
            InitCheckErrorKind::IncompatibleAssignment { .. } => "assignment.type.incompatible",
            InitCheckErrorKind::PostconditionNotSatisfied { .. } => {
                "contracts.postcondition.not.satisfied"
            }
        }
    }
}

/// A diagnostic for one syntax node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct InitCheckError {
    pub kind: InitCheckErrorKind,
    pub node: NodeId,
    pub span: Span,
}

impl InitCheckError {
    pub fn span(&self) -> Span {
        self.span
    }
}
