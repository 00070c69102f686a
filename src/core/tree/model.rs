//! Typed declarations and bodies handed to the checker.
//!
//! Everything here is produced upstream (parsing, name resolution and
//! qualifier inference are not this crate's business); the checker only
//! reads it.

use std::fmt;

use crate::core::diag::Span;
use crate::core::qualifier::{InitAnnotation, Qualifier};
use crate::core::tree::{ClassId, FieldId, NodeId};

// -- Types --

/// A base type plus at most one commitment-family qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedType {
    pub base: String,
    pub qualifier: Option<Qualifier>,
}

impl QualifiedType {
    pub fn new(base: impl Into<String>, qualifier: Option<Qualifier>) -> Self {
        Self {
            base: base.into(),
            qualifier,
        }
    }

    pub fn with_qualifier(mut self, qualifier: Option<Qualifier>) -> Self {
        self.qualifier = qualifier;
        self
    }
}

impl fmt::Display for QualifiedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualifier {
            Some(q) => write!(f, "{q} {}", self.base),
            None => write!(f, "{}", self.base),
        }
    }
}

/// Required qualifier for a field once its object is committed, with an
/// optional numeric refinement (e.g. a minimum length) where larger is stronger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Invariant {
    pub qualifier: Qualifier,
    pub refinement: Option<u32>,
}

impl Invariant {
    pub fn new(qualifier: Qualifier) -> Self {
        Self {
            qualifier,
            refinement: None,
        }
    }

    pub fn with_refinement(mut self, refinement: u32) -> Self {
        self.refinement = Some(refinement);
        self
    }
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.refinement {
            Some(n) => write!(f, "{}({n})", self.qualifier),
            None => write!(f, "{}", self.qualifier),
        }
    }
}

// -- Declarations --

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub id: ClassId,
    pub node: NodeId,
    pub name: String,
    pub kind: ClassKind,
    pub superclass: Option<ClassId>,
    pub fields: Vec<FieldId>,
    pub invariants: Vec<InvariantDecl>,
    pub members: Vec<Member>,
    pub span: Span,
}

impl ClassDecl {
    pub fn init_blocks(&self) -> impl Iterator<Item = &InitBlock> {
        self.members.iter().filter_map(|member| match member {
            Member::Block(block) => Some(block),
            Member::Method(_) => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|member| match member {
            Member::Method(method) => Some(method),
            Member::Block(_) => None,
        })
    }

    pub fn has_static_initializer(&self) -> bool {
        self.init_blocks().any(|block| block.is_static)
    }
}

/// A class-level invariant declaration naming a field inherited from an ancestor.
#[derive(Debug, Clone)]
pub struct InvariantDecl {
    pub node: NodeId,
    pub field: String,
    pub invariant: Invariant,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub id: FieldId,
    pub node: NodeId,
    pub owner: ClassId,
    pub name: String,
    pub ty: String,
    pub is_static: bool,
    pub is_final: bool,
    /// Commitment-family annotations written explicitly on the declaration.
    pub annotations: Vec<InitAnnotation>,
    pub invariant: Option<Invariant>,
    pub initializer: Option<ValueExpr>,
    pub span: Span,
}

impl FieldDecl {
    pub fn is_unclassified(&self) -> bool {
        self.annotations.iter().any(|anno| anno.is_unclassified())
    }
}

#[derive(Debug, Clone)]
pub enum Member {
    Block(InitBlock),
    Method(MethodDecl),
}

#[derive(Debug, Clone)]
pub struct InitBlock {
    pub node: NodeId,
    pub is_static: bool,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Constructor,
    Method,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub node: NodeId,
    pub name: String,
    pub kind: MethodKind,
    pub is_static: bool,
    pub receiver: Vec<ReceiverAnnotation>,
    pub return_annotations: Vec<InitAnnotation>,
    pub postconditions: Vec<Postcondition>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl MethodDecl {
    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }
}

/// `@Q(frame)` on a method receiver: the caller promises the receiver is at
/// least `Q`, initialized up to and including `frame` when one is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverAnnotation {
    pub qualifier: Qualifier,
    pub frame: Option<ClassId>,
}

/// `expr` holds `qualifier` whenever the method returns normally.
#[derive(Debug, Clone)]
pub struct Postcondition {
    pub node: NodeId,
    pub expr: Receiver,
    pub qualifier: Qualifier,
    pub span: Span,
}

// -- Bodies --

/// Abstract receiver expression shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Receiver {
    ThisReference,
    ClassName(ClassId),
    FieldAccess {
        receiver: Box<Receiver>,
        field: FieldId,
    },
    Other,
}

impl Receiver {
    pub fn field_access(receiver: Receiver, field: FieldId) -> Self {
        Receiver::FieldAccess {
            receiver: Box::new(receiver),
            field,
        }
    }

    /// The field of a `this.f` / `C.f` access, if that is what this is.
    pub fn self_rooted_field(&self) -> Option<FieldId> {
        match self {
            Receiver::FieldAccess { receiver, field } => match receiver.as_ref() {
                Receiver::ThisReference | Receiver::ClassName(_) => Some(*field),
                _ => None,
            },
            _ => None,
        }
    }
}

/// An expression whose type was inferred upstream.
#[derive(Debug, Clone)]
pub struct ValueExpr {
    pub node: NodeId,
    pub ty: QualifiedType,
    pub span: Span,
}

/// `receiver.field = value`
#[derive(Debug, Clone)]
pub struct FieldWrite {
    pub node: NodeId,
    pub receiver: Receiver,
    pub receiver_qualifier: Option<Qualifier>,
    pub field: FieldId,
    pub value: ValueExpr,
    pub span: Span,
}

/// `(target) expr`
#[derive(Debug, Clone)]
pub struct CastExpr {
    pub node: NodeId,
    pub expr: ValueExpr,
    pub target: QualifiedType,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Assign(FieldWrite),
    Cast(CastExpr),
    If {
        node: NodeId,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    While {
        node: NodeId,
        body: Vec<Stmt>,
    },
    SuperCall {
        node: NodeId,
        span: Span,
    },
    Return {
        node: NodeId,
        span: Span,
    },
    Throw {
        node: NodeId,
        span: Span,
    },
}
