//! Unit manifest (`*.toml`): pre-parsed class declarations with the
//! qualifiers inference assigned to their expressions.
//!
//! ```toml
//! [[class]]
//! name = "C"
//!
//! [[class.field]]
//! name = "x"
//! type = "String"
//! invariant = "committed"
//!
//! [[class.constructor]]
//! name = "C()"
//! body = [{ assign = { field = "x", value = "committed" } }]
//! ```

use serde::Deserialize;
use toml::Spanned;

use crate::core::qualifier::{InitAnnotation, Qualifier};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitManifest {
    #[serde(default, rename = "class")]
    pub classes: Vec<ClassSpec>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassKindSpec {
    #[default]
    Class,
    Interface,
    Enum,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassSpec {
    pub name: Spanned<String>,
    #[serde(default)]
    pub kind: ClassKindSpec,
    #[serde(default)]
    pub extends: Option<Spanned<String>>,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldSpec>,
    #[serde(default, rename = "invariant")]
    pub invariants: Vec<InvariantSpec>,
    #[serde(default, rename = "block")]
    pub blocks: Vec<BlockSpec>,
    #[serde(default, rename = "constructor")]
    pub constructors: Vec<MethodSpec>,
    #[serde(default, rename = "method")]
    pub methods: Vec<MethodSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: Spanned<String>,
    #[serde(rename = "type", default = "default_type")]
    pub ty: String,
    #[serde(rename = "static", default)]
    pub is_static: bool,
    #[serde(rename = "final", default)]
    pub is_final: bool,
    #[serde(default)]
    pub annotations: Vec<InitAnnotation>,
    #[serde(default)]
    pub invariant: Option<Qualifier>,
    #[serde(default)]
    pub refinement: Option<u32>,
    #[serde(default)]
    pub initializer: Option<ValueSpec>,
}

fn default_type() -> String {
    "Object".to_string()
}

/// Class-level invariant on an inherited field.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvariantSpec {
    pub field: Spanned<String>,
    pub qualifier: Qualifier,
    #[serde(default)]
    pub refinement: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockSpec {
    #[serde(rename = "static", default)]
    pub is_static: bool,
    #[serde(default)]
    pub body: Vec<StmtSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodSpec {
    pub name: Spanned<String>,
    #[serde(rename = "static", default)]
    pub is_static: bool,
    #[serde(default)]
    pub receiver: Vec<ReceiverSpec>,
    #[serde(default)]
    pub returns: Vec<InitAnnotation>,
    #[serde(default)]
    pub ensures: Vec<EnsuresSpec>,
    #[serde(default)]
    pub body: Vec<StmtSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReceiverSpec {
    pub qualifier: Qualifier,
    #[serde(default)]
    pub frame: Option<Spanned<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnsuresSpec {
    pub field: Spanned<String>,
    pub qualifier: Qualifier,
    #[serde(default)]
    pub receiver: ReceiverKind,
}

/// Inferred type of an expression: a bare qualifier, or a table naming the
/// base type too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    Qualifier(Qualifier),
    Typed {
        #[serde(rename = "type", default)]
        ty: Option<String>,
        #[serde(default)]
        qualifier: Option<Qualifier>,
    },
}

impl ValueSpec {
    pub fn qualifier(&self) -> Option<Qualifier> {
        match self {
            ValueSpec::Qualifier(q) => Some(*q),
            ValueSpec::Typed { qualifier, .. } => *qualifier,
        }
    }

    pub fn base(&self) -> Option<&str> {
        match self {
            ValueSpec::Qualifier(_) => None,
            ValueSpec::Typed { ty, .. } => ty.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReceiverKind {
    #[default]
    This,
    Class,
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StmtSpec {
    Assign(AssignSpec),
    Cast(CastSpec),
    If(IfSpec),
    While(WhileSpec),
    Super,
    Return,
    Throw,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignSpec {
    pub field: Spanned<String>,
    #[serde(default)]
    pub receiver: ReceiverKind,
    /// Qualifier of an `other` receiver.
    #[serde(default)]
    pub receiver_qualifier: Option<Qualifier>,
    /// Class to look the field up in for an `other` receiver.
    #[serde(default)]
    pub of: Option<String>,
    #[serde(default)]
    pub value: Option<ValueSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CastSpec {
    #[serde(rename = "type")]
    pub ty: Spanned<String>,
    #[serde(default)]
    pub from: Option<Qualifier>,
    #[serde(default)]
    pub to: Option<Qualifier>,
    #[serde(default = "default_type")]
    pub from_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IfSpec {
    #[serde(default)]
    pub then: Vec<StmtSpec>,
    #[serde(rename = "else", default)]
    pub otherwise: Vec<StmtSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WhileSpec {
    #[serde(default)]
    pub body: Vec<StmtSpec>,
}

#[cfg(test)]
#[path = "../tests/driver/t_manifest.rs"]
mod tests;
