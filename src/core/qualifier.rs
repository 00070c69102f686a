//! The freedom-before-commitment qualifier lattice.
//!
//! ```text
//!        UnknownInit
//!         /      \
//!      Free    Committed
//!         \      /
//!        FbcBottom
//! ```
//!
//! `Unclassified` lives outside the lattice: it is only ever written on a
//! field declaration and switches off every commitment check for that field.
//! Callers must special-case it before asking subtype questions, which is why
//! it is a separate `InitAnnotation` variant rather than a `Qualifier`.

use std::fmt;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Qualifier {
    FbcBottom,
    Free,
    UnknownInit,
    Committed,
}

impl Qualifier {
    pub const ALL: [Qualifier; 4] = [
        Qualifier::FbcBottom,
        Qualifier::Free,
        Qualifier::UnknownInit,
        Qualifier::Committed,
    ];

    pub fn is_subtype(self, other: Qualifier) -> bool {
        use Qualifier::*;
        match (self, other) {
            (a, b) if a == b => true,
            (FbcBottom, _) => true,
            (_, UnknownInit) => true,
            _ => false,
        }
    }

    /// Least upper bound.
    pub fn lub(self, other: Qualifier) -> Qualifier {
        if self.is_subtype(other) {
            other
        } else if other.is_subtype(self) {
            self
        } else {
            Qualifier::UnknownInit
        }
    }

    /// Greatest lower bound.
    pub fn glb(self, other: Qualifier) -> Qualifier {
        if self.is_subtype(other) {
            self
        } else if other.is_subtype(self) {
            other
        } else {
            Qualifier::FbcBottom
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Qualifier::FbcBottom => "FbcBottom",
            Qualifier::Free => "Free",
            Qualifier::UnknownInit => "UnknownInit",
            Qualifier::Committed => "Committed",
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())
    }
}

/// `a <: b` over the four-point lattice.
pub fn is_subtype(a: Qualifier, b: Qualifier) -> bool {
    a.is_subtype(b)
}

/// `q` is present and below `bound`. A missing qualifier never satisfies a
/// commitment-family test.
pub fn has_at_most(q: Option<Qualifier>, bound: Qualifier) -> bool {
    q.is_some_and(|q| q.is_subtype(bound))
}

/// An explicit commitment-family annotation as written on a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitAnnotation {
    Unclassified,
    #[serde(untagged)]
    Qualifier(Qualifier),
}

impl InitAnnotation {
    pub fn is_unclassified(self) -> bool {
        matches!(self, InitAnnotation::Unclassified)
    }

    pub fn qualifier(self) -> Option<Qualifier> {
        match self {
            InitAnnotation::Qualifier(q) => Some(q),
            InitAnnotation::Unclassified => None,
        }
    }
}

impl fmt::Display for InitAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitAnnotation::Unclassified => write!(f, "@Unclassified"),
            InitAnnotation::Qualifier(q) => write!(f, "{q}"),
        }
    }
}

#[cfg(test)]
#[path = "../tests/t_qualifier.rs"]
mod tests;
