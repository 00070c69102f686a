//! Freedom-before-commitment verification engine.

pub mod analysis;
pub mod diag;
pub mod flow;
pub mod invariant;
pub mod qualifier;
pub mod semck;
pub mod store;
pub mod tree;
pub mod types;
