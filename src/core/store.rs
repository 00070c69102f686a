//! Per-program-point initialization store.
//!
//! Stores are produced by the flow analysis. A field marked initialized stays
//! initialized along a path; at control-flow joins only the fields initialized
//! on every incoming path survive.

use std::collections::{HashMap, HashSet};

use crate::core::qualifier::Qualifier;
use crate::core::tree::{ClassId, ClassTable, FieldId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitStore {
    initialized: HashSet<FieldId>,
    /// Qualifier of the value last written to a field, when known.
    values: HashMap<FieldId, Qualifier>,
}

impl InitStore {
    /// Nothing is guaranteed yet.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_field_initialized(&self, field: FieldId) -> bool {
        self.initialized.contains(&field)
    }

    pub fn field_value(&self, field: FieldId) -> Option<Qualifier> {
        self.values.get(&field).copied()
    }

    pub fn initialized_fields(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.initialized.iter().copied()
    }

    pub fn add_initialized_field(&mut self, field: FieldId, value: Option<Qualifier>) {
        self.initialized.insert(field);
        match value {
            Some(q) => {
                self.values.insert(field, q);
            }
            None => {
                self.values.remove(&field);
            }
        }
    }

    /// Join at a control-flow merge: a field is initialized only if it is
    /// initialized in both stores. Known values are joined with `lub`.
    pub fn merge(&self, other: &InitStore) -> InitStore {
        let initialized: HashSet<FieldId> = self
            .initialized
            .intersection(&other.initialized)
            .copied()
            .collect();
        let values = self
            .values
            .iter()
            .filter(|(field, _)| initialized.contains(field))
            .filter_map(|(field, q)| other.values.get(field).map(|o| (*field, q.lub(*o))))
            .collect();
        InitStore {
            initialized,
            values,
        }
    }

    /// Marks every field of `class` with a direct initializer of the matching
    /// staticness. Field initializers run before initializer blocks and
    /// constructor bodies, so their targets are unconditionally initialized.
    pub fn with_field_initializers_folded(
        &self,
        classes: &ClassTable,
        class: ClassId,
        is_static: bool,
    ) -> InitStore {
        let mut store = self.clone();
        for field in classes.fields_of(class) {
            if field.is_static != is_static {
                continue;
            }
            if let Some(init) = &field.initializer {
                store.add_initialized_field(field.id, init.ty.qualifier);
            }
        }
        store
    }
}

#[cfg(test)]
#[path = "../tests/t_store.rs"]
mod tests;
