use std::collections::HashMap;

use crate::core::qualifier::Qualifier;
use crate::core::tree::{FieldId, QualifiedType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FieldTypeKey {
    field: FieldId,
    receiver: Option<Qualifier>,
    adapted: bool,
}

/// Memoized field type lookups.
#[derive(Debug, Default, Clone)]
pub struct FieldTypeCache {
    types: HashMap<FieldTypeKey, QualifiedType>,
}

impl FieldTypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        field: FieldId,
        receiver: Option<Qualifier>,
        adapted: bool,
    ) -> Option<&QualifiedType> {
        self.types.get(&FieldTypeKey {
            field,
            receiver,
            adapted,
        })
    }

    pub fn insert(
        &mut self,
        field: FieldId,
        receiver: Option<Qualifier>,
        adapted: bool,
        ty: QualifiedType,
    ) {
        self.types.insert(
            FieldTypeKey {
                field,
                receiver,
                adapted,
            },
            ty,
        );
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
