//! Class and field declarations indexed by id, with superclass links.

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use crate::core::diag::Span;
use crate::core::tree::{ClassDecl, ClassId, FieldDecl, FieldId};

#[derive(Debug, Clone, Error)]
pub enum ClassTableError {
    #[error("Duplicate class: {0}")]
    DuplicateClass(String, Span),

    #[error("Duplicate field {1} in class {0}")]
    DuplicateField(String, String, Span),

    #[error("Cyclic inheritance involving class {0}")]
    CyclicInheritance(String, Span),
}

impl ClassTableError {
    pub fn span(&self) -> Span {
        match self {
            ClassTableError::DuplicateClass(_, span) => *span,
            ClassTableError::DuplicateField(_, _, span) => *span,
            ClassTableError::CyclicInheritance(_, span) => *span,
        }
    }
}

pub struct ClassTableBuilder {
    classes: Vec<ClassDecl>,
    fields: Vec<FieldDecl>,
    by_name: IndexMap<String, ClassId>,
    errors: Vec<ClassTableError>,
}

impl Default for ClassTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassTableBuilder {
    pub fn new() -> Self {
        Self {
            classes: Vec::new(),
            fields: Vec::new(),
            by_name: IndexMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn next_class_id(&self) -> ClassId {
        ClassId(self.classes.len() as u32)
    }

    pub fn next_field_id(&self) -> FieldId {
        FieldId(self.fields.len() as u32)
    }

    /// Records a class. The declaration's `id` must come from `next_class_id`.
    pub fn record_class(&mut self, class: ClassDecl) {
        debug_assert_eq!(class.id, self.next_class_id());
        if self.by_name.contains_key(&class.name) {
            self.errors
                .push(ClassTableError::DuplicateClass(class.name.clone(), class.span));
        } else {
            self.by_name.insert(class.name.clone(), class.id);
        }
        self.classes.push(class);
    }

    /// Records a field and attaches it to its owner, which must already be recorded.
    pub fn record_field(&mut self, field: FieldDecl) {
        debug_assert_eq!(field.id, self.next_field_id());
        let Some(owner) = self.classes.get_mut(field.owner.index()) else {
            return;
        };
        let duplicate = owner
            .fields
            .iter()
            .any(|id| self.fields[id.index()].name == field.name);
        if duplicate {
            self.errors.push(ClassTableError::DuplicateField(
                owner.name.clone(),
                field.name.clone(),
                field.span,
            ));
        }
        owner.fields.push(field.id);
        self.fields.push(field);
    }

    pub fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn set_superclass(&mut self, class: ClassId, superclass: ClassId) {
        if let Some(decl) = self.classes.get_mut(class.index()) {
            decl.superclass = Some(superclass);
        }
    }

    pub fn class(&self, class: ClassId) -> Option<&ClassDecl> {
        self.classes.get(class.index())
    }

    pub fn class_mut(&mut self, class: ClassId) -> Option<&mut ClassDecl> {
        self.classes.get_mut(class.index())
    }

    pub fn field(&self, field: FieldId) -> Option<&FieldDecl> {
        self.fields.get(field.index())
    }

    /// Finds a field by name in `class` or its nearest ancestor declaring it.
    /// Superclass links may still be cyclic here, so the walk is bounded.
    pub fn find_field(&self, class: ClassId, name: &str) -> Option<&FieldDecl> {
        let mut current = Some(class);
        for _ in 0..=self.classes.len() {
            let decl = self.classes.get(current?.index())?;
            let found = decl
                .fields
                .iter()
                .map(|id| &self.fields[id.index()])
                .find(|field| field.name == name);
            if found.is_some() {
                return found;
            }
            current = decl.superclass;
        }
        None
    }

    pub fn finish(mut self) -> Result<ClassTable, Vec<ClassTableError>> {
        for class in &self.classes {
            if has_cycle(&self.classes, class.id) {
                self.errors.push(ClassTableError::CyclicInheritance(
                    class.name.clone(),
                    class.span,
                ));
            }
        }
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        Ok(ClassTable {
            classes: self.classes,
            fields: self.fields,
            by_name: self.by_name,
        })
    }
}

fn has_cycle(classes: &[ClassDecl], start: ClassId) -> bool {
    let mut current = classes[start.index()].superclass;
    let mut steps = 0;
    while let Some(id) = current {
        if id == start || steps > classes.len() {
            return true;
        }
        steps += 1;
        current = classes.get(id.index()).and_then(|class| class.superclass);
    }
    false
}

// --- ClassTable ---

/// Closed class hierarchy. Superclass chains are acyclic by construction.
#[derive(Debug, Clone)]
pub struct ClassTable {
    classes: Vec<ClassDecl>,
    fields: Vec<FieldDecl>,
    by_name: IndexMap<String, ClassId>,
}

impl ClassTable {
    pub fn class(&self, id: ClassId) -> &ClassDecl {
        &self.classes[id.index()]
    }

    pub fn field(&self, id: FieldId) -> &FieldDecl {
        &self.fields[id.index()]
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.classes.iter()
    }

    pub fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: ClassId) -> Ancestors<'_> {
        Ancestors {
            table: self,
            next: self.class(id).superclass,
        }
    }

    /// `id` followed by its ancestors.
    pub fn self_and_ancestors(&self, id: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        std::iter::once(id).chain(self.ancestors(id))
    }

    pub fn is_strict_ancestor(&self, ancestor: ClassId, of: ClassId) -> bool {
        self.ancestors(of).any(|id| id == ancestor)
    }

    pub fn fields_of(&self, class: ClassId) -> impl Iterator<Item = &FieldDecl> {
        self.class(class).fields.iter().map(|id| self.field(*id))
    }

    /// Finds a field by name in `class` or the nearest ancestor declaring it.
    pub fn find_field(&self, class: ClassId, name: &str) -> Option<&FieldDecl> {
        self.self_and_ancestors(class)
            .find_map(|id| self.fields_of(id).find(|field| field.name == name))
    }
}

pub struct Ancestors<'a> {
    table: &'a ClassTable,
    next: Option<ClassId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ClassId;

    fn next(&mut self) -> Option<ClassId> {
        let current = self.next?;
        self.next = self.table.class(current).superclass;
        Some(current)
    }
}

impl fmt::Display for ClassTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for class in &self.classes {
            write!(f, "{}", class.name)?;
            if let Some(parent) = class.superclass {
                write!(f, " extends {}", self.class(parent).name)?;
            }
            writeln!(f)?;
            for field in self.fields_of(class.id) {
                let mut flags = Vec::new();
                if field.is_static {
                    flags.push("static");
                }
                if field.is_final {
                    flags.push("final");
                }
                write!(f, "  {}: {}", field.name, field.ty)?;
                if !flags.is_empty() {
                    write!(f, " [{}]", flags.join(", "))?;
                }
                if let Some(inv) = field.invariant {
                    write!(f, " requires {inv}")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
