//! Lowers a unit manifest into the class table.
//!
//! Lowering is where the reference type inference lives: the receiver of a
//! `this.f` write is `Free` inside constructors and instance initializer
//! blocks and whatever the receiver annotation says (default `Committed`)
//! inside methods.

use std::ops::Range;

use thiserror::Error;

use crate::core::diag::{LineIndex, Span};
use crate::core::qualifier::Qualifier;
use crate::core::tree::{
    CastExpr, ClassDecl, ClassId, ClassKind, ClassTable, ClassTableBuilder, ClassTableError,
    FieldDecl, FieldId, FieldWrite, InitBlock, Invariant, InvariantDecl, Member, MethodDecl, MethodKind,
    NodeIdGen, Postcondition, QualifiedType, Receiver, ReceiverAnnotation, Stmt, ValueExpr,
};
use crate::driver::manifest::{
    AssignSpec, CastSpec, ClassKindSpec, ClassSpec, MethodSpec, ReceiverKind, StmtSpec,
    UnitManifest,
};

#[derive(Debug, Clone, Error)]
pub enum ManifestError {
    #[error("Invalid manifest: {0}")]
    Decode(String, Span),

    #[error("Unknown class: {0}")]
    UnknownClass(String, Span),

    #[error("Unknown field `{1}` in class {0}")]
    UnknownField(String, String, Span),

    #[error("`this` is not available in a static context")]
    ThisInStaticContext(Span),

    #[error(transparent)]
    ClassTable(#[from] ClassTableError),
}

impl ManifestError {
    pub fn span(&self) -> Span {
        match self {
            ManifestError::Decode(_, span) => *span,
            ManifestError::UnknownClass(_, span) => *span,
            ManifestError::UnknownField(_, _, span) => *span,
            ManifestError::ThisInStaticContext(span) => *span,
            ManifestError::ClassTable(e) => e.span(),
        }
    }
}

pub fn parse_manifest(source: &str) -> Result<UnitManifest, ManifestError> {
    toml::from_str(source).map_err(|e| {
        let index = LineIndex::new(source);
        let span = e.span().map(|range| index.span(range)).unwrap_or_default();
        ManifestError::Decode(e.message().to_string(), span)
    })
}

/// What `this` means in the body being lowered.
#[derive(Clone, Copy)]
enum BodyContext {
    Static,
    Instance(Option<Qualifier>),
}

pub struct Lowerer {
    index: LineIndex,
    ids: NodeIdGen,
    builder: ClassTableBuilder,
    errors: Vec<ManifestError>,
}

impl Lowerer {
    pub fn new(source: &str) -> Self {
        Self {
            index: LineIndex::new(source),
            ids: NodeIdGen::new(),
            builder: ClassTableBuilder::new(),
            errors: Vec::new(),
        }
    }

    pub fn lower(mut self, manifest: &UnitManifest) -> Result<ClassTable, Vec<ManifestError>> {
        // Classes first so superclasses and frames may be forward references.
        let ids: Vec<ClassId> = manifest
            .classes
            .iter()
            .map(|spec| self.declare_class(spec))
            .collect();

        for (spec, &id) in manifest.classes.iter().zip(&ids) {
            if let Some(parent) = &spec.extends {
                match self.builder.lookup_class(parent.get_ref()) {
                    Some(parent_id) => self.builder.set_superclass(id, parent_id),
                    None => {
                        let span = self.span(parent.span());
                        self.errors
                            .push(ManifestError::UnknownClass(parent.get_ref().clone(), span));
                    }
                }
            }
        }

        for (spec, &id) in manifest.classes.iter().zip(&ids) {
            self.lower_fields(spec, id);
        }

        for (spec, &id) in manifest.classes.iter().zip(&ids) {
            let invariants = self.lower_invariants(spec);
            let members = self.lower_members(spec, id);
            if let Some(class) = self.builder.class_mut(id) {
                class.invariants = invariants;
                class.members = members;
            }
        }

        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        self.builder
            .finish()
            .map_err(|errs| errs.into_iter().map(ManifestError::from).collect())
    }

    fn span(&self, range: Range<usize>) -> Span {
        self.index.span(range)
    }

    fn declare_class(&mut self, spec: &ClassSpec) -> ClassId {
        let id = self.builder.next_class_id();
        let kind = match spec.kind {
            ClassKindSpec::Class => ClassKind::Class,
            ClassKindSpec::Interface => ClassKind::Interface,
            ClassKindSpec::Enum => ClassKind::Enum,
        };
        let class = ClassDecl {
            id,
            node: self.ids.new_id(),
            name: spec.name.get_ref().clone(),
            kind,
            superclass: None,
            fields: Vec::new(),
            invariants: Vec::new(),
            members: Vec::new(),
            span: self.span(spec.name.span()),
        };
        self.builder.record_class(class);
        id
    }

    fn lower_fields(&mut self, spec: &ClassSpec, owner: ClassId) {
        for field in &spec.fields {
            let span = self.span(field.name.span());
            let invariant = field.invariant.map(|qualifier| Invariant {
                qualifier,
                refinement: field.refinement,
            });
            let initializer = field.initializer.as_ref().map(|value| ValueExpr {
                node: self.ids.new_id(),
                ty: QualifiedType::new(value.base().unwrap_or(&field.ty), value.qualifier()),
                span,
            });
            let decl = FieldDecl {
                id: self.builder.next_field_id(),
                node: self.ids.new_id(),
                owner,
                name: field.name.get_ref().clone(),
                ty: field.ty.clone(),
                is_static: field.is_static,
                is_final: field.is_final,
                annotations: field.annotations.clone(),
                invariant,
                initializer,
                span,
            };
            self.builder.record_field(decl);
        }
    }

    fn lower_invariants(&mut self, spec: &ClassSpec) -> Vec<InvariantDecl> {
        spec.invariants
            .iter()
            .map(|inv| InvariantDecl {
                node: self.ids.new_id(),
                field: inv.field.get_ref().clone(),
                invariant: Invariant {
                    qualifier: inv.qualifier,
                    refinement: inv.refinement,
                },
                span: self.span(inv.field.span()),
            })
            .collect()
    }

    fn lower_members(&mut self, spec: &ClassSpec, class: ClassId) -> Vec<Member> {
        let class_span = self.span(spec.name.span());
        let mut members = Vec::new();

        for block in &spec.blocks {
            let context = if block.is_static {
                BodyContext::Static
            } else {
                BodyContext::Instance(Some(Qualifier::Free))
            };
            let body = self.lower_body(&block.body, class, context, class_span);
            members.push(Member::Block(InitBlock {
                node: self.ids.new_id(),
                is_static: block.is_static,
                body,
                span: class_span,
            }));
        }

        let has_superclass = self
            .builder
            .class(class)
            .is_some_and(|decl| decl.superclass.is_some());
        for ctor_spec in &spec.constructors {
            let context = BodyContext::Instance(Some(Qualifier::Free));
            let mut ctor = self.lower_method(ctor_spec, class, MethodKind::Constructor, context);
            // Without an explicit `super`, the superclass constructor runs first.
            let explicit_super = ctor
                .body
                .iter()
                .any(|stmt| matches!(stmt, Stmt::SuperCall { .. }));
            if has_superclass && !explicit_super {
                ctor.body.insert(
                    0,
                    Stmt::SuperCall {
                        node: self.ids.new_id(),
                        span: ctor.span,
                    },
                );
            }
            members.push(Member::Method(ctor));
        }

        for method in &spec.methods {
            let context = if method.is_static {
                BodyContext::Static
            } else {
                let receiver = method
                    .receiver
                    .first()
                    .map_or(Qualifier::Committed, |anno| anno.qualifier);
                BodyContext::Instance(Some(receiver))
            };
            members.push(Member::Method(self.lower_method(
                method,
                class,
                MethodKind::Method,
                context,
            )));
        }
        members
    }

    fn lower_method(
        &mut self,
        spec: &MethodSpec,
        class: ClassId,
        kind: MethodKind,
        context: BodyContext,
    ) -> MethodDecl {
        let span = self.span(spec.name.span());
        let receiver = spec
            .receiver
            .iter()
            .map(|anno| ReceiverAnnotation {
                qualifier: anno.qualifier,
                frame: anno.frame.as_ref().and_then(|frame| self.resolve_class(frame)),
            })
            .collect();
        let postconditions = spec
            .ensures
            .iter()
            .filter_map(|post| {
                let post_span = self.span(post.field.span());
                let root = self.receiver_root(post.receiver, class, context, post_span)?;
                let (field, _) = self.resolve_field(class, post.field.get_ref(), post_span)?;
                Some(Postcondition {
                    node: self.ids.new_id(),
                    expr: Receiver::field_access(root, field),
                    qualifier: post.qualifier,
                    span: post_span,
                })
            })
            .collect();
        let body = self.lower_body(&spec.body, class, context, span);
        MethodDecl {
            node: self.ids.new_id(),
            name: spec.name.get_ref().clone(),
            kind,
            is_static: spec.is_static,
            receiver,
            return_annotations: spec.returns.clone(),
            postconditions,
            body,
            span,
        }
    }

    fn lower_body(
        &mut self,
        stmts: &[StmtSpec],
        class: ClassId,
        context: BodyContext,
        span: Span,
    ) -> Vec<Stmt> {
        stmts
            .iter()
            .filter_map(|stmt| self.lower_stmt(stmt, class, context, span))
            .collect()
    }

    fn lower_stmt(
        &mut self,
        stmt: &StmtSpec,
        class: ClassId,
        context: BodyContext,
        span: Span,
    ) -> Option<Stmt> {
        let lowered = match stmt {
            StmtSpec::Assign(assign) => Stmt::Assign(self.lower_assign(assign, class, context)?),
            StmtSpec::Cast(cast) => Stmt::Cast(self.lower_cast(cast)),
            StmtSpec::If(branches) => Stmt::If {
                node: self.ids.new_id(),
                then_body: self.lower_body(&branches.then, class, context, span),
                else_body: self.lower_body(&branches.otherwise, class, context, span),
            },
            StmtSpec::While(looped) => Stmt::While {
                node: self.ids.new_id(),
                body: self.lower_body(&looped.body, class, context, span),
            },
            StmtSpec::Super => Stmt::SuperCall {
                node: self.ids.new_id(),
                span,
            },
            StmtSpec::Return => Stmt::Return {
                node: self.ids.new_id(),
                span,
            },
            StmtSpec::Throw => Stmt::Throw {
                node: self.ids.new_id(),
                span,
            },
        };
        Some(lowered)
    }

    fn lower_assign(
        &mut self,
        assign: &AssignSpec,
        class: ClassId,
        context: BodyContext,
    ) -> Option<FieldWrite> {
        let span = self.span(assign.field.span());
        let lookup_class = match &assign.of {
            Some(name) => match self.builder.lookup_class(name) {
                Some(id) => id,
                None => {
                    self.errors
                        .push(ManifestError::UnknownClass(name.clone(), span));
                    return None;
                }
            },
            None => class,
        };
        let (field, field_ty) = self.resolve_field(lookup_class, assign.field.get_ref(), span)?;
        let receiver = self.receiver_root(assign.receiver, lookup_class, context, span)?;
        let receiver_qualifier = match (assign.receiver, context) {
            (ReceiverKind::This, BodyContext::Instance(q)) => q,
            (ReceiverKind::Other, _) => assign.receiver_qualifier,
            _ => None,
        };
        let value_ty = match &assign.value {
            Some(value) => {
                QualifiedType::new(value.base().unwrap_or(&field_ty), value.qualifier())
            }
            None => QualifiedType::new(field_ty, None),
        };
        Some(FieldWrite {
            node: self.ids.new_id(),
            receiver,
            receiver_qualifier,
            field,
            value: ValueExpr {
                node: self.ids.new_id(),
                ty: value_ty,
                span,
            },
            span,
        })
    }

    fn lower_cast(&mut self, cast: &CastSpec) -> CastExpr {
        let span = self.span(cast.ty.span());
        CastExpr {
            node: self.ids.new_id(),
            expr: ValueExpr {
                node: self.ids.new_id(),
                ty: QualifiedType::new(cast.from_type.clone(), cast.from),
                span,
            },
            target: QualifiedType::new(cast.ty.get_ref().clone(), cast.to),
            span,
        }
    }

    fn receiver_root(
        &mut self,
        kind: ReceiverKind,
        class: ClassId,
        context: BodyContext,
        span: Span,
    ) -> Option<Receiver> {
        match (kind, context) {
            (ReceiverKind::This, BodyContext::Static) => {
                self.errors.push(ManifestError::ThisInStaticContext(span));
                None
            }
            (ReceiverKind::This, BodyContext::Instance(_)) => Some(Receiver::ThisReference),
            (ReceiverKind::Class, _) => Some(Receiver::ClassName(class)),
            (ReceiverKind::Other, _) => Some(Receiver::Other),
        }
    }

    fn resolve_class(&mut self, name: &toml::Spanned<String>) -> Option<ClassId> {
        let found = self.builder.lookup_class(name.get_ref());
        if found.is_none() {
            let span = self.span(name.span());
            self.errors
                .push(ManifestError::UnknownClass(name.get_ref().clone(), span));
        }
        found
    }

    fn resolve_field(
        &mut self,
        class: ClassId,
        name: &str,
        span: Span,
    ) -> Option<(FieldId, String)> {
        match self.builder.find_field(class, name) {
            Some(field) => Some((field.id, field.ty.clone())),
            None => {
                let class_name = self
                    .builder
                    .class(class)
                    .map(|decl| decl.name.clone())
                    .unwrap_or_default();
                self.errors
                    .push(ManifestError::UnknownField(class_name, name.to_string(), span));
                None
            }
        }
    }
}

/// Parses and lowers `source` in one go.
pub fn lower_source(source: &str) -> Result<ClassTable, Vec<ManifestError>> {
    let manifest = parse_manifest(source).map_err(|e| vec![e])?;
    Lowerer::new(source).lower(&manifest)
}

#[cfg(test)]
#[path = "../tests/driver/t_lower.rs"]
mod tests;
