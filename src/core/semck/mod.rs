//! Freedom-before-commitment checks.
//!
//! Each syntactic construct has one entry point on `InitChecker`; failures are
//! recorded and checking continues, so a unit accumulates every violation in
//! one pass. `check_class` walks a whole class the way a syntax visitor would.

mod cast;
mod completeness;
mod contract;
mod errors;
mod field_write;

use std::collections::HashSet;

use tracing::{debug, debug_span};

pub use completeness::{CheckPoint, INVALID_CONSTRUCTOR_RETURNS, uninitialized_invariant_fields};
pub use errors::{InitCheckError, InitCheckErrorKind};

use crate::core::flow::FlowFacts;
use crate::core::invariant::InvariantTable;
use crate::core::qualifier::Qualifier;
use crate::core::store::InitStore;
use crate::core::tree::visit::Visitor;
use crate::core::tree::{
    CastExpr, ClassId, ClassKind, ClassTable, FieldId, FieldWrite, InitBlock, MethodDecl, Receiver,
};
use crate::core::types::TypeOracle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Accept casts where either side lacks a commitment qualifier.
    pub permissive_casts: bool,
    /// Check static invariant fields at the end of class initialization.
    pub static_fields: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            permissive_casts: true,
            static_fields: true,
        }
    }
}

/// Read-only inputs shared by every check.
#[derive(Clone, Copy)]
pub struct CheckContext<'a> {
    pub classes: &'a ClassTable,
    pub invariants: &'a InvariantTable,
    pub oracle: &'a dyn TypeOracle,
    pub options: CheckOptions,
}

pub struct InitChecker<'a> {
    ctx: CheckContext<'a>,
    errors: Vec<InitCheckError>,
    /// Invariant fields established by instance initializer blocks of the
    /// class being visited.
    initialized_fields: HashSet<FieldId>,
}

impl<'a> InitChecker<'a> {
    pub fn new(ctx: CheckContext<'a>) -> Self {
        Self {
            ctx,
            errors: Vec::new(),
            initialized_fields: HashSet::new(),
        }
    }

    pub fn finish(self) -> Vec<InitCheckError> {
        self.errors
    }

    fn record(&mut self, result: Result<(), InitCheckError>) -> bool {
        match result {
            Ok(()) => true,
            Err(error) => {
                debug!(node = %error.node, key = error.kind.key(), "{error}");
                self.errors.push(error);
                false
            }
        }
    }

    // --- Entry points ---

    pub fn check_field_decl(&mut self, field: FieldId) -> bool {
        let decl = self.ctx.classes.field(field);
        self.record(field_write::check_field_decl(decl))
    }

    pub fn check_field_write(&mut self, class: ClassId, write: &FieldWrite) -> bool {
        let result = field_write::check_field_write(&self.ctx, class, write);
        self.record(result)
    }

    pub fn check_cast(&mut self, cast: &CastExpr) -> bool {
        let result = cast::check_cast(&self.ctx, cast);
        self.record(result)
    }

    /// End of a static initializer block: its exit store with the static
    /// field initializers folded in.
    pub fn check_static_block(
        &mut self,
        class: ClassId,
        block: &InitBlock,
        facts: &dyn FlowFacts,
    ) -> bool {
        let store = facts
            .regular_exit_store(block.node)
            .map(|store| store.with_field_initializers_folded(self.ctx.classes, class, true));
        let at = CheckPoint {
            class,
            node: block.node,
            span: block.span,
            is_static: true,
            receiver: &[],
        };
        let result =
            completeness::check_fields_initialized(&self.ctx, &at, store.as_ref(), &HashSet::new());
        self.record(result)
    }

    /// A class without a static initializer block: the static field
    /// initializers alone must establish every static invariant.
    pub fn check_static_initializers(&mut self, class: ClassId) -> bool {
        let decl = self.ctx.classes.class(class);
        let store = InitStore::empty().with_field_initializers_folded(self.ctx.classes, class, true);
        let at = CheckPoint {
            class,
            node: decl.node,
            span: decl.span,
            is_static: true,
            receiver: &[],
        };
        let result =
            completeness::check_fields_initialized(&self.ctx, &at, Some(&store), &HashSet::new());
        self.record(result)
    }

    /// Declared return qualifier plus commitment at normal exit.
    pub fn check_constructor(
        &mut self,
        class: ClassId,
        ctor: &MethodDecl,
        facts: &dyn FlowFacts,
    ) -> bool {
        let return_ok = self.record(completeness::check_constructor_return(ctor));
        let at = CheckPoint {
            class,
            node: ctor.node,
            span: ctor.span,
            is_static: false,
            receiver: &ctor.receiver,
        };
        let result = completeness::check_fields_initialized(
            &self.ctx,
            &at,
            facts.regular_exit_store(ctor.node),
            &self.initialized_fields,
        );
        self.record(result) && return_ok
    }

    pub fn discharges_contract(
        &self,
        class: ClassId,
        expr: &Receiver,
        required: Qualifier,
        inferred: Option<Qualifier>,
        store: &InitStore,
    ) -> bool {
        contract::discharges_contract(&self.ctx, class, expr, required, inferred, store)
    }

    /// Postconditions of `method` at its regular exit store.
    pub fn check_postconditions(
        &mut self,
        class: ClassId,
        method: &MethodDecl,
        facts: &dyn FlowFacts,
    ) -> bool {
        let Some(store) = facts.regular_exit_store(method.node) else {
            return true;
        };
        let mut ok = true;
        for post in &method.postconditions {
            let inferred = post
                .expr
                .self_rooted_field()
                .and_then(|field| store.field_value(field));
            if self.discharges_contract(class, &post.expr, post.qualifier, inferred, store) {
                continue;
            }
            let kind = InitCheckErrorKind::PostconditionNotSatisfied {
                expr: render_receiver(self.ctx.classes, &post.expr),
                required: post.qualifier,
            };
            ok &= self.record(Err(kind.at(post.node, post.span)));
        }
        ok
    }

    /// Visits a whole class: field declarations, bodies, initializer blocks,
    /// constructors, and static initialization.
    pub fn check_class(&mut self, class: ClassId, facts: &dyn FlowFacts) {
        let classes = self.ctx.classes;
        let decl = classes.class(class);
        let _span = debug_span!("check_class", class = %decl.name).entered();

        self.initialized_fields =
            completeness::initialized_by_instance_blocks(&self.ctx, class, facts);

        for field in &decl.fields {
            self.check_field_decl(*field);
        }

        for block in decl.init_blocks() {
            BodyChecker {
                checker: self,
                class,
            }
            .visit_body(&block.body);
            if block.is_static && self.ctx.options.static_fields {
                self.check_static_block(class, block, facts);
            }
        }

        for method in decl.methods() {
            BodyChecker {
                checker: self,
                class,
            }
            .visit_body(&method.body);
            if method.is_constructor() {
                self.check_constructor(class, method, facts);
            }
            self.check_postconditions(class, method, facts);
        }

        if self.ctx.options.static_fields
            && decl.kind == ClassKind::Class
            && !decl.has_static_initializer()
        {
            self.check_static_initializers(class);
        }

        self.initialized_fields.clear();
    }
}

struct BodyChecker<'c, 'a> {
    checker: &'c mut InitChecker<'a>,
    class: ClassId,
}

impl Visitor for BodyChecker<'_, '_> {
    fn visit_field_write(&mut self, write: &FieldWrite) {
        self.checker.check_field_write(self.class, write);
    }

    fn visit_cast(&mut self, cast: &CastExpr) {
        self.checker.check_cast(cast);
    }
}

fn render_receiver(classes: &ClassTable, expr: &Receiver) -> String {
    match expr {
        Receiver::ThisReference => "this".to_string(),
        Receiver::ClassName(class) => classes.class(*class).name.clone(),
        Receiver::FieldAccess { receiver, field } => {
            format!(
                "{}.{}",
                render_receiver(classes, receiver),
                classes.field(*field).name
            )
        }
        Receiver::Other => "<expr>".to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/semck/t_checker.rs"]
mod tests;
