use crate::core::tree::*;

/// Body visitor with default traversal helpers.
///
/// Implement the methods you care about (e.g. `visit_field_write`) and call
/// the corresponding `walk_*` function to recurse into children.
/// Example:
/// ```rust
/// use fbc::core::tree::FieldWrite;
/// use fbc::core::tree::visit::Visitor;
///
/// struct CountWrites(usize);
/// impl Visitor for CountWrites {
///     fn visit_field_write(&mut self, _write: &FieldWrite) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait Visitor {
    fn visit_body(&mut self, body: &[Stmt]) {
        walk_body(self, body)
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt)
    }

    fn visit_field_write(&mut self, _write: &FieldWrite) {}

    fn visit_cast(&mut self, _cast: &CastExpr) {}
}

pub fn walk_body<V: Visitor + ?Sized>(v: &mut V, body: &[Stmt]) {
    for stmt in body {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Assign(write) => v.visit_field_write(write),
        Stmt::Cast(cast) => v.visit_cast(cast),
        Stmt::If {
            then_body,
            else_body,
            ..
        } => {
            v.visit_body(then_body);
            v.visit_body(else_body);
        }
        Stmt::While { body, .. } => v.visit_body(body),
        Stmt::SuperCall { .. } | Stmt::Return { .. } | Stmt::Throw { .. } => {}
    }
}
