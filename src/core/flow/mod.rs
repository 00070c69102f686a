//! Reference initialization flow.
//!
//! Produces the regular exit store of every initializer block, constructor and
//! method of a class. The checker only needs the `FlowFacts` view; any other
//! fixpoint engine can stand in for this one.
//!
//! - State: `Option<InitStore>`, `None` for unreachable points.
//! - Join: store merge over reachable predecessors.
//! - Transfer: writes to `this.f` / `C.f` initialize `f`; a super call
//!   initializes every inherited instance field.

use std::collections::HashMap;

use tracing::trace;

use crate::core::analysis::dataflow::solve_forward;
use crate::core::invariant::InvariantTable;
use crate::core::qualifier::Qualifier;
use crate::core::store::InitStore;
use crate::core::tree::cfg::{BlockId, CfgBuilder};
use crate::core::tree::{ClassDecl, ClassId, ClassTable, MethodDecl, NodeId, Receiver, Stmt};

/// Stores at the end of blocks and method bodies, keyed by declaration node.
pub trait FlowFacts {
    /// Store on normal completion of `node`. `None` when the body cannot
    /// complete normally or was not analyzed.
    fn regular_exit_store(&self, node: NodeId) -> Option<&InitStore>;
}

#[derive(Debug, Clone, Default)]
pub struct FlowResults {
    exit_stores: HashMap<NodeId, InitStore>,
}

impl FlowResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, node: NodeId, store: Option<InitStore>) {
        match store {
            Some(store) => {
                self.exit_stores.insert(node, store);
            }
            None => {
                self.exit_stores.remove(&node);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.exit_stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exit_stores.is_empty()
    }
}

impl FlowFacts for FlowResults {
    fn regular_exit_store(&self, node: NodeId) -> Option<&InitStore> {
        self.exit_stores.get(&node)
    }
}

pub struct InitFlow<'a> {
    classes: &'a ClassTable,
    invariants: &'a InvariantTable,
}

impl<'a> InitFlow<'a> {
    pub fn new(classes: &'a ClassTable, invariants: &'a InvariantTable) -> Self {
        Self {
            classes,
            invariants,
        }
    }

    /// Analyzes every body of `class`.
    ///
    /// Static blocks chain in declaration order starting from the static field
    /// initializers, instance blocks likewise for instance fields. Constructors
    /// start from the instance field initializers alone.
    pub fn analyze_class(&self, class: ClassId) -> FlowResults {
        let decl = self.classes.class(class);
        let mut results = FlowResults::new();

        let mut static_entry = Some(self.initializer_entry(class, true));
        let mut instance_entry = Some(self.initializer_entry(class, false));
        for block in decl.init_blocks() {
            let entry = if block.is_static {
                &mut static_entry
            } else {
                &mut instance_entry
            };
            let exit = entry
                .clone()
                .and_then(|store| self.analyze_body(class, &block.body, store));
            results.record(block.node, exit.clone());
            *entry = exit;
        }

        for method in decl.methods() {
            let entry = if method.is_constructor() {
                self.initializer_entry(class, false)
            } else {
                self.method_entry(decl, method)
            };
            let exit = self.analyze_body(class, &method.body, entry);
            results.record(method.node, exit);
        }
        results
    }

    /// Regular exit store of `body` started in `entry`, or `None` when no path
    /// reaches the end normally.
    pub fn analyze_body(&self, class: ClassId, body: &[Stmt], entry: InitStore) -> Option<InitStore> {
        let cfg = CfgBuilder::new().build_from_body(body);
        let result = solve_forward(
            &cfg,
            cfg.entry,
            entry,
            InitStore::merge,
            |block: BlockId, in_state: &InitStore| {
                let mut state = in_state.clone();
                for stmt in &cfg.node(block).items {
                    self.transfer(class, stmt, &mut state);
                }
                state
            },
        );
        let exit = result.state_in(cfg.exit.0).cloned();
        trace!(
            blocks = cfg.nodes.len(),
            completes = exit.is_some(),
            "analyzed body"
        );
        exit
    }

    fn transfer(&self, class: ClassId, stmt: &Stmt, state: &mut InitStore) {
        match stmt {
            Stmt::Assign(write) => {
                if matches!(
                    write.receiver,
                    Receiver::ThisReference | Receiver::ClassName(_)
                ) {
                    state.add_initialized_field(write.field, write.value.ty.qualifier);
                }
            }
            Stmt::SuperCall { .. } => {
                for ancestor in self.classes.ancestors(class) {
                    for field in self.classes.fields_of(ancestor) {
                        if field.is_static {
                            continue;
                        }
                        let value = self
                            .invariants
                            .invariant_for(class, field.id)
                            .map(|inv| inv.qualifier);
                        state.add_initialized_field(field.id, value);
                    }
                }
            }
            _ => {}
        }
    }

    fn initializer_entry(&self, class: ClassId, is_static: bool) -> InitStore {
        InitStore::empty().with_field_initializers_folded(self.classes, class, is_static)
    }

    /// A method body may assume whatever its receiver annotation promises:
    /// all invariant fields for a committed receiver (the default), the
    /// fields up to the frame for a partially initialized one. Static methods
    /// run after class initialization.
    fn method_entry(&self, decl: &ClassDecl, method: &MethodDecl) -> InitStore {
        let class = decl.id;
        let mut store = InitStore::empty();
        let static_fields = self.invariants.required_fields(self.classes, class, true);
        let mut assumed = static_fields;
        if !method.is_static {
            let committed = method.receiver.is_empty()
                || method
                    .receiver
                    .iter()
                    .any(|anno| anno.qualifier.is_subtype(Qualifier::Committed));
            let frames: Vec<ClassId> = method.receiver.iter().filter_map(|anno| anno.frame).collect();
            for field in self.invariants.required_fields(self.classes, class, false) {
                let owner = self.classes.field(field).owner;
                let in_frame = frames.iter().any(|frame| {
                    *frame == owner || self.classes.is_strict_ancestor(owner, *frame)
                });
                if committed || in_frame {
                    assumed.push(field);
                }
            }
        }
        for field in assumed {
            let value = self
                .invariants
                .invariant_for(class, field)
                .map(|inv| inv.qualifier);
            store.add_initialized_field(field, value);
        }
        store
    }
}

#[cfg(test)]
#[path = "../../tests/t_flow.rs"]
mod tests;
