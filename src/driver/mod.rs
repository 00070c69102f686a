//! End-to-end checking of a unit: manifest, class table, invariant table,
//! reference flow, then the per-class checks.

pub mod config;
pub mod lower;
pub mod manifest;

use std::fmt::Write as _;

use tracing::{info, info_span};

use crate::core::flow::{FlowFacts, FlowResults, InitFlow};
use crate::core::invariant::{InvariantError, InvariantTable};
use crate::core::semck::{CheckContext, InitCheckError, InitChecker};
use crate::core::store::InitStore;
use crate::core::tree::{ClassId, ClassTable, Member};
use crate::core::types::DeclaredTypes;
use crate::driver::config::CheckerConfig;
use crate::driver::lower::{ManifestError, lower_source};

pub struct CheckReport {
    pub classes: ClassTable,
    pub invariants: InvariantTable,
    pub invariant_errors: Vec<InvariantError>,
    pub diagnostics: Vec<InitCheckError>,
    /// Flow results per class, indexed by `ClassId`.
    pub flows: Vec<FlowResults>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.invariant_errors.is_empty() && self.diagnostics.is_empty()
    }

    /// Diagnostic keys in report order.
    pub fn keys(&self) -> Vec<&'static str> {
        self.diagnostics.iter().map(|d| d.kind.key()).collect()
    }

    pub fn flow(&self, class: ClassId) -> &FlowResults {
        &self.flows[class.index()]
    }
}

/// Runs every check over an already-built class table.
pub fn check_unit(classes: ClassTable, config: &CheckerConfig) -> CheckReport {
    let _span = info_span!("check_unit", classes = classes.len()).entered();

    let (invariants, invariant_errors) = InvariantTable::build(&classes);
    let (mut diagnostics, flows) = {
        let oracle = DeclaredTypes::new(&classes, &invariants);
        let ctx = CheckContext {
            classes: &classes,
            invariants: &invariants,
            oracle: &oracle,
            options: config.options(),
        };
        let flow = InitFlow::new(&classes, &invariants);
        let mut checker = InitChecker::new(ctx);
        let mut flows = Vec::with_capacity(classes.len());
        for class in classes.classes() {
            let facts = flow.analyze_class(class.id);
            checker.check_class(class.id, &facts);
            flows.push(facts);
        }
        (checker.finish(), flows)
    };
    diagnostics.retain(|d| !config.is_suppressed(d.kind.key()));
    diagnostics.sort_by_key(|d| d.span.start);
    info!(
        diagnostics = diagnostics.len(),
        invariant_errors = invariant_errors.len(),
        "unit checked"
    );

    CheckReport {
        classes,
        invariants,
        invariant_errors,
        diagnostics,
        flows,
    }
}

/// Parses a unit manifest and checks it.
pub fn check_unit_source(
    source: &str,
    config: &CheckerConfig,
) -> Result<CheckReport, Vec<ManifestError>> {
    let classes = lower_source(source)?;
    Ok(check_unit(classes, config))
}

/// Renders the exit store of every block and method, for `--dump stores`.
pub fn dump_stores(report: &CheckReport) -> String {
    let classes = &report.classes;
    let mut out = String::new();
    for class in classes.classes() {
        let facts = report.flow(class.id);
        let _ = writeln!(out, "{}", class.name);
        for (idx, member) in class.members.iter().enumerate() {
            let (label, node) = match member {
                Member::Block(block) if block.is_static => {
                    (format!("static block #{idx}"), block.node)
                }
                Member::Block(block) => (format!("block #{idx}"), block.node),
                Member::Method(method) => (method.name.clone(), method.node),
            };
            match facts.regular_exit_store(node) {
                Some(store) => {
                    let _ = writeln!(out, "  {label}: {}", render_store(classes, store));
                }
                None => {
                    let _ = writeln!(out, "  {label}: <no regular exit>");
                }
            }
        }
    }
    out
}

fn render_store(classes: &ClassTable, store: &InitStore) -> String {
    let mut fields: Vec<String> = store
        .initialized_fields()
        .map(|id| {
            let field = classes.field(id);
            let owner = &classes.class(field.owner).name;
            match store.field_value(id) {
                Some(q) => format!("{owner}.{} = {q}", field.name),
                None => format!("{owner}.{}", field.name),
            }
        })
        .collect();
    fields.sort();
    format!("{{{}}}", fields.join(", "))
}
