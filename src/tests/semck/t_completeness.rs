use std::collections::HashSet;

use indoc::indoc;

use crate::core::flow::InitFlow;
use crate::core::qualifier::Qualifier;
use crate::core::semck::{CheckOptions, InitCheckErrorKind};
use crate::core::store::InitStore;
use crate::core::tree::ReceiverAnnotation;

use super::{
    CheckPoint, check_constructor_return, check_fields_initialized,
    initialized_by_instance_blocks, uninitialized_invariant_fields,
};

include!("check_test_utils.rs");

const UNIT: &str = indoc! {r#"
    [[class]]
    name = "Base"

    [[class.field]]
    name = "id"
    invariant = "committed"

    [[class]]
    name = "Pair"
    extends = "Base"

    [[class.field]]
    name = "b"
    invariant = "committed"

    [[class.field]]
    name = "a"
    invariant = "committed"

    [[class.field]]
    name = "note"

    [[class.block]]
    body = [{ assign = { field = "a" } }]

    [[class.constructor]]
    name = "Pair()"
    body = ["super", { assign = { field = "b" } }]

    [[class.constructor]]
    name = "Pair(boolean)"
    body = ["super", { if = { then = [{ assign = { field = "b" } }] } }]

    [[class.constructor]]
    name = "Pair(int)"
    returns = ["committed"]
    body = ["throw"]
"#};

fn point<'r>(unit: &Unit, receiver: &'r [ReceiverAnnotation]) -> CheckPoint<'r> {
    let class = unit.class("Pair");
    let decl = unit.classes.class(class);
    CheckPoint {
        class,
        node: decl.node,
        span: decl.span,
        is_static: false,
        receiver,
    }
}

#[test]
fn missing_fields_are_sorted_and_include_ancestors() {
    let unit = Unit::new(UNIT);
    let at = point(&unit, &[]);
    let missing = unit.with_ctx(CheckOptions::default(), |ctx| {
        uninitialized_invariant_fields(ctx, &at, &InitStore::empty(), &HashSet::new())
    });
    assert_eq!(missing, vec!["a", "b", "id"]);
}

#[test]
fn covered_fields_and_receiver_promises_are_excluded() {
    let unit = Unit::new(UNIT);
    let pair = unit.class("Pair");
    let a = unit.classes.find_field(pair, "a").unwrap().id;
    let covered: HashSet<_> = [a].into_iter().collect();

    let framed = [ReceiverAnnotation {
        qualifier: Qualifier::UnknownInit,
        frame: Some(unit.class("Base")),
    }];
    let at = point(&unit, &framed);
    let missing = unit.with_ctx(CheckOptions::default(), |ctx| {
        uninitialized_invariant_fields(ctx, &at, &InitStore::empty(), &covered)
    });
    assert_eq!(missing, vec!["b"]);

    let committed = [ReceiverAnnotation {
        qualifier: Qualifier::Committed,
        frame: None,
    }];
    let at = point(&unit, &committed);
    let missing = unit.with_ctx(CheckOptions::default(), |ctx| {
        uninitialized_invariant_fields(ctx, &at, &InitStore::empty(), &HashSet::new())
    });
    assert!(missing.is_empty());
}

#[test]
fn absent_store_passes_vacuously() {
    let unit = Unit::new(UNIT);
    let at = point(&unit, &[]);
    let result = unit.with_ctx(CheckOptions::default(), |ctx| {
        check_fields_initialized(ctx, &at, None, &HashSet::new())
    });
    assert!(result.is_ok());
}

#[test]
fn missing_fields_are_reported_at_the_check_point() {
    let unit = Unit::new(UNIT);
    let at = point(&unit, &[]);
    let err = unit
        .with_ctx(CheckOptions::default(), |ctx| {
            check_fields_initialized(ctx, &at, Some(&InitStore::empty()), &HashSet::new())
        })
        .unwrap_err();
    assert_eq!(
        err.kind,
        InitCheckErrorKind::FieldsUninitialized(vec![
            "a".to_string(),
            "b".to_string(),
            "id".to_string()
        ])
    );
    assert_eq!(err.node, at.node);
}

#[test]
fn instance_blocks_cover_their_fields() {
    let unit = Unit::new(UNIT);
    let pair = unit.class("Pair");
    let facts = InitFlow::new(&unit.classes, &unit.invariants).analyze_class(pair);
    let covered = unit.with_ctx(CheckOptions::default(), |ctx| {
        initialized_by_instance_blocks(ctx, pair, &facts)
    });
    let a = unit.classes.find_field(pair, "a").unwrap().id;
    let expected: HashSet<_> = [a].into_iter().collect();
    assert_eq!(covered, expected);
}

#[test]
fn constructor_exit_stores_decide_completeness() {
    let unit = Unit::new(UNIT);
    let pair = unit.class("Pair");
    let facts = InitFlow::new(&unit.classes, &unit.invariants).analyze_class(pair);

    let check = |name: &str| {
        let ctor = unit.method("Pair", name);
        let at = CheckPoint {
            class: pair,
            node: ctor.node,
            span: ctor.span,
            is_static: false,
            receiver: &ctor.receiver,
        };
        unit.with_ctx(CheckOptions::default(), |ctx| {
            let covered = initialized_by_instance_blocks(ctx, pair, &facts);
            let store = crate::core::flow::FlowFacts::regular_exit_store(&facts, ctor.node);
            check_fields_initialized(ctx, &at, store, &covered).map_err(|e| e.kind)
        })
    };

    assert_eq!(check("Pair()"), Ok(()));
    assert_eq!(
        check("Pair(boolean)"),
        Err(InitCheckErrorKind::FieldsUninitialized(vec!["b".to_string()]))
    );
    assert_eq!(check("Pair(int)"), Ok(()));
}

#[test]
fn constructors_cannot_declare_committed_results() {
    let unit = Unit::new(UNIT);
    let ctor = unit.method("Pair", "Pair(int)");
    assert_eq!(
        check_constructor_return(ctor).map_err(|e| e.kind),
        Err(InitCheckErrorKind::InvalidConstructorReturnType(
            Qualifier::Committed
        ))
    );
    assert!(check_constructor_return(unit.method("Pair", "Pair()")).is_ok());
}

#[test]
fn static_fields_use_their_own_class_only() {
    let unit = Unit::new(indoc! {r#"
        [[class]]
        name = "Registry"

        [[class.field]]
        name = "instances"
        static = true
        invariant = "committed"

        [[class.field]]
        name = "defaults"
        static = true
        invariant = "committed"
        initializer = "committed"
    "#});
    let class = unit.class("Registry");
    let decl = unit.classes.class(class);
    let at = CheckPoint {
        class,
        node: decl.node,
        span: decl.span,
        is_static: true,
        receiver: &[],
    };
    let store = InitStore::empty().with_field_initializers_folded(&unit.classes, class, true);
    let missing = unit.with_ctx(CheckOptions::default(), |ctx| {
        uninitialized_invariant_fields(ctx, &at, &store, &HashSet::new())
    });
    assert_eq!(missing, vec!["instances"]);
}
