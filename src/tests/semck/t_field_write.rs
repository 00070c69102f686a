use indoc::indoc;

use crate::core::qualifier::Qualifier;
use crate::core::semck::{CheckOptions, InitCheckErrorKind};
use crate::core::tree::QualifiedType;

use super::{check_field_decl, check_field_write};

include!("check_test_utils.rs");

const UNIT: &str = indoc! {r#"
    [[class]]
    name = "Node"

    [[class.field]]
    name = "next"
    type = "Node"
    invariant = "committed"

    [[class.field]]
    name = "scratch"
    type = "Node"

    [[class.field]]
    name = "cache"
    type = "Node"
    annotations = ["unclassified"]
    invariant = "committed"

    [[class.field]]
    name = "shared"
    type = "Node"
    static = true
    invariant = "committed"

    [[class.constructor]]
    name = "Node(committed)"
    body = [{ assign = { field = "next", value = "committed" } }]

    [[class.constructor]]
    name = "Node(free)"
    body = [{ assign = { field = "next", value = "free" } }]

    [[class.constructor]]
    name = "Node(scratch)"
    body = [{ assign = { field = "scratch", value = "free" } }]

    [[class.constructor]]
    name = "Node(bottom)"
    body = [{ assign = { field = "next", value = { type = "null", qualifier = "fbc-bottom" } } }]

    [[class.method]]
    name = "relink(committed)"
    body = [{ assign = { field = "next", value = "committed" } }]

    [[class.method]]
    name = "relink(unknown)"
    body = [{ assign = { field = "next", value = "unknown-init" } }]

    [[class.method]]
    name = "relink(free)"
    receiver = [{ qualifier = "unknown-init" }]
    body = [{ assign = { field = "scratch", value = "free" } }]

    [[class.method]]
    name = "fill(cache)"
    body = [{ assign = { field = "cache", value = "free" } }]

    [[class.method]]
    name = "reset()"
    static = true
    body = [{ assign = { field = "shared", receiver = "class", value = "free" } }]

    [[class.method]]
    name = "fill(integer)"
    body = [{ assign = { field = "cache", value = { type = "Integer", qualifier = "committed" } } }]

    [[class.method]]
    name = "restore()"
    static = true
    body = [{ assign = { field = "shared", receiver = "class", value = "committed" } }]

    [[class.method]]
    name = "wrongType()"
    receiver = [{ qualifier = "free" }]
    body = [{ assign = { field = "scratch", value = { type = "String", qualifier = "committed" } } }]
"#};

fn check(unit: &Unit, method: &str) -> Result<(), InitCheckErrorKind> {
    let class = unit.class("Node");
    let write = unit.first_write("Node", method);
    unit.with_ctx(CheckOptions::default(), |ctx| {
        check_field_write(ctx, class, write).map_err(|e| e.kind)
    })
}

#[test]
fn committed_value_is_always_legal() {
    let unit = Unit::new(UNIT);
    assert_eq!(check(&unit, "Node(committed)"), Ok(()));
    assert_eq!(check(&unit, "relink(committed)"), Ok(()));
}

#[test]
fn free_receiver_accepts_free_value_without_invariant() {
    let unit = Unit::new(UNIT);
    assert_eq!(check(&unit, "Node(scratch)"), Ok(()));
}

#[test]
fn bottom_value_is_legal_anywhere() {
    let unit = Unit::new(UNIT);
    assert_eq!(check(&unit, "Node(bottom)"), Ok(()));
}

#[test]
fn free_value_must_still_meet_the_invariant() {
    let unit = Unit::new(UNIT);
    assert_eq!(
        check(&unit, "Node(free)"),
        Err(InitCheckErrorKind::IncompatibleAssignment {
            found: QualifiedType::new("Node", Some(Qualifier::Free)),
            required: QualifiedType::new("Node", Some(Qualifier::Committed)),
        })
    );
}

#[test]
fn unknown_value_on_committed_receiver_is_rejected() {
    let unit = Unit::new(UNIT);
    assert_eq!(
        check(&unit, "relink(unknown)"),
        Err(InitCheckErrorKind::FieldWriteOnCommittedReceiver {
            field: "next".to_string(),
            value: Some(Qualifier::UnknownInit),
        })
    );
}

#[test]
fn receiver_not_known_free_is_rejected() {
    let unit = Unit::new(UNIT);
    assert_eq!(
        check(&unit, "relink(free)"),
        Err(InitCheckErrorKind::FieldWriteOnUnclassifiedReceiver {
            field: "scratch".to_string(),
            value: Some(Qualifier::Free),
        })
    );
}

#[test]
fn unclassified_and_static_fields_are_exempt() {
    let unit = Unit::new(UNIT);
    assert_eq!(check(&unit, "fill(cache)"), Ok(()));
    assert_eq!(check(&unit, "restore()"), Ok(()));
}

#[test]
fn exempt_static_field_still_checks_its_declared_type() {
    let unit = Unit::new(UNIT);
    assert_eq!(
        check(&unit, "reset()"),
        Err(InitCheckErrorKind::IncompatibleAssignment {
            found: QualifiedType::new("Node", Some(Qualifier::Free)),
            required: QualifiedType::new("Node", Some(Qualifier::Committed)),
        })
    );
}

#[test]
fn exempt_unclassified_field_still_checks_its_base_type() {
    let unit = Unit::new(UNIT);
    assert_eq!(
        check(&unit, "fill(integer)"),
        Err(InitCheckErrorKind::IncompatibleAssignment {
            found: QualifiedType::new("Integer", Some(Qualifier::Committed)),
            required: QualifiedType::new("Node", None),
        })
    );
}

#[test]
fn base_type_mismatch_reports_incompatible_assignment() {
    let unit = Unit::new(UNIT);
    assert!(matches!(
        check(&unit, "wrongType()"),
        Err(InitCheckErrorKind::IncompatibleAssignment { .. })
    ));
}

#[test]
fn field_declarations_reject_commitment_annotations() {
    let unit = Unit::new(indoc! {r#"
        [[class]]
        name = "C"

        [[class.field]]
        name = "ok"
        annotations = ["unclassified"]

        [[class.field]]
        name = "bad"
        annotations = ["unclassified", "free"]
    "#});
    let c = unit.class("C");
    let ok = unit.classes.find_field(c, "ok").unwrap();
    let bad = unit.classes.find_field(c, "bad").unwrap();

    assert!(check_field_decl(ok).is_ok());
    let err = check_field_decl(bad).unwrap_err();
    assert_eq!(
        err.kind,
        InitCheckErrorKind::InvalidFieldAnnotation {
            field: "bad".to_string(),
            annotation: Qualifier::Free,
        }
    );
    assert_eq!(err.span, bad.span);
}
