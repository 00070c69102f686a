use indoc::indoc;

use crate::core::flow::InitFlow;
use crate::core::qualifier::Qualifier;
use crate::core::semck::{CheckOptions, InitCheckError, InitCheckErrorKind, InitChecker};

include!("check_test_utils.rs");

fn check_class(unit: &Unit, class: &str, options: CheckOptions) -> Vec<InitCheckError> {
    let class = unit.class(class);
    let facts = InitFlow::new(&unit.classes, &unit.invariants).analyze_class(class);
    unit.with_ctx(options, |ctx| {
        let mut checker = InitChecker::new(*ctx);
        checker.check_class(class, &facts);
        checker.finish()
    })
}

fn kinds(errors: &[InitCheckError]) -> Vec<InitCheckErrorKind> {
    errors.iter().map(|e| e.kind.clone()).collect()
}

#[test]
fn constructor_missing_a_branch_is_reported_once() {
    let unit = Unit::new(indoc! {r#"
        [[class]]
        name = "C"

        [[class.field]]
        name = "x"
        type = "String"
        invariant = "committed"

        [[class.constructor]]
        name = "C()"
        body = [{ if = { then = [{ assign = { field = "x" } }], else = [{ assign = { field = "x" } }] } }]

        [[class.constructor]]
        name = "C(boolean)"
        body = [{ if = { then = [{ assign = { field = "x" } }] } }]
    "#});
    let errors = check_class(&unit, "C", CheckOptions::default());

    assert_eq!(
        kinds(&errors),
        vec![InitCheckErrorKind::FieldsUninitialized(vec!["x".to_string()])]
    );
    assert_eq!(errors[0].node, unit.method("C", "C(boolean)").node);
}

#[test]
fn violations_accumulate_in_one_pass() {
    let unit = Unit::new(indoc! {r#"
        [[class]]
        name = "C"

        [[class.field]]
        name = "x"
        invariant = "committed"
        annotations = ["free"]

        [[class.method]]
        name = "m()"
        body = [
            { cast = { type = "C", from = "free", to = "committed" } },
            { assign = { field = "x", value = "unknown-init" } },
        ]
    "#});
    let errors = check_class(&unit, "C", CheckOptions::default());

    assert_eq!(
        kinds(&errors),
        vec![
            InitCheckErrorKind::InvalidFieldAnnotation {
                field: "x".to_string(),
                annotation: Qualifier::Free,
            },
            InitCheckErrorKind::InvalidCast {
                found: Some(Qualifier::Free),
                target: Some(Qualifier::Committed),
            },
            InitCheckErrorKind::FieldWriteOnCommittedReceiver {
                field: "x".to_string(),
                value: Some(Qualifier::UnknownInit),
            },
        ]
    );
}

#[test]
fn instance_blocks_satisfy_constructors() {
    let unit = Unit::new(indoc! {r#"
        [[class]]
        name = "C"

        [[class.field]]
        name = "a"
        invariant = "committed"

        [[class.block]]
        body = [{ assign = { field = "a" } }]

        [[class.constructor]]
        name = "C()"
    "#});
    assert!(check_class(&unit, "C", CheckOptions::default()).is_empty());
}

const STATICS: &str = indoc! {r#"
    [[class]]
    name = "Registry"

    [[class.field]]
    name = "table"
    static = true
    invariant = "committed"

    [[class]]
    name = "Loaded"

    [[class.field]]
    name = "table"
    static = true
    invariant = "committed"

    [[class.block]]
    static = true
    body = [{ assign = { field = "table", receiver = "class" } }]

    [[class]]
    name = "Half"

    [[class.field]]
    name = "table"
    static = true
    invariant = "committed"

    [[class.block]]
    static = true
    body = [{ if = { then = [{ assign = { field = "table", receiver = "class" } }] } }]

    [[class]]
    name = "Shape"
    kind = "interface"

    [[class.field]]
    name = "table"
    static = true
    invariant = "committed"
"#};

#[test]
fn static_invariants_need_an_initializer() {
    let unit = Unit::new(STATICS);
    let errors = check_class(&unit, "Registry", CheckOptions::default());
    assert_eq!(
        kinds(&errors),
        vec![InitCheckErrorKind::FieldsUninitialized(vec!["table".to_string()])]
    );
    assert_eq!(errors[0].node, unit.classes.class(unit.class("Registry")).node);

    assert!(check_class(&unit, "Loaded", CheckOptions::default()).is_empty());
    assert_eq!(check_class(&unit, "Half", CheckOptions::default()).len(), 1);
    assert!(check_class(&unit, "Shape", CheckOptions::default()).is_empty());
}

#[test]
fn static_checks_can_be_switched_off() {
    let unit = Unit::new(STATICS);
    let options = CheckOptions {
        static_fields: false,
        ..CheckOptions::default()
    };
    assert!(check_class(&unit, "Registry", options).is_empty());
    assert!(check_class(&unit, "Half", options).is_empty());
}

#[test]
fn postconditions_are_checked_at_method_exit() {
    let unit = Unit::new(indoc! {r#"
        [[class]]
        name = "C"

        [[class.field]]
        name = "x"
        invariant = "committed"

        [[class.field]]
        name = "tmp"

        [[class.method]]
        name = "get()"
        ensures = [{ field = "x", qualifier = "committed" }]

        [[class.method]]
        name = "init()"
        receiver = [{ qualifier = "free" }]
        ensures = [{ field = "tmp", qualifier = "committed" }]
        body = [{ assign = { field = "tmp", value = "free" } }]
    "#});
    let errors = check_class(&unit, "C", CheckOptions::default());

    assert_eq!(
        kinds(&errors),
        vec![InitCheckErrorKind::PostconditionNotSatisfied {
            expr: "this.tmp".to_string(),
            required: Qualifier::Committed,
        }]
    );
}

#[test]
fn constructor_return_annotation_is_rejected() {
    let unit = Unit::new(indoc! {r#"
        [[class]]
        name = "C"

        [[class.constructor]]
        name = "C()"
        returns = ["fbc-bottom"]
    "#});
    let errors = check_class(&unit, "C", CheckOptions::default());
    assert_eq!(
        kinds(&errors),
        vec![InitCheckErrorKind::InvalidConstructorReturnType(
            Qualifier::FbcBottom
        )]
    );
}
