use indoc::indoc;

use crate::core::qualifier::Qualifier;
use crate::core::semck::CheckOptions;
use crate::core::store::InitStore;
use crate::core::tree::Receiver;

use super::discharges_contract;

include!("check_test_utils.rs");

const UNIT: &str = indoc! {r#"
    [[class]]
    name = "A"

    [[class.field]]
    name = "x"
    final = true
    invariant = "committed"

    [[class.field]]
    name = "loose"
    invariant = "unknown-init"

    [[class]]
    name = "B"
    extends = "A"

    [[class.invariant]]
    field = "x"
    qualifier = "fbc-bottom"
"#};

struct Case<'u> {
    unit: &'u Unit,
    class: &'u str,
}

impl Case<'_> {
    fn holds(
        &self,
        expr: &Receiver,
        required: Qualifier,
        inferred: Option<Qualifier>,
        store: &InitStore,
    ) -> bool {
        let class = self.unit.class(self.class);
        self.unit.with_ctx(CheckOptions::default(), |ctx| {
            discharges_contract(ctx, class, expr, required, inferred, store)
        })
    }
}

fn this_field(unit: &Unit, class: &str, name: &str) -> (Receiver, crate::core::tree::FieldId) {
    let field = unit.classes.find_field(unit.class(class), name).unwrap().id;
    (Receiver::field_access(Receiver::ThisReference, field), field)
}

#[test]
fn initialized_invariant_field_discharges_without_inference() {
    let unit = Unit::new(UNIT);
    let case = Case {
        unit: &unit,
        class: "A",
    };
    let (expr, x) = this_field(&unit, "A", "x");
    let mut store = InitStore::empty();
    store.add_initialized_field(x, None);

    assert!(case.holds(&expr, Qualifier::Committed, None, &store));
    assert!(case.holds(&expr, Qualifier::UnknownInit, Some(Qualifier::Free), &store));
}

#[test]
fn uninitialized_field_falls_back_to_inferred_qualifier() {
    let unit = Unit::new(UNIT);
    let case = Case {
        unit: &unit,
        class: "A",
    };
    let (expr, _) = this_field(&unit, "A", "x");
    let store = InitStore::empty();

    assert!(!case.holds(&expr, Qualifier::Committed, None, &store));
    assert!(!case.holds(&expr, Qualifier::Committed, Some(Qualifier::UnknownInit), &store));
    assert!(case.holds(&expr, Qualifier::Committed, Some(Qualifier::Committed), &store));
}

#[test]
fn weak_invariant_does_not_discharge() {
    let unit = Unit::new(UNIT);
    let case = Case {
        unit: &unit,
        class: "A",
    };
    let (expr, loose) = this_field(&unit, "A", "loose");
    let mut store = InitStore::empty();
    store.add_initialized_field(loose, None);

    assert!(!case.holds(&expr, Qualifier::Committed, Some(Qualifier::UnknownInit), &store));
}

#[test]
fn other_receivers_are_not_discharged() {
    let unit = Unit::new(UNIT);
    let case = Case {
        unit: &unit,
        class: "A",
    };
    let (_, x) = this_field(&unit, "A", "x");
    let expr = Receiver::field_access(Receiver::Other, x);
    let mut store = InitStore::empty();
    store.add_initialized_field(x, None);

    assert!(!case.holds(&expr, Qualifier::Committed, None, &store));
    assert!(!case.holds(&Receiver::ThisReference, Qualifier::Committed, None, &store));
}

#[test]
fn strengthened_invariant_needs_matching_declared_type() {
    let unit = Unit::new(UNIT);
    let case = Case {
        unit: &unit,
        class: "B",
    };
    let (expr, x) = this_field(&unit, "B", "x");
    let mut store = InitStore::empty();
    store.add_initialized_field(x, None);

    // `x` is declared with A's invariant, not B's stronger one.
    assert!(!case.holds(&expr, Qualifier::Committed, None, &store));
    assert!(case.holds(&expr, Qualifier::Committed, Some(Qualifier::FbcBottom), &store));
}
