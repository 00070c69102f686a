use crate::core::diag::Span;
use crate::core::qualifier::Qualifier;
use crate::core::semck::{CheckOptions, InitCheckErrorKind};
use crate::core::tree::{CastExpr, NodeId, QualifiedType, ValueExpr};

use super::check_cast;

include!("check_test_utils.rs");

use Qualifier::*;

fn cast(from: Option<Qualifier>, to: Option<Qualifier>) -> CastExpr {
    CastExpr {
        node: NodeId(7),
        expr: ValueExpr {
            node: NodeId(8),
            ty: QualifiedType::new("Object", from),
            span: Span::default(),
        },
        target: QualifiedType::new("Node", to),
        span: Span::default(),
    }
}

fn run(options: CheckOptions, from: Option<Qualifier>, to: Option<Qualifier>) -> bool {
    let unit = Unit::new("");
    unit.with_ctx(options, |ctx| check_cast(ctx, &cast(from, to)).is_ok())
}

fn permissive(from: Option<Qualifier>, to: Option<Qualifier>) -> bool {
    run(CheckOptions::default(), from, to)
}

fn strict(from: Option<Qualifier>, to: Option<Qualifier>) -> bool {
    run(
        CheckOptions {
            permissive_casts: false,
            ..CheckOptions::default()
        },
        from,
        to,
    )
}

#[test]
fn upcast_is_legal() {
    assert!(permissive(Some(Committed), Some(UnknownInit)));
    assert!(permissive(Some(Free), Some(UnknownInit)));
    assert!(permissive(Some(FbcBottom), Some(Committed)));
    assert!(permissive(Some(Free), Some(Free)));
}

#[test]
fn free_to_committed_is_rejected() {
    let unit = Unit::new("");
    let err = unit
        .with_ctx(CheckOptions::default(), |ctx| {
            check_cast(ctx, &cast(Some(Free), Some(Committed)))
        })
        .unwrap_err();
    assert_eq!(
        err.kind,
        InitCheckErrorKind::InvalidCast {
            found: Some(Free),
            target: Some(Committed),
        }
    );
    assert_eq!(err.node, NodeId(7));
    assert!(!permissive(Some(UnknownInit), Some(Committed)));
    assert!(!permissive(Some(Committed), Some(Free)));
}

#[test]
fn missing_qualifier_is_accepted_by_default() {
    assert!(permissive(None, Some(Committed)));
    assert!(permissive(None, Some(FbcBottom)));
    assert!(permissive(Some(UnknownInit), None));
    assert!(permissive(None, None));
}

#[test]
fn strict_casts_read_missing_qualifier_as_committed() {
    assert!(strict(None, Some(Committed)));
    assert!(strict(None, Some(UnknownInit)));
    assert!(!strict(None, Some(Free)));
    assert!(!strict(Some(Free), None));
    assert!(strict(Some(FbcBottom), None));
    // Both sides present: same rule as the permissive mode.
    assert!(!strict(Some(Free), Some(Committed)));
}
