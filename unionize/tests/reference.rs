use std::hash::BuildHasher;

use unionize::json;
use unionize::{Representation, StorageClass, Union};
use unionize_testhelpers::test;

#[unionize::union(reference, json(mode = "tuple"))]
pub enum ExprKind {
    Nil,
    Num(f64),
    Text(String),
}

#[test]
fn handles_share_their_node() {
    let a = Expr::make_text("x".to_string());
    let b = a.clone();
    assert!(a.ptr_eq(&b));
    assert_eq!(b.get_text(), "x");

    let c = Expr::make_text("x".to_string());
    assert!(!a.ptr_eq(&c));
    assert_eq!(a, c);
}

#[test]
fn accessors() {
    let n = Expr::make_num(2.0);
    assert!(n.is_num());
    assert_eq!(n.kind(), ExprKind::Num);
    assert_eq!(n.get_num(), 2.0);
    assert_eq!(n.try_get_text(), None);
    assert_eq!(n.variant_name(), "Num");

    let nil = Expr::make_nil();
    assert!(nil.is_nil());
    assert_eq!(nil.ordinal(), 0);
    assert_eq!(nil.try_get_num(), None);
}

#[test]
#[should_panic(expected = "Expr: expected variant `Text`, found `Nil`")]
fn getter_on_the_wrong_kind_panics() {
    let _ = Expr::make_nil().get_text();
}

#[test]
fn value_semantics_match_the_value_representation() {
    assert_eq!(Expr::make_num(f64::NAN), Expr::make_num(f64::NAN));
    assert_ne!(Expr::make_num(1.0), Expr::make_nil());

    let state = std::hash::RandomState::new();
    assert_eq!(
        state.hash_one(Expr::make_num(f64::NAN)),
        state.hash_one(Expr::make_num(f64::NAN))
    );
    assert_eq!(
        state.hash_one(Expr::make_text("a".into())),
        state.hash_one(Expr::make_text("a".into()))
    );

    assert_eq!(Expr::make_nil().to_string(), "Expr.Nil");
    assert_eq!(Expr::make_num(2.5).to_string(), "Expr.Num { 2.5 }");
}

#[test]
fn every_payload_is_a_leaf() {
    let meta = Expr::META;
    assert_eq!(meta.representation(), Representation::Reference);
    assert_eq!(meta.payload_of(1).unwrap().storage(), StorageClass::Leaf);
    assert_eq!(meta.payload_of(2).unwrap().storage(), StorageClass::Leaf);
}

#[test]
fn tuple_envelope() {
    let n = Expr::make_num(2.0);
    assert_eq!(json::to_string(&n).unwrap(), r#"["Num",2.0]"#);
    assert_eq!(json::to_string(&Expr::make_nil()).unwrap(), r#"["Nil",null]"#);

    let back: Expr = json::from_str(r#"["Text","hi"]"#).unwrap();
    assert_eq!(back.get_text(), "hi");
    let back: Expr = json::from_str(r#"[1,0.5]"#).unwrap();
    assert_eq!(back.get_num(), 0.5);
}
