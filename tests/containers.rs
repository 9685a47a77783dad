use php_core::core::array::{ArrayKey, PhpArray};
use php_core::core::value::Val;
use php_core::core::zval::{Alias, Zval};
use php_core::runtime::error::EngineError;

#[test]
fn test_share_then_duplicate() {
    let mut a = PhpArray::from_values([Val::Int(1)]);
    let b = a.share();
    assert!(b.is_shared());

    b.set(Some(ArrayKey::Int(0)), Zval::new(Val::Int(2))).unwrap();
    assert_eq!(a.get(&ArrayKey::Int(0)).value(), Val::Int(2));

    a = a.duplicate();
    assert_eq!(a.alias(), Alias::Owned);
    b.set(Some(ArrayKey::Int(0)), Zval::new(Val::Int(3))).unwrap();
    assert_eq!(a.get(&ArrayKey::Int(0)).value(), Val::Int(2));
    assert_eq!(b.get(&ArrayKey::Int(0)).value(), Val::Int(3));
}

#[test]
fn test_insertion_order_and_numeric_keys() {
    let arr = PhpArray::new();
    arr.set(Some(ArrayKey::from("b")), Zval::new(Val::Int(1))).unwrap();
    arr.set(Some(ArrayKey::from_bytes(b"10")), Zval::new(Val::Int(2))).unwrap();
    arr.push(Zval::new(Val::Int(3))).unwrap();
    arr.set(Some(ArrayKey::from("a")), Zval::new(Val::Int(4))).unwrap();

    assert_eq!(
        arr.keys(),
        vec![
            ArrayKey::from("b"),
            ArrayKey::Int(10),
            ArrayKey::Int(11),
            ArrayKey::from("a"),
        ]
    );
    assert_eq!(arr.next_index(), 12);
    assert!(arr.exists(&ArrayKey::from_bytes(b"11")));
    assert!(!arr.exists(&ArrayKey::from_bytes(b"011")));
}

#[test]
fn test_missing_key_reads_null() {
    let arr = PhpArray::new();
    assert_eq!(arr.get(&ArrayKey::from("nope")).value(), Val::Null);
    assert!(arr.lookup(&ArrayKey::from("nope")).is_none());
    assert_eq!(arr.count(), 0);
}

#[test]
fn test_unset_keeps_next_index() {
    let arr = PhpArray::from_values([Val::Int(1), Val::Int(2)]);
    arr.unset(&ArrayKey::Int(1));
    assert_eq!(arr.count(), 1);
    assert_eq!(arr.push(Zval::null()).unwrap(), ArrayKey::Int(2));
}

#[test]
fn test_push_after_max_key_fails() {
    let arr = PhpArray::new();
    arr.set(Some(ArrayKey::Int(i64::MAX)), Zval::null()).unwrap();
    assert_eq!(arr.push(Zval::null()), Err(EngineError::NextElementOccupied));
}

#[test]
fn test_iterator_is_snapshot() {
    let arr = PhpArray::from_values([Val::Int(1), Val::Int(2)]);
    let mut iter = arr.new_iterator();
    arr.push(Zval::new(Val::Int(3))).unwrap();

    assert_eq!(iter.len(), 2);
    let (key, value) = iter.next().unwrap();
    assert_eq!(key, ArrayKey::Int(0));
    assert_eq!(value.value(), Val::Int(1));
    assert!(iter.nth(1).is_none());
}

#[test]
fn test_duplicate_keeps_reference_entries() {
    let shared = Zval::new(Val::Int(1)).share();
    let arr = PhpArray::new();
    arr.set(Some(ArrayKey::from("r")), shared.clone()).unwrap();
    arr.set(Some(ArrayKey::from("v")), Zval::new(Val::Int(1))).unwrap();

    let copy = arr.duplicate();
    shared.set(Val::Int(9));
    copy.get(&ArrayKey::from("v")).set(Val::Int(7));

    assert_eq!(copy.get(&ArrayKey::from("r")).value(), Val::Int(9));
    assert_eq!(arr.get(&ArrayKey::from("v")).value(), Val::Int(1));
}
