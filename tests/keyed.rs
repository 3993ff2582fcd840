use std::collections::HashMap;
use std::ops::{Add, Sub};

use echidna_collections::keyed::{self, KeyedAccessor, KeyedAccessorTangent, KeyedTangent};
use echidna_collections::{AccessorTangent, Differentiable, OptionTangent};
use num_traits::Zero;

const A_MULTIPLIER: f64 = 13.0;
const B_MULTIPLIER: f64 = 17.0;

fn dictionary(a: f64, b: f64) -> HashMap<&'static str, f64> {
    [("a", a), ("b", b)].into_iter().collect()
}

#[test]
fn get_pullback_is_single_entry() {
    let d = dictionary(3.0, 7.0);
    let (a, read_a) = keyed::vjp_get(&d, &"a");
    let (b, read_b) = keyed::vjp_get(&d, &"b");
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(A_MULTIPLIER * a + B_MULTIPLIER * b, 3.0 * A_MULTIPLIER + 7.0 * B_MULTIPLIER);

    let d_a = read_a(OptionTangent::some(A_MULTIPLIER));
    assert_eq!(d_a.len(), 1);
    let grad = d_a + read_b(OptionTangent::some(B_MULTIPLIER));
    assert_eq!(grad.get(&"a"), A_MULTIPLIER);
    assert_eq!(grad.get(&"b"), B_MULTIPLIER);
}

#[test]
fn missing_key_reads_none_with_zero_pullback() {
    let d = dictionary(3.0, 7.0);
    let (value, pullback) = keyed::vjp_get(&d, &"z");
    assert_eq!(value, None);
    assert!(pullback(OptionTangent::some(1.0)).is_empty());
}

#[test]
fn commit_then_read() {
    let mut d = KeyedAccessor::from(dictionary(1.0, 1.0));
    let commit_a = d.vjp_commit("a", 3.0);
    let commit_b = d.vjp_commit("b", 7.0);
    let (a, read_a) = d.vjp_get(&"a");
    let (b, read_b) = d.vjp_get(&"b");
    let value = A_MULTIPLIER * a.unwrap() + B_MULTIPLIER * b.unwrap();
    assert_eq!(value, 3.0 * A_MULTIPLIER + 7.0 * B_MULTIPLIER);

    let mut tangent = read_a(OptionTangent::some(A_MULTIPLIER))
        + read_b(OptionTangent::some(B_MULTIPLIER));
    let d_new_b = commit_b(&mut tangent);
    let d_new_a = commit_a(&mut tangent);

    assert_eq!(d_new_a, A_MULTIPLIER);
    assert_eq!(d_new_b, B_MULTIPLIER);
    assert_eq!(tangent.entries().get(&"a"), 0.0);
    assert_eq!(tangent.entries().get(&"b"), 0.0);
    assert!(tangent.is_zero());
}

#[test_log::test]
fn materialized_commit_fills_every_key() {
    let mut d = KeyedAccessor::from(dictionary(1.0, 1.0));
    d.commit("c", 0.0);
    let commit_a = d.vjp_commit_materialized("a", 3.0);

    let mut tangent = KeyedAccessorTangent::from_entries(
        [("a", 2.0)].into_iter().collect::<KeyedTangent<_, _>>(),
    );
    assert_eq!(commit_a(&mut tangent), 2.0);

    let map = tangent.entries().as_map();
    assert_eq!(map.len(), 3);
    assert!(map.values().all(|d| *d == 0.0));
}

#[test]
fn lazy_and_materialized_commit_agree() {
    let mut lazy = KeyedAccessor::from(dictionary(1.0, 1.0));
    let mut dense = lazy.clone();
    let lazy_pullback = lazy.vjp_commit("b", 5.0);
    let dense_pullback = dense.vjp_commit_materialized("b", 5.0);

    let seed: KeyedTangent<_, _> = [("b", 4.0)].into_iter().collect();
    let mut t_lazy = KeyedAccessorTangent::from_entries(seed.clone());
    let mut t_dense = KeyedAccessorTangent::from_entries(seed);
    assert_eq!(lazy_pullback(&mut t_lazy), dense_pullback(&mut t_dense));
    assert!(t_lazy.is_zero());
    assert!(t_dense.is_zero());
    assert_eq!(t_lazy.entries().len(), 0);
    assert_eq!(t_dense.entries().len(), 2);
}

#[test]
fn stage_pullback_moves_register_into_key() {
    let mut d = KeyedAccessor::from(dictionary(3.0, 7.0));
    let stage = d.vjp_stage(&"b");
    assert_eq!(d.staged(), Some(&7.0));

    let mut tangent = KeyedAccessorTangent::from_parts(KeyedTangent::new(), 2.5);
    stage(&mut tangent);
    assert_eq!(*tangent.staged(), 0.0);
    assert_eq!(tangent.entries().get(&"b"), 2.5);
    assert_eq!(tangent.entries().len(), 1);
}

#[test]
fn stage_of_missing_key_drops_sensitivity() {
    let mut d = KeyedAccessor::from(dictionary(3.0, 7.0));
    let stage = d.vjp_stage(&"z");
    assert_eq!(d.staged(), None);

    let mut tangent = KeyedAccessorTangent::from_parts(KeyedTangent::new(), 1.0);
    stage(&mut tangent);
    assert!(tangent.is_zero());
    assert!(tangent.entries().is_empty());
}

#[test]
fn keyed_tangent_arithmetic_merges_keys() {
    let lhs: KeyedTangent<_, _> = [("a", 1.0), ("b", 2.0)].into_iter().collect();
    let rhs: KeyedTangent<_, _> = [("b", 10.0), ("c", 20.0)].into_iter().collect();

    let sum = lhs.clone() + rhs.clone();
    assert_eq!(sum.get(&"a"), 1.0);
    assert_eq!(sum.get(&"b"), 12.0);
    assert_eq!(sum.get(&"c"), 20.0);

    let diff = lhs - rhs;
    assert_eq!(diff.get(&"b"), -8.0);
    assert_eq!(diff.get(&"c"), -20.0);
}

/// A tangent whose `+` is concatenation, so operand order is observable.
#[derive(Clone, Debug, PartialEq)]
struct Cat(Vec<i32>);

impl Add for Cat {
    type Output = Cat;
    fn add(mut self, rhs: Cat) -> Cat {
        self.0.extend(rhs.0);
        self
    }
}

impl Sub for Cat {
    type Output = Cat;
    fn sub(mut self, rhs: Cat) -> Cat {
        self.0.extend(rhs.0.into_iter().map(|v| -v));
        self
    }
}

impl Zero for Cat {
    fn zero() -> Cat {
        Cat(Vec::new())
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }
}

#[test]
fn keyed_tangent_addition_keeps_operand_order() {
    let small: KeyedTangent<_, _> = [("a", Cat(vec![1]))].into_iter().collect();
    let large: KeyedTangent<_, _> =
        [("a", Cat(vec![2])), ("b", Cat(vec![3]))].into_iter().collect();

    let sum = small.clone() + large.clone();
    assert_eq!(sum.get(&"a"), Cat(vec![1, 2]));
    assert_eq!(sum.get(&"b"), Cat(vec![3]));

    let sum = large.clone() + small.clone();
    assert_eq!(sum.get(&"a"), Cat(vec![2, 1]));

    let diff = small - large;
    assert_eq!(diff.get(&"a"), Cat(vec![1, -2]));
    assert_eq!(diff.get(&"b"), Cat(vec![-3]));

    let sparse = AccessorTangent::from_values(vec![Cat(vec![1])])
        + AccessorTangent::from_values(vec![Cat(vec![2]), Cat(vec![3])]);
    assert_eq!(sparse.values()[0], Cat(vec![1, 2]));
}

#[test]
fn collapse_drops_zero_entries() {
    let mut t: KeyedTangent<_, _> = [("a", 0.0), ("b", 2.0)].into_iter().collect();
    t.collapse();
    assert_eq!(t.len(), 1);
    assert_eq!(t.get(&"b"), 2.0);
}

#[test]
fn move_by_updates_touched_keys() {
    let mut d = dictionary(1.0, 2.0);
    d.move_by([("b", 0.5)].into_iter().collect());
    assert_eq!(d, dictionary(1.0, 2.5));
}

#[test]
#[should_panic(expected = "missing component")]
fn move_by_unknown_key_panics() {
    let mut d = dictionary(1.0, 2.0);
    d.move_by([("z", 0.5)].into_iter().collect());
}

#[test]
fn move_by_discards_staged_offset_without_register() {
    let mut d = KeyedAccessor::from(dictionary(1.0, 2.0));
    d.stage(&"z");
    assert_eq!(d.staged(), None);

    let offset = KeyedAccessorTangent::from_parts([("a", 0.5)].into_iter().collect(), 4.0);
    d.move_by(offset);
    assert_eq!(d.staged(), None);
    assert_eq!(d.as_map(), &dictionary(1.5, 2.0));
}
