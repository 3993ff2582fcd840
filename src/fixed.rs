//! Fixed-size arrays `[E; N]`.
//!
//! The tangent is a full `[T; N]`: with `N` known at compile time there is no
//! sparse representation to win, and every pullback is O(1) or O(N) in the
//! obvious way.

use std::ops::{Add, Index, IndexMut, Sub};

use num_traits::Zero;

use crate::differentiable::{Differentiable, TangentVector};

/// Tangent of `[E; N]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedTangent<T, const N: usize> {
    pub(crate) values: [T; N],
}

impl<T, const N: usize> FixedTangent<T, N> {
    #[inline]
    pub fn new(values: [T; N]) -> Self {
        FixedTangent { values }
    }

    #[inline]
    pub fn as_array(&self) -> &[T; N] {
        &self.values
    }

    #[inline]
    pub fn into_array(self) -> [T; N] {
        self.values
    }
}

impl<T, const N: usize> From<[T; N]> for FixedTangent<T, N> {
    fn from(values: [T; N]) -> Self {
        FixedTangent { values }
    }
}

impl<T, const N: usize> Index<usize> for FixedTangent<T, N> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.values[index]
    }
}

impl<T, const N: usize> IndexMut<usize> for FixedTangent<T, N> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.values[index]
    }
}

impl<E: Differentiable, const N: usize> Differentiable for [E; N] {
    type Tangent = FixedTangent<E::Tangent, N>;

    fn move_by(&mut self, offset: Self::Tangent) {
        for (value, direction) in self.iter_mut().zip(offset.values) {
            value.move_by(direction);
        }
    }
}

// ── Read / update ──

#[inline]
pub fn read<E: Clone, const N: usize>(values: &[E; N], index: usize) -> E {
    values[index].clone()
}

#[inline]
pub fn update<E, const N: usize>(values: &mut [E; N], index: usize, value: E) {
    values[index] = value;
}

/// Read `values[index]`, with a one-hot pullback.
pub fn vjp_read<E: Differentiable, const N: usize>(
    values: &[E; N],
    index: usize,
) -> (E, impl Fn(E::Tangent) -> FixedTangent<E::Tangent, N>) {
    let value = values[index].clone();
    (value, move |d_element| {
        let mut d_values = FixedTangent::zero();
        d_values[index] = d_element;
        d_values
    })
}

/// Overwrite `values[index]`, with pullback.
///
/// The pullback moves slot `index` out of the incoming tangent, leaving zero,
/// and returns it as the sensitivity of the written value.
pub fn vjp_update<E: Differentiable, const N: usize>(
    values: &mut [E; N],
    index: usize,
    value: E,
) -> impl Fn(&mut FixedTangent<E::Tangent, N>) -> E::Tangent {
    update(values, index, value);
    move |tangent| std::mem::replace(&mut tangent[index], E::Tangent::zero())
}

// ── Construction ──

/// `[value; N]`.
pub fn repeat<E: Clone, const N: usize>(value: E) -> [E; N] {
    std::array::from_fn(|_| value.clone())
}

/// [`repeat`] with pullback. Every copy contributes, so the pullback sums all
/// entries.
pub fn vjp_repeat<E: Differentiable, const N: usize>(
    value: E,
) -> ([E; N], impl Fn(FixedTangent<E::Tangent, N>) -> E::Tangent) {
    (repeat(value), |tangent: FixedTangent<E::Tangent, N>| tangent.sum())
}

// ── Elementwise arithmetic ──

/// `lhs + rhs` elementwise, with pullback.
pub fn vjp_add<E, const N: usize>(
    lhs: &[E; N],
    rhs: &[E; N],
) -> (
    [E; N],
    impl Fn(FixedTangent<E::Tangent, N>) -> (FixedTangent<E::Tangent, N>, FixedTangent<E::Tangent, N>),
)
where
    E: Differentiable + Add<Output = E>,
{
    let sum = std::array::from_fn(|i| lhs[i].clone() + rhs[i].clone());
    (sum, |tangent: FixedTangent<E::Tangent, N>| (tangent.clone(), tangent))
}

/// `lhs - rhs` elementwise, with pullback.
pub fn vjp_sub<E, const N: usize>(
    lhs: &[E; N],
    rhs: &[E; N],
) -> (
    [E; N],
    impl Fn(FixedTangent<E::Tangent, N>) -> (FixedTangent<E::Tangent, N>, FixedTangent<E::Tangent, N>),
)
where
    E: Differentiable + Sub<Output = E>,
{
    let difference = std::array::from_fn(|i| lhs[i].clone() - rhs[i].clone());
    (difference, |tangent: FixedTangent<E::Tangent, N>| {
        let negated = FixedTangent::zero() - tangent.clone();
        (tangent, negated)
    })
}

impl<T: TangentVector, const N: usize> FixedTangent<T, N> {
    /// Sum of all entries.
    pub fn sum(&self) -> T {
        self.values
            .iter()
            .cloned()
            .fold(T::zero(), |acc, d| acc + d)
    }
}
