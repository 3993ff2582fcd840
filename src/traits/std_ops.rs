use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::mem;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use num_traits::Zero;

use crate::accessor::AccessorTangent;
use crate::dense::VecTangent;
use crate::differentiable::TangentVector;
use crate::dual::Dual;
use crate::fixed::FixedTangent;
use crate::float::Float;
use crate::keyed::{KeyedAccessorTangent, KeyedTangent};
use crate::option::OptionTangent;

// ──────────────────────────────────────────────
//  Dual<F> operators
// ──────────────────────────────────────────────

impl<F: Float> Add for Dual<F> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Dual {
            re: self.re + rhs.re,
            eps: self.eps + rhs.eps,
        }
    }
}

impl<F: Float> Sub for Dual<F> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Dual {
            re: self.re - rhs.re,
            eps: self.eps - rhs.eps,
        }
    }
}

impl<F: Float> Mul for Dual<F> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Dual {
            re: self.re * rhs.re,
            eps: self.re * rhs.eps + self.eps * rhs.re,
        }
    }
}

impl<F: Float> Div for Dual<F> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        let inv = F::one() / rhs.re;
        Dual {
            re: self.re * inv,
            eps: (self.eps * rhs.re - self.re * rhs.eps) * inv * inv,
        }
    }
}

impl<F: Float> Neg for Dual<F> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Dual {
            re: -self.re,
            eps: -self.eps,
        }
    }
}

impl<F: Float> AddAssign for Dual<F> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<F: Float> SubAssign for Dual<F> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

macro_rules! impl_dual_scalar_ops {
    ($f:ty) => {
        impl Add<$f> for Dual<$f> {
            type Output = Dual<$f>;
            #[inline]
            fn add(self, rhs: $f) -> Dual<$f> {
                Dual {
                    re: self.re + rhs,
                    eps: self.eps,
                }
            }
        }

        impl Sub<$f> for Dual<$f> {
            type Output = Dual<$f>;
            #[inline]
            fn sub(self, rhs: $f) -> Dual<$f> {
                Dual {
                    re: self.re - rhs,
                    eps: self.eps,
                }
            }
        }

        impl Sub<Dual<$f>> for $f {
            type Output = Dual<$f>;
            #[inline]
            fn sub(self, rhs: Dual<$f>) -> Dual<$f> {
                Dual {
                    re: self - rhs.re,
                    eps: -rhs.eps,
                }
            }
        }

        impl Mul<$f> for Dual<$f> {
            type Output = Dual<$f>;
            #[inline]
            fn mul(self, rhs: $f) -> Dual<$f> {
                self.scale(rhs)
            }
        }

        impl Mul<Dual<$f>> for $f {
            type Output = Dual<$f>;
            #[inline]
            fn mul(self, rhs: Dual<$f>) -> Dual<$f> {
                rhs.scale(self)
            }
        }

        impl Div<$f> for Dual<$f> {
            type Output = Dual<$f>;
            #[inline]
            fn div(self, rhs: $f) -> Dual<$f> {
                self.scale(1.0 / rhs)
            }
        }
    };
}

impl_dual_scalar_ops!(f32);
impl_dual_scalar_ops!(f64);

impl<F: Float> PartialEq for Dual<F> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.re == other.re
    }
}

impl<F: Float> PartialOrd for Dual<F> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.re.partial_cmp(&other.re)
    }
}

// ──────────────────────────────────────────────
//  Elementwise helpers
// ──────────────────────────────────────────────

/// `acc[i] = acc[i] + rhs[i]` over the overlapping prefix.
#[inline]
fn add_prefix<T: TangentVector>(acc: &mut [T], rhs: impl IntoIterator<Item = T>) {
    for (slot, r) in acc.iter_mut().zip(rhs) {
        let l = mem::replace(slot, T::zero());
        *slot = l + r;
    }
}

/// `acc[i] = lhs[i] + acc[i]`: keeps operand order when `acc` came from the rhs.
#[inline]
fn radd_prefix<T: TangentVector>(acc: &mut [T], lhs: impl IntoIterator<Item = T>) {
    for (slot, l) in acc.iter_mut().zip(lhs) {
        let r = mem::replace(slot, T::zero());
        *slot = l + r;
    }
}

#[inline]
fn sub_prefix<T: TangentVector>(acc: &mut [T], rhs: impl IntoIterator<Item = T>) {
    for (slot, r) in acc.iter_mut().zip(rhs) {
        let l = mem::replace(slot, T::zero());
        *slot = l - r;
    }
}

#[inline]
fn negate<T: TangentVector>(values: Vec<T>) -> Vec<T> {
    values.into_iter().map(|v| T::zero() - v).collect()
}

/// Sparse sum: overlapping prefix combined, longer tail carried over.
fn add_sparse<T: TangentVector>(lhs: Vec<T>, rhs: Vec<T>) -> Vec<T> {
    if rhs.is_empty() {
        return lhs;
    }
    if lhs.is_empty() {
        return rhs;
    }
    if lhs.len() >= rhs.len() {
        let mut out = lhs;
        add_prefix(&mut out, rhs);
        out
    } else {
        let mut out = rhs;
        radd_prefix(&mut out, lhs);
        out
    }
}

/// Sparse difference: overlapping prefix combined, a longer rhs tail negated.
fn sub_sparse<T: TangentVector>(lhs: Vec<T>, rhs: Vec<T>) -> Vec<T> {
    if rhs.is_empty() {
        return lhs;
    }
    if lhs.is_empty() {
        return negate(rhs);
    }
    let split = lhs.len().min(rhs.len());
    let mut rhs = rhs.into_iter();
    let mut out = lhs;
    sub_prefix(&mut out[..split], rhs.by_ref().take(split));
    out.extend(rhs.map(|r| T::zero() - r));
    out
}

// ──────────────────────────────────────────────
//  VecTangent
// ──────────────────────────────────────────────

impl<T: TangentVector> Add for VecTangent<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        if rhs.is_empty() {
            return self;
        }
        if self.is_empty() {
            return rhs;
        }
        assert_eq!(
            self.len(),
            rhs.len(),
            "count mismatch: {} ('self') and {} ('direction')",
            self.len(),
            rhs.len()
        );
        let mut elements = self.elements;
        add_prefix(&mut elements, rhs.elements);
        VecTangent { elements }
    }
}

impl<T: TangentVector> Sub for VecTangent<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        if rhs.is_empty() {
            return self;
        }
        if self.is_empty() {
            return VecTangent {
                elements: negate(rhs.elements),
            };
        }
        assert_eq!(
            self.len(),
            rhs.len(),
            "count mismatch: {} ('self') and {} ('direction')",
            self.len(),
            rhs.len()
        );
        let mut elements = self.elements;
        sub_prefix(&mut elements, rhs.elements);
        VecTangent { elements }
    }
}

impl<T: TangentVector> Zero for VecTangent<T> {
    #[inline]
    fn zero() -> Self {
        VecTangent {
            elements: Vec::new(),
        }
    }

    fn is_zero(&self) -> bool {
        self.elements.iter().all(Zero::is_zero)
    }
}

impl<T: TangentVector> AddAssign for VecTangent<T> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        let lhs = mem::replace(self, Self::zero());
        *self = lhs + rhs;
    }
}

// ──────────────────────────────────────────────
//  AccessorTangent
// ──────────────────────────────────────────────

impl<T: TangentVector> Add for AccessorTangent<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        AccessorTangent {
            values: add_sparse(self.values, rhs.values),
            staged: self.staged + rhs.staged,
        }
    }
}

impl<T: TangentVector> Sub for AccessorTangent<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        AccessorTangent {
            values: sub_sparse(self.values, rhs.values),
            staged: self.staged - rhs.staged,
        }
    }
}

impl<T: TangentVector> Zero for AccessorTangent<T> {
    #[inline]
    fn zero() -> Self {
        AccessorTangent {
            values: Vec::new(),
            staged: T::zero(),
        }
    }

    fn is_zero(&self) -> bool {
        self.staged.is_zero() && self.values.iter().all(Zero::is_zero)
    }
}

impl<T: TangentVector> AddAssign for AccessorTangent<T> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        let lhs = mem::replace(self, Self::zero());
        *self = lhs + rhs;
    }
}

// ──────────────────────────────────────────────
//  OptionTangent
// ──────────────────────────────────────────────

impl<T: TangentVector> Add for OptionTangent<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let value = match (self.value, rhs.value) {
            (Some(l), Some(r)) => Some(l + r),
            (l, None) => l,
            (None, r) => r,
        };
        OptionTangent { value }
    }
}

impl<T: TangentVector> Sub for OptionTangent<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        let value = match (self.value, rhs.value) {
            (Some(l), Some(r)) => Some(l - r),
            (l, None) => l,
            (None, Some(r)) => Some(T::zero() - r),
        };
        OptionTangent { value }
    }
}

impl<T: TangentVector> Zero for OptionTangent<T> {
    #[inline]
    fn zero() -> Self {
        OptionTangent { value: None }
    }

    fn is_zero(&self) -> bool {
        self.value.as_ref().map_or(true, Zero::is_zero)
    }
}

impl<T: TangentVector> AddAssign for OptionTangent<T> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        let lhs = mem::replace(self, Self::zero());
        *self = lhs + rhs;
    }
}

// ──────────────────────────────────────────────
//  KeyedTangent / KeyedAccessorTangent
// ──────────────────────────────────────────────

/// `acc[k] = lhs[k] + acc[k]`: keeps operand order when `acc` came from the rhs.
fn radd_entries<K: Eq + Hash, T: TangentVector>(acc: &mut HashMap<K, T>, lhs: HashMap<K, T>) {
    for (key, l) in lhs {
        match acc.entry(key) {
            Entry::Occupied(mut slot) => {
                let r = mem::replace(slot.get_mut(), T::zero());
                *slot.get_mut() = l + r;
            }
            Entry::Vacant(slot) => {
                slot.insert(l);
            }
        }
    }
}

impl<K: Eq + Hash + Clone, T: TangentVector> Add for KeyedTangent<K, T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        if self.entries.len() >= rhs.entries.len() {
            let mut acc = self;
            for (key, d) in rhs.entries {
                acc.accumulate(key, d);
            }
            acc
        } else {
            let mut acc = rhs;
            radd_entries(&mut acc.entries, self.entries);
            acc
        }
    }
}

impl<K: Eq + Hash + Clone, T: TangentVector> Sub for KeyedTangent<K, T> {
    type Output = Self;
    fn sub(mut self, rhs: Self) -> Self {
        for (key, r) in rhs.entries {
            match self.entries.entry(key) {
                Entry::Occupied(mut slot) => {
                    let l = mem::replace(slot.get_mut(), T::zero());
                    *slot.get_mut() = l - r;
                }
                Entry::Vacant(slot) => {
                    slot.insert(T::zero() - r);
                }
            }
        }
        self
    }
}

impl<K: Eq + Hash + Clone, T: TangentVector> Zero for KeyedTangent<K, T> {
    #[inline]
    fn zero() -> Self {
        KeyedTangent::new()
    }

    fn is_zero(&self) -> bool {
        self.entries.values().all(Zero::is_zero)
    }
}

impl<K: Eq + Hash + Clone, T: TangentVector> AddAssign for KeyedTangent<K, T> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        for (key, d) in rhs.entries {
            self.accumulate(key, d);
        }
    }
}

impl<K: Eq + Hash + Clone, T: TangentVector> Add for KeyedAccessorTangent<K, T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        KeyedAccessorTangent {
            entries: self.entries + rhs.entries,
            staged: self.staged + rhs.staged,
        }
    }
}

impl<K: Eq + Hash + Clone, T: TangentVector> Sub for KeyedAccessorTangent<K, T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        KeyedAccessorTangent {
            entries: self.entries - rhs.entries,
            staged: self.staged - rhs.staged,
        }
    }
}

impl<K: Eq + Hash + Clone, T: TangentVector> Zero for KeyedAccessorTangent<K, T> {
    #[inline]
    fn zero() -> Self {
        KeyedAccessorTangent {
            entries: KeyedTangent::new(),
            staged: T::zero(),
        }
    }

    fn is_zero(&self) -> bool {
        self.staged.is_zero() && self.entries.is_zero()
    }
}

impl<K: Eq + Hash + Clone, T: TangentVector> AddAssign for KeyedAccessorTangent<K, T> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        let lhs = mem::replace(self, Self::zero());
        *self = lhs + rhs;
    }
}

// ──────────────────────────────────────────────
//  FixedTangent
// ──────────────────────────────────────────────

impl<T: TangentVector, const N: usize> Add for FixedTangent<T, N> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let mut values = self.values;
        add_prefix(&mut values, rhs.values);
        FixedTangent { values }
    }
}

impl<T: TangentVector, const N: usize> Sub for FixedTangent<T, N> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        let mut values = self.values;
        sub_prefix(&mut values, rhs.values);
        FixedTangent { values }
    }
}

impl<T: TangentVector, const N: usize> Zero for FixedTangent<T, N> {
    #[inline]
    fn zero() -> Self {
        FixedTangent {
            values: std::array::from_fn(|_| T::zero()),
        }
    }

    fn is_zero(&self) -> bool {
        self.values.iter().all(Zero::is_zero)
    }
}

impl<T: TangentVector, const N: usize> AddAssign for FixedTangent<T, N> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        add_prefix(&mut self.values, rhs.values);
    }
}
