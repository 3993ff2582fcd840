//! Dense arrays: `Vec<E>` as a differentiable value.
//!
//! This is the baseline the accessor types improve on. Its tangent,
//! [`VecTangent`], is either empty (the zero) or exactly as long as the
//! primal. Reading element `i` under differentiation costs a full-length zero
//! tangent on the backward pass. That is O(N) per read, and an O(N) traversal
//! becomes O(N²).

use std::ops::{Index, IndexMut};

use num_traits::Zero;

use crate::differentiable::{Differentiable, TangentVector};
use crate::error::{Error, Result};

/// Tangent of a dense array.
///
/// Empty means zero. Any non-empty value has the primal's length, and adding
/// two non-empty tangents of different lengths panics.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VecTangent<T> {
    pub(crate) elements: Vec<T>,
}

impl<T> VecTangent<T> {
    #[inline]
    pub fn new(elements: Vec<T>) -> Self {
        VecTangent { elements }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.elements
    }
}

impl<T: TangentVector> VecTangent<T> {
    /// A zero tangent already expanded to `len` entries.
    pub fn zeros(len: usize) -> Self {
        VecTangent {
            elements: vec![T::zero(); len],
        }
    }

    /// Expand an empty tangent to `len` explicit zeros. No-op otherwise.
    pub fn materialize(&mut self, len: usize) {
        if self.elements.is_empty() {
            self.elements = vec![T::zero(); len];
        }
    }

    /// Element `index`, reading the empty representation as zeros.
    pub fn get(&self, index: usize) -> T {
        self.elements.get(index).cloned().unwrap_or_else(T::zero)
    }
}

impl<T> From<Vec<T>> for VecTangent<T> {
    fn from(elements: Vec<T>) -> Self {
        VecTangent { elements }
    }
}

impl<T> FromIterator<T> for VecTangent<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        VecTangent {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<T> Index<usize> for VecTangent<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.elements[index]
    }
}

impl<T> IndexMut<usize> for VecTangent<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.elements[index]
    }
}

/// Check that `offset` can move `values` without panicking.
pub fn try_move_by<E: Differentiable>(
    values: &mut [E],
    offset: VecTangent<E::Tangent>,
) -> Result<()> {
    if offset.is_empty() {
        return Ok(());
    }
    if offset.len() != values.len() {
        return Err(Error::CountMismatch {
            primal: values.len(),
            tangent: offset.len(),
        });
    }
    for (value, direction) in values.iter_mut().zip(offset.elements) {
        value.move_by(direction);
    }
    Ok(())
}

impl<E: Differentiable> Differentiable for Vec<E> {
    type Tangent = VecTangent<E::Tangent>;

    fn move_by(&mut self, offset: Self::Tangent) {
        if let Err(e) = try_move_by(self, offset) {
            panic!("{e}");
        }
    }
}

// ══════════════════════════════════════════════
//  Read / update
// ══════════════════════════════════════════════

/// Read `values[index]`.
///
/// # Panics
///
/// Panics if `index` is out of bounds.
#[inline]
pub fn read<E: Clone>(values: &[E], index: usize) -> E {
    values[index].clone()
}

/// Read with pullback. The pullback allocates a full-length zero tangent on
/// every call.
pub fn vjp_read<E: Differentiable>(
    values: &[E],
    index: usize,
) -> (E, impl Fn(E::Tangent) -> VecTangent<E::Tangent>) {
    let count = values.len();
    let value = values[index].clone();
    (value, move |d_element| {
        let mut d_self = VecTangent::zeros(count);
        d_self[index] = d_element;
        d_self
    })
}

/// Overwrite `values[index]` with `value`.
///
/// # Panics
///
/// Panics if `index` is out of bounds.
#[inline]
pub fn update<E>(values: &mut [E], index: usize, value: E) {
    values[index] = value;
}

/// Update with pullback.
///
/// The pullback moves the sensitivity at `index` out of the incoming tangent
/// (leaving zero behind) and returns it as the sensitivity of the written
/// value. A tangent shorter than the forward count is first expanded to
/// explicit zeros.
pub fn vjp_update<E: Differentiable>(
    values: &mut [E],
    index: usize,
    value: E,
) -> impl Fn(&mut VecTangent<E::Tangent>) -> E::Tangent {
    update(values, index, value);
    let forward_count = values.len();
    move |tangent| {
        if tangent.len() < forward_count {
            *tangent = VecTangent::zeros(forward_count);
        }
        std::mem::replace(&mut tangent[index], E::Tangent::zero())
    }
}
