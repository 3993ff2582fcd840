//! Arrays whose dense tangent is materialized once, on first read.
//!
//! [`LazyArray<E>`] keeps the dense [`VecTangent`] representation, but its
//! read pullback accumulates into the caller's tangent in place instead of
//! returning a fresh full-length one. The first read on the backward pass pays
//! the O(N) zero fill; every later read is O(1).

use std::ops::Index;

use num_traits::Zero;

use crate::dense::{self, VecTangent};
use crate::differentiable::Differentiable;

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LazyArray<E> {
    elements: Vec<E>,
}

impl<E> LazyArray<E> {
    #[inline]
    pub fn new(elements: Vec<E>) -> Self {
        LazyArray { elements }
    }

    /// Number of elements. Not differentiable.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[E] {
        &self.elements
    }

    #[inline]
    pub fn into_vec(self) -> Vec<E> {
        self.elements
    }

    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn set(&mut self, index: usize, value: E) {
        self.elements[index] = value;
    }
}

impl<E> From<Vec<E>> for LazyArray<E> {
    fn from(elements: Vec<E>) -> Self {
        LazyArray { elements }
    }
}

impl<E> FromIterator<E> for LazyArray<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        LazyArray {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<E> Index<usize> for LazyArray<E> {
    type Output = E;

    #[inline]
    fn index(&self, index: usize) -> &E {
        &self.elements[index]
    }
}

impl<E: Differentiable> LazyArray<E> {
    /// Read `self[index]`, with an in-place pullback.
    ///
    /// The pullback adds the element sensitivity into slot `index` of the
    /// caller's tangent, first expanding an empty tangent to full length.
    pub fn vjp_get(
        &self,
        index: usize,
    ) -> (E, impl Fn(E::Tangent, &mut VecTangent<E::Tangent>)) {
        let size = self.elements.len();
        let value = self.elements[index].clone();
        (value, move |d_element, tangent| {
            if tangent.is_empty() {
                log::trace!("lazy array: materializing {size} zero tangents");
                tangent.materialize(size);
            }
            let current = std::mem::replace(&mut tangent[index], E::Tangent::zero());
            tangent[index] = current + d_element;
        })
    }

    /// [`set`](Self::set) with pullback.
    ///
    /// The pullback moves slot `index` out of the incoming tangent, leaving
    /// zero. An empty (zero) tangent yields zero.
    pub fn vjp_set(
        &mut self,
        index: usize,
        value: E,
    ) -> impl Fn(&mut VecTangent<E::Tangent>) -> E::Tangent {
        self.set(index, value);
        move |tangent| {
            if tangent.is_empty() {
                return E::Tangent::zero();
            }
            std::mem::replace(&mut tangent[index], E::Tangent::zero())
        }
    }
}

impl<E: Differentiable> Differentiable for LazyArray<E> {
    type Tangent = VecTangent<E::Tangent>;

    fn move_by(&mut self, offset: Self::Tangent) {
        if let Err(e) = dense::try_move_by(&mut self.elements, offset) {
            panic!("{e}");
        }
    }
}
