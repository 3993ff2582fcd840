//! Higher-order combinators over any differentiable sequence.
//!
//! [`DifferentiableSequence`] is the one abstraction the combinators need: a
//! read-only view of the elements plus conversions between the container's
//! tangent and a plain vector of element tangents. `Vec<E>`, [`LazyArray<E>`]
//! and [`Accessor<E>`] implement it, so `map`, `reduce`, `zip_map` and
//! `zip_reduce` are written once.
//!
//! Every `vjp_*` combinator records one `(value, pullback)` pair per element on
//! the forward pass and moves the recorded pullbacks into the closure it
//! returns. The returned closure replays them: positionally for the maps, in
//! exact reverse order for the reductions.
//!
//! The output container type is chosen by the caller, usually with a type
//! annotation on the binding:
//!
//! ```
//! use echidna_collections::sequence::vjp_map;
//! use echidna_collections::Accessor;
//!
//! let xs = Accessor::new(vec![1.0_f64, 2.0, 3.0]);
//! let (ys, pullback): (Accessor<f64>, _) =
//!     vjp_map(&xs, |&x| (x * x, move |t: f64| 2.0 * x * t));
//! assert_eq!(ys.as_slice(), &[1.0, 4.0, 9.0]);
//! ```

use num_traits::Zero;

use crate::accessor::{Accessor, AccessorTangent};
use crate::dense::VecTangent;
use crate::differentiable::Differentiable;
use crate::error::{Error, Result};
use crate::lazy::LazyArray;

/// The tangent type of a sequence's elements.
pub type ElementTangent<S> =
    <<S as DifferentiableSequence>::Element as Differentiable>::Tangent;

/// A differentiable container that exposes its elements in order.
pub trait DifferentiableSequence: Differentiable {
    /// Element type.
    type Element: Differentiable;

    /// All elements, in order.
    fn elements(&self) -> &[Self::Element];

    /// Build the container from its elements.
    fn from_elements(elements: Vec<Self::Element>) -> Self;

    /// Element tangents of a container tangent, in order.
    ///
    /// The result may be shorter than the primal (down to empty); missing
    /// trailing entries are zero.
    fn tangent_into_elements(tangent: Self::Tangent) -> Vec<ElementTangent<Self>>;

    /// Container tangent from element tangents, in order.
    fn tangent_from_elements(elements: Vec<ElementTangent<Self>>) -> Self::Tangent;

    /// The tangent that is `value` at `index` and zero elsewhere.
    ///
    /// The default is dense: `len` entries.
    fn one_hot_tangent(len: usize, index: usize, value: ElementTangent<Self>) -> Self::Tangent {
        let mut elements = vec![<ElementTangent<Self> as Zero>::zero(); len];
        elements[index] = value;
        Self::tangent_from_elements(elements)
    }

    /// Number of elements. Not differentiable.
    #[inline]
    fn len(&self) -> usize {
        self.elements().len()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.elements().is_empty()
    }
}

impl<E: Differentiable> DifferentiableSequence for Vec<E> {
    type Element = E;

    #[inline]
    fn elements(&self) -> &[E] {
        self
    }

    #[inline]
    fn from_elements(elements: Vec<E>) -> Self {
        elements
    }

    #[inline]
    fn tangent_into_elements(tangent: VecTangent<E::Tangent>) -> Vec<E::Tangent> {
        tangent.into_vec()
    }

    #[inline]
    fn tangent_from_elements(elements: Vec<E::Tangent>) -> VecTangent<E::Tangent> {
        VecTangent::new(elements)
    }
}

impl<E: Differentiable> DifferentiableSequence for LazyArray<E> {
    type Element = E;

    #[inline]
    fn elements(&self) -> &[E] {
        self.as_slice()
    }

    #[inline]
    fn from_elements(elements: Vec<E>) -> Self {
        LazyArray::new(elements)
    }

    #[inline]
    fn tangent_into_elements(tangent: VecTangent<E::Tangent>) -> Vec<E::Tangent> {
        tangent.into_vec()
    }

    #[inline]
    fn tangent_from_elements(elements: Vec<E::Tangent>) -> VecTangent<E::Tangent> {
        VecTangent::new(elements)
    }
}

impl<E: Differentiable + Default> DifferentiableSequence for Accessor<E> {
    type Element = E;

    #[inline]
    fn elements(&self) -> &[E] {
        self.as_slice()
    }

    #[inline]
    fn from_elements(elements: Vec<E>) -> Self {
        Accessor::new(elements)
    }

    /// The staged tangent is dropped: combinators never read the register.
    #[inline]
    fn tangent_into_elements(tangent: AccessorTangent<E::Tangent>) -> Vec<E::Tangent> {
        tangent.into_parts().0
    }

    #[inline]
    fn tangent_from_elements(elements: Vec<E::Tangent>) -> AccessorTangent<E::Tangent> {
        AccessorTangent::from_values(elements)
    }

    /// Sparse: only `index + 1` entries are stored.
    fn one_hot_tangent(_len: usize, index: usize, value: E::Tangent) -> AccessorTangent<E::Tangent> {
        let mut tangent = AccessorTangent::zero();
        tangent.accumulate(index, value);
        tangent
    }
}

/// Fails with [`Error::LengthMismatch`] unless `lhs == rhs`.
#[inline]
pub fn check_same_len(lhs: usize, rhs: usize) -> Result<()> {
    if lhs == rhs {
        Ok(())
    } else {
        Err(Error::LengthMismatch { lhs, rhs })
    }
}

fn assert_same_len(lhs: usize, rhs: usize) {
    if let Err(e) = check_same_len(lhs, rhs) {
        panic!("{e}");
    }
}

/// Pad a possibly sparse list of element tangents out to `len` with zeros.
fn pad<T: Clone + Zero>(mut elements: Vec<T>, len: usize) -> Vec<T> {
    assert!(
        elements.len() <= len,
        "tangent of length {} exceeds primal length {len}",
        elements.len()
    );
    elements.resize(len, T::zero());
    elements
}

// ══════════════════════════════════════════════
//  Map
// ══════════════════════════════════════════════

/// Apply `body` to every element.
pub fn map<S, D, F>(seq: &S, body: F) -> D
where
    S: DifferentiableSequence,
    D: DifferentiableSequence,
    F: Fn(&S::Element) -> D::Element,
{
    D::from_elements(seq.elements().iter().map(body).collect())
}

/// [`map`] with pullback.
///
/// `body` returns each mapped element together with its pullback. The
/// returned pullback pairs output tangent entry `i` with recorded pullback
/// `i`. A zero output tangent pulls back to zero without calling any of them.
pub fn vjp_map<S, D, F, P>(seq: &S, body: F) -> (D, impl Fn(D::Tangent) -> S::Tangent)
where
    S: DifferentiableSequence,
    D: DifferentiableSequence,
    F: Fn(&S::Element) -> (D::Element, P),
    P: Fn(ElementTangent<D>) -> ElementTangent<S>,
{
    let count = seq.len();
    let (values, pullbacks): (Vec<_>, Vec<_>) = seq.elements().iter().map(body).unzip();
    (D::from_elements(values), move |tangent: D::Tangent| {
        let d_out = D::tangent_into_elements(tangent);
        if d_out.is_empty() {
            return S::Tangent::zero();
        }
        let d_in = pullbacks
            .iter()
            .zip(pad(d_out, count))
            .map(|(pullback, d)| pullback(d))
            .collect();
        S::tangent_from_elements(d_in)
    })
}

// ══════════════════════════════════════════════
//  Reduce
// ══════════════════════════════════════════════

/// Fold the elements left to right, starting from `initial`.
pub fn reduce<S, R, F>(seq: &S, initial: R, body: F) -> R
where
    S: DifferentiableSequence,
    F: Fn(&R, &S::Element) -> R,
{
    seq.elements()
        .iter()
        .fold(initial, |acc, element| body(&acc, element))
}

/// [`reduce`] with pullback.
///
/// `body` returns the next accumulator together with a pullback from the
/// accumulator tangent to `(previous accumulator tangent, element tangent)`.
/// The returned pullback replays the recorded step pullbacks in reverse and
/// yields `(initial tangent, sequence tangent)`.
pub fn vjp_reduce<S, R, F, P>(
    seq: &S,
    initial: R,
    body: F,
) -> (R, impl Fn(R::Tangent) -> (R::Tangent, S::Tangent))
where
    S: DifferentiableSequence,
    R: Differentiable,
    F: Fn(&R, &S::Element) -> (R, P),
    P: Fn(R::Tangent) -> (R::Tangent, ElementTangent<S>),
{
    let mut pullbacks = Vec::with_capacity(seq.len());
    let mut acc = initial;
    for element in seq.elements() {
        let (next, pullback) = body(&acc, element);
        pullbacks.push(pullback);
        acc = next;
    }
    (acc, move |tangent: R::Tangent| {
        let mut d_acc = tangent;
        let mut d_elements = Vec::with_capacity(pullbacks.len());
        for pullback in pullbacks.iter().rev() {
            let (d_prev, d_element) = pullback(d_acc);
            d_elements.push(d_element);
            d_acc = d_prev;
        }
        d_elements.reverse();
        (d_acc, S::tangent_from_elements(d_elements))
    })
}

// ══════════════════════════════════════════════
//  Zip-map
// ══════════════════════════════════════════════

/// Apply `body` to every pair `(lhs[i], rhs[i])`.
///
/// # Panics
///
/// Panics if the sequences differ in length.
pub fn zip_map<S1, S2, D, F>(lhs: &S1, rhs: &S2, body: F) -> D
where
    S1: DifferentiableSequence,
    S2: DifferentiableSequence,
    D: DifferentiableSequence,
    F: Fn(&S1::Element, &S2::Element) -> D::Element,
{
    assert_same_len(lhs.len(), rhs.len());
    D::from_elements(
        lhs.elements()
            .iter()
            .zip(rhs.elements())
            .map(|(a, b)| body(a, b))
            .collect(),
    )
}

/// [`zip_map`] with pullback.
///
/// Each recorded pullback maps an output element tangent to the pair of input
/// element tangents; the returned pullback splits those into one container
/// tangent per input.
///
/// # Panics
///
/// Panics if the sequences differ in length.
pub fn vjp_zip_map<S1, S2, D, F, P>(
    lhs: &S1,
    rhs: &S2,
    body: F,
) -> (D, impl Fn(D::Tangent) -> (S1::Tangent, S2::Tangent))
where
    S1: DifferentiableSequence,
    S2: DifferentiableSequence,
    D: DifferentiableSequence,
    F: Fn(&S1::Element, &S2::Element) -> (D::Element, P),
    P: Fn(ElementTangent<D>) -> (ElementTangent<S1>, ElementTangent<S2>),
{
    assert_same_len(lhs.len(), rhs.len());
    let count = lhs.len();
    let (values, pullbacks): (Vec<_>, Vec<_>) = lhs
        .elements()
        .iter()
        .zip(rhs.elements())
        .map(|(a, b)| body(a, b))
        .unzip();
    (D::from_elements(values), move |tangent: D::Tangent| {
        let d_out = D::tangent_into_elements(tangent);
        if d_out.is_empty() {
            return (S1::Tangent::zero(), S2::Tangent::zero());
        }
        let (d_lhs, d_rhs): (Vec<_>, Vec<_>) = pullbacks
            .iter()
            .zip(pad(d_out, count))
            .map(|(pullback, d)| pullback(d))
            .unzip();
        (
            S1::tangent_from_elements(d_lhs),
            S2::tangent_from_elements(d_rhs),
        )
    })
}

// ══════════════════════════════════════════════
//  Zip-reduce
// ══════════════════════════════════════════════

/// Fold the pairs `(lhs[i], rhs[i])` left to right, starting from `initial`.
///
/// # Panics
///
/// Panics if the sequences differ in length.
pub fn zip_reduce<S1, S2, R, F>(lhs: &S1, rhs: &S2, initial: R, body: F) -> R
where
    S1: DifferentiableSequence,
    S2: DifferentiableSequence,
    F: Fn(&R, &S1::Element, &S2::Element) -> R,
{
    assert_same_len(lhs.len(), rhs.len());
    lhs.elements()
        .iter()
        .zip(rhs.elements())
        .fold(initial, |acc, (a, b)| body(&acc, a, b))
}

/// [`zip_reduce`] with pullback.
///
/// The returned pullback replays the recorded step pullbacks in reverse and
/// yields `(initial tangent, lhs tangent, rhs tangent)`.
///
/// # Panics
///
/// Panics if the sequences differ in length.
pub fn vjp_zip_reduce<S1, S2, R, F, P>(
    lhs: &S1,
    rhs: &S2,
    initial: R,
    body: F,
) -> (R, impl Fn(R::Tangent) -> (R::Tangent, S1::Tangent, S2::Tangent))
where
    S1: DifferentiableSequence,
    S2: DifferentiableSequence,
    R: Differentiable,
    F: Fn(&R, &S1::Element, &S2::Element) -> (R, P),
    P: Fn(R::Tangent) -> (R::Tangent, ElementTangent<S1>, ElementTangent<S2>),
{
    assert_same_len(lhs.len(), rhs.len());
    let mut pullbacks = Vec::with_capacity(lhs.len());
    let mut acc = initial;
    for (a, b) in lhs.elements().iter().zip(rhs.elements()) {
        let (next, pullback) = body(&acc, a, b);
        pullbacks.push(pullback);
        acc = next;
    }
    (acc, move |tangent: R::Tangent| {
        let mut d_acc = tangent;
        let mut d_lhs = Vec::with_capacity(pullbacks.len());
        let mut d_rhs = Vec::with_capacity(pullbacks.len());
        for pullback in pullbacks.iter().rev() {
            let (d_prev, d_a, d_b) = pullback(d_acc);
            d_lhs.push(d_a);
            d_rhs.push(d_b);
            d_acc = d_prev;
        }
        d_lhs.reverse();
        d_rhs.reverse();
        (
            d_acc,
            S1::tangent_from_elements(d_lhs),
            S2::tangent_from_elements(d_rhs),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_same_len_reports_both_sides() {
        assert_eq!(check_same_len(3, 3), Ok(()));
        assert_eq!(
            check_same_len(3, 2),
            Err(Error::LengthMismatch { lhs: 3, rhs: 2 })
        );
    }

    #[test]
    fn accessor_one_hot_is_sparse() {
        let t = <Accessor<f64> as DifferentiableSequence>::one_hot_tangent(100, 2, 4.0);
        assert_eq!(t.values(), &[0.0, 0.0, 4.0]);
    }

    #[test]
    fn vec_one_hot_is_dense() {
        let t = <Vec<f64> as DifferentiableSequence>::one_hot_tangent(4, 1, 4.0);
        assert_eq!(t.as_slice(), &[0.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "paired sequences must have equal length")]
    fn zip_map_rejects_unequal_lengths() {
        let _: Vec<f64> = zip_map(&vec![1.0_f64, 2.0], &vec![1.0_f64], |a, b| a + b);
    }
}
