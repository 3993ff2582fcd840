//! Order-based selection: `min` and `max` over a differentiable sequence.
//!
//! Both scan left to right with a strict comparison, so the *first* index that
//! attains the extreme value wins. The pullback routes the whole output
//! sensitivity to that index and leaves every other entry zero.

use num_traits::Zero;

use crate::option::OptionTangent;
use crate::sequence::{DifferentiableSequence, ElementTangent};

/// Index of the first minimal element, `None` when empty.
///
/// Incomparable elements (NaN) never replace the running minimum, and nothing
/// replaces a NaN at index 0: such a sequence selects index 0.
pub fn min_index<E: PartialOrd>(elements: &[E]) -> Option<usize> {
    select_index(elements, |candidate, best| candidate < best)
}

/// Index of the first maximal element, `None` when empty.
///
/// NaN handling matches [`min_index`].
pub fn max_index<E: PartialOrd>(elements: &[E]) -> Option<usize> {
    select_index(elements, |candidate, best| best < candidate)
}

#[inline]
fn select_index<E>(elements: &[E], better: impl Fn(&E, &E) -> bool) -> Option<usize> {
    let mut best = 0;
    for (i, candidate) in elements.iter().enumerate().skip(1) {
        if better(candidate, &elements[best]) {
            best = i;
        }
    }
    (!elements.is_empty()).then_some(best)
}

/// The first minimal element.
pub fn min<S>(seq: &S) -> Option<S::Element>
where
    S: DifferentiableSequence,
    S::Element: PartialOrd,
{
    min_index(seq.elements()).map(|i| seq.elements()[i].clone())
}

/// The first maximal element.
pub fn max<S>(seq: &S) -> Option<S::Element>
where
    S: DifferentiableSequence,
    S::Element: PartialOrd,
{
    max_index(seq.elements()).map(|i| seq.elements()[i].clone())
}

/// [`min`] with pullback.
pub fn vjp_min<S>(
    seq: &S,
) -> (
    Option<S::Element>,
    impl Fn(OptionTangent<ElementTangent<S>>) -> S::Tangent,
)
where
    S: DifferentiableSequence,
    S::Element: PartialOrd,
{
    vjp_select::<S>(seq, min_index(seq.elements()))
}

/// [`max`] with pullback.
pub fn vjp_max<S>(
    seq: &S,
) -> (
    Option<S::Element>,
    impl Fn(OptionTangent<ElementTangent<S>>) -> S::Tangent,
)
where
    S: DifferentiableSequence,
    S::Element: PartialOrd,
{
    vjp_select::<S>(seq, max_index(seq.elements()))
}

fn vjp_select<S: DifferentiableSequence>(
    seq: &S,
    selected: Option<usize>,
) -> (
    Option<S::Element>,
    impl Fn(OptionTangent<ElementTangent<S>>) -> S::Tangent,
) {
    let count = seq.len();
    let value = selected.map(|i| seq.elements()[i].clone());
    (value, move |tangent: OptionTangent<ElementTangent<S>>| {
        match (selected, tangent.into_inner()) {
            (Some(index), Some(d)) => S::one_hot_tangent(count, index, d),
            _ => S::Tangent::zero(),
        }
    })
}
