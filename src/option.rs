//! Optional values.
//!
//! An absent value has an absent tangent, and an absent tangent is the zero.
//! [`OptionTangent`] is the output tangent of selection (`min`/`max` on an
//! empty sequence yields `None`) and of keyed reads on a missing key.

use crate::differentiable::{Differentiable, TangentVector};

/// Tangent of `Option<E>`. `None` is zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionTangent<T> {
    pub(crate) value: Option<T>,
}

impl<T> OptionTangent<T> {
    #[inline]
    pub fn new(value: Option<T>) -> Self {
        OptionTangent { value }
    }

    #[inline]
    pub fn some(value: T) -> Self {
        OptionTangent { value: Some(value) }
    }

    #[inline]
    pub fn none() -> Self {
        OptionTangent { value: None }
    }

    #[inline]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    #[inline]
    pub fn into_inner(self) -> Option<T> {
        self.value
    }
}

impl<T> From<Option<T>> for OptionTangent<T> {
    fn from(value: Option<T>) -> Self {
        OptionTangent { value }
    }
}

impl<E: Differentiable> Differentiable for Option<E> {
    type Tangent = OptionTangent<E::Tangent>;

    /// Moves the wrapped value. Moving `None` is a no-op.
    fn move_by(&mut self, offset: Self::Tangent) {
        if let (Some(value), Some(direction)) = (self.as_mut(), offset.value) {
            value.move_by(direction);
        }
    }
}

/// Map `body` over an optional value, with pullback.
///
/// `body` returns the mapped value together with its own pullback. The
/// returned pullback is zero when either the input or the incoming tangent is
/// absent.
pub fn vjp_map<E, R, F, P>(
    value: &Option<E>,
    body: F,
) -> (Option<R>, impl Fn(OptionTangent<R::Tangent>) -> OptionTangent<E::Tangent>)
where
    E: Differentiable,
    R: Differentiable,
    F: FnOnce(&E) -> (R, P),
    P: Fn(R::Tangent) -> E::Tangent,
{
    let (result, body_pullback) = match value.as_ref().map(body) {
        Some((r, pb)) => (Some(r), Some(pb)),
        None => (None, None),
    };
    (result, move |tangent: OptionTangent<R::Tangent>| {
        match (tangent.value, body_pullback.as_ref()) {
            (Some(v), Some(pb)) => OptionTangent::some(pb(v)),
            _ => OptionTangent::none(),
        }
    })
}

/// Map `body` over an optional value, with a forward-mode differential.
///
/// `body` returns the mapped value together with its differential (input
/// tangent to output tangent).
pub fn jvp_map<E, R, F, D>(
    value: &Option<E>,
    body: F,
) -> (Option<R>, impl Fn(OptionTangent<E::Tangent>) -> OptionTangent<R::Tangent>)
where
    E: Differentiable,
    R: Differentiable,
    F: FnOnce(&E) -> (R, D),
    D: Fn(E::Tangent) -> R::Tangent,
{
    let (result, body_differential) = match value.as_ref().map(body) {
        Some((r, df)) => (Some(r), Some(df)),
        None => (None, None),
    };
    (result, move |tangent: OptionTangent<E::Tangent>| {
        match (tangent.value, body_differential.as_ref()) {
            (Some(v), Some(df)) => OptionTangent::some(df(v)),
            _ => OptionTangent::none(),
        }
    })
}

impl<T: TangentVector> OptionTangent<T> {
    /// The wrapped tangent, reading `None` as zero.
    pub fn unwrap_or_zero(self) -> T {
        self.value.unwrap_or_else(T::zero)
    }
}
