//! The differentiable-value contract every element and container satisfies.
//!
//! A [`Differentiable`] value has exactly one associated tangent type. Tangents
//! form an additive group: `num_traits::Zero` supplies the identity and `+`,
//! and `Sub` supplies `-`. A value can be moved along one of its tangents with
//! [`Differentiable::move_by`].

use std::ops::Sub;

use num_traits::Zero;

/// An infinitesimal perturbation: the additive group tangents live in.
///
/// Blanket-implemented for every `Clone + Zero + Sub` type. Container tangents
/// in this crate implement those three so that zero is cheap (an empty buffer)
/// and adding zero never touches the other operand's storage.
pub trait TangentVector: Clone + Zero + Sub<Output = Self> {}

impl<T> TangentVector for T where T: Clone + Zero + Sub<Output = T> {}

/// A value that can be differentiated in reverse mode.
pub trait Differentiable: Clone {
    /// The tangent (sensitivity) type for this value.
    type Tangent: TangentVector;

    /// Move `self` along `offset` in place.
    ///
    /// # Panics
    ///
    /// Container impls panic when `offset` does not correspond to `self`
    /// (for example a tangent longer than the primal).
    fn move_by(&mut self, offset: Self::Tangent);
}

macro_rules! impl_differentiable_scalar {
    ($($t:ty),*) => {
        $(
            impl Differentiable for $t {
                type Tangent = $t;

                #[inline]
                fn move_by(&mut self, offset: $t) {
                    *self += offset;
                }
            }
        )*
    };
}

impl_differentiable_scalar!(f32, f64);
