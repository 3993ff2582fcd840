use std::fmt::{Debug, Display};

use num_traits::{Float as NumFloat, FromPrimitive};

/// Marker trait for the primitive scalars (`f32`, `f64`) that sit at the
/// leaves of every differentiable container.
///
/// Scalar-only code (selection, the native-function primitives, the
/// [`Dual`](crate::Dual) bridge) is bounded on this rather than on
/// [`Differentiable`](crate::Differentiable).
pub trait Float:
    NumFloat + FromPrimitive + Copy + Default + Debug + Display + Send + Sync + 'static
{
}

impl Float for f32 {}
impl Float for f64 {}
