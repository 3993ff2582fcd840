//! Reverse-mode differentiation support for indexable and keyed containers.
//!
//! Each primitive container operation (indexed read and write, map, reduce,
//! zip, min/max selection) comes with a `vjp_*` form that returns the forward
//! value together with its pullback. Composite programs are differentiated by
//! composing those pullbacks in reverse execution order.
//!
//! The centrepiece is [`Accessor`]: a buffer with a staged register whose
//! tangent, [`AccessorTangent`], grows only as far as the highest index the
//! backward pass touches. Indexed access costs amortized O(1) on both passes,
//! where a dense `Vec` pays O(N) per read on the backward pass.
//!
//! ```
//! use echidna_collections::{Accessor, AccessorTangent};
//!
//! let mut xs = Accessor::new(vec![1.0_f64, 2.0, 3.0, 4.0]);
//! let pullback = xs.vjp_stage(1);
//! assert_eq!(*xs.staged(), 2.0);
//!
//! let mut d = AccessorTangent::from_parts(Vec::new(), 1.0);
//! pullback(&mut d);
//! assert_eq!(d.values(), &[0.0, 1.0]);
//! ```

pub mod accessor;
pub mod api;
pub mod dense;
pub mod differentiable;
pub mod dual;
pub mod error;
pub mod fixed;
pub mod float;
pub mod keyed;
pub mod lazy;
pub mod option;
pub mod primitives;
pub mod selection;
pub mod sequence;
mod traits;

pub use accessor::{Accessor, AccessorTangent};
pub use api::{
    derivative, gradient, run_without_derivative, value_with_gradient, vjp_scalar, vjp_scalar2,
};
pub use dense::VecTangent;
pub use differentiable::{Differentiable, TangentVector};
pub use dual::Dual;
pub use error::{Error, Result};
pub use fixed::FixedTangent;
pub use float::Float;
pub use keyed::{KeyedAccessor, KeyedAccessorTangent, KeyedTangent};
pub use lazy::LazyArray;
pub use option::OptionTangent;
pub use sequence::{DifferentiableSequence, ElementTangent};

/// Type alias for forward-mode dual numbers over `f64`.
pub type Dual64 = Dual<f64>;
/// Type alias for forward-mode dual numbers over `f32`.
pub type Dual32 = Dual<f32>;
