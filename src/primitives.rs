//! Scalar primitives paired with their hand-written partial derivatives.
//!
//! A [`Primitive`] knows how to evaluate itself and how to produce its local
//! partials. [`vjp_binary`] / [`vjp_unary`] resolve those partials at the call
//! site into a pullback, so a composed function can use `min`, `max`, `abs` or
//! `atan2` inside `vjp_map`/`vjp_reduce` bodies without any global
//! registration.
//!
//! # Example
//!
//! ```
//! use echidna_collections::primitives::{vjp_binary, Atan2};
//!
//! let (value, pullback) = vjp_binary(&Atan2, 1.0_f64, 1.0);
//! assert!((value - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
//! assert_eq!(pullback(1.0), (0.5, -0.5));
//! ```

use crate::dual::Dual;
use crate::float::Float;

/// A binary scalar operation with known partial derivatives.
pub trait Primitive<F: Float> {
    /// Forward evaluation.
    fn eval(&self, a: F, b: F) -> F;

    /// Reverse partials `(∂result/∂a, ∂result/∂b)`.
    fn partials(&self, a: F, b: F, result: F) -> (F, F);

    /// Evaluate on dual numbers by the first-order chain rule.
    fn eval_dual(&self, a: Dual<F>, b: Dual<F>) -> Dual<F> {
        let result = self.eval(a.re, b.re);
        let (da, db) = self.partials(a.re, b.re, result);
        Dual::new(result, da * a.eps + db * b.eps)
    }
}

/// A unary scalar operation with a known derivative.
pub trait UnaryPrimitive<F: Float> {
    fn eval(&self, x: F) -> F;

    /// `∂result/∂x`.
    fn derivative(&self, x: F, result: F) -> F;

    fn eval_dual(&self, x: Dual<F>) -> Dual<F> {
        let result = self.eval(x.re);
        Dual::new(result, self.derivative(x.re, result) * x.eps)
    }
}

/// Evaluate `op(a, b)` and return its pullback.
pub fn vjp_binary<F: Float, P: Primitive<F> + ?Sized>(
    op: &P,
    a: F,
    b: F,
) -> (F, impl Fn(F) -> (F, F)) {
    let result = op.eval(a, b);
    let (da, db) = op.partials(a, b, result);
    (result, move |t: F| (t * da, t * db))
}

/// Evaluate `op(x)` and return its pullback.
pub fn vjp_unary<F: Float, P: UnaryPrimitive<F> + ?Sized>(op: &P, x: F) -> (F, impl Fn(F) -> F) {
    let result = op.eval(x);
    let dx = op.derivative(x, result);
    (result, move |t: F| t * dx)
}

// ── Built-in primitives ──

/// The lesser of `a` and `b`; `a` on ties.
#[derive(Clone, Copy, Debug, Default)]
pub struct Min;

impl<F: Float> Primitive<F> for Min {
    #[inline]
    fn eval(&self, a: F, b: F) -> F {
        if b < a {
            b
        } else {
            a
        }
    }

    #[inline]
    fn partials(&self, a: F, b: F, _result: F) -> (F, F) {
        if b < a {
            (F::zero(), F::one())
        } else {
            (F::one(), F::zero())
        }
    }
}

/// The greater of `a` and `b`; `b` on ties.
#[derive(Clone, Copy, Debug, Default)]
pub struct Max;

impl<F: Float> Primitive<F> for Max {
    #[inline]
    fn eval(&self, a: F, b: F) -> F {
        if b >= a {
            b
        } else {
            a
        }
    }

    #[inline]
    fn partials(&self, a: F, b: F, _result: F) -> (F, F) {
        if b >= a {
            (F::zero(), F::one())
        } else {
            (F::one(), F::zero())
        }
    }
}

/// `atan2(y, x)`, with `y` first.
#[derive(Clone, Copy, Debug, Default)]
pub struct Atan2;

impl<F: Float> Primitive<F> for Atan2 {
    #[inline]
    fn eval(&self, y: F, x: F) -> F {
        y.atan2(x)
    }

    #[inline]
    fn partials(&self, y: F, x: F, _result: F) -> (F, F) {
        let denom = x * x + y * y;
        (x / denom, -y / denom)
    }
}

/// `|x|`, with derivative `+1` at zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct Abs;

impl<F: Float> UnaryPrimitive<F> for Abs {
    #[inline]
    fn eval(&self, x: F) -> F {
        x.abs()
    }

    #[inline]
    fn derivative(&self, x: F, _result: F) -> F {
        if x < F::zero() {
            -F::one()
        } else {
            F::one()
        }
    }
}
