use std::fmt::{self, Display};

use crate::Float;

/// Forward-mode dual number: a value paired with its directional derivative.
///
/// `Dual { re, eps }` represents `re + eps·ε` where `ε² = 0`. This crate uses
/// it only as an auxiliary: a scalar function written over `Dual<F>` yields its
/// local derivative in one evaluation, which [`crate::api::vjp_scalar`] turns
/// into a pullback for the combinators.
#[derive(Clone, Copy, Debug, Default)]
pub struct Dual<F: Float> {
    /// Primal value.
    pub re: F,
    /// Tangent value.
    pub eps: F,
}

impl<F: Float> Display for Dual<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}ε", self.re, self.eps)
    }
}

impl<F: Float> Dual<F> {
    #[inline]
    pub fn new(re: F, eps: F) -> Self {
        Dual { re, eps }
    }

    /// A constant: zero derivative.
    #[inline]
    pub fn constant(re: F) -> Self {
        Dual { re, eps: F::zero() }
    }

    /// The differentiation variable: unit derivative.
    #[inline]
    pub fn variable(re: F) -> Self {
        Dual { re, eps: F::one() }
    }

    /// Chain rule: given `f(self.re)` and `f'(self.re)`.
    #[inline]
    fn chain(self, f_val: F, f_deriv: F) -> Self {
        Dual {
            re: f_val,
            eps: self.eps * f_deriv,
        }
    }

    #[inline]
    pub fn scale(self, k: F) -> Self {
        Dual {
            re: self.re * k,
            eps: self.eps * k,
        }
    }

    // ── Powers ──

    #[inline]
    pub fn recip(self) -> Self {
        let inv = F::one() / self.re;
        self.chain(inv, -inv * inv)
    }

    #[inline]
    pub fn sqrt(self) -> Self {
        let s = self.re.sqrt();
        self.chain(s, F::one() / (s + s))
    }

    #[inline]
    pub fn powi(self, n: i32) -> Self {
        let deriv = match F::from_i32(n) {
            Some(nf) => nf * self.re.powi(n - 1),
            None => F::nan(),
        };
        self.chain(self.re.powi(n), deriv)
    }

    // ── Exp/Log ──

    #[inline]
    pub fn exp(self) -> Self {
        let e = self.re.exp();
        self.chain(e, e)
    }

    #[inline]
    pub fn ln(self) -> Self {
        self.chain(self.re.ln(), F::one() / self.re)
    }

    // ── Trig ──

    #[inline]
    pub fn sin(self) -> Self {
        self.chain(self.re.sin(), self.re.cos())
    }

    #[inline]
    pub fn cos(self) -> Self {
        self.chain(self.re.cos(), -self.re.sin())
    }

    #[inline]
    pub fn tanh(self) -> Self {
        let t = self.re.tanh();
        self.chain(t, F::one() - t * t)
    }

    // ── Misc ──

    /// `|x|`, with derivative `+1` at zero.
    #[inline]
    pub fn abs(self) -> Self {
        let sign = if self.re < F::zero() { -F::one() } else { F::one() };
        self.chain(self.re.abs(), sign)
    }
}
