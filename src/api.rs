use crate::differentiable::Differentiable;
use crate::dual::Dual;
use crate::float::Float;

/// Evaluate a pullback-producing function and seed its pullback with `1`.
///
/// `f` is any of this crate's `vjp_*` forms (or a composition of them) that
/// maps `x` to a scalar. Returns the value and the gradient with respect to
/// `x`.
///
/// ```
/// use echidna_collections::api::value_with_gradient;
/// use echidna_collections::sequence::vjp_reduce;
///
/// let xs = vec![1.0_f64, 2.0, 3.0];
/// let (value, grad) = value_with_gradient(&xs, |xs| {
///     let (sum, pullback) = vjp_reduce(xs, 0.0, |acc: &f64, &x: &f64| {
///         (acc + x * x, move |t: f64| (t, 2.0 * x * t))
///     });
///     (sum, move |t: f64| pullback(t).1)
/// });
/// assert_eq!(value, 14.0);
/// assert_eq!(grad.as_slice(), &[2.0, 4.0, 6.0]);
/// ```
pub fn value_with_gradient<X, F, G, P>(x: &X, f: G) -> (F, X::Tangent)
where
    X: Differentiable,
    F: Float,
    G: FnOnce(&X) -> (F, P),
    P: Fn(F) -> X::Tangent,
{
    let (value, pullback) = f(x);
    (value, pullback(F::one()))
}

/// [`value_with_gradient`] without the value.
pub fn gradient<X, F, G, P>(x: &X, f: G) -> X::Tangent
where
    X: Differentiable,
    F: Float,
    G: FnOnce(&X) -> (F, P),
    P: Fn(F) -> X::Tangent,
{
    value_with_gradient(x, f).1
}

/// Derive a scalar pullback from a function written over [`Dual`] numbers.
///
/// One forward-mode evaluation at `x` yields `f(x)` and `f'(x)`; the
/// pullback scales by the captured derivative. This is the usual way to build
/// element pullbacks for `vjp_map` bodies.
///
/// ```
/// use echidna_collections::api::vjp_scalar;
///
/// let (y, pullback) = vjp_scalar(|x| x * x + x, 3.0_f64);
/// assert_eq!(y, 12.0);
/// assert_eq!(pullback(2.0), 14.0);
/// ```
pub fn vjp_scalar<F: Float>(f: impl Fn(Dual<F>) -> Dual<F>, x: F) -> (F, impl Fn(F) -> F) {
    let out = f(Dual::variable(x));
    let derivative = out.eps;
    (out.re, move |t: F| t * derivative)
}

/// Two-argument [`vjp_scalar`]: one forward pass per argument.
pub fn vjp_scalar2<F: Float>(
    f: impl Fn(Dual<F>, Dual<F>) -> Dual<F>,
    a: F,
    b: F,
) -> (F, impl Fn(F) -> (F, F)) {
    let da = f(Dual::variable(a), Dual::constant(b));
    let db = f(Dual::constant(a), Dual::variable(b));
    let (pa, pb) = (da.eps, db.eps);
    (da.re, move |t: F| (t * pa, t * pb))
}

/// `f'(x)` by forward mode.
pub fn derivative<F: Float>(f: impl Fn(Dual<F>) -> Dual<F>, x: F) -> F {
    f(Dual::variable(x)).eps
}

/// Run bookkeeping that takes no part in differentiation.
///
/// The body's result carries no pullback; callers use it for counters,
/// logging or other side state around a differentiated computation.
#[inline]
pub fn run_without_derivative<R>(body: impl FnOnce() -> R) -> R {
    body()
}
