#![allow(dead_code)]

use echidna_collections::Dual;

// ─── Inputs ────────────────────────────────────────────────────────────────

pub fn make_input(n: usize) -> Vec<f64> {
    (0..n).map(|i| 0.5 + 0.01 * i as f64).collect()
}

pub fn make_target(n: usize) -> Vec<f64> {
    (0..n).map(|i| 0.25 * (i % 7) as f64).collect()
}

pub fn make_direction(n: usize) -> Vec<f64> {
    (0..n).map(|i| 0.1 * (i + 1) as f64).collect()
}

// ─── Mean squared error ────────────────────────────────────────────────────
// f(x) = Σ (xᵢ - yᵢ)² / n

pub fn mse_f64(x: &[f64], y: &[f64]) -> f64 {
    let sum: f64 = x.iter().zip(y).map(|(a, b)| (a - b) * (a - b)).sum();
    sum / x.len() as f64
}

/// Directional derivative of [`mse_f64`] along `direction`, one dual pass.
pub fn mse_dual(x: &[f64], y: &[f64], direction: &[f64]) -> Dual<f64> {
    let mut sum = Dual::constant(0.0);
    for ((&a, &b), &d) in x.iter().zip(y).zip(direction) {
        let diff = Dual::new(a, d) - b;
        sum += diff * diff;
    }
    sum / x.len() as f64
}

// ─── In-place sine over a prefix ───────────────────────────────────────────

pub fn sin_prefix_f64(x: &mut [f64], end: usize) {
    for v in &mut x[..end] {
        *v = v.sin();
    }
}
