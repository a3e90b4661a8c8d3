//! Benchmark fitness landscapes.
//!
//! Every landscape is flipped and offset so that higher is better and the
//! global optimum is exactly [`OPTIMUM`].

use mimetic_data::LandscapeKind;
use std::f64::consts::PI;

pub const OPTIMUM: f64 = 1000.0;

/// A pure `(x, y) -> fitness` function.
pub trait FitnessLandscape: Send + Sync {
    fn evaluate(&self, x: f64, y: f64) -> f64;

    fn name(&self) -> &str;
}

/// Optimum at (1, 3).
#[derive(Debug, Clone, Copy, Default)]
pub struct Booth;

impl FitnessLandscape for Booth {
    fn evaluate(&self, x: f64, y: f64) -> f64 {
        let a = x + 2.0 * y - 7.0;
        let b = 2.0 * x + y - 5.0;
        OPTIMUM - (a * a + b * b)
    }

    fn name(&self) -> &str {
        "booth"
    }
}

/// Optimum at the origin, surrounded by a grid of local optima.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rastrigin;

impl FitnessLandscape for Rastrigin {
    fn evaluate(&self, x: f64, y: f64) -> f64 {
        let term = |v: f64| v * v - 10.0 * (2.0 * PI * v).cos();
        OPTIMUM - (20.0 + term(x) + term(y))
    }

    fn name(&self) -> &str {
        "rastrigin"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Griewangk;

impl FitnessLandscape for Griewangk {
    fn evaluate(&self, x: f64, y: f64) -> f64 {
        let sum = (x * x + y * y) / 4000.0;
        let prod = x.cos() * (y / 2f64.sqrt()).cos();
        OPTIMUM - (1.0 + sum - prod)
    }

    fn name(&self) -> &str {
        "griewangk"
    }
}

/// Optimum at (1, 1), at the bottom of a narrow curved valley.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rosenbrock;

impl FitnessLandscape for Rosenbrock {
    fn evaluate(&self, x: f64, y: f64) -> f64 {
        let valley = x - y * y;
        OPTIMUM - (100.0 * valley * valley + (1.0 - y) * (1.0 - y))
    }

    fn name(&self) -> &str {
        "rosenbrock"
    }
}

#[must_use]
pub fn landscape_for(kind: LandscapeKind) -> Box<dyn FitnessLandscape> {
    match kind {
        LandscapeKind::Booth => Box::new(Booth),
        LandscapeKind::Rastrigin => Box::new(Rastrigin),
        LandscapeKind::Griewangk => Box::new(Griewangk),
        LandscapeKind::Rosenbrock => Box::new(Rosenbrock),
    }
}
