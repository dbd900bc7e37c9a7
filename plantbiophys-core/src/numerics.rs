//! Small numerical helpers shared by the process models.

use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Largest real root of `a·x² + b·x + c = 0`
///
/// Returns `0.0` when the discriminant is negative, i.e. when no real root exists. For the
/// coupled photosynthesis quadratics this means the limiting rate is zero.
pub fn max_root(a: FloatValue, b: FloatValue, c: FloatValue) -> FloatValue {
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        0.0
    } else {
        (-b + discriminant.sqrt()) / (2.0 * a)
    }
}

/// Outcome of a fixed-point iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Convergence {
    /// The tolerance was met after `iterations` iterations
    Converged { iterations: usize },
    /// The iteration cap was reached, the result is the last iterate
    MaxIterExceeded { iterations: usize },
}

impl Convergence {
    pub fn iterations(&self) -> usize {
        match self {
            Convergence::Converged { iterations } | Convergence::MaxIterExceeded { iterations } => {
                *iterations
            }
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, Convergence::Converged { .. })
    }
}

/// Tally of the iterative solves run by a simulation
///
/// `steps` counts every solve, `exhausted` those that hit their iteration cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    pub steps: usize,
    pub exhausted: usize,
}

impl ConvergenceReport {
    pub fn record(&mut self, convergence: Convergence) {
        self.steps += 1;
        if !convergence.is_converged() {
            self.exhausted += 1;
        }
    }

    pub fn merge(self, other: ConvergenceReport) -> ConvergenceReport {
        ConvergenceReport {
            steps: self.steps + other.steps,
            exhausted: self.exhausted + other.exhausted,
        }
    }

    /// True if no solve hit its iteration cap
    pub fn all_converged(&self) -> bool {
        self.exhausted == 0
    }
}

impl From<Convergence> for ConvergenceReport {
    fn from(convergence: Convergence) -> Self {
        let mut report = Self::default();
        report.record(convergence);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn test_max_root() {
        // (x - 2)(x + 3) = x² + x - 6
        assert!(is_close!(max_root(1.0, 1.0, -6.0), 2.0));
        // 2(x - 1)(x - 4)
        assert!(is_close!(max_root(2.0, -10.0, 8.0), 4.0));
    }

    #[test]
    fn test_max_root_negative_discriminant() {
        assert_eq!(max_root(1.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_report() {
        let mut report = ConvergenceReport::default();
        report.record(Convergence::Converged { iterations: 3 });
        report.record(Convergence::MaxIterExceeded { iterations: 10 });

        assert_eq!(report.steps, 2);
        assert_eq!(report.exhausted, 1);
        assert!(!report.all_converged());

        let merged = report.merge(Convergence::Converged { iterations: 1 }.into());
        assert_eq!(merged, ConvergenceReport { steps: 3, exhausted: 1 });
    }
}
