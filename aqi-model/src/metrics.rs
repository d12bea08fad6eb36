use serde::{Deserialize, Serialize};
use std::fmt;

/// Held-out evaluation of a fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl Evaluation {
    /// Score `predicted` against `actual`. Both must be non-empty and of equal length.
    ///
    /// R² of a constant `actual` is 1.0 for an exact fit and 0.0 otherwise.
    pub fn score(actual: &[f64], predicted: &[f64]) -> Self {
        debug_assert_eq!(actual.len(), predicted.len());
        let n = actual.len() as f64;
        let mut squared = 0.0;
        let mut absolute = 0.0;
        for (a, p) in actual.iter().zip(predicted) {
            let residual = a - p;
            squared += residual * residual;
            absolute += residual.abs();
        }
        let mean = actual.iter().sum::<f64>() / n;
        let total: f64 = actual.iter().map(|a| (a - mean) * (a - mean)).sum();
        let r2 = if total > 0.0 {
            1.0 - squared / total
        } else if squared == 0.0 {
            1.0
        } else {
            0.0
        };
        Evaluation {
            rmse: (squared / n).sqrt(),
            mae: absolute / n,
            r2,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RMSE {:.2}, MAE {:.2}, R² {:.3}",
            self.rmse, self.mae, self.r2
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_fit() {
        let e = Evaluation::score(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert_eq!(e.rmse, 0.0);
        assert_eq!(e.mae, 0.0);
        assert_eq!(e.r2, 1.0);
    }

    #[test]
    fn known_residuals() {
        // residuals 1, -1, 2, -2
        let e = Evaluation::score(&[10.0, 20.0, 30.0, 40.0], &[9.0, 21.0, 28.0, 42.0]);
        assert!((e.rmse - 2.5f64.sqrt()).abs() < 1e-12);
        assert!((e.mae - 1.5).abs() < 1e-12);
        // total sum of squares is 500
        assert!((e.r2 - (1.0 - 10.0 / 500.0)).abs() < 1e-12);
    }

    #[test]
    fn mean_predictor_scores_zero_r2() {
        let e = Evaluation::score(&[1.0, 3.0], &[2.0, 2.0]);
        assert_eq!(e.r2, 0.0);
    }

    #[test]
    fn constant_target() {
        assert_eq!(Evaluation::score(&[5.0, 5.0], &[5.0, 5.0]).r2, 1.0);
        assert_eq!(Evaluation::score(&[5.0, 5.0], &[4.0, 5.0]).r2, 0.0);
    }

    #[test]
    fn display_is_compact() {
        let e = Evaluation {
            rmse: 3.14159,
            mae: 2.0,
            r2: 0.91234,
        };
        assert_eq!(e.to_string(), "RMSE 3.14, MAE 2.00, R² 0.912");
    }
}
