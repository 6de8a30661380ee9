//! Per-feature z-score standardization.

/// Mean and scale per feature, fitted once and applied to every row.
///
/// Scale is the population standard deviation; a constant feature gets
/// scale 1 so it maps to 0 instead of NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on `rows`. All rows must have the same width; an empty input
    /// gives an empty scaler.
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let n = rows.len() as f64;

        let mean: Vec<f64> = (0..width)
            .map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n)
            .collect();
        let scale = (0..width)
            .map(|j| {
                let var = rows.iter().map(|r| (r[j] - mean[j]).powi(2)).sum::<f64>() / n;
                let sd = var.sqrt();
                if sd > 0.0 && sd.is_finite() {
                    sd
                } else {
                    1.0
                }
            })
            .collect();

        Self { mean, scale }
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizes_columns() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows);
        let out = scaler.transform(&rows);
        assert_eq!(out[0], vec![-1.0, 0.0]);
        assert_eq!(out[1], vec![1.0, 0.0]);
    }

    #[test]
    fn applies_fitted_statistics_to_new_rows() {
        let scaler = StandardScaler::fit(&[vec![0.0], vec![2.0]]);
        assert_eq!(scaler.transform_row(&[4.0]), vec![3.0]);
        assert_eq!(scaler.width(), 1);
    }
}
