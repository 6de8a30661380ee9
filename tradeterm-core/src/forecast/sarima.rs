//! Seasonal ARIMA estimated by conditional sum of squares.
//!
//! The close series is differenced `d` times at lag 1 and `D` times at the
//! seasonal lag. On the differenced series w, with zero pre-sample values,
//!
//! ```text
//! w[t] = Σ ar[L]·w[t-L] + e[t] + Σ ma[L]·e[t-L]
//! ```
//!
//! where `ar` and `ma` are the expanded products of the regular and seasonal
//! polynomials. Residuals before the largest AR lag are conditioned away.
//! No stationarity or invertibility constraint is imposed.

use super::optimize::{Minimum, NelderMead};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const VARIANCE_FLOOR: f64 = 1e-12;

/// `(p, d, q)(P, D, Q)s` model orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SarimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_d: usize,
    pub seasonal_q: usize,
    pub period: usize,
}

impl Default for SarimaOrder {
    fn default() -> Self {
        Self {
            p: 2,
            d: 1,
            q: 2,
            seasonal_p: 1,
            seasonal_d: 1,
            seasonal_q: 1,
            period: 12,
        }
    }
}

impl SarimaOrder {
    pub fn coefficient_count(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    /// Coefficients plus the innovation variance.
    pub fn parameter_count(&self) -> usize {
        self.coefficient_count() + 1
    }

    fn ar_lag(&self) -> usize {
        self.p + self.seasonal_p * self.period
    }

    fn ma_lag(&self) -> usize {
        self.q + self.seasonal_q * self.period
    }

    fn differencing_lags(&self) -> Vec<usize> {
        std::iter::repeat(1)
            .take(self.d)
            .chain(std::iter::repeat(self.period).take(self.seasonal_d))
            .collect()
    }

    /// Shortest series that leaves a few residuals after differencing and
    /// conditioning on the largest lag.
    pub fn min_observations(&self) -> usize {
        self.d + self.seasonal_d * self.period + self.ar_lag().max(self.ma_lag()) + 6
    }

    /// Split a flat parameter vector into expanded `(ar, ma)` lag tables,
    /// index 0 unused.
    fn expand(&self, params: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let (phi, rest) = params.split_at(self.p);
        let (theta, rest) = rest.split_at(self.q);
        let (seasonal_phi, seasonal_theta) = rest.split_at(self.seasonal_p);

        // AR side as 1 - Σ c·B^L, MA side as 1 + Σ c·B^L.
        let regular_ar = lag_polynomial(phi, 1, -1.0);
        let seasonal_ar = lag_polynomial(seasonal_phi, self.period, -1.0);
        let regular_ma = lag_polynomial(theta, 1, 1.0);
        let seasonal_ma = lag_polynomial(seasonal_theta, self.period, 1.0);

        let ar: Vec<f64> = multiply(&regular_ar, &seasonal_ar).iter().map(|c| -c).collect();
        let ma = multiply(&regular_ma, &seasonal_ma);
        (ar, ma)
    }
}

/// `1 + sign·Σ c_i·B^(i·step)`.
fn lag_polynomial(coefs: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefs.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coefs.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

fn difference(values: &[f64], lag: usize) -> Vec<f64> {
    values.windows(lag + 1).map(|w| w[lag] - w[0]).collect()
}

/// Residuals of the recursion with zero pre-sample values.
fn residuals(w: &[f64], ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let mut e = vec![0.0; w.len()];
    for t in 0..w.len() {
        let mut fitted = 0.0;
        for (lag, c) in ar.iter().enumerate().skip(1).take(t) {
            fitted += c * w[t - lag];
        }
        for (lag, c) in ma.iter().enumerate().skip(1).take(t) {
            fitted += c * e[t - lag];
        }
        e[t] = w[t] - fitted;
    }
    e
}

/// Fitted model: parameters, fit statistics and what forecasting needs.
#[derive(Debug, Clone)]
pub struct SarimaFit {
    pub order: SarimaOrder,
    pub params: Vec<f64>,
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub n_effective: usize,
    pub optimizer: Minimum,
    /// Original series and every differencing stage, last = w.
    stages: Vec<Vec<f64>>,
    residuals: Vec<f64>,
}

/// Estimate the model on `series`. The caller checks the length against
/// [`SarimaOrder::min_observations`].
pub fn fit(series: &[f64], order: SarimaOrder, optimizer: &NelderMead) -> SarimaFit {
    let mut stages = vec![series.to_vec()];
    for lag in order.differencing_lags() {
        let next = stages.last().map(|s| difference(s, lag)).unwrap_or_default();
        stages.push(next);
    }
    let w = stages.last().cloned().unwrap_or_default();
    let skip = order.ar_lag().min(w.len());
    let n_effective = w.len() - skip;

    let css = |params: &[f64]| {
        let (ar, ma) = order.expand(params);
        residuals(&w, &ar, &ma)[skip..].iter().map(|e| e * e).sum::<f64>()
    };
    let minimum = optimizer.minimize(css, &vec![0.0; order.coefficient_count()]);

    let (ar, ma) = order.expand(&minimum.point);
    let e = residuals(&w, &ar, &ma);
    let n = n_effective.max(1) as f64;
    let sigma2 = (minimum.value / n).max(VARIANCE_FLOOR);
    let log_likelihood = -0.5 * n * ((2.0 * PI * sigma2).ln() + 1.0);
    let k = order.parameter_count() as f64;

    SarimaFit {
        order,
        params: minimum.point.clone(),
        sigma2,
        log_likelihood,
        aic: 2.0 * k - 2.0 * log_likelihood,
        bic: k * n.ln() - 2.0 * log_likelihood,
        n_effective,
        optimizer: minimum,
        stages,
        residuals: e,
    }
}

impl SarimaFit {
    /// Point forecasts for steps 1..=steps, at price level, with zero
    /// future shocks.
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        let (ar, ma) = self.order.expand(&self.params);
        let mut w = self.stages.last().cloned().unwrap_or_default();
        let mut e = self.residuals.clone();
        let n = w.len();

        for t in n..n + steps {
            let mut value = 0.0;
            for (lag, c) in ar.iter().enumerate().skip(1).take(t) {
                value += c * w[t - lag];
            }
            for (lag, c) in ma.iter().enumerate().skip(1).take(t) {
                value += c * e[t - lag];
            }
            w.push(value);
            e.push(0.0);
        }

        // Undo each differencing stage: z[m + lag] = dz[m] + z[m].
        let lags = self.order.differencing_lags();
        let mut extended = w;
        for (stage, lag) in self.stages[..self.stages.len() - 1].iter().zip(lags).rev() {
            let mut z = stage.clone();
            let base = extended.len() - steps;
            for j in 0..steps {
                let m = base + j;
                debug_assert_eq!(z.len(), m + lag);
                let value = extended[m] + z[m];
                z.push(value);
            }
            extended = z;
        }

        extended.split_off(extended.len() - steps)
    }
}
