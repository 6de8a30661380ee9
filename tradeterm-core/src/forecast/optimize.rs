//! Derivative-free minimization (Nelder–Mead simplex).
//!
//! The criterion is any closure over a parameter slice. Non-finite criterion
//! values are treated as +inf so the simplex walks away from them.

#[derive(Debug, Clone, PartialEq)]
pub struct NelderMead {
    pub max_iterations: usize,
    /// Simplex spread, in parameter units, below which the search stops.
    pub x_tolerance: f64,
    /// Criterion spread across the simplex below which the search stops.
    pub f_tolerance: f64,
    /// Offset of the initial vertices from the start point.
    pub initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 2_000,
            x_tolerance: 1e-6,
            f_tolerance: 1e-8,
            initial_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

impl NelderMead {
    pub fn minimize<F>(&self, criterion: F, start: &[f64]) -> Minimum
    where
        F: Fn(&[f64]) -> f64,
    {
        let eval = |x: &[f64]| {
            let v = criterion(x);
            if v.is_finite() {
                v
            } else {
                f64::INFINITY
            }
        };

        let n = start.len();
        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
        simplex.push((start.to_vec(), eval(start)));
        for i in 0..n {
            let mut vertex = start.to_vec();
            vertex[i] += if vertex[i] != 0.0 {
                0.05 * vertex[i]
            } else {
                self.initial_step
            };
            let value = eval(&vertex);
            simplex.push((vertex, value));
        }

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

            let (best, best_value) = (&simplex[0].0, simplex[0].1);
            let x_spread = simplex[1..]
                .iter()
                .flat_map(|(x, _)| x.iter().zip(best).map(|(a, b)| (a - b).abs()))
                .fold(0.0, f64::max);
            let f_spread = simplex[1..]
                .iter()
                .map(|(_, f)| (f - best_value).abs())
                .fold(0.0, f64::max);
            if x_spread <= self.x_tolerance && f_spread <= self.f_tolerance {
                converged = true;
                break;
            }
            if n == 0 {
                converged = true;
                break;
            }
            iterations += 1;

            let centroid: Vec<f64> = (0..n)
                .map(|j| simplex[..n].iter().map(|(x, _)| x[j]).sum::<f64>() / n as f64)
                .collect();
            let toward = |from: &[f64], coef: f64| -> Vec<f64> {
                centroid
                    .iter()
                    .zip(from)
                    .map(|(c, x)| c + coef * (x - c))
                    .collect()
            };

            let worst_value = simplex[n].1;
            let second_worst = simplex[n - 1].1;
            let reflected = toward(&simplex[n].0, -REFLECT);
            let reflected_value = eval(&reflected);

            if reflected_value < best_value {
                let expanded = toward(&reflected, EXPAND);
                let expanded_value = eval(&expanded);
                simplex[n] = if expanded_value < reflected_value {
                    (expanded, expanded_value)
                } else {
                    (reflected, reflected_value)
                };
                continue;
            }
            if reflected_value < second_worst {
                simplex[n] = (reflected, reflected_value);
                continue;
            }

            let (contracted, contracted_value, accept_at) = if reflected_value < worst_value {
                let c = toward(&reflected, CONTRACT);
                let v = eval(&c);
                (c, v, reflected_value)
            } else {
                let c = toward(&simplex[n].0, CONTRACT);
                let v = eval(&c);
                (c, v, worst_value)
            };
            if contracted_value <= accept_at {
                simplex[n] = (contracted, contracted_value);
                continue;
            }

            let anchor = simplex[0].0.clone();
            for (x, f) in simplex.iter_mut().skip(1) {
                for (xi, ai) in x.iter_mut().zip(&anchor) {
                    *xi = ai + SHRINK * (*xi - ai);
                }
                *f = eval(x);
            }
        }

        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let (point, value) = simplex.swap_remove(0);
        Minimum {
            point,
            value,
            iterations,
            converged,
        }
    }
}
