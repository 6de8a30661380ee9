//! SMOTE: synthetic minority oversampling.
//!
//! Every class below the majority count is topped up with points
//! interpolated between a random class member and one of its `k` nearest
//! same-class neighbours. Originals keep their order; synthetic samples are
//! appended class by class in ascending class order.

use rand::Rng;

/// Oversample `samples` so every present class reaches the majority count.
///
/// `k` is reduced to `class size - 1` for small classes; a single-member
/// class is duplicated instead of interpolated.
pub fn smote<R: Rng>(
    samples: &[Vec<f64>],
    labels: &[usize],
    k: usize,
    rng: &mut R,
) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut out_x = samples.to_vec();
    let mut out_y = labels.to_vec();

    let num_classes = labels.iter().copied().max().map_or(0, |m| m + 1);
    let members: Vec<Vec<usize>> = (0..num_classes)
        .map(|c| (0..labels.len()).filter(|&i| labels[i] == c).collect())
        .collect();
    let target = members.iter().map(Vec::len).max().unwrap_or(0);

    for (class, idx) in members.iter().enumerate() {
        if idx.is_empty() || idx.len() >= target {
            continue;
        }
        let needed = target - idx.len();

        if idx.len() == 1 {
            let only = &samples[idx[0]];
            for _ in 0..needed {
                out_x.push(only.clone());
                out_y.push(class);
            }
            continue;
        }

        let k_eff = k.clamp(1, idx.len() - 1);
        let neighbours: Vec<Vec<usize>> = idx
            .iter()
            .map(|&i| nearest(samples, idx, i, k_eff))
            .collect();

        for _ in 0..needed {
            let pick = rng.gen_range(0..idx.len());
            let nn = neighbours[pick][rng.gen_range(0..k_eff)];
            let gap: f64 = rng.gen();
            let base = &samples[idx[pick]];
            let other = &samples[nn];
            let synthetic = base
                .iter()
                .zip(other)
                .map(|(a, b)| a + gap * (b - a))
                .collect();
            out_x.push(synthetic);
            out_y.push(class);
        }
    }

    (out_x, out_y)
}

/// The `k` same-class neighbours of `i`, nearest first (ties by index).
fn nearest(samples: &[Vec<f64>], class_idx: &[usize], i: usize, k: usize) -> Vec<usize> {
    let mut dists: Vec<(f64, usize)> = class_idx
        .iter()
        .filter(|&&j| j != i)
        .map(|&j| (squared_distance(&samples[i], &samples[j]), j))
        .collect();
    dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    dists.into_iter().take(k).map(|(_, j)| j).collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn count(labels: &[usize], class: usize) -> usize {
        labels.iter().filter(|&&l| l == class).count()
    }

    #[test]
    fn balances_classes_and_keeps_originals_first() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, 0.0]).collect();
        let y = vec![1, 1, 1, 1, 1, 1, 0, 0, 0, 2];
        let mut rng = StdRng::seed_from_u64(3);
        let (ox, oy) = smote(&x, &y, 5, &mut rng);

        assert_eq!(&ox[..10], &x[..]);
        assert_eq!(&oy[..10], &y[..]);
        for c in 0..3 {
            assert_eq!(count(&oy, c), 6);
        }
    }

    #[test]
    fn synthetic_points_lie_between_class_members() {
        let x = vec![vec![0.0], vec![1.0], vec![10.0], vec![11.0], vec![12.0], vec![13.0]];
        let y = vec![0, 0, 1, 1, 1, 1];
        let mut rng = StdRng::seed_from_u64(9);
        let (ox, oy) = smote(&x, &y, 5, &mut rng);
        for (row, label) in ox.iter().zip(&oy).skip(6) {
            assert_eq!(*label, 0);
            assert!((0.0..=1.0).contains(&row[0]));
        }
    }

    #[test]
    fn singleton_class_is_duplicated() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0], vec![9.0]];
        let y = vec![0, 0, 0, 1];
        let mut rng = StdRng::seed_from_u64(0);
        let (ox, oy) = smote(&x, &y, 5, &mut rng);
        assert_eq!(count(&oy, 1), 3);
        assert!(ox[4..].iter().all(|r| r == &vec![9.0]));
    }

    #[test]
    fn seeded_runs_are_identical() {
        let x: Vec<Vec<f64>> = (0..8).map(|i| vec![(i * i) as f64]).collect();
        let y = vec![0, 0, 0, 0, 0, 1, 1, 1];
        let a = smote(&x, &y, 5, &mut StdRng::seed_from_u64(11));
        let b = smote(&x, &y, 5, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }
}
