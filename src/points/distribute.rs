//! Cross-mesh split of the requested point total.

/// Splits `total` points across meshes proportionally to `areas`.
///
/// Uses largest-remainder rounding: floors first, then one extra point per
/// mesh in descending order of fractional part (cycling when needed). A zero
/// total area falls back to an even split with the remainder going to the
/// first meshes. `total <= 0` is treated as `1`.
///
/// Every mesh gets at least one point. When `total` is smaller than the mesh
/// count the total is raised to the mesh count; otherwise a starved mesh takes
/// its point from the largest allocation, so the sum stays `total`.
#[must_use]
pub fn distribute(areas: &[f64], total: i64) -> Vec<usize> {
    let n = areas.len();
    if n == 0 {
        return Vec::new();
    }

    let mut total = usize::try_from(total.max(1)).unwrap_or(1);
    if total < n {
        log::warn!("{total} points requested for {n} meshes; raising to one point per mesh");
        total = n;
    }

    let clean: Vec<f64> = areas
        .iter()
        .map(|&a| if a.is_finite() && a > 0.0 { a } else { 0.0 })
        .collect();
    let area_sum: f64 = clean.iter().sum();

    let mut counts = if area_sum > 0.0 {
        largest_remainder(&clean, area_sum, total)
    } else {
        log::warn!("total mesh area is zero; splitting {total} points evenly");
        even_split(n, total)
    };

    enforce_minimum(&mut counts);
    log::debug!("distributed {total} points as {counts:?}");
    counts
}

fn largest_remainder(areas: &[f64], area_sum: f64, total: usize) -> Vec<usize> {
    let raw: Vec<f64> = areas.iter().map(|a| a / area_sum * total as f64).collect();
    let mut counts: Vec<usize> = raw.iter().map(|r| r.floor() as usize).collect();

    let assigned: usize = counts.iter().sum();
    let mut remaining = total.saturating_sub(assigned);

    let mut by_fraction: Vec<usize> = (0..raw.len()).collect();
    // Stable: equal fractions keep mesh order.
    by_fraction.sort_by(|&a, &b| {
        let fa = raw[a] - counts[a] as f64;
        let fb = raw[b] - counts[b] as f64;
        fb.total_cmp(&fa)
    });

    let mut cursor = 0;
    while remaining > 0 {
        counts[by_fraction[cursor]] += 1;
        remaining -= 1;
        cursor = (cursor + 1) % by_fraction.len();
    }
    counts
}

fn even_split(n: usize, total: usize) -> Vec<usize> {
    let per = total / n;
    let rem = total % n;
    (0..n).map(|i| per + usize::from(i < rem)).collect()
}

/// Moves single points from the largest allocations to empty ones.
fn enforce_minimum(counts: &mut [usize]) {
    while let Some(empty) = counts.iter().position(|&c| c == 0) {
        let Some(donor) = counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 1)
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
            .map(|(i, _)| i)
        else {
            counts[empty] = 1;
            continue;
        };
        counts[donor] -= 1;
        counts[empty] = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_areas_split_equally() {
        assert_eq!(distribute(&[6.0, 6.0], 6), vec![3, 3]);
    }

    #[test]
    fn remainder_goes_to_largest_fraction() {
        // Raw shares: 5.0 * 0.5 = 2.5, 1.5, 1.0 -> floors 2, 1, 1 -> one extra.
        let counts = distribute(&[5.0, 3.0, 2.0], 5);
        assert_eq!(counts.iter().sum::<usize>(), 5);
        assert_eq!(counts, vec![3, 1, 1]);
    }

    #[test]
    fn equal_fractions_favor_earlier_meshes() {
        assert_eq!(distribute(&[1.0, 1.0, 1.0], 4), vec![2, 1, 1]);
    }

    #[test]
    fn zero_area_falls_back_to_even_split() {
        assert_eq!(distribute(&[0.0, 0.0, 0.0], 7), vec![3, 2, 2]);
        assert_eq!(distribute(&[0.0, f64::NAN], 4), vec![2, 2]);
    }

    #[test]
    fn non_positive_total_is_clamped() {
        assert_eq!(distribute(&[3.0], 0), vec![1]);
        assert_eq!(distribute(&[3.0], -5), vec![1]);
    }

    #[test]
    fn tiny_mesh_still_gets_a_point() {
        let counts = distribute(&[100.0, 1.0], 10);
        assert_eq!(counts, vec![9, 1]);
    }

    #[test]
    fn total_below_mesh_count_gives_one_each() {
        assert_eq!(distribute(&[1.0, 2.0, 3.0], 2), vec![1, 1, 1]);
    }

    #[test]
    fn conservation_over_many_shapes() {
        let shapes: [&[f64]; 4] = [
            &[1.0, 2.0, 3.0, 4.0],
            &[0.1, 10.0, 0.0, 7.5, 2.2],
            &[1e-9, 1e9],
            &[3.3, 3.3, 3.3],
        ];
        for areas in shapes {
            for total in areas.len() as i64..40 {
                let counts = distribute(areas, total);
                assert_eq!(counts.iter().sum::<usize>() as i64, total, "{areas:?} / {total}");
                assert!(counts.iter().all(|&c| c >= 1), "{areas:?} / {total}: {counts:?}");
            }
        }
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(distribute(&[], 10).is_empty());
    }
}
