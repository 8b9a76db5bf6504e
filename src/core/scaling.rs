//! Renormalization of raw shapes to annual targets.

use indexmap::IndexMap;

/// Scale a raw shape so that its sum equals `annual_target` exactly (up to
/// floating-point error), regardless of the shape's own normalization. A
/// shape with a non-positive sum is returned unscaled; with a zero target
/// this yields the expected all-zero curve.
pub fn normalize_to_annual(values: &[f64], annual_target: f64) -> Vec<f64> {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 {
        values.iter().map(|v| v / sum * annual_target).collect()
    } else {
        values.to_vec()
    }
}

/// Scale each category of a resolved frame to its annual target, applying the
/// energy-to-power conversion factor (intervals per hour, e.g. 4.0 for
/// 15-minute steps). Categories absent from the target map are dropped from
/// the output, not zero-filled.
pub fn scale_by_targets(
    frame: &IndexMap<String, Vec<f64>>,
    annual_targets: &IndexMap<String, f64>,
    conversion_factor: f64,
) -> IndexMap<String, Vec<f64>> {
    frame
        .iter()
        .filter_map(|(category, values)| {
            annual_targets.get(category).map(|target| {
                let scaled = normalize_to_annual(values, *target)
                    .iter()
                    .map(|v| v * conversion_factor)
                    .collect();
                (category.clone(), scaled)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case(25_000.0)]
    #[case(1.0)]
    #[case(0.0)]
    fn scaled_sum_equals_the_target(#[case] target: f64) {
        let raw: Vec<f64> = (1..=96).map(|i| i as f64 * 0.37).collect();
        let scaled = normalize_to_annual(&raw, target);
        assert_relative_eq!(scaled.iter().sum::<f64>(), target, max_relative = 1e-12);
    }

    #[rstest]
    fn zero_shapes_stay_zero() {
        assert_eq!(normalize_to_annual(&[0.0, 0.0], 100.0), vec![0.0, 0.0]);
    }

    #[rstest]
    fn categories_without_targets_are_dropped() {
        let frame: IndexMap<String, Vec<f64>> = IndexMap::from([
            ("h0".to_string(), vec![0.25, 0.75]),
            ("g0".to_string(), vec![0.5, 0.5]),
        ]);
        let targets = IndexMap::from([("h0".to_string(), 1000.0)]);
        let scaled = scale_by_targets(&frame, &targets, 4.0);
        assert_eq!(scaled.keys().collect::<Vec<_>>(), vec!["h0"]);
        // Power units: sum * step length in hours recovers the annual value.
        assert_relative_eq!(
            scaled["h0"].iter().sum::<f64>() / 4.0,
            1000.0,
            max_relative = 1e-12
        );
    }
}
