//! Built-in sample data sets, one per chart kind.

use super::ChartPoint;
use rand::{rngs::StdRng, Rng, SeedableRng};

const VOLCANO_SEED: u64 = 0x5eed_b10;
const VOLCANO_GENES: usize = 100;

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// 100 pseudo-random genes skewed towards significance. Seeded, so every call
/// returns the same set.
pub fn volcano() -> Vec<ChartPoint> {
    let mut rng = StdRng::seed_from_u64(VOLCANO_SEED);
    (0..VOLCANO_GENES)
        .map(|i| {
            let log2_fold_change = rng.gen::<f64>() * 10.0 - 5.0;
            let p_value = rng.gen_range(f64::EPSILON..0.1);
            let neg_log10_p = -p_value.log10();
            let significant = log2_fold_change.abs() > 2.0 && neg_log10_p > 1.3;
            ChartPoint {
                name: format!("Gene_{i}"),
                x: Some(round2(log2_fold_change)),
                y: Some(round2(neg_log10_p)),
                value: None,
                category: Some(
                    if significant {
                        "Significant"
                    } else {
                        "Not Significant"
                    }
                    .to_string(),
                ),
            }
        })
        .collect()
}

fn bar(name: &str, value: f64, category: &str) -> ChartPoint {
    ChartPoint {
        name: name.to_string(),
        x: None,
        y: None,
        value: Some(value),
        category: Some(category.to_string()),
    }
}

pub fn expression() -> Vec<ChartPoint> {
    vec![
        bar("Control 1", 120.0, "Control"),
        bar("Control 2", 132.0, "Control"),
        bar("Control 3", 101.0, "Control"),
        bar("Treated 1", 450.0, "Treated"),
        bar("Treated 2", 480.0, "Treated"),
        bar("Treated 3", 430.0, "Treated"),
    ]
}

pub fn growth() -> Vec<ChartPoint> {
    [
        ("0h", 0.1),
        ("2h", 0.15),
        ("4h", 0.3),
        ("6h", 0.8),
        ("8h", 1.5),
        ("10h", 2.1),
        ("12h", 2.3),
    ]
    .iter()
    .map(|(name, value)| ChartPoint {
        name: name.to_string(),
        x: None,
        y: None,
        value: Some(*value),
        category: None,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volcano_is_deterministic_and_labelled() {
        let a = volcano();
        assert_eq!(a.len(), 100);
        assert_eq!(a, volcano());
        assert_eq!(a[0].name, "Gene_0");
        assert_eq!(a[99].name, "Gene_99");
        for p in &a {
            let x = p.x.unwrap();
            let y = p.y.unwrap();
            assert!((-5.0..=5.0).contains(&x));
            // p < 0.1 means -log10(p) > 1
            assert!(y >= 1.0);
            assert_eq!(round2(x), x);
        }
    }

    #[test]
    fn fixed_samples_have_expected_sizes() {
        assert_eq!(expression().len(), 6);
        assert_eq!(growth().len(), 7);
        assert_eq!(growth()[3].value, Some(0.8));
    }
}
