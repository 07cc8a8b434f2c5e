//! Gaussian kernel derivation with bilinear tap reduction.
//!
//! A blur of radius `r` needs `2r + 1` texel weights per row. Because the
//! sampler filters linearly, two adjacent off-center texels can be fetched
//! with a single sample placed between them at their weighted average
//! position. [`BlurKernel`] holds the center weight plus the merged taps,
//! one per pair, so a radius-32 row costs 33 fetches instead of 65.

use serde::Serialize;
use std::f64::consts::TAU;

/// Gaussian probability density at `x` for the given mean and variance.
///
/// Evaluated in `f64`: `TAU * variance` stays finite for every finite `f32`
/// variance.
pub fn gaussian(x: f32, mean: f32, variance: f32) -> f32 {
    density(f64::from(x), f64::from(mean), f64::from(variance)) as f32
}

fn density(x: f64, mean: f64, variance: f64) -> f64 {
    let d = x - mean;
    (1.0 / (TAU * variance).sqrt()) * (-(d * d) / (2.0 * variance)).exp()
}

fn row_f64(elements: usize, variance: f32) -> Vec<f64> {
    let span = elements.saturating_sub(1).max(1) as f64;
    (0..elements)
        .map(|i| density(-1.0 + 2.0 * i as f64 / span, 0.0, f64::from(variance)))
        .collect()
}

/// Samples a zero-mean Gaussian at `elements` points spread evenly over `[-1, 1]`.
///
/// The row is not normalized. With a single element the only sample sits at
/// `-1`, which keeps the mapping total; callers wanting a real kernel pass
/// at least three elements.
pub fn gaussian_row(elements: usize, variance: f32) -> Vec<f32> {
    row_f64(elements, variance).into_iter().map(|v| v as f32).collect()
}

/// One merged bilinear tap, applied symmetrically at `center +- offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tap {
    /// Sum of the two texel weights this tap replaces.
    pub weight: f32,
    /// Distance from center in texels, between the two merged texels.
    pub offset: f32,
}

/// Reduced 1D Gaussian kernel: a center weight plus symmetric taps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlurKernel {
    center: f32,
    taps: Vec<Tap>,
}

impl BlurKernel {
    /// Derives the kernel for `radius` texels and Gaussian variance `shape`.
    ///
    /// The normalized row has `2 * radius + 1` entries. Off-center entries
    /// are paired from `radius + 1` outward. When `radius` is odd the last
    /// entry has no partner and becomes a tap of its own at offset `radius`.
    ///
    /// `radius` must be at least 1 and `shape` positive; [`crate::BlurConfig`]
    /// enforces both before any kernel is built.
    pub fn new(radius: usize, shape: f32) -> Self {
        let row = normalized_row(radius, shape);
        let center = radius;

        let taps = (center + 1..row.len())
            .step_by(2)
            .map(|i| {
                let left = row[i];
                let right = row.get(i + 1).copied().unwrap_or(0.0);
                let weight = left + right;
                let near = (i - center) as f32;
                let offset = if weight > 0.0 {
                    (near * left + (near + 1.0) * right) / weight
                } else {
                    near
                };
                Tap { weight, offset }
            })
            .collect();

        Self {
            center: row[center],
            taps,
        }
    }

    /// Weight of the center texel.
    pub fn center(&self) -> f32 {
        self.center
    }

    /// Merged taps ordered by increasing offset.
    pub fn taps(&self) -> &[Tap] {
        &self.taps
    }

    /// Texture fetches per output pixel for one 1D pass.
    pub fn fetch_count(&self) -> usize {
        1 + 2 * self.taps.len()
    }

    /// Total weight over the full symmetric footprint; 1 up to rounding.
    pub fn total_weight(&self) -> f32 {
        self.center + 2.0 * self.taps.iter().map(|t| t.weight).sum::<f32>()
    }
}

/// The `2 * radius + 1` Gaussian row scaled to sum to 1.
///
/// Normalized before narrowing to `f32`, so very wide shapes keep finite
/// weights even when the raw densities are tiny.
pub fn normalized_row(radius: usize, shape: f32) -> Vec<f32> {
    let row = row_f64(2 * radius + 1, shape);
    let sum: f64 = row.iter().sum();
    row.into_iter().map(|v| (v / sum) as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn gaussian_peaks_at_mean() {
        let peak = gaussian(0.3, 0.3, 0.2);
        assert!(peak > gaussian(0.0, 0.3, 0.2));
        assert!(peak > gaussian(0.6, 0.3, 0.2));
    }

    #[test]
    fn gaussian_matches_closed_form_at_origin() {
        let expected = (1.0 / (TAU * 0.5).sqrt()) as f32;
        assert!((gaussian(0.0, 0.0, 0.5) - expected).abs() < EPS);
    }

    #[test]
    fn gaussian_row_spans_minus_one_to_one() {
        let row = gaussian_row(5, 0.2);
        assert_eq!(row.len(), 5);
        assert!((row[0] - gaussian(-1.0, 0.0, 0.2)).abs() < EPS);
        assert!((row[2] - gaussian(0.0, 0.0, 0.2)).abs() < EPS);
        assert!((row[4] - gaussian(1.0, 0.0, 0.2)).abs() < EPS);
    }

    #[test]
    fn gaussian_row_is_symmetric() {
        let row = gaussian_row(9, 0.3);
        for i in 0..4 {
            assert!((row[i] - row[8 - i]).abs() < EPS, "asymmetry at {i}");
        }
    }

    #[test]
    fn normalized_row_sums_to_one() {
        let row = normalized_row(32, 0.2);
        assert_eq!(row.len(), 65);
        let sum: f32 = row.iter().sum();
        assert!((sum - 1.0).abs() < EPS, "sum = {sum}");
    }

    #[test]
    fn even_radius_pairs_every_texel() {
        let kernel = BlurKernel::new(4, 0.2);
        assert_eq!(kernel.taps().len(), 2);
        assert_eq!(kernel.fetch_count(), 5);
        let row = normalized_row(4, 0.2);
        assert!((kernel.center() - row[4]).abs() < EPS);
        assert!((kernel.taps()[0].weight - (row[5] + row[6])).abs() < EPS);
        assert!((kernel.taps()[1].weight - (row[7] + row[8])).abs() < EPS);
    }

    #[test]
    fn tap_offset_is_weighted_average_of_pair() {
        let kernel = BlurKernel::new(2, 0.2);
        let row = normalized_row(2, 0.2);
        let expected = (row[3] + 2.0 * row[4]) / (row[3] + row[4]);
        assert!((kernel.taps()[0].offset - expected).abs() < EPS);
        assert!(kernel.taps()[0].offset > 1.0 && kernel.taps()[0].offset < 2.0);
    }

    #[test]
    fn odd_radius_keeps_unpaired_outer_texel() {
        let kernel = BlurKernel::new(3, 0.2);
        let row = normalized_row(3, 0.2);
        assert_eq!(kernel.taps().len(), 2);
        let last = kernel.taps()[1];
        assert!((last.weight - row[6]).abs() < EPS);
        assert!((last.offset - 3.0).abs() < EPS);
        assert!((kernel.total_weight() - 1.0).abs() < EPS);
    }

    #[test]
    fn radius_one_is_a_single_unpaired_tap() {
        let kernel = BlurKernel::new(1, 0.2);
        assert_eq!(kernel.taps().len(), 1);
        assert!((kernel.taps()[0].offset - 1.0).abs() < EPS);
        assert!((kernel.total_weight() - 1.0).abs() < EPS);
    }

    #[test]
    fn default_kernel_has_sixteen_taps() {
        let kernel = BlurKernel::new(32, 0.2);
        assert_eq!(kernel.taps().len(), 16);
        assert_eq!(kernel.fetch_count(), 33);
    }

    #[test]
    fn huge_shape_flattens_to_a_box_instead_of_nan() {
        for shape in [1e38, f32::MAX] {
            let kernel = BlurKernel::new(4, shape);
            assert!((kernel.center() - 1.0 / 9.0).abs() < EPS, "center {}", kernel.center());
            for tap in kernel.taps() {
                assert!(tap.weight.is_finite() && tap.offset.is_finite(), "{tap:?}");
            }
            assert!((kernel.total_weight() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn tiny_shape_keeps_weight_on_the_center() {
        let kernel = BlurKernel::new(8, 1e-30);
        assert!((kernel.center() - 1.0).abs() < EPS, "center {}", kernel.center());
        assert!((kernel.total_weight() - 1.0).abs() < EPS);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalized_row_always_sums_to_one(radius in 1_usize..=64, shape in 0.01_f32..=4.0) {
                let sum: f32 = normalized_row(radius, shape).iter().sum();
                prop_assert!((sum - 1.0).abs() < 1e-4, "sum = {sum}");
            }

            #[test]
            fn reduced_weights_cover_the_full_row(radius in 1_usize..=64, shape in 0.01_f32..=4.0) {
                let total = BlurKernel::new(radius, shape).total_weight();
                prop_assert!((total - 1.0).abs() < 1e-4, "total = {total}");
            }

            #[test]
            fn offsets_are_positive_and_strictly_increasing(radius in 1_usize..=64, shape in 0.01_f32..=4.0) {
                let kernel = BlurKernel::new(radius, shape);
                let mut previous = 0.0_f32;
                for tap in kernel.taps() {
                    prop_assert!(tap.offset > previous, "{} !> {previous}", tap.offset);
                    previous = tap.offset;
                }
            }

            #[test]
            fn tap_count_is_half_the_radius_rounded_up(radius in 1_usize..=64) {
                let kernel = BlurKernel::new(radius, 0.2);
                prop_assert_eq!(kernel.taps().len(), radius.div_ceil(2));
            }
        }
    }
}
