//! Anti-Correlated Network Index (ACNI).
//!
//! The ACNI of a component is the proportion of strongly negative voxels among all strongly active voxels, where
//! "strongly" means beyond a per-component percentile of the absolute values. A value close to 0.5 indicates a
//! strong anti-correlated network (positive and negative activation equally balanced), a value close to 0 almost none.

use ndarray::{Array1, Array2};

use crate::error::Result;
use crate::image::ComponentImage;
use crate::mask::{Hemisphere, MaskSet};
use crate::threshold::{abs_percentile, count_beyond, Sign, ThresholdScope, VoxelSelection};


/// Compute the ACNI from an already masked (n_components, n_voxels) matrix.
///
/// Components without any voxel above their threshold get `NaN`: such a component is degenerate, and reporting 0
/// would claim it has no anti-correlated network at all.
pub fn acni_from_masked(masked: &Array2<f64>, percentile: f64) -> Result<Array1<f64>> {
    let thresholds = abs_percentile(masked, percentile, ThresholdScope::PerComponent, VoxelSelection::All)?;
    let neg_voxels = count_beyond(masked, &thresholds, Sign::Neg);
    let abs_voxels = count_beyond(masked, &thresholds, Sign::Abs);

    let acni: Array1<f64> = neg_voxels.iter()
        .zip(abs_voxels.iter())
        .map(|(&neg, &abs)| neg as f64 / abs as f64)
        .collect();

    let degenerate = acni.iter().filter(|v| v.is_nan()).count();
    if degenerate > 0 {
        log::warn!("ACNI undefined for {} of {} components: no voxel above the {}th percentile", degenerate, acni.len(), percentile);
    }
    Ok(acni)
}


/// Calculate the ACNI of every component of `image` within the grey matter of `hemisphere`.
pub fn calculate_acni(image: &ComponentImage, masks: &MaskSet, hemisphere: Hemisphere, percentile: f64) -> Result<Array1<f64>> {
    let masked = masks.get(hemisphere).apply(image)?;
    acni_from_masked(&masked, percentile)
}


#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array, Array3};

    #[test]
    fn balanced_extreme_voxels_give_one_half() {
        // 20 voxels, the top 10% in magnitude are one positive and one negative voxel.
        let mut values: Vec<f64> = (1..=18).map(|v| v as f64).collect();
        values.push(19.0);
        values.push(-20.0);
        let masked = Array2::from_shape_vec((1, 20), values).unwrap();

        let acni = acni_from_masked(&masked, 90.0).unwrap();
        assert_abs_diff_eq!(acni[0], 0.5);
    }

    #[test]
    fn half_negative_voxels_above_the_95th_percentile_give_one_half() {
        // 200 voxels with magnitudes 1 to 200. The 95th percentile lies between 190 and 191, so the ten largest
        // magnitudes are above it, and every other one of those is negative.
        let values: Vec<f64> = (1..=200)
            .map(|v| if v > 190 && v % 2 == 1 { -(v as f64) } else { v as f64 })
            .collect();
        let masked = Array2::from_shape_vec((1, 200), values).unwrap();

        let thresholds = abs_percentile(&masked, 95.0, ThresholdScope::PerComponent, VoxelSelection::All).unwrap();
        assert_eq!(count_beyond(&masked, &thresholds, Sign::Abs)[0], 10);
        assert_eq!(count_beyond(&masked, &thresholds, Sign::Neg)[0], 5);

        let acni = acni_from_masked(&masked, 95.0).unwrap();
        assert_abs_diff_eq!(acni, array![0.5]);
    }

    #[test]
    fn acni_stays_within_unit_interval() {
        let masked = array![
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            [-1.0, -2.0, -3.0, -4.0, -5.0, -6.0],
            [1.0, -2.0, 3.0, -4.0, 5.0, -6.0],
        ];
        let acni = acni_from_masked(&masked, 50.0).unwrap();

        assert_abs_diff_eq!(acni, array![0.0, 1.0, 2.0 / 3.0], epsilon = 1e-12);
        assert!(acni.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn component_without_suprathreshold_voxels_is_nan() {
        let masked = array![[1.0, 1.0, 1.0, 1.0], [0.0, 1.0, 2.0, -3.0]];
        let acni = acni_from_masked(&masked, 95.0).unwrap();
        assert!(acni[0].is_nan());
        assert!(!acni[1].is_nan());
    }

    #[test]
    fn acni_is_computed_under_the_hemisphere_mask() {
        let masks = MaskSet::split_midline(Array3::from_elem((4, 5, 1), true)).unwrap();
        // Negative voxels on the left, positive ones on the right.
        let img = ComponentImage::new(Array::from_shape_fn((4, 5, 1, 1), |(x, y, _, _)| {
            let v = (1 + y + 5 * (x % 2)) as f64;
            if x < 2 { -v } else { v }
        }));

        let left = calculate_acni(&img, &masks, Hemisphere::Left, 50.0).unwrap();
        let right = calculate_acni(&img, &masks, Hemisphere::Right, 50.0).unwrap();
        assert_abs_diff_eq!(left[0], 1.0);
        assert_abs_diff_eq!(right[0], 0.0);
    }
}
