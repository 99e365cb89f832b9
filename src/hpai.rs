//! Hemispheric Participation Asymmetry Index (HPAI) of whole-brain components.
//!
//! Voxels whose magnitude exceeds a per-component percentile over the whole-brain mask are counted in each
//! hemisphere, and `(R - L) / (R + L)` is reported: +1 for activation entirely in the right hemisphere, -1 entirely
//! in the left, 0 for a symmetric component. Both hemispheres are read through the left grey matter mask (the right
//! one from the mirrored image) so that both counts have the same number of candidate voxels.

use ndarray::Array1;

use crate::error::Result;
use crate::image::ComponentImage;
use crate::mask::{Hemisphere, MaskSet};
use crate::threshold::{abs_percentile, count_beyond, Sign, ThresholdScope, VoxelSelection};


/// HPAI values for the positive side, the negative side, and the absolute values of each component.
#[derive(Debug, Clone, PartialEq)]
pub struct HpaiRecord {
    pub pos: Array1<f64>,
    pub neg: Array1<f64>,
    pub abs: Array1<f64>,
}

impl HpaiRecord {

    pub fn get(&self, sign: Sign) -> &Array1<f64> {
        match sign {
            Sign::Pos => &self.pos,
            Sign::Neg => &self.neg,
            Sign::Abs => &self.abs,
        }
    }
}


/// The asymmetry ratio for a pair of voxel counts. `NaN` when neither hemisphere has a voxel above threshold.
pub fn asymmetry_index(right: usize, left: usize) -> f64 {
    (right as f64 - left as f64) / (right + left) as f64
}


/// Calculate HPAI for each component of a whole-brain image.
pub fn calculate_hpai(wb_image: &ComponentImage, masks: &MaskSet, percentile: f64) -> Result<HpaiRecord> {
    let wb_masked = masks.get(Hemisphere::WholeBrain).apply(wb_image)?;
    let thresholds = abs_percentile(&wb_masked, percentile, ThresholdScope::PerComponent, VoxelSelection::All)?;

    let (masked_r, masked_l) = masks.paired_hemispheres(wb_image)?;

    let index_for = |sign: Sign| -> Array1<f64> {
        let voxels_r = count_beyond(&masked_r, &thresholds, sign);
        let voxels_l = count_beyond(&masked_l, &thresholds, sign);
        let hpai: Array1<f64> = voxels_r.iter()
            .zip(voxels_l.iter())
            .map(|(&r, &l)| asymmetry_index(r, l))
            .collect();
        let degenerate = hpai.iter().filter(|v| v.is_nan()).count();
        if degenerate > 0 {
            log::debug!("{} HPAI undefined for {} of {} components", sign, degenerate, hpai.len());
        }
        hpai
    };

    Ok(HpaiRecord {
        pos: index_for(Sign::Pos),
        neg: index_for(Sign::Neg),
        abs: index_for(Sign::Abs),
    })
}


#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array, Array3, Array4};

    /// Component 0 is mirror symmetric, component 1 is active in the right hemisphere only.
    fn lateralized_image() -> ComponentImage {
        let mut data = Array4::zeros((4, 2, 4, 2));
        for ((x, y, z, c), v) in data.indexed_iter_mut() {
            *v = if c == 0 {
                let distance_from_midline = if x == 0 || x == 3 { 1 } else { 0 };
                (1 + y * 4 + z + 10 * distance_from_midline) as f64
            } else if x >= 2 {
                (1 + x * 8 + y * 4 + z) as f64
            } else {
                0.0
            };
        }
        ComponentImage::new(data)
    }

    #[test]
    fn symmetric_and_right_lateralized_components() {
        let masks = MaskSet::split_midline(Array3::from_elem((4, 2, 4), true)).unwrap();
        let hpai = calculate_hpai(&lateralized_image(), &masks, 95.0).unwrap();

        assert_abs_diff_eq!(hpai.get(Sign::Abs)[0], 0.0);
        assert_abs_diff_eq!(hpai.get(Sign::Abs)[1], 1.0);
        assert_abs_diff_eq!(hpai.pos[1], 1.0);
        // Neither component has negative voxels.
        assert!(hpai.neg[0].is_nan());
    }

    #[test]
    fn flipping_the_image_flips_the_sign_of_hpai() {
        let masks = MaskSet::split_midline(Array3::from_elem((4, 2, 4), true)).unwrap();
        let hpai = calculate_hpai(&lateralized_image().flip_lr(), &masks, 95.0).unwrap();
        assert_abs_diff_eq!(hpai.abs[1], -1.0);
    }

    #[test]
    fn hpai_stays_within_bounds() {
        let masks = MaskSet::split_midline(Array3::from_elem((6, 3, 2), true)).unwrap();
        let img = ComponentImage::new(Array::from_shape_fn((6, 3, 2, 3), |(x, y, z, c)| {
            ((x * 13 + y * 7 + z * 3 + c * 5) % 11) as f64 - 5.0
        }));
        let hpai = calculate_hpai(&img, &masks, 80.0).unwrap();
        for sign in Sign::ALL.iter() {
            assert!(hpai.get(*sign).iter().filter(|v| !v.is_nan()).all(|v| (-1.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn asymmetry_index_limits() {
        assert_abs_diff_eq!(asymmetry_index(5, 5), 0.0);
        assert_abs_diff_eq!(asymmetry_index(3, 0), 1.0);
        assert_abs_diff_eq!(asymmetry_index(0, 3), -1.0);
        assert!(asymmetry_index(0, 0).is_nan());
    }
}
