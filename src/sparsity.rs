//! Sparsity of component maps, per hemisphere.
//!
//! Sparsity is measured two ways: as the L1 norm of each component's voxel vector (`l1`), and as the number of
//! voxels beyond a fixed activation threshold (`vc`), separately for the positive side, the negative side and the
//! absolute values. A sharper contrast (higher vc-sparsity) in half-brain components than in whole-brain components
//! points to lateralized organization that the whole-brain decomposition masks.

use ndarray::{Array1, Array2};

use std::fmt;

use crate::error::Result;
use crate::image::ComponentImage;
use crate::mask::{Hemisphere, MaskSet};
use crate::threshold::{count_beyond, Sign};


/// The kinds of sparsity in a [`SparsityRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SparsityKind {
    L1,
    VoxelCount(Sign),
}

impl SparsityKind {

    pub const ALL: [SparsityKind; 4] = [
        SparsityKind::L1,
        SparsityKind::VoxelCount(Sign::Pos),
        SparsityKind::VoxelCount(Sign::Neg),
        SparsityKind::VoxelCount(Sign::Abs),
    ];

    /// The column prefix: "l1", "vc-pos", "vc-neg" or "vc-abs".
    pub fn label(&self) -> String {
        match self {
            SparsityKind::L1 => String::from("l1"),
            SparsityKind::VoxelCount(sign) => format!("vc-{}", sign),
        }
    }
}

impl fmt::Display for SparsityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}


/// Sparsity values for all components of one image under one hemisphere mask.
#[derive(Debug, Clone, PartialEq)]
pub struct SparsityRecord {
    pub hemisphere: Hemisphere,
    pub l1: Array1<f64>,
    pub vc_pos: Array1<usize>,
    pub vc_neg: Array1<usize>,
    pub vc_abs: Array1<usize>,
}

impl SparsityRecord {

    /// Compute sparsity from an already masked (n_components, n_voxels) matrix.
    pub fn from_masked(hemisphere: Hemisphere, masked: &Array2<f64>, threshold: f64) -> SparsityRecord {
        let thresholds = Array1::from_elem(masked.nrows(), threshold);
        SparsityRecord {
            hemisphere,
            l1: masked.outer_iter().map(|row| row.iter().map(|v| v.abs()).sum::<f64>()).collect(),
            vc_pos: count_beyond(masked, &thresholds, Sign::Pos),
            vc_neg: count_beyond(masked, &thresholds, Sign::Neg),
            vc_abs: count_beyond(masked, &thresholds, Sign::Abs),
        }
    }

    /// The voxel counts for one side of the activation.
    pub fn voxel_count(&self, sign: Sign) -> &Array1<usize> {
        match sign {
            Sign::Pos => &self.vc_pos,
            Sign::Neg => &self.vc_neg,
            Sign::Abs => &self.vc_abs,
        }
    }

    pub fn n_components(&self) -> usize {
        self.l1.len()
    }
}


/// Calculate the sparsity of every component of `image` within the grey matter of `hemisphere`.
///
/// The image values are assumed to be normalized to a common scale, e.g. by using a threshold from
/// [`global_sparsity_threshold`](crate::threshold::global_sparsity_threshold) for all images that are compared.
pub fn hemisphere_sparsity(image: &ComponentImage, masks: &MaskSet, hemisphere: Hemisphere, threshold: f64) -> Result<SparsityRecord> {
    let masked = masks.get(hemisphere).apply(image)?;
    Ok(SparsityRecord::from_masked(hemisphere, &masked, threshold))
}


#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array, Array3};

    #[test]
    fn sparsity_is_computed_per_component() {
        let masked = array![[1.0, -2.0, 0.5, 0.0], [-0.2, -0.3, 3.0, 4.0]];
        let rec = SparsityRecord::from_masked(Hemisphere::WholeBrain, &masked, 0.75);

        assert_abs_diff_eq!(rec.l1, array![3.5, 7.5]);
        assert_eq!(rec.vc_pos, array![1usize, 2]);
        assert_eq!(rec.vc_neg, array![1usize, 0]);
        assert_eq!(rec.vc_abs, array![2usize, 2]);
        assert_eq!(rec.voxel_count(Sign::Neg), &rec.vc_neg);
    }

    #[test]
    fn sparsity_only_sees_the_requested_hemisphere() {
        let masks = MaskSet::split_midline(Array3::from_elem((4, 2, 1), true)).unwrap();
        // Left hemisphere is silent, right hemisphere active.
        let img = ComponentImage::new(Array::from_shape_fn((4, 2, 1, 1), |(x, _, _, _)| if x >= 2 { 2.0 } else { 0.0 }));

        let right = hemisphere_sparsity(&img, &masks, Hemisphere::Right, 1.0).unwrap();
        let left = hemisphere_sparsity(&img, &masks, Hemisphere::Left, 1.0).unwrap();
        let wb = hemisphere_sparsity(&img, &masks, Hemisphere::WholeBrain, 1.0).unwrap();

        assert_eq!(right.vc_abs[0], 4);
        assert_eq!(left.vc_abs[0], 0);
        assert_eq!(wb.vc_pos[0], 4);
        assert_abs_diff_eq!(wb.l1[0], 8.0);
    }

    #[test]
    fn kinds_are_labelled_like_the_summary_columns() {
        let labels: Vec<String> = SparsityKind::ALL.iter().map(|k| k.label()).collect();
        assert_eq!(labels, vec!["l1", "vc-pos", "vc-neg", "vc-abs"]);
    }
}
