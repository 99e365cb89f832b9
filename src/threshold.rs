//! Percentile thresholds on absolute voxel values, and voxel counts beyond them.
//!
//! Sparsity, ACNI and HPAI all threshold component maps at a percentile of their absolute values, but over different
//! scopes: the sparsity threshold is shared by all components of all compared images, while ACNI and HPAI use one
//! threshold per component. The scope is an explicit parameter here so that every statistic uses the same
//! percentile definition (linear interpolation between the closest ranks).

use ndarray::{Array1, Array2, ArrayView1, Axis};
use ndarray_stats::interpolate::Linear;
use ndarray_stats::QuantileExt;
use noisy_float::types::n64;

use std::fmt;

use crate::error::{HemisymError, Result};
use crate::image::ComponentImage;


/// Over which voxels a threshold is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdScope {
    /// Every component gets its own threshold.
    PerComponent,
    /// All components share the smallest of their per-component thresholds.
    MinimumAcrossComponents,
}

/// Which voxels enter the percentile computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoxelSelection {
    All,
    /// Only voxels with a nonzero value. Components without any are an error.
    NonZero,
}


/// The side of the activation that is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Pos,
    Neg,
    Abs,
}

impl Sign {

    pub const ALL: [Sign; 3] = [Sign::Pos, Sign::Neg, Sign::Abs];

    pub fn label(&self) -> &'static str {
        match self {
            Sign::Pos => "pos",
            Sign::Neg => "neg",
            Sign::Abs => "abs",
        }
    }

    /// Whether a voxel value lies beyond the (positive) threshold on this side.
    pub fn exceeds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Sign::Pos => value > threshold,
            Sign::Neg => value < -threshold,
            Sign::Abs => value.abs() > threshold,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}


fn check_percentile(percentile: f64) -> Result<()> {
    if (0.0..=100.0).contains(&percentile) {
        Ok(())
    } else {
        Err(HemisymError::InvalidPercentile(percentile))
    }
}


/// Compute the `percentile` (0 to 100) of the absolute values in each row of `masked`, a (n_components, n_voxels)
/// matrix. Returns one threshold per component; with [`ThresholdScope::MinimumAcrossComponents`] all entries are equal.
///
/// # Errors
///
/// `InvalidPercentile` for percentiles outside [0, 100], and `NoNonzeroVoxels` (reported as image 0) when a row has
/// no voxel left after applying `selection`.
pub fn abs_percentile(masked: &Array2<f64>, percentile: f64, scope: ThresholdScope, selection: VoxelSelection) -> Result<Array1<f64>> {
    check_percentile(percentile)?;
    let q = n64(percentile / 100.0);

    let mut thresholds : Vec<f64> = Vec::with_capacity(masked.nrows());
    for (component, row) in masked.outer_iter().enumerate() {
        let mut values: Array1<f64> = row.iter()
            .map(|v| v.abs())
            .filter(|v| selection == VoxelSelection::All || *v != 0.0)
            .collect();
        if values.is_empty() {
            return Err(HemisymError::NoNonzeroVoxels(0, component));
        }
        let thr = values.quantile_axis_skipnan_mut(Axis(0), q, &Linear)?;
        thresholds.push(thr[()]);
    }

    match scope {
        ThresholdScope::PerComponent => Ok(Array1::from(thresholds)),
        ThresholdScope::MinimumAcrossComponents => {
            let min = thresholds.iter().cloned().fold(f64::INFINITY, f64::min);
            Ok(Array1::from_elem(thresholds.len(), min))
        }
    }
}


/// Derive one voxel-count sparsity threshold that is usable across all `images`.
///
/// For every component of every image, the `percentile` of the absolute nonzero voxel values is computed. The
/// minimum over the components of an image, and then over the images, is returned. This keeps a single image with a
/// large intensity scale from dominating the comparison.
pub fn global_sparsity_threshold(images: &[ComponentImage], percentile: f64) -> Result<f64> {
    if images.is_empty() {
        return Err(HemisymError::ShapeMismatch(String::from("images"), vec![1], vec![0]));
    }
    let mut thr = f64::INFINITY;
    for (image_idx, image) in images.iter().enumerate() {
        let per_image = abs_percentile(&image.flat_components(), percentile,
                                       ThresholdScope::MinimumAcrossComponents, VoxelSelection::NonZero)
            .map_err(|e| match e {
                HemisymError::NoNonzeroVoxels(_, component) => HemisymError::NoNonzeroVoxels(image_idx, component),
                other => other,
            })?;
        let image_thr = per_image.first().ok_or_else(|| HemisymError::ShapeMismatch(
            format!("components of image {}", image_idx), vec![1], vec![0]))?;
        thr = thr.min(*image_thr);
    }
    Ok(thr)
}


/// Count, per component, the voxels beyond the component's threshold on the given side.
pub fn count_beyond(masked: &Array2<f64>, thresholds: &Array1<f64>, sign: Sign) -> Array1<usize> {
    masked.outer_iter()
        .zip(thresholds.iter())
        .map(|(row, &thr)| count_row(row, thr, sign))
        .collect()
}

fn count_row(row: ArrayView1<f64>, threshold: f64, sign: Sign) -> usize {
    row.iter().filter(|&&v| sign.exceeds(v, threshold)).count()
}
