//! Hemisphere labels and grey matter masks.
//!
//! A mask turns a [`ComponentImage`] into a matrix with one row per component and one column per
//! in-mask voxel. All statistics in this crate work on such matrices.

use ndarray::{Array2, Array3, Axis};

use std::fmt;
use std::path::Path;

use crate::error::{HemisymError, Result};
use crate::fs_mgh::read_mgh;
use crate::image::ComponentImage;


/// The part of the brain a statistic or a decomposition refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    WholeBrain,
    Right,
    Left,
}

impl Hemisphere {

    pub const ALL: [Hemisphere; 3] = [Hemisphere::WholeBrain, Hemisphere::Right, Hemisphere::Left];

    /// The short label used in column and file names: "wb", "R" or "L".
    pub fn label(&self) -> &'static str {
        match self {
            Hemisphere::WholeBrain => "wb",
            Hemisphere::Right => "R",
            Hemisphere::Left => "L",
        }
    }

    /// Whether HPAI is computed for images of this decomposition. Only whole-brain components span both hemispheres.
    pub fn computes_hpai(&self) -> bool {
        matches!(self, Hemisphere::WholeBrain)
    }

    /// The masks under which sparsity and ACNI are computed for images of this decomposition.
    pub fn sparsity_labels(&self) -> &'static [Hemisphere] {
        match self {
            Hemisphere::WholeBrain => &[Hemisphere::Right, Hemisphere::Left, Hemisphere::WholeBrain],
            Hemisphere::Right => &[Hemisphere::Right],
            Hemisphere::Left => &[Hemisphere::Left],
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}


/// A boolean grey matter mask over the spatial axes of a component image.
#[derive(Debug, Clone, PartialEq)]
pub struct HemisphereMask {
    pub hemisphere: Hemisphere,
    pub data: Array3<bool>,
}

impl HemisphereMask {

    pub fn new(hemisphere: Hemisphere, data: Array3<bool>) -> Result<HemisphereMask> {
        if !data.iter().any(|&v| v) {
            return Err(HemisymError::EmptyMask(hemisphere.label().to_string()));
        }
        Ok(HemisphereMask { hemisphere, data })
    }

    /// Read a mask from the first frame of an MGH/MGZ file. Nonzero voxels are in the mask.
    pub fn from_mgh<P: AsRef<Path>>(hemisphere: Hemisphere, path: P) -> Result<HemisphereMask> {
        let mgh = read_mgh(path)?;
        let data = mgh.data.index_axis(Axis(3), 0).mapv(|v| v != 0.0);
        HemisphereMask::new(hemisphere, data)
    }

    /// Number of voxels in the mask.
    pub fn n_voxels(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Extract the in-mask voxels of every component, as a (n_components, n_voxels) matrix.
    pub fn apply(&self, image: &ComponentImage) -> Result<Array2<f64>> {
        if image.spatial_shape()[..] != *self.data.shape() {
            return Err(HemisymError::ShapeMismatch(
                format!("image under '{}' mask", self.hemisphere),
                self.data.shape().to_vec(),
                image.spatial_shape().to_vec(),
            ));
        }
        let n_voxels = self.n_voxels();
        let n_components = image.n_components();
        let mut values : Vec<f64> = Vec::with_capacity(n_components * n_voxels);
        for component in image.data.axis_iter(Axis(3)) {
            values.extend(component.iter().zip(self.data.iter()).filter(|(_, &m)| m).map(|(&v, _)| v));
        }
        Array2::from_shape_vec((n_components, n_voxels), values).map_err(|_| HemisymError::ShapeMismatch(
            String::from("masked voxels"), vec![n_components, n_voxels], vec![]))
    }
}


/// The three grey matter masks, validated to be usable together.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskSet {
    whole_brain: HemisphereMask,
    right: HemisphereMask,
    left: HemisphereMask,
}

impl MaskSet {

    /// Combine the masks. All three must cover the same voxel grid, and the right and left masks must select equally
    /// many voxels, so that per-hemisphere voxel counts are comparable.
    pub fn new(whole_brain: Array3<bool>, right: Array3<bool>, left: Array3<bool>) -> Result<MaskSet> {
        let whole_brain = HemisphereMask::new(Hemisphere::WholeBrain, whole_brain)?;
        let right = HemisphereMask::new(Hemisphere::Right, right)?;
        let left = HemisphereMask::new(Hemisphere::Left, left)?;

        for mask in &[&right, &left] {
            if mask.data.shape() != whole_brain.data.shape() {
                return Err(HemisymError::ShapeMismatch(
                    format!("'{}' mask", mask.hemisphere),
                    whole_brain.data.shape().to_vec(),
                    mask.data.shape().to_vec(),
                ));
            }
        }

        if right.n_voxels() != left.n_voxels() {
            return Err(HemisymError::UnequalHemisphereVoxels(right.n_voxels(), left.n_voxels()));
        }
        Ok(MaskSet { whole_brain, right, left })
    }

    /// Split a whole-brain grey matter mask at the midline of voxel axis 0. With an odd number of slices the middle
    /// slice belongs to neither hemisphere.
    pub fn split_midline(whole_brain: Array3<bool>) -> Result<MaskSet> {
        let nx = whole_brain.len_of(Axis(0));
        let half = nx / 2;
        let mut left = whole_brain.clone();
        let mut right = whole_brain.clone();
        for ((x, _, _), v) in left.indexed_iter_mut() {
            *v = *v && x < half;
        }
        for ((x, _, _), v) in right.indexed_iter_mut() {
            *v = *v && x >= nx - half;
        }
        MaskSet::new(whole_brain, right, left)
    }

    pub fn get(&self, hemisphere: Hemisphere) -> &HemisphereMask {
        match hemisphere {
            Hemisphere::WholeBrain => &self.whole_brain,
            Hemisphere::Right => &self.right,
            Hemisphere::Left => &self.left,
        }
    }

    pub fn spatial_shape(&self) -> &[usize] {
        self.whole_brain.data.shape()
    }

    /// Mask the right and the left hemisphere of an image with the same (left) mask: the right hemisphere is read
    /// from the mirrored image. Both matrices have the same number of columns, so voxel counts are comparable.
    pub fn paired_hemispheres(&self, image: &ComponentImage) -> Result<(Array2<f64>, Array2<f64>)> {
        let right = self.left.apply(&image.flip_lr())?;
        let left = self.left.apply(image)?;
        Ok((right, left))
    }
}
