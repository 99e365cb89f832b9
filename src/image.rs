//! ICA component maps as 4D volumes: three spatial axes plus one component axis.

use ndarray::{Array2, Array3, Array4, ArrayView3, Axis};

use std::path::Path;

use crate::error::{HemisymError, Result};
use crate::fs_mgh::read_mgh;


/// One decomposition result, e.g. the 20 components of a right-hemisphere ICA.
///
/// Voxel axis 0 runs from left to right, so mirroring it swaps the hemispheres.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentImage {
    pub data: Array4<f64>,
}

impl ComponentImage {

    pub fn new(data: Array4<f64>) -> ComponentImage {
        ComponentImage { data }
    }

    /// Build an image from one 3D volume per component.
    pub fn from_components(volumes: &[Array3<f64>]) -> Result<ComponentImage> {
        let first = volumes.first().ok_or_else(|| HemisymError::ShapeMismatch(
            String::from("component volumes"), vec![1], vec![0]))?;
        let (x, y, z) = first.dim();
        let mut data = Array4::zeros((x, y, z, volumes.len()));
        for (idx, volume) in volumes.iter().enumerate() {
            if volume.shape() != first.shape() {
                return Err(HemisymError::ShapeMismatch(
                    format!("component volume {}", idx), first.shape().to_vec(), volume.shape().to_vec()));
            }
            data.index_axis_mut(Axis(3), idx).assign(volume);
        }
        Ok(ComponentImage { data })
    }

    /// Read a component image from an MGH/MGZ file, one frame per component.
    pub fn from_mgh<P: AsRef<Path>>(path: P) -> Result<ComponentImage> {
        let mgh = read_mgh(path)?;
        Ok(ComponentImage { data: mgh.data.mapv(|v| v as f64) })
    }

    pub fn n_components(&self) -> usize {
        self.data.len_of(Axis(3))
    }

    /// The spatial dimensions, without the component axis.
    pub fn spatial_shape(&self) -> [usize; 3] {
        let (x, y, z, _) = self.data.dim();
        [x, y, z]
    }

    /// The volume of a single component.
    pub fn component(&self, idx: usize) -> ArrayView3<f64> {
        self.data.index_axis(Axis(3), idx)
    }

    /// All voxels of every component, unmasked, as a (n_components, n_voxels) matrix.
    pub fn flat_components(&self) -> Array2<f64> {
        let [x, y, z] = self.spatial_shape();
        let mut flat = Array2::zeros((self.n_components(), x * y * z));
        for (mut row, component) in flat.outer_iter_mut().zip(self.data.axis_iter(Axis(3))) {
            for (dst, src) in row.iter_mut().zip(component.iter()) {
                *dst = *src;
            }
        }
        flat
    }

    /// Mirror the image left-right. Right hemisphere voxels end up where left hemisphere voxels were.
    pub fn flip_lr(&self) -> ComponentImage {
        let mut data = self.data.clone();
        data.invert_axis(Axis(0));
        ComponentImage { data }
    }
}
