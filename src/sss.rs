//! Spatial Symmetry Score (SSS): how similar the right half of a component map is to its mirrored left half.

use ndarray::{Array1, ArrayView1};

use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::image::ComponentImage;
use crate::mask::MaskSet;


/// How two voxel vectors are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scoring {
    /// Pearson correlation. 1 for a perfectly symmetric component.
    Correlation,
    /// L1 norm of the difference. 0 for a perfectly symmetric component.
    L1Norm,
    /// L2 norm of the difference. 0 for a perfectly symmetric component.
    L2Norm,
}

impl Scoring {

    pub fn label(&self) -> &'static str {
        match self {
            Scoring::Correlation => "correlation",
            Scoring::L1Norm => "l1norm",
            Scoring::L2Norm => "l2norm",
        }
    }

    /// Whether a higher score means more similar. False for the norms, which are distances.
    pub fn higher_is_better(&self) -> bool {
        matches!(self, Scoring::Correlation)
    }

    /// Score a pair of equally long voxel vectors.
    pub fn score(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self {
            Scoring::Correlation => pearson(a, b),
            Scoring::L1Norm => a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum(),
            Scoring::L2Norm => a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt(),
        }
    }
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Scoring {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Scoring, String> {
        match s {
            "correlation" => Ok(Scoring::Correlation),
            "l1norm" => Ok(Scoring::L1Norm),
            "l2norm" => Ok(Scoring::L2Norm),
            other => Err(format!("Unknown scoring method '{}'", other)),
        }
    }
}


/// Pearson correlation of two vectors, `NaN` if either is constant.
fn pearson(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let (mean_a, mean_b) = match (a.mean(), b.mean()) {
        (Some(ma), Some(mb)) => (ma, mb),
        _ => return f64::NAN,
    };
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    cov / (var_a * var_b).sqrt()
}


/// Calculate the SSS of each component: the right hemisphere (read from the mirrored image) is compared with the left
/// hemisphere, both under the left grey matter mask.
pub fn spatial_symmetry_score(image: &ComponentImage, masks: &MaskSet, scoring: Scoring) -> Result<Array1<f64>> {
    let (right, left) = masks.paired_hemispheres(image)?;
    Ok(right.outer_iter()
        .zip(left.outer_iter())
        .map(|(r, l)| scoring.score(r, l))
        .collect())
}


#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array, Array3};

    #[test]
    fn mirror_symmetric_component_is_perfectly_correlated() {
        let masks = MaskSet::split_midline(Array3::from_elem((4, 3, 1), true)).unwrap();
        let img = ComponentImage::new(Array::from_shape_fn((4, 3, 1, 2), |(x, y, _, c)| {
            let mirrored = if x < 2 { x } else { 3 - x };
            if c == 0 { (mirrored * 3 + y) as f64 } else if x < 2 { (x * 3 + y) as f64 } else { -((3 - x) as f64 * 3.0 + y as f64) }
        }));

        let sss = spatial_symmetry_score(&img, &masks, Scoring::Correlation).unwrap();
        assert_abs_diff_eq!(sss[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sss[1], -1.0, epsilon = 1e-12);

        let l1 = spatial_symmetry_score(&img, &masks, Scoring::L1Norm).unwrap();
        assert_abs_diff_eq!(l1[0], 0.0);
    }

    #[test]
    fn distance_scores() {
        let a = array![1.0, 2.0, 3.0];
        let b = array![1.0, 0.0, 7.0];
        assert_abs_diff_eq!(Scoring::L1Norm.score(a.view(), b.view()), 6.0);
        assert_abs_diff_eq!(Scoring::L2Norm.score(a.view(), b.view()), 20f64.sqrt());
        assert!(Scoring::Correlation.score(a.view(), array![2.0, 2.0, 2.0].view()).is_nan());
    }

    #[test]
    fn scoring_names_parse() {
        assert_eq!("l2norm".parse::<Scoring>().unwrap(), Scoring::L2Norm);
        assert!("cosine".parse::<Scoring>().is_err());
        assert!(Scoring::Correlation.higher_is_better());
        assert!(!Scoring::L1Norm.higher_is_better());
    }
}
