//! The decomposition and matching backend.
//!
//! Running ICA and matching components is not part of this crate. A backend hands out component images per
//! decomposition and component count, and the score and sign matrices of its matching step.
//! [`DirectoryBackend`] serves results that were computed elsewhere and saved to disk.

use csv::{ReaderBuilder, WriterBuilder};
use ndarray::Array2;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::{HemisymError, Result};
use crate::image::ComponentImage;
use crate::matching::{Decomposition, MatchMatrices};
use crate::util::format_float;


/// Everything a matching run produced for one component count.
#[derive(Debug, Clone, Default)]
pub struct MatchOutput {
    pub images: HashMap<Decomposition, ComponentImage>,
    pub matrices: HashMap<(Decomposition, Decomposition), MatchMatrices>,
}

impl MatchOutput {

    pub fn image(&self, decomposition: Decomposition) -> Result<&ComponentImage> {
        self.images.get(&decomposition).ok_or_else(|| HemisymError::MissingImage(decomposition.label().to_string()))
    }

    pub fn matrices(&self, first: Decomposition, second: Decomposition) -> Result<&MatchMatrices> {
        self.matrices.get(&(first, second))
            .ok_or_else(|| HemisymError::MissingMatch(format!("({}, {})", first, second)))
    }
}


pub trait IcaBackend {
    /// The component image of one decomposition.
    fn components(&self, decomposition: Decomposition, n_components: usize) -> Result<ComponentImage>;

    /// Decompose and match all decompositions against `key`. The output holds the images of the whole-brain,
    /// right, left and unforced right-left decompositions, and score and sign matrices for each pair `(key, other)`.
    fn match_analysis(&self, key: Decomposition, n_components: usize) -> Result<MatchOutput>;
}


const DECOMPOSITIONS: [Decomposition; 4] = [
    Decomposition::WholeBrain,
    Decomposition::Right,
    Decomposition::Left,
    Decomposition::RlUnforced,
];


/// Serves precomputed decompositions from `<root>/<n_components>/`: component images as `<label>.mgz` (or `.mgh`),
/// and matrices as headerless CSV files `scores_<key>_<other>.csv` and `signs_<key>_<other>.csv`.
#[derive(Debug, Clone)]
pub struct DirectoryBackend {
    root: PathBuf,
}

impl DirectoryBackend {

    pub fn new<P: Into<PathBuf>>(root: P) -> DirectoryBackend {
        DirectoryBackend { root: root.into() }
    }

    pub fn dir_for(&self, n_components: usize) -> PathBuf {
        self.root.join(n_components.to_string())
    }

    fn image_path(&self, decomposition: Decomposition, n_components: usize) -> Option<PathBuf> {
        let dir = self.dir_for(n_components);
        ["mgz", "mgh"].iter()
            .map(|ext| dir.join(format!("{}.{}", decomposition.label(), ext)))
            .find(|p| p.is_file())
    }
}

impl IcaBackend for DirectoryBackend {
    fn components(&self, decomposition: Decomposition, n_components: usize) -> Result<ComponentImage> {
        let path = self.image_path(decomposition, n_components)
            .ok_or_else(|| HemisymError::MissingImage(decomposition.label().to_string()))?;
        log::debug!("Loading {} components from {}", decomposition, path.display());
        let image = ComponentImage::from_mgh(&path)?;
        if image.n_components() != n_components {
            return Err(HemisymError::ShapeMismatch(
                format!("components in {}", path.display()), vec![n_components], vec![image.n_components()]));
        }
        Ok(image)
    }

    fn match_analysis(&self, key: Decomposition, n_components: usize) -> Result<MatchOutput> {
        let dir = self.dir_for(n_components);
        let mut output = MatchOutput::default();
        for decomposition in DECOMPOSITIONS.iter() {
            output.images.insert(*decomposition, self.components(*decomposition, n_components)?);
        }
        for other in DECOMPOSITIONS.iter().filter(|d| **d != key) {
            let scores_path = dir.join(format!("scores_{}_{}.csv", key, other));
            if !scores_path.is_file() {
                continue;
            }
            let scores = read_matrix_csv(&scores_path)?;
            let signs = read_matrix_csv(dir.join(format!("signs_{}_{}.csv", key, other)))?;
            output.matrices.insert((key, *other), MatchMatrices::new(scores, signs)?);
        }
        Ok(output)
    }
}


/// Read a numeric matrix from a headerless CSV file, one line per row.
pub fn read_matrix_csv<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(BufReader::new(File::open(path)?));

    let mut values: Vec<f64> = Vec::new();
    let mut n_rows = 0;
    for result in rdr.records() {
        let record = result?;
        for cell in record.iter() {
            values.push(cell.trim().parse::<f64>()
                .map_err(|e| HemisymError::MalformedTable(format!("matrix cell '{}': {}", cell, e)))?);
        }
        n_rows += 1;
    }
    let n_cols = if n_rows == 0 { 0 } else { values.len() / n_rows };
    Array2::from_shape_vec((n_rows, n_cols), values)
        .map_err(|_| HemisymError::MalformedTable(String::from("ragged matrix")))
}


/// Write a numeric matrix as a headerless CSV file.
pub fn write_matrix_csv<P: AsRef<Path>>(path: P, matrix: &Array2<f64>) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(File::create(path)?));
    for row in matrix.outer_iter() {
        wtr.write_record(row.iter().map(|v| format_float(*v)))?;
    }
    wtr.flush()?;
    Ok(())
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::fs_mgh::write_mgh;
    use ndarray::{array, Array4};
    use tempfile::tempdir;

    #[test]
    fn matrices_round_trip_through_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores_wb_R.csv");
        let m = array![[0.5, -1.0], [0.25, 3.0], [1e-7, 0.0]];
        write_matrix_csv(&path, &m).unwrap();
        assert_eq!(read_matrix_csv(&path).unwrap(), m);
    }

    #[test]
    fn directory_backend_serves_images_and_matrices() {
        let dir = tempdir().unwrap();
        let backend = DirectoryBackend::new(dir.path());
        let n_dir = backend.dir_for(2);
        std::fs::create_dir_all(&n_dir).unwrap();

        for label in &["wb", "R", "L", "RL-unforced"] {
            write_mgh(n_dir.join(format!("{}.mgz", label)), &Array4::from_elem((2, 1, 1, 2), 1.0)).unwrap();
        }
        write_matrix_csv(n_dir.join("scores_wb_R.csv"), &array![[0.9, 0.1], [0.2, 0.8]]).unwrap();
        write_matrix_csv(n_dir.join("signs_wb_R.csv"), &array![[1.0, 1.0], [1.0, -1.0]]).unwrap();

        let output = backend.match_analysis(Decomposition::WholeBrain, 2).unwrap();
        assert_eq!(output.images.len(), 4);
        assert_eq!(output.image(Decomposition::RlUnforced).unwrap().n_components(), 2);
        assert_eq!(output.matrices(Decomposition::WholeBrain, Decomposition::Right).unwrap().signs[[1, 1]], -1.0);
        assert!(output.matrices(Decomposition::WholeBrain, Decomposition::Left).is_err());

        assert!(backend.components(Decomposition::WholeBrain, 3).is_err());
    }
}
