use ndarray_stats::errors::QuantileError;
use quick_error::quick_error;
use std::io::Error as IOError;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum HemisymError {
        /// Invalid MGH file: wrong format version.
        InvalidMghFormat {
            display("Invalid FreeSurfer MGH file")
        }

        UnsupportedMghDatatype(code: i32) {
            display("Unsupported MGH data type code {}", code)
        }

        /// Two arrays that must line up do not.
        ShapeMismatch(what: String, expected: Vec<usize>, found: Vec<usize>) {
            display("Shape mismatch for {}: expected {:?}, found {:?}", what, expected, found)
        }

        EmptyMask(label: String) {
            display("Grey matter mask '{}' selects no voxels", label)
        }

        /// The right and left masks select different numbers of voxels.
        UnequalHemisphereVoxels(right: usize, left: usize) {
            display("Hemisphere voxel counts differ: right {}, left {}", right, left)
        }

        InvalidPercentile(p: f64) {
            display("Percentile must lie in [0, 100], got {}", p)
        }

        /// A component has no nonzero voxel, so its percentile is undefined.
        NoNonzeroVoxels(image: usize, component: usize) {
            display("Component {} of image {} has no nonzero voxels", component, image)
        }

        Quantile(err: QuantileError) {
            from()
            display("Percentile computation failed: {}", err)
        }

        MissingImage(label: String) {
            display("Decomposition backend returned no '{}' image", label)
        }

        MissingMatch(pair: String) {
            display("Decomposition backend returned no match matrices for {}", pair)
        }

        MalformedTable(msg: String) {
            display("Malformed summary table: {}", msg)
        }

        NoComponentCounts {
            display("No component counts requested")
        }

        Csv(err: csv::Error) {
            from()
            source(err)
        }

        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, HemisymError>;
