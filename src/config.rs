//! Settings of a symmetry analysis run.

use std::path::PathBuf;

use crate::sss::Scoring;


/// Percentiles, scoring and output settings for [`SymmetryAnalysis`](crate::summary::SymmetryAnalysis).
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Name of the dataset the components were computed on. Part of the output path.
    pub dataset: String,
    /// Root directory for persisted summaries.
    pub out_dir: PathBuf,
    /// Percentile of absolute nonzero voxel values used for the shared voxel-count sparsity threshold.
    pub global_percentile: f64,
    pub acni_percentile: f64,
    pub hpai_percentile: f64,
    pub scoring: Scoring,
    /// Recompute summaries even if persisted ones exist.
    pub force: bool,
}


impl Default for AnalysisConfig {
    fn default() -> AnalysisConfig {
        AnalysisConfig {
            dataset: String::from("neurovault"),
            out_dir: PathBuf::from("ica_imgs"),
            global_percentile: 99.9,
            acni_percentile: 95.0,
            hpai_percentile: 95.0,
            scoring: Scoring::Correlation,
            force: false,
        }
    }
}


impl AnalysisConfig {

    /// Directory holding the summaries across all component counts: `<out_dir>/<dataset>/analyses`.
    pub fn analyses_dir(&self) -> PathBuf {
        self.out_dir.join(&self.dataset).join("analyses")
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config_uses_the_usual_percentiles() {
        let config = AnalysisConfig::default();
        assert_eq!(config.global_percentile, 99.9);
        assert_eq!(config.acni_percentile, 95.0);
        assert_eq!(config.hpai_percentile, 95.0);
        assert_eq!(config.analyses_dir(), PathBuf::from("ica_imgs/neurovault/analyses"));
    }
}
