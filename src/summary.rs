//! Assembling the per-component summary tables, and the master tables across component counts.
//!
//! For one component count, the whole-brain (WB), right (R) and left (L) component images are obtained from the
//! backend. Each gets sparsity and ACNI columns for the hemispheres its decomposition covers. The WB table
//! additionally gets HPAI, the spatial symmetry score of the WB components and of their best-matching RL
//! components, and the matching results against the R, L and unforced RL decompositions.

use ndarray::Array1;

use std::path::Path;

use crate::acni::calculate_acni;
use crate::backend::{IcaBackend, MatchOutput};
use crate::config::AnalysisConfig;
use crate::error::{HemisymError, Result};
use crate::hpai::calculate_hpai;
use crate::image::ComponentImage;
use crate::mask::{Hemisphere, MaskSet};
use crate::matching::{summarize_matches, BestMatch, Decomposition, PairMatcher};
use crate::sparsity::{hemisphere_sparsity, SparsityKind, SparsityRecord};
use crate::sss::spatial_symmetry_score;
use crate::store::{CacheLookup, SummaryKey, SummarySet, SummaryStore};
use crate::table::SummaryTable;
use crate::threshold::{global_sparsity_threshold, Sign};


/// Decompositions whose matches against the whole-brain decomposition are summarized.
const COMPARISONS: [Decomposition; 3] = [Decomposition::Right, Decomposition::Left, Decomposition::RlUnforced];


/// The summary tables of all component counts, concatenated.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterTables {
    pub wb: SummaryTable,
    pub right: SummaryTable,
    pub left: SummaryTable,
}

impl MasterTables {

    /// Write `wb_master_summary.csv`, `R_master_summary.csv` and `L_master_summary.csv` to `dir`.
    pub fn write_csv<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        for (hemisphere, table) in [(Hemisphere::WholeBrain, &self.wb), (Hemisphere::Right, &self.right), (Hemisphere::Left, &self.left)].iter() {
            table.to_file(dir.join(format!("{}_master_summary.csv", hemisphere.label())))?;
        }
        Ok(())
    }
}


/// Concatenate per-count summary sets row-wise, in the order given. Every table must hold one row per component of
/// its decomposition, so the master tables have as many rows as the component counts sum up to.
pub fn concatenate_summaries(summaries: &[SummarySet]) -> Result<MasterTables> {
    if summaries.is_empty() {
        return Err(HemisymError::NoComponentCounts);
    }
    let mut tables: [Vec<SummaryTable>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for set in summaries {
        for (idx, hemisphere) in Hemisphere::ALL.iter().enumerate() {
            let table = set.get(*hemisphere);
            table.validate_n_comp()?;
            tables[idx].push(table.clone());
        }
    }
    Ok(MasterTables {
        wb: SummaryTable::concat(&tables[0])?,
        right: SummaryTable::concat(&tables[1])?,
        left: SummaryTable::concat(&tables[2])?,
    })
}


fn counts(values: &Array1<usize>) -> Vec<i64> {
    values.iter().map(|&v| v as i64).collect()
}


/// Add the sparsity, ACNI and (for whole-brain images) HPAI columns of one decomposition's image to its table.
fn add_hemisphere_columns(table: &mut SummaryTable, image: &ComponentImage, decomposition: Hemisphere, masks: &MaskSet,
                          config: &AnalysisConfig, sparsity_threshold: f64) -> Result<()> {
    let labels = decomposition.sparsity_labels();

    let records = labels.iter()
        .map(|label| hemisphere_sparsity(image, masks, *label, sparsity_threshold))
        .collect::<Result<Vec<SparsityRecord>>>()?;
    for kind in SparsityKind::ALL.iter() {
        for record in records.iter() {
            let name = format!("{}_{}", kind, record.hemisphere);
            match kind {
                SparsityKind::L1 => table.set_column(&name, record.l1.to_vec())?,
                SparsityKind::VoxelCount(sign) => table.set_column(&name, counts(record.voxel_count(*sign)))?,
            }
        }
    }

    for label in labels {
        let acni = calculate_acni(image, masks, *label, config.acni_percentile)?;
        table.set_column(&format!("ACNI_{}", label), acni.to_vec())?;
    }

    if decomposition.computes_hpai() {
        let hpai = calculate_hpai(image, masks, config.hpai_percentile)?;
        for sign in Sign::ALL.iter() {
            table.set_column(&format!("{}HPAI", sign), hpai.get(*sign).to_vec())?;
        }
    }
    Ok(())
}


/// Add the symmetry and matching columns to the whole-brain table.
fn add_match_columns(table: &mut SummaryTable, output: &MatchOutput, masks: &MaskSet, config: &AnalysisConfig,
                     matcher: &dyn PairMatcher) -> Result<()> {
    let sss_images = [("wb_SSS", Decomposition::WholeBrain), ("matchedRL_SSS", Decomposition::RlUnforced)];
    for (column, decomposition) in sss_images.iter() {
        let sss = spatial_symmetry_score(output.image(*decomposition)?, masks, config.scoring)?;
        table.set_column(column, sss.to_vec())?;
    }

    for other in COMPARISONS.iter() {
        let matrices = output.matrices(Decomposition::WholeBrain, *other)?;
        let summary = summarize_matches(matrices, matcher)?;
        table.set_column(&format!("matched{}", other), summary.matched_index)?;
        table.set_column(&format!("match{}_score", other), summary.matched_score)?;
        table.set_column(&format!("n_unmatched{}", other), vec![summary.unmatched_count as i64; table.n_rows()])?;
    }
    Ok(())
}


/// Runs the symmetry analysis for a dataset: computes or loads the summaries of each component count.
pub struct SymmetryAnalysis<B, S> {
    config: AnalysisConfig,
    masks: MaskSet,
    backend: B,
    store: S,
    matcher: Box<dyn PairMatcher>,
}

impl<B, S> SymmetryAnalysis<B, S>
where
    B: IcaBackend,
    S: SummaryStore,
{
    /// Set up an analysis that matches components with [`BestMatch`], in the direction of the configured scoring.
    pub fn new(config: AnalysisConfig, masks: MaskSet, backend: B, store: S) -> SymmetryAnalysis<B, S> {
        let matcher = Box::new(BestMatch::for_scoring(config.scoring));
        SymmetryAnalysis { config, masks, backend, store, matcher }
    }

    /// Use another matched-pair extraction.
    pub fn with_matcher(mut self, matcher: Box<dyn PairMatcher>) -> SymmetryAnalysis<B, S> {
        self.matcher = matcher;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The voxel-count sparsity threshold shared by all summaries: derived from the whole-brain images of all
    /// requested component counts at the configured global percentile.
    pub fn sparsity_threshold(&self, components: &[usize]) -> Result<f64> {
        if components.is_empty() {
            return Err(HemisymError::NoComponentCounts);
        }
        let images = components.iter()
            .map(|&n| self.backend.components(Decomposition::WholeBrain, n))
            .collect::<Result<Vec<ComponentImage>>>()?;
        global_sparsity_threshold(&images, self.config.global_percentile)
    }

    /// Compute the WB, R and L summary tables for `n_components`. Nothing is persisted.
    pub fn build_summary(&self, n_components: usize, sparsity_threshold: f64) -> Result<SummarySet> {
        let output = self.backend.match_analysis(Decomposition::WholeBrain, n_components)?;

        let mut summaries = SummarySet {
            wb: SummaryTable::new(n_components),
            right: SummaryTable::new(n_components),
            left: SummaryTable::new(n_components),
        };

        for hemisphere in [Hemisphere::WholeBrain, Hemisphere::Right, Hemisphere::Left].iter() {
            let image = output.image(Decomposition::from(*hemisphere))?;
            if image.n_components() != n_components {
                return Err(HemisymError::ShapeMismatch(
                    format!("'{}' components", hemisphere), vec![n_components], vec![image.n_components()]));
            }
            add_hemisphere_columns(summaries.get_mut(*hemisphere), image, *hemisphere, &self.masks, &self.config,
                                   sparsity_threshold)?;
        }

        add_match_columns(&mut summaries.wb, &output, &self.masks, &self.config, self.matcher.as_ref())?;
        Ok(summaries)
    }

    /// Load the persisted summaries for `n_components`, or compute and persist them when none exist or when the
    /// configuration forces recomputation. Recomputed summaries overwrite persisted ones.
    pub fn load_or_generate_summary(&mut self, n_components: usize, sparsity_threshold: f64) -> Result<SummarySet> {
        let key = SummaryKey::new(&self.config.dataset, n_components);
        if !self.config.force {
            if let CacheLookup::Hit(summaries) = self.store.lookup(&key)? {
                return Ok(summaries);
            }
        }

        log::info!("Computing summary data for {} components", n_components);
        let summaries = self.build_summary(n_components, sparsity_threshold)?;
        self.store.store(&key, &summaries)?;
        Ok(summaries)
    }

    /// Write the master tables to the analyses directory of the configuration.
    pub fn save_master_tables(&self, master: &MasterTables) -> Result<()> {
        let dir = self.config.analyses_dir();
        log::info!("Saving master summary tables to {}", dir.display());
        master.write_csv(dir)
    }

    /// Run the analysis over `components`, in the given order, and return the master tables.
    pub fn run(&mut self, components: &[usize]) -> Result<MasterTables> {
        let threshold = self.sparsity_threshold(components)?;
        log::info!("Using global sparsity threshold of {:.8} for sparsity calculation", threshold);

        let mut summaries = Vec::with_capacity(components.len());
        for &n in components {
            log::info!("Running analysis with {} components", n);
            summaries.push(self.load_or_generate_summary(n, threshold)?);
        }
        concatenate_summaries(&summaries)
    }
}


#[cfg(test)]
mod test {
    use super::*;

    fn set_of(n: usize) -> SummarySet {
        SummarySet { wb: SummaryTable::new(n), right: SummaryTable::new(n), left: SummaryTable::new(n) }
    }

    #[test]
    fn master_row_count_is_the_sum_of_component_counts() {
        let master = concatenate_summaries(&[set_of(5), set_of(10), set_of(3)]).unwrap();
        assert_eq!(master.wb.n_rows(), 18);
        assert_eq!(master.left.n_rows(), 18);
        assert_eq!(master.right.column("n_comp").unwrap().get_f64(5), Some(10.0));
        assert_eq!(master.right.column("n_comp").unwrap().get_f64(17), Some(3.0));
    }

    #[test]
    fn inconsistent_table_is_rejected() {
        let mut broken = set_of(2);
        broken.left.set_column("n_comp", vec![3i64, 3]).unwrap();
        assert!(concatenate_summaries(&[set_of(1), broken]).is_err());
        assert!(concatenate_summaries(&[]).is_err());
    }
}
