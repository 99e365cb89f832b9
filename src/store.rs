//! Persisted summaries, keyed by dataset and component count.
//!
//! Summaries are expensive (they need a full decomposition and matching run), so they are looked up before being
//! computed. The lookup is a trait so the filesystem store can be swapped for an in-memory one.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::mask::Hemisphere;
use crate::table::SummaryTable;


/// Identifies the summary of one decomposition run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SummaryKey {
    pub dataset: String,
    pub n_components: usize,
}

impl SummaryKey {
    pub fn new(dataset: &str, n_components: usize) -> SummaryKey {
        SummaryKey { dataset: dataset.to_string(), n_components }
    }
}


/// The three aligned summary tables for one component count.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarySet {
    pub wb: SummaryTable,
    pub right: SummaryTable,
    pub left: SummaryTable,
}

impl SummarySet {

    pub fn get(&self, hemisphere: Hemisphere) -> &SummaryTable {
        match hemisphere {
            Hemisphere::WholeBrain => &self.wb,
            Hemisphere::Right => &self.right,
            Hemisphere::Left => &self.left,
        }
    }

    pub fn get_mut(&mut self, hemisphere: Hemisphere) -> &mut SummaryTable {
        match hemisphere {
            Hemisphere::WholeBrain => &mut self.wb,
            Hemisphere::Right => &mut self.right,
            Hemisphere::Left => &mut self.left,
        }
    }
}


/// Result of a store lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(SummarySet),
    Miss,
}


pub trait SummaryStore {
    /// Look up a complete summary set. Incomplete sets are a miss.
    fn lookup(&self, key: &SummaryKey) -> Result<CacheLookup>;

    /// Persist a summary set, replacing any previous one for the same key.
    fn store(&mut self, key: &SummaryKey, summaries: &SummarySet) -> Result<()>;
}


impl<T: SummaryStore + ?Sized> SummaryStore for &mut T {
    fn lookup(&self, key: &SummaryKey) -> Result<CacheLookup> {
        (**self).lookup(key)
    }

    fn store(&mut self, key: &SummaryKey, summaries: &SummarySet) -> Result<()> {
        (**self).store(key, summaries)
    }
}


/// File name of the persisted summary of a decomposition, e.g. `wb_summary.csv`.
pub fn summary_file_name(hemisphere: Hemisphere) -> String {
    format!("{}_summary.csv", hemisphere.label())
}


/// Stores summaries as CSV files in `<root>/<dataset>/analyses/<n_components>/{wb,R,L}_summary.csv`.
#[derive(Debug, Clone)]
pub struct CsvSummaryStore {
    root: PathBuf,
}

impl CsvSummaryStore {

    /// `root` is the output directory, see [`AnalysisConfig::out_dir`].
    pub fn new<P: Into<PathBuf>>(root: P) -> CsvSummaryStore {
        CsvSummaryStore { root: root.into() }
    }

    /// A store in the output directory of `config`.
    pub fn from_config(config: &AnalysisConfig) -> CsvSummaryStore {
        CsvSummaryStore::new(config.out_dir.clone())
    }

    pub fn dir_for(&self, key: &SummaryKey) -> PathBuf {
        self.root.join(&key.dataset).join("analyses").join(key.n_components.to_string())
    }
}

impl SummaryStore for CsvSummaryStore {
    fn lookup(&self, key: &SummaryKey) -> Result<CacheLookup> {
        let dir = self.dir_for(key);
        let paths: Vec<PathBuf> = Hemisphere::ALL.iter().map(|h| dir.join(summary_file_name(*h))).collect();
        if !paths.iter().all(|p| p.is_file()) {
            if paths.iter().any(|p| p.is_file()) {
                log::warn!("Incomplete summary data in {}, recomputing", dir.display());
            }
            return Ok(CacheLookup::Miss);
        }

        log::info!("Loading summary data from {}", dir.display());
        Ok(CacheLookup::Hit(SummarySet {
            wb: SummaryTable::from_file(&paths[0])?,
            right: SummaryTable::from_file(&paths[1])?,
            left: SummaryTable::from_file(&paths[2])?,
        }))
    }

    fn store(&mut self, key: &SummaryKey, summaries: &SummarySet) -> Result<()> {
        let dir = self.dir_for(key);
        std::fs::create_dir_all(&dir)?;
        for hemisphere in Hemisphere::ALL.iter() {
            summaries.get(*hemisphere).to_file(dir.join(summary_file_name(*hemisphere)))?;
        }
        log::debug!("Saved summary data to {}", dir.display());
        Ok(())
    }
}


/// Keeps summaries in memory, e.g. for tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySummaryStore {
    summaries: HashMap<SummaryKey, SummarySet>,
}

impl MemorySummaryStore {
    pub fn new() -> MemorySummaryStore {
        MemorySummaryStore::default()
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

impl SummaryStore for MemorySummaryStore {
    fn lookup(&self, key: &SummaryKey) -> Result<CacheLookup> {
        Ok(self.summaries.get(key).cloned().map(CacheLookup::Hit).unwrap_or(CacheLookup::Miss))
    }

    fn store(&mut self, key: &SummaryKey, summaries: &SummarySet) -> Result<()> {
        self.summaries.insert(key.clone(), summaries.clone());
        Ok(())
    }
}
