//! Hemispheric symmetry statistics for ICA component maps of the brain.
//!
//! Compares whole-brain ICA components with components computed on isolated hemispheres: sparsity, the
//! anti-correlated network index (ACNI), the hemispheric participation asymmetry index (HPAI), the spatial symmetry
//! score (SSS), and how whole-brain components match half-brain ones. Results are collected into one summary table
//! per decomposition and component count, and into master tables across component counts.
//!
//! The decomposition itself is delegated to an [`IcaBackend`]; this crate only works on its output.

pub mod acni;
pub mod backend;
pub mod config;
pub mod error;
pub mod fs_mgh;
pub mod hpai;
pub mod image;
pub mod mask;
pub mod matching;
pub mod sparsity;
pub mod sss;
pub mod store;
pub mod summary;
pub mod table;
pub mod threshold;
pub mod util;

pub use acni::{acni_from_masked, calculate_acni};
pub use backend::{DirectoryBackend, IcaBackend, MatchOutput};
pub use config::AnalysisConfig;
pub use error::{HemisymError, Result};
pub use fs_mgh::{read_mgh, write_mgh, FsMgh, FsMghHeader};
pub use hpai::{calculate_hpai, HpaiRecord};
pub use image::ComponentImage;
pub use mask::{Hemisphere, HemisphereMask, MaskSet};
pub use matching::{summarize_matches, BestMatch, Decomposition, MatchMatrices, MatchSummary, PairMatcher};
pub use sparsity::{hemisphere_sparsity, SparsityKind, SparsityRecord};
pub use sss::{spatial_symmetry_score, Scoring};
pub use store::{CacheLookup, CsvSummaryStore, MemorySummaryStore, SummaryKey, SummarySet, SummaryStore};
pub use summary::{concatenate_summaries, MasterTables, SymmetryAnalysis};
pub use table::{Column, SummaryTable};
pub use threshold::{global_sparsity_threshold, Sign, ThresholdScope};
