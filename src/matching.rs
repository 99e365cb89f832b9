//! Matching results between whole-brain and half-brain decompositions.
//!
//! The matching itself (computing score and sign matrices, pairing components) belongs to the decomposition backend.
//! This module turns its output into summary columns: the signed index of the best match of each whole-brain
//! component, the score of that match, and how many components were left unmatched.

use ndarray::Array2;

use std::fmt;

use crate::error::{HemisymError, Result};
use crate::mask::Hemisphere;
use crate::sss::Scoring;


/// A decomposition that components can be matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decomposition {
    WholeBrain,
    Right,
    Left,
    /// The best-matching combination of independently obtained right and left components, without forcing a
    /// one-to-one pairing beforehand.
    RlUnforced,
}

impl Decomposition {

    pub fn label(&self) -> &'static str {
        match self {
            Decomposition::WholeBrain => "wb",
            Decomposition::Right => "R",
            Decomposition::Left => "L",
            Decomposition::RlUnforced => "RL-unforced",
        }
    }
}

impl From<Hemisphere> for Decomposition {
    fn from(hemisphere: Hemisphere) -> Decomposition {
        match hemisphere {
            Hemisphere::WholeBrain => Decomposition::WholeBrain,
            Hemisphere::Right => Decomposition::Right,
            Hemisphere::Left => Decomposition::Left,
        }
    }
}

impl fmt::Display for Decomposition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}


/// Score and sign matrices for one ordered pair of decompositions. Rows are components of the first decomposition,
/// columns components of the second. A sign of -1 means the match holds after flipping the polarity of the second.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchMatrices {
    pub scores: Array2<f64>,
    pub signs: Array2<f64>,
}

impl MatchMatrices {

    pub fn new(scores: Array2<f64>, signs: Array2<f64>) -> Result<MatchMatrices> {
        if scores.dim() != signs.dim() {
            return Err(HemisymError::ShapeMismatch(
                String::from("sign matrix"),
                scores.shape().to_vec(),
                signs.shape().to_vec(),
            ));
        }
        Ok(MatchMatrices { scores, signs })
    }
}


/// Aligned index and sign arrays of matched component pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchedPairs {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub signs: Vec<i64>,
}

/// Components of the second decomposition that were not matched. `None` when the matcher produced no such structure.
pub type UnmatchedIndices = Option<Vec<usize>>;


/// Extracts matched and unmatched component pairs from match matrices.
pub trait PairMatcher {
    fn match_index_pairs(&self, matrices: &MatchMatrices) -> Result<(MatchedPairs, UnmatchedIndices)>;
}


/// Match each row to its best-scoring column: the highest score for similarities, the lowest for distances. Several
/// rows may pick the same column; columns picked by no row are reported as unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestMatch {
    higher_is_better: bool,
}

impl BestMatch {

    /// A matcher for score matrices computed with `scoring`.
    pub fn for_scoring(scoring: Scoring) -> BestMatch {
        BestMatch { higher_is_better: scoring.higher_is_better() }
    }

    fn is_better(&self, score: f64, best: f64) -> bool {
        if self.higher_is_better { score > best } else { score < best }
    }
}

/// Matches correlation scores.
impl Default for BestMatch {
    fn default() -> BestMatch {
        BestMatch::for_scoring(Scoring::Correlation)
    }
}

impl PairMatcher for BestMatch {
    fn match_index_pairs(&self, matrices: &MatchMatrices) -> Result<(MatchedPairs, UnmatchedIndices)> {
        let (n_rows, n_cols) = matrices.scores.dim();
        if n_cols == 0 {
            return Err(HemisymError::ShapeMismatch(String::from("score matrix columns"), vec![n_rows, 1], vec![n_rows, 0]));
        }

        let mut matched = MatchedPairs::default();
        let mut picked = vec![false; n_cols];
        for (row, scores) in matrices.scores.outer_iter().enumerate() {
            let mut best = 0;
            for (col, score) in scores.iter().enumerate() {
                if self.is_better(*score, scores[best]) {
                    best = col;
                }
            }
            picked[best] = true;
            matched.rows.push(row);
            matched.cols.push(best);
            matched.signs.push(if matrices.signs[[row, best]] < 0.0 { -1 } else { 1 });
        }

        let unmatched: Vec<usize> = picked.iter().enumerate().filter(|(_, &p)| !p).map(|(col, _)| col).collect();
        let unmatched = if unmatched.is_empty() { None } else { Some(unmatched) };
        Ok((matched, unmatched))
    }
}


/// The summary columns for one pair of decompositions, one entry per matched row.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSummary {
    /// Index of the matched component times the sign of the match.
    pub matched_index: Vec<i64>,
    pub matched_sign: Vec<i64>,
    pub matched_score: Vec<f64>,
    pub unmatched_count: usize,
}


/// Summarize the matches found by `matcher`. An absent or empty unmatched structure counts as zero unmatched.
pub fn summarize_matches(matrices: &MatchMatrices, matcher: &dyn PairMatcher) -> Result<MatchSummary> {
    let (matched, unmatched) = matcher.match_index_pairs(matrices)?;
    if matched.rows.len() != matched.cols.len() || matched.cols.len() != matched.signs.len() {
        return Err(HemisymError::ShapeMismatch(
            String::from("matched pairs"),
            vec![matched.rows.len(); 3],
            vec![matched.rows.len(), matched.cols.len(), matched.signs.len()],
        ));
    }

    let mut matched_score = Vec::with_capacity(matched.rows.len());
    for (&row, &col) in matched.rows.iter().zip(matched.cols.iter()) {
        let score = matrices.scores.get([row, col]).ok_or_else(|| HemisymError::ShapeMismatch(
            String::from("matched index"),
            matrices.scores.shape().to_vec(),
            vec![row, col],
        ))?;
        matched_score.push(*score);
    }

    Ok(MatchSummary {
        matched_index: matched.cols.iter().zip(matched.signs.iter()).map(|(&col, &sign)| col as i64 * sign).collect(),
        matched_sign: matched.signs,
        matched_score,
        unmatched_count: unmatched.map(|idx| idx.len()).unwrap_or(0),
    })
}


#[cfg(test)]
mod test {
    use super::*;
    use ndarray::array;

    #[test]
    fn one_unmatched_component_is_counted() {
        let scores = array![[0.9, 0.1, 0.2], [0.8, 0.3, 0.1], [0.1, 0.7, 0.2]];
        let signs = array![[1.0, 1.0, 1.0], [-1.0, 1.0, 1.0], [1.0, -1.0, 1.0]];
        let matrices = MatchMatrices::new(scores, signs).unwrap();

        let summary = summarize_matches(&matrices, &BestMatch::default()).unwrap();
        assert_eq!(summary.unmatched_count, 1);
        assert_eq!(summary.matched_index, vec![0, 0, -1]);
        assert_eq!(summary.matched_sign, vec![1, -1, -1]);
        assert_eq!(summary.matched_score, vec![0.9, 0.8, 0.7]);
    }

    #[test]
    fn perfect_one_to_one_matching_has_no_unmatched_structure() {
        let scores = array![[0.1, 0.9], [0.8, 0.2]];
        let signs = array![[1.0, -1.0], [1.0, 1.0]];
        let matrices = MatchMatrices::new(scores, signs).unwrap();

        let (matched, unmatched) = BestMatch::default().match_index_pairs(&matrices).unwrap();
        assert_eq!(matched.cols, vec![1, 0]);
        assert!(unmatched.is_none());

        let summary = summarize_matches(&matrices, &BestMatch::default()).unwrap();
        assert_eq!(summary.unmatched_count, 0);
        assert_eq!(summary.matched_index, vec![-1, 0]);
    }

    #[test]
    fn distance_scores_match_the_closest_component() {
        let matrices = MatchMatrices::new(array![[0.0, 50.0], [40.0, 0.0]], array![[1.0, 1.0], [1.0, -1.0]]).unwrap();

        let summary = summarize_matches(&matrices, &BestMatch::for_scoring(Scoring::L1Norm)).unwrap();
        assert_eq!(summary.matched_index, vec![0, -1]);
        assert_eq!(summary.matched_score, vec![0.0, 0.0]);
        assert_eq!(summary.unmatched_count, 0);

        let similarity = summarize_matches(&matrices, &BestMatch::for_scoring(Scoring::Correlation)).unwrap();
        assert_eq!(similarity.matched_index, vec![1, 0]);
    }

    struct FixedMatcher(MatchedPairs, UnmatchedIndices);

    impl PairMatcher for FixedMatcher {
        fn match_index_pairs(&self, _matrices: &MatchMatrices) -> Result<(MatchedPairs, UnmatchedIndices)> {
            Ok((self.0.clone(), self.1.clone()))
        }
    }

    #[test]
    fn unmatched_count_follows_the_matcher_structure() {
        let matrices = MatchMatrices::new(array![[0.5, 0.4], [0.3, 0.6]], array![[1.0, 1.0], [1.0, 1.0]]).unwrap();
        let pairs = MatchedPairs { rows: vec![0, 1], cols: vec![0, 1], signs: vec![1, 1] };

        let empty = FixedMatcher(pairs.clone(), Some(vec![]));
        assert_eq!(summarize_matches(&matrices, &empty).unwrap().unmatched_count, 0);

        let two = FixedMatcher(pairs, Some(vec![4, 7]));
        assert_eq!(summarize_matches(&matrices, &two).unwrap().unmatched_count, 2);
    }

    #[test]
    fn out_of_range_match_is_an_error() {
        let matrices = MatchMatrices::new(array![[0.5]], array![[1.0]]).unwrap();
        let bad = FixedMatcher(MatchedPairs { rows: vec![0], cols: vec![3], signs: vec![1] }, None);
        assert!(summarize_matches(&matrices, &bad).is_err());
    }

    #[test]
    fn mismatched_sign_matrix_is_rejected() {
        assert!(MatchMatrices::new(array![[0.5, 0.1]], array![[1.0]]).is_err());
    }
}
