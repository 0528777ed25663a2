//! Column weighting transforms for the interaction matrix.
//!
//! Both transforms treat an item column as a "document" and the users in it
//! as "terms": they run on the item×user transpose and hand the matrix back
//! in user×item orientation. Only stored entries are rewritten, so the
//! sparsity pattern never changes.

use crate::error::RecError;
use crate::matrix::InteractionMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default BM25 term-frequency saturation
pub const BM25_K1: f32 = 100.0;

/// Default BM25 length normalization
pub const BM25_B: f32 = 0.8;

/// Weighting applied per item column before model fitting
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Weighting {
    #[default]
    None,
    /// Frequency saturation with inverse document frequency
    Bm25 {
        #[serde(default = "default_k1")]
        k1: f32,
        #[serde(default = "default_b")]
        b: f32,
    },
    /// Square-root term frequency times inverse document frequency
    #[serde(rename = "tfidf", alias = "tf_idf")]
    TfIdf,
}

fn default_k1() -> f32 {
    BM25_K1
}

fn default_b() -> f32 {
    BM25_B
}

impl Weighting {
    /// BM25 with the default `k1`/`b`
    pub fn bm25() -> Self {
        Weighting::Bm25 {
            k1: BM25_K1,
            b: BM25_B,
        }
    }

    pub fn apply(self, matrix: InteractionMatrix) -> InteractionMatrix {
        match self {
            Weighting::None => matrix,
            Weighting::Bm25 { k1, b } => bm25_weight(matrix, k1, b),
            Weighting::TfIdf => tfidf_weight(matrix),
        }
    }
}

impl FromStr for Weighting {
    type Err = RecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Weighting::None),
            "bm25" => Ok(Weighting::bm25()),
            "tfidf" | "tf_idf" => Ok(Weighting::TfIdf),
            _ => Err(RecError::InvalidWeighting(s.to_string())),
        }
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weighting::None => f.write_str("none"),
            Weighting::Bm25 { k1, b } => write!(f, "bm25(k1={k1}, b={b})"),
            Weighting::TfIdf => f.write_str("tfidf"),
        }
    }
}

/// Inverse document frequency per user: `ln(n_items) - ln(1 + items bought)`
fn user_idf(matrix: &InteractionMatrix) -> Vec<f32> {
    let n_docs = (matrix.n_cols() as f32).ln();
    matrix
        .row_nnz()
        .into_iter()
        .map(|nnz| n_docs - (nnz as f32).ln_1p())
        .collect()
}

/// BM25 weighting of item columns.
pub fn bm25_weight(mut matrix: InteractionMatrix, k1: f32, b: f32) -> InteractionMatrix {
    if matrix.nnz() == 0 {
        return matrix;
    }
    let idf = user_idf(&matrix);
    let lengths = matrix.col_sums();
    let average_length = lengths.iter().sum::<f32>() / lengths.len() as f32;
    // Columns that cancel out to a zero mean length get no length normalization
    let length_norm: Vec<f32> = if average_length > 0.0 {
        lengths
            .iter()
            .map(|&len| (1.0 - b) + b * len / average_length)
            .collect()
    } else {
        vec![1.0; lengths.len()]
    };

    matrix.map_values(|user, item, tf| tf * (k1 + 1.0) / (k1 * length_norm[item] + tf) * idf[user]);
    matrix
}

/// TF-IDF weighting of item columns.
pub fn tfidf_weight(mut matrix: InteractionMatrix) -> InteractionMatrix {
    if matrix.nnz() == 0 {
        return matrix;
    }
    let idf = user_idf(&matrix);
    matrix.map_values(|user, _item, tf| tf.max(0.0).sqrt() * idf[user]);
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3 users x 4 items; user 2 bought everything
    fn matrix() -> InteractionMatrix {
        InteractionMatrix::from_triplets(
            3,
            4,
            vec![
                (0, 0, 1.0),
                (0, 1, 4.0),
                (1, 1, 2.0),
                (2, 0, 1.0),
                (2, 1, 1.0),
                (2, 2, 1.0),
                (2, 3, 1.0),
            ],
        )
    }

    #[test]
    fn test_tfidf_values() {
        let weighted = tfidf_weight(matrix());
        let idf_u0 = 4f32.ln() - 3f32.ln();
        assert!((weighted.get(0, 1) - 2.0 * idf_u0).abs() < 1e-6);
        // A user who bought every item carries no information
        assert!((weighted.get(2, 3) - (4f32.ln() - 5f32.ln())).abs() < 1e-6);
    }

    #[test]
    fn test_bm25_values() {
        let weighted = bm25_weight(matrix(), BM25_K1, BM25_B);

        // item lengths: [2, 7, 1, 1], mean 2.75
        let norm_item1 = 0.2 + 0.8 * 7.0 / 2.75;
        let idf_u1 = 4f32.ln() - 2f32.ln();
        let expected = 2.0 * 101.0 / (100.0 * norm_item1 + 2.0) * idf_u1;
        assert!((weighted.get(1, 1) - expected).abs() < 1e-5);
    }

    #[test]
    fn test_weighting_keeps_sparsity_pattern() {
        let original = matrix();
        for weighting in [Weighting::bm25(), Weighting::TfIdf, Weighting::None] {
            let weighted = weighting.apply(original.clone());
            assert_eq!(weighted.nnz(), original.nnz());
            assert_eq!(weighted.row_nnz(), original.row_nnz());
            assert_eq!(weighted.get(1, 0), 0.0);
        }
    }

    #[test]
    fn test_bm25_is_monotone_within_a_cell_position() {
        let low = InteractionMatrix::from_triplets(2, 3, vec![(0, 0, 1.0), (1, 1, 1.0)]);
        let high = InteractionMatrix::from_triplets(2, 3, vec![(0, 0, 3.0), (1, 1, 1.0)]);
        let low = bm25_weight(low, BM25_K1, BM25_B);
        let high = bm25_weight(high, BM25_K1, BM25_B);
        assert!(high.get(0, 0) > low.get(0, 0));
    }

    #[test]
    fn test_weighting_tags() {
        assert_eq!("tfidf".parse::<Weighting>().unwrap(), Weighting::TfIdf);
        assert_eq!("bm25".parse::<Weighting>().unwrap(), Weighting::bm25());
        assert_eq!("none".parse::<Weighting>().unwrap(), Weighting::None);
        assert!(matches!(
            "log".parse::<Weighting>(),
            Err(RecError::InvalidWeighting(_))
        ));
    }

    #[test]
    fn test_bm25_with_zero_mean_length_stays_finite() {
        // A return in one column cancels a purchase in another
        let matrix = InteractionMatrix::from_triplets(2, 3, vec![(0, 0, 1.0), (1, 1, -1.0)]);
        let weighted = bm25_weight(matrix, BM25_K1, BM25_B);

        assert_eq!(weighted.nnz(), 2);
        assert!(weighted.entries().all(|(_, _, v)| v.is_finite()));
        // Norm falls back to 1, so the weight is (k1 + 1) / (k1 + 1) * idf
        let idf = 3f32.ln() - 2f32.ln();
        assert!((weighted.get(0, 0) - idf).abs() < 1e-6);
    }

    #[test]
    fn test_empty_matrix_is_untouched() {
        let empty = InteractionMatrix::from_triplets(0, 0, Vec::new());
        assert_eq!(Weighting::bm25().apply(empty.clone()), empty);
    }
}
