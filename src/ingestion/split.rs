//! Seeded train/test splitting

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Train and held-out partitions of one table
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: DataFrame,
    pub test: DataFrame,
}

/// Shuffle rows with a fixed seed and cut off `ceil(test_size * n)` test rows.
///
/// The same `(df, test_size, seed)` always yields the same partitions.
pub fn train_test_split(df: &DataFrame, test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::Config(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n = df.height();
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(PipelineError::InvalidInput(format!(
            "cannot split {} row(s) with test_size {}",
            n, test_size
        )));
    }

    let mut permutation: Vec<IdxSize> = (0..n as IdxSize).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let test_idx = IdxCa::from_vec("idx".into(), permutation[..n_test].to_vec());
    let train_idx = IdxCa::from_vec("idx".into(), permutation[n_test..].to_vec());

    let take = |idx: &IdxCa| {
        df.take(idx)
            .map_err(|e| PipelineError::InvalidInput(format!("split failed: {}", e)))
    };

    Ok(TrainTestSplit {
        train: take(&train_idx)?,
        test: take(&test_idx)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(n: usize) -> DataFrame {
        let ids: Vec<i64> = (0..n as i64).collect();
        df!("id" => &ids).unwrap()
    }

    fn ids(df: &DataFrame) -> Vec<i64> {
        df.column("id").unwrap().i64().unwrap().into_iter().flatten().collect()
    }

    #[test]
    fn test_split_sizes() {
        let split = train_test_split(&frame(1000), 0.2, 42).unwrap();
        assert_eq!(split.train.height(), 800);
        assert_eq!(split.test.height(), 200);
    }

    #[test]
    fn test_split_rounds_test_size_up() {
        let split = train_test_split(&frame(11), 0.2, 42).unwrap();
        assert_eq!(split.test.height(), 3);
        assert_eq!(split.train.height(), 8);
    }

    #[test]
    fn test_split_is_reproducible() {
        let df = frame(50);
        let a = train_test_split(&df, 0.2, 7).unwrap();
        let b = train_test_split(&df, 0.2, 7).unwrap();
        assert_eq!(ids(&a.train), ids(&b.train));
        assert_eq!(ids(&a.test), ids(&b.test));
    }

    #[test]
    fn test_split_partitions_rows() {
        let df = frame(30);
        let split = train_test_split(&df, 0.2, 1).unwrap();
        let mut all = ids(&split.train);
        all.extend(ids(&split.test));
        all.sort();
        assert_eq!(all, (0..30).collect::<Vec<i64>>());
    }

    #[test]
    fn test_split_rejects_bad_ratio() {
        assert!(matches!(
            train_test_split(&frame(10), 1.5, 42),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            train_test_split(&frame(1), 0.2, 42),
            Err(PipelineError::InvalidInput(_))
        ));
    }
}
