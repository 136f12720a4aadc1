use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic dataset hash (content hash of a price matrix)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn from_hash(hash: &str) -> Self {
        Self(hash.to_string())
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic run ID (dataset + target ticker + seed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId {
    pub dataset_hash: DatasetHash,
    pub ticker: String,
    pub seed: u64,
}

impl RunId {
    pub fn new(dataset_hash: DatasetHash, ticker: impl Into<String>, seed: u64) -> Self {
        Self {
            dataset_hash,
            ticker: ticker.into(),
            seed,
        }
    }

    /// Generate deterministic run hash
    pub fn hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.dataset_hash.0.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.ticker.as_bytes());
        hasher.update(&[0]);
        hasher.update(&self.seed.to_le_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.dataset_hash.short(), self.ticker, self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_deterministic() {
        let run1 = RunId::new(DatasetHash::from_hash("def456"), "ADM.L", 42);
        let run2 = RunId::new(DatasetHash::from_hash("def456"), "ADM.L", 42);
        assert_eq!(run1.hash(), run2.hash());
    }

    #[test]
    fn test_run_id_different_seed_different_hash() {
        let run1 = RunId::new(DatasetHash::from_hash("def456"), "ADM.L", 42);
        let run2 = RunId::new(DatasetHash::from_hash("def456"), "ADM.L", 43);
        assert_ne!(run1.hash(), run2.hash());
    }

    #[test]
    fn test_run_id_different_ticker_different_hash() {
        let run1 = RunId::new(DatasetHash::from_hash("def456"), "ADM.L", 42);
        let run2 = RunId::new(DatasetHash::from_hash("def456"), "AAL.L", 42);
        assert_ne!(run1.hash(), run2.hash());
    }

    #[test]
    fn short_hash_never_panics_on_short_input() {
        assert_eq!(DatasetHash::from_hash("abc").short(), "abc");
    }
}
