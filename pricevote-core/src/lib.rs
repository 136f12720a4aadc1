//! PriceVote Core — price matrix, labels, features, classifiers.
//!
//! This crate contains the pure pipeline, with no file or network access:
//! - Domain types (cells, price series, labels, ids)
//! - Outer-join alignment of per-ticker series into a price matrix
//! - Forward-return labelling over fixed horizons
//! - Percent-change feature extraction and sanitization
//! - Linear SVC, KNN and random forest members of a hard-voting committee
//! - Deterministic seed hierarchy for splits and forests

pub mod data;
pub mod domain;
pub mod features;
pub mod labels;
pub mod models;
pub mod rng;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: pipeline types are Send + Sync.
    ///
    /// The runner fans tickers out over a rayon pool; if any of these stops
    /// being shareable, the build breaks here first.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Cell>();
        require_sync::<domain::Cell>();
        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::Label>();
        require_sync::<domain::Label>();
        require_send::<domain::ClassCounts>();
        require_sync::<domain::ClassCounts>();
        require_send::<domain::RunId>();
        require_sync::<domain::RunId>();

        // Data
        require_send::<data::PriceMatrix>();
        require_sync::<data::PriceMatrix>();
        require_send::<data::GapReport>();
        require_sync::<data::GapReport>();

        // Labels and features
        require_send::<labels::LabelFrame>();
        require_sync::<labels::LabelFrame>();
        require_send::<features::FeatureSet>();
        require_sync::<features::FeatureSet>();

        // Models
        require_send::<models::Committee>();
        require_sync::<models::Committee>();
        require_send::<models::RandomForest>();
        require_sync::<models::RandomForest>();
        require_send::<models::TrainTestSplit>();
        require_sync::<models::TrainTestSplit>();

        // RNG
        require_send::<rng::RngHierarchy>();
        require_sync::<rng::RngHierarchy>();
    }

    /// Architecture contract: the committee is itself a `Classifier`, so
    /// committees can be nested or swapped for a single model.
    #[test]
    fn committee_is_usable_as_trait_object() {
        fn _check(c: models::Committee) -> Box<dyn models::Classifier> {
            Box::new(c)
        }
    }
}
