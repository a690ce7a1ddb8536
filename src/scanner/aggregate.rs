use std::collections::{HashMap, HashSet};

use crate::model::FeatureResult;

/// Feature to files map built up during one scan.
///
/// Features keep the order in which they were first seen, and each file is
/// listed at most once per feature.
#[derive(Debug, Default)]
pub struct FeatureAggregator {
    features: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
    seen: HashSet<(usize, String)>,
}

impl FeatureAggregator {
    pub fn record(&mut self, feature: &str, file: &str) {
        let idx = match self.index.get(feature) {
            Some(&idx) => idx,
            None => {
                let idx = self.features.len();
                self.features.push((feature.to_string(), Vec::new()));
                self.index.insert(feature.to_string(), idx);
                idx
            }
        };

        if self.seen.insert((idx, file.to_string())) {
            self.features[idx].1.push(file.to_string());
        }
    }

    pub fn into_results(self) -> Vec<FeatureResult> {
        self.features
            .into_iter()
            .map(|(feature, files)| FeatureResult::new(feature, files))
            .collect()
    }
}
