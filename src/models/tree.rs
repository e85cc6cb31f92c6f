//! Decision tree regressor stored as parallel node arrays.
//!
//! Node `i` is a leaf when `children_left[i] == -1`; otherwise samples with
//! `x[feature[i]] <= threshold[i]` go left and the rest go right. Child ids
//! are always greater than their parent's id, which rules out cycles.

use super::{fitted_input, Regressor};
use crate::error::{PredictorError, Result};
use crate::feature_builder::FeatureRecord;
use serde::{Deserialize, Serialize};

const LEAF: i64 = -1;

/// Fitted regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    /// Feature names seen during fit; empty when fitted without names
    #[serde(default)]
    pub feature_names: Vec<String>,
    /// Input width; taken from `feature_names` when absent
    #[serde(default)]
    pub n_features_in: Option<usize>,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl DecisionTreeRegressor {
    pub fn node_count(&self) -> usize {
        self.children_left.len()
    }

    /// Number of input features the tree was fitted on
    pub fn n_features(&self) -> Option<usize> {
        self.n_features_in.or_else(|| {
            (!self.feature_names.is_empty()).then_some(self.feature_names.len())
        })
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        let n_features = self
            .n_features()
            .ok_or_else(|| "decision tree has neither n_features_in nor feature_names".to_string())?;
        let n = self.node_count();
        if n == 0 {
            return Err("decision tree has no nodes".to_string());
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err("decision tree node arrays differ in length".to_string());
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != n_features {
            return Err(format!(
                "decision tree has {} feature names but n_features_in is {}",
                self.feature_names.len(),
                n_features
            ));
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                if right != LEAF {
                    return Err(format!("node {} has a right child but no left child", node));
                }
                continue;
            }
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {} has invalid child id {}", node, child));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!("node {} splits on invalid feature {}", node, feature));
            }
        }
        Ok(())
    }

    fn malformed(&self, node: usize) -> PredictorError {
        PredictorError::inference(self.name(), format!("malformed tree at node {}", node))
    }
}

impl Regressor for DecisionTreeRegressor {
    fn name(&self) -> &str {
        "decision_tree"
    }

    fn predict(&self, record: &FeatureRecord) -> Result<f64> {
        let n_features = self
            .n_features()
            .ok_or_else(|| PredictorError::inference(self.name(), "input width unknown"))?;
        let x = fitted_input(self.name(), &self.feature_names, n_features, record)?;

        // Walks at most node_count() splits; unvalidated trees error instead of looping
        let mut node = 0usize;
        for _ in 0..=self.node_count() {
            let left = *self.children_left.get(node).ok_or_else(|| self.malformed(node))?;
            if left == LEAF {
                return self.value.get(node).copied().ok_or_else(|| self.malformed(node));
            }

            let sample = self
                .feature
                .get(node)
                .and_then(|&f| usize::try_from(f).ok())
                .and_then(|f| x.get(f))
                .ok_or_else(|| self.malformed(node))?;
            let threshold = *self.threshold.get(node).ok_or_else(|| self.malformed(node))?;

            // inputs are compared at f32 precision, as the tree was fitted
            let next = if *sample as f32 as f64 <= threshold {
                left
            } else {
                *self.children_right.get(node).ok_or_else(|| self.malformed(node))?
            };
            node = usize::try_from(next).map_err(|_| self.malformed(node))?;
        }
        Err(self.malformed(node))
    }
}
