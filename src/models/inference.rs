//! Dual-model inference for price prediction

use crate::error::Result;
use crate::feature_builder::FeatureRecord;
use crate::metrics::PipelineMetrics;
use crate::models::Regressor;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Runs the same feature record through the linear and tree models.
///
/// A model failure ends the call with that model's `InferenceError`; there
/// is no fallback and no retry.
pub struct InferenceEngine {
    metrics: Arc<PipelineMetrics>,
}

impl InferenceEngine {
    pub fn new(metrics: Arc<PipelineMetrics>) -> Self {
        Self { metrics }
    }

    /// Predict with `[linear, tree]`, returning `(linear_price, tree_price)`
    pub fn predict(
        &self,
        record: &FeatureRecord,
        models: [&dyn Regressor; 2],
    ) -> Result<(f64, f64)> {
        let [linear, tree] = models;
        let linear_price = self.run_single_model(linear, record)?;
        let tree_price = self.run_single_model(tree, record)?;

        debug!(
            linear_price = linear_price,
            tree_price = tree_price,
            "Dual-model inference complete"
        );
        Ok((linear_price, tree_price))
    }

    fn run_single_model(&self, model: &dyn Regressor, record: &FeatureRecord) -> Result<f64> {
        let start = Instant::now();
        let result = model.predict(record);
        self.metrics.record_model_time(model.name(), start.elapsed());

        if let Err(e) = &result {
            error!(model = %model.name(), error = %e, "Model inference failed");
        }
        result
    }
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new(Arc::new(PipelineMetrics::new()))
    }
}
