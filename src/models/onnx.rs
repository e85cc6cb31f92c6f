//! ONNX Runtime backed regressors (`onnx` feature)

use super::Regressor;
use crate::error::{PredictorError, Result};
use crate::feature_builder::FeatureRecord;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Regressor exported to ONNX, e.g. via skl2onnx
pub struct OnnxRegressor {
    name: String,
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxRegressor {
    /// Load an ONNX regressor from file
    pub fn load(path: &Path, threads: usize) -> Result<Self> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        info!(model = %name, path = %path.display(), threads = threads, "Loading ONNX model");

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(threads))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| PredictorError::load(path, e))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // skl2onnx names regressor outputs "variable"
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name == "variable")
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "variable".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(Self {
            name,
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

impl std::fmt::Debug for OnnxRegressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxRegressor")
            .field("name", &self.name)
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .finish()
    }
}

impl Regressor for OnnxRegressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, record: &FeatureRecord) -> Result<f64> {
        // Input tensor shape [1, num_features]
        let shape = vec![1_i64, record.len() as i64];
        let input_tensor = Tensor::from_array((shape, record.values_f32()))
            .map_err(|e| PredictorError::inference(&self.name, e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| PredictorError::inference(&self.name, format!("lock error: {}", e)))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_tensor])
            .map_err(|e| PredictorError::inference(&self.name, e))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            PredictorError::inference(&self.name, format!("missing output '{}'", self.output_name))
        })?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| PredictorError::inference(&self.name, e))?;

        let value = data
            .first()
            .copied()
            .ok_or_else(|| PredictorError::inference(&self.name, "empty output tensor"))?;

        debug!(model = %self.name, value = value, "ONNX inference complete");
        Ok(f64::from(value))
    }
}
