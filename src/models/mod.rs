//! Pre-trained regression models and their loading

pub mod inference;
pub mod linear;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod tree;

use crate::error::{PredictorError, Result};
use crate::feature_builder::FeatureRecord;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

pub use inference::InferenceEngine;
pub use linear::LinearRegression;
pub use loader::ArtifactLoader;
pub use tree::DecisionTreeRegressor;

/// A fitted regressor that maps one feature record to one value.
///
/// Implementations are immutable after load and shared across requests.
pub trait Regressor: Send + Sync + fmt::Debug {
    /// Model name used in logs and errors
    fn name(&self) -> &str;

    /// Predict a single value for the record
    fn predict(&self, record: &FeatureRecord) -> Result<f64>;
}

/// JSON model document, tagged by model type
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelDocument {
    LinearRegression(LinearRegression),
    DecisionTree(DecisionTreeRegressor),
}

impl ModelDocument {
    /// Validate the fitted parameters and hand back a shareable regressor
    pub fn into_regressor(self) -> std::result::Result<Arc<dyn Regressor>, String> {
        match self {
            ModelDocument::LinearRegression(model) => {
                model.validate()?;
                Ok(Arc::new(model))
            }
            ModelDocument::DecisionTree(model) => {
                model.validate()?;
                Ok(Arc::new(model))
            }
        }
    }
}

/// Check a record against the features a model was fitted on and return
/// its values in column order.
pub(crate) fn fitted_input(
    model: &str,
    feature_names: &[String],
    n_features: usize,
    record: &FeatureRecord,
) -> Result<Vec<f64>> {
    if !feature_names.is_empty() && !record.columns().eq(feature_names.iter().map(String::as_str)) {
        return Err(PredictorError::inference(
            model,
            format!(
                "feature names do not match those seen during fit (expected {:?}, got {:?})",
                feature_names,
                record.columns().collect::<Vec<_>>()
            ),
        ));
    }

    if record.len() != n_features {
        return Err(PredictorError::inference(
            model,
            format!(
                "input has {} features, but model is expecting {} features as input",
                record.len(),
                n_features
            ),
        ));
    }

    Ok(record.values())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_builder::{ColumnOrder, FeatureBuilder};
    use crate::types::PhoneSpecs;

    #[test]
    fn test_document_dispatch() {
        let doc: ModelDocument = serde_json::from_str(
            r#"{"type": "linear_regression", "coefficients": [1.0, 2.0], "intercept": 0.5}"#,
        )
        .unwrap();
        let model = doc.into_regressor().unwrap();
        assert_eq!(model.name(), "linear_regression");

        let doc: ModelDocument = serde_json::from_str(
            r#"{"type": "decision_tree", "n_features_in": 1,
                "children_left": [-1], "children_right": [-1],
                "feature": [-2], "threshold": [-2.0], "value": [42.0]}"#,
        )
        .unwrap();
        let model = doc.into_regressor().unwrap();
        assert_eq!(model.name(), "decision_tree");
    }

    #[test]
    fn test_unknown_model_type_rejected() {
        let result = serde_json::from_str::<ModelDocument>(
            r#"{"type": "random_forest", "coefficients": []}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_fitted_input_checks_names_and_width() {
        let record = FeatureBuilder::new()
            .build(&PhoneSpecs::default(), &ColumnOrder::new(["RAM", "ROM"]))
            .unwrap();

        let names = vec!["RAM".to_string(), "ROM".to_string()];
        assert_eq!(fitted_input("m", &names, 2, &record).unwrap(), vec![4.0, 128.0]);

        let swapped = vec!["ROM".to_string(), "RAM".to_string()];
        let err = fitted_input("m", &swapped, 2, &record).unwrap_err();
        assert_eq!(err.kind(), "inference_error");

        let err = fitted_input("m", &[], 3, &record).unwrap_err();
        assert!(err.to_string().contains("expecting 3 features"));
    }
}
