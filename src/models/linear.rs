//! Ordinary least squares linear regression

use super::{fitted_input, Regressor};
use crate::error::Result;
use crate::feature_builder::FeatureRecord;
use serde::{Deserialize, Serialize};

/// Fitted linear regression: `intercept + Σ coefficients[i] * x[i]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Feature names seen during fit; empty when fitted without names
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegression {
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.coefficients.is_empty() {
            return Err("linear model has no coefficients".to_string());
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != self.coefficients.len() {
            return Err(format!(
                "linear model has {} feature names but {} coefficients",
                self.feature_names.len(),
                self.coefficients.len()
            ));
        }
        Ok(())
    }
}

impl Regressor for LinearRegression {
    fn name(&self) -> &str {
        "linear_regression"
    }

    fn predict(&self, record: &FeatureRecord) -> Result<f64> {
        let x = fitted_input(
            self.name(),
            &self.feature_names,
            self.coefficients.len(),
            record,
        )?;

        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(&x)
                .map(|(w, v)| w * v)
                .sum::<f64>())
    }
}
